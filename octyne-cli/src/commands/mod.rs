pub mod auth;
pub mod config;
pub mod console;
pub mod file;
pub mod files;
pub mod server;
pub mod servers;
