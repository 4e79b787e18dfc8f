pub mod analyzer;
pub mod canvas;
pub mod config;
pub mod server;
