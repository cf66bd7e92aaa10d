pub mod config;
pub mod connection;
pub mod dialect;
pub mod executor;
pub mod session;
