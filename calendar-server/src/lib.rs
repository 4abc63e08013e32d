pub mod cache;
pub mod cli;
pub mod export;
pub mod server;
pub mod store;
