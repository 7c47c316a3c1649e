pub mod arguments;
pub mod audio;
pub mod config;
pub mod connection;
pub mod errors;
pub mod logger;
pub mod player;
pub mod protocol;
pub mod session;
