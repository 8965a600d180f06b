pub mod classify;
pub mod config;
pub mod pair;
pub mod watch;
