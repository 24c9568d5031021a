// Library exports for the binary and tests

pub mod config;
pub mod engine;
pub mod omnibox;
pub mod resolve;
pub mod services;
pub mod stats;
pub mod utils;
pub mod watcher;
