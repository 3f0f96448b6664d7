pub mod analyzer;
pub mod commands;
pub mod config;
pub mod insights;
pub mod model;
pub mod storage;
pub mod utils;
