pub mod config;
pub mod errors;
pub mod job;
pub mod logging;
pub mod notify;
pub mod progress;
pub mod translator;
pub mod ui;
