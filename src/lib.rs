pub mod config;
pub mod error;
pub mod exercise;
pub mod logging;
pub mod pose;
pub mod recording;
pub mod session;
pub mod sound;
pub mod source;
pub mod tracker;
pub mod workout;

pub use error::Error;
