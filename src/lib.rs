pub mod config;
mod db;
pub mod error;
pub mod import;
pub mod index;
pub mod keypoints;
pub mod matches;
pub mod pairs;
pub mod registry;

pub use config::Opts;
pub use error::{ImportError, Result};
