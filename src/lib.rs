pub mod analyze;
pub mod bitbucket;
pub mod error;
pub mod model;
pub mod parse;
pub mod pipeline;
pub mod report;
pub mod server;
pub mod tracker;
pub mod utils;

pub use error::{Error, Result};
