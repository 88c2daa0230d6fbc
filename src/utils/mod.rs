mod multi_progress;
mod progress_style;
pub mod time;

pub use multi_progress::MultiProgressNew;
pub use progress_style::ProgressStyleTemplate;
