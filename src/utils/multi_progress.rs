use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(100);

pub trait MultiProgressNew {
    fn add_with_style(&self, pb: ProgressBar, style: ProgressStyle) -> ProgressBar;

    fn add_spinner(&self, style: ProgressStyle, message: &str) -> ProgressBar {
        let pb = self.add_with_style(ProgressBar::new_spinner(), style);
        pb.set_message(message.to_string());
        pb
    }
}

impl MultiProgressNew for MultiProgress {
    fn add_with_style(&self, pb: ProgressBar, style: ProgressStyle) -> ProgressBar {
        let pb = self.add(pb);
        pb.set_style(style);
        pb.enable_steady_tick(TICK);
        pb
    }
}
