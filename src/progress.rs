//! Terminal progress bars for the long upload and query loops.

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{msg} [{bar:40}] {pos}/{len} ({elapsed})";

/// A bar of `len` steps labelled `message`.
pub fn progress_bar(len: usize, message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(ProgressStyle::with_template(TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_bar()));
    pb.set_message(message);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_length() {
        let pb = progress_bar(7, "Queries");
        assert_eq!(pb.length(), Some(7));
        pb.inc(2);
        assert_eq!(pb.position(), 2);
        pb.finish_and_clear();
    }
}
