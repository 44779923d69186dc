//! Progress bars for per-year and per-stage loops

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Template of a bar over a known number of steps
pub const DEFAULT_MAIN_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}";

const SPINNER_TEMPLATE: &str = "{spinner:.green} {elapsed_precise} {msg}";

fn styled(pb: ProgressBar, style: ProgressStyle, message: Option<&str>) -> ProgressBar {
    pb.set_style(style);
    if let Some(message) = message {
        pb.set_message(message.to_string());
    }
    pb
}

/// Bar over `length` steps, e.g. years of an era or stages of a run
#[must_use]
pub fn create_main_progress_bar(length: u64, description: Option<&str>) -> ProgressBar {
    let style = ProgressStyle::with_template(DEFAULT_MAIN_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    styled(ProgressBar::new(length), style, description)
}

/// Spinner for work of unknown length
#[must_use]
pub fn create_spinner(message: Option<&str>) -> ProgressBar {
    let style = ProgressStyle::with_template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let pb = styled(ProgressBar::new_spinner(), style, message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Finish a bar, replacing its message when one is given
pub fn finish_progress_bar(pb: &ProgressBar, message: Option<&str>) {
    match message {
        Some(message) => pb.finish_with_message(message.to_string()),
        None => pb.finish(),
    }
}
