//! Renders catalog progress events on stderr.
//!
//! A transfer shows a spinner while it runs; completions and notices are
//! printed as single lines once the spinner is cleared.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use mipdata_core::{ProgressCallback, ProgressEvent};

use crate::output::{format_size, stderr_color};

struct Reporter {
    spinner: Mutex<Option<ProgressBar>>,
    color: bool,
}

impl Reporter {
    fn handle(&self, event: ProgressEvent) {
        let Ok(mut spinner) = self.spinner.lock() else {
            return;
        };
        match event {
            ProgressEvent::Started { label, url } => {
                let bar = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
                    bar.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "]));
                }
                bar.set_message(format!("Fetching {label}"));
                bar.enable_steady_tick(Duration::from_millis(100));
                tracing::debug!("GET {url}");
                if let Some(previous) = spinner.replace(bar) {
                    previous.finish_and_clear();
                }
            }
            ProgressEvent::Finished { label, bytes } => {
                if let Some(bar) = spinner.take() {
                    bar.finish_and_clear();
                }
                let line = format!("{label} ({})", format_size(bytes));
                if self.color {
                    eprintln!("{} {line}", "Fetched".green().bold());
                } else {
                    eprintln!("Fetched {line}");
                }
            }
            ProgressEvent::Notice { message } => {
                let print = || {
                    if self.color {
                        eprintln!("{} {message}", "warning:".yellow().bold());
                    } else {
                        eprintln!("warning: {message}");
                    }
                };
                match spinner.as_ref() {
                    Some(bar) => bar.suspend(print),
                    None => print(),
                }
            }
        }
    }
}

/// Callback that draws progress for an interactive session.
pub fn reporter() -> ProgressCallback {
    let reporter = Reporter {
        spinner: Mutex::new(None),
        color: stderr_color(),
    };
    Arc::new(move |event| reporter.handle(event))
}
