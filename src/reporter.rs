//! Console rendering of workflow events

use crate::types::{Event, Stage};
use indicatif::{HumanBytes, ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

const BAR_TEMPLATE: &str =
    "{spinner:.blue} [{elapsed_precise}] {wide_bar:.cyan/blue} {percent:>3}% {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

const SPINNER_TEMPLATE: &str = "{spinner:.blue} [{elapsed_precise}] {bytes} ({bytes_per_sec})";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const BAR_CHARS: &str = "█▓▒░  ";

fn bar_style(template: &str) -> Option<ProgressStyle> {
    ProgressStyle::with_template(template)
        .ok()
        .map(|style| style.tick_chars(TICK).progress_chars(BAR_CHARS))
}

/// Prints phase lines and a download progress bar
pub struct ConsoleReporter {
    bar: Option<ProgressBar>,
    hidden: bool,
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleReporter {
    /// Reporter drawing to the terminal
    pub fn new() -> Self {
        Self {
            bar: None,
            hidden: false,
        }
    }

    /// Reporter that prints status lines but never draws progress bars
    pub fn without_bars() -> Self {
        Self {
            bar: None,
            hidden: true,
        }
    }

    /// Render events until the workflow finishes or the channel closes
    pub fn spawn(mut self, mut rx: broadcast::Receiver<Event>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        let done = matches!(event, Event::Complete { .. } | Event::Failed { .. });
                        self.handle(&event);
                        if done {
                            break;
                        }
                    }
                    // Missed progress ticks; the next one carries the cumulative count
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
            self.clear_bar();
        })
    }

    /// Render a single event
    pub fn handle(&mut self, event: &Event) {
        match event {
            Event::Cleaning { dir } => {
                self.line(format!("[*] Cleaning {}...", dir.display()));
            }
            Event::Cleaned {
                removed,
                kept,
                failed,
            } => {
                self.line(format!(
                    "[✓] Folder cleaned ({} removed, {} kept)",
                    removed, kept
                ));
                if *failed > 0 {
                    self.line(format!("[!] {} entries could not be deleted", failed));
                }
            }
            Event::DownloadSkipped { archive } => {
                self.line(format!(
                    "[✓] Archive already exists at {}. Skipping download...",
                    archive.display()
                ));
            }
            Event::DownloadStarted { url, total } => {
                self.line(format!("[*] Downloading {}...", url));
                self.start_bar(*total);
            }
            Event::Downloading { progress, .. } => {
                if let Some(bar) = &self.bar {
                    bar.set_position(progress.downloaded);
                }
            }
            Event::DownloadComplete { archive, bytes } => {
                self.clear_bar();
                self.line(format!(
                    "[+] Downloaded {} to {}",
                    HumanBytes(*bytes),
                    archive.display()
                ));
            }
            Event::Extracting { .. } => {
                self.line("[*] Extracting contents...".to_string());
            }
            Event::ExtractComplete { files } => {
                self.line(format!("[+] Extracted {} files", files));
            }
            Event::ArchiveRemoved { .. } => {
                self.line("[✓] Cleaned up archive".to_string());
            }
            Event::ArchiveRemovalFailed { archive, error } => {
                self.line(format!(
                    "[!] Failed to delete archive {}: {}",
                    archive.display(),
                    error
                ));
            }
            Event::Complete { path } => {
                self.line(format!("[✓] Staged into {}. Done!", path.display()));
            }
            Event::Failed { stage, .. } => {
                if let Some(bar) = self.bar.take() {
                    bar.abandon();
                }
                // The error itself is printed by the caller
                if *stage == Stage::Download {
                    self.line("[!] Download aborted".to_string());
                }
            }
        }
    }

    fn start_bar(&mut self, total: Option<u64>) {
        self.clear_bar();

        let bar = match total {
            Some(len) if len > 0 => {
                let bar = ProgressBar::new(len);
                match bar_style(BAR_TEMPLATE) {
                    Some(style) => bar.with_style(style),
                    None => bar,
                }
            }
            _ => {
                let bar = ProgressBar::new_spinner();
                match bar_style(SPINNER_TEMPLATE) {
                    Some(style) => bar.with_style(style),
                    None => bar,
                }
            }
        };
        if self.hidden {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        self.bar = Some(bar);
    }

    fn clear_bar(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn line(&self, msg: String) {
        match &self.bar {
            Some(bar) if !self.hidden => bar.println(msg),
            _ => println!("{}", msg),
        }
    }
}
