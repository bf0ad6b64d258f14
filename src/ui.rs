use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

/// Plain-mode status lines are throttled to this interval.
#[allow(dead_code)]
const PLAIN_STATUS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
    disable_pretty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, is_tty: bool, disable_pretty: bool) -> Self {
        Self {
            mode,
            is_tty,
            disable_pretty,
        }
    }

    pub fn from_args(ui_flag: Option<&str>, is_tty: bool, disable_pretty: bool) -> Self {
        let mode = match ui_flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            _ => UiMode::Auto,
        };
        Self::new(mode, is_tty, disable_pretty)
    }

    fn use_pretty(&self) -> bool {
        self.is_tty
            && match self.mode {
                UiMode::Pretty => true,
                UiMode::Auto => !self.disable_pretty,
                UiMode::Plain => false,
            }
    }

    pub fn stage(&self, name: &str) -> StageGuard {
        if self.use_pretty() {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.set_message(format!("{name}…"));
            StageGuard::new(name.to_string(), Some(spinner))
        } else {
            eprintln!("==> {}", name);
            StageGuard::new(name.to_string(), None)
        }
    }

    /// Live per-frame status. `total` is the announced frame count, if any.
    #[allow(dead_code)]
    pub fn frames(&self, total: Option<u64>) -> FrameProgress {
        if self.use_pretty() {
            let bar = match total {
                Some(total) => ProgressBar::new(total),
                None => ProgressBar::new_spinner(),
            };
            bar.set_draw_target(ProgressDrawTarget::stderr());
            let template = match total {
                Some(_) => "{bar:30} {pos}/{len} {msg}",
                None => "{spinner} {pos} {msg}",
            };
            let style = ProgressStyle::with_template(template)
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            bar.set_style(style);
            FrameProgress {
                bar: Some(bar),
                last_plain: None,
            }
        } else {
            FrameProgress {
                bar: None,
                last_plain: None,
            }
        }
    }
}

pub struct StageGuard {
    name: String,
    start: Instant,
    spinner: Option<ProgressBar>,
}

impl StageGuard {
    fn new(name: String, spinner: Option<ProgressBar>) -> Self {
        Self {
            name,
            start: Instant::now(),
            spinner,
        }
    }
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let message = format!("✔ {} ({})", self.name, format_duration(elapsed));
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(message);
        } else {
            eprintln!("{message}");
        }
    }
}

#[allow(dead_code)]
pub struct FrameProgress {
    bar: Option<ProgressBar>,
    last_plain: Option<Instant>,
}

#[allow(dead_code)]
impl FrameProgress {
    /// Show `status` for the frame just processed. `force` bypasses plain-mode
    /// throttling (used for alarm edges).
    pub fn update(&mut self, status: &str, force: bool) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
            bar.set_message(status.to_string());
            return;
        }
        let due = self
            .last_plain
            .map_or(true, |at| at.elapsed() >= PLAIN_STATUS_INTERVAL);
        if force || due {
            eprintln!("{status}");
            self.last_plain = Some(Instant::now());
        }
    }

    pub fn finish(self) {
        if let Some(bar) = self.bar {
            bar.finish();
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_plain_without_a_terminal() {
        let ui = Ui::new(UiMode::Pretty, false, false);
        assert!(ui.frames(Some(10)).bar.is_none());
    }

    #[test]
    fn plain_progress_throttles_unforced_updates() {
        let ui = Ui::new(UiMode::Plain, true, false);
        let mut progress = ui.frames(None);
        assert!(progress.bar.is_none());

        progress.update("Frame: 0/? | Alarm: OFF", false);
        let first = progress.last_plain;
        assert!(first.is_some());
        progress.update("Frame: 1/? | Alarm: OFF", false);
        assert_eq!(progress.last_plain, first);
        progress.update("Frame: 2/? | Alarm: ON", true);
        assert!(progress.last_plain >= first);
        progress.finish();
    }
}
