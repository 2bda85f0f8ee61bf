//! Progress surfaces for the browser.
//!
//! On wasm32 progress goes to the browser console; elsewhere (native test
//! runs) it falls back to the core's tracing progress.

use layerops_core::progress::{Progress, ProgressFactory};

/// Progress that logs its start, completion and end to `console`.
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    message: Option<String>,
    percent: u32,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last reported completion, in whole percent.
    pub fn percent(&self) -> u32 {
        self.percent
    }
}

#[cfg(target_arch = "wasm32")]
fn log(line: &str) {
    web_sys::console::log_1(&line.into());
}

#[cfg(not(target_arch = "wasm32"))]
fn log(line: &str) {
    tracing::debug!(target: "console", "{line}");
}

impl Progress for ConsoleProgress {
    fn start(&mut self, message: &str, _cancelable: bool) {
        log(&format!("{message}..."));
        self.message = Some(message.to_string());
        self.percent = 0;
    }

    fn set_value(&mut self, fraction: f64) {
        let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u32;
        // Only whole-percent changes reach the console
        if percent != self.percent {
            self.percent = percent;
            if let Some(message) = &self.message {
                log(&format!("{message}: {percent}%"));
            }
        }
    }

    fn end(&mut self) {
        if let Some(message) = self.message.take() {
            log(&format!("{message}: done"));
        }
    }

    fn is_active(&self) -> bool {
        self.message.is_some()
    }
}

/// Factory for [`ConsoleProgress`] surfaces.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgressFactory;

impl ProgressFactory for ConsoleProgressFactory {
    fn create(&mut self) -> Box<dyn Progress> {
        Box::new(ConsoleProgress::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_progress_lifecycle() {
        let mut progress = ConsoleProgress::new();
        assert!(!progress.is_active());

        progress.start("Scaling", false);
        assert!(progress.is_active());
        progress.set_value(0.5);
        assert_eq!(progress.percent(), 50);
        progress.set_value(7.0);
        assert_eq!(progress.percent(), 100);

        progress.end();
        assert!(!progress.is_active());
    }

    #[test]
    fn test_factory_creates_idle_surface() {
        let progress = ConsoleProgressFactory.create();
        assert!(!progress.is_active());
    }
}
