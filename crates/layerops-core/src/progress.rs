//! Progress reporting for long-running mutations.
//!
//! A [`ProgressScope`] brackets one mutation with exactly one `start`/`end`
//! pair. It either borrows the progress of the active display or owns a
//! standalone surface made by a [`ProgressFactory`]; an owned surface is
//! dropped (destroyed) as soon as the scope has ended it.

/// A user-visible progress indicator.
pub trait Progress {
    /// Begin reporting. `cancelable` is informational; mutations here cannot
    /// be cancelled.
    fn start(&mut self, message: &str, cancelable: bool);

    /// Report completion as a fraction in `0.0..=1.0`.
    fn set_value(&mut self, _fraction: f64) {}

    /// Stop reporting.
    fn end(&mut self);

    fn is_active(&self) -> bool;
}

/// Creates standalone progress surfaces when no display is available.
pub trait ProgressFactory {
    fn create(&mut self) -> Box<dyn Progress>;
}

/// Progress that writes to the `tracing` log.
#[derive(Debug, Default)]
pub struct TracingProgress {
    message: Option<String>,
    value: f64,
}

impl TracingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Progress for TracingProgress {
    fn start(&mut self, message: &str, cancelable: bool) {
        tracing::debug!(message, cancelable, "progress started");
        self.message = Some(message.to_string());
        self.value = 0.0;
    }

    fn set_value(&mut self, fraction: f64) {
        self.value = fraction.clamp(0.0, 1.0);
        tracing::trace!(message = self.message.as_deref(), value = self.value, "progress");
    }

    fn end(&mut self) {
        if let Some(message) = self.message.take() {
            tracing::debug!(message, "progress ended");
        }
    }

    fn is_active(&self) -> bool {
        self.message.is_some()
    }
}

/// Factory for [`TracingProgress`] surfaces.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressFactory;

impl ProgressFactory for TracingProgressFactory {
    fn create(&mut self) -> Box<dyn Progress> {
        Box::new(TracingProgress::new())
    }
}

enum Surface<'a> {
    Borrowed(&'a mut dyn Progress),
    Owned(Box<dyn Progress>),
}

/// Scoped start/end bracket around one mutation.
///
/// Ending happens at most once, either through [`ProgressScope::finish`] or
/// when the scope is dropped on an early return.
pub struct ProgressScope<'a> {
    surface: Surface<'a>,
    ended: bool,
}

impl<'a> ProgressScope<'a> {
    /// Start progress on `display` if given, otherwise on a new standalone
    /// surface from `factory`.
    pub fn begin(
        display: Option<&'a mut dyn Progress>,
        factory: &mut dyn ProgressFactory,
        message: &str,
    ) -> Self {
        let mut surface = match display {
            Some(progress) => Surface::Borrowed(progress),
            None => Surface::Owned(factory.create()),
        };
        match &mut surface {
            Surface::Borrowed(progress) => progress.start(message, false),
            Surface::Owned(progress) => progress.start(message, false),
        }
        Self {
            surface,
            ended: false,
        }
    }

    /// The progress being reported to.
    pub fn progress(&mut self) -> &mut dyn Progress {
        match &mut self.surface {
            Surface::Borrowed(progress) => &mut **progress,
            Surface::Owned(progress) => progress.as_mut(),
        }
    }

    /// Whether the scope created its own surface.
    pub fn is_standalone(&self) -> bool {
        matches!(self.surface, Surface::Owned(_))
    }

    /// End the scope; a standalone surface is destroyed right after.
    pub fn finish(self) {}

    fn close(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.progress().end();
    }
}

impl Drop for ProgressScope<'_> {
    fn drop(&mut self) {
        self.close();
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{RecordingFactory, RecordingProgress};
    use super::*;

    #[test]
    fn test_standalone_scope_lifecycle() {
        let mut factory = RecordingFactory::new();
        let log = factory.log.clone();

        let mut scope = ProgressScope::begin(None, &mut factory, "Scaling");
        assert!(scope.is_standalone());
        assert!(scope.progress().is_active());
        scope.progress().set_value(0.5);
        scope.finish();

        let log = log.borrow();
        assert_eq!(log.created, 1);
        assert_eq!(log.destroyed, 1);
        assert_eq!(
            log.events,
            vec!["create", "start:Scaling", "value", "end", "destroy"]
        );
    }

    #[test]
    fn test_display_scope_is_not_destroyed() {
        let mut factory = RecordingFactory::new();
        let log = factory.log.clone();
        let mut display = RecordingProgress::display(log.clone());

        {
            let scope = ProgressScope::begin(Some(&mut display), &mut factory, "Scaling");
            assert!(!scope.is_standalone());
        }

        assert!(!display.is_active());
        let log = log.borrow();
        assert_eq!(log.created, 0);
        assert_eq!(log.destroyed, 0);
        assert_eq!(log.events, vec!["start:Scaling", "end"]);
    }

    #[test]
    fn test_drop_ends_exactly_once() {
        let mut factory = RecordingFactory::new();
        let log = factory.log.clone();

        let run = |factory: &mut RecordingFactory| -> Result<(), &'static str> {
            let _scope = ProgressScope::begin(None, factory, "Scaling");
            Err("mutation failed")
        };
        assert!(run(&mut factory).is_err());

        let log = log.borrow();
        let ends = log.events.iter().filter(|e| *e == "end").count();
        assert_eq!(ends, 1);
        assert_eq!(log.destroyed, 1);
    }

    #[test]
    fn test_tracing_progress() {
        let mut progress = TracingProgress::new();
        assert!(!progress.is_active());
        progress.start("Scaling", false);
        progress.set_value(1.5);
        assert_eq!(progress.value(), 1.0);
        progress.end();
        assert!(!progress.is_active());
    }
}
