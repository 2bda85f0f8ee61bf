//! State shared by commands across documents: settings, messages, open
//! dialogs and the paint colors.

use crate::buffer::{BufferError, Rgba};
use crate::config::SessionConfig;
use crate::dialogs::DialogRegistry;
use crate::document::Document;
use crate::error::CommandError;
use crate::geometry::Unit;
use crate::message::MessageLog;
use crate::progress::{Progress, ProgressFactory, TracingProgressFactory};

/// The view a command was invoked from.
pub trait Display {
    /// Unit the view measures in.
    fn unit(&self) -> Unit;

    /// The view's own progress indicator.
    fn progress(&mut self) -> &mut dyn Progress;
}

/// One editing session.
pub struct Session {
    pub config: SessionConfig,
    pub messages: MessageLog,
    pub dialogs: DialogRegistry,
    pub foreground: Rgba,
    pub background: Rgba,
    progress_factory: Box<dyn ProgressFactory>,
}

impl Session {
    /// A session reporting standalone progress to the log.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_progress_factory(config, Box::new(TracingProgressFactory))
    }

    pub fn with_progress_factory(config: SessionConfig, progress_factory: Box<dyn ProgressFactory>) -> Self {
        Self {
            config,
            messages: MessageLog::new(),
            dialogs: DialogRegistry::new(),
            foreground: [0, 0, 0, 255],
            background: [255, 255, 255, 255],
            progress_factory,
        }
    }

    /// A document using this session's history depth.
    pub fn new_document(&self, width: u32, height: u32) -> Result<Document, BufferError> {
        Document::with_history(width, height, self.config.history.max_undo_levels)
    }

    /// Show a command error to the user.
    pub fn report(&mut self, err: &CommandError) {
        self.messages.report(err.severity(), err.to_string());
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("messages", &self.messages)
            .field("dialogs", &self.dialogs)
            .field("foreground", &self.foreground)
            .field("background", &self.background)
            .finish_non_exhaustive()
    }
}

/// What a command runs against besides the document.
pub struct ActionContext<'a> {
    pub session: &'a mut Session,
    pub display: Option<&'a mut dyn Display>,
}

impl<'a> ActionContext<'a> {
    /// A context without a view, as when invoked from a dockable.
    pub fn new(session: &'a mut Session) -> Self {
        Self {
            session,
            display: None,
        }
    }

    pub fn with_display(session: &'a mut Session, display: &'a mut dyn Display) -> Self {
        Self {
            session,
            display: Some(display),
        }
    }

    pub fn display_unit(&self) -> Option<Unit> {
        self.display.as_ref().map(|d| d.unit())
    }

    /// The view's progress, if any, and the factory for standalone progress.
    pub fn progress_parts(&mut self) -> (Option<&mut dyn Progress>, &mut dyn ProgressFactory) {
        let display = self.display.as_deref_mut().map(|d| d.progress());
        (display, self.session.progress_factory.as_mut())
    }

    pub fn report(&mut self, err: &CommandError) {
        self.session.report(err);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::TestDisplay;
    use super::*;
    use crate::message::Severity;
    use crate::progress::testing::{ProgressLog, RecordingFactory};

    #[test]
    fn test_report_uses_error_severity() {
        let mut session = Session::default();
        session.report(&CommandError::AlreadyMinimal);
        session.report(&CommandError::EmptySelection);

        let messages = session.messages.drain();
        assert_eq!(messages[0].severity, Severity::Info);
        assert_eq!(messages[1].severity, Severity::Warning);
        assert_eq!(
            messages[1].text,
            "Cannot crop because the current selection is empty."
        );
    }

    #[test]
    fn test_new_document_uses_history_depth() {
        let mut config = SessionConfig::default();
        config.history.max_undo_levels = 1;
        let session = Session::new(config);

        let mut doc = session.new_document(4, 4).unwrap();
        doc.set_selection(crate::document::Selection::all(4, 4)).unwrap();
        doc.set_selection(crate::document::Selection::none(4, 4)).unwrap();
        assert_eq!(doc.undo_labels().len(), 1);
    }

    #[test]
    fn test_progress_parts_prefers_display() {
        let factory = RecordingFactory::new();
        let factory_log = factory.log.clone();
        let mut session = Session::with_progress_factory(SessionConfig::default(), Box::new(factory));
        let display_log = std::rc::Rc::new(std::cell::RefCell::new(ProgressLog::default()));
        let mut display = TestDisplay::new(Unit::Inch, display_log.clone());

        let mut ctx = ActionContext::with_display(&mut session, &mut display);
        assert_eq!(ctx.display_unit(), Some(Unit::Inch));
        let (progress, _factory) = ctx.progress_parts();
        progress.unwrap().start("Scaling", false);

        assert_eq!(display_log.borrow().events, vec!["start:Scaling"]);
        assert_eq!(factory_log.borrow().created, 0);
    }

    #[test]
    fn test_context_without_display() {
        let mut session = Session::default();
        let mut ctx = ActionContext::new(&mut session);
        assert_eq!(ctx.display_unit(), None);
        assert!(ctx.progress_parts().0.is_none());
    }
}
