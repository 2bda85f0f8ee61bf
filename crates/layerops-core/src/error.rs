//! Error types for layer commands.

use thiserror::Error;

use crate::buffer::BufferError;
use crate::document::LayerId;
use crate::message::Severity;

/// Why a command did not apply.
///
/// Every variant is handled at the command boundary and surfaced to the user
/// as a message; none of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Width or height was zero or negative.
    #[error("Both width and height must be greater than zero (got {width}x{height}).")]
    InvalidDimensions { width: i64, height: i64 },

    /// Width or height exceeded the largest supported layer size.
    #[error("Width and height must not exceed {max} pixels (got {width}x{height}).", max = crate::geometry::MAX_DIMENSION)]
    DimensionsTooLarge { width: i64, height: i64 },

    /// Crop-to-content found nothing to keep.
    #[error("Cannot crop because the active layer has no content.")]
    EmptyContent,

    /// Crop-to-content found content touching every edge.
    #[error("Cannot crop because the active layer is already cropped to its content.")]
    AlreadyMinimal,

    /// The document refused the mutation.
    #[error("{0}")]
    MutationRejected(String),

    /// The command needs an active layer and there is none.
    #[error("There is no active layer.")]
    NoActiveLayer,

    /// A layer id does not belong to the document.
    #[error("Layer {0} does not exist.")]
    NoSuchLayer(LayerId),

    /// The selection is empty where one is required.
    #[error("Cannot crop because the current selection is empty.")]
    EmptySelection,

    /// Pixel storage rejected the operation.
    #[error("Pixel buffer error: {0}")]
    Buffer(#[from] BufferError),
}

impl CommandError {
    /// Shorthand for [`CommandError::MutationRejected`].
    pub fn rejected(reason: impl Into<String>) -> Self {
        CommandError::MutationRejected(reason.into())
    }

    /// How the error is presented to the user.
    pub fn severity(&self) -> Severity {
        match self {
            CommandError::EmptyContent | CommandError::AlreadyMinimal => Severity::Info,
            _ => Severity::Warning,
        }
    }
}
