use crate::config::ConfigError;
use crate::dispatcher::Operation;
use core::fmt;
use std::io;
use surface_bridge_core::{PatchError, ReactTag, SurfaceId};
use thiserror::Error;

/// Something an operation was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Surface(SurfaceId),
    View(ReactTag),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Target::Surface(id) => write!(f, "surface {}", id),
            Target::View(tag) => write!(f, "view {}", tag),
        }
    }
}

/// Why an operation was dropped.
///
/// Everything except [`BridgeError::ThreadViolation`] is recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The surface or view is gone, or no longer accepts work.
    #[error("stale target: {0}")]
    StaleTarget(Target),

    /// A UI-thread-only operation was called from another thread.
    #[error("{operation} must be called on the UI thread")]
    ThreadViolation { operation: Operation },

    /// The command is unknown to the view’s manager, or its arguments don’t fit.
    #[error("unsupported command {command} for view {tag}: {reason}")]
    UnsupportedCommand {
        tag: ReactTag,
        command: String,
        reason: String,
    },

    #[error("surface {0} is already stopped")]
    DoubleTeardown(SurfaceId),

    /// A view manager or native view failed while applying an operation.
    #[error("view {tag} failed: {reason}")]
    ViewFailure { tag: ReactTag, reason: String },

    #[error("the bridge has been invalidated")]
    Invalidated,

    /// Every surface id the configuration allows has been handed out.
    #[error("surface ids are exhausted")]
    IdsExhausted,
}

impl BridgeError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, BridgeError::ThreadViolation { .. })
    }
}

impl From<PatchError> for BridgeError {
    fn from(error: PatchError) -> Self {
        match error {
            PatchError::NoSuchView(tag) => BridgeError::StaleTarget(Target::View(tag)),
            PatchError::View { tag, error } => BridgeError::ViewFailure {
                tag,
                reason: error.to_string(),
            },
            PatchError::DuplicateTag(tag)
            | PatchError::WrongSurface(tag, _)
            | PatchError::NotAChild(tag, _)
            | PatchError::Cycle(tag)
            | PatchError::UnknownViewManager(tag, _) => BridgeError::ViewFailure {
                tag,
                reason: error.to_string(),
            },
        }
    }
}

/// Errors from constructing a bridge.
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to spawn the event delivery thread")]
    EventThread(#[source] io::Error),
}
