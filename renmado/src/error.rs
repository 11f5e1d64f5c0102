use std::fmt::Display;

use renmado_ipc::{ErrorKind, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No display available")]
    NoDisplay,

    #[error("Monitor index {index} out of range (have {count})")]
    InvalidMonitor { index: i32, count: usize },

    #[error("No main window found for pid {0}")]
    WindowNotFound(i32),

    #[error("{operation} failed: {message}")]
    OsOperationFailed {
        operation: &'static str,
        message: String,
    },

    #[error("Accessibility permission not granted")]
    PermissionDenied,

    #[error("Unsupported platform")]
    Unsupported,
}

impl Error {
    pub fn os(operation: &'static str, message: impl Display) -> Self {
        Error::OsOperationFailed {
            operation,
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::NoDisplay => ErrorKind::NoDisplay,
            Error::InvalidMonitor { .. } => ErrorKind::InvalidMonitor,
            Error::WindowNotFound(_) => ErrorKind::WindowNotFound,
            Error::OsOperationFailed { .. } => ErrorKind::OsOperationFailed,
            Error::PermissionDenied => ErrorKind::PermissionDenied,
            Error::Unsupported => ErrorKind::Unsupported,
        }
    }
}

impl From<Error> for Response {
    fn from(err: Error) -> Self {
        Response::error(err.kind(), err.to_string())
    }
}
