use std::process::ExitCode;

use crate::geometry::GeometryError;
use crate::shader::{CompileError, LinkError};

use super::LoopState;

/// Failure while bringing the render loop to `Running`.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("failed to create window: {0}")]
    Window(String),

    #[error("failed to initialize GPU: {0}")]
    Gpu(String),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error("invalid geometry: {0}")]
    Geometry(#[from] GeometryError),

    #[error("render loop cannot be initialized in state {0:?}")]
    InvalidState(LoopState),
}

/// Final status of a run.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ExitStatus {
    /// Closed by the user or the window manager.
    #[default]
    Success,
    /// Initialization failed; nothing was rendered.
    Failure,
}

impl ExitStatus {
    /// Process exit code: 0, or 255 (-1 as an unsigned byte).
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => u8::MAX,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::StageKind;

    #[test]
    fn exit_codes() {
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::Failure.code(), 255);
        assert_eq!(ExitStatus::Failure.code() as i8, -1);
    }

    #[test]
    fn compile_error_message_is_kept() {
        let err: InitError = CompileError::new(StageKind::Fragment, "bad token").into();
        let msg = err.to_string();
        assert!(msg.contains("fragment"));
        assert!(msg.contains("bad token"));
    }
}
