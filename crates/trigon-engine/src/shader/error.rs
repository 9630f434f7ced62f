use super::StageKind;

/// A shader stage failed to compile.
///
/// `log` carries the compiler diagnostic, rendered against the source text.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{stage} shader failed to compile:\n{log}")]
pub struct CompileError {
    pub stage: StageKind,
    pub log: String,
}

impl CompileError {
    pub(crate) fn new(stage: StageKind, log: impl Into<String>) -> Self {
        Self {
            stage,
            log: log.into(),
        }
    }
}

/// Two stages could not be linked into a program.
#[derive(Debug, Clone, thiserror::Error)]
#[error("shader program failed to link:\n{log}")]
pub struct LinkError {
    pub log: String,
}

impl LinkError {
    pub(crate) fn new(log: impl Into<String>) -> Self {
        Self { log: log.into() }
    }
}
