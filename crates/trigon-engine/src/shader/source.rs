use std::fmt;
use std::path::{Path, PathBuf};

/// Pipeline stage a shader source is written for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    pub(crate) fn naga_stage(self) -> naga::ShaderStage {
        match self {
            StageKind::Vertex => naga::ShaderStage::Vertex,
            StageKind::Fragment => naga::ShaderStage::Fragment,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Vertex => "vertex",
            StageKind::Fragment => "fragment",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// WGSL text for a single stage.
///
/// Immutable once loaded. The text is treated as opaque until compilation.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    kind: StageKind,
    text: String,
    origin: Option<PathBuf>,
}

impl ShaderSource {
    pub fn new(kind: StageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            origin: None,
        }
    }

    /// Reads a whole shader file.
    ///
    /// An unreadable file is logged and yields an empty source. Empty sources
    /// never compile, so the failure surfaces as a `CompileError` for `kind`.
    pub fn load(kind: StageKind, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                log::error!("failed to open {kind} shader file {}: {e}", path.display());
                String::new()
            }
        };

        Self {
            kind,
            text,
            origin: Some(path.to_path_buf()),
        }
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// File the source was loaded from, if any.
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_reads_whole_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "@fragment\nfn fs_main() {{}}\n").unwrap();

        let src = ShaderSource::load(StageKind::Fragment, file.path());
        assert_eq!(src.kind(), StageKind::Fragment);
        assert_eq!(src.text(), "@fragment\nfn fs_main() {}\n");
        assert_eq!(src.origin(), Some(file.path()));
        assert!(!src.is_empty());
    }

    #[test]
    fn load_missing_file_degrades_to_empty_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = ShaderSource::load(StageKind::Vertex, dir.path().join("missing.vert.wgsl"));
        assert!(src.is_empty());
        assert_eq!(src.text(), "");
        assert_eq!(src.kind(), StageKind::Vertex);
    }

    #[test]
    fn stage_kind_display() {
        assert_eq!(StageKind::Vertex.to_string(), "vertex");
        assert_eq!(StageKind::Fragment.to_string(), "fragment");
    }
}
