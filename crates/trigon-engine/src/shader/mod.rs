//! Shader stages and programs.
//!
//! Sources are WGSL. Compilation (parse + validate + reflect) runs through
//! naga before the backend is asked for a GPU object, so every compile and
//! link failure is reported synchronously with a diagnostic log.

mod compiler;
mod error;
mod interface;
mod program;
mod source;

pub use compiler::{CompiledStage, ShaderCompiler};
pub use error::{CompileError, LinkError};
pub use interface::{StageInterface, UniformBinding, UniformLocation};
pub use program::{ShaderProgram, MAX_BIND_GROUPS};
pub use source::{ShaderSource, StageKind};
