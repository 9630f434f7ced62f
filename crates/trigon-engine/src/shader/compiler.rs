use crate::backend::{GraphicsBackend, StageId};

use super::{CompileError, ShaderSource, StageInterface, StageKind};

/// A stage that passed compilation and owns one backend shader object.
///
/// Not `Clone`: ownership moves into [`ShaderProgram::link`](super::ShaderProgram::link),
/// which requests the stage's release once linking is done.
#[derive(Debug)]
pub struct CompiledStage {
    id: StageId,
    kind: StageKind,
    interface: StageInterface,
}

impl CompiledStage {
    pub fn id(&self) -> StageId {
        self.id
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn interface(&self) -> &StageInterface {
        &self.interface
    }

    /// Requests release of a stage that will not be linked.
    pub fn release<B>(self, backend: &mut B)
    where
        B: GraphicsBackend + ?Sized,
    {
        backend.release_shader(self.id);
    }
}

/// Compiles WGSL stages.
///
/// Parsing and validation run on the CPU through naga; the backend is only
/// asked for a shader object once the source is known to be valid.
pub struct ShaderCompiler {
    validator: naga::valid::Validator,
}

impl ShaderCompiler {
    pub fn new() -> Self {
        Self {
            validator: naga::valid::Validator::new(
                naga::valid::ValidationFlags::all(),
                naga::valid::Capabilities::default(),
            ),
        }
    }

    /// Compiles `source` and allocates one shader object on `backend`.
    pub fn compile<B>(
        &mut self,
        backend: &mut B,
        source: &ShaderSource,
    ) -> Result<CompiledStage, CompileError>
    where
        B: GraphicsBackend + ?Sized,
    {
        let interface = self.check(source)?;
        let id = backend.create_shader(source.kind(), source.text(), &interface);

        log::debug!(
            "compiled {} stage `{}` ({} inputs, {} outputs, {} uniforms)",
            source.kind(),
            interface.entry_point,
            interface.inputs.len(),
            interface.outputs.len(),
            interface.uniforms.len(),
        );

        Ok(CompiledStage {
            id,
            kind: source.kind(),
            interface,
        })
    }

    /// Parses, validates and reflects `source` without touching a backend.
    pub fn check(&mut self, source: &ShaderSource) -> Result<StageInterface, CompileError> {
        let kind = source.kind();
        let text = source.text();

        let module = naga::front::wgsl::parse_str(text)
            .map_err(|e| CompileError::new(kind, e.emit_to_string(text)))?;

        self.validator
            .validate(&module)
            .map_err(|e| CompileError::new(kind, e.emit_to_string(text)))?;

        let entry = module
            .entry_points
            .iter()
            .find(|ep| ep.stage == kind.naga_stage())
            .ok_or_else(|| {
                let log = if source.is_empty() {
                    format!("empty source has no @{kind} entry point")
                } else {
                    format!("no @{kind} entry point found")
                };
                CompileError::new(kind, log)
            })?;

        Ok(StageInterface::reflect(&module, entry))
    }
}

impl Default for ShaderCompiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Call, RecordingBackend};
    use crate::shader::UniformLocation;
    use crate::testing::{CUBE_VS, TRIANGLE_FS, TRIANGLE_VS};

    fn vertex(text: &str) -> ShaderSource {
        ShaderSource::new(StageKind::Vertex, text)
    }

    #[test]
    fn compiles_vertex_stage_and_allocates_one_shader() {
        let mut backend = RecordingBackend::new();
        let stage = ShaderCompiler::new()
            .compile(&mut backend, &vertex(TRIANGLE_VS))
            .unwrap();

        assert_eq!(stage.kind(), StageKind::Vertex);
        assert_eq!(stage.interface().entry_point, "vs_main");
        assert_eq!(stage.interface().inputs, vec![0]);
        assert!(stage.interface().outputs.is_empty());
        assert_eq!(
            backend.calls(),
            &[Call::CreateShader { kind: StageKind::Vertex }]
        );
    }

    #[test]
    fn reflects_uniforms_and_struct_outputs() {
        let interface = ShaderCompiler::new().check(&vertex(CUBE_VS)).unwrap();

        assert_eq!(interface.outputs, vec![0]);
        let mvp = interface.uniform("uMVP").unwrap();
        assert_eq!(mvp.location, UniformLocation::new(0, 0));
        assert_eq!(mvp.size, 64);
    }

    #[test]
    fn syntax_error_never_reaches_backend() {
        let mut backend = RecordingBackend::new();
        let err = ShaderCompiler::new()
            .compile(&mut backend, &vertex("@vertex fn vs_main( -> {"))
            .unwrap_err();

        assert_eq!(err.stage, StageKind::Vertex);
        assert!(!err.log.is_empty());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn type_error_is_a_compile_error() {
        let src = "@vertex\nfn vs_main() -> @builtin(position) vec4<f32> {\n    return 1.0;\n}\n";
        let err = ShaderCompiler::new().check(&vertex(src)).unwrap_err();
        assert_eq!(err.stage, StageKind::Vertex);
    }

    #[test]
    fn empty_source_is_a_compile_error() {
        let mut backend = RecordingBackend::new();
        let err = ShaderCompiler::new()
            .compile(&mut backend, &ShaderSource::new(StageKind::Fragment, ""))
            .unwrap_err();

        assert_eq!(err.stage, StageKind::Fragment);
        assert!(err.log.contains("@fragment"));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn wrong_stage_kind_is_a_compile_error() {
        let err = ShaderCompiler::new()
            .check(&ShaderSource::new(StageKind::Fragment, TRIANGLE_VS))
            .unwrap_err();
        assert_eq!(err.stage, StageKind::Fragment);
    }

    #[test]
    fn compilation_is_deterministic() {
        let mut compiler = ShaderCompiler::new();
        let a = compiler.check(&ShaderSource::new(StageKind::Fragment, TRIANGLE_FS)).unwrap();
        let b = compiler.check(&ShaderSource::new(StageKind::Fragment, TRIANGLE_FS)).unwrap();
        assert_eq!(a, b);
    }
}
