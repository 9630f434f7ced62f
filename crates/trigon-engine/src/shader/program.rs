use std::collections::HashMap;

use crate::backend::{GraphicsBackend, ProgramId};
use crate::render::ActiveProgram;

use super::{CompiledStage, LinkError, StageKind, UniformBinding, UniformLocation};

/// A linked vertex + fragment program.
///
/// A value of this type only exists after a successful link; there is no
/// unlinked or partially linked state to check for.
#[derive(Debug)]
pub struct ShaderProgram {
    id: ProgramId,
    /// Lookups resolved so far, including misses.
    uniform_cache: HashMap<String, Option<UniformLocation>>,
}

impl ShaderProgram {
    /// Links `vertex` and `fragment` into a program.
    ///
    /// Both stages are consumed. Their release is requested whether or not
    /// linking succeeds; a linked program keeps them alive on the backend
    /// until the program itself is released.
    pub fn link<B>(
        backend: &mut B,
        vertex: CompiledStage,
        fragment: CompiledStage,
    ) -> Result<Self, LinkError>
    where
        B: GraphicsBackend + ?Sized,
    {
        let linked = check_interfaces(&vertex, &fragment).and_then(|uniforms| {
            backend
                .link_program(vertex.id(), fragment.id(), &uniforms)
                .map_err(|e| LinkError::new(e.to_string()))
        });

        backend.release_shader(vertex.id());
        backend.release_shader(fragment.id());

        let id = linked?;
        log::debug!("linked shader program {id:?}");

        Ok(Self {
            id,
            uniform_cache: HashMap::new(),
        })
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Location of the uniform called `name`, or `None` if the program does
    /// not declare it.
    ///
    /// The first lookup of each name queries the backend; the answer is cached
    /// for the lifetime of the program.
    pub fn uniform_location<B>(&mut self, backend: &mut B, name: &str) -> Option<UniformLocation>
    where
        B: GraphicsBackend + ?Sized,
    {
        if let Some(cached) = self.uniform_cache.get(name) {
            return *cached;
        }

        let location = backend.uniform_location(self.id, name);
        if location.is_none() {
            log::debug!("uniform `{name}` is not declared by program {:?}", self.id);
        }
        self.uniform_cache.insert(name.to_owned(), location);
        location
    }

    /// Makes this the current program for subsequent uniform writes and draws.
    pub fn activate<'a, B>(&self, backend: &'a mut B) -> ActiveProgram<'a, B>
    where
        B: GraphicsBackend + ?Sized,
    {
        ActiveProgram::new(backend, self.id)
    }

    pub fn release<B>(self, backend: &mut B)
    where
        B: GraphicsBackend + ?Sized,
    {
        backend.release_program(self.id);
    }
}

/// Bind groups a program may use. Matches `wgpu::Limits::default()`, which is
/// what the device is created with.
pub const MAX_BIND_GROUPS: u32 = 4;

/// Checks that the two stages fit together and returns the program's merged
/// uniform set.
pub(crate) fn check_interfaces(
    vertex: &CompiledStage,
    fragment: &CompiledStage,
) -> Result<Vec<UniformBinding>, LinkError> {
    if vertex.kind() != StageKind::Vertex {
        return Err(LinkError::new(format!(
            "expected a vertex stage, got a {} stage",
            vertex.kind()
        )));
    }
    if fragment.kind() != StageKind::Fragment {
        return Err(LinkError::new(format!(
            "expected a fragment stage, got a {} stage",
            fragment.kind()
        )));
    }

    let unsupported: Vec<&str> = [vertex, fragment]
        .into_iter()
        .flat_map(|stage| &stage.interface().unsupported_bindings)
        .map(String::as_str)
        .collect();
    if !unsupported.is_empty() {
        return Err(LinkError::new(format!(
            "only uniform buffers can be bound; found {}",
            unsupported.join(", ")
        )));
    }

    let produced = &vertex.interface().outputs;
    let unmatched: Vec<String> = fragment
        .interface()
        .inputs
        .iter()
        .filter(|loc| !produced.contains(loc))
        .map(|loc| format!("@location({loc})"))
        .collect();
    if !unmatched.is_empty() {
        return Err(LinkError::new(format!(
            "fragment inputs not written by the vertex stage: {}",
            unmatched.join(", ")
        )));
    }

    let mut merged: Vec<UniformBinding> = vertex.interface().uniforms.clone();
    for u in &fragment.interface().uniforms {
        match merged.iter().find(|m| m.location == u.location || m.name == u.name) {
            None => merged.push(u.clone()),
            Some(m) if m == u => {}
            Some(m) => {
                return Err(LinkError::new(format!(
                    "uniform `{}` (@group({}) @binding({}), {} bytes) conflicts with `{}` (@group({}) @binding({}), {} bytes)",
                    u.name,
                    u.location.group,
                    u.location.binding,
                    u.size,
                    m.name,
                    m.location.group,
                    m.location.binding,
                    m.size,
                )));
            }
        }
    }
    merged.sort_by_key(|u| u.location);

    if let Some(u) = merged.iter().find(|u| u.location.group >= MAX_BIND_GROUPS) {
        return Err(LinkError::new(format!(
            "uniform `{}` uses @group({}), only {MAX_BIND_GROUPS} bind groups are available",
            u.name, u.location.group
        )));
    }

    Ok(merged)
}
