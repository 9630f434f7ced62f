/// Resource binding of a uniform: `@group(g) @binding(b)` in WGSL.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct UniformLocation {
    pub group: u32,
    pub binding: u32,
}

impl UniformLocation {
    #[inline]
    pub const fn new(group: u32, binding: u32) -> Self {
        Self { group, binding }
    }
}

/// A named uniform declared by a shader stage.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformBinding {
    pub name: String,
    pub location: UniformLocation,
    /// Size of the uniform's type in bytes.
    pub size: u32,
}

/// Reflected inputs, outputs and uniforms of one compiled stage.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct StageInterface {
    pub entry_point: String,
    /// `@location` indices consumed by the entry point.
    pub inputs: Vec<u32>,
    /// `@location` indices written by the entry point.
    pub outputs: Vec<u32>,
    pub uniforms: Vec<UniformBinding>,
    /// Bound resources other than uniform buffers (storage buffers, textures,
    /// samplers), described for diagnostics. Programs cannot use these.
    pub unsupported_bindings: Vec<String>,
}

impl StageInterface {
    pub(crate) fn reflect(module: &naga::Module, entry: &naga::EntryPoint) -> Self {
        let mut inputs = Vec::new();
        for arg in &entry.function.arguments {
            push_locations(module, arg.binding.as_ref(), arg.ty, &mut inputs);
        }

        let mut outputs = Vec::new();
        if let Some(result) = &entry.function.result {
            push_locations(module, result.binding.as_ref(), result.ty, &mut outputs);
        }

        inputs.sort_unstable();
        outputs.sort_unstable();

        let mut uniforms = Vec::new();
        let mut unsupported_bindings = Vec::new();
        for (_, var) in module.global_variables.iter() {
            let Some(binding) = &var.binding else {
                continue;
            };
            let name = var.name.as_deref().unwrap_or("<unnamed>");

            let kind = match var.space {
                naga::AddressSpace::Uniform => {
                    uniforms.push(UniformBinding {
                        name: name.to_owned(),
                        location: UniformLocation::new(binding.group, binding.binding),
                        size: module.types[var.ty].inner.size(module.to_ctx()),
                    });
                    continue;
                }
                naga::AddressSpace::Storage { .. } => "storage buffer",
                naga::AddressSpace::Handle => "texture or sampler",
                _ => "resource",
            };
            unsupported_bindings.push(format!(
                "{kind} `{name}` at @group({}) @binding({})",
                binding.group, binding.binding
            ));
        }
        uniforms.sort_by_key(|u| u.location);

        Self {
            entry_point: entry.name.clone(),
            inputs,
            outputs,
            uniforms,
            unsupported_bindings,
        }
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformBinding> {
        self.uniforms.iter().find(|u| u.name == name)
    }
}

/// Collects `@location` indices from a binding, descending into struct members
/// when the value itself carries no binding.
fn push_locations(
    module: &naga::Module,
    binding: Option<&naga::Binding>,
    ty: naga::Handle<naga::Type>,
    out: &mut Vec<u32>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => out.push(*location),
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    push_locations(module, member.binding.as_ref(), member.ty, out);
                }
            }
        }
    }
}
