use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use glam::Mat4;
use slotmap::SlotMap;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::device::{DepthTarget, Gpu, GpuInit, SurfaceErrorAction};
use crate::geometry::{Topology, VertexLayout};
use crate::paint::Color;
use crate::shader::{StageInterface, StageKind, UniformBinding, UniformLocation};

use super::{BackendError, BufferId, GraphicsBackend, ProgramId, StageId, StageTable};

struct StageModule {
    module: wgpu::ShaderModule,
    interface: StageInterface,
}

struct UniformSlot {
    name: String,
    location: UniformLocation,
    size: u32,
    buffer: wgpu::Buffer,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct PipelineKey {
    buffer: BufferId,
    topology: Topology,
    depth_test: bool,
}

struct ProgramSlot {
    vertex: StageId,
    fragment: StageId,
    uniforms: Vec<UniformSlot>,
    layout: wgpu::PipelineLayout,
    /// Indexed by bind group number.
    bind_groups: Vec<wgpu::BindGroup>,
    /// Render pipelines are created on first draw with a given buffer layout.
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

struct VertexBufferSlot {
    buffer: wgpu::Buffer,
    layout: Option<VertexLayout>,
}

#[derive(Debug, Copy, Clone)]
struct PendingDraw {
    program: ProgramId,
    key: PipelineKey,
    first: u32,
    count: u32,
}

/// [`GraphicsBackend`] rendering to a window surface through wgpu.
///
/// wgpu records work into command buffers, so the immediate-mode calls are
/// buffered: `clear` and `draw` are collected and replayed as a single render
/// pass in `present`. Uniform writes go straight to the queue and are visible
/// to every draw of the frame.
pub struct WgpuBackend {
    window: Arc<Window>,
    gpu: Gpu,
    depth: Option<DepthTarget>,

    stages: StageTable<StageModule>,
    programs: SlotMap<ProgramId, ProgramSlot>,
    buffers: SlotMap<BufferId, VertexBufferSlot>,

    current_program: Option<ProgramId>,
    bound_buffer: Option<BufferId>,
    viewport: PhysicalSize<u32>,

    pending_clear: Option<(Color, bool)>,
    pending_draws: Vec<PendingDraw>,

    warned: HashSet<&'static str>,
}

impl WgpuBackend {
    /// Creates the GPU context for `window`.
    pub async fn new(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        let gpu = Gpu::new(window.clone(), init).await?;
        let viewport = gpu.size();

        Ok(Self {
            window,
            gpu,
            depth: None,
            stages: StageTable::new(),
            programs: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
            current_program: None,
            bound_buffer: None,
            viewport,
            pending_clear: None,
            pending_draws: Vec::new(),
            warned: HashSet::new(),
        })
    }

    fn warn_once(&mut self, key: &'static str, message: std::fmt::Arguments<'_>) {
        if self.warned.insert(key) {
            log::warn!("{message}");
        }
    }

    fn uniform_buffers(
        device: &wgpu::Device,
        uniforms: &[UniformBinding],
    ) -> Vec<UniformSlot> {
        uniforms
            .iter()
            .map(|u| {
                let label = format!("trigon uniform `{}`", u.name);
                UniformSlot {
                    name: u.name.clone(),
                    location: u.location,
                    size: u.size,
                    buffer: device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some(label.as_str()),
                        size: u64::from(u.size.max(1)).next_multiple_of(16),
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    }),
                }
            })
            .collect()
    }

    /// Builds one bind group per group index, including empty ones for gaps.
    fn bind_groups(
        device: &wgpu::Device,
        uniforms: &[UniformSlot],
    ) -> (wgpu::PipelineLayout, Vec<wgpu::BindGroup>) {
        let group_count = uniforms
            .iter()
            .map(|u| u.location.group as usize + 1)
            .max()
            .unwrap_or(0);

        let mut layouts = Vec::with_capacity(group_count);
        let mut groups = Vec::with_capacity(group_count);

        for group in 0..group_count as u32 {
            let members: Vec<&UniformSlot> =
                uniforms.iter().filter(|u| u.location.group == group).collect();

            let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = members
                .iter()
                .map(|u| wgpu::BindGroupLayoutEntry {
                    binding: u.location.binding,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                })
                .collect();

            let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("trigon program bgl"),
                entries: &layout_entries,
            });

            let entries: Vec<wgpu::BindGroupEntry> = members
                .iter()
                .map(|u| wgpu::BindGroupEntry {
                    binding: u.location.binding,
                    resource: u.buffer.as_entire_binding(),
                })
                .collect();

            groups.push(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("trigon program bind group"),
                layout: &layout,
                entries: &entries,
            }));
            layouts.push(layout);
        }

        let layout_refs: Vec<&wgpu::BindGroupLayout> = layouts.iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("trigon program pipeline layout"),
            bind_group_layouts: &layout_refs,
            immediate_size: 0,
        });

        (pipeline_layout, groups)
    }

    /// Makes sure the pipeline for `draw` exists. Returns `false` if the draw
    /// cannot render anything.
    fn ensure_pipeline(&mut self, draw: &PendingDraw) -> bool {
        match self.programs.get(draw.program) {
            None => return false,
            Some(p) if p.pipelines.contains_key(&draw.key) => return true,
            Some(_) => {}
        }

        let Some(layout) = self
            .buffers
            .get(draw.key.buffer)
            .and_then(|b| b.layout.clone())
        else {
            self.warn_once(
                "draw-without-layout",
                format_args!("draw skipped: vertex buffer has no declared layout"),
            );
            return false;
        };

        let Some(missing) = self.missing_inputs(draw.program, &layout) else {
            return false;
        };
        if !missing.is_empty() {
            self.warn_once(
                "draw-missing-attributes",
                format_args!(
                    "draw skipped: vertex shader inputs {missing:?} have no attribute in the layout"
                ),
            );
            return false;
        }

        let Some(pipeline) = self.build_pipeline(draw, &layout) else {
            return false;
        };
        if let Some(program) = self.programs.get_mut(draw.program) {
            program.pipelines.insert(draw.key, pipeline);
        }
        true
    }

    /// Vertex shader inputs of `program` that `layout` does not feed.
    fn missing_inputs(&self, program: ProgramId, layout: &VertexLayout) -> Option<Vec<u32>> {
        let program = self.programs.get(program)?;
        let vs = self.stages.get(program.vertex)?;

        Some(
            vs.interface
                .inputs
                .iter()
                .copied()
                .filter(|loc| !layout.attributes.iter().any(|a| a.location == *loc))
                .collect(),
        )
    }

    fn build_pipeline(
        &self,
        draw: &PendingDraw,
        layout: &VertexLayout,
    ) -> Option<wgpu::RenderPipeline> {
        let program = self.programs.get(draw.program)?;
        let vs = self.stages.get(program.vertex)?;
        let fs = self.stages.get(program.fragment)?;

        let attributes: Vec<wgpu::VertexAttribute> = layout
            .attributes
            .iter()
            .filter_map(|a| {
                Some(wgpu::VertexAttribute {
                    format: a.vertex_format()?,
                    offset: u64::from(a.offset),
                    shader_location: a.location,
                })
            })
            .collect();

        let depth_stencil = draw.key.depth_test.then(|| wgpu::DepthStencilState {
            format: DepthTarget::FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });

        log::debug!(
            "creating pipeline for {:?} ({:?}, depth test {})",
            draw.program,
            draw.key.topology,
            draw.key.depth_test
        );

        Some(
            self.gpu
                .device()
                .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("trigon pipeline"),
                    layout: Some(&program.layout),

                    vertex: wgpu::VertexState {
                        module: &vs.module,
                        entry_point: Some(vs.interface.entry_point.as_str()),
                        compilation_options: Default::default(),
                        buffers: &[wgpu::VertexBufferLayout {
                            array_stride: u64::from(layout.stride),
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &attributes,
                        }],
                    },

                    fragment: Some(wgpu::FragmentState {
                        module: &fs.module,
                        entry_point: Some(fs.interface.entry_point.as_str()),
                        compilation_options: Default::default(),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: self.gpu.surface_format(),
                            blend: Some(wgpu::BlendState::REPLACE),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                    }),

                    primitive: wgpu::PrimitiveState {
                        topology: draw.key.topology.to_wgpu(),
                        strip_index_format: None,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode: None,
                        polygon_mode: wgpu::PolygonMode::Fill,
                        unclipped_depth: false,
                        conservative: false,
                    },

                    depth_stencil,
                    multisample: wgpu::MultisampleState::default(),
                    multiview_mask: None,
                    cache: None,
                }),
        )
    }

    fn forget_pipelines_for(&mut self, buffer: BufferId) {
        for program in self.programs.values_mut() {
            program.pipelines.retain(|key, _| key.buffer != buffer);
        }
    }
}

impl GraphicsBackend for WgpuBackend {
    fn create_shader(
        &mut self,
        kind: StageKind,
        source: &str,
        interface: &StageInterface,
    ) -> StageId {
        let module = self
            .gpu
            .device()
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(match kind {
                    StageKind::Vertex => "trigon vertex stage",
                    StageKind::Fragment => "trigon fragment stage",
                }),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

        self.stages.insert(StageModule {
            module,
            interface: interface.clone(),
        })
    }

    fn release_shader(&mut self, stage: StageId) {
        if !self.stages.contains(stage) {
            self.warn_once("stale-stage", format_args!("release of unknown shader stage {stage:?}"));
            return;
        }
        if self.stages.request_release(stage).is_some() {
            log::trace!("shader stage {stage:?} reclaimed");
        }
    }

    fn link_program(
        &mut self,
        vertex: StageId,
        fragment: StageId,
        uniforms: &[UniformBinding],
    ) -> Result<ProgramId, BackendError> {
        if !self.stages.contains(vertex) || !self.stages.contains(fragment) {
            return Err(BackendError::StaleHandle("shader stage"));
        }

        let device = self.gpu.device();
        let uniform_slots = Self::uniform_buffers(device, uniforms);
        let (layout, bind_groups) = Self::bind_groups(device, &uniform_slots);

        self.stages.retain(vertex);
        self.stages.retain(fragment);

        Ok(self.programs.insert(ProgramSlot {
            vertex,
            fragment,
            uniforms: uniform_slots,
            layout,
            bind_groups,
            pipelines: HashMap::new(),
        }))
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.programs
            .get(program)?
            .uniforms
            .iter()
            .find(|u| u.name == name)
            .map(|u| u.location)
    }

    fn use_program(&mut self, program: ProgramId) {
        if self.programs.contains_key(program) {
            self.current_program = Some(program);
        } else {
            self.current_program = None;
            self.warn_once("stale-program", format_args!("use of unknown program {program:?}"));
        }
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4) {
        const MAT4_SIZE: u32 = std::mem::size_of::<[f32; 16]>() as u32;

        let Some(slot) = self
            .current_program
            .and_then(|id| self.programs.get(id))
            .and_then(|p| p.uniforms.iter().find(|u| u.location == location))
        else {
            self.warn_once(
                "uniform-without-program",
                format_args!("uniform write to {location:?} ignored: no active program declares it"),
            );
            return;
        };

        if slot.size < MAT4_SIZE {
            let size = slot.size;
            self.warn_once(
                "uniform-too-small",
                format_args!("uniform at {location:?} is {size} bytes, too small for a mat4x4<f32>"),
            );
            return;
        }

        self.gpu
            .queue()
            .write_buffer(&slot.buffer, 0, bytemuck::cast_slice(&value.to_cols_array()));
    }

    fn release_program(&mut self, program: ProgramId) {
        let Some(slot) = self.programs.remove(program) else {
            self.warn_once("stale-program", format_args!("release of unknown program {program:?}"));
            return;
        };

        self.stages.unretain(slot.vertex);
        self.stages.unretain(slot.fragment);
        self.pending_draws.retain(|d| d.program != program);

        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn create_vertex_buffer(&mut self, data: &[f32]) -> BufferId {
        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("trigon vertex buffer"),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });

        self.buffers.insert(VertexBufferSlot {
            buffer,
            layout: None,
        })
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferId) {
        if self.buffers.contains_key(buffer) {
            self.bound_buffer = Some(buffer);
        } else {
            self.bound_buffer = None;
            self.warn_once("stale-buffer", format_args!("bind of unknown vertex buffer {buffer:?}"));
        }
    }

    fn declare_vertex_layout(&mut self, layout: &VertexLayout) {
        let Some(id) = self.bound_buffer else {
            self.warn_once(
                "layout-without-buffer",
                format_args!("vertex layout declared with no vertex buffer bound"),
            );
            return;
        };

        if let Some(slot) = self.buffers.get_mut(id) {
            slot.layout = Some(layout.clone());
        }
        self.forget_pipelines_for(id);
    }

    fn release_vertex_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(buffer).is_none() {
            self.warn_once("stale-buffer", format_args!("release of unknown vertex buffer {buffer:?}"));
            return;
        }

        self.forget_pipelines_for(buffer);
        self.pending_draws.retain(|d| d.key.buffer != buffer);

        if self.bound_buffer == Some(buffer) {
            self.bound_buffer = None;
        }
    }

    fn enable_depth_test(&mut self) {
        if self.depth.is_none() {
            let size = self.gpu.size();
            self.depth = Some(DepthTarget::new(self.gpu.device(), size.width, size.height));
        }
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        let size = PhysicalSize::new(width, height);
        if !self.gpu.resize(size) {
            return;
        }

        self.viewport = size;
        if let Some(depth) = self.depth.as_mut() {
            depth.resize(self.gpu.device(), width, height);
        }
    }

    fn clear(&mut self, color: Color, depth: bool) {
        self.pending_clear = Some((color, depth));
    }

    fn draw(&mut self, topology: Topology, first: u32, count: u32) {
        let (Some(program), Some(buffer)) = (self.current_program, self.bound_buffer) else {
            self.warn_once(
                "draw-without-state",
                format_args!("draw skipped: no active program or no bound vertex buffer"),
            );
            return;
        };

        self.pending_draws.push(PendingDraw {
            program,
            key: PipelineKey {
                buffer,
                topology,
                depth_test: self.depth.is_some(),
            },
            first,
            count,
        });
    }

    fn present(&mut self) -> Result<(), SurfaceErrorAction> {
        let clear = self.pending_clear.take();
        let draws = std::mem::take(&mut self.pending_draws);

        let mut frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => return Err(self.gpu.handle_surface_error(err)),
        };

        let ready: Vec<PendingDraw> = draws
            .into_iter()
            .filter(|d| self.ensure_pipeline(d))
            .collect();

        {
            let color_load = match clear {
                Some((color, _)) => wgpu::LoadOp::Clear(color.to_wgpu()),
                None => wgpu::LoadOp::Load,
            };
            let depth_load = match clear {
                Some((_, true)) => wgpu::LoadOp::Clear(1.0),
                _ => wgpu::LoadOp::Load,
            };

            let depth_stencil_attachment =
                self.depth
                    .as_ref()
                    .map(|depth| wgpu::RenderPassDepthStencilAttachment {
                        view: depth.view(),
                        depth_ops: Some(wgpu::Operations {
                            load: depth_load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    });

            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("trigon frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let width = self.viewport.width.clamp(1, frame.width.max(1));
            let height = self.viewport.height.clamp(1, frame.height.max(1));
            rpass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);

            for draw in &ready {
                let Some(program) = self.programs.get(draw.program) else { continue };
                let Some(pipeline) = program.pipelines.get(&draw.key) else { continue };
                let Some(buffer) = self.buffers.get(draw.key.buffer) else { continue };

                rpass.set_pipeline(pipeline);
                for (index, group) in program.bind_groups.iter().enumerate() {
                    rpass.set_bind_group(index as u32, group, &[]);
                }
                rpass.set_vertex_buffer(0, buffer.buffer.slice(..));
                rpass.draw(draw.first..draw.first + draw.count, 0..1);
            }
        }

        self.window.pre_present_notify();
        self.gpu.submit(frame);
        Ok(())
    }
}
