//! Single-pass forward renderer.
//!
//! Uploads scene meshes lazily (keyed by geometry handle), packs per-draw
//! uniforms into one dynamic-offset buffer and draws rigid and skinned
//! meshes with the shared shader. Skinned meshes additionally bind their
//! skeleton's joint palette as a storage buffer.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::assets::GeometryHandle;
use crate::render::context::WgpuContext;
use crate::resources::{Geometry, MaterialKind};
use crate::scene::{LightKind, Scene, SkeletonKey};
use crate::viewer::Viewer;

const MAX_DIRECTIONAL_LIGHTS: usize = 4;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct GlobalUniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    ambient: [f32; 4],
    hemi_sky: [f32; 4],
    hemi_ground: [f32; 4],
    light_dirs: [[f32; 4]; 4],
    light_colors: [[f32; 4]; 4],
    counts: [u32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct DrawUniforms {
    model: [[f32; 4]; 4],
    color: [f32; 4],
    emissive: [f32; 4],
    /// x = metalness, y = roughness, z = shaded flag
    params: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct RigidVertex {
    position: [f32; 3],
    normal: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SkinnedVertex {
    position: [f32; 3],
    normal: [f32; 3],
    joints: [u16; 4],
    weights: [f32; 4],
}

/// GPU-resident copy of one geometry.
struct GpuMesh {
    vertex: wgpu::Buffer,
    index: Option<wgpu::Buffer>,
    index_count: u32,
    vertex_count: u32,
    skinned: bool,
}

/// Joint palette buffer + bind group for one skeleton.
struct GpuSkeleton {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: usize,
}

struct DrawCall {
    geometry: GeometryHandle,
    skeleton: Option<SkeletonKey>,
    uniform_offset: u32,
}

pub struct ForwardRenderer {
    draw_layout: wgpu::BindGroupLayout,
    skin_layout: wgpu::BindGroupLayout,

    rigid_pipeline: wgpu::RenderPipeline,
    skinned_pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,

    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    draw_stride: u32,
    draw_capacity: usize,

    meshes: HashMap<GeometryHandle, GpuMesh>,
    skeletons: HashMap<SkeletonKey, GpuSkeleton>,

    depth_view: wgpu::TextureView,
    depth_extent: (u32, u32),
}

impl ForwardRenderer {
    #[must_use]
    pub fn new(context: &WgpuContext) -> Self {
        let device = &context.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("forward-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<DrawUniforms>() as u64
                    ),
                },
                count: None,
            }],
        });

        let skin_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("skin-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let rigid_pipeline = Self::build_pipeline(
            device,
            &shader,
            context.config.format,
            &[&globals_layout, &draw_layout],
            "vs_main",
            &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<RigidVertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 0,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 12,
                        shader_location: 1,
                    },
                ],
            }],
        );

        let skinned_pipeline = Self::build_pipeline(
            device,
            &shader,
            context.config.format,
            &[&globals_layout, &draw_layout, &skin_layout],
            "vs_skinned",
            &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<SkinnedVertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 0,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 12,
                        shader_location: 1,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Uint16x4,
                        offset: 24,
                        shader_location: 2,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x4,
                        offset: 32,
                        shader_location: 3,
                    },
                ],
            }],
        );

        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("globals-buffer"),
            size: std::mem::size_of::<GlobalUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals-bind-group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let alignment = device.limits().min_uniform_buffer_offset_alignment;
        let draw_stride = (std::mem::size_of::<DrawUniforms>() as u32).next_multiple_of(alignment);
        let draw_capacity = 64;
        let (draw_buffer, draw_bind_group) =
            Self::build_draw_buffer(device, &draw_layout, draw_stride, draw_capacity);

        let depth_extent = context.extent();
        let depth_view = Self::build_depth(device, depth_extent);

        Self {
            draw_layout,
            skin_layout,
            rigid_pipeline,
            skinned_pipeline,
            globals_buffer,
            globals_bind_group,
            draw_buffer,
            draw_bind_group,
            draw_stride,
            draw_capacity,
            meshes: HashMap::new(),
            skeletons: HashMap::new(),
            depth_view,
            depth_extent,
        }
    }

    fn build_pipeline(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
        layouts: &[&wgpu::BindGroupLayout],
        vertex_entry: &str,
        vertex_buffers: &[wgpu::VertexBufferLayout],
    ) -> wgpu::RenderPipeline {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(vertex_entry),
            bind_group_layouts: layouts,
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(vertex_entry),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some(vertex_entry),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: vertex_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn build_draw_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u32,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw-uniforms"),
            size: u64::from(stride) * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw-bind-group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn build_depth(device: &wgpu::Device, extent: (u32, u32)) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: extent.0.max(1),
                height: extent.1.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn upload_geometry(device: &wgpu::Device, geometry: &Geometry) -> GpuMesh {
        let vertex = match (&geometry.joints, &geometry.weights) {
            (Some(joints), Some(weights)) => {
                let vertices: Vec<SkinnedVertex> = geometry
                    .positions
                    .iter()
                    .enumerate()
                    .map(|(i, p)| SkinnedVertex {
                        position: p.to_array(),
                        normal: geometry.normals[i].to_array(),
                        joints: joints.get(i).copied().unwrap_or([0; 4]),
                        weights: weights.get(i).copied().unwrap_or([1.0, 0.0, 0.0, 0.0]),
                    })
                    .collect();
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&geometry.name),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                })
            }
            _ => {
                let vertices: Vec<RigidVertex> = geometry
                    .positions
                    .iter()
                    .enumerate()
                    .map(|(i, p)| RigidVertex {
                        position: p.to_array(),
                        normal: geometry.normals[i].to_array(),
                    })
                    .collect();
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&geometry.name),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                })
            }
        };

        let index = geometry.indices.as_ref().map(|indices| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&geometry.name),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });

        GpuMesh {
            vertex,
            index,
            index_count: geometry.indices.as_ref().map_or(0, Vec::len) as u32,
            vertex_count: geometry.vertex_count() as u32,
            skinned: geometry.is_skinned(),
        }
    }

    fn material_uniforms(material: &MaterialKind, model: Mat4) -> DrawUniforms {
        match material {
            MaterialKind::Physical(m) => DrawUniforms {
                model: model.to_cols_array_2d(),
                color: [m.color.x, m.color.y, m.color.z, m.opacity],
                emissive: [m.emissive.x, m.emissive.y, m.emissive.z, 0.0],
                params: [m.metalness, m.roughness, 1.0, 0.0],
            },
            MaterialKind::Basic(m) => DrawUniforms {
                model: model.to_cols_array_2d(),
                color: [m.color.x, m.color.y, m.color.z, m.opacity],
                emissive: [0.0; 4],
                params: [0.0, 1.0, 0.0, 0.0],
            },
        }
    }

    fn build_globals(scene: &Scene) -> GlobalUniforms {
        let mut globals = GlobalUniforms::zeroed();

        if let Some(camera) = scene.active_camera_ref() {
            globals.view_proj = camera.view_projection().to_cols_array_2d();
            let pos = camera.world_position();
            globals.camera_pos = [pos.x, pos.y, pos.z, 1.0];
        }

        let ambient = scene.ambient.color * scene.ambient.intensity;
        globals.ambient = [ambient.x, ambient.y, ambient.z, 0.0];

        let mut count = 0_usize;
        for (light, world) in scene.iter_active_lights() {
            match &light.kind {
                LightKind::Directional => {
                    if count >= MAX_DIRECTIONAL_LIGHTS {
                        continue;
                    }
                    // The rig aims every lamp at the origin.
                    let position: Vec3 = world.translation.into();
                    let direction = if position.length_squared() > 1e-8 {
                        -position.normalize()
                    } else {
                        Vec3::NEG_Y
                    };
                    globals.light_dirs[count] = [direction.x, direction.y, direction.z, 0.0];
                    let color = light.color * light.intensity;
                    globals.light_colors[count] = [color.x, color.y, color.z, 0.0];
                    count += 1;
                }
                LightKind::Hemisphere { ground_color } => {
                    let sky = light.color * light.intensity;
                    let ground = *ground_color * light.intensity;
                    globals.hemi_sky = [sky.x, sky.y, sky.z, 0.0];
                    globals.hemi_ground = [ground.x, ground.y, ground.z, 0.0];
                }
            }
        }
        globals.counts = [count as u32, 0, 0, 0];

        globals
    }

    /// Draws one frame. With no viewer yet (model still loading, or load
    /// failed) the pass only clears; nothing references the absent asset.
    pub fn render(
        &mut self,
        context: &WgpuContext,
        viewer: Option<&Viewer>,
        target: &wgpu::TextureView,
        background: [f64; 4],
    ) {
        let device = &context.device;
        let queue = &context.queue;

        if self.depth_extent != context.extent() {
            self.depth_extent = context.extent();
            self.depth_view = Self::build_depth(device, self.depth_extent);
        }

        let mut draws: Vec<DrawCall> = Vec::new();
        if let Some(viewer) = viewer {
            let scene = &viewer.scene;
            let assets = &viewer.assets;

            queue.write_buffer(
                &self.globals_buffer,
                0,
                bytemuck::bytes_of(&Self::build_globals(scene)),
            );

            // Gather draw calls and make sure their GPU resources exist.
            let mut uniforms: Vec<DrawUniforms> = Vec::new();
            for node in scene.nodes.values() {
                if !node.visible {
                    continue;
                }
                let Some(mesh) = node.mesh.and_then(|key| scene.meshes.get(key)) else {
                    continue;
                };
                let Some(geometry) = assets.get_geometry(mesh.geometry) else {
                    continue;
                };
                let Some(material) = assets.get_material(mesh.material) else {
                    continue;
                };

                self.meshes
                    .entry(mesh.geometry)
                    .or_insert_with(|| Self::upload_geometry(device, geometry));

                let model = Mat4::from(*node.transform.world_matrix());
                let uniform_offset = uniforms.len() as u32 * self.draw_stride;
                uniforms.push(Self::material_uniforms(material, model));
                draws.push(DrawCall {
                    geometry: mesh.geometry,
                    skeleton: node.skin,
                    uniform_offset,
                });
            }

            if uniforms.len() > self.draw_capacity {
                self.draw_capacity = uniforms.len().next_power_of_two();
                let (buffer, bind_group) = Self::build_draw_buffer(
                    device,
                    &self.draw_layout,
                    self.draw_stride,
                    self.draw_capacity,
                );
                self.draw_buffer = buffer;
                self.draw_bind_group = bind_group;
            }
            for (i, uniform) in uniforms.iter().enumerate() {
                queue.write_buffer(
                    &self.draw_buffer,
                    u64::from(self.draw_stride) * i as u64,
                    bytemuck::bytes_of(uniform),
                );
            }

            self.sync_skeletons(device, queue, scene);
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("forward-pass"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("forward-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: background[0],
                            g: background[1],
                            b: background[2],
                            a: background[3],
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_bind_group(0, &self.globals_bind_group, &[]);

            for draw in &draws {
                let Some(gpu_mesh) = self.meshes.get(&draw.geometry) else {
                    continue;
                };

                if gpu_mesh.skinned {
                    let Some(gpu_skeleton) =
                        draw.skeleton.and_then(|key| self.skeletons.get(&key))
                    else {
                        continue;
                    };
                    pass.set_pipeline(&self.skinned_pipeline);
                    pass.set_bind_group(2, &gpu_skeleton.bind_group, &[]);
                } else {
                    pass.set_pipeline(&self.rigid_pipeline);
                }

                pass.set_bind_group(1, &self.draw_bind_group, &[draw.uniform_offset]);
                pass.set_vertex_buffer(0, gpu_mesh.vertex.slice(..));
                match &gpu_mesh.index {
                    Some(index) => {
                        pass.set_index_buffer(index.slice(..), wgpu::IndexFormat::Uint32);
                        pass.draw_indexed(0..gpu_mesh.index_count, 0, 0..1);
                    }
                    None => pass.draw(0..gpu_mesh.vertex_count, 0..1),
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Uploads this frame's joint palettes.
    fn sync_skeletons(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) {
        for (key, skeleton) in &scene.skeletons {
            let matrices = skeleton.joint_matrices();
            if matrices.is_empty() {
                continue;
            }

            let needs_rebuild = self
                .skeletons
                .get(&key)
                .is_none_or(|gpu| gpu.capacity < matrices.len());
            if needs_rebuild {
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("joint-matrices"),
                    size: (matrices.len() * std::mem::size_of::<Mat4>()) as u64,
                    usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("skin-bind-group"),
                    layout: &self.skin_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                });
                self.skeletons.insert(
                    key,
                    GpuSkeleton {
                        buffer,
                        bind_group,
                        capacity: matrices.len(),
                    },
                );
            }

            if let Some(gpu) = self.skeletons.get(&key) {
                let data: Vec<[[f32; 4]; 4]> =
                    matrices.iter().map(Mat4::to_cols_array_2d).collect();
                queue.write_buffer(&gpu.buffer, 0, bytemuck::cast_slice(&data));
            }
        }
    }
}
