// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


#![allow(dead_code)]

use bytemuck::{Pod, Zeroable};
use kestrel_core::*;
use kestrel_infra::{Command, HeadlessBackend};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

pub const TRIANGLE: [Vertex; 3] = [
    Vertex {
        position: [0.0, 0.5, 0.5],
        color: [1.0, 0.0, 0.0, 1.0],
    },
    Vertex {
        position: [0.5, -0.5, 0.5],
        color: [0.0, 1.0, 0.0, 1.0],
    },
    Vertex {
        position: [-0.5, -0.5, 0.5],
        color: [0.0, 0.0, 1.0, 1.0],
    },
];

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Params {
    pub mvp: [[f32; 4]; 4],
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn context_with(backend: HeadlessBackend, desc: ContextDesc) -> Context<HeadlessBackend> {
    init_logging();
    Context::setup(desc, backend).expect("valid test configuration")
}

pub fn context() -> Context<HeadlessBackend> {
    context_with(HeadlessBackend::new(), ContextDesc::default())
}

pub fn shader_desc() -> ShaderDesc<'static> {
    ShaderDesc::default()
        .attr("position", VertexFormat::Float3)
        .attr("color0", VertexFormat::Float4)
        .uniform_block(
            ShaderStage::Vertex,
            UniformBlockDesc {
                uniforms: vec![UniformDesc::new("mvp", UniformType::Mat4, 0)],
            },
        )
}

pub fn textured_shader_desc() -> ShaderDesc<'static> {
    shader_desc().image(ShaderStage::Fragment, "tex", ImageType::D2)
}

pub fn pipeline_desc(shader: ShaderId) -> PipelineDesc<'static> {
    PipelineDesc::new(shader)
        .attr(0, "position", VertexFormat::Float3)
        .attr(0, "color0", VertexFormat::Float4)
}

pub fn vertex_buffer_desc() -> BufferDesc<'static> {
    BufferDesc::vertices(bytemuck::cast_slice(&TRIANGLE))
}

/// Creates the shader, pipeline and vertex buffer of a colored triangle.
pub fn triangle(ctx: &mut Context<HeadlessBackend>) -> (PipelineId, BufferId) {
    let shader = ctx.make_shader(&shader_desc());
    let pipeline = ctx.make_pipeline(&pipeline_desc(shader));
    let buffer = ctx.make_buffer(&vertex_buffer_desc());
    (pipeline, buffer)
}

pub fn identity() -> Params {
    Params {
        mvp: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    }
}

pub fn draw_count(commands: &[Command]) -> usize {
    commands.iter().filter(|command| command.is_draw()).count()
}
