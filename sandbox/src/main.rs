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


//! Renders a textured cube into an offscreen pass and composites it onto the
//! default framebuffer, against the headless backend.
//!
//! Usage: `sandbox [config.ron]`

use anyhow::{Context as _, Result};
use bytemuck::{Pod, Zeroable};
use kestrel_core::*;
use kestrel_infra::HeadlessBackend;

const FRAMES: u32 = 5;
/// The checkerboard arrives this many frames after startup, as if streamed from disk.
const TEXTURE_DELAY: u32 = 2;
const OFFSCREEN_SIZE: u32 = 256;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    uv: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct CubeParams {
    mvp: [[f32; 4]; 4],
}

fn vertex(x: f32, y: f32, z: f32, u: f32, v: f32) -> Vertex {
    Vertex {
        position: [x, y, z],
        uv: [u, v],
    }
}

fn cube_vertices() -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(24);
    for z in [-1.0, 1.0] {
        vertices.extend([
            vertex(-1.0, -1.0, z, 0.0, 0.0),
            vertex(1.0, -1.0, z, 1.0, 0.0),
            vertex(1.0, 1.0, z, 1.0, 1.0),
            vertex(-1.0, 1.0, z, 0.0, 1.0),
        ]);
    }
    for x in [-1.0, 1.0] {
        vertices.extend([
            vertex(x, -1.0, -1.0, 0.0, 0.0),
            vertex(x, 1.0, -1.0, 1.0, 0.0),
            vertex(x, 1.0, 1.0, 1.0, 1.0),
            vertex(x, -1.0, 1.0, 0.0, 1.0),
        ]);
    }
    for y in [-1.0, 1.0] {
        vertices.extend([
            vertex(-1.0, y, -1.0, 0.0, 0.0),
            vertex(-1.0, y, 1.0, 1.0, 0.0),
            vertex(1.0, y, 1.0, 1.0, 1.0),
            vertex(1.0, y, -1.0, 0.0, 1.0),
        ]);
    }
    vertices
}

fn cube_indices() -> Vec<u16> {
    (0..6u16)
        .flat_map(|face| {
            let base = face * 4;
            [base, base + 1, base + 2, base, base + 2, base + 3]
        })
        .collect()
}

fn checkerboard(size: u32) -> Vec<u8> {
    (0..size * size)
        .flat_map(|i| {
            let (x, y) = (i % size, i / size);
            let c = if (x / 4 + y / 4) % 2 == 0 { 0xFF } else { 0x20 };
            [c, c, c, 0xFF]
        })
        .collect()
}

/// A rotation around the Y axis, scaled down to fit clip space.
fn rotation(angle: f32) -> CubeParams {
    let (s, c) = angle.sin_cos();
    let k = 0.5;
    CubeParams {
        mvp: [
            [c * k, 0.0, -s * k, 0.0],
            [0.0, k, 0.0, 0.0],
            [s * k, 0.0, c * k, 0.0],
            [0.0, 0.0, 0.5, 1.0],
        ],
    }
}

fn textured_shader(label: &str) -> ShaderDesc<'_> {
    ShaderDesc::default()
        .attr("position", VertexFormat::Float3)
        .attr("texcoord0", VertexFormat::Float2)
        .uniform_block(
            ShaderStage::Vertex,
            UniformBlockDesc {
                uniforms: vec![UniformDesc::new("mvp", UniformType::Mat4, 0)],
            },
        )
        .image(ShaderStage::Fragment, "tex", ImageType::D2)
        .with_label(label)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let desc = match std::env::args().nth(1) {
        Some(path) => ContextDesc::load(&path)
            .with_context(|| format!("loading context configuration from {path}"))?,
        None => ContextDesc::default(),
    };
    let mut ctx = Context::setup(desc, HeadlessBackend::new())?;

    let vertices = cube_vertices();
    let indices = cube_indices();
    let vbuf = ctx.make_buffer(
        &BufferDesc::vertices(bytemuck::cast_slice(&vertices)).with_label("cube-vertices"),
    );
    let ibuf = ctx
        .make_buffer(&BufferDesc::indices(bytemuck::cast_slice(&indices)).with_label("cube-indices"));

    // Offscreen render target, sampled by the composite pass.
    let color = ctx.make_image(
        &ImageDesc::render_target(OFFSCREEN_SIZE, OFFSCREEN_SIZE, PixelFormat::Rgba8)
            .with_label("offscreen-color"),
    );
    let depth = ctx.make_image(&ImageDesc::render_target(
        OFFSCREEN_SIZE,
        OFFSCREEN_SIZE,
        PixelFormat::DepthStencil,
    ));
    let offscreen = ctx.make_pass(
        &PassDesc::new(&[color])
            .with_depth_stencil(depth)
            .with_label("offscreen"),
    );

    let shader = ctx.make_shader(&textured_shader("cube"));
    let mut pipeline_desc = PipelineDesc::new(shader)
        .attr(0, "position", VertexFormat::Float3)
        .attr(0, "texcoord0", VertexFormat::Float2)
        .with_index_type(IndexType::Uint16);
    pipeline_desc.depth_stencil.depth_compare_func = CompareFunc::LessEqual;
    pipeline_desc.depth_stencil.depth_write_enabled = true;
    pipeline_desc.rasterizer.cull_face_enabled = true;
    let pipeline = ctx.make_pipeline(&pipeline_desc);

    // Streamed in later; draws sampling it are dropped until then.
    let texture = ctx.alloc_image();
    let pixels = checkerboard(32);

    let offscreen_draw = DrawState::new(pipeline)
        .with_vertex_buffer(0, vbuf)
        .with_index_buffer(ibuf)
        .with_image(ShaderStage::Fragment, 0, texture);
    let display_draw = DrawState::new(pipeline)
        .with_vertex_buffer(0, vbuf)
        .with_index_buffer(ibuf)
        .with_image(ShaderStage::Fragment, 0, color);

    let offscreen_action = PassAction::clear(Color::rgb(0.25, 0.5, 0.75));
    let display_action = PassAction::clear(Color::rgb(0.0, 0.25, 1.0));
    let num_indices = indices.len() as u32;

    for frame in 0..FRAMES {
        if frame == TEXTURE_DELAY {
            log::info!("Checkerboard texture arrived");
            ctx.init_image(
                texture,
                &ImageDesc::texture_2d(32, 32, PixelFormat::Rgba8, &pixels).with_label("checkerboard"),
            );
        }
        let params = rotation(frame as f32 * 0.1);

        ctx.begin_pass(offscreen, &offscreen_action, OFFSCREEN_SIZE, OFFSCREEN_SIZE);
        ctx.apply_draw_state(&offscreen_draw);
        ctx.apply_uniforms(ShaderStage::Vertex, 0, &params);
        ctx.draw(0, num_indices, 1);
        ctx.end_pass();

        ctx.begin_default_pass(&display_action);
        let (width, height) = (ctx.desc().width as i32, ctx.desc().height as i32);
        ctx.apply_viewport(0, 0, width, height, true);
        ctx.apply_draw_state(&display_draw);
        ctx.apply_uniforms(ShaderStage::Vertex, 0, &params);
        ctx.draw(0, num_indices, 1);
        ctx.end_pass();
        ctx.commit();

        let stats = ctx.last_frame_stats();
        log::info!(
            "Frame {}: {} draws, {} dropped, {} bindings ({} cached)",
            stats.frame_index,
            stats.draws,
            stats.draws_dropped,
            stats.bindings,
            stats.bindings_skipped
        );
    }

    let backend = ctx.discard();
    let native = backend.stats();
    log::info!(
        "Headless backend: {} frames, {} pipeline switches, {} buffer binds, {} image binds",
        backend.frames_committed(),
        native.pipeline_switches,
        native.buffer_binds,
        native.image_binds
    );
    Ok(())
}
