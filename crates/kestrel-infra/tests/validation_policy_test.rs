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


mod common;

use anyhow::Result;
use common::*;
use kestrel_core::*;
use kestrel_infra::HeadlessBackend;
use std::fs;
use tempfile::tempdir;

fn logging_context() -> Context<HeadlessBackend> {
    let desc = ContextDesc {
        validation: ValidationPolicy::Log,
        ..Default::default()
    };
    context_with(HeadlessBackend::new(), desc)
}

#[test]
#[should_panic(expected = "must be called inside a pass")]
fn test_fatal_policy_panics_on_draw_outside_pass() {
    let mut ctx = context();
    ctx.draw(0, 3, 1);
}

#[test]
#[should_panic(expected = "cannot commit while a pass is in progress")]
fn test_fatal_policy_panics_on_commit_inside_pass() {
    let mut ctx = context();
    ctx.begin_default_pass(&PassAction::default());
    ctx.commit();
}

#[test]
fn test_log_policy_skips_violating_calls() {
    let mut ctx = logging_context();
    let (pipeline, buffer) = triangle(&mut ctx);

    ctx.end_pass();
    ctx.begin_default_pass(&PassAction::default());
    ctx.draw(0, 3, 1);
    ctx.apply_uniforms(ShaderStage::Vertex, 0, &identity());
    ctx.apply_draw_state(&DrawState::new(pipeline).with_vertex_buffer(0, buffer));
    // Wrong uniform block size and undeclared slot.
    ctx.apply_uniform_block(ShaderStage::Vertex, 0, &[0u8; 12]);
    ctx.apply_uniform_block(ShaderStage::Fragment, 0, &[0u8; 64]);
    ctx.draw(0, 3, 1);
    ctx.commit();
    ctx.end_pass();
    ctx.commit();

    assert_eq!(draw_count(ctx.backend().commands()), 1);
    assert_eq!(ctx.backend().frames_committed(), 1);
    let stats = ctx.last_frame_stats();
    assert_eq!((stats.draws, stats.uniform_updates), (1, 0));
}

#[test]
fn test_log_policy_fails_invalid_descriptors() {
    let mut ctx = logging_context();
    let immutable_without_content = ctx.make_buffer(&BufferDesc {
        size: 64,
        ..Default::default()
    });
    assert_eq!(
        ctx.buffer_state(immutable_without_content),
        ResourceState::Failed
    );

    let no_shader = ctx.make_pipeline(&PipelineDesc::default());
    assert_eq!(ctx.pipeline_state(no_shader), ResourceState::Failed);

    let texture = [0u8; 4];
    let not_a_target = ctx.make_image(&ImageDesc::texture_2d(1, 1, PixelFormat::Rgba8, &texture));
    let pass = ctx.make_pass(&PassDesc::new(&[not_a_target]));
    assert_eq!(ctx.pass_resource_state(pass), ResourceState::Failed);
    assert_eq!(ctx.backend().live_resources(), 1);
}

#[test]
fn test_log_policy_rejects_mismatched_bindings() {
    let mut ctx = logging_context();
    let (pipeline, vertices) = triangle(&mut ctx);
    let indices = ctx.make_buffer(&BufferDesc::indices(bytemuck::cast_slice(&[0u16, 1, 2])));
    let texture = [0u8; 4];
    let image = ctx.make_image(&ImageDesc::texture_2d(1, 1, PixelFormat::Rgba8, &texture));

    ctx.begin_default_pass(&PassAction::default());
    for draw_state in [
        DrawState::new(pipeline).with_vertex_buffer(0, indices),
        DrawState::new(pipeline)
            .with_vertex_buffer(0, vertices)
            .with_index_buffer(indices),
        DrawState::new(pipeline)
            .with_vertex_buffer(0, vertices)
            .with_image(ShaderStage::Fragment, 0, image),
    ] {
        ctx.apply_draw_state(&draw_state);
        assert_eq!(ctx.draw_status(), DrawStatus::Dropped);
        ctx.draw(0, 3, 1);
    }
    ctx.end_pass();
    assert_eq!(draw_count(ctx.backend().commands()), 0);
}

#[test]
fn test_update_rules_under_log_policy() {
    let mut ctx = logging_context();
    let immutable = ctx.make_buffer(&vertex_buffer_desc());
    let dynamic = ctx.make_buffer(&BufferDesc::updatable(BufferType::Vertex, Usage::Dynamic, 8));

    ctx.update_buffer(immutable, &[1; 8]);
    ctx.update_buffer(dynamic, &[1; 16]);
    ctx.update_buffer(dynamic, &[2; 8]);
    ctx.update_buffer(dynamic, &[3; 8]);

    assert_eq!(ctx.backend().buffer_contents(dynamic), Some(&[2u8; 8][..]));
    assert_eq!(
        ctx.backend().buffer_contents(immutable),
        Some(bytemuck::cast_slice::<Vertex, u8>(&TRIANGLE))
    );
}

#[test]
fn test_context_setup_from_ron_file() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("context.ron");
    fs::write(
        &path,
        "(width: 320, height: 240, pool_sizes: (images: 2), validation: Log)",
    )?;

    let desc = ContextDesc::load(&path)?;
    assert_eq!(desc.pool_sizes.images, 2);
    assert_eq!(desc.pool_sizes.buffers, DEFAULT_POOL_SIZE);

    let mut ctx = context_with(HeadlessBackend::new(), desc);
    assert_eq!(ctx.validation_policy(), ValidationPolicy::Log);
    ctx.begin_default_pass(&PassAction::default());
    ctx.end_pass();
    assert!(matches!(
        ctx.backend().commands()[0],
        kestrel_infra::Command::BeginPass {
            width: 320,
            height: 240,
            ..
        }
    ));

    let pixels = [0u8; 4];
    let desc = ImageDesc::texture_2d(1, 1, PixelFormat::Rgba8, &pixels);
    assert!(!ctx.make_image(&desc).is_invalid());
    assert!(!ctx.make_image(&desc).is_invalid());
    assert!(ctx.make_image(&desc).is_invalid());
    Ok(())
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let missing = ContextDesc::load("/nonexistent/context.ron");
    assert!(matches!(missing, Err(ConfigError::Io(_))));

    let desc = ContextDesc {
        pool_sizes: PoolSizes::uniform(MAX_POOL_SIZE + 1),
        ..Default::default()
    };
    assert!(matches!(
        Context::setup(desc, HeadlessBackend::new()),
        Err(SetupError::PoolTooLarge { .. })
    ));
}
