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


//! Native binding state tracking.
//!
//! Mirrors what a GL-style adapter keeps to avoid redundant native calls: the bound
//! pipeline, each vertex buffer slot, the index buffer and each image slot are
//! compared individually, so a draw state that only swaps one texture costs one
//! native bind.

use kestrel_core::{BufferId, ImageId, PipelineId, ResolvedBindings, ShaderStage};
use kestrel_core::{MAX_SHADERSTAGE_BUFFERS, MAX_SHADERSTAGE_IMAGES};

/// Native calls the headless backend would have issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeadlessStats {
    /// Pipeline changes.
    pub pipeline_switches: u64,
    /// Vertex and index buffer slot changes.
    pub buffer_binds: u64,
    /// Image slot changes.
    pub image_binds: u64,
    /// Draw calls.
    pub draws: u64,
}

#[derive(Debug, Clone, Default)]
pub(super) struct BindingCache {
    pipeline: Option<PipelineId>,
    vertex_buffers: [Option<BufferId>; MAX_SHADERSTAGE_BUFFERS],
    index_buffer: Option<BufferId>,
    images: [[Option<ImageId>; MAX_SHADERSTAGE_IMAGES]; ShaderStage::COUNT],
}

impl BindingCache {
    /// Applies `bindings`, counting the slots that actually change.
    pub(super) fn apply(&mut self, bindings: &ResolvedBindings, stats: &mut HeadlessStats) {
        if swap(&mut self.pipeline, bindings.pipeline) {
            stats.pipeline_switches += 1;
        }
        for (cached, &buffer) in self.vertex_buffers.iter_mut().zip(&bindings.vertex_buffers) {
            if swap(cached, buffer) {
                stats.buffer_binds += 1;
            }
        }
        if swap(&mut self.index_buffer, bindings.index_buffer) {
            stats.buffer_binds += 1;
        }
        for (cached_stage, stage) in self.images.iter_mut().zip(&bindings.images) {
            for (cached, &image) in cached_stage.iter_mut().zip(stage) {
                if swap(cached, image) {
                    stats.image_binds += 1;
                }
            }
        }
    }

    /// The pipeline bound last, if any.
    pub(super) fn pipeline(&self) -> Option<PipelineId> {
        self.pipeline
    }

    pub(super) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Stores `value` in `cached`; returns `true` if that changed it.
fn swap<T: PartialEq + Copy>(cached: &mut Option<T>, value: T) -> bool {
    if *cached == Some(value) {
        return false;
    }
    *cached = Some(value);
    true
}
