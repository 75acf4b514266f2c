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

//! The resource bindings of subsequent draw calls.

use super::shader::ShaderStage;
use crate::handle::{BufferId, ImageId, PipelineId};
use crate::limits::{MAX_SHADERSTAGE_BUFFERS, MAX_SHADERSTAGE_IMAGES};

/// The pipeline, buffers and images used by subsequent draws.
///
/// Unused slots hold the invalid id. The draw state is resolved on every
/// [`crate::Context::apply_draw_state`]; ids that do not resolve to `Valid`
/// resources put the sequencer in drop mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DrawState {
    /// The pipeline.
    pub pipeline: PipelineId,
    /// Vertex buffers, indexed by layout slot.
    pub vertex_buffers: [BufferId; MAX_SHADERSTAGE_BUFFERS],
    /// The index buffer, for indexed pipelines.
    pub index_buffer: BufferId,
    /// Images sampled by the vertex stage.
    pub vs_images: [ImageId; MAX_SHADERSTAGE_IMAGES],
    /// Images sampled by the fragment stage.
    pub fs_images: [ImageId; MAX_SHADERSTAGE_IMAGES],
}

impl DrawState {
    /// A draw state using `pipeline` with nothing else bound.
    pub fn new(pipeline: PipelineId) -> Self {
        Self {
            pipeline,
            ..Default::default()
        }
    }

    /// Binds `buffer` to vertex buffer `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not below [`MAX_SHADERSTAGE_BUFFERS`].
    pub fn with_vertex_buffer(mut self, slot: usize, buffer: BufferId) -> Self {
        self.vertex_buffers[slot] = buffer;
        self
    }

    /// Binds the index buffer.
    pub fn with_index_buffer(mut self, buffer: BufferId) -> Self {
        self.index_buffer = buffer;
        self
    }

    /// Binds `image` to image `slot` of `stage`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not below [`MAX_SHADERSTAGE_IMAGES`].
    pub fn with_image(mut self, stage: ShaderStage, slot: usize, image: ImageId) -> Self {
        match stage {
            ShaderStage::Vertex => self.vs_images[slot] = image,
            ShaderStage::Fragment => self.fs_images[slot] = image,
        }
        self
    }

    /// The images bound to `stage`.
    pub fn images(&self, stage: ShaderStage) -> &[ImageId; MAX_SHADERSTAGE_IMAGES] {
        match stage {
            ShaderStage::Vertex => &self.vs_images,
            ShaderStage::Fragment => &self.fs_images,
        }
    }
}
