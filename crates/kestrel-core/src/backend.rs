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

//! Defines the `GraphicsBackend` trait, the contract every native adapter fulfils.

use crate::api::*;
use crate::error::BackendError;
use crate::handle::{BufferId, ImageId, PassId, PipelineId, ShaderId};
use crate::limits::{MAX_SHADERSTAGE_BUFFERS, MAX_SHADERSTAGE_IMAGES};
use std::fmt::Debug;

/// The render target of a pass, as seen by the backend.
#[derive(Debug, Clone, Copy)]
pub enum PassTarget<'a> {
    /// The default framebuffer.
    Default {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// An offscreen pass. Every attachment is known to be `Valid`.
    Offscreen {
        /// The pass id.
        id: PassId,
        /// The pass metadata.
        info: &'a PassInfo,
    },
}

impl PassTarget<'_> {
    /// The size of the rendered region.
    pub fn extent(&self) -> (u32, u32) {
        match self {
            PassTarget::Default { width, height } => (*width, *height),
            PassTarget::Offscreen { info, .. } => (info.width, info.height),
        }
    }
}

/// A fully resolved draw state. Every non-invalid id refers to a `Valid` resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResolvedBindings {
    /// The pipeline.
    pub pipeline: PipelineId,
    /// Vertex buffers for the pipeline's used layout slots; invalid elsewhere.
    pub vertex_buffers: [BufferId; MAX_SHADERSTAGE_BUFFERS],
    /// The index buffer, invalid for non-indexed pipelines.
    pub index_buffer: BufferId,
    /// Images per shader stage, indexed by [`ShaderStage::index`].
    pub images: [[ImageId; MAX_SHADERSTAGE_IMAGES]; ShaderStage::COUNT],
}

/// The contract between the core and a native graphics API adapter.
///
/// The core only calls into the adapter once every precondition has been checked:
/// ids are live and `Valid`, descriptors are well formed, calls arrive in protocol
/// order and rectangles are already in the backend's origin convention. An adapter
/// therefore only reports genuine native failures, through [`BackendError`].
pub trait GraphicsBackend: Debug {
    /// A short name for log messages, e.g. `"headless"`.
    fn name(&self) -> &str;

    /// The optional features this adapter supports.
    fn features(&self) -> Features;

    /// Creates the native buffer for `id`.
    /// ## Arguments
    /// * `id` - The id the core allocated for the buffer.
    /// * `desc` - The validated descriptor, including any initial content.
    /// ## Errors
    /// * `BackendError` - If the native buffer could not be created.
    fn create_buffer(&mut self, id: BufferId, desc: &BufferDesc<'_>) -> Result<(), BackendError>;

    /// Replaces the contents of a dynamic or stream buffer, starting at offset 0.
    fn update_buffer(&mut self, id: BufferId, data: &[u8]) -> Result<(), BackendError>;

    /// Releases the native buffer for `id`.
    fn destroy_buffer(&mut self, id: BufferId);

    /// Creates the native image for `id`.
    /// ## Errors
    /// * `BackendError` - If the format, type or sample count is unsupported, or the
    ///   native image could not be created.
    fn create_image(&mut self, id: ImageId, desc: &ImageDesc<'_>) -> Result<(), BackendError>;

    /// Replaces the listed subimages of a dynamic or stream image.
    fn update_image(&mut self, id: ImageId, content: &ImageContent<'_>) -> Result<(), BackendError>;

    /// Releases the native image for `id`.
    fn destroy_image(&mut self, id: ImageId);

    /// Compiles and links the shader for `id`.
    fn create_shader(&mut self, id: ShaderId, desc: &ShaderDesc<'_>) -> Result<(), BackendError>;

    /// Releases the native shader for `id`.
    fn destroy_shader(&mut self, id: ShaderId);

    /// Creates the native pipeline for `id`.
    /// ## Arguments
    /// * `desc` - The validated descriptor.
    /// * `shader` - The interface of the `Valid` shader `desc.shader` refers to.
    fn create_pipeline(
        &mut self,
        id: PipelineId,
        desc: &PipelineDesc<'_>,
        shader: &ShaderInfo,
    ) -> Result<(), BackendError>;

    /// Releases the native pipeline for `id`.
    fn destroy_pipeline(&mut self, id: PipelineId);

    /// Creates the native framebuffer for `id`.
    /// ## Arguments
    /// * `info` - The pass metadata, with every attachment already checked.
    /// * `attachments` - The attached images, color attachments first, then the
    ///   depth-stencil attachment if there is one.
    fn create_pass(
        &mut self,
        id: PassId,
        info: &PassInfo,
        attachments: &[&ImageInfo],
    ) -> Result<(), BackendError>;

    /// Releases the native framebuffer for `id`.
    fn destroy_pass(&mut self, id: PassId);

    /// Begins a native render pass and applies the pass action.
    fn begin_pass(&mut self, target: PassTarget<'_>, action: &PassAction);

    /// Sets the viewport, already in the backend's origin convention.
    fn apply_viewport(&mut self, rect: Rect);

    /// Sets the scissor rectangle, already in the backend's origin convention.
    fn apply_scissor_rect(&mut self, rect: Rect);

    /// Binds a pipeline together with its buffers and images.
    fn apply_bindings(&mut self, bindings: &ResolvedBindings);

    /// Uploads one uniform block. `data` has exactly the declared block size.
    fn apply_uniform_block(&mut self, stage: ShaderStage, slot: usize, data: &[u8]);

    /// Issues a draw call with the current bindings.
    fn draw(&mut self, base_element: u32, num_elements: u32, num_instances: u32);

    /// Ends the native pass, resolving MSAA attachments.
    fn end_pass(&mut self);

    /// Finishes the frame.
    fn commit(&mut self);

    /// Forgets any cached native binding state.
    fn reset_state_cache(&mut self);

    /// Releases adapter-wide objects. Called once, after every resource was destroyed.
    fn discard(&mut self) {}
}

impl<B: GraphicsBackend + ?Sized> GraphicsBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn features(&self) -> Features {
        (**self).features()
    }

    fn create_buffer(&mut self, id: BufferId, desc: &BufferDesc<'_>) -> Result<(), BackendError> {
        (**self).create_buffer(id, desc)
    }

    fn update_buffer(&mut self, id: BufferId, data: &[u8]) -> Result<(), BackendError> {
        (**self).update_buffer(id, data)
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        (**self).destroy_buffer(id)
    }

    fn create_image(&mut self, id: ImageId, desc: &ImageDesc<'_>) -> Result<(), BackendError> {
        (**self).create_image(id, desc)
    }

    fn update_image(&mut self, id: ImageId, content: &ImageContent<'_>) -> Result<(), BackendError> {
        (**self).update_image(id, content)
    }

    fn destroy_image(&mut self, id: ImageId) {
        (**self).destroy_image(id)
    }

    fn create_shader(&mut self, id: ShaderId, desc: &ShaderDesc<'_>) -> Result<(), BackendError> {
        (**self).create_shader(id, desc)
    }

    fn destroy_shader(&mut self, id: ShaderId) {
        (**self).destroy_shader(id)
    }

    fn create_pipeline(
        &mut self,
        id: PipelineId,
        desc: &PipelineDesc<'_>,
        shader: &ShaderInfo,
    ) -> Result<(), BackendError> {
        (**self).create_pipeline(id, desc, shader)
    }

    fn destroy_pipeline(&mut self, id: PipelineId) {
        (**self).destroy_pipeline(id)
    }

    fn create_pass(
        &mut self,
        id: PassId,
        info: &PassInfo,
        attachments: &[&ImageInfo],
    ) -> Result<(), BackendError> {
        (**self).create_pass(id, info, attachments)
    }

    fn destroy_pass(&mut self, id: PassId) {
        (**self).destroy_pass(id)
    }

    fn begin_pass(&mut self, target: PassTarget<'_>, action: &PassAction) {
        (**self).begin_pass(target, action)
    }

    fn apply_viewport(&mut self, rect: Rect) {
        (**self).apply_viewport(rect)
    }

    fn apply_scissor_rect(&mut self, rect: Rect) {
        (**self).apply_scissor_rect(rect)
    }

    fn apply_bindings(&mut self, bindings: &ResolvedBindings) {
        (**self).apply_bindings(bindings)
    }

    fn apply_uniform_block(&mut self, stage: ShaderStage, slot: usize, data: &[u8]) {
        (**self).apply_uniform_block(stage, slot, data)
    }

    fn draw(&mut self, base_element: u32, num_elements: u32, num_instances: u32) {
        (**self).draw(base_element, num_elements, num_instances)
    }

    fn end_pass(&mut self) {
        (**self).end_pass()
    }

    fn commit(&mut self) {
        (**self).commit()
    }

    fn reset_state_cache(&mut self) {
        (**self).reset_state_cache()
    }

    fn discard(&mut self) {
        (**self).discard()
    }
}
