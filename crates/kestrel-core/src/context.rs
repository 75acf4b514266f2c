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

//! The `Context`: owner of the resource pools, the sequencer and the backend.

use crate::api::*;
use crate::backend::{GraphicsBackend, PassTarget, ResolvedBindings};
use crate::config::ContextDesc;
use crate::error::{BackendError, SetupError};
use crate::handle::{BufferId, ImageId, PassId, PipelineId, ShaderId, TypedId};
use crate::limits::MAX_SHADERSTAGE_BUFFERS;
use crate::pool::{InitOutcome, Pool};
use crate::sequencer::{DrawStatus, Gate, PassState, Sequencer};
use crate::state::ResourceState;
use crate::stats::FrameStats;
use crate::validation::{self, ValidationError, ValidationPolicy, Validator};

/// A rendering context bound to one backend adapter.
///
/// All resources are created through the context and referenced by typed ids.
/// Creation is split into two phases so resources can be loaded asynchronously:
/// `alloc_*` hands out an id immediately, `init_*` realises it later. `make_*` does
/// both at once. Ids that are not `Valid` can be used freely in draw states; the
/// affected calls are dropped until the resource becomes `Valid`.
///
/// `B` defaults to `Box<dyn GraphicsBackend>` so the adapter can be chosen at
/// runtime.
#[derive(Debug)]
pub struct Context<B: GraphicsBackend = Box<dyn GraphicsBackend>> {
    desc: ContextDesc,
    features: Features,
    validator: Validator,
    buffers: Pool<BufferId, BufferInfo>,
    images: Pool<ImageId, ImageInfo>,
    shaders: Pool<ShaderId, ShaderInfo>,
    pipelines: Pool<PipelineId, PipelineInfo>,
    passes: Pool<PassId, PassInfo>,
    sequencer: Sequencer,
    backend: B,
}

impl<B: GraphicsBackend> Context<B> {
    /// Creates a context driving `backend`.
    ///
    /// # Errors
    ///
    /// Returns a [`SetupError`] if `desc` is not a usable configuration.
    pub fn setup(desc: ContextDesc, backend: B) -> Result<Self, SetupError> {
        desc.validate()?;
        let features = backend.features();
        log::info!(
            "Setting up context on the '{}' backend ({}x{}, features: {:?})",
            backend.name(),
            desc.width,
            desc.height,
            features
        );
        let sizes = desc.pool_sizes;
        Ok(Self {
            validator: Validator::new(desc.validation),
            buffers: Pool::new(sizes.buffers),
            images: Pool::new(sizes.images),
            shaders: Pool::new(sizes.shaders),
            pipelines: Pool::new(sizes.pipelines),
            passes: Pool::new(sizes.passes),
            sequencer: Sequencer::new(),
            features,
            desc,
            backend,
        })
    }

    /// Destroys every live resource, shuts the backend down and hands it back.
    ///
    /// Resources are released dependents first: passes, pipelines, shaders, images,
    /// then buffers.
    pub fn discard(mut self) -> B {
        if self.sequencer.pass_state() != PassState::OutsidePass {
            log::warn!("Discarding the context while a pass is in progress");
        }
        let passes: Vec<_> = self.passes.live_ids().collect();
        passes.into_iter().for_each(|id| self.destroy_pass(id));
        let pipelines: Vec<_> = self.pipelines.live_ids().collect();
        pipelines.into_iter().for_each(|id| self.destroy_pipeline(id));
        let shaders: Vec<_> = self.shaders.live_ids().collect();
        shaders.into_iter().for_each(|id| self.destroy_shader(id));
        let images: Vec<_> = self.images.live_ids().collect();
        images.into_iter().for_each(|id| self.destroy_image(id));
        let buffers: Vec<_> = self.buffers.live_ids().collect();
        buffers.into_iter().for_each(|id| self.destroy_buffer(id));

        self.backend.discard();
        log::info!("Context on the '{}' backend discarded", self.backend.name());
        self.backend
    }

    // --- Queries ---

    /// The configuration the context was set up with.
    pub fn desc(&self) -> &ContextDesc {
        &self.desc
    }

    /// The features advertised by the backend.
    pub fn features(&self) -> Features {
        self.features
    }

    /// Returns `true` if the backend supports every feature in `features`.
    pub fn query_feature(&self, features: Features) -> bool {
        self.features.contains(features)
    }

    /// The validation policy in effect.
    pub fn validation_policy(&self) -> ValidationPolicy {
        self.validator.policy()
    }

    /// The backend adapter.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend adapter, mutably. Call [`Self::reset_state_cache`] after issuing
    /// native calls that change bound state behind the context's back.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Where the caller is in the pass protocol.
    pub fn pass_state(&self) -> PassState {
        self.sequencer.pass_state()
    }

    /// The draw state status of the current pass.
    pub fn draw_status(&self) -> DrawStatus {
        self.sequencer.draw_status()
    }

    /// The index of the frame in progress.
    pub fn frame_index(&self) -> u64 {
        self.sequencer.frame_index()
    }

    /// Counters of the frame in progress.
    pub fn frame_stats(&self) -> &FrameStats {
        self.sequencer.stats()
    }

    /// Counters of the last committed frame.
    pub fn last_frame_stats(&self) -> &FrameStats {
        self.sequencer.last_stats()
    }

    /// The state of a buffer; [`ResourceState::Invalid`] if the id does not resolve.
    pub fn buffer_state(&self, id: BufferId) -> ResourceState {
        self.buffers.state(id)
    }

    /// The state of an image.
    pub fn image_state(&self, id: ImageId) -> ResourceState {
        self.images.state(id)
    }

    /// The state of a shader.
    pub fn shader_state(&self, id: ShaderId) -> ResourceState {
        self.shaders.state(id)
    }

    /// The state of a pipeline.
    pub fn pipeline_state(&self, id: PipelineId) -> ResourceState {
        self.pipelines.state(id)
    }

    /// The state of a pass.
    pub fn pass_resource_state(&self, id: PassId) -> ResourceState {
        self.passes.state(id)
    }

    /// Metadata of a `Valid` buffer.
    pub fn buffer_info(&self, id: BufferId) -> Option<&BufferInfo> {
        self.buffers.get(id)
    }

    /// Metadata of a `Valid` image.
    pub fn image_info(&self, id: ImageId) -> Option<&ImageInfo> {
        self.images.get(id)
    }

    /// Metadata of a `Valid` shader.
    pub fn shader_info(&self, id: ShaderId) -> Option<&ShaderInfo> {
        self.shaders.get(id)
    }

    /// Metadata of a `Valid` pipeline.
    pub fn pipeline_info(&self, id: PipelineId) -> Option<&PipelineInfo> {
        self.pipelines.get(id)
    }

    /// Metadata of a `Valid` pass.
    pub fn pass_info(&self, id: PassId) -> Option<&PassInfo> {
        self.passes.get(id)
    }

    // --- Allocation ---

    /// Reserves a buffer id. Returns [`BufferId::INVALID`] when the pool is full.
    pub fn alloc_buffer(&mut self) -> BufferId {
        alloc(&mut self.buffers)
    }

    /// Reserves an image id.
    pub fn alloc_image(&mut self) -> ImageId {
        alloc(&mut self.images)
    }

    /// Reserves a shader id.
    pub fn alloc_shader(&mut self) -> ShaderId {
        alloc(&mut self.shaders)
    }

    /// Reserves a pipeline id.
    pub fn alloc_pipeline(&mut self) -> PipelineId {
        alloc(&mut self.pipelines)
    }

    /// Reserves a pass id.
    pub fn alloc_pass(&mut self) -> PassId {
        alloc(&mut self.passes)
    }

    // --- Initialisation ---

    /// Realises the buffer `id` reserved by [`Self::alloc_buffer`].
    ///
    /// The buffer becomes `Valid`, or `Failed` if the backend rejects it.
    pub fn init_buffer(&mut self, id: BufferId, desc: &BufferDesc<'_>) {
        const OP: &str = "init_buffer";
        if !self.expect_alloc(OP, self.buffers.state(id), id) {
            return;
        }
        let outcome = match validation::validate_buffer_desc(desc) {
            Err(violation) => {
                self.validator.report(OP, violation);
                InitOutcome::Failed(None)
            }
            Ok(()) => {
                let info = BufferInfo::from_desc(desc);
                creation_outcome(id, info, self.backend.create_buffer(id, desc))
            }
        };
        finish_init(&mut self.buffers, id, outcome);
    }

    /// Realises the image `id` reserved by [`Self::alloc_image`].
    pub fn init_image(&mut self, id: ImageId, desc: &ImageDesc<'_>) {
        const OP: &str = "init_image";
        if !self.expect_alloc(OP, self.images.state(id), id) {
            return;
        }
        let outcome = match validation::validate_image_desc(desc) {
            Err(violation) => {
                self.validator.report(OP, violation);
                InitOutcome::Failed(None)
            }
            Ok(()) => {
                let info = ImageInfo::from_desc(desc);
                creation_outcome(id, info, self.backend.create_image(id, desc))
            }
        };
        finish_init(&mut self.images, id, outcome);
    }

    /// Realises the shader `id` reserved by [`Self::alloc_shader`].
    pub fn init_shader(&mut self, id: ShaderId, desc: &ShaderDesc<'_>) {
        const OP: &str = "init_shader";
        if !self.expect_alloc(OP, self.shaders.state(id), id) {
            return;
        }
        let outcome = match validation::validate_shader_desc(desc) {
            Err(violation) => {
                self.validator.report(OP, violation);
                InitOutcome::Failed(None)
            }
            Ok(()) => {
                let info = ShaderInfo::from_desc(desc);
                creation_outcome(id, info, self.backend.create_shader(id, desc))
            }
        };
        finish_init(&mut self.shaders, id, outcome);
    }

    /// Realises the pipeline `id` reserved by [`Self::alloc_pipeline`].
    ///
    /// The pipeline fails if its shader is not `Valid` at this point.
    pub fn init_pipeline(&mut self, id: PipelineId, desc: &PipelineDesc<'_>) {
        const OP: &str = "init_pipeline";
        if !self.expect_alloc(OP, self.pipelines.state(id), id) {
            return;
        }
        let outcome = match validation::validate_pipeline_desc(desc) {
            Err(violation) => {
                self.validator.report(OP, violation);
                InitOutcome::Failed(None)
            }
            Ok(()) => {
                let info = PipelineInfo::from_desc(desc);
                match self.shaders.get(desc.shader) {
                    Some(shader) => creation_outcome(
                        id,
                        info,
                        self.backend.create_pipeline(id, desc, shader),
                    ),
                    None => {
                        log::warn!(
                            "Pipeline {:?} failed: shader {:?} is {:?}",
                            id,
                            desc.shader,
                            self.shaders.state(desc.shader)
                        );
                        InitOutcome::Failed(Some(info))
                    }
                }
            }
        };
        finish_init(&mut self.pipelines, id, outcome);
    }

    /// Realises the pass `id` reserved by [`Self::alloc_pass`].
    ///
    /// The pass fails if any attachment image is not `Valid` at this point.
    pub fn init_pass(&mut self, id: PassId, desc: &PassDesc<'_>) {
        const OP: &str = "init_pass";
        if !self.expect_alloc(OP, self.passes.state(id), id) {
            return;
        }
        let outcome = match validation::validate_pass_desc(desc) {
            Err(violation) => {
                self.validator.report(OP, violation);
                InitOutcome::Failed(None)
            }
            Ok(()) => match self.resolve_attachments(desc) {
                Err(violation) => {
                    self.validator.report(OP, violation);
                    InitOutcome::Failed(None)
                }
                Ok(None) => {
                    log::warn!("Pass {id:?} failed: an attachment image is not valid");
                    InitOutcome::Failed(None)
                }
                Ok(Some(info)) => {
                    let attachments: Vec<&ImageInfo> = info
                        .images()
                        .filter_map(|image| self.images.get(image))
                        .collect();
                    let result = self.backend.create_pass(id, &info, &attachments);
                    creation_outcome(id, info, result)
                }
            },
        };
        finish_init(&mut self.passes, id, outcome);
    }

    // --- One-step creation ---

    /// Allocates and initialises a buffer.
    pub fn make_buffer(&mut self, desc: &BufferDesc<'_>) -> BufferId {
        let id = self.alloc_buffer();
        if !id.is_invalid() {
            self.init_buffer(id, desc);
        }
        id
    }

    /// Allocates and initialises an image.
    pub fn make_image(&mut self, desc: &ImageDesc<'_>) -> ImageId {
        let id = self.alloc_image();
        if !id.is_invalid() {
            self.init_image(id, desc);
        }
        id
    }

    /// Allocates and initialises a shader.
    pub fn make_shader(&mut self, desc: &ShaderDesc<'_>) -> ShaderId {
        let id = self.alloc_shader();
        if !id.is_invalid() {
            self.init_shader(id, desc);
        }
        id
    }

    /// Allocates and initialises a pipeline.
    pub fn make_pipeline(&mut self, desc: &PipelineDesc<'_>) -> PipelineId {
        let id = self.alloc_pipeline();
        if !id.is_invalid() {
            self.init_pipeline(id, desc);
        }
        id
    }

    /// Allocates and initialises a pass.
    pub fn make_pass(&mut self, desc: &PassDesc<'_>) -> PassId {
        let id = self.alloc_pass();
        if !id.is_invalid() {
            self.init_pass(id, desc);
        }
        id
    }

    // --- Destruction ---

    /// Destroys a buffer in any occupied state. Stale ids are ignored with a warning.
    pub fn destroy_buffer(&mut self, id: BufferId) {
        if release(&mut self.buffers, id) {
            self.backend.destroy_buffer(id);
        }
    }

    /// Destroys an image.
    pub fn destroy_image(&mut self, id: ImageId) {
        if release(&mut self.images, id) {
            self.backend.destroy_image(id);
        }
    }

    /// Destroys a shader.
    pub fn destroy_shader(&mut self, id: ShaderId) {
        if release(&mut self.shaders, id) {
            self.backend.destroy_shader(id);
        }
    }

    /// Destroys a pipeline.
    pub fn destroy_pipeline(&mut self, id: PipelineId) {
        if release(&mut self.pipelines, id) {
            self.backend.destroy_pipeline(id);
        }
    }

    /// Destroys a pass. The attached images are not affected.
    pub fn destroy_pass(&mut self, id: PassId) {
        if release(&mut self.passes, id) {
            self.backend.destroy_pass(id);
        }
    }

    // --- Updates ---

    /// Replaces the contents of a dynamic or stream buffer.
    ///
    /// At most one update per buffer and frame. Updates to buffers that are not
    /// `Valid` are dropped.
    pub fn update_buffer(&mut self, id: BufferId, data: &[u8]) {
        const OP: &str = "update_buffer";
        let frame = self.sequencer.frame_index();
        let Some(info) = self.buffers.get_mut(id) else {
            log::trace!("{OP}: {id:?} is {:?}, dropped", self.buffers.state(id));
            return;
        };
        if !self
            .validator
            .check(OP, validation::validate_buffer_update(info, data.len(), frame))
        {
            return;
        }
        match self.backend.update_buffer(id, data) {
            Ok(()) => info.last_update_frame = Some(frame),
            Err(err) => log::warn!("{OP}: backend rejected the update of {id:?}: {err}"),
        }
    }

    /// Replaces subimages of a dynamic or stream image.
    pub fn update_image(&mut self, id: ImageId, content: &ImageContent<'_>) {
        const OP: &str = "update_image";
        let frame = self.sequencer.frame_index();
        let Some(info) = self.images.get_mut(id) else {
            log::trace!("{OP}: {id:?} is {:?}, dropped", self.images.state(id));
            return;
        };
        if !self
            .validator
            .check(OP, validation::validate_image_update(info, content, frame))
        {
            return;
        }
        match self.backend.update_image(id, content) {
            Ok(()) => info.last_update_frame = Some(frame),
            Err(err) => log::warn!("{OP}: backend rejected the update of {id:?}: {err}"),
        }
    }

    // --- Rendering ---

    /// Begins a pass.
    ///
    /// `PassId::INVALID` selects the default framebuffer of `width` x `height`.
    /// An offscreen pass that is not `Valid`, or whose attachments are not all
    /// `Valid` anymore, starts degraded: every call until [`Self::end_pass`] is
    /// dropped.
    pub fn begin_pass(&mut self, pass: PassId, action: &PassAction, width: u32, height: u32) {
        const OP: &str = "begin_pass";
        if !self.validator.check(OP, self.sequencer.check_can_begin()) {
            return;
        }
        if let Some(attachment) = action.conflicting_attachment() {
            self.validator
                .report(OP, ValidationError::ConflictingPassAction(attachment));
            return;
        }

        if pass.is_invalid() {
            self.sequencer.enter_pass(height, false);
            self.backend
                .begin_pass(PassTarget::Default { width, height }, action);
            return;
        }

        let resolved = self
            .passes
            .get(pass)
            .filter(|info| info.images().all(|image| self.images.get(image).is_some()));
        match resolved {
            Some(info) => {
                self.sequencer.enter_pass(info.height, false);
                self.backend
                    .begin_pass(PassTarget::Offscreen { id: pass, info }, action);
            }
            None => {
                log::trace!(
                    "{OP}: {pass:?} is {:?} or lost an attachment, pass degraded",
                    self.passes.state(pass)
                );
                self.sequencer.enter_pass(height, true);
            }
        }
    }

    /// Begins a pass on the default framebuffer, sized as configured.
    pub fn begin_default_pass(&mut self, action: &PassAction) {
        let (width, height) = (self.desc.width, self.desc.height);
        self.begin_pass(PassId::INVALID, action, width, height);
    }

    /// Sets the viewport of the current pass.
    ///
    /// `origin_top_left` states the caller's convention; the rectangle is flipped if
    /// the backend uses the other one.
    pub fn apply_viewport(&mut self, x: i32, y: i32, width: i32, height: i32, origin_top_left: bool) {
        let rect = Rect::new(x, y, width, height);
        let gate = self
            .sequencer
            .rect_gate(rect, origin_top_left, self.features.origin_top_left());
        match gate {
            Ok(Gate::Forward(rect)) => self.backend.apply_viewport(rect),
            Ok(Gate::Drop) => log::trace!("apply_viewport: pass degraded, dropped"),
            Err(violation) => self.validator.report("apply_viewport", violation),
        }
    }

    /// Sets the scissor rectangle of the current pass.
    pub fn apply_scissor_rect(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        origin_top_left: bool,
    ) {
        let rect = Rect::new(x, y, width, height);
        let gate = self
            .sequencer
            .rect_gate(rect, origin_top_left, self.features.origin_top_left());
        match gate {
            Ok(Gate::Forward(rect)) => self.backend.apply_scissor_rect(rect),
            Ok(Gate::Drop) => log::trace!("apply_scissor_rect: pass degraded, dropped"),
            Err(violation) => self.validator.report("apply_scissor_rect", violation),
        }
    }

    /// Binds a pipeline with its buffers and images for subsequent draws.
    ///
    /// If any referenced resource is not `Valid`, draws and uniform updates are
    /// dropped until the next draw state that resolves.
    pub fn apply_draw_state(&mut self, draw_state: &DrawState) {
        const OP: &str = "apply_draw_state";
        match self.sequencer.draw_state_gate() {
            Err(violation) => {
                self.validator.report(OP, violation);
                return;
            }
            Ok(Gate::Drop) => {
                log::trace!("{OP}: pass degraded, dropped");
                return;
            }
            Ok(Gate::Forward(())) => {}
        }
        match self.resolve_draw_state(draw_state) {
            Ok(Some((bindings, shader))) => {
                if self.sequencer.bind(bindings, shader) {
                    self.backend.apply_bindings(&bindings);
                }
            }
            Ok(None) => {
                log::trace!("{OP}: {draw_state:?} references a resource that is not valid");
                self.sequencer.drop_bindings();
            }
            Err(violation) => {
                self.sequencer.drop_bindings();
                self.validator.report(OP, violation);
            }
        }
    }

    /// Uploads a uniform block for the bound shader.
    ///
    /// `data` must be exactly as large as the block the shader declares at `slot`.
    pub fn apply_uniform_block(&mut self, stage: ShaderStage, slot: usize, data: &[u8]) {
        const OP: &str = "apply_uniform_block";
        let shader = match self.sequencer.uniform_gate() {
            Err(violation) => {
                self.validator.report(OP, violation);
                return;
            }
            Ok(Gate::Drop) => {
                log::trace!("{OP}: draw state dropped");
                return;
            }
            Ok(Gate::Forward(shader)) => shader,
        };
        let Some(info) = self.shaders.get(shader) else {
            log::trace!("{OP}: {shader:?} is no longer valid, dropped");
            return;
        };
        let Some(&expected) = info.stage(stage).uniform_block_sizes.get(slot) else {
            self.validator
                .report(OP, ValidationError::UnknownUniformBlock { stage, slot });
            return;
        };
        if data.len() != expected {
            let violation = ValidationError::UniformSizeMismatch {
                stage,
                slot,
                expected,
                actual: data.len(),
            };
            self.validator.report(OP, violation);
            return;
        }
        self.backend.apply_uniform_block(stage, slot, data);
        self.sequencer.record_uniform_update();
    }

    /// Uploads a plain-old-data value as a uniform block.
    pub fn apply_uniforms<T: bytemuck::Pod>(&mut self, stage: ShaderStage, slot: usize, value: &T) {
        self.apply_uniform_block(stage, slot, bytemuck::bytes_of(value));
    }

    /// Draws `num_elements` vertices (or indices) `num_instances` times.
    ///
    /// Does nothing if either count is zero, in drop mode or in a degraded pass.
    pub fn draw(&mut self, base_element: u32, num_elements: u32, num_instances: u32) {
        match self.sequencer.draw_gate(num_elements, num_instances) {
            Ok(true) => self.backend.draw(base_element, num_elements, num_instances),
            Ok(false) => log::trace!("draw: dropped"),
            Err(violation) => self.validator.report("draw", violation),
        }
    }

    /// Ends the current pass.
    pub fn end_pass(&mut self) {
        match self.sequencer.end_pass() {
            Ok(true) => self.backend.end_pass(),
            Ok(false) => {}
            Err(violation) => self.validator.report("end_pass", violation),
        }
    }

    /// Finishes the frame: forwards to the backend and rolls the frame counters.
    pub fn commit(&mut self) {
        match self.sequencer.commit() {
            Ok(()) => self.backend.commit(),
            Err(violation) => self.validator.report("commit", violation),
        }
    }

    /// Forgets the cached bound state, in the context and in the backend.
    ///
    /// Needed after native calls made behind the context's back. Idempotent.
    pub fn reset_state_cache(&mut self) {
        self.sequencer.reset_cache();
        self.backend.reset_state_cache();
    }

    // --- Internals ---

    fn expect_alloc<I: TypedId>(&self, operation: &str, state: ResourceState, id: I) -> bool {
        if state == ResourceState::Alloc {
            return true;
        }
        self.validator.report(
            operation,
            ValidationError::NotAllocated {
                handle: id.handle(),
                state,
            },
        );
        false
    }

    /// Resolves and checks every attachment of `desc`. `Ok(None)` if an image is not
    /// `Valid`.
    fn resolve_attachments(&self, desc: &PassDesc<'_>) -> Result<Option<PassInfo>, ValidationError> {
        let mut extent = None;
        let mut color_attachments = Vec::with_capacity(desc.color_attachments.len());
        for (index, attachment) in desc.color_attachments.iter().enumerate() {
            let Some(image) = self.images.get(attachment.image) else {
                return Ok(None);
            };
            validation::validate_attachment(
                Attachment::Color(index),
                image,
                attachment.mip_level,
                attachment.slice,
                extent,
            )?;
            extent.get_or_insert(image.mip_extent(attachment.mip_level));
            color_attachments.push(AttachmentInfo {
                attachment: *attachment,
                pixel_format: image.pixel_format,
                sample_count: image.sample_count,
            });
        }

        let depth_stencil_attachment = match &desc.depth_stencil_attachment {
            None => None,
            Some(attachment) => {
                let Some(image) = self.images.get(attachment.image) else {
                    return Ok(None);
                };
                validation::validate_attachment(
                    Attachment::Depth,
                    image,
                    attachment.mip_level,
                    attachment.slice,
                    extent,
                )?;
                Some(AttachmentInfo {
                    attachment: *attachment,
                    pixel_format: image.pixel_format,
                    sample_count: image.sample_count,
                })
            }
        };

        let (width, height) = extent.unwrap_or_default();
        Ok(Some(PassInfo {
            label: desc.label.as_deref().map(str::to_owned),
            color_attachments,
            depth_stencil_attachment,
            width,
            height,
        }))
    }

    /// Resolves a draw state against the pools. `Ok(None)` if any referenced resource
    /// is not `Valid`.
    fn resolve_draw_state(
        &self,
        draw_state: &DrawState,
    ) -> Result<Option<(ResolvedBindings, ShaderId)>, ValidationError> {
        let Some(pipeline) = self.pipelines.get(draw_state.pipeline) else {
            return Ok(None);
        };
        let Some(shader) = self.shaders.get(pipeline.shader) else {
            return Ok(None);
        };
        let mut bindings = ResolvedBindings {
            pipeline: draw_state.pipeline,
            ..Default::default()
        };

        for slot in 0..MAX_SHADERSTAGE_BUFFERS {
            let id = draw_state.vertex_buffers[slot];
            if !pipeline.layouts[slot].is_used() {
                if !id.is_invalid() {
                    return Err(ValidationError::UnexpectedVertexBuffer { slot });
                }
                continue;
            }
            let Some(buffer) = self.buffers.get(id) else {
                return Ok(None);
            };
            if buffer.buffer_type != BufferType::Vertex {
                return Err(ValidationError::NotAVertexBuffer { slot });
            }
            bindings.vertex_buffers[slot] = id;
        }

        if pipeline.index_type == IndexType::None {
            if !draw_state.index_buffer.is_invalid() {
                return Err(ValidationError::UnexpectedIndexBuffer);
            }
        } else {
            let Some(buffer) = self.buffers.get(draw_state.index_buffer) else {
                return Ok(None);
            };
            if buffer.buffer_type != BufferType::Index {
                return Err(ValidationError::NotAnIndexBuffer);
            }
            bindings.index_buffer = draw_state.index_buffer;
        }

        for stage in ShaderStage::ALL {
            let declared = &shader.stage(stage).image_types;
            for (slot, &id) in draw_state.images(stage).iter().enumerate() {
                let Some(&expected) = declared.get(slot) else {
                    if !id.is_invalid() {
                        return Err(ValidationError::UnexpectedImage { stage, slot });
                    }
                    continue;
                };
                let Some(image) = self.images.get(id) else {
                    return Ok(None);
                };
                if image.image_type != expected {
                    return Err(ValidationError::ImageTypeMismatch {
                        stage,
                        slot,
                        expected,
                        actual: image.image_type,
                    });
                }
                bindings.images[stage.index()][slot] = id;
            }
        }

        Ok(Some((bindings, pipeline.shader)))
    }
}

fn alloc<I: TypedId, T>(pool: &mut Pool<I, T>) -> I {
    let id = pool.alloc();
    if id.handle().is_invalid() {
        log::warn!(
            "The {} pool is exhausted ({} slots)",
            I::KIND,
            pool.capacity()
        );
    }
    id
}

/// Turns a backend creation result into a pool outcome, logging failures.
fn creation_outcome<I: TypedId, T>(
    id: I,
    info: T,
    result: Result<(), BackendError>,
) -> InitOutcome<T> {
    match result {
        Ok(()) => {
            log::debug!("Created {id:?}");
            InitOutcome::Ready(info)
        }
        Err(err) => {
            log::warn!("Failed to create {id:?}: {err}");
            InitOutcome::Failed(Some(info))
        }
    }
}

fn finish_init<I: TypedId, T>(pool: &mut Pool<I, T>, id: I, outcome: InitOutcome<T>) {
    if let Err(err) = pool.init(id, outcome) {
        log::error!("Could not record the initialisation of {id:?}: {err}");
    }
}

/// Frees the slot `id` refers to. Returns `true` if the backend owns a native
/// object for it.
fn release<I: TypedId, T>(pool: &mut Pool<I, T>, id: I) -> bool {
    if id.handle().is_invalid() {
        return false;
    }
    let was_valid = pool.state(id) == ResourceState::Valid;
    match pool.free(id) {
        Ok(_) => {
            log::debug!("Destroyed {id:?}");
            was_valid
        }
        Err(err) => {
            log::warn!("Cannot destroy {} {id:?}: {err}", <I as TypedId>::KIND);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, RecordingBackend};

    fn context(policy: ValidationPolicy) -> Context<RecordingBackend> {
        let desc = ContextDesc {
            validation: policy,
            pool_sizes: crate::config::PoolSizes::uniform(4),
            ..Default::default()
        };
        Context::setup(desc, RecordingBackend::default()).unwrap()
    }

    fn triangle_shader() -> ShaderDesc<'static> {
        ShaderDesc::default()
            .attr("position", VertexFormat::Float3)
            .uniform_block(
                ShaderStage::Vertex,
                UniformBlockDesc {
                    uniforms: vec![UniformDesc::new("mvp", UniformType::Mat4, 0)],
                },
            )
    }

    fn triangle_pipeline(ctx: &mut Context<RecordingBackend>) -> (PipelineId, BufferId) {
        let shader = ctx.make_shader(&triangle_shader());
        let pipeline = ctx.make_pipeline(
            &PipelineDesc::new(shader).attr(0, "position", VertexFormat::Float3),
        );
        let vertices = [0u8; 36];
        let buffer = ctx.make_buffer(&BufferDesc::vertices(&vertices));
        (pipeline, buffer)
    }

    #[test]
    fn test_setup_rejects_invalid_configuration() {
        let desc = ContextDesc {
            width: 0,
            ..Default::default()
        };
        assert!(matches!(
            Context::setup(desc, RecordingBackend::default()),
            Err(SetupError::EmptyFramebuffer { .. })
        ));
    }

    #[test]
    fn test_make_buffer_reaches_the_backend() {
        let mut ctx = context(ValidationPolicy::Fatal);
        let data = [1u8, 2, 3, 4];
        let id = ctx.make_buffer(&BufferDesc::vertices(&data));
        assert_eq!(ctx.buffer_state(id), ResourceState::Valid);
        assert_eq!(ctx.buffer_info(id).map(|info| info.size), Some(4));
        assert_eq!(ctx.backend().calls, vec![Call::CreateBuffer(id)]);
    }

    #[test]
    fn test_backend_failure_marks_resource_failed() {
        let mut ctx = context(ValidationPolicy::Fatal);
        ctx.backend_mut().fail_creation = true;
        let data = [0u8; 4];
        let id = ctx.make_buffer(&BufferDesc::vertices(&data));
        assert_eq!(ctx.buffer_state(id), ResourceState::Failed);
        assert!(ctx.buffer_info(id).is_none());

        ctx.destroy_buffer(id);
        assert_eq!(ctx.buffer_state(id), ResourceState::Invalid);
        // No native object existed, so the backend is not asked to destroy one.
        assert!(!ctx.backend().calls.contains(&Call::DestroyBuffer(id)));
    }

    #[test]
    fn test_pipeline_against_unready_shader_fails() {
        let mut ctx = context(ValidationPolicy::Fatal);
        let shader = ctx.alloc_shader();
        let pipeline = ctx.make_pipeline(
            &PipelineDesc::new(shader).attr(0, "position", VertexFormat::Float3),
        );
        assert_eq!(ctx.pipeline_state(pipeline), ResourceState::Failed);

        ctx.init_shader(shader, &triangle_shader());
        assert_eq!(ctx.shader_state(shader), ResourceState::Valid);
        assert_eq!(ctx.pipeline_state(pipeline), ResourceState::Failed);
    }

    #[test]
    #[should_panic(expected = "Alloc state")]
    fn test_init_twice_is_fatal() {
        let mut ctx = context(ValidationPolicy::Fatal);
        let data = [0u8; 4];
        let id = ctx.make_buffer(&BufferDesc::vertices(&data));
        ctx.init_buffer(id, &BufferDesc::vertices(&data));
    }

    #[test]
    fn test_invalid_descriptor_fails_resource_under_log_policy() {
        let mut ctx = context(ValidationPolicy::Log);
        let id = ctx.make_buffer(&BufferDesc::default());
        assert_eq!(ctx.buffer_state(id), ResourceState::Failed);
        assert!(ctx.backend().calls.is_empty());
    }

    #[test]
    fn test_pool_exhaustion_returns_invalid_id() {
        let mut ctx = context(ValidationPolicy::Fatal);
        let ids: Vec<_> = (0..4).map(|_| ctx.alloc_image()).collect();
        assert!(ids.iter().all(|id| !id.is_invalid()));
        assert!(ctx.alloc_image().is_invalid());
        let data = [0u8; 16];
        assert!(ctx
            .make_image(&ImageDesc::texture_2d(2, 2, PixelFormat::Rgba8, &data))
            .is_invalid());
    }

    #[test]
    fn test_full_frame_forwards_in_order() {
        let mut ctx = context(ValidationPolicy::Fatal);
        let (pipeline, buffer) = triangle_pipeline(&mut ctx);
        ctx.backend_mut().calls.clear();

        ctx.begin_default_pass(&PassAction::default());
        ctx.apply_viewport(0, 0, 640, 400, true);
        ctx.apply_draw_state(&DrawState::new(pipeline).with_vertex_buffer(0, buffer));
        ctx.apply_uniforms(ShaderStage::Vertex, 0, &[[0.0f32; 4]; 4]);
        ctx.draw(0, 3, 1);
        ctx.end_pass();
        ctx.commit();

        assert_eq!(
            ctx.backend().calls,
            vec![
                Call::BeginPass(None),
                Call::Viewport(Rect::new(0, 0, 640, 400)),
                Call::ApplyBindings(pipeline),
                Call::UniformBlock(ShaderStage::Vertex, 0, 64),
                Call::Draw(0, 3, 1),
                Call::EndPass,
                Call::Commit,
            ]
        );
        let stats = ctx.last_frame_stats();
        assert_eq!((stats.passes, stats.draws, stats.uniform_updates), (1, 1, 1));
        assert_eq!(ctx.frame_index(), 1);
    }

    #[test]
    fn test_unresolved_pipeline_drops_draws_and_pass_stays_open() {
        let mut ctx = context(ValidationPolicy::Fatal);
        let pipeline = ctx.alloc_pipeline();

        ctx.begin_default_pass(&PassAction::default());
        ctx.apply_draw_state(&DrawState::new(pipeline));
        ctx.apply_uniform_block(ShaderStage::Vertex, 0, &[0u8; 64]);
        ctx.draw(0, 3, 1);
        assert_eq!(ctx.draw_status(), DrawStatus::Dropped);
        ctx.end_pass();

        assert_eq!(ctx.backend().calls, vec![Call::BeginPass(None), Call::EndPass]);
        assert_eq!(ctx.frame_stats().draws_dropped, 1);
        assert_eq!(ctx.frame_stats().bindings_dropped, 1);
    }

    #[test]
    fn test_identical_draw_states_are_bound_once() {
        let mut ctx = context(ValidationPolicy::Fatal);
        let (pipeline, buffer) = triangle_pipeline(&mut ctx);
        let draw_state = DrawState::new(pipeline).with_vertex_buffer(0, buffer);
        ctx.backend_mut().calls.clear();

        ctx.begin_default_pass(&PassAction::default());
        ctx.apply_draw_state(&draw_state);
        ctx.apply_draw_state(&draw_state);
        ctx.reset_state_cache();
        ctx.reset_state_cache();
        ctx.apply_draw_state(&draw_state);
        ctx.end_pass();

        let binds = ctx
            .backend()
            .calls
            .iter()
            .filter(|call| matches!(call, Call::ApplyBindings(_)))
            .count();
        assert_eq!(binds, 2);
        assert_eq!(ctx.frame_stats().bindings_skipped, 1);
    }

    #[test]
    #[should_panic(expected = "is 64 bytes, got 16")]
    fn test_uniform_size_mismatch_is_fatal() {
        let mut ctx = context(ValidationPolicy::Fatal);
        let (pipeline, buffer) = triangle_pipeline(&mut ctx);
        ctx.begin_default_pass(&PassAction::default());
        ctx.apply_draw_state(&DrawState::new(pipeline).with_vertex_buffer(0, buffer));
        ctx.apply_uniform_block(ShaderStage::Vertex, 0, &[0u8; 16]);
    }

    #[test]
    fn test_unexpected_vertex_buffer_is_a_violation() {
        let mut ctx = context(ValidationPolicy::Log);
        let (pipeline, buffer) = triangle_pipeline(&mut ctx);
        ctx.begin_default_pass(&PassAction::default());
        ctx.apply_draw_state(
            &DrawState::new(pipeline)
                .with_vertex_buffer(0, buffer)
                .with_vertex_buffer(1, buffer),
        );
        assert_eq!(ctx.draw_status(), DrawStatus::Dropped);
        ctx.draw(0, 3, 1);
        ctx.end_pass();
        assert!(!ctx
            .backend()
            .calls
            .iter()
            .any(|call| matches!(call, Call::Draw(..))));
    }

    #[test]
    fn test_log_policy_skips_out_of_order_calls() {
        let mut ctx = context(ValidationPolicy::Log);
        ctx.draw(0, 3, 1);
        ctx.end_pass();
        ctx.begin_default_pass(&PassAction::default());
        ctx.begin_default_pass(&PassAction::default());
        ctx.commit();
        ctx.end_pass();
        ctx.commit();
        assert_eq!(
            ctx.backend().calls,
            vec![Call::BeginPass(None), Call::EndPass, Call::Commit]
        );
    }

    #[test]
    #[should_panic(expected = "clears and loads")]
    fn test_conflicting_pass_action_is_fatal() {
        let mut ctx = context(ValidationPolicy::Fatal);
        let action = PassAction {
            actions: PassActionFlags::CLEAR_DEPTH | PassActionFlags::LOAD_DEPTH,
            ..Default::default()
        };
        ctx.begin_default_pass(&action);
    }

    #[test]
    fn test_viewport_is_flipped_for_bottom_left_backends() {
        let mut ctx = context(ValidationPolicy::Fatal);
        assert!(!ctx.features().origin_top_left());
        ctx.begin_pass(PassId::INVALID, &PassAction::default(), 800, 600);
        ctx.apply_scissor_rect(10, 20, 100, 50, true);
        ctx.apply_viewport(10, 20, 100, 50, false);
        assert_eq!(
            ctx.backend().calls[1..],
            [
                Call::Scissor(Rect::new(10, 530, 100, 50)),
                Call::Viewport(Rect::new(10, 20, 100, 50)),
            ]
        );
    }

    #[test]
    fn test_destroy_stale_id_is_a_logged_no_op() {
        let mut ctx = context(ValidationPolicy::Fatal);
        let data = [0u8; 4];
        let id = ctx.make_buffer(&BufferDesc::vertices(&data));
        ctx.destroy_buffer(id);
        ctx.destroy_buffer(id);
        ctx.destroy_buffer(BufferId::INVALID);
        let destroys = ctx
            .backend()
            .calls
            .iter()
            .filter(|call| matches!(call, Call::DestroyBuffer(_)))
            .count();
        assert_eq!(destroys, 1);
    }

    #[test]
    fn test_discard_destroys_dependents_first() {
        let mut ctx = context(ValidationPolicy::Fatal);
        let (pipeline, buffer) = triangle_pipeline(&mut ctx);
        let shader = ctx.pipeline_info(pipeline).map(|info| info.shader).unwrap();
        ctx.backend_mut().calls.clear();

        let backend = ctx.discard();
        assert_eq!(
            backend.calls,
            vec![
                Call::DestroyPipeline(pipeline),
                Call::DestroyShader(shader),
                Call::DestroyBuffer(buffer),
                Call::Discard,
            ]
        );
    }

    #[test]
    fn test_update_rules_through_context() {
        let mut ctx = context(ValidationPolicy::Log);
        let id = ctx.make_buffer(&BufferDesc::updatable(BufferType::Vertex, Usage::Dynamic, 8));
        ctx.update_buffer(id, &[1; 8]);
        ctx.update_buffer(id, &[2; 8]);
        ctx.commit();
        ctx.update_buffer(id, &[3; 8]);
        let updates = ctx
            .backend()
            .calls
            .iter()
            .filter(|call| matches!(call, Call::UpdateBuffer(..)))
            .count();
        assert_eq!(updates, 2);
        assert_eq!(ctx.buffer_info(id).and_then(|info| info.last_update_frame), Some(1));
    }

    #[test]
    fn test_rejected_update_can_be_retried_in_the_same_frame() {
        let mut ctx = context(ValidationPolicy::Fatal);
        let id = ctx.make_buffer(&BufferDesc::updatable(BufferType::Vertex, Usage::Stream, 8));

        ctx.backend_mut().fail_updates = true;
        ctx.update_buffer(id, &[1; 8]);
        assert_eq!(ctx.buffer_info(id).and_then(|info| info.last_update_frame), None);

        ctx.backend_mut().fail_updates = false;
        ctx.update_buffer(id, &[2; 8]);
        assert_eq!(ctx.buffer_info(id).and_then(|info| info.last_update_frame), Some(0));
        assert!(ctx.backend().calls.contains(&Call::UpdateBuffer(id, 8)));
    }
}
