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

//! A backend that records every call it receives, for unit tests.

use crate::api::*;
use crate::backend::{GraphicsBackend, PassTarget, ResolvedBindings};
use crate::error::BackendError;
use crate::handle::{BufferId, ImageId, PassId, PipelineId, ShaderId};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateBuffer(BufferId),
    UpdateBuffer(BufferId, usize),
    DestroyBuffer(BufferId),
    CreateImage(ImageId),
    UpdateImage(ImageId),
    DestroyImage(ImageId),
    CreateShader(ShaderId),
    DestroyShader(ShaderId),
    CreatePipeline(PipelineId),
    DestroyPipeline(PipelineId),
    CreatePass(PassId, usize),
    DestroyPass(PassId),
    /// `None` for the default pass.
    BeginPass(Option<PassId>),
    Viewport(Rect),
    Scissor(Rect),
    ApplyBindings(PipelineId),
    UniformBlock(ShaderStage, usize, usize),
    Draw(u32, u32, u32),
    EndPass,
    Commit,
    ResetStateCache,
    Discard,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingBackend {
    pub features: Features,
    pub fail_creation: bool,
    pub fail_updates: bool,
    pub calls: Vec<Call>,
}

impl RecordingBackend {
    fn create(&mut self, call: Call) -> Result<(), BackendError> {
        if self.fail_creation {
            return Err(BackendError::CreationFailed("rejected by test".into()));
        }
        self.calls.push(call);
        Ok(())
    }
}

impl GraphicsBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn features(&self) -> Features {
        self.features
    }

    fn create_buffer(&mut self, id: BufferId, _desc: &BufferDesc<'_>) -> Result<(), BackendError> {
        self.create(Call::CreateBuffer(id))
    }

    fn update_buffer(&mut self, id: BufferId, data: &[u8]) -> Result<(), BackendError> {
        if self.fail_updates {
            return Err(BackendError::UnknownResource(id.handle()));
        }
        self.calls.push(Call::UpdateBuffer(id, data.len()));
        Ok(())
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        self.calls.push(Call::DestroyBuffer(id));
    }

    fn create_image(&mut self, id: ImageId, _desc: &ImageDesc<'_>) -> Result<(), BackendError> {
        self.create(Call::CreateImage(id))
    }

    fn update_image(&mut self, id: ImageId, _content: &ImageContent<'_>) -> Result<(), BackendError> {
        if self.fail_updates {
            return Err(BackendError::UnknownResource(id.handle()));
        }
        self.calls.push(Call::UpdateImage(id));
        Ok(())
    }

    fn destroy_image(&mut self, id: ImageId) {
        self.calls.push(Call::DestroyImage(id));
    }

    fn create_shader(&mut self, id: ShaderId, _desc: &ShaderDesc<'_>) -> Result<(), BackendError> {
        self.create(Call::CreateShader(id))
    }

    fn destroy_shader(&mut self, id: ShaderId) {
        self.calls.push(Call::DestroyShader(id));
    }

    fn create_pipeline(
        &mut self,
        id: PipelineId,
        _desc: &PipelineDesc<'_>,
        _shader: &ShaderInfo,
    ) -> Result<(), BackendError> {
        self.create(Call::CreatePipeline(id))
    }

    fn destroy_pipeline(&mut self, id: PipelineId) {
        self.calls.push(Call::DestroyPipeline(id));
    }

    fn create_pass(
        &mut self,
        id: PassId,
        _info: &PassInfo,
        attachments: &[&ImageInfo],
    ) -> Result<(), BackendError> {
        self.create(Call::CreatePass(id, attachments.len()))
    }

    fn destroy_pass(&mut self, id: PassId) {
        self.calls.push(Call::DestroyPass(id));
    }

    fn begin_pass(&mut self, target: PassTarget<'_>, _action: &PassAction) {
        let pass = match target {
            PassTarget::Default { .. } => None,
            PassTarget::Offscreen { id, .. } => Some(id),
        };
        self.calls.push(Call::BeginPass(pass));
    }

    fn apply_viewport(&mut self, rect: Rect) {
        self.calls.push(Call::Viewport(rect));
    }

    fn apply_scissor_rect(&mut self, rect: Rect) {
        self.calls.push(Call::Scissor(rect));
    }

    fn apply_bindings(&mut self, bindings: &ResolvedBindings) {
        self.calls.push(Call::ApplyBindings(bindings.pipeline));
    }

    fn apply_uniform_block(&mut self, stage: ShaderStage, slot: usize, data: &[u8]) {
        self.calls.push(Call::UniformBlock(stage, slot, data.len()));
    }

    fn draw(&mut self, base_element: u32, num_elements: u32, num_instances: u32) {
        self.calls
            .push(Call::Draw(base_element, num_elements, num_instances));
    }

    fn end_pass(&mut self) {
        self.calls.push(Call::EndPass);
    }

    fn commit(&mut self) {
        self.calls.push(Call::Commit);
    }

    fn reset_state_cache(&mut self) {
        self.calls.push(Call::ResetStateCache);
    }

    fn discard(&mut self) {
        self.calls.push(Call::Discard);
    }
}
