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


//! Recorded commands.

use kestrel_core::{PassAction, PassId, Rect, ResolvedBindings, ShaderStage};

/// A pass-scoped command as received by the [`super::HeadlessBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A pass began.
    BeginPass {
        /// The offscreen pass, `None` for the default framebuffer.
        pass: Option<PassId>,
        /// Width of the render target.
        width: u32,
        /// Height of the render target.
        height: u32,
        /// The pass action applied.
        action: PassAction,
    },
    /// The viewport, in the backend's origin convention.
    Viewport(Rect),
    /// The scissor rectangle, in the backend's origin convention.
    Scissor(Rect),
    /// A draw state was bound.
    ApplyBindings(ResolvedBindings),
    /// A uniform block was uploaded.
    UniformBlock {
        /// The shader stage.
        stage: ShaderStage,
        /// The uniform block slot.
        slot: usize,
        /// A copy of the uploaded bytes.
        data: Vec<u8>,
    },
    /// A draw call.
    Draw {
        /// First vertex or index.
        base_element: u32,
        /// Number of vertices or indices.
        num_elements: u32,
        /// Number of instances.
        num_instances: u32,
    },
    /// The current pass ended.
    EndPass,
    /// The frame was committed.
    Commit,
    /// The cached binding state was reset.
    ResetStateCache,
}

impl Command {
    /// Returns `true` for [`Command::Draw`].
    pub fn is_draw(&self) -> bool {
        matches!(self, Command::Draw { .. })
    }
}
