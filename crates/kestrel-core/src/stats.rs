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

//! Per-frame counters kept by the command sequencer.

/// Counters for a single frame, reset on every [`crate::Context::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// The frame these counters belong to.
    pub frame_index: u64,
    /// Passes begun, degraded ones included.
    pub passes: u32,
    /// Passes whose target did not resolve.
    pub degraded_passes: u32,
    /// Draw calls forwarded to the backend.
    pub draws: u32,
    /// Draw calls dropped because of drop mode or a degraded pass.
    pub draws_dropped: u32,
    /// Draw states forwarded to the backend.
    pub bindings: u32,
    /// Draw states identical to the bound one, filtered by the cache.
    pub bindings_skipped: u32,
    /// Draw states that referenced a resource that was not `Valid`.
    pub bindings_dropped: u32,
    /// Uniform blocks forwarded to the backend.
    pub uniform_updates: u32,
}

impl FrameStats {
    pub(crate) fn new(frame_index: u64) -> Self {
        Self {
            frame_index,
            ..Default::default()
        }
    }
}
