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

//! Defines data structures related to vertex and index buffers.

use super::common::Usage;
use std::borrow::Cow;

/// Whether a buffer feeds vertex attributes or indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferType {
    /// Bound to one of the vertex buffer slots of a draw state.
    #[default]
    Vertex,
    /// Bound as the index buffer of a draw state.
    Index,
}

/// A descriptor used to create a buffer.
#[derive(Debug, Clone, Default)]
pub struct BufferDesc<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The size of the buffer in bytes. Must be greater than zero.
    pub size: usize,
    /// Vertex or index buffer.
    pub buffer_type: BufferType,
    /// How often the contents change.
    pub usage: Usage,
    /// Initial contents. Required for immutable buffers, at most `size` bytes.
    pub content: Option<Cow<'a, [u8]>>,
}

impl<'a> BufferDesc<'a> {
    /// An immutable vertex buffer holding `data`.
    pub fn vertices(data: &'a [u8]) -> Self {
        Self::immutable(BufferType::Vertex, data)
    }

    /// An immutable index buffer holding `data`.
    pub fn indices(data: &'a [u8]) -> Self {
        Self::immutable(BufferType::Index, data)
    }

    /// An empty buffer of `size` bytes whose contents are supplied later through
    /// [`crate::Context::update_buffer`].
    pub fn updatable(buffer_type: BufferType, usage: Usage, size: usize) -> Self {
        Self {
            size,
            buffer_type,
            usage,
            ..Default::default()
        }
    }

    /// Attaches a debug label.
    pub fn with_label(mut self, label: impl Into<Cow<'a, str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn immutable(buffer_type: BufferType, data: &'a [u8]) -> Self {
        Self {
            label: None,
            size: data.len(),
            buffer_type,
            usage: Usage::Immutable,
            content: Some(Cow::Borrowed(data)),
        }
    }
}

/// What the core remembers about a live buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferInfo {
    /// The debug label, if any.
    pub label: Option<String>,
    /// The size in bytes.
    pub size: usize,
    /// Vertex or index buffer.
    pub buffer_type: BufferType,
    /// How often the contents change.
    pub usage: Usage,
    /// The frame index of the last accepted update.
    pub last_update_frame: Option<u64>,
}

impl BufferInfo {
    pub(crate) fn from_desc(desc: &BufferDesc<'_>) -> Self {
        Self {
            label: desc.label.as_deref().map(str::to_owned),
            size: desc.size,
            buffer_type: desc.buffer_type,
            usage: desc.usage,
            last_update_frame: None,
        }
    }
}
