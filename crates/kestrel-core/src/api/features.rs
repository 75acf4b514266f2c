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

//! Optional capabilities a backend adapter can advertise.

use bitflags::bitflags;

bitflags! {
    /// The set of optional features supported by a backend.
    ///
    /// Queried once at setup through [`crate::GraphicsBackend::features`] and exposed
    /// by [`crate::Context::features`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Features: u32 {
        /// DXT1/3/5 block compressed textures.
        const TEXTURE_COMPRESSION_DXT = 1 << 0;
        /// PVRTC block compressed textures.
        const TEXTURE_COMPRESSION_PVRTC = 1 << 1;
        /// ATC block compressed textures.
        const TEXTURE_COMPRESSION_ATC = 1 << 2;
        /// ETC2 block compressed textures.
        const TEXTURE_COMPRESSION_ETC2 = 1 << 3;
        /// 32-bit float textures.
        const TEXTURE_FLOAT = 1 << 4;
        /// 16-bit float textures.
        const TEXTURE_HALF_FLOAT = 1 << 5;
        /// Framebuffer row 0 is the bottom row (GL convention).
        const ORIGIN_BOTTOM_LEFT = 1 << 6;
        /// Framebuffer row 0 is the top row (D3D and Metal convention).
        const ORIGIN_TOP_LEFT = 1 << 7;
        /// Multisampled render targets.
        const MSAA_RENDER_TARGETS = 1 << 8;
        /// The packed `UInt10N2` vertex format.
        const PACKED_VERTEX_FORMAT_10_2 = 1 << 9;
        /// Passes with more than one color attachment.
        const MULTIPLE_RENDER_TARGET = 1 << 10;
        /// 3D textures.
        const TEXTURE_3D = 1 << 11;
        /// 2D array textures.
        const TEXTURE_ARRAY = 1 << 12;
        /// Adopting externally created native textures.
        const NATIVE_TEXTURE = 1 << 13;
    }
}

impl Features {
    /// Returns `true` if the backend's framebuffer origin is the top-left corner.
    ///
    /// A backend that advertises neither origin flag is treated as bottom-left.
    pub fn origin_top_left(self) -> bool {
        self.contains(Features::ORIGIN_TOP_LEFT)
    }
}
