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

//! What happens to each attachment when a pass begins.

use super::color::Color;
use crate::limits::MAX_COLOR_ATTACHMENTS;
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Clear and load directives for every attachment of a pass.
    ///
    /// An attachment with neither bit set is left undefined ("don't care").
    /// Setting both bits for the same attachment is a contract violation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PassActionFlags: u32 {
        /// Clear color attachment 0.
        const CLEAR_COLOR0 = 1 << 0;
        /// Clear color attachment 1.
        const CLEAR_COLOR1 = 1 << 1;
        /// Clear color attachment 2.
        const CLEAR_COLOR2 = 1 << 2;
        /// Clear color attachment 3.
        const CLEAR_COLOR3 = 1 << 3;
        /// Clear every color attachment.
        const CLEAR_COLOR = 0b1111;
        /// Clear the depth buffer.
        const CLEAR_DEPTH = 1 << 4;
        /// Clear the stencil buffer.
        const CLEAR_STENCIL = 1 << 5;
        /// Clear depth and stencil.
        const CLEAR_DEPTH_STENCIL = Self::CLEAR_DEPTH.bits() | Self::CLEAR_STENCIL.bits();
        /// Clear everything.
        const CLEAR_ALL = Self::CLEAR_COLOR.bits() | Self::CLEAR_DEPTH_STENCIL.bits();
        /// Keep the previous contents of color attachment 0.
        const LOAD_COLOR0 = 1 << 6;
        /// Keep the previous contents of color attachment 1.
        const LOAD_COLOR1 = 1 << 7;
        /// Keep the previous contents of color attachment 2.
        const LOAD_COLOR2 = 1 << 8;
        /// Keep the previous contents of color attachment 3.
        const LOAD_COLOR3 = 1 << 9;
        /// Keep the previous contents of every color attachment.
        const LOAD_COLOR = 0b1111 << 6;
        /// Keep the previous depth values.
        const LOAD_DEPTH = 1 << 10;
        /// Keep the previous stencil values.
        const LOAD_STENCIL = 1 << 11;
        /// Keep depth and stencil.
        const LOAD_DEPTH_STENCIL = Self::LOAD_DEPTH.bits() | Self::LOAD_STENCIL.bits();
        /// Keep everything.
        const LOAD_ALL = Self::LOAD_COLOR.bits() | Self::LOAD_DEPTH_STENCIL.bits();
    }
}

impl PassActionFlags {
    /// The clear bit of color attachment `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`MAX_COLOR_ATTACHMENTS`].
    pub fn clear_color(index: usize) -> Self {
        assert!(
            index < MAX_COLOR_ATTACHMENTS,
            "color attachment {index} out of range"
        );
        Self::from_bits_truncate(Self::CLEAR_COLOR0.bits() << index)
    }

    /// The load bit of color attachment `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`MAX_COLOR_ATTACHMENTS`].
    pub fn load_color(index: usize) -> Self {
        assert!(
            index < MAX_COLOR_ATTACHMENTS,
            "color attachment {index} out of range"
        );
        Self::from_bits_truncate(Self::LOAD_COLOR0.bits() << index)
    }
}

/// Names one attachment of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    /// Color attachment `n`.
    Color(usize),
    /// The depth buffer.
    Depth,
    /// The stencil buffer.
    Stencil,
}

impl fmt::Display for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attachment::Color(index) => write!(f, "color attachment {index}"),
            Attachment::Depth => f.write_str("depth attachment"),
            Attachment::Stencil => f.write_str("stencil attachment"),
        }
    }
}

/// The resolved directive for a single attachment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttachmentAction<V> {
    /// Clear to the given value.
    Clear(V),
    /// Keep the previous contents.
    Load,
    /// Contents are undefined.
    DontCare,
}

/// Clear values and directives applied when a pass begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassAction {
    /// Clear color of each color attachment.
    pub colors: [Color; MAX_COLOR_ATTACHMENTS],
    /// Depth clear value.
    pub depth: f32,
    /// Stencil clear value.
    pub stencil: u8,
    /// Which attachments are cleared or loaded.
    pub actions: PassActionFlags,
}

impl Default for PassAction {
    /// Clears every color attachment to `(0.5, 0.5, 0.5, 1.0)`, depth to 1.0 and
    /// stencil to 0.
    fn default() -> Self {
        Self {
            colors: [Color::DEFAULT_CLEAR; MAX_COLOR_ATTACHMENTS],
            depth: 1.0,
            stencil: 0,
            actions: PassActionFlags::CLEAR_ALL,
        }
    }
}

impl PassAction {
    /// Clears every color attachment to `color` and depth/stencil to their defaults.
    pub fn clear(color: Color) -> Self {
        Self {
            colors: [color; MAX_COLOR_ATTACHMENTS],
            ..Default::default()
        }
    }

    /// Keeps the previous contents of every attachment.
    pub fn load() -> Self {
        Self {
            actions: PassActionFlags::LOAD_ALL,
            ..Default::default()
        }
    }

    /// The directive for color attachment `index`.
    pub fn color_action(&self, index: usize) -> AttachmentAction<Color> {
        resolve(
            self.actions,
            PassActionFlags::clear_color(index),
            PassActionFlags::load_color(index),
            self.colors[index],
        )
    }

    /// The directive for the depth buffer.
    pub fn depth_action(&self) -> AttachmentAction<f32> {
        resolve(
            self.actions,
            PassActionFlags::CLEAR_DEPTH,
            PassActionFlags::LOAD_DEPTH,
            self.depth,
        )
    }

    /// The directive for the stencil buffer.
    pub fn stencil_action(&self) -> AttachmentAction<u8> {
        resolve(
            self.actions,
            PassActionFlags::CLEAR_STENCIL,
            PassActionFlags::LOAD_STENCIL,
            self.stencil,
        )
    }

    /// The first attachment that is asked to be both cleared and loaded.
    pub fn conflicting_attachment(&self) -> Option<Attachment> {
        let conflicts = |clear: PassActionFlags, load: PassActionFlags| {
            self.actions.contains(clear) && self.actions.contains(load)
        };
        (0..MAX_COLOR_ATTACHMENTS)
            .find(|&index| {
                conflicts(
                    PassActionFlags::clear_color(index),
                    PassActionFlags::load_color(index),
                )
            })
            .map(Attachment::Color)
            .or_else(|| {
                conflicts(PassActionFlags::CLEAR_DEPTH, PassActionFlags::LOAD_DEPTH)
                    .then_some(Attachment::Depth)
            })
            .or_else(|| {
                conflicts(PassActionFlags::CLEAR_STENCIL, PassActionFlags::LOAD_STENCIL)
                    .then_some(Attachment::Stencil)
            })
    }
}

fn resolve<V>(
    actions: PassActionFlags,
    clear: PassActionFlags,
    load: PassActionFlags,
    value: V,
) -> AttachmentAction<V> {
    if actions.contains(clear) {
        AttachmentAction::Clear(value)
    } else if actions.contains(load) {
        AttachmentAction::Load
    } else {
        AttachmentAction::DontCare
    }
}
