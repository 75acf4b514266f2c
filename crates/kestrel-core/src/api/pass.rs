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

//! Defines offscreen render passes and their attachments.

use super::image::PixelFormat;
use crate::handle::ImageId;
use std::borrow::Cow;

/// One image attached to a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AttachmentDesc {
    /// The render-target image.
    pub image: ImageId,
    /// The mip level rendered into.
    pub mip_level: u32,
    /// The cube face, array layer or 3D slice rendered into.
    pub slice: u32,
}

impl AttachmentDesc {
    /// Mip level 0, slice 0 of `image`.
    pub fn new(image: ImageId) -> Self {
        Self {
            image,
            mip_level: 0,
            slice: 0,
        }
    }
}

/// A descriptor used to create an offscreen pass.
#[derive(Debug, Clone, Default)]
pub struct PassDesc<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Between 1 and 4 color attachments.
    pub color_attachments: Vec<AttachmentDesc>,
    /// An optional depth-stencil attachment.
    pub depth_stencil_attachment: Option<AttachmentDesc>,
}

impl<'a> PassDesc<'a> {
    /// A pass rendering into the given color images.
    pub fn new(color_images: &[ImageId]) -> Self {
        Self {
            label: None,
            color_attachments: color_images.iter().copied().map(AttachmentDesc::new).collect(),
            depth_stencil_attachment: None,
        }
    }

    /// Adds a depth-stencil attachment.
    pub fn with_depth_stencil(mut self, image: ImageId) -> Self {
        self.depth_stencil_attachment = Some(AttachmentDesc::new(image));
        self
    }

    /// Attaches a debug label.
    pub fn with_label(mut self, label: impl Into<Cow<'a, str>>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A pass attachment with the image properties it had when the pass was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentInfo {
    /// The image and the region rendered into.
    pub attachment: AttachmentDesc,
    /// The image's pixel format.
    pub pixel_format: PixelFormat,
    /// The image's sample count.
    pub sample_count: u32,
}

/// What the core remembers about a live pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassInfo {
    /// The debug label, if any.
    pub label: Option<String>,
    /// The color attachments.
    pub color_attachments: Vec<AttachmentInfo>,
    /// The depth-stencil attachment.
    pub depth_stencil_attachment: Option<AttachmentInfo>,
    /// Width of the rendered region.
    pub width: u32,
    /// Height of the rendered region.
    pub height: u32,
}

impl PassInfo {
    /// Every attached image, color attachments first.
    pub fn images(&self) -> impl Iterator<Item = ImageId> + '_ {
        self.color_attachments
            .iter()
            .chain(self.depth_stencil_attachment.iter())
            .map(|info| info.attachment.image)
    }
}
