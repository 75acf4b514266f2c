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

//! Defines data structures related to textures and render-target images.

use super::common::Usage;
use super::features::Features;
use std::borrow::Cow;

/// The dimensionality of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageType {
    /// A plain 2D texture.
    #[default]
    D2,
    /// A cube map with six square faces.
    Cube,
    /// A volume texture.
    D3,
    /// An array of 2D layers.
    Array,
}

/// The memory layout of an image's texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// 8-bit RGBA.
    #[default]
    Rgba8,
    /// 8-bit RGB.
    Rgb8,
    /// 4-bit RGBA.
    Rgba4,
    /// 5/6/5-bit RGB.
    R5g6b5,
    /// 5/5/5/1-bit RGBA.
    R5g5b5a1,
    /// 10/10/10/2-bit RGBA.
    R10g10b10a2,
    /// 32-bit float RGBA.
    Rgba32f,
    /// 16-bit float RGBA.
    Rgba16f,
    /// Single channel 32-bit float.
    R32f,
    /// Single channel 16-bit float.
    R16f,
    /// Single channel 8-bit luminance.
    L8,
    /// DXT1 block compression.
    Dxt1,
    /// DXT3 block compression.
    Dxt3,
    /// DXT5 block compression.
    Dxt5,
    /// Depth only, render targets only.
    Depth,
    /// Depth and stencil, render targets only.
    DepthStencil,
    /// PVRTC 2bpp RGB.
    Pvrtc2Rgb,
    /// PVRTC 4bpp RGB.
    Pvrtc4Rgb,
    /// PVRTC 2bpp RGBA.
    Pvrtc2Rgba,
    /// PVRTC 4bpp RGBA.
    Pvrtc4Rgba,
    /// ETC2 RGB.
    Etc2Rgb8,
    /// ETC2 sRGB.
    Etc2Srgb8,
}

impl PixelFormat {
    /// Bytes per texel for uncompressed formats, `None` for block compressed ones.
    pub fn bytes_per_pixel(self) -> Option<usize> {
        use PixelFormat::*;
        match self {
            Rgba32f => Some(16),
            Rgba16f => Some(8),
            Rgba8 | R10g10b10a2 | R32f | Depth | DepthStencil => Some(4),
            Rgb8 => Some(3),
            Rgba4 | R5g6b5 | R5g5b5a1 | R16f => Some(2),
            L8 => Some(1),
            Dxt1 | Dxt3 | Dxt5 | Pvrtc2Rgb | Pvrtc4Rgb | Pvrtc2Rgba | Pvrtc4Rgba
            | Etc2Rgb8 | Etc2Srgb8 => None,
        }
    }

    /// Returns `true` for block compressed formats.
    pub fn is_compressed(self) -> bool {
        self.bytes_per_pixel().is_none()
    }

    /// Returns `true` for formats usable as a depth-stencil attachment.
    pub fn is_depth(self) -> bool {
        matches!(self, PixelFormat::Depth | PixelFormat::DepthStencil)
    }

    /// The optional backend feature needed to create images of this format.
    pub fn required_feature(self) -> Option<Features> {
        use PixelFormat::*;
        match self {
            Dxt1 | Dxt3 | Dxt5 => Some(Features::TEXTURE_COMPRESSION_DXT),
            Pvrtc2Rgb | Pvrtc4Rgb | Pvrtc2Rgba | Pvrtc4Rgba => {
                Some(Features::TEXTURE_COMPRESSION_PVRTC)
            }
            Etc2Rgb8 | Etc2Srgb8 => Some(Features::TEXTURE_COMPRESSION_ETC2),
            Rgba32f | R32f => Some(Features::TEXTURE_FLOAT),
            Rgba16f | R16f => Some(Features::TEXTURE_HALF_FLOAT),
            _ => None,
        }
    }
}

/// Texture sampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    /// Nearest texel.
    #[default]
    Nearest,
    /// Bilinear filtering.
    Linear,
    /// Nearest texel of the nearest mip level.
    NearestMipmapNearest,
    /// Nearest texel, blended between two mip levels.
    NearestMipmapLinear,
    /// Bilinear within the nearest mip level.
    LinearMipmapNearest,
    /// Trilinear filtering.
    LinearMipmapLinear,
}

/// Texture coordinate wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Wrap {
    /// Repeat the texture.
    #[default]
    Repeat,
    /// Clamp to the edge texel.
    ClampToEdge,
    /// Repeat with mirroring.
    MirroredRepeat,
}

/// The data for one face and mip level of an image.
#[derive(Debug, Clone)]
pub struct SubImage<'a> {
    /// The cube face (0..6), 0 for other image types.
    pub face: u32,
    /// The mip level.
    pub mip_level: u32,
    /// Texel data for every slice/layer of this mip level, tightly packed.
    pub data: Cow<'a, [u8]>,
}

/// Initial or updated contents of an image.
#[derive(Debug, Clone, Default)]
pub struct ImageContent<'a> {
    /// One entry per face and mip level that receives data.
    pub subimages: Vec<SubImage<'a>>,
}

impl<'a> ImageContent<'a> {
    /// Content for face 0, mip level 0 only.
    pub fn single(data: &'a [u8]) -> Self {
        Self {
            subimages: vec![SubImage {
                face: 0,
                mip_level: 0,
                data: Cow::Borrowed(data),
            }],
        }
    }
}

/// A descriptor used to create an image.
#[derive(Debug, Clone)]
pub struct ImageDesc<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The dimensionality.
    pub image_type: ImageType,
    /// Whether the image can be attached to an offscreen pass.
    pub render_target: bool,
    /// Width of mip level 0.
    pub width: u32,
    /// Height of mip level 0.
    pub height: u32,
    /// Depth for 3D images, layer count for array images, ignored otherwise.
    pub depth_or_layers: u32,
    /// Number of mip levels, at least 1.
    pub num_mipmaps: u32,
    /// How often the contents change.
    pub usage: Usage,
    /// The texel format.
    pub pixel_format: PixelFormat,
    /// MSAA samples, render targets only.
    pub sample_count: u32,
    /// Minification filter.
    pub min_filter: Filter,
    /// Magnification filter.
    pub mag_filter: Filter,
    /// Wrapping along U.
    pub wrap_u: Wrap,
    /// Wrapping along V.
    pub wrap_v: Wrap,
    /// Wrapping along W (3D images).
    pub wrap_w: Wrap,
    /// Initial contents. Required for immutable images that are not render targets.
    pub content: Option<ImageContent<'a>>,
}

impl Default for ImageDesc<'_> {
    fn default() -> Self {
        Self {
            label: None,
            image_type: ImageType::D2,
            render_target: false,
            width: 0,
            height: 0,
            depth_or_layers: 1,
            num_mipmaps: 1,
            usage: Usage::Immutable,
            pixel_format: PixelFormat::Rgba8,
            sample_count: 1,
            min_filter: Filter::Nearest,
            mag_filter: Filter::Nearest,
            wrap_u: Wrap::Repeat,
            wrap_v: Wrap::Repeat,
            wrap_w: Wrap::Repeat,
            content: None,
        }
    }
}

impl<'a> ImageDesc<'a> {
    /// An immutable 2D texture holding `data` in mip level 0.
    pub fn texture_2d(width: u32, height: u32, pixel_format: PixelFormat, data: &'a [u8]) -> Self {
        Self {
            width,
            height,
            pixel_format,
            content: Some(ImageContent::single(data)),
            ..Default::default()
        }
    }

    /// A 2D render target without initial contents.
    pub fn render_target(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        Self {
            render_target: true,
            width,
            height,
            pixel_format,
            ..Default::default()
        }
    }

    /// Attaches a debug label.
    pub fn with_label(mut self, label: impl Into<Cow<'a, str>>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// What the core remembers about a live image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// The debug label, if any.
    pub label: Option<String>,
    /// The dimensionality.
    pub image_type: ImageType,
    /// Whether the image can be attached to a pass.
    pub render_target: bool,
    /// Width of mip level 0.
    pub width: u32,
    /// Height of mip level 0.
    pub height: u32,
    /// Depth (3D) or layer count (array); 1 otherwise.
    pub depth_or_layers: u32,
    /// Number of mip levels.
    pub num_mipmaps: u32,
    /// How often the contents change.
    pub usage: Usage,
    /// The texel format.
    pub pixel_format: PixelFormat,
    /// MSAA samples.
    pub sample_count: u32,
    /// Minification filter.
    pub min_filter: Filter,
    /// Magnification filter.
    pub mag_filter: Filter,
    /// Wrapping along U, V and W.
    pub wrap: [Wrap; 3],
    /// The frame index of the last accepted update.
    pub last_update_frame: Option<u64>,
}

impl ImageInfo {
    /// Derives the metadata kept for an image created from `desc`.
    pub fn from_desc(desc: &ImageDesc<'_>) -> Self {
        let depth_or_layers = match desc.image_type {
            ImageType::D3 | ImageType::Array => desc.depth_or_layers,
            ImageType::D2 | ImageType::Cube => 1,
        };
        Self {
            label: desc.label.as_deref().map(str::to_owned),
            image_type: desc.image_type,
            render_target: desc.render_target,
            width: desc.width,
            height: desc.height,
            depth_or_layers,
            num_mipmaps: desc.num_mipmaps,
            usage: desc.usage,
            pixel_format: desc.pixel_format,
            sample_count: desc.sample_count,
            min_filter: desc.min_filter,
            mag_filter: desc.mag_filter,
            wrap: [desc.wrap_u, desc.wrap_v, desc.wrap_w],
            last_update_frame: None,
        }
    }

    /// Number of faces: 6 for cube maps, 1 otherwise.
    pub fn num_faces(&self) -> u32 {
        if self.image_type == ImageType::Cube {
            6
        } else {
            1
        }
    }

    /// Width and height of `mip_level`.
    pub fn mip_extent(&self, mip_level: u32) -> (u32, u32) {
        (mip_dim(self.width, mip_level), mip_dim(self.height, mip_level))
    }

    /// Number of slices stored per face at `mip_level`.
    pub fn mip_slices(&self, mip_level: u32) -> u32 {
        match self.image_type {
            ImageType::D3 => mip_dim(self.depth_or_layers, mip_level),
            ImageType::Array => self.depth_or_layers,
            ImageType::D2 | ImageType::Cube => 1,
        }
    }

    /// Size in bytes of one face of `mip_level`, `None` for compressed formats.
    pub fn subimage_size(&self, mip_level: u32) -> Option<usize> {
        let bpp = self.pixel_format.bytes_per_pixel()?;
        let (width, height) = self.mip_extent(mip_level);
        Some(width as usize * height as usize * self.mip_slices(mip_level) as usize * bpp)
    }
}

/// Number of levels in a full mip chain for an image whose largest side is `max_dim`.
pub fn mip_chain_length(max_dim: u32) -> u32 {
    if max_dim == 0 {
        0
    } else {
        u32::BITS - max_dim.leading_zeros()
    }
}

fn mip_dim(dim: u32, mip_level: u32) -> u32 {
    dim.checked_shr(mip_level).unwrap_or(0).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_chain_length() {
        assert_eq!(mip_chain_length(0), 0);
        assert_eq!(mip_chain_length(1), 1);
        assert_eq!(mip_chain_length(256), 9);
        assert_eq!(mip_chain_length(300), 9);
    }

    #[test]
    fn test_subimage_size_follows_mip_extent() {
        let desc = ImageDesc {
            width: 16,
            height: 8,
            num_mipmaps: 5,
            ..Default::default()
        };
        let info = ImageInfo::from_desc(&desc);
        assert_eq!(info.mip_extent(0), (16, 8));
        assert_eq!(info.mip_extent(4), (1, 1));
        assert_eq!(info.subimage_size(0), Some(16 * 8 * 4));
        assert_eq!(info.subimage_size(1), Some(8 * 4 * 4));
    }

    #[test]
    fn test_array_layers_are_not_shrunk_by_mips() {
        let desc = ImageDesc {
            image_type: ImageType::Array,
            width: 4,
            height: 4,
            depth_or_layers: 3,
            pixel_format: PixelFormat::L8,
            ..Default::default()
        };
        let info = ImageInfo::from_desc(&desc);
        assert_eq!(info.mip_slices(2), 3);
        assert_eq!(info.subimage_size(1), Some(2 * 2 * 3));
    }

    #[test]
    fn test_compressed_formats_have_no_texel_size() {
        assert!(PixelFormat::Dxt5.is_compressed());
        assert_eq!(
            PixelFormat::Etc2Rgb8.required_feature(),
            Some(Features::TEXTURE_COMPRESSION_ETC2)
        );
        assert_eq!(PixelFormat::Rgba8.required_feature(), None);
        assert!(PixelFormat::DepthStencil.is_depth());
    }
}
