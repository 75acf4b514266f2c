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

//! Defines data structures related to shaders and their resource interface.
//!
//! The core never compiles shader source. It only needs the interface a shader
//! declares (uniform blocks, images, vertex attributes) to validate draw calls;
//! the source is handed to the backend untouched.

use super::image::ImageType;
use super::pipeline::VertexFormat;
use std::borrow::Cow;

/// A programmable shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// The vertex stage.
    Vertex,
    /// The fragment stage.
    Fragment,
}

impl ShaderStage {
    /// Number of stages.
    pub const COUNT: usize = 2;
    /// Both stages, in index order.
    pub const ALL: [ShaderStage; 2] = [ShaderStage::Vertex, ShaderStage::Fragment];

    /// The stage's position in per-stage arrays.
    pub const fn index(self) -> usize {
        match self {
            ShaderStage::Vertex => 0,
            ShaderStage::Fragment => 1,
        }
    }
}

/// The type of one uniform inside a uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UniformType {
    /// One `f32`.
    #[default]
    Float,
    /// Two `f32`s.
    Float2,
    /// Three `f32`s.
    Float3,
    /// Four `f32`s.
    Float4,
    /// A 4x4 `f32` matrix.
    Mat4,
}

impl UniformType {
    /// Size of one element in bytes.
    pub const fn size(self) -> usize {
        match self {
            UniformType::Float => 4,
            UniformType::Float2 => 8,
            UniformType::Float3 => 12,
            UniformType::Float4 => 16,
            UniformType::Mat4 => 64,
        }
    }
}

/// One uniform of a uniform block.
#[derive(Debug, Clone)]
pub struct UniformDesc<'a> {
    /// The uniform's name in the shader source.
    pub name: Cow<'a, str>,
    /// The element type.
    pub uniform_type: UniformType,
    /// Byte offset from the start of the block.
    pub offset: usize,
    /// Number of array elements, 1 for scalars.
    pub array_size: usize,
}

impl<'a> UniformDesc<'a> {
    /// A non-array uniform at `offset`.
    pub fn new(name: impl Into<Cow<'a, str>>, uniform_type: UniformType, offset: usize) -> Self {
        Self {
            name: name.into(),
            uniform_type,
            offset,
            array_size: 1,
        }
    }

    /// The byte offset just past this uniform.
    pub fn end(&self) -> usize {
        self.offset + self.uniform_type.size() * self.array_size
    }
}

/// A uniform block: the unit of data passed to [`crate::Context::apply_uniform_block`].
#[derive(Debug, Clone, Default)]
pub struct UniformBlockDesc<'a> {
    /// The uniforms of the block.
    pub uniforms: Vec<UniformDesc<'a>>,
}

impl UniformBlockDesc<'_> {
    /// The block size in bytes: the furthest end of any uniform.
    pub fn size(&self) -> usize {
        self.uniforms.iter().map(UniformDesc::end).max().unwrap_or(0)
    }
}

/// An image sampled by a shader stage.
#[derive(Debug, Clone)]
pub struct ShaderImageDesc<'a> {
    /// The sampler's name in the shader source.
    pub name: Cow<'a, str>,
    /// The image type the sampler expects.
    pub image_type: ImageType,
}

/// The interface and source of one shader stage.
#[derive(Debug, Clone, Default)]
pub struct ShaderStageDesc<'a> {
    /// Backend specific source or bytecode.
    pub source: Option<Cow<'a, [u8]>>,
    /// Entry point name, for backends that need one.
    pub entry: Option<Cow<'a, str>>,
    /// Uniform blocks, indexed by slot.
    pub uniform_blocks: Vec<UniformBlockDesc<'a>>,
    /// Images, indexed by slot.
    pub images: Vec<ShaderImageDesc<'a>>,
}

/// A vertex attribute as named in the vertex shader.
#[derive(Debug, Clone)]
pub struct ShaderAttrDesc<'a> {
    /// The attribute's name in the shader source.
    pub name: Cow<'a, str>,
    /// The attribute's format.
    pub format: VertexFormat,
}

/// A descriptor used to create a shader.
#[derive(Debug, Clone, Default)]
pub struct ShaderDesc<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The vertex stage.
    pub vs: ShaderStageDesc<'a>,
    /// The fragment stage.
    pub fs: ShaderStageDesc<'a>,
    /// The vertex inputs, in location order.
    pub attrs: Vec<ShaderAttrDesc<'a>>,
}

impl<'a> ShaderDesc<'a> {
    /// Appends a vertex attribute.
    pub fn attr(mut self, name: impl Into<Cow<'a, str>>, format: VertexFormat) -> Self {
        self.attrs.push(ShaderAttrDesc {
            name: name.into(),
            format,
        });
        self
    }

    /// Appends a uniform block to `stage` and returns the builder.
    pub fn uniform_block(mut self, stage: ShaderStage, block: UniformBlockDesc<'a>) -> Self {
        self.stage_mut(stage).uniform_blocks.push(block);
        self
    }

    /// Appends an image to `stage` and returns the builder.
    pub fn image(
        mut self,
        stage: ShaderStage,
        name: impl Into<Cow<'a, str>>,
        image_type: ImageType,
    ) -> Self {
        self.stage_mut(stage).images.push(ShaderImageDesc {
            name: name.into(),
            image_type,
        });
        self
    }

    /// Attaches a debug label.
    pub fn with_label(mut self, label: impl Into<Cow<'a, str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The description of `stage`.
    pub fn stage(&self, stage: ShaderStage) -> &ShaderStageDesc<'a> {
        match stage {
            ShaderStage::Vertex => &self.vs,
            ShaderStage::Fragment => &self.fs,
        }
    }

    fn stage_mut(&mut self, stage: ShaderStage) -> &mut ShaderStageDesc<'a> {
        match stage {
            ShaderStage::Vertex => &mut self.vs,
            ShaderStage::Fragment => &mut self.fs,
        }
    }
}

/// What the core remembers about one stage of a live shader.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderStageInfo {
    /// Byte size of each uniform block, indexed by slot.
    pub uniform_block_sizes: Vec<usize>,
    /// Expected image type of each image slot.
    pub image_types: Vec<ImageType>,
}

/// What the core remembers about a live shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderInfo {
    /// The debug label, if any.
    pub label: Option<String>,
    /// Per-stage interface, indexed by [`ShaderStage::index`].
    pub stages: [ShaderStageInfo; ShaderStage::COUNT],
    /// Vertex attribute names and formats.
    pub attrs: Vec<(String, VertexFormat)>,
}

impl ShaderInfo {
    pub(crate) fn from_desc(desc: &ShaderDesc<'_>) -> Self {
        let stage_info = |stage: &ShaderStageDesc<'_>| ShaderStageInfo {
            uniform_block_sizes: stage.uniform_blocks.iter().map(UniformBlockDesc::size).collect(),
            image_types: stage.images.iter().map(|image| image.image_type).collect(),
        };
        Self {
            label: desc.label.as_deref().map(str::to_owned),
            stages: [stage_info(&desc.vs), stage_info(&desc.fs)],
            attrs: desc
                .attrs
                .iter()
                .map(|attr| (attr.name.to_string(), attr.format))
                .collect(),
        }
    }

    /// The interface of `stage`.
    pub fn stage(&self, stage: ShaderStage) -> &ShaderStageInfo {
        &self.stages[stage.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_size_is_furthest_uniform_end() {
        let block = UniformBlockDesc {
            uniforms: vec![
                UniformDesc::new("mvp", UniformType::Mat4, 0),
                UniformDesc {
                    array_size: 2,
                    ..UniformDesc::new("tint", UniformType::Float4, 64)
                },
                UniformDesc::new("time", UniformType::Float, 8),
            ],
        };
        assert_eq!(block.size(), 64 + 2 * 16);
    }

    #[test]
    fn test_info_collects_stage_interfaces() {
        let desc = ShaderDesc::default()
            .attr("position", VertexFormat::Float3)
            .uniform_block(
                ShaderStage::Vertex,
                UniformBlockDesc {
                    uniforms: vec![UniformDesc::new("mvp", UniformType::Mat4, 0)],
                },
            )
            .image(ShaderStage::Fragment, "tex", ImageType::Cube);

        let info = ShaderInfo::from_desc(&desc);
        assert_eq!(info.stage(ShaderStage::Vertex).uniform_block_sizes, vec![64]);
        assert!(info.stage(ShaderStage::Vertex).image_types.is_empty());
        assert_eq!(info.stage(ShaderStage::Fragment).image_types, vec![ImageType::Cube]);
        assert_eq!(info.attrs, vec![("position".to_owned(), VertexFormat::Float3)]);
    }
}
