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

//! Defines the fixed-function and vertex-input state baked into a pipeline.

use crate::handle::ShaderId;
use crate::limits::MAX_SHADERSTAGE_BUFFERS;
use bitflags::bitflags;
use std::borrow::Cow;

/// The format of a single vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexFormat {
    /// One `f32`.
    #[default]
    Float,
    /// Two `f32`s.
    Float2,
    /// Three `f32`s.
    Float3,
    /// Four `f32`s.
    Float4,
    /// Four `i8`s.
    Byte4,
    /// Four `i8`s, normalized to `[-1, 1]`.
    Byte4N,
    /// Four `u8`s.
    UByte4,
    /// Four `u8`s, normalized to `[0, 1]`.
    UByte4N,
    /// Two `i16`s.
    Short2,
    /// Two `i16`s, normalized.
    Short2N,
    /// Four `i16`s.
    Short4,
    /// Four `i16`s, normalized.
    Short4N,
    /// Packed 10/10/10/2 normalized.
    UInt10N2,
}

impl VertexFormat {
    /// Size of the attribute in bytes.
    pub const fn size(self) -> usize {
        use VertexFormat::*;
        match self {
            Float => 4,
            Float2 => 8,
            Float3 => 12,
            Float4 => 16,
            Byte4 | Byte4N | UByte4 | UByte4N | Short2 | Short2N | UInt10N2 => 4,
            Short4 | Short4N => 8,
        }
    }
}

/// How often a vertex buffer advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StepFunction {
    /// Once per vertex.
    #[default]
    PerVertex,
    /// Once per `step_rate` instances.
    PerInstance,
}

/// A named vertex attribute inside a layout.
#[derive(Debug, Clone)]
pub struct VertexAttrDesc<'a> {
    /// The attribute's name in the vertex shader.
    pub name: Cow<'a, str>,
    /// The attribute format.
    pub format: VertexFormat,
}

/// The layout of one vertex buffer slot. Attributes are tightly packed in order.
#[derive(Debug, Clone)]
pub struct VertexLayoutDesc<'a> {
    /// The attributes, in memory order.
    pub attrs: Vec<VertexAttrDesc<'a>>,
    /// Per-vertex or per-instance stepping.
    pub step_func: StepFunction,
    /// Instances per step for per-instance layouts. Must be at least 1.
    pub step_rate: u32,
}

impl Default for VertexLayoutDesc<'_> {
    fn default() -> Self {
        Self {
            attrs: Vec::new(),
            step_func: StepFunction::PerVertex,
            step_rate: 1,
        }
    }
}

impl VertexLayoutDesc<'_> {
    /// Byte distance between consecutive vertices.
    pub fn stride(&self) -> usize {
        self.attrs.iter().map(|attr| attr.format.size()).sum()
    }
}

/// The integer type of an index buffer, or no index buffer at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexType {
    /// Non-indexed drawing.
    #[default]
    None,
    /// 16-bit indices.
    Uint16,
    /// 32-bit indices.
    Uint32,
}

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveType {
    /// Isolated points.
    Points,
    /// Isolated line segments.
    Lines,
    /// A connected line strip.
    LineStrip,
    /// Isolated triangles.
    #[default]
    Triangles,
    /// A connected triangle strip.
    TriangleStrip,
}

/// A comparison used by depth and stencil tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunc {
    /// Never passes.
    Never,
    /// Passes if the new value is less.
    Less,
    /// Passes if the values are equal.
    Equal,
    /// Passes if the new value is less or equal.
    LessEqual,
    /// Passes if the new value is greater.
    Greater,
    /// Passes if the values differ.
    NotEqual,
    /// Passes if the new value is greater or equal.
    GreaterEqual,
    /// Always passes.
    #[default]
    Always,
}

/// An operation applied to the stencil buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOp {
    /// Keep the current value.
    #[default]
    Keep,
    /// Set the value to 0.
    Zero,
    /// Replace with the reference value.
    Replace,
    /// Increment, clamping at the maximum.
    IncrClamp,
    /// Decrement, clamping at 0.
    DecrClamp,
    /// Bitwise invert.
    Invert,
    /// Increment, wrapping to 0.
    IncrWrap,
    /// Decrement, wrapping to the maximum.
    DecrWrap,
}

/// Stencil operations for one face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StencilState {
    /// Applied when the stencil test fails.
    pub fail_op: StencilOp,
    /// Applied when the stencil test passes and the depth test fails.
    pub depth_fail_op: StencilOp,
    /// Applied when both tests pass.
    pub pass_op: StencilOp,
    /// The stencil comparison.
    pub compare_func: CompareFunc,
}

/// Depth and stencil testing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilState {
    /// Stencil state of front faces.
    pub stencil_front: StencilState,
    /// Stencil state of back faces.
    pub stencil_back: StencilState,
    /// The depth comparison.
    pub depth_compare_func: CompareFunc,
    /// Whether depth values are written.
    pub depth_write_enabled: bool,
    /// Whether the stencil test runs.
    pub stencil_enabled: bool,
    /// Mask applied when reading the stencil buffer.
    pub stencil_read_mask: u8,
    /// Mask applied when writing the stencil buffer.
    pub stencil_write_mask: u8,
    /// The stencil reference value.
    pub stencil_ref: u8,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            stencil_front: StencilState::default(),
            stencil_back: StencilState::default(),
            depth_compare_func: CompareFunc::Always,
            depth_write_enabled: false,
            stencil_enabled: false,
            stencil_read_mask: 0xFF,
            stencil_write_mask: 0xFF,
            stencil_ref: 0,
        }
    }
}

/// A blend factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
    SrcAlphaSaturated,
    BlendColor,
    OneMinusBlendColor,
    BlendAlpha,
    OneMinusBlendAlpha,
}

/// How source and destination terms are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOp {
    /// `src + dst`.
    #[default]
    Add,
    /// `src - dst`.
    Subtract,
    /// `dst - src`.
    ReverseSubtract,
}

bitflags! {
    /// Which color channels are written.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorMask: u8 {
        /// Red.
        const R = 1 << 0;
        /// Green.
        const G = 1 << 1;
        /// Blue.
        const B = 1 << 2;
        /// Alpha.
        const A = 1 << 3;
        /// Every channel.
        const RGBA = Self::R.bits() | Self::G.bits() | Self::B.bits() | Self::A.bits();
    }
}

impl Default for ColorMask {
    fn default() -> Self {
        ColorMask::RGBA
    }
}

/// Color blending state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendState {
    /// Whether blending is enabled.
    pub enabled: bool,
    /// Source factor for RGB.
    pub src_factor_rgb: BlendFactor,
    /// Destination factor for RGB.
    pub dst_factor_rgb: BlendFactor,
    /// Operation for RGB.
    pub op_rgb: BlendOp,
    /// Source factor for alpha.
    pub src_factor_alpha: BlendFactor,
    /// Destination factor for alpha.
    pub dst_factor_alpha: BlendFactor,
    /// Operation for alpha.
    pub op_alpha: BlendOp,
    /// Channels written to the color attachments.
    pub color_write_mask: ColorMask,
    /// The constant used by the `BlendColor` factors.
    pub blend_color: [f32; 4],
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            enabled: false,
            src_factor_rgb: BlendFactor::One,
            dst_factor_rgb: BlendFactor::Zero,
            op_rgb: BlendOp::Add,
            src_factor_alpha: BlendFactor::One,
            dst_factor_alpha: BlendFactor::Zero,
            op_alpha: BlendOp::Add,
            color_write_mask: ColorMask::RGBA,
            blend_color: [1.0; 4],
        }
    }
}

/// A triangle face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Face {
    /// Front facing triangles.
    Front,
    /// Back facing triangles.
    #[default]
    Back,
    /// Both.
    Both,
}

/// Rasterizer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterizerState {
    /// Whether face culling is enabled.
    pub cull_face_enabled: bool,
    /// Whether the scissor test is enabled.
    pub scissor_test_enabled: bool,
    /// Whether dithering is enabled.
    pub dither_enabled: bool,
    /// Whether alpha-to-coverage is enabled.
    pub alpha_to_coverage_enabled: bool,
    /// The face that is culled when culling is enabled.
    pub cull_face: Face,
}

impl Default for RasterizerState {
    fn default() -> Self {
        Self {
            cull_face_enabled: false,
            scissor_test_enabled: false,
            dither_enabled: true,
            alpha_to_coverage_enabled: false,
            cull_face: Face::Back,
        }
    }
}

/// A descriptor used to create a pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineDesc<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The shader the pipeline runs. Must be `Valid` when the pipeline is initialised.
    pub shader: ShaderId,
    /// Vertex layouts, indexed by vertex buffer slot. A layout without attributes
    /// marks an unused slot.
    pub layouts: [VertexLayoutDesc<'a>; MAX_SHADERSTAGE_BUFFERS],
    /// The index type, [`IndexType::None`] for non-indexed drawing.
    pub index_type: IndexType,
    /// The primitive topology.
    pub primitive_type: PrimitiveType,
    /// Depth and stencil state.
    pub depth_stencil: DepthStencilState,
    /// Blend state.
    pub blend: BlendState,
    /// Rasterizer state.
    pub rasterizer: RasterizerState,
}

impl<'a> PipelineDesc<'a> {
    /// A pipeline with default state running `shader`.
    pub fn new(shader: ShaderId) -> Self {
        Self {
            shader,
            ..Default::default()
        }
    }

    /// Appends an attribute to the layout of vertex buffer `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not below [`MAX_SHADERSTAGE_BUFFERS`].
    pub fn attr(mut self, slot: usize, name: impl Into<Cow<'a, str>>, format: VertexFormat) -> Self {
        assert!(
            slot < MAX_SHADERSTAGE_BUFFERS,
            "vertex buffer slot {slot} out of range"
        );
        self.layouts[slot].attrs.push(VertexAttrDesc {
            name: name.into(),
            format,
        });
        self
    }

    /// Makes vertex buffer `slot` advance once every `step_rate` instances.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not below [`MAX_SHADERSTAGE_BUFFERS`].
    pub fn per_instance(mut self, slot: usize, step_rate: u32) -> Self {
        assert!(
            slot < MAX_SHADERSTAGE_BUFFERS,
            "vertex buffer slot {slot} out of range"
        );
        self.layouts[slot].step_func = StepFunction::PerInstance;
        self.layouts[slot].step_rate = step_rate;
        self
    }

    /// Sets the index type.
    pub fn with_index_type(mut self, index_type: IndexType) -> Self {
        self.index_type = index_type;
        self
    }

    /// Attaches a debug label.
    pub fn with_label(mut self, label: impl Into<Cow<'a, str>>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// What the core remembers about one vertex buffer slot of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VertexLayoutInfo {
    /// Attribute formats in memory order. Empty for unused slots.
    pub formats: Vec<VertexFormat>,
    /// Byte distance between consecutive vertices.
    pub stride: usize,
    /// Per-vertex or per-instance stepping.
    pub step_func: StepFunction,
    /// Instances per step.
    pub step_rate: u32,
}

impl VertexLayoutInfo {
    /// Returns `true` if the pipeline reads from this slot.
    pub fn is_used(&self) -> bool {
        !self.formats.is_empty()
    }
}

/// What the core remembers about a live pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineInfo {
    /// The debug label, if any.
    pub label: Option<String>,
    /// The shader the pipeline runs.
    pub shader: ShaderId,
    /// Vertex layouts, indexed by vertex buffer slot.
    pub layouts: [VertexLayoutInfo; MAX_SHADERSTAGE_BUFFERS],
    /// The index type.
    pub index_type: IndexType,
    /// The primitive topology.
    pub primitive_type: PrimitiveType,
    /// Depth and stencil state.
    pub depth_stencil: DepthStencilState,
    /// Blend state.
    pub blend: BlendState,
    /// Rasterizer state.
    pub rasterizer: RasterizerState,
}

impl PipelineInfo {
    pub(crate) fn from_desc(desc: &PipelineDesc<'_>) -> Self {
        Self {
            label: desc.label.as_deref().map(str::to_owned),
            shader: desc.shader,
            layouts: std::array::from_fn(|slot| {
                let layout = &desc.layouts[slot];
                VertexLayoutInfo {
                    formats: layout.attrs.iter().map(|attr| attr.format).collect(),
                    stride: layout.stride(),
                    step_func: layout.step_func,
                    step_rate: layout.step_rate,
                }
            }),
            index_type: desc.index_type,
            primitive_type: desc.primitive_type,
            depth_stencil: desc.depth_stencil,
            blend: desc.blend,
            rasterizer: desc.rasterizer,
        }
    }
}
