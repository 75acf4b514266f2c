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

//! Contract violations and the policy that decides what happens to them.
//!
//! A contract violation is a programming error in the caller: calling a function
//! out of order, passing a malformed descriptor, binding a resource where the
//! pipeline or shader does not expect one. They are distinct from resources that
//! are simply not ready yet, which are dropped silently by the sequencer.

use crate::api::{
    Attachment, BufferDesc, BufferInfo, ImageContent, ImageDesc, ImageInfo, ImageType, PassDesc,
    PipelineDesc, ShaderDesc, ShaderStage, Usage, mip_chain_length,
};
use crate::handle::{Handle, ResourceKind};
use crate::limits::*;
use crate::state::ResourceState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the context does when it detects a contract violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ValidationPolicy {
    /// Log the violation at error level, then panic.
    #[default]
    Fatal,
    /// Log the violation at error level and skip the offending call.
    Log,
}

/// A broken API contract. One variant per rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    // --- Call ordering ---
    /// `begin_pass` while another pass is open.
    #[error("a pass is already in progress")]
    PassInProgress,
    /// A pass-scoped call outside of a pass.
    #[error("must be called inside a pass")]
    NoPassInProgress,
    /// `commit` while a pass is open.
    #[error("cannot commit while a pass is in progress")]
    CommitInsidePass,
    /// `draw` or `apply_uniform_block` before any draw state in the current pass.
    #[error("no draw state has been applied in the current pass")]
    NoDrawState,
    /// A pass action that both clears and loads the same attachment.
    #[error("pass action both clears and loads the {0}")]
    ConflictingPassAction(Attachment),

    // --- Draw state ---
    /// A vertex buffer in a slot the pipeline has no layout for.
    #[error("vertex buffer slot {slot} is bound but the pipeline declares no layout for it")]
    UnexpectedVertexBuffer {
        /// The offending slot.
        slot: usize,
    },
    /// An index buffer bound to a vertex slot.
    #[error("buffer in vertex buffer slot {slot} is not a vertex buffer")]
    NotAVertexBuffer {
        /// The offending slot.
        slot: usize,
    },
    /// An index buffer bound to a non-indexed pipeline.
    #[error("an index buffer is bound but the pipeline is not indexed")]
    UnexpectedIndexBuffer,
    /// A vertex buffer bound as the index buffer.
    #[error("buffer bound as index buffer is not an index buffer")]
    NotAnIndexBuffer,
    /// An image in a slot the shader stage does not declare.
    #[error("image slot {slot} of the {stage:?} stage is bound but the shader declares no image there")]
    UnexpectedImage {
        /// The stage.
        stage: ShaderStage,
        /// The offending slot.
        slot: usize,
    },
    /// An image of the wrong type.
    #[error("image slot {slot} of the {stage:?} stage expects {expected:?}, got {actual:?}")]
    ImageTypeMismatch {
        /// The stage.
        stage: ShaderStage,
        /// The offending slot.
        slot: usize,
        /// The type the shader declares.
        expected: ImageType,
        /// The type of the bound image.
        actual: ImageType,
    },

    // --- Uniforms ---
    /// A uniform block slot the shader stage does not declare.
    #[error("uniform block slot {slot} is not declared by the {stage:?} stage")]
    UnknownUniformBlock {
        /// The stage.
        stage: ShaderStage,
        /// The offending slot.
        slot: usize,
    },
    /// Uniform data whose size differs from the declared block size.
    #[error("uniform block {slot} of the {stage:?} stage is {expected} bytes, got {actual}")]
    UniformSizeMismatch {
        /// The stage.
        stage: ShaderStage,
        /// The slot.
        slot: usize,
        /// The declared block size.
        expected: usize,
        /// The size of the supplied data.
        actual: usize,
    },

    // --- Creation ---
    /// `init_*` on a handle that is not in the `Alloc` state.
    #[error("{handle:?} must be in the Alloc state to be initialised, it is {state:?}")]
    NotAllocated {
        /// The handle.
        handle: Handle,
        /// Its current state.
        state: ResourceState,
    },
    /// A buffer of size zero.
    #[error("buffer size must be greater than zero")]
    ZeroSizedBuffer,
    /// An immutable resource created without contents.
    #[error("an immutable {0} must be created with initial content")]
    ImmutableWithoutContent(ResourceKind),
    /// Initial contents larger than the buffer.
    #[error("{actual} bytes of content do not fit a buffer of {size} bytes")]
    ContentTooLarge {
        /// The buffer size.
        size: usize,
        /// The content size.
        actual: usize,
    },
    /// An image with a zero dimension.
    #[error("image dimensions {width}x{height}x{depth} must be non-zero")]
    ZeroSizedImage {
        /// The width.
        width: u32,
        /// The height.
        height: u32,
        /// The depth or layer count.
        depth: u32,
    },
    /// A cube map whose faces are not square.
    #[error("cube map faces must be square, got {width}x{height}")]
    CubeNotSquare {
        /// The width.
        width: u32,
        /// The height.
        height: u32,
    },
    /// A mipmap count of zero or beyond the image's chain length.
    #[error("{requested} mipmaps requested, the image supports 1..={max}")]
    InvalidMipmapCount {
        /// The requested count.
        requested: u32,
        /// The chain length.
        max: u32,
    },
    /// A sample count that is not a power of two in `1..=16`.
    #[error("sample count {0} is not a power of two between 1 and 16")]
    InvalidSampleCount(u32),
    /// A render target with more than one mip level.
    #[error("render targets cannot have mipmaps")]
    RenderTargetWithMipmaps,
    /// A render target created with contents.
    #[error("render targets cannot be created with initial content")]
    RenderTargetWithContent,
    /// A render target with non-immutable usage.
    #[error("render targets must use immutable usage")]
    RenderTargetNotImmutable,
    /// A multisampled image that is not a render target.
    #[error("only render targets can be multisampled")]
    MultisampledTexture,
    /// A depth format on an image that is not a render target.
    #[error("depth formats are only valid for render targets")]
    DepthTexture,
    /// Too many uniform blocks on a stage.
    #[error("the {stage:?} stage declares {count} uniform blocks, the maximum is {max}", max = MAX_SHADERSTAGE_UBS)]
    TooManyUniformBlocks {
        /// The stage.
        stage: ShaderStage,
        /// The declared count.
        count: usize,
    },
    /// A uniform block with no uniforms, or more than the maximum.
    #[error("uniform block {slot} of the {stage:?} stage declares {count} uniforms, expected 1..={max}", max = MAX_UNIFORMS)]
    InvalidUniformCount {
        /// The stage.
        stage: ShaderStage,
        /// The block slot.
        slot: usize,
        /// The declared count.
        count: usize,
    },
    /// Too many images on a stage.
    #[error("the {stage:?} stage declares {count} images, the maximum is {max}", max = MAX_SHADERSTAGE_IMAGES)]
    TooManyImages {
        /// The stage.
        stage: ShaderStage,
        /// The declared count.
        count: usize,
    },
    /// Too many vertex attributes.
    #[error("{count} vertex attributes declared, the maximum is {max}", max = MAX_VERTEX_ATTRIBUTES)]
    TooManyAttributes {
        /// The declared count.
        count: usize,
    },
    /// A pipeline without a shader.
    #[error("a pipeline needs a shader")]
    MissingShader,
    /// A vertex layout that never advances.
    #[error("vertex layout {slot} has a step rate of 0")]
    ZeroStepRate {
        /// The layout slot.
        slot: usize,
    },
    /// A pass with no color attachment or too many.
    #[error("a pass needs 1..={max} color attachments, got {0}", max = MAX_COLOR_ATTACHMENTS)]
    ColorAttachmentCount(usize),
    /// An attachment image that is not a render target.
    #[error("the image of the {0} is not a render target")]
    NotARenderTarget(Attachment),
    /// An attachment whose mip level or slice does not exist.
    #[error("the {0} references a mip level or slice the image does not have")]
    AttachmentOutOfRange(Attachment),
    /// Attachments of different sizes.
    #[error("the {0} does not match the size of color attachment 0")]
    AttachmentSizeMismatch(Attachment),
    /// A color attachment with a depth format, or a depth attachment without one.
    #[error("the {0} has an incompatible pixel format")]
    AttachmentFormatMismatch(Attachment),

    // --- Updates ---
    /// Updating an immutable resource.
    #[error("cannot update an immutable {0}")]
    UpdateImmutable(ResourceKind),
    /// Updating a resource twice within one frame.
    #[error("{0} updated more than once in the same frame")]
    UpdatedTwicePerFrame(ResourceKind),
    /// Update data larger than the resource.
    #[error("{actual} bytes of update data exceed the {kind} size of {size} bytes")]
    UpdateTooLarge {
        /// The resource kind.
        kind: ResourceKind,
        /// The resource size.
        size: usize,
        /// The size of the supplied data.
        actual: usize,
    },
    /// Image data addressing a face or mip level the image does not have.
    #[error("subimage face {face}, mip level {mip_level} is out of range")]
    SubImageOutOfRange {
        /// The face.
        face: u32,
        /// The mip level.
        mip_level: u32,
    },
}

/// Routes contract violations according to a [`ValidationPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Validator {
    policy: ValidationPolicy,
}

impl Validator {
    pub(crate) fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub(crate) fn policy(self) -> ValidationPolicy {
        self.policy
    }

    /// Reports a violation detected in `operation`.
    ///
    /// Only returns under [`ValidationPolicy::Log`].
    pub(crate) fn report(self, operation: &str, error: ValidationError) {
        log::error!("{operation}: {error}");
        if self.policy == ValidationPolicy::Fatal {
            panic!("{operation}: {error}");
        }
    }

    /// Reports `result` if it is an error. Returns `true` when the call may proceed.
    pub(crate) fn check(self, operation: &str, result: Result<(), ValidationError>) -> bool {
        match result {
            Ok(()) => true,
            Err(error) => {
                self.report(operation, error);
                false
            }
        }
    }
}

/// Returns `true` if `count` is a power of two in `1..=16`.
pub(crate) fn is_valid_sample_count(count: u32) -> bool {
    count.is_power_of_two() && count <= 16
}

pub(crate) fn validate_buffer_desc(desc: &BufferDesc<'_>) -> Result<(), ValidationError> {
    if desc.size == 0 {
        return Err(ValidationError::ZeroSizedBuffer);
    }
    match &desc.content {
        None if desc.usage == Usage::Immutable => Err(ValidationError::ImmutableWithoutContent(
            ResourceKind::Buffer,
        )),
        Some(content) if content.len() > desc.size => Err(ValidationError::ContentTooLarge {
            size: desc.size,
            actual: content.len(),
        }),
        _ => Ok(()),
    }
}

pub(crate) fn validate_image_desc(desc: &ImageDesc<'_>) -> Result<(), ValidationError> {
    let depth = match desc.image_type {
        ImageType::D3 | ImageType::Array => desc.depth_or_layers,
        ImageType::D2 | ImageType::Cube => 1,
    };
    if desc.width == 0 || desc.height == 0 || depth == 0 {
        return Err(ValidationError::ZeroSizedImage {
            width: desc.width,
            height: desc.height,
            depth,
        });
    }
    if desc.image_type == ImageType::Cube && desc.width != desc.height {
        return Err(ValidationError::CubeNotSquare {
            width: desc.width,
            height: desc.height,
        });
    }
    let largest = match desc.image_type {
        ImageType::D3 => desc.width.max(desc.height).max(depth),
        _ => desc.width.max(desc.height),
    };
    let max = mip_chain_length(largest);
    if desc.num_mipmaps == 0 || desc.num_mipmaps > max {
        return Err(ValidationError::InvalidMipmapCount {
            requested: desc.num_mipmaps,
            max,
        });
    }
    if !is_valid_sample_count(desc.sample_count) {
        return Err(ValidationError::InvalidSampleCount(desc.sample_count));
    }

    if desc.render_target {
        if desc.num_mipmaps > 1 {
            return Err(ValidationError::RenderTargetWithMipmaps);
        }
        if desc.content.is_some() {
            return Err(ValidationError::RenderTargetWithContent);
        }
        if desc.usage != Usage::Immutable {
            return Err(ValidationError::RenderTargetNotImmutable);
        }
        return Ok(());
    }

    if desc.sample_count > 1 {
        return Err(ValidationError::MultisampledTexture);
    }
    if desc.pixel_format.is_depth() {
        return Err(ValidationError::DepthTexture);
    }
    match &desc.content {
        None if desc.usage == Usage::Immutable => Err(ValidationError::ImmutableWithoutContent(
            ResourceKind::Image,
        )),
        None => Ok(()),
        Some(content) => validate_image_content(&ImageInfo::from_desc(desc), content),
    }
}

/// Checks that every subimage addresses an existing face and mip level and fits it.
pub(crate) fn validate_image_content(
    info: &ImageInfo,
    content: &ImageContent<'_>,
) -> Result<(), ValidationError> {
    for subimage in &content.subimages {
        if subimage.face >= info.num_faces() || subimage.mip_level >= info.num_mipmaps {
            return Err(ValidationError::SubImageOutOfRange {
                face: subimage.face,
                mip_level: subimage.mip_level,
            });
        }
        if let Some(size) = info.subimage_size(subimage.mip_level) {
            if subimage.data.len() > size {
                return Err(ValidationError::UpdateTooLarge {
                    kind: ResourceKind::Image,
                    size,
                    actual: subimage.data.len(),
                });
            }
        }
    }
    Ok(())
}

pub(crate) fn validate_shader_desc(desc: &ShaderDesc<'_>) -> Result<(), ValidationError> {
    for stage in ShaderStage::ALL {
        let stage_desc = desc.stage(stage);
        let count = stage_desc.uniform_blocks.len();
        if count > MAX_SHADERSTAGE_UBS {
            return Err(ValidationError::TooManyUniformBlocks { stage, count });
        }
        for (slot, block) in stage_desc.uniform_blocks.iter().enumerate() {
            let count = block.uniforms.len();
            if count == 0 || count > MAX_UNIFORMS {
                return Err(ValidationError::InvalidUniformCount { stage, slot, count });
            }
        }
        let count = stage_desc.images.len();
        if count > MAX_SHADERSTAGE_IMAGES {
            return Err(ValidationError::TooManyImages { stage, count });
        }
    }
    if desc.attrs.len() > MAX_VERTEX_ATTRIBUTES {
        return Err(ValidationError::TooManyAttributes {
            count: desc.attrs.len(),
        });
    }
    Ok(())
}

pub(crate) fn validate_pipeline_desc(desc: &PipelineDesc<'_>) -> Result<(), ValidationError> {
    if desc.shader.is_invalid() {
        return Err(ValidationError::MissingShader);
    }
    let count: usize = desc.layouts.iter().map(|layout| layout.attrs.len()).sum();
    if count > MAX_VERTEX_ATTRIBUTES {
        return Err(ValidationError::TooManyAttributes { count });
    }
    match desc.layouts.iter().position(|layout| layout.step_rate == 0) {
        Some(slot) => Err(ValidationError::ZeroStepRate { slot }),
        None => Ok(()),
    }
}

/// Structural checks that do not need the attached images.
pub(crate) fn validate_pass_desc(desc: &PassDesc<'_>) -> Result<(), ValidationError> {
    let count = desc.color_attachments.len();
    if count == 0 || count > MAX_COLOR_ATTACHMENTS {
        return Err(ValidationError::ColorAttachmentCount(count));
    }
    Ok(())
}

/// Checks one resolved attachment image. `width`/`height` are the extent of color
/// attachment 0, `None` while checking color attachment 0 itself.
pub(crate) fn validate_attachment(
    attachment: Attachment,
    image: &ImageInfo,
    mip_level: u32,
    slice: u32,
    extent: Option<(u32, u32)>,
) -> Result<(), ValidationError> {
    if !image.render_target {
        return Err(ValidationError::NotARenderTarget(attachment));
    }
    let slices = image.num_faces().max(image.mip_slices(mip_level));
    if mip_level >= image.num_mipmaps || slice >= slices {
        return Err(ValidationError::AttachmentOutOfRange(attachment));
    }
    let is_depth_slot = attachment == Attachment::Depth;
    if image.pixel_format.is_depth() != is_depth_slot {
        return Err(ValidationError::AttachmentFormatMismatch(attachment));
    }
    match extent {
        Some(extent) if image.mip_extent(mip_level) != extent => {
            Err(ValidationError::AttachmentSizeMismatch(attachment))
        }
        _ => Ok(()),
    }
}

pub(crate) fn validate_buffer_update(
    info: &BufferInfo,
    len: usize,
    frame: u64,
) -> Result<(), ValidationError> {
    if info.usage == Usage::Immutable {
        return Err(ValidationError::UpdateImmutable(ResourceKind::Buffer));
    }
    if info.last_update_frame == Some(frame) {
        return Err(ValidationError::UpdatedTwicePerFrame(ResourceKind::Buffer));
    }
    if len > info.size {
        return Err(ValidationError::UpdateTooLarge {
            kind: ResourceKind::Buffer,
            size: info.size,
            actual: len,
        });
    }
    Ok(())
}

pub(crate) fn validate_image_update(
    info: &ImageInfo,
    content: &ImageContent<'_>,
    frame: u64,
) -> Result<(), ValidationError> {
    if info.usage == Usage::Immutable {
        return Err(ValidationError::UpdateImmutable(ResourceKind::Image));
    }
    if info.last_update_frame == Some(frame) {
        return Err(ValidationError::UpdatedTwicePerFrame(ResourceKind::Image));
    }
    validate_image_content(info, content)
}
