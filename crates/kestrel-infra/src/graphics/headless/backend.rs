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


//! The headless [`GraphicsBackend`] implementation.

use super::cache::{BindingCache, HeadlessStats};
use super::command::Command;
use kestrel_core::{
    BackendError, BufferDesc, BufferId, Features, GraphicsBackend, ImageContent, ImageDesc,
    ImageId, ImageInfo, ImageType, PassAction, PassId, PassInfo, PassTarget, PipelineDesc,
    PipelineId, Rect, ResolvedBindings, ShaderDesc, ShaderId, ShaderInfo, ShaderStage,
    VertexFormat,
};
use std::collections::HashMap;

#[derive(Debug)]
struct BufferEntry {
    data: Vec<u8>,
}

#[derive(Debug)]
struct ImageEntry {
    info: ImageInfo,
    size: usize, // Tracked for the memory budget on destruction.
    subimages: HashMap<(u32, u32), Vec<u8>>,
}

#[derive(Debug)]
struct ShaderEntry {
    label: Option<String>,
}

#[derive(Debug)]
struct PipelineEntry {
    shader: ShaderId,
}

#[derive(Debug)]
struct PassEntry {
    info: PassInfo,
}

/// A [`GraphicsBackend`] that keeps every resource in CPU memory.
///
/// Resource contents can be read back, every pass-scoped call is recorded as a
/// [`Command`] and native bind traffic is tracked through [`HeadlessStats`].
#[derive(Debug)]
pub struct HeadlessBackend {
    features: Features,
    memory_budget: Option<usize>,
    memory_used: usize,
    buffers: HashMap<BufferId, BufferEntry>,
    images: HashMap<ImageId, ImageEntry>,
    shaders: HashMap<ShaderId, ShaderEntry>,
    pipelines: HashMap<PipelineId, PipelineEntry>,
    passes: HashMap<PassId, PassEntry>,
    cache: BindingCache,
    stats: HeadlessStats,
    in_pass: bool,
    frames_committed: u64,
    commands: Vec<Command>,
    discarded: bool,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    /// What a desktop GL 3.3 class device offers.
    pub const DEFAULT_FEATURES: Features = Features::TEXTURE_FLOAT
        .union(Features::TEXTURE_HALF_FLOAT)
        .union(Features::ORIGIN_BOTTOM_LEFT)
        .union(Features::MSAA_RENDER_TARGETS)
        .union(Features::MULTIPLE_RENDER_TARGET)
        .union(Features::TEXTURE_3D)
        .union(Features::TEXTURE_ARRAY);

    /// A backend advertising [`Self::DEFAULT_FEATURES`] without a memory budget.
    pub fn new() -> Self {
        Self::with_features(Self::DEFAULT_FEATURES)
    }

    /// A backend advertising exactly `features`.
    pub fn with_features(features: Features) -> Self {
        Self {
            features,
            memory_budget: None,
            memory_used: 0,
            buffers: HashMap::new(),
            images: HashMap::new(),
            shaders: HashMap::new(),
            pipelines: HashMap::new(),
            passes: HashMap::new(),
            cache: BindingCache::default(),
            stats: HeadlessStats::default(),
            in_pass: false,
            frames_committed: 0,
            commands: Vec::new(),
            discarded: false,
        }
    }

    /// Limits the bytes buffers and images may occupy. Creations beyond it fail with
    /// [`BackendError::OutOfMemory`].
    pub fn with_memory_budget(mut self, bytes: usize) -> Self {
        self.memory_budget = Some(bytes);
        self
    }

    /// Every command recorded since the last [`Self::take_commands`].
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Returns and clears the recorded commands.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// The contents of a live buffer.
    pub fn buffer_contents(&self, id: BufferId) -> Option<&[u8]> {
        self.buffers.get(&id).map(|entry| entry.data.as_slice())
    }

    /// The contents of one face and mip level of a live image, if any were uploaded.
    pub fn image_contents(&self, id: ImageId, face: u32, mip_level: u32) -> Option<&[u8]> {
        self.images
            .get(&id)?
            .subimages
            .get(&(face, mip_level))
            .map(Vec::as_slice)
    }

    /// The metadata of a live image.
    pub fn image_info(&self, id: ImageId) -> Option<&ImageInfo> {
        self.images.get(&id).map(|entry| &entry.info)
    }

    /// The metadata of a live pass.
    pub fn pass_info(&self, id: PassId) -> Option<&PassInfo> {
        self.passes.get(&id).map(|entry| &entry.info)
    }

    /// The label of a live shader.
    pub fn shader_label(&self, id: ShaderId) -> Option<&str> {
        self.shaders.get(&id)?.label.as_deref()
    }

    /// The shader a live pipeline was created with.
    pub fn pipeline_shader(&self, id: PipelineId) -> Option<ShaderId> {
        self.pipelines.get(&id).map(|entry| entry.shader)
    }

    /// Bytes currently occupied by buffers and images.
    pub fn memory_used(&self) -> usize {
        self.memory_used
    }

    /// Number of native objects currently alive.
    pub fn live_resources(&self) -> usize {
        self.buffers.len()
            + self.images.len()
            + self.shaders.len()
            + self.pipelines.len()
            + self.passes.len()
    }

    /// Number of frames committed so far.
    pub fn frames_committed(&self) -> u64 {
        self.frames_committed
    }

    /// Native bind and draw traffic so far.
    pub fn stats(&self) -> &HeadlessStats {
        &self.stats
    }

    /// The pipeline bound last, if the binding cache holds one.
    pub fn bound_pipeline(&self) -> Option<PipelineId> {
        self.cache.pipeline()
    }

    /// Returns `true` once [`GraphicsBackend::discard`] ran.
    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    fn reserve(&mut self, bytes: usize) -> Result<(), BackendError> {
        if let Some(budget) = self.memory_budget {
            let available = budget.saturating_sub(self.memory_used);
            if bytes > available {
                return Err(BackendError::OutOfMemory {
                    requested: bytes,
                    available,
                });
            }
        }
        self.memory_used += bytes;
        Ok(())
    }

    fn release(&mut self, bytes: usize) {
        self.memory_used = self.memory_used.saturating_sub(bytes);
    }

    fn require(&self, feature: Features, what: &str) -> Result<(), BackendError> {
        if self.features.contains(feature) {
            Ok(())
        } else {
            Err(BackendError::FeatureNotSupported(what.to_owned()))
        }
    }

    fn write_subimages(entry: &mut ImageEntry, content: &ImageContent<'_>) {
        for subimage in &content.subimages {
            entry
                .subimages
                .insert((subimage.face, subimage.mip_level), subimage.data.to_vec());
        }
    }
}

/// Bytes an image occupies across every face, slice, mip level and sample.
fn image_footprint(info: &ImageInfo) -> usize {
    // Compressed formats are counted at one byte per texel.
    let bytes_per_pixel = info.pixel_format.bytes_per_pixel().unwrap_or(1);
    let texels: usize = (0..info.num_mipmaps)
        .map(|mip| {
            let (width, height) = info.mip_extent(mip);
            width as usize * height as usize * info.mip_slices(mip) as usize
        })
        .sum();
    texels * bytes_per_pixel * info.num_faces() as usize * info.sample_count as usize
}

impl GraphicsBackend for HeadlessBackend {
    fn name(&self) -> &str {
        "headless"
    }

    fn features(&self) -> Features {
        self.features
    }

    fn create_buffer(&mut self, id: BufferId, desc: &BufferDesc<'_>) -> Result<(), BackendError> {
        self.reserve(desc.size)?;
        let mut data = vec![0; desc.size];
        if let Some(content) = &desc.content {
            data[..content.len()].copy_from_slice(content);
        }
        self.buffers.insert(id, BufferEntry { data });
        log::debug!("HeadlessBackend: created {id:?} ({} bytes)", desc.size);
        Ok(())
    }

    fn update_buffer(&mut self, id: BufferId, data: &[u8]) -> Result<(), BackendError> {
        let entry = self
            .buffers
            .get_mut(&id)
            .ok_or(BackendError::UnknownResource(id.handle()))?;
        entry.data[..data.len()].copy_from_slice(data);
        Ok(())
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        if let Some(entry) = self.buffers.remove(&id) {
            self.release(entry.data.len());
            log::debug!("HeadlessBackend: destroyed {id:?}");
        }
    }

    fn create_image(&mut self, id: ImageId, desc: &ImageDesc<'_>) -> Result<(), BackendError> {
        if let Some(feature) = desc.pixel_format.required_feature() {
            if !self.features.contains(feature) {
                return Err(BackendError::UnsupportedFormat(desc.pixel_format));
            }
        }
        let type_feature = match desc.image_type {
            ImageType::D3 => Some(Features::TEXTURE_3D),
            ImageType::Array => Some(Features::TEXTURE_ARRAY),
            ImageType::D2 | ImageType::Cube => None,
        };
        if let Some(feature) = type_feature {
            if !self.features.contains(feature) {
                return Err(BackendError::UnsupportedImageType(desc.image_type));
            }
        }
        if desc.render_target && desc.sample_count > 1 {
            self.require(Features::MSAA_RENDER_TARGETS, "multisampled render targets")?;
        }

        let info = ImageInfo::from_desc(desc);
        let size = image_footprint(&info);
        self.reserve(size)?;
        let mut entry = ImageEntry {
            info,
            size,
            subimages: HashMap::new(),
        };
        if let Some(content) = &desc.content {
            Self::write_subimages(&mut entry, content);
        }
        self.images.insert(id, entry);
        log::debug!(
            "HeadlessBackend: created {id:?} ({}x{} {:?}, {size} bytes)",
            desc.width,
            desc.height,
            desc.pixel_format
        );
        Ok(())
    }

    fn update_image(&mut self, id: ImageId, content: &ImageContent<'_>) -> Result<(), BackendError> {
        let entry = self
            .images
            .get_mut(&id)
            .ok_or(BackendError::UnknownResource(id.handle()))?;
        Self::write_subimages(entry, content);
        Ok(())
    }

    fn destroy_image(&mut self, id: ImageId) {
        if let Some(entry) = self.images.remove(&id) {
            self.release(entry.size);
            log::debug!("HeadlessBackend: destroyed {id:?}");
        }
    }

    fn create_shader(&mut self, id: ShaderId, desc: &ShaderDesc<'_>) -> Result<(), BackendError> {
        let label = desc.label.as_deref().map(str::to_owned);
        self.shaders.insert(id, ShaderEntry { label });
        log::debug!("HeadlessBackend: created {id:?}");
        Ok(())
    }

    fn destroy_shader(&mut self, id: ShaderId) {
        if self.shaders.remove(&id).is_some() {
            log::debug!("HeadlessBackend: destroyed {id:?}");
        }
    }

    fn create_pipeline(
        &mut self,
        id: PipelineId,
        desc: &PipelineDesc<'_>,
        shader: &ShaderInfo,
    ) -> Result<(), BackendError> {
        let packed = desc
            .layouts
            .iter()
            .flat_map(|layout| &layout.attrs)
            .any(|attr| attr.format == VertexFormat::UInt10N2);
        if packed {
            self.require(Features::PACKED_VERTEX_FORMAT_10_2, "packed 10:2 vertex format")?;
        }
        let declared: usize = desc.layouts.iter().map(|layout| layout.attrs.len()).sum();
        if declared != shader.attrs.len() {
            log::warn!(
                "HeadlessBackend: {id:?} declares {declared} vertex attributes, the shader \
                 expects {}",
                shader.attrs.len()
            );
        }
        self.pipelines.insert(
            id,
            PipelineEntry {
                shader: desc.shader,
            },
        );
        log::debug!("HeadlessBackend: created {id:?}");
        Ok(())
    }

    fn destroy_pipeline(&mut self, id: PipelineId) {
        if self.pipelines.remove(&id).is_some() {
            log::debug!("HeadlessBackend: destroyed {id:?}");
        }
    }

    fn create_pass(
        &mut self,
        id: PassId,
        info: &PassInfo,
        attachments: &[&ImageInfo],
    ) -> Result<(), BackendError> {
        if info.color_attachments.len() > 1 {
            self.require(Features::MULTIPLE_RENDER_TARGET, "multiple render targets")?;
        }
        if attachments.iter().any(|image| !image.render_target) {
            return Err(BackendError::CreationFailed(
                "pass attachment is not a render target".to_owned(),
            ));
        }
        self.passes.insert(id, PassEntry { info: info.clone() });
        log::debug!(
            "HeadlessBackend: created {id:?} ({}x{}, {} attachments)",
            info.width,
            info.height,
            attachments.len()
        );
        Ok(())
    }

    fn destroy_pass(&mut self, id: PassId) {
        if self.passes.remove(&id).is_some() {
            log::debug!("HeadlessBackend: destroyed {id:?}");
        }
    }

    fn begin_pass(&mut self, target: PassTarget<'_>, action: &PassAction) {
        let (width, height) = target.extent();
        let pass = match target {
            PassTarget::Default { .. } => None,
            PassTarget::Offscreen { id, .. } => Some(id),
        };
        self.in_pass = true;
        // A native pass starts without any bound state.
        self.cache.reset();
        self.commands.push(Command::BeginPass {
            pass,
            width,
            height,
            action: *action,
        });
    }

    fn apply_viewport(&mut self, rect: Rect) {
        self.commands.push(Command::Viewport(rect));
    }

    fn apply_scissor_rect(&mut self, rect: Rect) {
        self.commands.push(Command::Scissor(rect));
    }

    fn apply_bindings(&mut self, bindings: &ResolvedBindings) {
        self.cache.apply(bindings, &mut self.stats);
        self.commands.push(Command::ApplyBindings(*bindings));
    }

    fn apply_uniform_block(&mut self, stage: ShaderStage, slot: usize, data: &[u8]) {
        self.commands.push(Command::UniformBlock {
            stage,
            slot,
            data: data.to_vec(),
        });
    }

    fn draw(&mut self, base_element: u32, num_elements: u32, num_instances: u32) {
        if !self.in_pass || self.cache.pipeline().is_none() {
            log::warn!("HeadlessBackend: draw without a pass or bound pipeline");
        }
        self.stats.draws += 1;
        self.commands.push(Command::Draw {
            base_element,
            num_elements,
            num_instances,
        });
    }

    fn end_pass(&mut self) {
        self.in_pass = false;
        self.commands.push(Command::EndPass);
    }

    fn commit(&mut self) {
        self.frames_committed += 1;
        self.commands.push(Command::Commit);
    }

    fn reset_state_cache(&mut self) {
        self.cache.reset();
        self.commands.push(Command::ResetStateCache);
    }

    fn discard(&mut self) {
        if self.live_resources() > 0 {
            log::warn!(
                "HeadlessBackend: discarded with {} native objects alive",
                self.live_resources()
            );
        }
        self.discarded = true;
        log::info!(
            "HeadlessBackend: discarded after {} frames",
            self.frames_committed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::{Handle, PixelFormat, ResourceKind, TypedId};

    fn buffer_id(index: u32) -> BufferId {
        BufferId::from_handle(Handle::new(ResourceKind::Buffer, index, 1))
    }

    fn image_id(index: u32) -> ImageId {
        ImageId::from_handle(Handle::new(ResourceKind::Image, index, 1))
    }

    #[test]
    fn test_buffer_contents_and_memory_accounting() {
        let mut backend = HeadlessBackend::new();
        let data = [1u8, 2, 3, 4];
        let id = buffer_id(0);
        backend.create_buffer(id, &BufferDesc::vertices(&data)).unwrap();
        assert_eq!(backend.buffer_contents(id), Some(&data[..]));
        assert_eq!(backend.memory_used(), 4);

        backend.destroy_buffer(id);
        assert_eq!(backend.buffer_contents(id), None);
        assert_eq!(backend.memory_used(), 0);
    }

    #[test]
    fn test_memory_budget_is_enforced() {
        let mut backend = HeadlessBackend::new().with_memory_budget(8);
        let data = [0u8; 6];
        backend
            .create_buffer(buffer_id(0), &BufferDesc::vertices(&data))
            .unwrap();
        assert_eq!(
            backend.create_buffer(buffer_id(1), &BufferDesc::vertices(&data)),
            Err(BackendError::OutOfMemory {
                requested: 6,
                available: 2
            })
        );
        assert_eq!(backend.live_resources(), 1);
    }

    #[test]
    fn test_unsupported_formats_and_types_are_rejected() {
        let mut backend = HeadlessBackend::with_features(Features::empty());
        let data = [0u8; 16];
        let float = ImageDesc::texture_2d(1, 1, PixelFormat::Rgba32f, &data);
        assert_eq!(
            backend.create_image(image_id(0), &float),
            Err(BackendError::UnsupportedFormat(PixelFormat::Rgba32f))
        );

        let volume = ImageDesc {
            image_type: ImageType::D3,
            depth_or_layers: 2,
            ..ImageDesc::texture_2d(2, 2, PixelFormat::Rgba8, &data)
        };
        assert_eq!(
            backend.create_image(image_id(1), &volume),
            Err(BackendError::UnsupportedImageType(ImageType::D3))
        );

        let msaa = ImageDesc {
            sample_count: 4,
            ..ImageDesc::render_target(4, 4, PixelFormat::Rgba8)
        };
        assert!(matches!(
            backend.create_image(image_id(2), &msaa),
            Err(BackendError::FeatureNotSupported(_))
        ));
        assert_eq!(backend.live_resources(), 0);
    }

    #[test]
    fn test_image_footprint_covers_the_mip_chain() {
        let mut backend = HeadlessBackend::new();
        let data = [0u8; 16];
        let desc = ImageDesc {
            num_mipmaps: 3,
            ..ImageDesc::texture_2d(4, 4, PixelFormat::Rgba8, &data)
        };
        backend.create_image(image_id(0), &desc).unwrap();
        // 4x4 + 2x2 + 1x1 texels of 4 bytes.
        assert_eq!(backend.memory_used(), (16 + 4 + 1) * 4);
        assert_eq!(backend.image_contents(image_id(0), 0, 0), Some(&data[..]));
        assert_eq!(backend.image_contents(image_id(0), 0, 1), None);
    }

    #[test]
    fn test_passes_reset_the_binding_cache() {
        let mut backend = HeadlessBackend::new();
        let bindings = ResolvedBindings::default();
        backend.begin_pass(
            PassTarget::Default {
                width: 4,
                height: 4,
            },
            &PassAction::default(),
        );
        backend.apply_bindings(&bindings);
        backend.end_pass();
        let after_first = backend.stats().pipeline_switches;
        backend.begin_pass(
            PassTarget::Default {
                width: 4,
                height: 4,
            },
            &PassAction::default(),
        );
        backend.apply_bindings(&bindings);
        assert_eq!(backend.stats().pipeline_switches, after_first + 1);
        assert_eq!(backend.commands().len(), 5);
    }
}
