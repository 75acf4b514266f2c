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

//! Packing of 32-bit resource handles and the typed ids built on top of them.
//!
//! A [`Handle`] stores three fields, least significant bits first:
//!
//! | bits    | field          |
//! |---------|----------------|
//! | 0..16   | slot index     |
//! | 16..19  | resource kind  |
//! | 19..32  | generation     |
//!
//! Generations start at 1, so an issued handle never encodes to the reserved
//! value `0`. A slot whose generation reaches [`MAX_GENERATION`] is retired by its
//! pool instead of wrapping, so a stale handle can never match a later occupant.

use std::fmt;

const INDEX_BITS: u32 = 16;
const KIND_BITS: u32 = 3;
const GENERATION_BITS: u32 = 13;

const INDEX_MASK: u32 = (1 << INDEX_BITS) - 1;
const KIND_SHIFT: u32 = INDEX_BITS;
const KIND_MASK: u32 = (1 << KIND_BITS) - 1;
const GENERATION_SHIFT: u32 = INDEX_BITS + KIND_BITS;

/// The largest generation a slot can carry. Freeing a slot at this generation retires it.
pub const MAX_GENERATION: u32 = (1 << GENERATION_BITS) - 1;

/// The resource family a handle belongs to. Stored in the handle's type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ResourceKind {
    /// A vertex or index buffer.
    Buffer = 0,
    /// A texture or render target.
    Image = 1,
    /// A vertex/fragment shader pair.
    Shader = 2,
    /// A pipeline state object.
    Pipeline = 3,
    /// An offscreen render pass.
    Pass = 4,
}

impl ResourceKind {
    /// Every resource kind, in tag order.
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Buffer,
        ResourceKind::Image,
        ResourceKind::Shader,
        ResourceKind::Pipeline,
        ResourceKind::Pass,
    ];

    /// A lowercase, human readable name used in log messages.
    pub const fn name(self) -> &'static str {
        match self {
            ResourceKind::Buffer => "buffer",
            ResourceKind::Image => "image",
            ResourceKind::Shader => "shader",
            ResourceKind::Pipeline => "pipeline",
            ResourceKind::Pass => "pass",
        }
    }

    fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(ResourceKind::Buffer),
            1 => Some(ResourceKind::Image),
            2 => Some(ResourceKind::Shader),
            3 => Some(ResourceKind::Pipeline),
            4 => Some(ResourceKind::Pass),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An untyped, generation-checked reference to a pooled resource.
///
/// Handles are plain `Copy` values. They never own the resource they point at; the
/// owning pool resolves them on every use and rejects any handle whose generation
/// no longer matches the slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Handle(u32);

impl Handle {
    /// The reserved handle that never resolves to anything.
    pub const INVALID: Handle = Handle(0);

    /// Packs a handle from its fields.
    ///
    /// `index` is truncated to 16 bits and `generation` to 13 bits. A generation of
    /// 0 is only legal for [`Handle::INVALID`]; pools never produce one.
    pub const fn new(kind: ResourceKind, index: u32, generation: u32) -> Self {
        Handle(
            ((generation & MAX_GENERATION) << GENERATION_SHIFT)
                | ((kind as u32 & KIND_MASK) << KIND_SHIFT)
                | (index & INDEX_MASK),
        )
    }

    /// Reinterprets a raw 32-bit value as a handle.
    pub const fn from_raw(raw: u32) -> Self {
        Handle(raw)
    }

    /// The raw 32-bit representation.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns `true` for the reserved invalid handle.
    pub const fn is_invalid(self) -> bool {
        self.0 == 0
    }

    /// The resource kind encoded in the type tag, if the tag is a known one.
    pub fn kind(self) -> Option<ResourceKind> {
        ResourceKind::from_tag((self.0 >> KIND_SHIFT) & KIND_MASK)
    }

    /// The slot index inside the owning pool.
    pub const fn index(self) -> u32 {
        self.0 & INDEX_MASK
    }

    /// The generation the slot had when this handle was issued.
    pub const fn generation(self) -> u32 {
        self.0 >> GENERATION_SHIFT
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invalid() {
            return f.write_str("Handle(INVALID)");
        }
        match self.kind() {
            Some(kind) => write!(
                f,
                "Handle({}#{}@{})",
                kind,
                self.index(),
                self.generation()
            ),
            None => write!(f, "Handle({:#010x})", self.0),
        }
    }
}

/// Returns the generation that follows `generation`, or `None` once the counter
/// is exhausted.
pub(crate) const fn next_generation(generation: u32) -> Option<u32> {
    if generation >= MAX_GENERATION {
        None
    } else {
        Some(generation + 1)
    }
}

/// Implemented by the per-kind id wrappers so pools can be typed by the id they issue.
pub trait TypedId: Copy + Eq + fmt::Debug {
    /// The resource kind this id refers to.
    const KIND: ResourceKind;

    /// Wraps an untyped handle. The handle is not checked.
    fn from_handle(handle: Handle) -> Self;

    /// The wrapped untyped handle.
    fn handle(self) -> Handle;
}

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(Handle);

        impl $name {
            /// The id that never resolves. Also the value of `Default::default()`.
            pub const INVALID: Self = Self(Handle::INVALID);

            /// Reinterprets a raw 32-bit value as an id of this kind.
            pub const fn from_raw(raw: u32) -> Self {
                Self(Handle::from_raw(raw))
            }

            /// The raw 32-bit representation.
            pub const fn raw(self) -> u32 {
                self.0.raw()
            }

            /// Returns `true` for [`Self::INVALID`].
            pub const fn is_invalid(self) -> bool {
                self.0.is_invalid()
            }

            /// The untyped handle.
            pub const fn handle(self) -> Handle {
                self.0
            }
        }

        impl TypedId for $name {
            const KIND: ResourceKind = ResourceKind::$kind;

            fn from_handle(handle: Handle) -> Self {
                Self(handle)
            }

            fn handle(self) -> Handle {
                self.0
            }
        }

        impl From<$name> for Handle {
            fn from(id: $name) -> Handle {
                id.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }
    };
}

resource_id! {
    /// Id of a vertex or index buffer.
    BufferId => Buffer
}
resource_id! {
    /// Id of a texture or render-target image.
    ImageId => Image
}
resource_id! {
    /// Id of a shader.
    ShaderId => Shader
}
resource_id! {
    /// Id of a pipeline state object.
    PipelineId => Pipeline
}
resource_id! {
    /// Id of an offscreen render pass. [`PassId::INVALID`] selects the default pass.
    PassId => Pass
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_round_trip() {
        let handle = Handle::new(ResourceKind::Pipeline, 1234, 77);
        assert_eq!(handle.kind(), Some(ResourceKind::Pipeline));
        assert_eq!(handle.index(), 1234);
        assert_eq!(handle.generation(), 77);
    }

    #[test]
    fn test_extreme_fields_do_not_bleed() {
        let handle = Handle::new(ResourceKind::Pass, 0xFFFF, MAX_GENERATION);
        assert_eq!(handle.index(), 0xFFFF);
        assert_eq!(handle.kind(), Some(ResourceKind::Pass));
        assert_eq!(handle.generation(), MAX_GENERATION);
        assert_eq!(handle.raw(), 0xFFFF_FFFF & !(0b011 << 16));
    }

    #[test]
    fn test_issued_handles_never_encode_to_zero() {
        // Slot 0 of the buffer pool has tag 0, so only the generation keeps it non-zero.
        let handle = Handle::new(ResourceKind::Buffer, 0, 1);
        assert!(!handle.is_invalid());
        assert_ne!(handle.raw(), 0);
    }

    #[test]
    fn test_generation_saturates_instead_of_wrapping() {
        assert_eq!(next_generation(1), Some(2));
        assert_eq!(next_generation(MAX_GENERATION - 1), Some(MAX_GENERATION));
        assert_eq!(next_generation(MAX_GENERATION), None);
    }

    #[test]
    fn test_default_ids_are_invalid() {
        assert!(BufferId::default().is_invalid());
        assert_eq!(PassId::default(), PassId::INVALID);
        assert_eq!(ImageId::from_raw(0), ImageId::INVALID);
    }

    #[test]
    fn test_typed_id_preserves_raw_value() {
        let handle = Handle::new(ResourceKind::Image, 9, 3);
        let id = ImageId::from_handle(handle);
        assert_eq!(id.raw(), handle.raw());
        assert_eq!(Handle::from(id), handle);
        assert_eq!(<ImageId as TypedId>::KIND, ResourceKind::Image);
    }

    #[test]
    fn test_debug_output_names_kind_index_and_generation() {
        let handle = Handle::new(ResourceKind::Shader, 5, 2);
        assert_eq!(format!("{handle:?}"), "Handle(shader#5@2)");
        assert_eq!(format!("{:?}", BufferId::INVALID), "BufferId(Handle(INVALID))");
    }
}
