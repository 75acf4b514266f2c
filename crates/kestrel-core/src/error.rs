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

//! Error types shared across the crate.
//!
//! Contract violations live in [`crate::validation::ValidationError`]; the types here
//! cover everything that is an ordinary, recoverable failure.

use crate::api::{ImageType, PixelFormat};
use crate::handle::{Handle, ResourceKind};
use crate::state::InvalidTransition;
use thiserror::Error;

/// Errors returned by a pool when a handle cannot be acted upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The handle is [`Handle::INVALID`].
    #[error("the invalid handle cannot be resolved")]
    InvalidHandle,
    /// The handle's type tag names another resource kind.
    #[error("{handle:?} does not belong to the {expected} pool")]
    WrongKind {
        /// The rejected handle.
        handle: Handle,
        /// The kind the pool stores.
        expected: ResourceKind,
    },
    /// The slot index lies beyond the pool's capacity.
    #[error("{handle:?} is out of range for a pool of {capacity} slots")]
    OutOfRange {
        /// The rejected handle.
        handle: Handle,
        /// The pool capacity.
        capacity: usize,
    },
    /// The slot has been freed (and possibly reused) since the handle was issued.
    #[error("{0:?} is stale")]
    Stale(Handle),
    /// The requested operation is not legal in the slot's current state.
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}

/// An error reported by a backend adapter while realising a resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend cannot create images with this pixel format.
    #[error("pixel format {0:?} is not supported by the backend")]
    UnsupportedFormat(PixelFormat),
    /// The backend cannot create images of this type.
    #[error("image type {0:?} is not supported by the backend")]
    UnsupportedImageType(ImageType),
    /// A required optional feature is missing.
    #[error("feature not supported: {0}")]
    FeatureNotSupported(String),
    /// The backend ran out of memory for the resource.
    #[error("out of GPU memory: {requested} bytes requested, {available} bytes available")]
    OutOfMemory {
        /// Bytes the resource needs.
        requested: usize,
        /// Bytes left in the budget.
        available: usize,
    },
    /// The backend has no native object for this id.
    #[error("no native resource for {0:?}")]
    UnknownResource(Handle),
    /// Any other adapter specific failure.
    #[error("resource creation failed: {0}")]
    CreationFailed(String),
}

/// Errors raised by [`crate::Context::setup`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// A pool was configured with zero capacity.
    #[error("the {0} pool must hold at least one slot")]
    EmptyPool(ResourceKind),
    /// A pool was configured beyond what the handle layout can address.
    #[error("the {kind} pool size {size} exceeds the maximum of {max}")]
    PoolTooLarge {
        /// The pool that was misconfigured.
        kind: ResourceKind,
        /// The requested size.
        size: usize,
        /// The largest supported size.
        max: usize,
    },
    /// The default framebuffer has a zero dimension.
    #[error("the default framebuffer size {width}x{height} is empty")]
    EmptyFramebuffer {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// The sample count is not a power of two in `1..=16`.
    #[error("sample count {0} is not a power of two between 1 and 16")]
    InvalidSampleCount(u32),
}

/// Errors raised while loading or saving a [`crate::ContextDesc`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The RON document could not be parsed.
    #[error("failed to parse context configuration: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The configuration could not be serialised.
    #[error("failed to serialise context configuration: {0}")]
    Serialize(#[from] ron::Error),
    /// The configuration file could not be read.
    #[error("failed to read context configuration: {0}")]
    Io(#[from] std::io::Error),
}
