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

//! # Kestrel Core
//!
//! Backend-agnostic GPU resource management and render-command sequencing.
//!
//! Resources (buffers, images, shaders, pipelines and passes) live in fixed-capacity
//! pools and are referenced by generation-checked 32-bit ids. A [`Context`] owns the
//! pools, validates every call against the render protocol and forwards what is
//! valid to a [`GraphicsBackend`] adapter.

#![warn(missing_docs)]

pub mod api;
pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod handle;
pub mod limits;
pub mod pool;
pub mod sequencer;
pub mod state;
pub mod stats;
pub mod validation;

#[cfg(test)]
mod testing;

pub use api::*;
pub use backend::{GraphicsBackend, PassTarget, ResolvedBindings};
pub use config::{ContextDesc, PoolSizes};
pub use context::Context;
pub use error::{BackendError, ConfigError, PoolError, SetupError};
pub use handle::{BufferId, Handle, ImageId, PassId, PipelineId, ResourceKind, ShaderId, TypedId};
pub use limits::*;
pub use sequencer::{DrawStatus, PassState};
pub use state::ResourceState;
pub use stats::FrameStats;
pub use validation::{ValidationError, ValidationPolicy};
