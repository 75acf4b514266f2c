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

//! Fixed limits shared by the core and every backend adapter.

/// Maximum number of color attachments of an offscreen pass.
pub const MAX_COLOR_ATTACHMENTS: usize = 4;
/// Maximum number of vertex buffer slots (and vertex layouts) of a pipeline.
pub const MAX_SHADERSTAGE_BUFFERS: usize = 4;
/// Maximum number of images a single shader stage can sample.
pub const MAX_SHADERSTAGE_IMAGES: usize = 12;
/// Maximum number of uniform blocks per shader stage.
pub const MAX_SHADERSTAGE_UBS: usize = 4;
/// Maximum number of uniforms in one uniform block.
pub const MAX_UNIFORMS: usize = 16;
/// Maximum number of vertex attributes per pipeline and per shader.
pub const MAX_VERTEX_ATTRIBUTES: usize = 16;
/// Pool capacity used when the configuration does not name one.
pub const DEFAULT_POOL_SIZE: usize = 128;
/// Largest pool capacity the 16-bit slot index can address.
pub const MAX_POOL_SIZE: usize = 65_535;
