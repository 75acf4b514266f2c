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

//! Context configuration, loadable from RON.

use crate::error::{ConfigError, SetupError};
use crate::handle::ResourceKind;
use crate::limits::{DEFAULT_POOL_SIZE, MAX_POOL_SIZE};
use crate::validation::{is_valid_sample_count, ValidationPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Capacity of each resource pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSizes {
    /// Buffer pool capacity.
    pub buffers: usize,
    /// Image pool capacity.
    pub images: usize,
    /// Shader pool capacity.
    pub shaders: usize,
    /// Pipeline pool capacity.
    pub pipelines: usize,
    /// Pass pool capacity.
    pub passes: usize,
}

impl Default for PoolSizes {
    fn default() -> Self {
        Self::uniform(DEFAULT_POOL_SIZE)
    }
}

impl PoolSizes {
    /// The same capacity for every pool.
    pub const fn uniform(size: usize) -> Self {
        Self {
            buffers: size,
            images: size,
            shaders: size,
            pipelines: size,
            passes: size,
        }
    }

    /// The capacity of the pool storing `kind`.
    pub fn get(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Buffer => self.buffers,
            ResourceKind::Image => self.images,
            ResourceKind::Shader => self.shaders,
            ResourceKind::Pipeline => self.pipelines,
            ResourceKind::Pass => self.passes,
        }
    }
}

/// Everything needed to set up a [`crate::Context`].
///
/// Missing fields in a RON document take their default value:
///
/// ```ron
/// (
///     width: 1280,
///     height: 720,
///     pool_sizes: (buffers: 512),
///     validation: Log,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextDesc {
    /// Width of the default framebuffer.
    pub width: u32,
    /// Height of the default framebuffer.
    pub height: u32,
    /// MSAA samples of the default framebuffer.
    pub sample_count: u32,
    /// Capacity of each resource pool.
    pub pool_sizes: PoolSizes,
    /// What happens on a contract violation.
    pub validation: ValidationPolicy,
}

impl Default for ContextDesc {
    fn default() -> Self {
        Self {
            width: 640,
            height: 400,
            sample_count: 1,
            pool_sizes: PoolSizes::default(),
            validation: ValidationPolicy::Fatal,
        }
    }
}

impl ContextDesc {
    /// Parses a configuration from a RON string.
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    /// Reads and parses a RON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    /// Serialises the configuration as pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Checks that the configuration can be used to set up a context.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.width == 0 || self.height == 0 {
            return Err(SetupError::EmptyFramebuffer {
                width: self.width,
                height: self.height,
            });
        }
        if !is_valid_sample_count(self.sample_count) {
            return Err(SetupError::InvalidSampleCount(self.sample_count));
        }
        for kind in ResourceKind::ALL {
            let size = self.pool_sizes.get(kind);
            if size == 0 {
                return Err(SetupError::EmptyPool(kind));
            }
            if size > MAX_POOL_SIZE {
                return Err(SetupError::PoolTooLarge {
                    kind,
                    size,
                    max: MAX_POOL_SIZE,
                });
            }
        }
        Ok(())
    }
}
