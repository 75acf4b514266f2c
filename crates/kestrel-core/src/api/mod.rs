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

//! Descriptors, per-resource metadata and plain value types of the public API.

pub mod action;
pub mod buffer;
pub mod color;
pub mod common;
pub mod draw;
pub mod features;
pub mod image;
pub mod pass;
pub mod pipeline;
pub mod shader;

pub use self::action::*;
pub use self::buffer::*;
pub use self::color::*;
pub use self::common::*;
pub use self::draw::*;
pub use self::features::*;
pub use self::image::*;
pub use self::pass::*;
pub use self::pipeline::*;
pub use self::shader::*;
