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

//! Enums shared by several resource descriptors.

/// How often the contents of a buffer or image change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Usage {
    /// Written once at creation, never updated.
    #[default]
    Immutable,
    /// Updated occasionally, at most once per frame.
    Dynamic,
    /// Rewritten every frame, at most once per frame.
    Stream,
}

/// A rectangle in framebuffer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// The left edge.
    pub x: i32,
    /// The edge row 0 is measured from, in the caller's origin convention.
    pub y: i32,
    /// The width in pixels.
    pub width: i32,
    /// The height in pixels.
    pub height: i32,
}

impl Rect {
    /// Creates a rectangle.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Mirrors the rectangle vertically inside a target of `target_height` rows,
    /// converting between top-left and bottom-left origins.
    pub const fn flipped(self, target_height: i32) -> Self {
        Self {
            y: target_height - (self.y + self.height),
            ..self
        }
    }
}
