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

//! The render-command protocol: begin pass, apply state, draw, end pass, commit.
//!
//! The sequencer owns no resources. It tracks where the caller is in the protocol,
//! whether the current pass or draw state degraded, and what is currently bound,
//! and tells the [`crate::Context`] whether each call reaches the backend.

use crate::api::Rect;
use crate::backend::ResolvedBindings;
use crate::handle::ShaderId;
use crate::stats::FrameStats;
use crate::validation::ValidationError;

/// Where the caller is in the pass protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassState {
    /// Between `end_pass` (or setup) and the next `begin_pass`.
    #[default]
    OutsidePass,
    /// Between `begin_pass` and `end_pass`.
    InsidePass {
        /// `true` if the pass target did not resolve; nothing reaches the backend.
        degraded: bool,
    },
}

/// The draw state of the current pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawStatus {
    /// No draw state applied in this pass yet.
    #[default]
    None,
    /// The last draw state resolved and was bound.
    Valid,
    /// The last draw state referenced a resource that is not `Valid` (drop mode).
    Dropped,
}

/// Whether a pass-scoped call reaches the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Gate<T> {
    /// Forward the call with this value.
    Forward(T),
    /// Drop the call silently.
    Drop,
}

/// State machine behind the frame protocol.
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    pass: PassState,
    draw: DrawStatus,
    pass_height: i32,
    bound: Option<ResolvedBindings>,
    bound_shader: ShaderId,
    frame_index: u64,
    stats: FrameStats,
    last_stats: FrameStats,
}

impl Sequencer {
    /// A sequencer outside of any pass, at frame 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current pass state.
    pub fn pass_state(&self) -> PassState {
        self.pass
    }

    /// The draw state status of the current pass.
    pub fn draw_status(&self) -> DrawStatus {
        self.draw
    }

    /// The index of the frame in progress. Starts at 0, incremented by `commit`.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Counters of the frame in progress.
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Counters of the last committed frame.
    pub fn last_stats(&self) -> &FrameStats {
        &self.last_stats
    }

    /// The bindings last forwarded to the backend, if the cache holds any.
    pub fn bound(&self) -> Option<&ResolvedBindings> {
        self.bound.as_ref()
    }

    pub(crate) fn check_can_begin(&self) -> Result<(), ValidationError> {
        match self.pass {
            PassState::OutsidePass => Ok(()),
            PassState::InsidePass { .. } => Err(ValidationError::PassInProgress),
        }
    }

    pub(crate) fn enter_pass(&mut self, height: u32, degraded: bool) {
        self.pass = PassState::InsidePass { degraded };
        self.draw = DrawStatus::None;
        self.pass_height = height as i32;
        // A native pass starts without any bound state.
        self.bound = None;
        self.stats.passes += 1;
        if degraded {
            self.stats.degraded_passes += 1;
        }
    }

    /// Leaves the current pass. Returns `true` if the backend must end a native pass.
    pub(crate) fn end_pass(&mut self) -> Result<bool, ValidationError> {
        let degraded = self.degraded()?;
        self.pass = PassState::OutsidePass;
        self.draw = DrawStatus::None;
        Ok(!degraded)
    }

    pub(crate) fn commit(&mut self) -> Result<(), ValidationError> {
        if self.pass != PassState::OutsidePass {
            return Err(ValidationError::CommitInsidePass);
        }
        self.last_stats = self.stats;
        self.frame_index += 1;
        self.stats = FrameStats::new(self.frame_index);
        Ok(())
    }

    /// Normalises a viewport or scissor rectangle into the backend's origin convention.
    pub(crate) fn rect_gate(
        &self,
        rect: Rect,
        origin_top_left: bool,
        backend_origin_top_left: bool,
    ) -> Result<Gate<Rect>, ValidationError> {
        if self.degraded()? {
            return Ok(Gate::Drop);
        }
        if origin_top_left == backend_origin_top_left {
            Ok(Gate::Forward(rect))
        } else {
            Ok(Gate::Forward(rect.flipped(self.pass_height)))
        }
    }

    /// Checks that a draw state may be applied. A degraded pass drops it.
    pub(crate) fn draw_state_gate(&mut self) -> Result<Gate<()>, ValidationError> {
        if self.degraded()? {
            self.drop_bindings();
            return Ok(Gate::Drop);
        }
        Ok(Gate::Forward(()))
    }

    /// Records a resolved draw state. Returns `true` if it differs from what is bound
    /// and must be forwarded.
    pub(crate) fn bind(&mut self, bindings: ResolvedBindings, shader: ShaderId) -> bool {
        self.draw = DrawStatus::Valid;
        self.bound_shader = shader;
        if self.bound.as_ref() == Some(&bindings) {
            self.stats.bindings_skipped += 1;
            return false;
        }
        self.bound = Some(bindings);
        self.stats.bindings += 1;
        true
    }

    /// Enters drop mode until the next successful `bind`.
    pub(crate) fn drop_bindings(&mut self) {
        self.draw = DrawStatus::Dropped;
        self.stats.bindings_dropped += 1;
    }

    /// Returns the shader of the bound draw state if uniforms may be forwarded.
    pub(crate) fn uniform_gate(&self) -> Result<Gate<ShaderId>, ValidationError> {
        if self.degraded()? {
            return Ok(Gate::Drop);
        }
        match self.draw {
            DrawStatus::None => Err(ValidationError::NoDrawState),
            DrawStatus::Dropped => Ok(Gate::Drop),
            DrawStatus::Valid => Ok(Gate::Forward(self.bound_shader)),
        }
    }

    pub(crate) fn record_uniform_update(&mut self) {
        self.stats.uniform_updates += 1;
    }

    /// Decides whether a draw call reaches the backend and counts it.
    pub(crate) fn draw_gate(
        &mut self,
        num_elements: u32,
        num_instances: u32,
    ) -> Result<bool, ValidationError> {
        let degraded = self.degraded()?;
        if !degraded && self.draw == DrawStatus::None {
            return Err(ValidationError::NoDrawState);
        }
        if num_elements == 0 || num_instances == 0 {
            return Ok(false);
        }
        if degraded || self.draw == DrawStatus::Dropped {
            self.stats.draws_dropped += 1;
            return Ok(false);
        }
        self.stats.draws += 1;
        Ok(true)
    }

    /// Forgets the bound state so the next draw state is always forwarded.
    pub(crate) fn reset_cache(&mut self) {
        self.bound = None;
    }

    fn degraded(&self) -> Result<bool, ValidationError> {
        match self.pass {
            PassState::OutsidePass => Err(ValidationError::NoPassInProgress),
            PassState::InsidePass { degraded } => Ok(degraded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::{Handle, PipelineId, ResourceKind, TypedId};

    fn bindings(index: u32) -> ResolvedBindings {
        ResolvedBindings {
            pipeline: PipelineId::from_handle(Handle::new(ResourceKind::Pipeline, index, 1)),
            ..Default::default()
        }
    }

    #[test]
    fn test_pass_protocol() {
        let mut seq = Sequencer::new();
        assert_eq!(seq.end_pass(), Err(ValidationError::NoPassInProgress));

        seq.check_can_begin().unwrap();
        seq.enter_pass(400, false);
        assert_eq!(seq.check_can_begin(), Err(ValidationError::PassInProgress));
        assert_eq!(seq.commit(), Err(ValidationError::CommitInsidePass));

        assert_eq!(seq.end_pass(), Ok(true));
        assert_eq!(seq.pass_state(), PassState::OutsidePass);
        seq.commit().unwrap();
        assert_eq!(seq.frame_index(), 1);
        assert_eq!(seq.last_stats().passes, 1);
        assert_eq!(seq.stats().passes, 0);
        assert_eq!(seq.stats().frame_index, 1);
    }

    #[test]
    fn test_draw_requires_a_draw_state() {
        let mut seq = Sequencer::new();
        assert_eq!(seq.draw_gate(3, 1), Err(ValidationError::NoPassInProgress));
        seq.enter_pass(100, false);
        assert_eq!(seq.draw_gate(3, 1), Err(ValidationError::NoDrawState));
        assert_eq!(seq.uniform_gate(), Err(ValidationError::NoDrawState));

        assert!(seq.bind(bindings(0), ShaderId::INVALID));
        assert_eq!(seq.draw_gate(3, 1), Ok(true));
        assert_eq!(seq.draw_gate(0, 1), Ok(false));
        assert_eq!(seq.draw_gate(3, 0), Ok(false));
        assert_eq!(seq.stats().draws, 1);
        assert_eq!(seq.stats().draws_dropped, 0);
    }

    #[test]
    fn test_drop_mode_lasts_until_next_successful_bind() {
        let mut seq = Sequencer::new();
        seq.enter_pass(100, false);
        seq.drop_bindings();
        assert_eq!(seq.draw_gate(3, 1), Ok(false));
        assert_eq!(seq.uniform_gate(), Ok(Gate::Drop));
        assert_eq!(seq.draw_status(), DrawStatus::Dropped);

        seq.bind(bindings(0), ShaderId::INVALID);
        assert_eq!(seq.draw_gate(3, 1), Ok(true));
        assert_eq!(seq.stats().draws_dropped, 1);
        assert_eq!(seq.stats().bindings_dropped, 1);
    }

    #[test]
    fn test_degraded_pass_drops_everything_without_violations() {
        let mut seq = Sequencer::new();
        seq.enter_pass(100, true);
        assert_eq!(seq.draw_state_gate(), Ok(Gate::Drop));
        assert_eq!(seq.draw_gate(3, 1), Ok(false));
        assert_eq!(seq.uniform_gate(), Ok(Gate::Drop));
        assert_eq!(
            seq.rect_gate(Rect::new(0, 0, 10, 10), true, false),
            Ok(Gate::Drop)
        );
        assert_eq!(seq.end_pass(), Ok(false));
        assert_eq!(seq.stats().degraded_passes, 1);
    }

    #[test]
    fn test_identical_bindings_are_filtered() {
        let mut seq = Sequencer::new();
        seq.enter_pass(100, false);
        assert!(seq.bind(bindings(0), ShaderId::INVALID));
        assert!(!seq.bind(bindings(0), ShaderId::INVALID));
        assert!(seq.bind(bindings(1), ShaderId::INVALID));

        seq.reset_cache();
        seq.reset_cache();
        assert!(seq.bind(bindings(1), ShaderId::INVALID));
        assert_eq!(seq.stats().bindings, 3);
        assert_eq!(seq.stats().bindings_skipped, 1);
    }

    #[test]
    fn test_new_pass_forgets_bound_state() {
        let mut seq = Sequencer::new();
        seq.enter_pass(100, false);
        seq.bind(bindings(0), ShaderId::INVALID);
        seq.end_pass().unwrap();
        seq.enter_pass(100, false);
        assert!(seq.bound().is_none());
        assert!(seq.bind(bindings(0), ShaderId::INVALID));
    }

    #[test]
    fn test_rect_is_flipped_only_when_origins_differ() {
        let mut seq = Sequencer::new();
        seq.enter_pass(400, false);
        let rect = Rect::new(0, 10, 100, 50);
        assert_eq!(seq.rect_gate(rect, true, true), Ok(Gate::Forward(rect)));
        assert_eq!(
            seq.rect_gate(rect, true, false),
            Ok(Gate::Forward(Rect::new(0, 340, 100, 50)))
        );
        assert_eq!(
            seq.rect_gate(rect, false, true),
            Ok(Gate::Forward(Rect::new(0, 340, 100, 50)))
        );
    }
}
