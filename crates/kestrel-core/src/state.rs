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

//! The lifecycle every pooled resource goes through.

use thiserror::Error;

/// The lifecycle state of a resource slot.
///
/// Resources are created in two phases: `alloc_*` reserves a slot (`Alloc`) and
/// `init_*` asks the backend to realise it (`Valid` or `Failed`). Only `Valid`
/// resources are ever forwarded to the backend during rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceState {
    /// The slot is free.
    #[default]
    Initial,
    /// The slot is reserved but the resource has not been initialised yet.
    Alloc,
    /// The resource exists on the backend and can be used.
    Valid,
    /// Initialisation failed. The slot stays reserved until it is destroyed.
    Failed,
    /// Query-only: the id does not resolve to any slot (invalid, stale or foreign).
    Invalid,
}

/// An input to the resource state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateEvent {
    /// A free slot was reserved.
    Allocate,
    /// The backend created the resource.
    InitSucceeded,
    /// The backend, or a dependency check, rejected the resource.
    InitFailed,
    /// The caller destroyed the resource.
    Destroy,
}

/// A transition that the resource state machine does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal resource state transition: {event:?} in state {from:?}")]
pub struct InvalidTransition {
    /// The state the slot was in.
    pub from: ResourceState,
    /// The rejected event.
    pub event: StateEvent,
}

impl ResourceState {
    /// Applies `event` and returns the resulting state.
    pub fn on(self, event: StateEvent) -> Result<ResourceState, InvalidTransition> {
        use ResourceState::*;
        use StateEvent::*;

        match (self, event) {
            (Initial, Allocate) => Ok(Alloc),
            (Alloc, InitSucceeded) => Ok(Valid),
            (Alloc, InitFailed) => Ok(Failed),
            (Alloc | Valid | Failed, Destroy) => Ok(Initial),
            (from, event) => Err(InvalidTransition { from, event }),
        }
    }

    /// Returns `true` if a slot in this state holds a live reservation.
    pub fn is_occupied(self) -> bool {
        matches!(
            self,
            ResourceState::Alloc | ResourceState::Valid | ResourceState::Failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_phase_creation_path() {
        let state = ResourceState::Initial;
        let state = state.on(StateEvent::Allocate).unwrap();
        assert_eq!(state, ResourceState::Alloc);
        assert_eq!(
            state.on(StateEvent::InitSucceeded).unwrap(),
            ResourceState::Valid
        );
        assert_eq!(state.on(StateEvent::InitFailed).unwrap(), ResourceState::Failed);
    }

    #[test]
    fn test_destroy_is_legal_from_every_occupied_state() {
        for state in [
            ResourceState::Alloc,
            ResourceState::Valid,
            ResourceState::Failed,
        ] {
            assert_eq!(state.on(StateEvent::Destroy), Ok(ResourceState::Initial));
        }
    }

    #[test]
    fn test_initialising_twice_is_rejected() {
        let err = ResourceState::Valid
            .on(StateEvent::InitSucceeded)
            .unwrap_err();
        assert_eq!(err.from, ResourceState::Valid);
        assert_eq!(err.event, StateEvent::InitSucceeded);
        assert!(ResourceState::Failed.on(StateEvent::InitFailed).is_err());
    }

    #[test]
    fn test_free_and_invalid_slots_reject_everything_but_allocate() {
        assert!(ResourceState::Initial.on(StateEvent::Destroy).is_err());
        assert!(ResourceState::Initial.on(StateEvent::InitSucceeded).is_err());
        assert!(ResourceState::Alloc.on(StateEvent::Allocate).is_err());
        for event in [
            StateEvent::Allocate,
            StateEvent::InitSucceeded,
            StateEvent::InitFailed,
            StateEvent::Destroy,
        ] {
            assert!(ResourceState::Invalid.on(event).is_err());
        }
    }

    #[test]
    fn test_occupancy() {
        assert!(!ResourceState::Initial.is_occupied());
        assert!(ResourceState::Alloc.is_occupied());
        assert!(ResourceState::Failed.is_occupied());
        assert!(!ResourceState::Invalid.is_occupied());
    }
}
