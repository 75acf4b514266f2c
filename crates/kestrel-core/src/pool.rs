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

//! Fixed-capacity, generation-checked resource pools.

use crate::error::PoolError;
use crate::handle::{next_generation, Handle, TypedId, MAX_GENERATION};
use crate::limits::MAX_POOL_SIZE;
use crate::state::{ResourceState, StateEvent};
use std::marker::PhantomData;

/// One entry of a [`Pool`].
#[derive(Debug, Clone)]
pub struct Slot<T> {
    generation: u32,
    state: ResourceState,
    payload: Option<T>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            generation: 1,
            state: ResourceState::Initial,
            payload: None,
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ResourceState {
        self.state
    }

    /// The generation handles must carry to resolve to this slot.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// The payload, present once the slot has been initialised.
    ///
    /// A `Failed` slot may still carry the payload built before the backend refused
    /// the resource.
    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    fn apply(&mut self, event: StateEvent) -> Result<(), PoolError> {
        self.state = self.state.on(event)?;
        Ok(())
    }
}

/// The result of initialising an allocated slot.
#[derive(Debug)]
pub enum InitOutcome<T> {
    /// The resource was realised; the slot becomes `Valid`.
    Ready(T),
    /// The resource could not be realised; the slot becomes `Failed`.
    Failed(Option<T>),
}

/// A fixed-capacity arena of resource slots, addressed by the typed id `I`.
///
/// Free slot indices live on a stack, so the most recently freed slot is reused
/// first. Every free bumps the slot generation, which makes every previously issued
/// id for that slot stale. A slot freed at [`MAX_GENERATION`] is retired and never
/// handed out again.
#[derive(Debug, Clone)]
pub struct Pool<I, T> {
    slots: Vec<Slot<T>>,
    free_indices: Vec<u32>,
    retired: usize,
    _id: PhantomData<fn() -> I>,
}

impl<I: TypedId, T> Pool<I, T> {
    /// Creates a pool with `capacity` free slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or larger than [`MAX_POOL_SIZE`]. The context
    /// checks both bounds during setup.
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity > 0 && capacity <= MAX_POOL_SIZE,
            "pool capacity {capacity} must be in 1..={MAX_POOL_SIZE}"
        );
        Self {
            slots: (0..capacity).map(|_| Slot::new()).collect(),
            // Reversed so that the lowest index is popped first.
            free_indices: (0..capacity as u32).rev().collect(),
            retired: 0,
            _id: PhantomData,
        }
    }

    /// The total number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_indices.len() - self.retired
    }

    /// The number of slots retired after exhausting their generations.
    pub fn retired(&self) -> usize {
        self.retired
    }

    /// Returns `true` if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserves a free slot and returns its id, or `I::INVALID` when the pool is full.
    pub fn alloc(&mut self) -> I {
        let Some(index) = self.free_indices.pop() else {
            return I::from_handle(Handle::INVALID);
        };
        let slot = &mut self.slots[index as usize];
        if let Err(err) = slot.apply(StateEvent::Allocate) {
            log::error!("free list held slot {index} of the {} pool: {err}", I::KIND);
            return I::from_handle(Handle::INVALID);
        }
        slot.payload = None;
        I::from_handle(Handle::new(I::KIND, index, slot.generation))
    }

    /// Releases the slot `id` refers to and hands back its payload.
    ///
    /// The slot generation is bumped, so `id` and every copy of it become stale.
    pub fn free(&mut self, id: I) -> Result<Option<T>, PoolError> {
        let index = self.resolve(id)?;
        let slot = &mut self.slots[index];
        slot.apply(StateEvent::Destroy)?;
        match next_generation(slot.generation) {
            Some(generation) => {
                slot.generation = generation;
                self.free_indices.push(index as u32);
            }
            None => {
                log::warn!(
                    "slot {index} of the {} pool exhausted its generations and is retired",
                    I::KIND
                );
                self.retired += 1;
            }
        }
        Ok(slot.payload.take())
    }

    /// Records the outcome of initialising the `Alloc` slot `id` refers to.
    pub fn init(&mut self, id: I, outcome: InitOutcome<T>) -> Result<ResourceState, PoolError> {
        let index = self.resolve(id)?;
        let slot = &mut self.slots[index];
        let (event, payload) = match outcome {
            InitOutcome::Ready(payload) => (StateEvent::InitSucceeded, Some(payload)),
            InitOutcome::Failed(payload) => (StateEvent::InitFailed, payload),
        };
        slot.apply(event)?;
        slot.payload = payload;
        Ok(slot.state)
    }

    /// The slot `id` refers to, if the id is current and the slot is occupied.
    pub fn lookup(&self, id: I) -> Option<&Slot<T>> {
        self.resolve(id).ok().map(|index| &self.slots[index])
    }

    /// The payload of a `Valid` resource.
    pub fn get(&self, id: I) -> Option<&T> {
        self.lookup(id)
            .filter(|slot| slot.state == ResourceState::Valid)
            .and_then(|slot| slot.payload.as_ref())
    }

    /// The mutable payload of a `Valid` resource.
    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        let index = self.resolve(id).ok()?;
        let slot = &mut self.slots[index];
        if slot.state == ResourceState::Valid {
            slot.payload.as_mut()
        } else {
            None
        }
    }

    /// The state of the resource `id` refers to, or [`ResourceState::Invalid`] when
    /// the id does not resolve.
    pub fn state(&self, id: I) -> ResourceState {
        self.lookup(id)
            .map_or(ResourceState::Invalid, |slot| slot.state)
    }

    /// Ids of every occupied slot, in slot order.
    pub fn live_ids(&self) -> impl Iterator<Item = I> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.state.is_occupied())
            .map(|(index, slot)| I::from_handle(Handle::new(I::KIND, index as u32, slot.generation)))
    }

    fn resolve(&self, id: I) -> Result<usize, PoolError> {
        let handle = id.handle();
        if handle.is_invalid() {
            return Err(PoolError::InvalidHandle);
        }
        if handle.kind() != Some(I::KIND) {
            return Err(PoolError::WrongKind {
                handle,
                expected: I::KIND,
            });
        }
        let index = handle.index() as usize;
        let slot = self.slots.get(index).ok_or(PoolError::OutOfRange {
            handle,
            capacity: self.slots.len(),
        })?;
        if slot.generation != handle.generation() || !slot.state.is_occupied() {
            return Err(PoolError::Stale(handle));
        }
        Ok(index)
    }
}
