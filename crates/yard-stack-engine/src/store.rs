// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use crate::{
    error::EngineError,
    locator::LocatorIndex,
    placement::{Placement, PlacementStatus},
    stack::{SlotStack, Transition, is_contiguous},
};
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::trace;
use yard_stack_core::prelude::*;
use yard_stack_model::prelude::*;

/// Authoritative occupancy state of every placement in a yard.
///
/// Implementations must apply a transition and its locator updates as one
/// atomic step, and must serialize transitions on the same slot.
pub trait OccupancyStore: Send + Sync {
    fn layout(&self) -> &YardLayout;

    /// Fails with `NotFound` for an unknown slot or a tier above its capacity.
    fn get(&self, address: TierAddress) -> Result<Placement, EngineError>;

    /// Placements of a slot, tier 1 first.
    fn list_by_slot(&self, slot: SlotId) -> Result<Vec<Placement>, EngineError>;

    /// Compare-and-set: fails with `Conflict` unless the tier is currently `expected`.
    fn apply_transition(
        &self,
        address: TierAddress,
        expected: PlacementStatus,
        transition: Transition,
    ) -> Result<Placement, EngineError>;

    fn locate(&self, container_no: &ContainerNo) -> Option<TierAddress>;

    /// Recomputes the locator from a full scan and returns the number of entries.
    fn rebuild_locator(&self) -> usize;
}

impl<S: OccupancyStore + ?Sized> OccupancyStore for &S {
    #[inline]
    fn layout(&self) -> &YardLayout {
        (**self).layout()
    }

    #[inline]
    fn get(&self, address: TierAddress) -> Result<Placement, EngineError> {
        (**self).get(address)
    }

    #[inline]
    fn list_by_slot(&self, slot: SlotId) -> Result<Vec<Placement>, EngineError> {
        (**self).list_by_slot(slot)
    }

    #[inline]
    fn apply_transition(
        &self,
        address: TierAddress,
        expected: PlacementStatus,
        transition: Transition,
    ) -> Result<Placement, EngineError> {
        (**self).apply_transition(address, expected, transition)
    }

    #[inline]
    fn locate(&self, container_no: &ContainerNo) -> Option<TierAddress> {
        (**self).locate(container_no)
    }

    #[inline]
    fn rebuild_locator(&self) -> usize {
        (**self).rebuild_locator()
    }
}

impl<S: OccupancyStore + ?Sized> OccupancyStore for Arc<S> {
    #[inline]
    fn layout(&self) -> &YardLayout {
        (**self).layout()
    }

    #[inline]
    fn get(&self, address: TierAddress) -> Result<Placement, EngineError> {
        (**self).get(address)
    }

    #[inline]
    fn list_by_slot(&self, slot: SlotId) -> Result<Vec<Placement>, EngineError> {
        (**self).list_by_slot(slot)
    }

    #[inline]
    fn apply_transition(
        &self,
        address: TierAddress,
        expected: PlacementStatus,
        transition: Transition,
    ) -> Result<Placement, EngineError> {
        (**self).apply_transition(address, expected, transition)
    }

    #[inline]
    fn locate(&self, container_no: &ContainerNo) -> Option<TierAddress> {
        (**self).locate(container_no)
    }

    #[inline]
    fn rebuild_locator(&self) -> usize {
        (**self).rebuild_locator()
    }
}

/// A broken occupancy invariant found by a full scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InvariantViolation {
    /// A non-empty tier sits above an empty one.
    Gap(SlotId),
    /// Status and container binding disagree.
    StatusMismatch(TierAddress),
    DuplicateContainer {
        container_no: ContainerNo,
        first: TierAddress,
        second: TierAddress,
    },
    /// A placement carries a container the locator does not resolve to it.
    LocatorMissing {
        container_no: ContainerNo,
        address: TierAddress,
    },
    /// A locator entry points at a tier that does not hold the container.
    LocatorStale {
        container_no: ContainerNo,
        address: TierAddress,
    },
}

impl Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvariantViolation::Gap(slot) => {
                write!(f, "Slot {} has a container above an empty tier", slot)
            }
            InvariantViolation::StatusMismatch(addr) => {
                write!(f, "Placement {} has a status inconsistent with its container", addr)
            }
            InvariantViolation::DuplicateContainer {
                container_no,
                first,
                second,
            } => write!(
                f,
                "Container {} is placed at both {} and {}",
                container_no, first, second
            ),
            InvariantViolation::LocatorMissing {
                container_no,
                address,
            } => write!(
                f,
                "Locator does not resolve container {} to {}",
                container_no, address
            ),
            InvariantViolation::LocatorStale {
                container_no,
                address,
            } => write!(
                f,
                "Locator resolves container {} to {} which does not hold it",
                container_no, address
            ),
        }
    }
}

impl std::error::Error for InvariantViolation {}

/// Checks a single placement record for status/binding coherence.
pub(crate) fn placement_is_coherent(p: &Placement) -> bool {
    match p.status() {
        PlacementStatus::Empty => {
            p.container_no().is_none() && p.held_at().is_none() && p.occupied_at().is_none()
        }
        PlacementStatus::Held => p.held_at().is_some() && p.occupied_at().is_none(),
        PlacementStatus::Occupied => p.container_no().is_some() && p.occupied_at().is_some(),
    }
}

#[inline]
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // Transitions validate before mutating, so a poisoned guard still holds consistent data.
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process store with one lock per slot and one for the locator.
///
/// Lock order: at most one slot lock, then the locator lock. Whole-store
/// scans take every slot lock in ascending slot order before the locator.
#[derive(Debug)]
pub struct InMemoryStore {
    layout: YardLayout,
    slots: BTreeMap<SlotId, Mutex<SlotStack>>,
    locator: Mutex<LocatorIndex>,
}

impl InMemoryStore {
    /// Creates a store in which every tier of every slot is empty.
    pub fn new(layout: YardLayout) -> Self {
        let slots = layout
            .slots()
            .map(|s| (s.id(), Mutex::new(SlotStack::new(s.id(), s.tier_capacity()))))
            .collect();
        Self {
            layout,
            slots,
            locator: Mutex::new(LocatorIndex::new()),
        }
    }

    pub(crate) fn from_parts(
        layout: YardLayout,
        slots: BTreeMap<SlotId, Mutex<SlotStack>>,
        locator: LocatorIndex,
    ) -> Self {
        Self {
            layout,
            slots,
            locator: Mutex::new(locator),
        }
    }

    #[inline]
    fn slot_cell(&self, slot: SlotId) -> Result<&Mutex<SlotStack>, EngineError> {
        self.slots
            .get(&slot)
            .ok_or(EngineError::slot_not_found(slot))
    }

    /// Locks every slot in ascending order, then the locator.
    pub(crate) fn lock_all(&self) -> (Vec<MutexGuard<'_, SlotStack>>, MutexGuard<'_, LocatorIndex>) {
        let stacks = self.slots.values().map(lock).collect();
        let locator = lock(&self.locator);
        (stacks, locator)
    }

    /// Number of entries currently in the locator index.
    #[inline]
    pub fn locator_len(&self) -> usize {
        lock(&self.locator).len()
    }

    /// Full-scan consistency check of placements and locator.
    pub fn verify(&self) -> Result<(), InvariantViolation> {
        let (stacks, locator) = self.lock_all();
        verify_stacks(stacks.iter().map(|s| &**s), &locator)
    }
}

pub(crate) fn verify_stacks<'s, I>(stacks: I, locator: &LocatorIndex) -> Result<(), InvariantViolation>
where
    I: IntoIterator<Item = &'s SlotStack>,
{
    let mut seen: HashMap<&ContainerNo, TierAddress> = HashMap::new();
    for stack in stacks {
        if !is_contiguous(stack.placements()) {
            return Err(InvariantViolation::Gap(stack.slot()));
        }
        for p in stack.placements() {
            if !placement_is_coherent(p) {
                return Err(InvariantViolation::StatusMismatch(p.address()));
            }
            let Some(c) = p.container_no() else {
                continue;
            };
            if let Some(first) = seen.insert(c, p.address()) {
                return Err(InvariantViolation::DuplicateContainer {
                    container_no: c.clone(),
                    first,
                    second: p.address(),
                });
            }
            if locator.get(c) != Some(p.address()) {
                return Err(InvariantViolation::LocatorMissing {
                    container_no: c.clone(),
                    address: p.address(),
                });
            }
        }
    }
    for (c, address) in locator.iter() {
        if seen.get(c) != Some(&address) {
            return Err(InvariantViolation::LocatorStale {
                container_no: c.clone(),
                address,
            });
        }
    }
    Ok(())
}

impl OccupancyStore for InMemoryStore {
    #[inline]
    fn layout(&self) -> &YardLayout {
        &self.layout
    }

    fn get(&self, address: TierAddress) -> Result<Placement, EngineError> {
        let stack = lock(self.slot_cell(address.slot())?);
        stack
            .get(address.tier())
            .cloned()
            .ok_or(EngineError::tier_not_found(address))
    }

    fn list_by_slot(&self, slot: SlotId) -> Result<Vec<Placement>, EngineError> {
        let stack = lock(self.slot_cell(slot)?);
        Ok(stack.placements().to_vec())
    }

    fn apply_transition(
        &self,
        address: TierAddress,
        expected: PlacementStatus,
        transition: Transition,
    ) -> Result<Placement, EngineError> {
        let mut stack = lock(self.slot_cell(address.slot())?);
        let name = transition.name();
        let indexed = stack
            .get(address.tier())
            .is_some_and(|current| transition.touches_locator(current));

        // Anonymous holds and their releases never see the locator lock.
        let (placement, updates) = if indexed {
            let mut locator = lock(&self.locator);
            let (placement, updates) =
                stack.apply(address.tier(), expected, transition, &locator)?;
            locator.apply_all(&updates);
            (placement, updates.len())
        } else {
            let (placement, updates) =
                stack.apply(address.tier(), expected, transition, &LocatorIndex::new())?;
            debug_assert!(updates.is_empty());
            (placement, updates.len())
        };
        trace!(%address, transition = name, indexed, updates, "Applied transition");
        Ok(placement)
    }

    #[inline]
    fn locate(&self, container_no: &ContainerNo) -> Option<TierAddress> {
        lock(&self.locator).get(container_no)
    }

    fn rebuild_locator(&self) -> usize {
        let (stacks, mut locator) = self.lock_all();
        *locator = LocatorIndex::rebuild_from(stacks.iter().flat_map(|s| s.placements()));
        locator.len()
    }
}
