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
    placement::Placement,
    stack::SlotStack,
    store::{InMemoryStore, InvariantViolation, OccupancyStore, verify_stacks},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display, sync::Mutex};
use tracing::info;
use yard_stack_core::prelude::*;
use yard_stack_model::prelude::*;

/// Point-in-time copy of a store: the layout plus every non-empty placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub taken_at: Timestamp,
    pub layout: YardLayout,
    pub placements: Vec<Placement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreError {
    /// A placement references a slot or tier the layout does not have.
    UnknownAddress(TierAddress),
    /// Two placements were recorded for the same tier.
    DuplicateAddress(TierAddress),
    Invariant(InvariantViolation),
}

impl Display for RestoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestoreError::UnknownAddress(a) => write!(f, "Snapshot references unknown tier {}", a),
            RestoreError::DuplicateAddress(a) => {
                write!(f, "Snapshot records tier {} more than once", a)
            }
            RestoreError::Invariant(e) => write!(f, "Snapshot is inconsistent: {e}"),
        }
    }
}

impl std::error::Error for RestoreError {}

impl From<InvariantViolation> for RestoreError {
    fn from(e: InvariantViolation) -> Self {
        RestoreError::Invariant(e)
    }
}

impl InMemoryStore {
    /// Copies all non-empty placements under a single consistent lock of the whole store.
    pub fn snapshot(&self, taken_at: Timestamp) -> StoreSnapshot {
        let (stacks, _locator) = self.lock_all();
        let placements = stacks
            .iter()
            .flat_map(|s| s.placements())
            .filter(|p| !p.is_empty())
            .cloned()
            .collect();
        StoreSnapshot {
            taken_at,
            layout: self.layout().clone(),
            placements,
        }
    }

    /// Rebuilds a store from a snapshot.
    ///
    /// The locator is recomputed by full scan, then every invariant is checked.
    pub fn restore(snapshot: StoreSnapshot) -> Result<Self, RestoreError> {
        let StoreSnapshot {
            taken_at,
            layout,
            placements,
        } = snapshot;

        let mut stacks: BTreeMap<SlotId, SlotStack> = layout
            .slots()
            .map(|s| (s.id(), SlotStack::new(s.id(), s.tier_capacity())))
            .collect();

        let restored = placements.len();
        for p in placements {
            let address = p.address();
            let stack = stacks
                .get_mut(&address.slot())
                .ok_or(RestoreError::UnknownAddress(address))?;
            match stack.get(address.tier()) {
                None => return Err(RestoreError::UnknownAddress(address)),
                Some(existing) if !existing.is_empty() => {
                    return Err(RestoreError::DuplicateAddress(address));
                }
                Some(_) => {}
            }
            stack
                .restore(p)
                .map_err(|_: EngineError| RestoreError::UnknownAddress(address))?;
        }

        let locator = LocatorIndex::rebuild_from(stacks.values().flat_map(|s| s.placements()));
        verify_stacks(stacks.values(), &locator)?;

        info!(
            placements = restored,
            indexed = locator.len(),
            %taken_at,
            "Restored occupancy store from snapshot"
        );

        Ok(Self::from_parts(
            layout,
            stacks
                .into_iter()
                .map(|(id, s)| (id, Mutex::new(s)))
                .collect(),
            locator,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{placement::PlacementStatus, stack::Transition};

    fn t(v: u8) -> Tier {
        Tier::new(v).unwrap()
    }

    fn c(s: &str) -> ContainerNo {
        ContainerNo::parse(s).unwrap()
    }

    fn addr(slot: u32, tier: u8) -> TierAddress {
        TierAddress::new(SlotId::new(slot), t(tier))
    }

    fn layout() -> YardLayout {
        let mut b = YardLayoutBuilder::new();
        b.add_yard(Yard::new(YardId::new(1), "Main")).unwrap();
        b.add_block(Block::new(BlockId::new(1), "A", YardId::new(1)))
            .unwrap();
        b.add_slot(Slot::new(
            SlotId::new(1),
            "01",
            BlockId::new(1),
            "A",
            0,
            0,
            TierCapacity::new(3).unwrap(),
        ))
        .unwrap();
        b.build()
    }

    fn occupied_store() -> InMemoryStore {
        let store = InMemoryStore::new(layout());
        store
            .apply_transition(
                addr(1, 1),
                PlacementStatus::Empty,
                Transition::Hold {
                    container_no: None,
                    held_by: Some("gate".into()),
                    at: Timestamp::from_millis(5),
                },
            )
            .unwrap();
        store
            .apply_transition(
                addr(1, 1),
                PlacementStatus::Held,
                Transition::Confirm {
                    container_no: c("C1"),
                    at: Timestamp::from_millis(6),
                },
            )
            .unwrap();
        store
            .apply_transition(
                addr(1, 2),
                PlacementStatus::Empty,
                Transition::Hold {
                    container_no: Some(c("C2")),
                    held_by: None,
                    at: Timestamp::from_millis(7),
                },
            )
            .unwrap();
        store
    }

    #[test]
    fn test_snapshot_json_restore_preserves_state() {
        let store = occupied_store();
        let snap = store.snapshot(Timestamp::from_millis(100));
        assert_eq!(snap.placements.len(), 2);

        let json = serde_json::to_string(&snap).unwrap();
        let back: StoreSnapshot = serde_json::from_str(&json).unwrap();
        let restored = InMemoryStore::restore(back).unwrap();

        assert_eq!(restored.locate(&c("C1")), Some(addr(1, 1)));
        assert_eq!(restored.locate(&c("C2")), Some(addr(1, 2)));
        assert_eq!(
            restored.list_by_slot(SlotId::new(1)).unwrap(),
            store.list_by_slot(SlotId::new(1)).unwrap()
        );
        assert!(restored.verify().is_ok());
    }

    #[test]
    fn test_restore_rejects_floating_container() {
        let store = occupied_store();
        let mut snap = store.snapshot(Timestamp::default());
        snap.placements.retain(|p| p.tier() != t(1));
        assert_eq!(
            InMemoryStore::restore(snap).unwrap_err(),
            RestoreError::Invariant(InvariantViolation::Gap(SlotId::new(1)))
        );
    }

    #[test]
    fn test_restore_rejects_unknown_and_duplicate_addresses() {
        let store = occupied_store();

        let mut snap = store.snapshot(Timestamp::default());
        let mut stray = snap.placements[0].clone();
        stray.set_held(None, None, Timestamp::default());
        snap.placements.push(stray);
        assert_eq!(
            InMemoryStore::restore(snap).unwrap_err(),
            RestoreError::DuplicateAddress(addr(1, 1))
        );

        let mut snap = store.snapshot(Timestamp::default());
        let mut foreign = Placement::empty(addr(42, 1));
        foreign.set_held(None, None, Timestamp::default());
        snap.placements.push(foreign);
        assert_eq!(
            InMemoryStore::restore(snap).unwrap_err(),
            RestoreError::UnknownAddress(addr(42, 1))
        );
    }
}
