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
    error::{
        BlockedByStackError, ConflictError, DuplicateContainerError, EngineError,
        InvalidStateError,
    },
    locator::{LocatorIndex, LocatorUpdate},
    placement::{Placement, PlacementStatus},
};
use std::fmt::Display;
use yard_stack_core::prelude::*;

/// The lowest tier a new container may go to, or `None` if the stack is full.
///
/// Only the contiguous run of non-empty tiers from the ground counts, so a
/// tier above an empty one is never offered.
///
/// # Examples
///
/// ```
/// use yard_stack_core::prelude::*;
/// use yard_stack_engine::{placement::Placement, stack::next_eligible_tier};
///
/// let slot = SlotId::new(1);
/// let stack: Vec<_> = TierCapacity::new(3)
///     .unwrap()
///     .tiers()
///     .map(|t| Placement::empty(TierAddress::new(slot, t)))
///     .collect();
/// assert_eq!(next_eligible_tier(&stack), Some(Tier::BOTTOM));
/// ```
#[inline]
pub fn next_eligible_tier(placements: &[Placement]) -> Option<Tier> {
    let height = stack_height(placements);
    if height < placements.len() {
        Tier::from_index(height)
    } else {
        None
    }
}

/// Number of non-empty tiers counted upwards from the ground until the first empty one.
#[inline]
pub fn stack_height(placements: &[Placement]) -> usize {
    placements.iter().take_while(|p| !p.is_empty()).count()
}

/// The highest non-empty placement of the stack.
#[inline]
pub fn top_of_stack(placements: &[Placement]) -> Option<&Placement> {
    placements.iter().rev().find(|p| !p.is_empty())
}

/// `true` if no non-empty tier floats above an empty one.
#[inline]
pub fn is_contiguous(placements: &[Placement]) -> bool {
    placements
        .iter()
        .skip_while(|p| !p.is_empty())
        .all(Placement::is_empty)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// EMPTY → HELD, optionally reserving the tier for a known container.
    Hold {
        container_no: Option<ContainerNo>,
        held_by: Option<String>,
        at: Timestamp,
    },
    /// HELD → OCCUPIED.
    Confirm {
        container_no: ContainerNo,
        at: Timestamp,
    },
    /// HELD → EMPTY.
    Release,
    /// OCCUPIED → EMPTY. Carries the container so a moved container is detected.
    Remove { container_no: ContainerNo },
}

impl Transition {
    #[inline]
    pub fn source(&self) -> PlacementStatus {
        match self {
            Transition::Hold { .. } => PlacementStatus::Empty,
            Transition::Confirm { .. } | Transition::Release => PlacementStatus::Held,
            Transition::Remove { .. } => PlacementStatus::Occupied,
        }
    }

    #[inline]
    pub fn target(&self) -> PlacementStatus {
        match self {
            Transition::Hold { .. } => PlacementStatus::Held,
            Transition::Confirm { .. } => PlacementStatus::Occupied,
            Transition::Release | Transition::Remove { .. } => PlacementStatus::Empty,
        }
    }

    /// Whether applying this transition to `current` reads or writes the locator.
    #[inline]
    pub fn touches_locator(&self, current: &Placement) -> bool {
        match self {
            Transition::Hold { container_no, .. } => container_no.is_some(),
            Transition::Confirm { .. } | Transition::Remove { .. } => true,
            Transition::Release => current.container_no().is_some(),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Hold { .. } => "hold",
            Transition::Confirm { .. } => "confirm",
            Transition::Release => "release",
            Transition::Remove { .. } => "remove",
        }
    }
}

impl Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({} -> {})", self.name(), self.source(), self.target())
    }
}

/// The placements of one slot, indexed by `tier - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotStack {
    slot: SlotId,
    capacity: TierCapacity,
    placements: Box<[Placement]>,
}

impl SlotStack {
    pub fn new(slot: SlotId, capacity: TierCapacity) -> Self {
        let placements = capacity
            .tiers()
            .map(|t| Placement::empty(TierAddress::new(slot, t)))
            .collect();
        Self {
            slot,
            capacity,
            placements,
        }
    }

    #[inline]
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    #[inline]
    pub fn capacity(&self) -> TierCapacity {
        self.capacity
    }

    #[inline]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    #[inline]
    pub fn get(&self, tier: Tier) -> Option<&Placement> {
        self.placements.get(tier.index())
    }

    #[inline]
    pub fn next_eligible_tier(&self) -> Option<Tier> {
        next_eligible_tier(&self.placements)
    }

    #[inline]
    pub fn height(&self) -> usize {
        stack_height(&self.placements)
    }

    /// Overwrites one tier with a restored record. Invariants are checked by the caller.
    pub(crate) fn restore(&mut self, placement: Placement) -> Result<(), EngineError> {
        let address = placement.address();
        if address.slot() != self.slot {
            return Err(EngineError::tier_not_found(address));
        }
        let cell = self
            .placements
            .get_mut(address.tier().index())
            .ok_or(EngineError::tier_not_found(address))?;
        *cell = placement;
        Ok(())
    }

    /// Compare-and-set transition of a single tier.
    ///
    /// The current status must equal `expected` and `expected` must be the
    /// transition's source status. Stacking order and container uniqueness are
    /// validated against this stack and `locator` before anything is mutated.
    /// On success the updated placement and the locator updates it implies are
    /// returned; applying them to the index is the caller's job.
    pub fn apply(
        &mut self,
        tier: Tier,
        expected: PlacementStatus,
        transition: Transition,
        locator: &LocatorIndex,
    ) -> Result<(Placement, Vec<LocatorUpdate>), EngineError> {
        let address = TierAddress::new(self.slot, tier);
        if !self.capacity.contains(tier) {
            return Err(EngineError::tier_not_found(address));
        }
        if expected != transition.source() {
            return Err(EngineError::wrong_status(
                address,
                transition.source(),
                expected,
            ));
        }

        let i = tier.index();
        let actual = self.placements[i].status();
        if actual != expected {
            return Err(EngineError::status_changed(address, expected, actual));
        }

        match &transition {
            Transition::Hold { .. } => {
                if let Some(below) = tier.below()
                    && self.placements[below.index()].is_empty()
                {
                    return Err(InvalidStateError::EmptyBelow {
                        address,
                        empty: below,
                    }
                    .into());
                }
            }
            Transition::Release | Transition::Remove { .. } => {
                if let Some(above) = self.placements.get(i + 1)
                    && !above.is_empty()
                {
                    return Err(BlockedByStackError::new(address, above.tier()).into());
                }
            }
            Transition::Confirm { .. } => {}
        }

        let mut updates = Vec::with_capacity(2);
        let placement = &mut self.placements[i];
        match transition {
            Transition::Hold {
                container_no,
                held_by,
                at,
            } => {
                if let Some(c) = &container_no {
                    if let Some(existing) = locator.get(c) {
                        return Err(DuplicateContainerError::new(c.clone(), existing).into());
                    }
                    updates.push(LocatorUpdate::Bind {
                        container_no: c.clone(),
                        address,
                    });
                }
                placement.set_held(container_no, held_by, at);
            }
            Transition::Confirm { container_no, at } => {
                if let Some(existing) = locator.get(&container_no)
                    && existing != address
                {
                    return Err(DuplicateContainerError::new(container_no, existing).into());
                }
                if let Some(provisional) = placement.container_no()
                    && *provisional != container_no
                {
                    updates.push(LocatorUpdate::Unbind {
                        container_no: provisional.clone(),
                    });
                }
                updates.push(LocatorUpdate::Bind {
                    container_no: container_no.clone(),
                    address,
                });
                placement.set_occupied(container_no, at);
            }
            Transition::Release => {
                if let Some(c) = placement.container_no() {
                    updates.push(LocatorUpdate::Unbind {
                        container_no: c.clone(),
                    });
                }
                placement.reset();
            }
            Transition::Remove { container_no } => {
                if placement.container_no() != Some(&container_no) {
                    return Err(ConflictError::ContainerMoved {
                        container_no,
                        address,
                    }
                    .into());
                }
                updates.push(LocatorUpdate::Unbind { container_no });
                placement.reset();
            }
        }

        Ok((placement.clone(), updates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, InvalidStateError};

    const SLOT: SlotId = SlotId::new(1);

    fn t(v: u8) -> Tier {
        Tier::new(v).unwrap()
    }

    fn c(s: &str) -> ContainerNo {
        ContainerNo::parse(s).unwrap()
    }

    fn stack(cap: u8) -> SlotStack {
        SlotStack::new(SLOT, TierCapacity::new(cap).unwrap())
    }

    fn hold(container: Option<&str>) -> Transition {
        Transition::Hold {
            container_no: container.map(c),
            held_by: None,
            at: Timestamp::from_millis(1),
        }
    }

    fn confirm(container: &str) -> Transition {
        Transition::Confirm {
            container_no: c(container),
            at: Timestamp::from_millis(2),
        }
    }

    /// Applies a transition and keeps `idx` in sync, like the store does.
    fn run(
        s: &mut SlotStack,
        idx: &mut LocatorIndex,
        tier: u8,
        tr: Transition,
    ) -> Result<Placement, EngineError> {
        let (p, updates) = s.apply(t(tier), tr.source(), tr, idx)?;
        idx.apply_all(&updates);
        Ok(p)
    }

    #[test]
    fn test_pure_helpers_on_empty_and_full_stack() {
        let mut s = stack(2);
        let mut idx = LocatorIndex::new();
        assert_eq!(s.next_eligible_tier(), Some(t(1)));
        assert_eq!(s.height(), 0);
        assert!(top_of_stack(s.placements()).is_none());

        run(&mut s, &mut idx, 1, hold(None)).unwrap();
        run(&mut s, &mut idx, 2, hold(None)).unwrap();
        assert_eq!(s.next_eligible_tier(), None);
        assert_eq!(s.height(), 2);
        assert_eq!(top_of_stack(s.placements()).unwrap().tier(), t(2));
        assert!(is_contiguous(s.placements()));
    }

    #[test]
    fn test_is_contiguous_detects_floating_tier() {
        let mut placements: Vec<_> = (1..=3)
            .map(|v| Placement::empty(TierAddress::new(SLOT, t(v))))
            .collect();
        placements[1].set_held(None, None, Timestamp::default());
        assert!(!is_contiguous(&placements));
        assert_eq!(stack_height(&placements), 0);
        assert_eq!(next_eligible_tier(&placements), Some(t(1)));
    }

    #[test]
    fn test_hold_above_empty_tier_is_invalid() {
        let mut s = stack(3);
        let idx = LocatorIndex::new();
        let err = s
            .apply(t(2), PlacementStatus::Empty, hold(None), &idx)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidState(InvalidStateError::EmptyBelow {
                address: TierAddress::new(SLOT, t(2)),
                empty: t(1),
            })
        );
        assert!(s.placements().iter().all(Placement::is_empty));
    }

    #[test]
    fn test_cas_mismatch_is_conflict() {
        let mut s = stack(3);
        let mut idx = LocatorIndex::new();
        run(&mut s, &mut idx, 1, hold(None)).unwrap();
        let err = s
            .apply(t(1), PlacementStatus::Empty, hold(None), &idx)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_expected_must_match_transition_source() {
        let mut s = stack(3);
        let idx = LocatorIndex::new();
        let err = s
            .apply(t(1), PlacementStatus::Empty, confirm("C1"), &idx)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_out_of_range_tier_is_not_found() {
        let mut s = stack(2);
        let idx = LocatorIndex::new();
        let err = s
            .apply(t(3), PlacementStatus::Empty, hold(None), &idx)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_confirm_binds_and_remove_unbinds() {
        let mut s = stack(3);
        let mut idx = LocatorIndex::new();
        run(&mut s, &mut idx, 1, hold(None)).unwrap();
        let p = run(&mut s, &mut idx, 1, confirm("C1")).unwrap();
        assert_eq!(p.status(), PlacementStatus::Occupied);
        assert_eq!(idx.get(&c("C1")), Some(TierAddress::new(SLOT, t(1))));

        let p = run(
            &mut s,
            &mut idx,
            1,
            Transition::Remove {
                container_no: c("C1"),
            },
        )
        .unwrap();
        assert!(p.is_empty());
        assert!(p.container_no().is_none());
        assert!(idx.is_empty());
    }

    #[test]
    fn test_confirm_rebinds_provisional_number() {
        let mut s = stack(3);
        let mut idx = LocatorIndex::new();
        run(&mut s, &mut idx, 1, hold(Some("PROV"))).unwrap();
        assert!(idx.contains(&c("PROV")));

        run(&mut s, &mut idx, 1, confirm("REAL")).unwrap();
        assert!(!idx.contains(&c("PROV")));
        assert_eq!(idx.get(&c("REAL")), Some(TierAddress::new(SLOT, t(1))));
    }

    #[test]
    fn test_duplicate_container_rejected_without_mutation() {
        let mut s = stack(3);
        let mut idx = LocatorIndex::new();
        run(&mut s, &mut idx, 1, hold(Some("C1"))).unwrap();
        run(&mut s, &mut idx, 2, hold(None)).unwrap();

        let err = run(&mut s, &mut idx, 2, confirm("C1")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateContainer);
        assert_eq!(s.get(t(2)).unwrap().status(), PlacementStatus::Held);

        let err = run(&mut s, &mut idx, 3, hold(Some("C1"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateContainer);
        assert!(s.get(t(3)).unwrap().is_empty());
    }

    #[test]
    fn test_vacating_below_a_stack_is_blocked() {
        let mut s = stack(3);
        let mut idx = LocatorIndex::new();
        run(&mut s, &mut idx, 1, hold(None)).unwrap();
        run(&mut s, &mut idx, 1, confirm("LOW")).unwrap();
        run(&mut s, &mut idx, 2, hold(None)).unwrap();

        let err = run(
            &mut s,
            &mut idx,
            1,
            Transition::Remove {
                container_no: c("LOW"),
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::BlockedByStack(BlockedByStackError::new(
                TierAddress::new(SLOT, t(1)),
                t(2)
            ))
        );
        assert!(idx.contains(&c("LOW")));
    }

    #[test]
    fn test_remove_with_wrong_container_is_conflict() {
        let mut s = stack(2);
        let mut idx = LocatorIndex::new();
        run(&mut s, &mut idx, 1, hold(None)).unwrap();
        run(&mut s, &mut idx, 1, confirm("A")).unwrap();
        let err = run(
            &mut s,
            &mut idx,
            1,
            Transition::Remove {
                container_no: c("B"),
            },
        )
        .unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_touches_locator_only_when_a_number_is_involved() {
        let held = Placement::empty(TierAddress::new(SLOT, t(1)));
        assert!(!hold(None).touches_locator(&held));
        assert!(hold(Some("A")).touches_locator(&held));
        assert!(confirm("A").touches_locator(&held));
        assert!(!Transition::Release.touches_locator(&held));

        let mut s = stack(2);
        let mut idx = LocatorIndex::new();
        let p = run(&mut s, &mut idx, 1, hold(Some("PROV"))).unwrap();
        assert!(Transition::Release.touches_locator(&p));
        assert!(
            Transition::Remove {
                container_no: c("PROV")
            }
            .touches_locator(&p)
        );
    }
}
