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
    error::{EngineError, SlotFullError},
    placement::{Placement, PlacementStatus},
    stack::{Transition, next_eligible_tier},
    store::OccupancyStore,
};
use std::time::Duration;
use tracing::{debug, warn};
use yard_stack_core::prelude::*;

/// Parameters of a hold. Without a tier the lowest eligible tier is chosen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoldRequest {
    tier: Option<Tier>,
    container_no: Option<ContainerNo>,
    held_by: Option<String>,
}

impl HoldRequest {
    #[inline]
    pub fn auto() -> Self {
        Self::default()
    }

    #[inline]
    pub fn at(tier: Tier) -> Self {
        Self {
            tier: Some(tier),
            ..Self::default()
        }
    }

    /// Reserves the tier for a known container; the number is indexed while held.
    #[inline]
    pub fn for_container(mut self, container_no: ContainerNo) -> Self {
        self.container_no = Some(container_no);
        self
    }

    #[inline]
    pub fn by(mut self, holder: impl Into<String>) -> Self {
        self.held_by = Some(holder.into());
        self
    }

    #[inline]
    pub fn tier(&self) -> Option<Tier> {
        self.tier
    }

    #[inline]
    pub fn container_no(&self) -> Option<&ContainerNo> {
        self.container_no.as_ref()
    }

    #[inline]
    pub fn held_by(&self) -> Option<&str> {
        self.held_by.as_deref()
    }
}

#[inline]
fn logged<T>(op: &'static str, result: Result<T, EngineError>) -> Result<T, EngineError> {
    if let Err(e) = &result {
        warn!(op, kind = %e.kind(), retryable = e.is_retryable(), error = %e, "Rejected");
    }
    result
}

/// Drives the hold → confirm → release/remove protocol over a store.
///
/// Each operation reads the current state to report caller mistakes as
/// `InvalidState`/`SlotFull`, then commits through the store's
/// compare-and-set. Losing a race in between surfaces as `Conflict`.
#[derive(Debug)]
pub struct PlacementController<'s, S, K> {
    store: &'s S,
    clock: &'s K,
}

impl<'s, S, K> PlacementController<'s, S, K>
where
    S: OccupancyStore,
    K: Clock,
{
    #[inline]
    pub fn new(store: &'s S, clock: &'s K) -> Self {
        Self { store, clock }
    }

    #[inline]
    pub fn store(&self) -> &'s S {
        self.store
    }

    pub fn hold(&self, slot: SlotId, request: HoldRequest) -> Result<TierAddress, EngineError> {
        logged("hold", self.try_hold(slot, request))
    }

    fn try_hold(&self, slot: SlotId, request: HoldRequest) -> Result<TierAddress, EngineError> {
        let capacity = self
            .store
            .layout()
            .slot(slot)
            .ok_or(EngineError::slot_not_found(slot))?
            .tier_capacity();
        let placements = self.store.list_by_slot(slot)?;
        let next = next_eligible_tier(&placements);

        let tier = match request.tier {
            None => next.ok_or(SlotFullError::new(slot, capacity))?,
            Some(tier) => {
                let address = TierAddress::new(slot, tier);
                let current = placements
                    .get(tier.index())
                    .ok_or(EngineError::tier_not_found(address))?;
                if next.is_none() {
                    return Err(SlotFullError::new(slot, capacity).into());
                }
                // Someone else got there first.
                if !current.is_empty() {
                    return Err(EngineError::status_changed(
                        address,
                        PlacementStatus::Empty,
                        current.status(),
                    ));
                }
                tier
            }
        };

        let address = TierAddress::new(slot, tier);
        let placement = self.store.apply_transition(
            address,
            PlacementStatus::Empty,
            Transition::Hold {
                container_no: request.container_no,
                held_by: request.held_by,
                at: self.clock.now(),
            },
        )?;
        debug!(%address, container = ?placement.container_no().map(ContainerNo::as_str), "Held tier");
        Ok(address)
    }

    pub fn confirm(
        &self,
        address: TierAddress,
        container_no: ContainerNo,
    ) -> Result<Placement, EngineError> {
        logged("confirm", self.try_confirm(address, container_no))
    }

    fn try_confirm(
        &self,
        address: TierAddress,
        container_no: ContainerNo,
    ) -> Result<Placement, EngineError> {
        let current = self.store.get(address)?;
        if current.status() != PlacementStatus::Held {
            return Err(EngineError::wrong_status(
                address,
                PlacementStatus::Held,
                current.status(),
            ));
        }
        let placement = self.store.apply_transition(
            address,
            PlacementStatus::Held,
            Transition::Confirm {
                container_no,
                at: self.clock.now(),
            },
        )?;
        debug!(%address, container = ?placement.container_no().map(ContainerNo::as_str), "Confirmed placement");
        Ok(placement)
    }

    pub fn release(&self, address: TierAddress) -> Result<Placement, EngineError> {
        logged("release", self.try_release(address))
    }

    fn try_release(&self, address: TierAddress) -> Result<Placement, EngineError> {
        let current = self.store.get(address)?;
        if current.status() != PlacementStatus::Held {
            return Err(EngineError::wrong_status(
                address,
                PlacementStatus::Held,
                current.status(),
            ));
        }
        let placement =
            self.store
                .apply_transition(address, PlacementStatus::Held, Transition::Release)?;
        debug!(%address, "Released hold");
        Ok(placement)
    }

    /// Vacates the tier holding `container_no`. Only the top of a stack can be removed.
    pub fn remove_by_container(&self, container_no: &ContainerNo) -> Result<Placement, EngineError> {
        logged("remove_by_container", self.try_remove(container_no))
    }

    fn try_remove(&self, container_no: &ContainerNo) -> Result<Placement, EngineError> {
        let address = self
            .store
            .locate(container_no)
            .ok_or_else(|| EngineError::container_not_found(container_no.clone()))?;
        let current = self.store.get(address)?;
        if current.status() != PlacementStatus::Occupied {
            return Err(EngineError::wrong_status(
                address,
                PlacementStatus::Occupied,
                current.status(),
            ));
        }
        let placement = self.store.apply_transition(
            address,
            PlacementStatus::Occupied,
            Transition::Remove {
                container_no: container_no.clone(),
            },
        )?;
        debug!(%address, container = container_no.as_str(), "Removed container");
        Ok(placement)
    }

    /// Hold on the lowest eligible tier and confirm in one call.
    ///
    /// The hold already reserves `container_no`, so a duplicate is rejected
    /// before any tier is taken. If the confirm still fails, the hold is
    /// released again when it is still ours.
    pub fn assign(&self, container_no: ContainerNo, slot: SlotId) -> Result<Placement, EngineError> {
        let address = self.hold(slot, HoldRequest::auto().for_container(container_no.clone()))?;
        match self.confirm(address, container_no.clone()) {
            Ok(p) => Ok(p),
            Err(e) => {
                let still_ours = self.store.get(address).is_ok_and(|p| {
                    p.status() == PlacementStatus::Held && p.container_no() == Some(&container_no)
                });
                if still_ours && let Err(release_err) = self.release(address) {
                    warn!(%address, error = %release_err, "Could not undo hold after failed assign");
                }
                Err(e)
            }
        }
    }

    /// Holds that are at least `max_age` old. Expiring them is left to the caller.
    pub fn stale_holds(&self, max_age: Duration) -> Vec<Placement> {
        let now = self.clock.now();
        self.store
            .layout()
            .slots()
            .filter_map(|s| self.store.list_by_slot(s.id()).ok())
            .flatten()
            .filter(|p| p.status() == PlacementStatus::Held)
            .filter(|p| p.held_at().is_some_and(|at| now.saturating_since(at) >= max_age))
            .collect()
    }
}
