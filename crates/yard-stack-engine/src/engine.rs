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
    config::EngineConfig,
    error::EngineError,
    lifecycle::{HoldRequest, PlacementController},
    placement::Placement,
    stackmap::StackMap,
    store::{InMemoryStore, OccupancyStore},
    suggest::{SuggestRequest, Suggestion, SuggestionEngine},
};
use tracing::{debug, instrument};
use yard_stack_core::prelude::*;
use yard_stack_model::prelude::*;

/// Entry point for collaborators: every yard operation over one store.
///
/// The engine is `Sync` whenever its store and clock are, so a single
/// instance can serve concurrent callers.
#[derive(Debug)]
pub struct YardEngine<S, K> {
    store: S,
    clock: K,
    config: EngineConfig,
}

impl YardEngine<InMemoryStore, SystemClock> {
    pub fn in_memory(layout: YardLayout, config: EngineConfig) -> Self {
        Self::new(InMemoryStore::new(layout), SystemClock, config)
    }
}

impl<S, K> YardEngine<S, K>
where
    S: OccupancyStore,
    K: Clock,
{
    pub fn new(store: S, clock: K, config: EngineConfig) -> Self {
        debug!(slots = store.layout().slot_count(), "Starting yard engine");
        Self {
            store,
            clock,
            config,
        }
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[inline]
    pub fn clock(&self) -> &K {
        &self.clock
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn layout(&self) -> &YardLayout {
        self.store.layout()
    }

    #[inline]
    fn controller(&self) -> PlacementController<'_, S, K> {
        PlacementController::new(&self.store, &self.clock)
    }

    #[instrument(level = "debug", skip_all)]
    pub fn stack_map(&self) -> StackMap {
        StackMap::project(&self.store, self.clock.now())
    }

    #[instrument(level = "debug", skip_all, fields(container = container_no.as_str()))]
    pub fn locate(&self, container_no: &ContainerNo) -> Result<TierAddress, EngineError> {
        self.store
            .locate(container_no)
            .ok_or_else(|| EngineError::container_not_found(container_no.clone()))
    }

    #[instrument(level = "debug", skip_all, fields(%slot))]
    pub fn stack_slot(&self, slot: SlotId) -> Result<Vec<Placement>, EngineError> {
        self.store.list_by_slot(slot)
    }

    #[instrument(level = "debug", skip_all, fields(%slot, tier = ?request.tier()))]
    pub fn hold(&self, slot: SlotId, request: HoldRequest) -> Result<TierAddress, EngineError> {
        self.controller().hold(slot, request)
    }

    #[instrument(level = "debug", skip_all, fields(%address, container = container_no.as_str()))]
    pub fn confirm(
        &self,
        address: TierAddress,
        container_no: ContainerNo,
    ) -> Result<Placement, EngineError> {
        self.controller().confirm(address, container_no)
    }

    #[instrument(level = "debug", skip_all, fields(%address))]
    pub fn release(&self, address: TierAddress) -> Result<Placement, EngineError> {
        self.controller().release(address)
    }

    #[instrument(level = "debug", skip_all, fields(container = container_no.as_str()))]
    pub fn remove_by_container(&self, container_no: &ContainerNo) -> Result<Placement, EngineError> {
        self.controller().remove_by_container(container_no)
    }

    #[instrument(level = "debug", skip_all)]
    pub fn suggest(&self, request: &SuggestRequest) -> Vec<Suggestion> {
        SuggestionEngine::new(&self.store, &self.config.scoring).suggest(request)
    }

    #[instrument(level = "debug", skip_all, fields(container = container_no.as_str(), %slot))]
    pub fn assign(&self, container_no: ContainerNo, slot: SlotId) -> Result<Placement, EngineError> {
        self.controller().assign(container_no, slot)
    }

    /// Holds older than the configured `stale_after_ms`.
    pub fn stale_holds(&self) -> Vec<Placement> {
        self.controller().stale_holds(self.config.holds.stale_after())
    }

    #[inline]
    pub fn display_location(&self, address: TierAddress) -> Option<String> {
        self.store.layout().display_location(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::HoldConfig, error::ErrorKind, placement::PlacementStatus};
    use rayon::prelude::*;
    use static_assertions::assert_impl_all;
    use std::time::Duration;

    assert_impl_all!(YardEngine<InMemoryStore, SystemClock>: Send, Sync);
    assert_impl_all!(YardEngine<std::sync::Arc<InMemoryStore>, ManualClock>: Send, Sync);

    fn c(s: &str) -> ContainerNo {
        ContainerNo::parse(s).unwrap()
    }

    fn layout(slots: u32, cap: u8) -> YardLayout {
        let mut b = YardLayoutBuilder::new();
        b.add_yard(Yard::new(YardId::new(1), "North")).unwrap();
        b.add_block(Block::new(BlockId::new(1), "B", YardId::new(1)))
            .unwrap();
        for i in 0..slots {
            b.add_slot(Slot::new(
                SlotId::new(i + 1),
                format!("{:02}", i + 1),
                BlockId::new(1),
                "A",
                i / 4,
                i % 4,
                TierCapacity::new(cap).unwrap(),
            ))
            .unwrap();
        }
        b.build()
    }

    fn engine(slots: u32, cap: u8) -> YardEngine<InMemoryStore, ManualClock> {
        YardEngine::new(
            InMemoryStore::new(layout(slots, cap)),
            ManualClock::new(Timestamp::from_millis(10_000)),
            EngineConfig::default(),
        )
    }

    #[test]
    fn test_staged_flow_through_facade() {
        let e = engine(2, 3);
        let best = e.suggest(&SuggestRequest::default())[0];
        let address = e.hold(best.slot(), HoldRequest::auto().by("gate")).unwrap();
        assert_eq!(address, best.address());

        e.confirm(address, c("MSCU1234567")).unwrap();
        assert_eq!(e.locate(&c("MSCU1234567")).unwrap(), address);
        assert_eq!(
            e.display_location(address).as_deref(),
            Some("North/B-01-T1")
        );

        let stack = e.stack_slot(address.slot()).unwrap();
        assert_eq!(stack[0].status(), PlacementStatus::Occupied);
        assert_eq!(stack[0].held_by(), Some("gate"));
        assert_eq!(e.stack_map().counts().occupied(), 1);

        e.remove_by_container(&c("MSCU1234567")).unwrap();
        assert_eq!(
            e.locate(&c("MSCU1234567")).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_unknown_slot_is_not_found() {
        let e = engine(1, 1);
        assert_eq!(
            e.stack_slot(SlotId::new(7)).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert!(
            e.display_location(TierAddress::new(SlotId::new(1), Tier::new(2).unwrap()))
                .is_none()
        );
    }

    #[test]
    fn test_stale_holds_follow_config() {
        let e = YardEngine::new(
            InMemoryStore::new(layout(2, 1)),
            ManualClock::default(),
            EngineConfig {
                holds: HoldConfig {
                    stale_after_ms: 1_000,
                },
                ..EngineConfig::default()
            },
        );
        let a = e.hold(SlotId::new(1), HoldRequest::auto()).unwrap();
        assert!(e.stale_holds().is_empty());

        e.clock().advance(Duration::from_millis(1_000));
        let stale = e.stale_holds();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].address(), a);

        e.release(a).unwrap();
        assert!(e.stale_holds().is_empty());
    }

    #[test]
    fn test_parallel_mixed_workload_keeps_invariants() {
        let e = engine(8, 3);
        (0..200u32).into_par_iter().for_each(|i| {
            let slot = SlotId::new(i % 8 + 1);
            let container = c(&format!("W{}", i % 40));
            match i % 4 {
                0 | 1 => {
                    let _ = e.assign(container, slot);
                }
                2 => {
                    let _ = e.remove_by_container(&container);
                }
                _ => {
                    let suggestions = e.suggest(&SuggestRequest::default());
                    assert!(suggestions.len() <= e.config().scoring.top_k);
                }
            }
        });

        assert!(e.store().verify().is_ok());
        let map = e.stack_map();
        assert_eq!(map.counts().held(), 0);
        assert_eq!(map.counts().occupied(), e.store().locator_len());
        assert_eq!(map.counts().total(), 24);
    }
}
