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
    placement::{Placement, PlacementStatus},
    store::OccupancyStore,
};
use serde::{Deserialize, Serialize};
use yard_stack_core::prelude::*;
use yard_stack_model::prelude::*;

/// Tier counters of a slot, block, yard or the whole map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OccupancyCounts {
    occupied: usize,
    held: usize,
    free: usize,
}

impl OccupancyCounts {
    #[inline]
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    #[inline]
    pub fn held(&self) -> usize {
        self.held
    }

    #[inline]
    pub fn free(&self) -> usize {
        self.free
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.occupied + self.held + self.free
    }

    fn record(&mut self, status: PlacementStatus) {
        match status {
            PlacementStatus::Empty => self.free += 1,
            PlacementStatus::Held => self.held += 1,
            PlacementStatus::Occupied => self.occupied += 1,
        }
    }
}

impl std::ops::Add for OccupancyCounts {
    type Output = OccupancyCounts;

    fn add(self, rhs: Self) -> Self::Output {
        OccupancyCounts {
            occupied: self.occupied + rhs.occupied,
            held: self.held + rhs.held,
            free: self.free + rhs.free,
        }
    }
}

impl std::iter::Sum for OccupancyCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(OccupancyCounts::default(), |a, b| a + b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    slot: SlotId,
    code: String,
    row_label: String,
    row_index: u32,
    col_index: u32,
    size: ContainerSize,
    reefer: bool,
    placements: Vec<Placement>,
    counts: OccupancyCounts,
}

impl SlotView {
    fn new(slot: &Slot, placements: Vec<Placement>) -> Self {
        let mut counts = OccupancyCounts::default();
        for p in &placements {
            counts.record(p.status());
        }
        Self {
            slot: slot.id(),
            code: slot.code().to_owned(),
            row_label: slot.row_label().to_owned(),
            row_index: slot.row_index(),
            col_index: slot.col_index(),
            size: slot.size(),
            reefer: slot.reefer(),
            placements,
            counts,
        }
    }

    #[inline]
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[inline]
    pub fn row_label(&self) -> &str {
        &self.row_label
    }

    #[inline]
    pub fn row_index(&self) -> u32 {
        self.row_index
    }

    #[inline]
    pub fn col_index(&self) -> u32 {
        self.col_index
    }

    #[inline]
    pub fn size(&self) -> ContainerSize {
        self.size
    }

    #[inline]
    pub fn reefer(&self) -> bool {
        self.reefer
    }

    /// Bottom tier first.
    #[inline]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    #[inline]
    pub fn counts(&self) -> OccupancyCounts {
        self.counts
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockView {
    block: BlockId,
    code: String,
    slots: Vec<SlotView>,
    counts: OccupancyCounts,
}

impl BlockView {
    #[inline]
    pub fn block(&self) -> BlockId {
        self.block
    }

    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[inline]
    pub fn slots(&self) -> &[SlotView] {
        &self.slots
    }

    #[inline]
    pub fn counts(&self) -> OccupancyCounts {
        self.counts
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YardView {
    yard: YardId,
    name: String,
    blocks: Vec<BlockView>,
    counts: OccupancyCounts,
}

impl YardView {
    #[inline]
    pub fn yard(&self) -> YardId {
        self.yard
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn blocks(&self) -> &[BlockView] {
        &self.blocks
    }

    #[inline]
    pub fn counts(&self) -> OccupancyCounts {
        self.counts
    }
}

/// Dashboard view of the whole yard: yards, their blocks, their slots and
/// the placements of every tier.
///
/// Each slot is copied under its own lock, so the map is consistent per slot
/// but not across slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackMap {
    taken_at: Timestamp,
    yards: Vec<YardView>,
    counts: OccupancyCounts,
}

impl StackMap {
    pub fn project<S: OccupancyStore + ?Sized>(store: &S, taken_at: Timestamp) -> Self {
        let layout = store.layout();
        let yards: Vec<YardView> = layout
            .yards()
            .map(|yard| {
                let blocks: Vec<BlockView> = layout
                    .blocks_of(yard.id())
                    .map(|block| project_block(store, layout, block))
                    .collect();
                YardView {
                    yard: yard.id(),
                    name: yard.name().to_owned(),
                    counts: blocks.iter().map(BlockView::counts).sum(),
                    blocks,
                }
            })
            .collect();
        Self {
            taken_at,
            counts: yards.iter().map(YardView::counts).sum(),
            yards,
        }
    }

    #[inline]
    pub fn taken_at(&self) -> Timestamp {
        self.taken_at
    }

    #[inline]
    pub fn yards(&self) -> &[YardView] {
        &self.yards
    }

    #[inline]
    pub fn counts(&self) -> OccupancyCounts {
        self.counts
    }

    pub fn slot(&self, slot: SlotId) -> Option<&SlotView> {
        self.yards
            .iter()
            .flat_map(|y| &y.blocks)
            .flat_map(|b| &b.slots)
            .find(|s| s.slot == slot)
    }
}

fn project_block<S: OccupancyStore + ?Sized>(store: &S, layout: &YardLayout, block: &Block) -> BlockView {
    let slots: Vec<SlotView> = layout
        .slots_of(block.id())
        .filter_map(|slot| {
            let placements = store.list_by_slot(slot.id()).ok()?;
            Some(SlotView::new(slot, placements))
        })
        .collect();
    BlockView {
        block: block.id(),
        code: block.code().to_owned(),
        counts: slots.iter().map(SlotView::counts).sum(),
        slots,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lifecycle::{HoldRequest, PlacementController},
        store::InMemoryStore,
    };

    fn store() -> InMemoryStore {
        let mut b = YardLayoutBuilder::new();
        b.add_yard(Yard::new(YardId::new(1), "North")).unwrap();
        b.add_yard(Yard::new(YardId::new(2), "South")).unwrap();
        b.add_block(Block::new(BlockId::new(1), "A", YardId::new(1)))
            .unwrap();
        b.add_block(Block::new(BlockId::new(2), "B", YardId::new(2)))
            .unwrap();
        b.add_slot(Slot::new(SlotId::new(1), "01", BlockId::new(1), "A", 0, 0, TierCapacity::new(3).unwrap()))
            .unwrap();
        b.add_slot(Slot::new(SlotId::new(2), "02", BlockId::new(1), "A", 0, 1, TierCapacity::new(2).unwrap()))
            .unwrap();
        b.add_slot(Slot::new(SlotId::new(3), "01", BlockId::new(2), "A", 0, 0, TierCapacity::new(1).unwrap()))
            .unwrap();
        InMemoryStore::new(b.build())
    }

    #[test]
    fn test_counts_roll_up() {
        let s = store();
        let k = ManualClock::default();
        let ctl = PlacementController::new(&s, &k);
        ctl.assign(ContainerNo::parse("C1").unwrap(), SlotId::new(1))
            .unwrap();
        ctl.hold(SlotId::new(1), HoldRequest::auto()).unwrap();
        ctl.hold(SlotId::new(3), HoldRequest::auto()).unwrap();

        let map = StackMap::project(&s, Timestamp::from_millis(5));
        assert_eq!(map.taken_at(), Timestamp::from_millis(5));
        assert_eq!(map.counts().occupied(), 1);
        assert_eq!(map.counts().held(), 2);
        assert_eq!(map.counts().free(), 3);
        assert_eq!(map.counts().total(), 6);

        assert_eq!(map.yards().len(), 2);
        let north = &map.yards()[0];
        assert_eq!(north.name(), "North");
        assert_eq!(north.counts().total(), 5);
        assert_eq!(north.blocks()[0].slots().len(), 2);

        let s1 = map.slot(SlotId::new(1)).unwrap();
        assert_eq!(s1.placements().len(), 3);
        assert_eq!(s1.placements()[0].status(), PlacementStatus::Occupied);
        assert_eq!(s1.placements()[1].status(), PlacementStatus::Held);
        assert_eq!(s1.counts().free(), 1);
        assert!(map.slot(SlotId::new(9)).is_none());
    }

    #[test]
    fn test_serializes_to_json() {
        let s = store();
        let map = StackMap::project(&s, Timestamp::default());
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["counts"]["free"], 6);
        assert_eq!(json["yards"][1]["blocks"][0]["code"], "B");
        assert_eq!(
            json["yards"][0]["blocks"][0]["slots"][0]["placements"][0]["status"],
            "EMPTY"
        );
        let back: StackMap = serde_json::from_value(json).unwrap();
        assert_eq!(back, map);
    }
}
