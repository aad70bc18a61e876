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
    config::ScoringConfig,
    stack::{next_eligible_tier, stack_height},
    store::OccupancyStore,
};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::HashMap};
use yard_stack_core::prelude::*;
use yard_stack_model::prelude::*;

/// Side of the block rows from which equipment arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Approach {
    #[default]
    RowStart,
    RowEnd,
}

/// Constraints and hints for a placement suggestion. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestRequest {
    /// The container to place. Its current slot, if any, is never suggested.
    pub container_no: Option<ContainerNo>,
    pub size: Option<ContainerSize>,
    /// Reefers are only offered slots with power.
    pub reefer: bool,
    pub preferred_blocks: Vec<BlockId>,
    /// Containers of the same customer or line the new one should sit near.
    pub co_locate_with: Vec<ContainerNo>,
    pub approach: Approach,
    /// Overrides the configured `top_k`.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    address: TierAddress,
    block: BlockId,
    score: f64,
}

impl Suggestion {
    #[inline]
    pub fn address(&self) -> TierAddress {
        self.address
    }

    #[inline]
    pub fn slot(&self) -> SlotId {
        self.address.slot()
    }

    #[inline]
    pub fn tier(&self) -> Tier {
        self.address.tier()
    }

    #[inline]
    pub fn block(&self) -> BlockId {
        self.block
    }

    #[inline]
    pub fn score(&self) -> f64 {
        self.score
    }
}

impl std::fmt::Display for Suggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Suggestion({}, {}, {:.3})", self.address, self.block, self.score)
    }
}

/// Ranks the tiers a container could be held on right now.
///
/// Only slots whose next eligible tier exists are considered, so every
/// suggestion is holdable at the time it is computed. The engine never
/// mutates the store.
#[derive(Debug)]
pub struct SuggestionEngine<'a, S> {
    store: &'a S,
    config: &'a ScoringConfig,
}

struct Ranked {
    suggestion: Suggestion,
    row: u32,
    col: u32,
}

impl<'a, S: OccupancyStore> SuggestionEngine<'a, S> {
    #[inline]
    pub fn new(store: &'a S, config: &'a ScoringConfig) -> Self {
        Self { store, config }
    }

    pub fn suggest(&self, request: &SuggestRequest) -> Vec<Suggestion> {
        let layout = self.store.layout();
        let limit = request.limit.unwrap_or(self.config.top_k);
        if limit == 0 {
            return Vec::new();
        }

        let max_row = layout.max_row_index();
        let col_span = f64::from(layout.max_col_index()) + 1.0;
        let current_slot = request
            .container_no
            .as_ref()
            .and_then(|c| self.store.locate(c))
            .map(|a| a.slot());
        let (related, related_total) = self.related_blocks(&request.co_locate_with);

        let mut ranked: Vec<Ranked> = layout
            .slots()
            .filter(|s| Some(s.id()) != current_slot)
            .filter(|s| request.size.is_none_or(|size| s.size() == size))
            .filter(|s| !request.reefer || s.reefer())
            .filter_map(|slot| {
                let placements = self.store.list_by_slot(slot.id()).ok()?;
                let tier = next_eligible_tier(&placements)?;

                let row = match request.approach {
                    Approach::RowStart => slot.row_index(),
                    Approach::RowEnd => max_row - slot.row_index(),
                };
                let access = f64::from(row) + f64::from(slot.col_index()) / col_span;
                // Below one column step, so it only reorders slots at the same (row, col).
                let fill = stack_height(&placements) as f64 / placements.len() as f64 / col_span;

                let mut score =
                    -self.config.access_weight * access - self.config.height_weight * fill;
                if request.preferred_blocks.contains(&slot.block_id()) {
                    score += self.config.preferred_block_bonus;
                }
                if related_total > 0
                    && let Some(&n) = related.get(&slot.block_id())
                {
                    score += self.config.co_location_bonus * n as f64 / related_total as f64;
                }

                Some(Ranked {
                    suggestion: Suggestion {
                        address: TierAddress::new(slot.id(), tier),
                        block: slot.block_id(),
                        score,
                    },
                    row: slot.row_index(),
                    col: slot.col_index(),
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.suggestion
                .score
                .partial_cmp(&a.suggestion.score)
                .unwrap_or(Ordering::Equal)
                .then(a.row.cmp(&b.row))
                .then(a.col.cmp(&b.col))
                .then(a.suggestion.slot().cmp(&b.suggestion.slot()))
        });
        ranked.truncate(limit);
        ranked.into_iter().map(|r| r.suggestion).collect()
    }

    fn related_blocks(&self, containers: &[ContainerNo]) -> (HashMap<BlockId, usize>, usize) {
        let layout = self.store.layout();
        let mut blocks = HashMap::new();
        let mut total = 0;
        for c in containers {
            let Some(block) = self
                .store
                .locate(c)
                .and_then(|a| layout.slot(a.slot()))
                .map(Slot::block_id)
            else {
                continue;
            };
            *blocks.entry(block).or_insert(0) += 1;
            total += 1;
        }
        (blocks, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lifecycle::PlacementController, store::InMemoryStore};

    fn c(s: &str) -> ContainerNo {
        ContainerNo::parse(s).unwrap()
    }

    fn sid(v: u32) -> SlotId {
        SlotId::new(v)
    }

    const A: BlockId = BlockId::new(1);
    const B: BlockId = BlockId::new(2);

    // Block A: 1 (r0 c0), 2 (r0 c1), 3 (r1 c0). Block B: 4 (r0 c0), 5 (r2 c0, 40ft reefer).
    fn store() -> InMemoryStore {
        let cap = TierCapacity::new(2).unwrap();
        let mut b = YardLayoutBuilder::new();
        b.add_yard(Yard::new(YardId::new(1), "Main")).unwrap();
        b.add_block(Block::new(A, "A", YardId::new(1))).unwrap();
        b.add_block(Block::new(B, "B", YardId::new(1))).unwrap();
        b.add_slot(Slot::new(sid(1), "01", A, "A", 0, 0, cap)).unwrap();
        b.add_slot(Slot::new(sid(2), "02", A, "A", 0, 1, cap)).unwrap();
        b.add_slot(Slot::new(sid(3), "03", A, "B", 1, 0, cap)).unwrap();
        b.add_slot(Slot::new(sid(4), "01", B, "A", 0, 0, cap)).unwrap();
        b.add_slot(
            Slot::new(sid(5), "02", B, "C", 2, 0, cap)
                .with_size(ContainerSize::Forty)
                .with_reefer(true),
        )
        .unwrap();
        InMemoryStore::new(b.build())
    }

    fn slots(suggestions: &[Suggestion]) -> Vec<u32> {
        suggestions.iter().map(|s| s.slot().value()).collect()
    }

    fn all() -> SuggestRequest {
        SuggestRequest {
            limit: Some(10),
            ..SuggestRequest::default()
        }
    }

    #[test]
    fn test_empty_yard_sorted_by_row_then_col() {
        let s = store();
        let cfg = ScoringConfig::default();
        let out = SuggestionEngine::new(&s, &cfg).suggest(&all());
        assert_eq!(slots(&out), vec![1, 4, 2, 3, 5]);
        assert!(out.iter().all(|x| x.tier() == Tier::BOTTOM));
        assert!(out.windows(2).all(|w| w[0].score() >= w[1].score()));
    }

    #[test]
    fn test_default_limit_is_top_k() {
        let s = store();
        let cfg = ScoringConfig {
            top_k: 2,
            ..ScoringConfig::default()
        };
        let engine = SuggestionEngine::new(&s, &cfg);
        assert_eq!(engine.suggest(&SuggestRequest::default()).len(), 2);

        let none = SuggestRequest {
            limit: Some(0),
            ..SuggestRequest::default()
        };
        assert!(engine.suggest(&none).is_empty());
    }

    #[test]
    fn test_full_yard_returns_empty() {
        let s = store();
        let k = ManualClock::default();
        let ctl = PlacementController::new(&s, &k);
        for slot in 1..=5 {
            for n in 0..2 {
                ctl.assign(c(&format!("F{slot}-{n}")), sid(slot)).unwrap();
            }
        }
        let cfg = ScoringConfig::default();
        assert!(SuggestionEngine::new(&s, &cfg).suggest(&all()).is_empty());
    }

    #[test]
    fn test_fuller_stacks_rank_lower() {
        let s = store();
        let k = ManualClock::default();
        PlacementController::new(&s, &k)
            .assign(c("LOW"), sid(1))
            .unwrap();
        let cfg = ScoringConfig::default();
        let out = SuggestionEngine::new(&s, &cfg).suggest(&all());
        assert_eq!(slots(&out), vec![4, 1, 2, 3, 5]);
        assert_eq!(out[1].tier(), Tier::new(2).unwrap());
    }

    #[test]
    fn test_partly_filled_yard_keeps_row_col_order() {
        let cap = TierCapacity::new(5).unwrap();
        let mut b = YardLayoutBuilder::new();
        b.add_yard(Yard::new(YardId::new(1), "Main")).unwrap();
        b.add_block(Block::new(A, "A", YardId::new(1))).unwrap();
        for row in 0..2u32 {
            for col in 0..10u32 {
                let id = sid(row * 10 + col + 1);
                b.add_slot(Slot::new(id, format!("{row}{col:02}"), A, "A", row, col, cap))
                    .unwrap();
            }
        }
        let s = InMemoryStore::new(b.build());
        let k = ManualClock::default();
        let ctl = PlacementController::new(&s, &k);
        for n in 0..4 {
            ctl.assign(c(&format!("TALL{n}")), sid(1)).unwrap();
        }
        ctl.assign(c("MID"), sid(12)).unwrap();

        let cfg = ScoringConfig::default();
        let request = SuggestRequest {
            limit: Some(20),
            ..SuggestRequest::default()
        };
        let out = SuggestionEngine::new(&s, &cfg).suggest(&request);
        assert_eq!(slots(&out), (1..=20).collect::<Vec<_>>());
        assert_eq!(out[0].tier(), Tier::new(5).unwrap());
    }

    #[test]
    fn test_preferred_block_ranks_first() {
        let s = store();
        let cfg = ScoringConfig::default();
        let request = SuggestRequest {
            preferred_blocks: vec![B],
            ..all()
        };
        let out = SuggestionEngine::new(&s, &cfg).suggest(&request);
        assert_eq!(out[0].slot(), sid(4));
        assert_eq!(out[0].block(), B);
    }

    #[test]
    fn test_co_location_pulls_towards_related_block() {
        let s = store();
        let k = ManualClock::default();
        PlacementController::new(&s, &k)
            .assign(c("REL1"), sid(4))
            .unwrap();
        let cfg = ScoringConfig::default();
        let request = SuggestRequest {
            co_locate_with: vec![c("REL1"), c("UNKNOWN")],
            ..all()
        };
        let out = SuggestionEngine::new(&s, &cfg).suggest(&request);
        assert_eq!(out[0].slot(), sid(4));
        assert_eq!(out[0].tier(), Tier::new(2).unwrap());
    }

    #[test]
    fn test_size_and_reefer_filters() {
        let s = store();
        let cfg = ScoringConfig::default();
        let engine = SuggestionEngine::new(&s, &cfg);

        let forty = SuggestRequest {
            size: Some(ContainerSize::Forty),
            ..all()
        };
        assert_eq!(slots(&engine.suggest(&forty)), vec![5]);

        let reefer = SuggestRequest {
            reefer: true,
            ..all()
        };
        assert_eq!(slots(&engine.suggest(&reefer)), vec![5]);

        let twenty = SuggestRequest {
            size: Some(ContainerSize::Twenty),
            ..all()
        };
        assert_eq!(slots(&engine.suggest(&twenty)), vec![1, 4, 2, 3]);
    }

    #[test]
    fn test_row_end_approach_flips_rows() {
        let s = store();
        let cfg = ScoringConfig::default();
        let request = SuggestRequest {
            approach: Approach::RowEnd,
            ..all()
        };
        let out = SuggestionEngine::new(&s, &cfg).suggest(&request);
        assert_eq!(slots(&out), vec![5, 3, 1, 4, 2]);
    }

    #[test]
    fn test_current_slot_of_container_is_skipped() {
        let s = store();
        let k = ManualClock::default();
        PlacementController::new(&s, &k)
            .assign(c("MOVE"), sid(1))
            .unwrap();
        let cfg = ScoringConfig::default();
        let request = SuggestRequest {
            container_no: Some(c("MOVE")),
            ..all()
        };
        let out = SuggestionEngine::new(&s, &cfg).suggest(&request);
        assert!(!slots(&out).contains(&1));
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let r: SuggestRequest =
            serde_json::from_str(r#"{ "reefer": true, "approach": "RowEnd" }"#).unwrap();
        assert!(r.reefer);
        assert_eq!(r.approach, Approach::RowEnd);
        assert!(r.limit.is_none());
        assert!(r.preferred_blocks.is_empty());
    }
}
