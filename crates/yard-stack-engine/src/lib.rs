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

//! # Yard Stacking Engine (`yard-stack-engine`)
//!
//! Tracks the occupancy of every tier in a [`yard_stack_model::yard::YardLayout`]
//! and drives the hold → confirm → release/remove lifecycle on top of it.
//!
//! - [`store::OccupancyStore`] is the authoritative state. [`store::InMemoryStore`]
//!   keeps one lock per slot next to the [`locator::LocatorIndex`] and commits
//!   every [`stack::Transition`] as a compare-and-set.
//! - [`lifecycle::PlacementController`] enforces the stacking rules and the
//!   global uniqueness of container numbers.
//! - [`suggest::SuggestionEngine`] ranks holdable tiers, [`stackmap::StackMap`]
//!   projects the whole yard for dashboards.
//! - [`engine::YardEngine`] bundles all of it behind one facade.

pub mod config;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod locator;
pub mod placement;
pub mod snapshot;
pub mod stack;
pub mod stackmap;
pub mod store;
pub mod suggest;

pub mod prelude {
    pub use crate::config::{EngineConfig, HoldConfig, ScoringConfig};
    pub use crate::engine::YardEngine;
    pub use crate::error::{
        BlockedByStackError, ConflictError, DuplicateContainerError, EngineError, ErrorKind,
        InvalidStateError, NotFoundError, SlotFullError, StatusMismatch,
    };
    pub use crate::lifecycle::{HoldRequest, PlacementController};
    pub use crate::locator::LocatorIndex;
    pub use crate::placement::{Placement, PlacementStatus};
    pub use crate::snapshot::{RestoreError, StoreSnapshot};
    pub use crate::stack::{SlotStack, Transition, next_eligible_tier};
    pub use crate::stackmap::{BlockView, OccupancyCounts, SlotView, StackMap, YardView};
    pub use crate::store::{InMemoryStore, InvariantViolation, OccupancyStore};
    pub use crate::suggest::{Approach, SuggestRequest, Suggestion, SuggestionEngine};
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use static_assertions::assert_impl_all;

    assert_impl_all!(EngineError: std::error::Error, Send, Sync, Clone);
    assert_impl_all!(InvariantViolation: std::error::Error, Send, Sync);
    assert_impl_all!(RestoreError: std::error::Error, Send, Sync);
    assert_impl_all!(StackMap: Send, Sync, Clone);
    assert_impl_all!(Placement: Send, Sync, Clone);
}
