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

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use yard_stack_core::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlacementStatus {
    Empty,
    Held,
    Occupied,
}

impl PlacementStatus {
    #[inline]
    pub fn is_empty(self) -> bool {
        self == PlacementStatus::Empty
    }
}

impl Display for PlacementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PlacementStatus::Empty => "EMPTY",
            PlacementStatus::Held => "HELD",
            PlacementStatus::Occupied => "OCCUPIED",
        };
        f.write_str(s)
    }
}

/// Occupancy record of one (slot, tier) pair.
///
/// Placements are never deleted. Vacating a tier resets its record to
/// [`PlacementStatus::Empty`] so it can be reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    address: TierAddress,
    status: PlacementStatus,
    container_no: Option<ContainerNo>,
    held_by: Option<String>,
    held_at: Option<Timestamp>,
    occupied_at: Option<Timestamp>,
}

impl Placement {
    #[inline]
    pub fn empty(address: TierAddress) -> Self {
        Self {
            address,
            status: PlacementStatus::Empty,
            container_no: None,
            held_by: None,
            held_at: None,
            occupied_at: None,
        }
    }

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
    pub fn status(&self) -> PlacementStatus {
        self.status
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.status.is_empty()
    }

    /// The bound container. Always present when occupied, optional while held.
    #[inline]
    pub fn container_no(&self) -> Option<&ContainerNo> {
        self.container_no.as_ref()
    }

    #[inline]
    pub fn held_by(&self) -> Option<&str> {
        self.held_by.as_deref()
    }

    #[inline]
    pub fn held_at(&self) -> Option<Timestamp> {
        self.held_at
    }

    #[inline]
    pub fn occupied_at(&self) -> Option<Timestamp> {
        self.occupied_at
    }

    pub(crate) fn set_held(
        &mut self,
        container_no: Option<ContainerNo>,
        held_by: Option<String>,
        at: Timestamp,
    ) {
        self.status = PlacementStatus::Held;
        self.container_no = container_no;
        self.held_by = held_by;
        self.held_at = Some(at);
        self.occupied_at = None;
    }

    pub(crate) fn set_occupied(&mut self, container_no: ContainerNo, at: Timestamp) {
        self.status = PlacementStatus::Occupied;
        self.container_no = Some(container_no);
        self.occupied_at = Some(at);
    }

    pub(crate) fn reset(&mut self) {
        *self = Placement::empty(self.address);
    }
}

impl Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.container_no {
            Some(c) => write!(f, "Placement({}, {}, {})", self.address, self.status, c),
            None => write!(f, "Placement({}, {})", self.address, self.status),
        }
    }
}
