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

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Yard {
    id: YardId,
    name: String,
}

impl Yard {
    #[inline]
    pub fn new(id: YardId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    #[inline]
    pub fn id(&self) -> YardId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for Yard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Yard({}, {})", self.id.value(), self.name)
    }
}

/// A row or zone within a yard. The code is unique within its yard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    id: BlockId,
    code: String,
    yard_id: YardId,
}

impl Block {
    #[inline]
    pub fn new(id: BlockId, code: impl Into<String>, yard_id: YardId) -> Self {
        Self {
            id,
            code: code.into(),
            yard_id,
        }
    }

    #[inline]
    pub fn id(&self) -> BlockId {
        self.id
    }

    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[inline]
    pub fn yard_id(&self) -> YardId {
        self.yard_id
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Block({}, {})", self.id.value(), self.code)
    }
}

/// Container footprint a slot is laid out for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerSize {
    #[default]
    Twenty,
    Forty,
    FortyFive,
}

impl ContainerSize {
    #[inline]
    pub const fn feet(self) -> u8 {
        match self {
            ContainerSize::Twenty => 20,
            ContainerSize::Forty => 40,
            ContainerSize::FortyFive => 45,
        }
    }
}

impl Display for ContainerSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ft", self.feet())
    }
}

/// An addressable footprint within a block where containers stack vertically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    id: SlotId,
    code: String,
    block_id: BlockId,
    row_label: String,
    row_index: u32,
    col_index: u32,
    tier_capacity: TierCapacity,
    size: ContainerSize,
    reefer: bool,
}

impl Slot {
    #[inline]
    pub fn new(
        id: SlotId,
        code: impl Into<String>,
        block_id: BlockId,
        row_label: impl Into<String>,
        row_index: u32,
        col_index: u32,
        tier_capacity: TierCapacity,
    ) -> Self {
        Self {
            id,
            code: code.into(),
            block_id,
            row_label: row_label.into(),
            row_index,
            col_index,
            tier_capacity,
            size: ContainerSize::default(),
            reefer: false,
        }
    }

    #[inline]
    pub fn with_size(mut self, size: ContainerSize) -> Self {
        self.size = size;
        self
    }

    #[inline]
    pub fn with_reefer(mut self, reefer: bool) -> Self {
        self.reefer = reefer;
        self
    }

    #[inline]
    pub fn id(&self) -> SlotId {
        self.id
    }

    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[inline]
    pub fn block_id(&self) -> BlockId {
        self.block_id
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
    pub fn tier_capacity(&self) -> TierCapacity {
        self.tier_capacity
    }

    #[inline]
    pub fn size(&self) -> ContainerSize {
        self.size
    }

    #[inline]
    pub fn reefer(&self) -> bool {
        self.reefer
    }

    #[inline]
    pub fn address(&self, tier: Tier) -> Option<TierAddress> {
        self.tier_capacity
            .contains(tier)
            .then(|| TierAddress::new(self.id, tier))
    }
}

impl Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Slot({}, {}, row {} col {}, {} tiers, {})",
            self.id.value(),
            self.code,
            self.row_index,
            self.col_index,
            self.tier_capacity.value(),
            self.size
        )
    }
}
