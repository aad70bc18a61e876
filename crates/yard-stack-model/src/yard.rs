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
    err::{DuplicateCodeError, LayoutBuildError, UnknownParentError},
    layout::{Block, Slot, Yard},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display};
use yard_stack_core::prelude::*;

/// Flat, serializable description of a layout. Validated through [`YardLayoutBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayoutDefinition {
    pub yards: Vec<Yard>,
    pub blocks: Vec<Block>,
    pub slots: Vec<Slot>,
}

/// The validated Yard → Block → Slot hierarchy.
///
/// The layout is immutable once built; occupancy lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LayoutDefinition", into = "LayoutDefinition")]
pub struct YardLayout {
    yards: BTreeMap<YardId, Yard>,
    blocks: BTreeMap<BlockId, Block>,
    slots: BTreeMap<SlotId, Slot>,
    blocks_by_yard: BTreeMap<YardId, Vec<BlockId>>,
    /// Slots of each block ordered by `(row_index, col_index, id)`.
    slots_by_block: BTreeMap<BlockId, Vec<SlotId>>,
    max_row_index: u32,
    max_col_index: u32,
}

impl YardLayout {
    #[inline]
    pub fn builder() -> YardLayoutBuilder {
        YardLayoutBuilder::new()
    }

    #[inline]
    pub fn yard(&self, id: YardId) -> Option<&Yard> {
        self.yards.get(&id)
    }

    #[inline]
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    #[inline]
    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.get(&id)
    }

    #[inline]
    pub fn yards(&self) -> impl Iterator<Item = &Yard> + '_ {
        self.yards.values()
    }

    #[inline]
    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks.values()
    }

    /// All slots in ascending id order.
    #[inline]
    pub fn slots(&self) -> impl Iterator<Item = &Slot> + '_ {
        self.slots.values()
    }

    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn blocks_of(&self, yard: YardId) -> impl Iterator<Item = &Block> + '_ {
        self.blocks_by_yard
            .get(&yard)
            .into_iter()
            .flatten()
            .filter_map(|id| self.blocks.get(id))
    }

    #[inline]
    pub fn slots_of(&self, block: BlockId) -> impl Iterator<Item = &Slot> + '_ {
        self.slots_by_block
            .get(&block)
            .into_iter()
            .flatten()
            .filter_map(|id| self.slots.get(id))
    }

    #[inline]
    pub fn block_of(&self, slot: SlotId) -> Option<&Block> {
        self.slots
            .get(&slot)
            .and_then(|s| self.blocks.get(&s.block_id()))
    }

    #[inline]
    pub fn yard_of(&self, slot: SlotId) -> Option<&Yard> {
        self.block_of(slot)
            .and_then(|b| self.yards.get(&b.yard_id()))
    }

    pub fn slot_by_code(&self, yard: YardId, block_code: &str, slot_code: &str) -> Option<&Slot> {
        let block = self.blocks_of(yard).find(|b| b.code() == block_code)?;
        self.slots_of(block.id()).find(|s| s.code() == slot_code)
    }

    #[inline]
    pub fn max_row_index(&self) -> u32 {
        self.max_row_index
    }

    #[inline]
    pub fn max_col_index(&self) -> u32 {
        self.max_col_index
    }

    /// Human readable location, e.g. `"North/B-07-T2"`.
    pub fn display_location(&self, address: TierAddress) -> Option<String> {
        let slot = self.slots.get(&address.slot())?;
        if !slot.tier_capacity().contains(address.tier()) {
            return None;
        }
        let block = self.blocks.get(&slot.block_id())?;
        let yard = self.yards.get(&block.yard_id())?;
        Some(format!(
            "{}/{}-{}-T{}",
            yard.name(),
            block.code(),
            slot.code(),
            address.tier().value()
        ))
    }
}

impl Display for YardLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "YardLayout: {} yards, {} blocks, {} slots",
            self.yards.len(),
            self.blocks.len(),
            self.slots.len()
        )?;
        for yard in self.yards.values() {
            writeln!(f, "  {}", yard)?;
            for block in self.blocks_of(yard.id()) {
                writeln!(f, "    {} ({} slots)", block, self.slots_of(block.id()).count())?;
            }
        }
        Ok(())
    }
}

impl From<YardLayout> for LayoutDefinition {
    fn from(layout: YardLayout) -> Self {
        LayoutDefinition {
            yards: layout.yards.into_values().collect(),
            blocks: layout.blocks.into_values().collect(),
            slots: layout.slots.into_values().collect(),
        }
    }
}

impl TryFrom<LayoutDefinition> for YardLayout {
    type Error = LayoutBuildError;

    fn try_from(def: LayoutDefinition) -> Result<Self, Self::Error> {
        let mut b = YardLayoutBuilder::new();
        for yard in def.yards {
            b.add_yard(yard)?;
        }
        for block in def.blocks {
            b.add_block(block)?;
        }
        for slot in def.slots {
            b.add_slot(slot)?;
        }
        Ok(b.build())
    }
}

/// Incremental, validating constructor for [`YardLayout`].
///
/// Parents must be added before their children.
#[derive(Debug, Clone, Default)]
pub struct YardLayoutBuilder {
    yards: BTreeMap<YardId, Yard>,
    blocks: BTreeMap<BlockId, Block>,
    slots: BTreeMap<SlotId, Slot>,
}

impl YardLayoutBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_yard(&mut self, yard: Yard) -> Result<&mut Self, LayoutBuildError> {
        if yard.name().trim().is_empty() {
            return Err(LayoutBuildError::EmptyCode);
        }
        if self.yards.contains_key(&yard.id()) {
            return Err(LayoutBuildError::DuplicateYardId(yard.id()));
        }
        self.yards.insert(yard.id(), yard);
        Ok(self)
    }

    pub fn add_block(&mut self, block: Block) -> Result<&mut Self, LayoutBuildError> {
        if block.code().trim().is_empty() {
            return Err(LayoutBuildError::EmptyCode);
        }
        if self.blocks.contains_key(&block.id()) {
            return Err(LayoutBuildError::DuplicateBlockId(block.id()));
        }
        if !self.yards.contains_key(&block.yard_id()) {
            return Err(LayoutBuildError::UnknownYard(UnknownParentError::new(
                block.id(),
                block.yard_id(),
            )));
        }
        if self
            .blocks
            .values()
            .any(|b| b.yard_id() == block.yard_id() && b.code() == block.code())
        {
            return Err(LayoutBuildError::DuplicateBlockCode(DuplicateCodeError::new(
                block.yard_id(),
                block.code(),
            )));
        }
        self.blocks.insert(block.id(), block);
        Ok(self)
    }

    pub fn add_slot(&mut self, slot: Slot) -> Result<&mut Self, LayoutBuildError> {
        if slot.code().trim().is_empty() {
            return Err(LayoutBuildError::EmptyCode);
        }
        if self.slots.contains_key(&slot.id()) {
            return Err(LayoutBuildError::DuplicateSlotId(slot.id()));
        }
        if !self.blocks.contains_key(&slot.block_id()) {
            return Err(LayoutBuildError::UnknownBlock(UnknownParentError::new(
                slot.id(),
                slot.block_id(),
            )));
        }
        if self
            .slots
            .values()
            .any(|s| s.block_id() == slot.block_id() && s.code() == slot.code())
        {
            return Err(LayoutBuildError::DuplicateSlotCode(DuplicateCodeError::new(
                slot.block_id(),
                slot.code(),
            )));
        }
        self.slots.insert(slot.id(), slot);
        Ok(self)
    }

    #[must_use]
    pub fn build(&self) -> YardLayout {
        let mut blocks_by_yard: BTreeMap<YardId, Vec<BlockId>> =
            self.yards.keys().map(|id| (*id, Vec::new())).collect();
        for block in self.blocks.values() {
            blocks_by_yard
                .entry(block.yard_id())
                .or_default()
                .push(block.id());
        }

        let mut slots_by_block: BTreeMap<BlockId, Vec<SlotId>> =
            self.blocks.keys().map(|id| (*id, Vec::new())).collect();
        for slot in self.slots.values() {
            slots_by_block
                .entry(slot.block_id())
                .or_default()
                .push(slot.id());
        }
        for ids in slots_by_block.values_mut() {
            ids.sort_by_key(|id| {
                let s = &self.slots[id];
                (s.row_index(), s.col_index(), s.id())
            });
        }

        YardLayout {
            yards: self.yards.clone(),
            blocks: self.blocks.clone(),
            slots: self.slots.clone(),
            blocks_by_yard,
            slots_by_block,
            max_row_index: self.slots.values().map(Slot::row_index).max().unwrap_or(0),
            max_col_index: self.slots.values().map(Slot::col_index).max().unwrap_or(0),
        }
    }
}
