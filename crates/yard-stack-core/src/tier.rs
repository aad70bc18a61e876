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

use crate::id::SlotId;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Highest stack any slot may be configured for.
pub const MAX_TIER_CAPACITY: u8 = 9;

/// A vertical position within a slot. Tiers are 1-based, tier 1 sits on the ground.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tier(u8);

impl Tier {
    pub const BOTTOM: Tier = Tier(1);

    /// Creates a tier, rejecting the invalid tier `0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use yard_stack_core::tier::Tier;
    ///
    /// assert_eq!(Tier::new(1), Some(Tier::BOTTOM));
    /// assert_eq!(Tier::new(0), None);
    /// ```
    #[inline]
    pub const fn new(value: u8) -> Option<Self> {
        if value == 0 { None } else { Some(Tier(value)) }
    }

    /// Tier for a zero-based stack index.
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index)
            .ok()
            .and_then(|i| i.checked_add(1))
            .map(Tier)
    }

    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Zero-based position of this tier in a stack.
    #[inline]
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    #[inline]
    pub fn above(self) -> Option<Self> {
        self.0.checked_add(1).map(Tier)
    }

    #[inline]
    pub fn below(self) -> Option<Self> {
        Tier::new(self.0 - 1)
    }

    #[inline]
    pub const fn is_bottom(self) -> bool {
        self.0 == 1
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvalidTierError(u8);

impl InvalidTierError {
    #[inline]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Display for InvalidTierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tier {} is invalid, tiers start at 1", self.0)
    }
}

impl std::error::Error for InvalidTierError {}

impl TryFrom<u8> for Tier {
    type Error = InvalidTierError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Tier::new(value).ok_or(InvalidTierError(value))
    }
}

impl From<Tier> for u8 {
    fn from(value: Tier) -> Self {
        value.0
    }
}

/// Maximum stack height of a slot, in `1..=MAX_TIER_CAPACITY`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TierCapacity(u8);

impl TierCapacity {
    #[inline]
    pub const fn new(value: u8) -> Option<Self> {
        if value == 0 || value > MAX_TIER_CAPACITY {
            None
        } else {
            Some(TierCapacity(value))
        }
    }

    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn contains(self, tier: Tier) -> bool {
        tier.0 <= self.0
    }

    /// The highest tier of a full stack.
    #[inline]
    pub const fn top(self) -> Tier {
        Tier(self.0)
    }

    /// Tiers from the ground up.
    #[inline]
    pub fn tiers(self) -> impl DoubleEndedIterator<Item = Tier> + ExactSizeIterator {
        (1..=self.0).map(Tier)
    }
}

impl Display for TierCapacity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TierCapacity({})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvalidTierCapacityError(u8);

impl InvalidTierCapacityError {
    #[inline]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Display for InvalidTierCapacityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tier capacity {} is outside 1..={}",
            self.0, MAX_TIER_CAPACITY
        )
    }
}

impl std::error::Error for InvalidTierCapacityError {}

impl TryFrom<u8> for TierCapacity {
    type Error = InvalidTierCapacityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        TierCapacity::new(value).ok_or(InvalidTierCapacityError(value))
    }
}

impl From<TierCapacity> for u8 {
    fn from(value: TierCapacity) -> Self {
        value.0
    }
}

/// The (slot, tier) key every placement lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TierAddress {
    slot: SlotId,
    tier: Tier,
}

impl TierAddress {
    #[inline]
    pub const fn new(slot: SlotId, tier: Tier) -> Self {
        Self { slot, tier }
    }

    #[inline]
    pub const fn slot(&self) -> SlotId {
        self.slot
    }

    #[inline]
    pub const fn tier(&self) -> Tier {
        self.tier
    }
}

impl Display for TierAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.slot, self.tier)
    }
}
