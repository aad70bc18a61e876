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

use crate::placement::Placement;
use std::{collections::HashMap, fmt::Display};
use yard_stack_core::prelude::*;

/// A change to the container → tier index implied by a placement transition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocatorUpdate {
    Bind {
        container_no: ContainerNo,
        address: TierAddress,
    },
    Unbind {
        container_no: ContainerNo,
    },
}

impl Display for LocatorUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocatorUpdate::Bind {
                container_no,
                address,
            } => write!(f, "Bind({} -> {})", container_no, address),
            LocatorUpdate::Unbind { container_no } => write!(f, "Unbind({})", container_no),
        }
    }
}

/// Reverse index from container number to its current tier.
///
/// Derived state: it can always be rebuilt from the placements it indexes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatorIndex {
    entries: HashMap<ContainerNo, TierAddress>,
}

impl LocatorIndex {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes every non-empty placement that carries a container number.
    pub fn rebuild_from<'p, I>(placements: I) -> Self
    where
        I: IntoIterator<Item = &'p Placement>,
    {
        let entries = placements
            .into_iter()
            .filter(|p| !p.is_empty())
            .filter_map(|p| p.container_no().map(|c| (c.clone(), p.address())))
            .collect();
        Self { entries }
    }

    #[inline]
    pub fn get(&self, container_no: &ContainerNo) -> Option<TierAddress> {
        self.entries.get(container_no).copied()
    }

    #[inline]
    pub fn contains(&self, container_no: &ContainerNo) -> bool {
        self.entries.contains_key(container_no)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&ContainerNo, TierAddress)> + '_ {
        self.entries.iter().map(|(c, a)| (c, *a))
    }

    #[inline]
    pub fn apply(&mut self, update: &LocatorUpdate) {
        match update {
            LocatorUpdate::Bind {
                container_no,
                address,
            } => {
                self.entries.insert(container_no.clone(), *address);
            }
            LocatorUpdate::Unbind { container_no } => {
                self.entries.remove(container_no);
            }
        }
    }

    #[inline]
    pub fn apply_all<'u, I>(&mut self, updates: I)
    where
        I: IntoIterator<Item = &'u LocatorUpdate>,
    {
        for u in updates {
            self.apply(u);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(s: &str) -> ContainerNo {
        ContainerNo::parse(s).unwrap()
    }

    fn addr(slot: u32, tier: u8) -> TierAddress {
        TierAddress::new(SlotId::new(slot), Tier::new(tier).unwrap())
    }

    #[test]
    fn test_bind_and_unbind() {
        let mut idx = LocatorIndex::new();
        idx.apply(&LocatorUpdate::Bind {
            container_no: c("A1"),
            address: addr(1, 1),
        });
        assert_eq!(idx.get(&c("a1")), Some(addr(1, 1)));
        assert_eq!(idx.len(), 1);

        idx.apply(&LocatorUpdate::Unbind {
            container_no: c("A1"),
        });
        assert!(idx.is_empty());
        // unbinding twice is harmless
        idx.apply(&LocatorUpdate::Unbind {
            container_no: c("A1"),
        });
        assert!(idx.is_empty());
    }

    #[test]
    fn test_rebuild_skips_empty_and_anonymous_holds() {
        let mut occupied = Placement::empty(addr(1, 1));
        occupied.set_held(None, None, Timestamp::default());
        occupied.set_occupied(c("OCC"), Timestamp::default());

        let mut anonymous = Placement::empty(addr(1, 2));
        anonymous.set_held(None, None, Timestamp::default());

        let mut provisional = Placement::empty(addr(2, 1));
        provisional.set_held(Some(c("PROV")), None, Timestamp::default());

        let empty = Placement::empty(addr(3, 1));

        let idx = LocatorIndex::rebuild_from([&occupied, &anonymous, &provisional, &empty]);
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.get(&c("OCC")), Some(addr(1, 1)));
        assert_eq!(idx.get(&c("PROV")), Some(addr(2, 1)));
    }
}
