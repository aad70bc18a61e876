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

//! # Yard Stacking Core (`yard-stack-core`)
//!
//! Addressing primitives shared by the layout model and the stacking engine.
//! A container position is always a [`tier::TierAddress`]: a slot plus a 1-based
//! tier counted from the ground.

pub mod container;
pub mod id;
pub mod tier;
pub mod time;

pub mod prelude {
    pub use crate::container::{ContainerNo, InvalidContainerNoError};
    pub use crate::id::{BlockId, SlotId, YardId};
    pub use crate::tier::{MAX_TIER_CAPACITY, Tier, TierAddress, TierCapacity};
    pub use crate::time::{Clock, ManualClock, SystemClock, Timestamp};
}
