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

//! # Yard Layout Model (`yard-stack-model`)
//!
//! Static description of a container yard: named [`layout::Yard`]s split into
//! [`layout::Block`]s, which in turn hold addressable [`layout::Slot`]s that stack
//! containers up to their tier capacity.
//!
//! A [`yard::YardLayout`] is built once through the validating
//! [`yard::YardLayoutBuilder`] and never changes afterwards. Occupancy of the
//! slots is tracked by the stacking engine, not here.

pub mod err;
pub mod layout;
pub mod yard;

pub mod prelude {
    pub use crate::err::{DuplicateCodeError, LayoutBuildError, UnknownParentError};
    pub use crate::layout::{Block, ContainerSize, Slot, Yard};
    pub use crate::yard::{LayoutDefinition, YardLayout, YardLayoutBuilder};
}
