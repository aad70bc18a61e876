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

use std::fmt::Display;
use yard_stack_core::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DuplicateCodeError<P> {
    parent: P,
    code: String,
}

impl<P: Copy> DuplicateCodeError<P> {
    #[inline]
    pub fn new(parent: P, code: impl Into<String>) -> Self {
        Self {
            parent,
            code: code.into(),
        }
    }

    #[inline]
    pub fn parent(&self) -> P {
        self.parent
    }

    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl<P: Display> Display for DuplicateCodeError<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Code {:?} is used twice within {}", self.code, self.parent)
    }
}

impl<P: Display + std::fmt::Debug> std::error::Error for DuplicateCodeError<P> {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnknownParentError<C, P> {
    child: C,
    parent: P,
}

impl<C: Copy, P: Copy> UnknownParentError<C, P> {
    #[inline]
    pub fn new(child: C, parent: P) -> Self {
        Self { child, parent }
    }

    #[inline]
    pub fn child(&self) -> C {
        self.child
    }

    #[inline]
    pub fn parent(&self) -> P {
        self.parent
    }
}

impl<C: Display, P: Display> Display for UnknownParentError<C, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} references unknown {}", self.child, self.parent)
    }
}

impl<C, P> std::error::Error for UnknownParentError<C, P>
where
    C: Display + std::fmt::Debug,
    P: Display + std::fmt::Debug,
{
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LayoutBuildError {
    DuplicateYardId(YardId),
    DuplicateBlockId(BlockId),
    DuplicateSlotId(SlotId),
    UnknownYard(UnknownParentError<BlockId, YardId>),
    UnknownBlock(UnknownParentError<SlotId, BlockId>),
    DuplicateBlockCode(DuplicateCodeError<YardId>),
    DuplicateSlotCode(DuplicateCodeError<BlockId>),
    /// Codes and names must not be blank.
    EmptyCode,
}

impl Display for LayoutBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutBuildError::DuplicateYardId(id) => write!(f, "Duplicate yard ID: {}", id),
            LayoutBuildError::DuplicateBlockId(id) => write!(f, "Duplicate block ID: {}", id),
            LayoutBuildError::DuplicateSlotId(id) => write!(f, "Duplicate slot ID: {}", id),
            LayoutBuildError::UnknownYard(e) => write!(f, "{e}"),
            LayoutBuildError::UnknownBlock(e) => write!(f, "{e}"),
            LayoutBuildError::DuplicateBlockCode(e) => write!(f, "{e}"),
            LayoutBuildError::DuplicateSlotCode(e) => write!(f, "{e}"),
            LayoutBuildError::EmptyCode => write!(f, "Codes and names must not be empty"),
        }
    }
}

impl std::error::Error for LayoutBuildError {}
