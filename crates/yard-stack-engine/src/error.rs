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

use crate::placement::PlacementStatus;
use std::fmt::Display;
use yard_stack_core::prelude::*;

/// The six ways an engine operation can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    Conflict,
    SlotFull,
    DuplicateContainer,
    BlockedByStack,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::Conflict => "conflict",
            ErrorKind::SlotFull => "slot_full",
            ErrorKind::DuplicateContainer => "duplicate_container",
            ErrorKind::BlockedByStack => "blocked_by_stack",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NotFoundError {
    Slot(SlotId),
    Tier(TierAddress),
    Container(ContainerNo),
}

impl Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotFoundError::Slot(id) => write!(f, "Unknown slot {}", id),
            NotFoundError::Tier(addr) => write!(f, "Tier {} is outside its slot", addr),
            NotFoundError::Container(c) => write!(f, "Container {} is not placed", c),
        }
    }
}

impl std::error::Error for NotFoundError {}

/// A placement was found in a different status than an operation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusMismatch {
    address: TierAddress,
    expected: PlacementStatus,
    actual: PlacementStatus,
}

impl StatusMismatch {
    #[inline]
    pub fn new(address: TierAddress, expected: PlacementStatus, actual: PlacementStatus) -> Self {
        Self {
            address,
            expected,
            actual,
        }
    }

    #[inline]
    pub fn address(&self) -> TierAddress {
        self.address
    }

    #[inline]
    pub fn expected(&self) -> PlacementStatus {
        self.expected
    }

    #[inline]
    pub fn actual(&self) -> PlacementStatus {
        self.actual
    }
}

impl Display for StatusMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} is {}, expected {}",
            self.address, self.actual, self.expected
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidStateError {
    WrongStatus(StatusMismatch),
    /// A tier cannot be held while a tier beneath it is empty.
    EmptyBelow { address: TierAddress, empty: Tier },
}

impl Display for InvalidStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidStateError::WrongStatus(m) => write!(f, "Invalid state: {m}"),
            InvalidStateError::EmptyBelow { address, empty } => write!(
                f,
                "Invalid state: cannot stack at {} while {} below is empty",
                address, empty
            ),
        }
    }
}

impl std::error::Error for InvalidStateError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConflictError {
    /// The compare-and-set lost against a concurrent transition.
    StatusChanged(StatusMismatch),
    /// The container was moved between lookup and removal.
    ContainerMoved {
        container_no: ContainerNo,
        address: TierAddress,
    },
}

impl Display for ConflictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictError::StatusChanged(m) => write!(f, "Conflict: {m}"),
            ConflictError::ContainerMoved {
                container_no,
                address,
            } => write!(
                f,
                "Conflict: container {} is no longer at {}",
                container_no, address
            ),
        }
    }
}

impl std::error::Error for ConflictError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotFullError {
    slot: SlotId,
    capacity: TierCapacity,
}

impl SlotFullError {
    #[inline]
    pub fn new(slot: SlotId, capacity: TierCapacity) -> Self {
        Self { slot, capacity }
    }

    #[inline]
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    #[inline]
    pub fn capacity(&self) -> TierCapacity {
        self.capacity
    }
}

impl Display for SlotFullError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Slot {} is full ({} tiers)",
            self.slot,
            self.capacity.value()
        )
    }
}

impl std::error::Error for SlotFullError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DuplicateContainerError {
    container_no: ContainerNo,
    existing: TierAddress,
}

impl DuplicateContainerError {
    #[inline]
    pub fn new(container_no: ContainerNo, existing: TierAddress) -> Self {
        Self {
            container_no,
            existing,
        }
    }

    #[inline]
    pub fn container_no(&self) -> &ContainerNo {
        &self.container_no
    }

    #[inline]
    pub fn existing(&self) -> TierAddress {
        self.existing
    }
}

impl Display for DuplicateContainerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Container {} is already placed at {}",
            self.container_no, self.existing
        )
    }
}

impl std::error::Error for DuplicateContainerError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockedByStackError {
    address: TierAddress,
    above: Tier,
}

impl BlockedByStackError {
    #[inline]
    pub fn new(address: TierAddress, above: Tier) -> Self {
        Self { address, above }
    }

    #[inline]
    pub fn address(&self) -> TierAddress {
        self.address
    }

    /// The lowest non-empty tier above the blocked one.
    #[inline]
    pub fn above(&self) -> Tier {
        self.above
    }
}

impl Display for BlockedByStackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} is blocked by the container stacked at {}",
            self.address, self.above
        )
    }
}

impl std::error::Error for BlockedByStackError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EngineError {
    NotFound(NotFoundError),
    InvalidState(InvalidStateError),
    Conflict(ConflictError),
    SlotFull(SlotFullError),
    DuplicateContainer(DuplicateContainerError),
    BlockedByStack(BlockedByStackError),
}

impl EngineError {
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::InvalidState(_) => ErrorKind::InvalidState,
            EngineError::Conflict(_) => ErrorKind::Conflict,
            EngineError::SlotFull(_) => ErrorKind::SlotFull,
            EngineError::DuplicateContainer(_) => ErrorKind::DuplicateContainer,
            EngineError::BlockedByStack(_) => ErrorKind::BlockedByStack,
        }
    }

    /// Only lost races are worth retrying; everything else needs an operator.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Conflict(_))
    }

    #[inline]
    pub(crate) fn slot_not_found(slot: SlotId) -> Self {
        EngineError::NotFound(NotFoundError::Slot(slot))
    }

    #[inline]
    pub(crate) fn tier_not_found(address: TierAddress) -> Self {
        EngineError::NotFound(NotFoundError::Tier(address))
    }

    #[inline]
    pub(crate) fn container_not_found(container_no: ContainerNo) -> Self {
        EngineError::NotFound(NotFoundError::Container(container_no))
    }

    #[inline]
    pub(crate) fn wrong_status(
        address: TierAddress,
        expected: PlacementStatus,
        actual: PlacementStatus,
    ) -> Self {
        EngineError::InvalidState(InvalidStateError::WrongStatus(StatusMismatch::new(
            address, expected, actual,
        )))
    }

    #[inline]
    pub(crate) fn status_changed(
        address: TierAddress,
        expected: PlacementStatus,
        actual: PlacementStatus,
    ) -> Self {
        EngineError::Conflict(ConflictError::StatusChanged(StatusMismatch::new(
            address, expected, actual,
        )))
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(e) => write!(f, "{e}"),
            EngineError::InvalidState(e) => write!(f, "{e}"),
            EngineError::Conflict(e) => write!(f, "{e}"),
            EngineError::SlotFull(e) => write!(f, "{e}"),
            EngineError::DuplicateContainer(e) => write!(f, "{e}"),
            EngineError::BlockedByStack(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::NotFound(e) => Some(e),
            EngineError::InvalidState(e) => Some(e),
            EngineError::Conflict(e) => Some(e),
            EngineError::SlotFull(e) => Some(e),
            EngineError::DuplicateContainer(e) => Some(e),
            EngineError::BlockedByStack(e) => Some(e),
        }
    }
}

impl From<NotFoundError> for EngineError {
    fn from(e: NotFoundError) -> Self {
        EngineError::NotFound(e)
    }
}

impl From<InvalidStateError> for EngineError {
    fn from(e: InvalidStateError) -> Self {
        EngineError::InvalidState(e)
    }
}

impl From<ConflictError> for EngineError {
    fn from(e: ConflictError) -> Self {
        EngineError::Conflict(e)
    }
}

impl From<SlotFullError> for EngineError {
    fn from(e: SlotFullError) -> Self {
        EngineError::SlotFull(e)
    }
}

impl From<DuplicateContainerError> for EngineError {
    fn from(e: DuplicateContainerError) -> Self {
        EngineError::DuplicateContainer(e)
    }
}

impl From<BlockedByStackError> for EngineError {
    fn from(e: BlockedByStackError) -> Self {
        EngineError::BlockedByStack(e)
    }
}
