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
use std::{fmt::Display, str::FromStr};

pub const MAX_CONTAINER_NO_LEN: usize = 20;

/// A normalized container number.
///
/// Input is trimmed and upper-cased; the result must be non-empty, at most
/// [`MAX_CONTAINER_NO_LEN`] characters and consist of ASCII letters, digits or `-`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContainerNo(Box<str>);

impl ContainerNo {
    /// Parses and normalizes a container number.
    ///
    /// # Examples
    ///
    /// ```
    /// use yard_stack_core::container::ContainerNo;
    ///
    /// let no = ContainerNo::parse("  msku1234565 ").unwrap();
    /// assert_eq!(no.as_str(), "MSKU1234565");
    /// assert!(ContainerNo::parse("").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, InvalidContainerNoError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InvalidContainerNoError::Empty);
        }
        if trimmed.len() > MAX_CONTAINER_NO_LEN {
            return Err(InvalidContainerNoError::TooLong(trimmed.len()));
        }
        if let Some(c) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
        {
            return Err(InvalidContainerNoError::InvalidCharacter(c));
        }
        Ok(Self(trimmed.to_ascii_uppercase().into_boxed_str()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContainerNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContainerNo {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContainerNo {
    type Err = InvalidContainerNoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContainerNo::parse(s)
    }
}

impl TryFrom<&str> for ContainerNo {
    type Error = InvalidContainerNoError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ContainerNo::parse(value)
    }
}

impl TryFrom<String> for ContainerNo {
    type Error = InvalidContainerNoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ContainerNo::parse(&value)
    }
}

impl From<ContainerNo> for String {
    fn from(value: ContainerNo) -> Self {
        value.0.into_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidContainerNoError {
    Empty,
    TooLong(usize),
    InvalidCharacter(char),
}

impl Display for InvalidContainerNoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidContainerNoError::Empty => write!(f, "Container number is empty"),
            InvalidContainerNoError::TooLong(len) => write!(
                f,
                "Container number has {} characters, at most {} are allowed",
                len, MAX_CONTAINER_NO_LEN
            ),
            InvalidContainerNoError::InvalidCharacter(c) => {
                write!(f, "Container number contains invalid character {:?}", c)
            }
        }
    }
}

impl std::error::Error for InvalidContainerNoError {}
