// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Cheat codes
//!
//! A cheat is a direct 32-bit write into RAM that bypasses instruction
//! execution. Codes are written as two hexadecimal words:
//!
//! ```text
//! 80123450 0000FFFF
//! ```

use crate::core::error::{EmulatorError, Result};
use std::fmt;
use std::str::FromStr;

/// One RAM write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cheat {
    pub address: u32,
    pub value: u32,
}

impl Cheat {
    pub fn new(address: u32, value: u32) -> Self {
        Self { address, value }
    }

    /// Parse `"AAAAAAAA VVVVVVVV"`
    ///
    /// The two words may be separated by whitespace or a colon.
    ///
    /// # Example
    /// ```
    /// use n64rx::core::system::Cheat;
    ///
    /// let cheat = Cheat::parse("00123450 0000FFFF").unwrap();
    /// assert_eq!(cheat.address, 0x00123450);
    /// assert_eq!(cheat.value, 0xFFFF);
    ///
    /// assert!(Cheat::parse("80123450").is_err());
    /// ```
    pub fn parse(code: &str) -> Result<Self> {
        let invalid = || EmulatorError::InvalidCheatCode(code.to_string());

        let mut words = code
            .split(|c: char| c.is_whitespace() || c == ':')
            .filter(|word| !word.is_empty());

        let (Some(address), Some(value), None) = (words.next(), words.next(), words.next()) else {
            return Err(invalid());
        };

        let parse_word = |word: &str| {
            let digits = word
                .strip_prefix("0x")
                .or_else(|| word.strip_prefix("0X"))
                .unwrap_or(word);
            if digits.is_empty()
                || digits.len() > 8
                || !digits.chars().all(|c| c.is_ascii_hexdigit())
            {
                return Err(invalid());
            }
            u32::from_str_radix(digits, 16).map_err(|_| invalid())
        };

        Ok(Self {
            address: parse_word(address)?,
            value: parse_word(value)?,
        })
    }
}

impl FromStr for Cheat {
    type Err = EmulatorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Cheat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X} {:08X}", self.address, self.value)
    }
}
