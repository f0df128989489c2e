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

//! Cartridge image loading
//!
//! The core accepts big-endian (`.z64` ordered) images only. Images in other
//! byte orders must be normalized before they reach [`Cartridge::from_bytes`].
//!
//! # Header Layout
//!
//! | Offset | Size | Field                 |
//! |--------|------|-----------------------|
//! | 0x00   | 4    | PI BSD configuration  |
//! | 0x04   | 4    | Clock rate            |
//! | 0x08   | 4    | Entry point           |
//! | 0x0C   | 4    | Release               |
//! | 0x10   | 4    | CRC1                  |
//! | 0x14   | 4    | CRC2                  |
//! | 0x20   | 20   | Title (ASCII)         |
//! | 0x3B   | 4    | Game code             |
//! | 0x3F   | 1    | Version               |

use crate::core::error::{EmulatorError, Result};
use serde::Serialize;
use std::path::Path;

/// Minimum image size: the header must be complete
pub const HEADER_SIZE: usize = 0x40;

/// Largest image that fits below the PIF region (0x1FC00000)
pub const MAX_ROM_SIZE: usize = 0x0FC0_0000;

/// Parsed cartridge header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartridgeHeader {
    pub clock_rate: u32,
    pub entry_point: u32,
    pub release: u32,
    pub crc1: u32,
    pub crc2: u32,
    pub title: String,
    pub game_code: String,
    pub version: u8,
}

/// Validated cartridge image
#[derive(Debug, Clone)]
pub struct Cartridge {
    data: Vec<u8>,
    header: CartridgeHeader,
}

impl Cartridge {
    /// Validate an image and parse its header
    ///
    /// # Errors
    ///
    /// `InvalidCartridge` if the image is shorter than the header, its length is
    /// not a whole number of words, or it exceeds the cartridge window.
    ///
    /// # Example
    /// ```
    /// use n64rx::core::cartridge::Cartridge;
    ///
    /// let mut image = vec![0u8; 0x1000];
    /// image[0x08..0x0C].copy_from_slice(&0x8000_0400u32.to_be_bytes());
    /// image[0x20..0x25].copy_from_slice(b"HELLO");
    ///
    /// let cart = Cartridge::from_bytes(image).unwrap();
    /// assert_eq!(cart.header().entry_point, 0x8000_0400);
    /// assert_eq!(cart.header().title, "HELLO");
    /// ```
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(EmulatorError::InvalidCartridge(format!(
                "image is {} bytes, header needs {}",
                data.len(),
                HEADER_SIZE
            )));
        }
        if data.len() % 4 != 0 {
            return Err(EmulatorError::InvalidCartridge(format!(
                "image length {} is not word aligned",
                data.len()
            )));
        }
        if data.len() > MAX_ROM_SIZE {
            return Err(EmulatorError::InvalidCartridge(format!(
                "image is {} bytes, cartridge window holds {}",
                data.len(),
                MAX_ROM_SIZE
            )));
        }

        let header = Self::parse_header(&data);
        Ok(Self { data, header })
    }

    /// Read and validate an image file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    fn parse_header(data: &[u8]) -> CartridgeHeader {
        let word = |offset: usize| {
            u32::from_be_bytes([
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ])
        };

        CartridgeHeader {
            clock_rate: word(0x04),
            entry_point: word(0x08),
            release: word(0x0C),
            crc1: word(0x10),
            crc2: word(0x14),
            title: ascii_field(&data[0x20..0x34]),
            game_code: ascii_field(&data[0x3B..0x3F]),
            version: data[0x3F],
        }
    }

    pub fn header(&self) -> &CartridgeHeader {
        &self.header
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Decode a space/NUL padded ASCII field
fn ascii_field(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { ' ' })
        .collect::<String>()
        .trim()
        .to_string()
}
