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

//! Machine configuration
//!
//! Configuration can be built in code or loaded from a TOML file:
//!
//! ```toml
//! ram_size = 8388608
//! entry_point = 0xB0001000
//! instruction_budget = 1000
//! execution_mode = "permissive"
//! include_pixels_in_snapshots = false
//! ```

use crate::core::error::{EmulatorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Policy for instructions the decoder does not implement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Unsupported opcodes fail the step and halt the step loop
    #[default]
    Strict,
    /// Unsupported opcodes are logged and executed as no-ops
    Permissive,
}

/// Machine construction parameters
///
/// # Example
/// ```
/// use n64rx::core::config::{ExecutionMode, MachineConfig};
///
/// let config = MachineConfig::from_toml_str("execution_mode = \"permissive\"").unwrap();
/// assert_eq!(config.execution_mode, ExecutionMode::Permissive);
/// assert_eq!(config.ram_size, 8 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Size of main RAM in bytes (8MB with the expansion pak)
    pub ram_size: usize,

    /// Program counter value after reset
    pub entry_point: u32,

    /// Instructions executed per macro-step
    pub instruction_budget: u32,

    /// Unsupported opcode policy
    pub execution_mode: ExecutionMode,

    /// Whether snapshots carry the RDP pixel buffer
    pub include_pixels_in_snapshots: bool,
}

impl MachineConfig {
    /// Smallest accepted RAM size
    pub const MIN_RAM_SIZE: usize = 64 * 1024;

    /// Largest accepted RAM size (must stay below the cartridge base)
    pub const MAX_RAM_SIZE: usize = 256 * 1024 * 1024;

    /// Default entry point: first instruction after the cartridge header,
    /// seen through the uncached KSEG1 window
    pub const DEFAULT_ENTRY_POINT: u32 = 0xB000_1000;

    /// Parse a configuration from TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| EmulatorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check that the configuration describes a buildable machine
    pub fn validate(&self) -> Result<()> {
        if self.ram_size < Self::MIN_RAM_SIZE || self.ram_size > Self::MAX_RAM_SIZE {
            return Err(EmulatorError::Config(format!(
                "ram_size {} out of range ({}..={})",
                self.ram_size,
                Self::MIN_RAM_SIZE,
                Self::MAX_RAM_SIZE
            )));
        }
        if self.ram_size % 4 != 0 {
            return Err(EmulatorError::Config(format!(
                "ram_size {} is not a multiple of 4",
                self.ram_size
            )));
        }
        if self.entry_point & 0x3 != 0 {
            return Err(EmulatorError::Config(format!(
                "entry_point 0x{:08X} is not word aligned",
                self.entry_point
            )));
        }
        if self.instruction_budget == 0 {
            return Err(EmulatorError::Config(
                "instruction_budget must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            ram_size: 8 * 1024 * 1024,
            entry_point: Self::DEFAULT_ENTRY_POINT,
            instruction_budget: 1000,
            execution_mode: ExecutionMode::Strict,
            include_pixels_in_snapshots: true,
        }
    }
}
