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

/// Emulator error types
use thiserror::Error;

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Main error type for the emulator
///
/// Arithmetic overflow is not listed here: it is recovered inside the CPU by
/// redirecting to the exception vector (see `ExceptionCause::Overflow`).
#[derive(Error, Debug)]
pub enum EmulatorError {
    /// Access to an address that decodes to no mapped region
    #[error("Address error: no mapped region at 0x{address:08X}")]
    AddressError { address: u32 },

    /// Multi-byte access at an address not aligned to its size
    #[error("Alignment error: {size}-byte access at 0x{address:08X}")]
    AlignmentError { address: u32, size: u8 },

    #[error("Unsupported opcode: 0x{instruction:08X} at PC=0x{pc:08X}")]
    UnsupportedOpcode { instruction: u32, pc: u32 },

    /// Snapshot failed validation; the running machine is untouched
    #[error("Corrupt save state: {0}")]
    CorruptState(String),

    /// Cheat target outside the writable RAM range
    #[error("Invalid cheat address: 0x{address:08X}")]
    InvalidAddress { address: u32 },

    /// Snapshot could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Cheat code text that does not parse
    #[error("Invalid cheat code: {0}")]
    InvalidCheatCode(String),

    #[error("Invalid cartridge: {0}")]
    InvalidCartridge(String),

    #[error("Step loop error: {0}")]
    LoopState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
