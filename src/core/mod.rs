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

//! Core emulation components
//!
//! This module contains all hardware emulation components:
//! - CPU (NEC VR4300)
//! - Memory bus (RAM and cartridge ROM)
//! - RSP (task processor, high-level emulated microcode)
//! - RDP (rasterizer)
//! - Controller ports and host collaborator traits
//! - Save states
//! - System integration and the step loop

pub mod cartridge;
pub mod config;
pub mod cpu;
pub mod error;
pub mod mailbox;
pub mod memory;
pub mod peripherals;
pub mod rdp;
pub mod rsp;
pub mod save_state;
pub mod system;

// Re-export commonly used types
pub use cartridge::Cartridge;
pub use config::{ExecutionMode, MachineConfig};
pub use cpu::CPU;
pub use error::{EmulatorError, Result};
pub use memory::Bus;
pub use rdp::RDP;
pub use rsp::RSP;
pub use save_state::Snapshot;
pub use system::{StepLoop, System};
