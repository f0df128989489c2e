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

//! Nintendo 64 emulator core library
//!
//! This library provides the core emulation components for a Nintendo 64
//! emulator: the VR4300 CPU, the memory bus, high-level emulation of the RSP,
//! the RDP rasterizer and whole-machine save states.
//!
//! # Example
//!
//! ```
//! use n64rx::core::cpu::CPU;
//! use n64rx::core::memory::Bus;
//!
//! let mut cpu = CPU::new();
//! let mut bus = Bus::new(8 * 1024 * 1024);
//!
//! // Execute one instruction from zeroed RAM (a NOP)
//! cpu.set_pc(0x8000_0000);
//! let cycles = cpu.step(&mut bus).unwrap();
//! assert_eq!(cycles, 1);
//! ```

pub mod core;
