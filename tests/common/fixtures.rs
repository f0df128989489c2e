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

//! Test fixtures for common test scenarios

use super::test_roms;
use n64rx::core::cartridge::Cartridge;
use n64rx::core::config::MachineConfig;
use n64rx::core::cpu::CPU;
use n64rx::core::memory::Bus;
use n64rx::core::system::System;

/// Create a CPU with a 1MiB memory bus for testing
#[allow(dead_code)]
pub fn create_cpu_with_bus() -> (CPU, Bus) {
    let cpu = CPU::new();
    let bus = Bus::new(1024 * 1024);
    (cpu, bus)
}

/// Create a System with the default configuration
#[allow(dead_code)]
pub fn create_test_system() -> System {
    System::new()
}

/// Create a System running `program` from cartridge ROM
#[allow(dead_code)]
pub fn create_system_with_program(program: &[u32]) -> System {
    create_system_with_rom(test_roms::build_cartridge(program), MachineConfig::default())
}

/// Create a System from a cartridge image and configuration
#[allow(dead_code)]
pub fn create_system_with_rom(image: Vec<u8>, config: MachineConfig) -> System {
    let cartridge = Cartridge::from_bytes(image).expect("Invalid test cartridge");
    let mut system = System::with_config(config).expect("Invalid test configuration");
    system.load_cartridge(&cartridge);
    system
}

/// Create a System running the graphics frame loop with a fill display list
#[allow(dead_code)]
pub fn create_frame_loop_system(color: u32) -> System {
    let display_list = test_roms::display_list_fill(color);
    let program = test_roms::program_frame_loop(display_list.len() as u32 * 4);
    create_system_with_rom(
        test_roms::build_cartridge_with_data(&program, &display_list),
        MachineConfig::default(),
    )
}

/// Load a test program into memory at specified address
#[allow(dead_code)]
pub fn load_test_program(bus: &mut Bus, start_addr: u32, program: &[u32]) {
    for (i, &instruction) in program.iter().enumerate() {
        let addr = start_addr + (i as u32 * 4);
        bus.write32(addr, instruction)
            .expect("Failed to write to memory");
    }
}

/// Execute N CPU instructions, stopping at the first error
#[allow(dead_code)]
pub fn execute_n_instructions(cpu: &mut CPU, bus: &mut Bus, n: usize) {
    for _ in 0..n {
        if cpu.step(bus).is_err() {
            break;
        }
    }
}
