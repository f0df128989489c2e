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

//! End-to-end scenarios running programs from cartridge ROM

mod common;

use common::assertions::{assert_cpu_reg, assert_memory_word, assert_pixel};
use common::fixtures;
use common::test_roms::{self, COUNTER, FRAME_COUNTER};
use n64rx::core::config::{ExecutionMode, MachineConfig};
use n64rx::core::error::EmulatorError;
use n64rx::core::mailbox::{self, TaskStatus};
use n64rx::core::peripherals::VideoSink;
use n64rx::core::system::Cheat;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct FrameCounter(Arc<Mutex<usize>>);

impl VideoSink for FrameCounter {
    fn present(&mut self, pixels: &[u8], width: usize, height: usize) {
        assert_eq!(pixels.len(), width * height * 4);
        *self.0.lock().unwrap() += 1;
    }
}

#[test]
fn test_counter_loop_from_rom() {
    let mut system = fixtures::create_system_with_program(&test_roms::program_counter_loop());

    system.macro_step().unwrap();

    // 1000 instructions, 4 per iteration
    assert_cpu_reg(system.cpu(), 1, 250);
    assert_memory_word(system.bus(), COUNTER, 250);
}

#[test]
fn test_frame_loop_renders_one_frame_per_step() {
    let mut system = fixtures::create_frame_loop_system(0x00FF_00FF);
    let video = FrameCounter::default();
    system.set_video(Box::new(video.clone()));

    system.run_macro_steps(10).unwrap();

    assert_eq!(system.rdp().frame_count(), 10);
    assert_eq!(system.rsp().tasks_completed(), 10);
    assert_eq!(*video.0.lock().unwrap(), 10);
    assert_memory_word(system.bus(), FRAME_COUNTER, 9);

    assert_pixel(system.rdp(), 0, 0, 0x00FF_00FF);
    assert_pixel(system.rdp(), 31, 15, 0x00FF_00FF);
    assert_pixel(system.rdp(), 32, 15, 0);
    assert_pixel(system.rdp(), 31, 16, 0);

    // The last task is complete but not yet acknowledged
    assert_eq!(
        mailbox::task_status(system.bus()).unwrap(),
        TaskStatus::DONE
    );
}

#[test]
fn test_cheat_patches_running_program() {
    let mut system = fixtures::create_system_with_program(&test_roms::program_counter_loop());
    system.macro_step().unwrap();

    // The counter is published from $1, so a RAM patch is overwritten
    let cheat: Cheat = "00000100 00001000".parse().unwrap();
    system.apply_cheats(&[cheat]).unwrap();
    assert_memory_word(system.bus(), COUNTER, 0x1000);

    system.macro_step().unwrap();
    assert_memory_word(system.bus(), COUNTER, 500);
}

#[test]
fn test_cheat_rejects_rom_address() {
    let mut system = fixtures::create_system_with_program(&test_roms::program_counter_loop());
    assert!(matches!(
        system.apply_cheat(0xB000_1000, 0),
        Err(EmulatorError::InvalidAddress {
            address: 0xB000_1000
        })
    ));
    assert_eq!(system.bus().read32(0xB000_1000).unwrap(), 0x24210001);
}

#[test]
fn test_unsupported_opcode_policy() {
    // LD $2, 0($1) is a 64-bit load
    let program = [0xDC220000, 0x24050005];

    let mut strict = fixtures::create_system_with_program(&program);
    assert!(matches!(
        strict.macro_step(),
        Err(EmulatorError::UnsupportedOpcode {
            instruction: 0xDC220000,
            pc: 0xB000_1000
        })
    ));

    let config = MachineConfig {
        execution_mode: ExecutionMode::Permissive,
        ..Default::default()
    };
    let mut permissive =
        fixtures::create_system_with_rom(test_roms::build_cartridge(&program), config);
    permissive.macro_step().unwrap();
    assert_cpu_reg(permissive.cpu(), 5, 5);
}

#[test]
fn test_reset_restarts_program() {
    let mut system = fixtures::create_frame_loop_system(0xFFFF_FFFF);
    system.run_macro_steps(3).unwrap();

    system.reset();
    assert_eq!(system.rdp().frame_count(), 0);
    assert_memory_word(system.bus(), FRAME_COUNTER, 0);

    system.run_macro_steps(3).unwrap();
    assert_eq!(system.rdp().frame_count(), 3);
    assert_memory_word(system.bus(), FRAME_COUNTER, 2);
}
