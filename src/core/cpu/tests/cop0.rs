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

use super::super::*;
use super::*;

#[test]
fn test_cop0_initialization() {
    let cpu = CPU::new();
    assert_eq!(cpu.cop0.regs[COP0::STATUS], 0x3400_0004);
    assert_eq!(cpu.cop0.regs[COP0::RANDOM], 31);
    assert_eq!(cpu.cop0.regs[COP0::PRID], 0x0000_0B22);
}

#[test]
fn test_mfc0_reads_cop0_register() {
    let (mut cpu, mut bus) = setup(&[mfc0(8, 12), addiu(9, 8, 0)]);
    cpu.cop0.regs[COP0::STATUS] = 0x12345678;

    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.reg(8), 0x12345678);
    assert_eq!(cpu.reg(9), 0x12345678);
}

#[test]
fn test_mtc0_writes_cop0_register() {
    let (mut cpu, mut bus) = setup(&[mtc0(8, 14)]);
    cpu.set_reg(8, 0x87654321);

    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.cop0.regs[COP0::EPC], 0x87654321);
}

#[test]
fn test_mtc0_compare_acknowledges_timer() {
    let (mut cpu, mut bus) = setup(&[mtc0(8, 11)]);
    cpu.raise_interrupt(INTERRUPT_TIMER);
    cpu.set_reg(8, 0x1000);

    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.cop0.regs[COP0::COMPARE], 0x1000);
    assert_eq!(cpu.cop0.regs[COP0::CAUSE] & (1 << 15), 0);
}

#[test]
fn test_mtc0_cause_only_writes_software_bits() {
    let (mut cpu, mut bus) = setup(&[mtc0(8, 13)]);
    cpu.raise_interrupt(INTERRUPT_RSP);
    cpu.set_reg(8, 0xFFFF_FFFF);

    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.cop0.regs[COP0::CAUSE], 0x0000_0700);
}

#[test]
fn test_prid_is_read_only() {
    let (mut cpu, mut bus) = setup(&[mtc0(8, 15)]);
    cpu.set_reg(8, 0xFFFF);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.cop0.regs[COP0::PRID], 0x0000_0B22);
}

#[test]
fn test_eret_returns_to_epc() {
    let (mut cpu, mut bus) = setup(&[ERET, addiu(8, 0, 1)]);
    cpu.cop0.regs[COP0::STATUS] = COP0::STATUS_EXL;
    cpu.cop0.regs[COP0::EPC] = 0x8000_2000;

    run(&mut cpu, &mut bus, 1);

    // No delay slot: the addiu after ERET never runs
    assert_eq!(cpu.pc(), 0x8000_2000);
    assert_eq!(cpu.reg(8), 0);
    assert_eq!(cpu.cop0.regs[COP0::STATUS] & COP0::STATUS_EXL, 0);
}

#[test]
fn test_eret_prefers_error_epc() {
    let (mut cpu, mut bus) = setup(&[ERET]);
    // Reset leaves ERL set
    cpu.cop0.regs[COP0::ERROREPC] = 0x8000_3000;
    cpu.cop0.regs[COP0::EPC] = 0x8000_2000;

    run(&mut cpu, &mut bus, 1);

    assert_eq!(cpu.pc(), 0x8000_3000);
    assert_eq!(cpu.cop0.regs[COP0::STATUS] & COP0::STATUS_ERL, 0);
}

#[test]
fn test_trap_handler_round_trip() {
    // Overflow at BASE, handler at the vector skips the faulting instruction:
    // mfc0 k0, EPC ; addiu k0, k0, 4 ; mtc0 k0, EPC ; eret
    let (mut cpu, mut bus) = setup(&[add(3, 1, 2), addiu(4, 0, 1)]);
    let handler = [mfc0(26, 14), addiu(26, 26, 4), mtc0(26, 14), ERET];
    for (i, &word) in handler.iter().enumerate() {
        bus.write32(EXCEPTION_VECTOR + i as u32 * 4, word).unwrap();
    }
    cpu.cop0.regs[COP0::STATUS] = 0;
    cpu.set_reg(1, 0x7FFF_FFFF);
    cpu.set_reg(2, 1);

    run(&mut cpu, &mut bus, 1 + handler.len() + 1);

    assert_eq!(cpu.reg(4), 1);
    assert_eq!(cpu.reg(3), 0);
    assert_eq!(cpu.pc(), BASE + 8);
}
