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

use crate::core::config::{ExecutionMode, MachineConfig};
use crate::core::error::{EmulatorError, Result};
use crate::core::memory::Bus;
use crate::core::save_state::{CpuState, StateSave};

/// CPU (NEC VR4300) emulation implementation
///
/// # Specifications
/// - Architecture: MIPS III, modeled here with 32-bit registers
/// - Clock frequency: 93.75 MHz
/// - Registers: 32 general-purpose registers + HI/LO + COP0
///
/// Branches and jumps have one delay slot. Loads have no delay slot; the
/// VR4300 pipeline interlocks instead.
///
/// # Example
/// ```
/// use n64rx::core::cpu::CPU;
///
/// let mut cpu = CPU::new();
/// cpu.reset();
/// assert_eq!(cpu.reg(0), 0); // r0 is always 0
/// assert_eq!(cpu.pc(), 0xB0001000);
/// ```
pub struct CPU {
    /// General purpose registers (r0-r31)
    ///
    /// r0 is hardwired to always return 0
    regs: [u32; 32],

    /// Address of the next instruction to execute
    pc: u32,

    /// Address of the instruction after `pc` (redirected by branches)
    next_pc: u32,

    /// HI register (multiplication/division result upper 32 bits)
    hi: u32,

    /// LO register (multiplication/division result lower 32 bits)
    lo: u32,

    /// Coprocessor 0 (System Control)
    cop0: COP0,

    /// The instruction at `pc` sits in a branch delay slot
    delay_slot_pending: bool,

    /// The instruction currently executing sits in a branch delay slot
    in_branch_delay: bool,

    /// Address of the instruction currently executing
    current_pc: u32,

    /// Current instruction (for debugging)
    current_instruction: u32,

    /// Program counter value loaded on reset
    entry_point: u32,

    /// Unsupported opcode policy
    mode: ExecutionMode,
}

// Module declarations
mod cop0;
mod decode;
mod disassembler;
mod instructions;
#[cfg(test)]
mod tests;
mod tracer;

// Re-exports
pub use cop0::{ExceptionCause, COP0};
pub use decode::Instruction;
pub use disassembler::Disassembler;
pub use tracer::CpuTracer;

/// General exception vector (Status.BEV = 0)
pub const EXCEPTION_VECTOR: u32 = 0x8000_0180;

/// Cause.IP line raised by the RSP when a task completes
pub const INTERRUPT_RSP: u8 = 2;

/// Cause.IP line raised when Count reaches Compare
pub const INTERRUPT_TIMER: u8 = 7;

impl CPU {
    /// Create a new CPU with the default entry point in strict mode
    ///
    /// # Example
    /// ```
    /// use n64rx::core::cpu::CPU;
    ///
    /// let cpu = CPU::new();
    /// assert_eq!(cpu.reg(0), 0);
    /// ```
    pub fn new() -> Self {
        let entry_point = MachineConfig::DEFAULT_ENTRY_POINT;
        Self {
            regs: [0u32; 32],
            pc: entry_point,
            next_pc: entry_point.wrapping_add(4),
            hi: 0,
            lo: 0,
            cop0: COP0::new(),
            delay_slot_pending: false,
            in_branch_delay: false,
            current_pc: entry_point,
            current_instruction: 0,
            entry_point,
            mode: ExecutionMode::Strict,
        }
    }

    /// Reset CPU to initial state
    ///
    /// GPRs, HI/LO and the pipeline are cleared, COP0 returns to its power-on
    /// values and the program counter is set to the entry point.
    pub fn reset(&mut self) {
        self.regs = [0u32; 32];
        self.hi = 0;
        self.lo = 0;
        self.cop0.reset();
        self.set_pc(self.entry_point);
        self.current_instruction = 0;
    }

    /// Reset and start executing at `entry`
    ///
    /// The new entry point is kept for later resets.
    pub fn reset_to(&mut self, entry: u32) {
        self.entry_point = entry;
        self.reset();
    }

    /// Change the entry point used by subsequent resets
    pub fn set_entry_point(&mut self, entry_point: u32) {
        self.entry_point = entry_point;
    }

    pub fn entry_point(&self) -> u32 {
        self.entry_point
    }

    pub fn set_execution_mode(&mut self, mode: ExecutionMode) {
        self.mode = mode;
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Read from general purpose register
    ///
    /// r0 always returns 0.
    ///
    /// # Example
    /// ```
    /// use n64rx::core::cpu::CPU;
    ///
    /// let cpu = CPU::new();
    /// assert_eq!(cpu.reg(0), 0);
    /// ```
    #[inline(always)]
    pub fn reg(&self, index: u8) -> u32 {
        if index == 0 {
            0
        } else {
            self.regs[index as usize]
        }
    }

    /// Write to general purpose register
    ///
    /// Writes to r0 are ignored.
    ///
    /// # Example
    /// ```
    /// use n64rx::core::cpu::CPU;
    ///
    /// let mut cpu = CPU::new();
    /// cpu.set_reg(1, 0x12345678);
    /// assert_eq!(cpu.reg(1), 0x12345678);
    ///
    /// cpu.set_reg(0, 0xDEADBEEF);
    /// assert_eq!(cpu.reg(0), 0);
    /// ```
    #[inline(always)]
    pub fn set_reg(&mut self, index: u8, value: u32) {
        if index != 0 {
            self.regs[index as usize] = value;
        }
    }

    pub fn hi(&self) -> u32 {
        self.hi
    }

    pub fn lo(&self) -> u32 {
        self.lo
    }

    /// Read a COP0 register
    pub fn cop0_reg(&self, index: usize) -> u32 {
        self.cop0.regs[index & 0x1F]
    }

    /// Write a COP0 register directly, bypassing MTC0 side effects
    pub fn set_cop0_reg(&mut self, index: usize, value: u32) {
        self.cop0.regs[index & 0x1F] = value;
    }

    /// Execute one instruction
    ///
    /// Fetches at `pc`, advances the pipeline by one word and executes. If
    /// the fetch or the instruction fails, the pipeline is restored so that
    /// `pc` still points at the faulting instruction.
    ///
    /// # Returns
    ///
    /// Number of cycles consumed (always 1)
    ///
    /// # Example
    ///
    /// ```
    /// use n64rx::core::cpu::CPU;
    /// use n64rx::core::memory::Bus;
    ///
    /// let mut cpu = CPU::new();
    /// let mut bus = Bus::new(64 * 1024);
    /// cpu.set_pc(0x80000000);
    ///
    /// // RAM is zeroed, so this executes a NOP (sll r0, r0, 0)
    /// assert_eq!(cpu.step(&mut bus).unwrap(), 1);
    /// assert_eq!(cpu.pc(), 0x80000004);
    /// ```
    pub fn step(&mut self, bus: &mut Bus) -> Result<u32> {
        let saved = (self.pc, self.next_pc, self.delay_slot_pending);

        self.current_pc = self.pc;
        self.in_branch_delay = self.delay_slot_pending;
        self.delay_slot_pending = false;

        if let Err(e) = self.fetch_and_execute(bus) {
            (self.pc, self.next_pc, self.delay_slot_pending) = saved;
            return Err(e);
        }
        if self.pc & 0x3 != 0 {
            self.fetch_address_error(self.pc);
        }

        self.tick_timer();
        Ok(1)
    }

    fn fetch_and_execute(&mut self, bus: &mut Bus) -> Result<()> {
        self.current_instruction = bus.read32(self.current_pc)?;

        self.pc = self.next_pc;
        self.next_pc = self.next_pc.wrapping_add(4);

        self.execute_instruction(bus)
    }

    /// Count increments every instruction; reaching Compare raises IP7
    fn tick_timer(&mut self) {
        let count = self.cop0.regs[COP0::COUNT].wrapping_add(1);
        self.cop0.regs[COP0::COUNT] = count;
        if count == self.cop0.regs[COP0::COMPARE] {
            self.raise_interrupt(INTERRUPT_TIMER);
        }
    }

    /// Handle an opcode the decoder does not implement
    ///
    /// Strict mode fails the step; permissive mode logs and continues.
    pub(super) fn unsupported(&mut self) -> Result<()> {
        match self.mode {
            ExecutionMode::Strict => Err(EmulatorError::UnsupportedOpcode {
                instruction: self.current_instruction,
                pc: self.current_pc,
            }),
            ExecutionMode::Permissive => {
                log::warn!(
                    "Unsupported instruction 0x{:08X} at PC=0x{:08X} treated as NOP",
                    self.current_instruction,
                    self.current_pc
                );
                Ok(())
            }
        }
    }

    /// A jump or ERET resolved to a misaligned address
    ///
    /// The fetch there takes an address error: BadVAddr and EPC hold the
    /// target, so `pc` never holds a misaligned value.
    fn fetch_address_error(&mut self, target: u32) {
        self.cop0.regs[COP0::BADVADDR] = target;
        self.enter_exception(ExceptionCause::AddressErrorLoad, target, false);
    }

    /// Take an exception caused by the instruction currently executing
    pub fn exception(&mut self, cause: ExceptionCause) {
        self.enter_exception(cause, self.current_pc, self.in_branch_delay);
    }

    /// Record exception state in COP0 and redirect to the exception vector
    ///
    /// `pc` is the address of the instruction that takes the exception. When
    /// it sits in a delay slot, EPC points at the branch instead and Cause.BD
    /// is set. EPC and BD are left alone if EXL is already set.
    fn enter_exception(&mut self, cause: ExceptionCause, pc: u32, in_delay: bool) {
        let status = self.cop0.regs[COP0::STATUS];
        let mut cause_reg = self.cop0.regs[COP0::CAUSE];
        cause_reg = (cause_reg & !COP0::CAUSE_EXCCODE_MASK) | ((cause as u32) << 2);

        if status & COP0::STATUS_EXL == 0 {
            let epc = if in_delay { pc.wrapping_sub(4) } else { pc };
            self.cop0.regs[COP0::EPC] = epc;
            if in_delay {
                cause_reg |= COP0::CAUSE_BD;
            } else {
                cause_reg &= !COP0::CAUSE_BD;
            }
        }

        self.cop0.regs[COP0::CAUSE] = cause_reg;
        self.cop0.regs[COP0::STATUS] = status | COP0::STATUS_EXL;

        if cause == ExceptionCause::Interrupt {
            log::debug!(
                "Interrupt taken: IP=0x{:02X}, EPC=0x{:08X}",
                (cause_reg >> 8) & 0xFF,
                self.cop0.regs[COP0::EPC]
            );
        } else {
            log::warn!(
                "EXCEPTION: cause={:?}, EPC=0x{:08X}, in_delay={}, instruction=0x{:08X}",
                cause,
                self.cop0.regs[COP0::EPC],
                in_delay,
                self.current_instruction
            );
        }

        self.set_pc(EXCEPTION_VECTOR);
    }

    /// Raise a Cause.IP line (0-7)
    pub fn raise_interrupt(&mut self, line: u8) {
        self.cop0.regs[COP0::CAUSE] |= 1 << (8 + (line & 7));
    }

    /// Lower a Cause.IP line (0-7)
    pub fn clear_interrupt(&mut self, line: u8) {
        self.cop0.regs[COP0::CAUSE] &= !(1 << (8 + (line & 7)));
    }

    /// Drive a level-triggered interrupt line
    pub fn set_interrupt_line(&mut self, line: u8, active: bool) {
        if active {
            self.raise_interrupt(line);
        } else {
            self.clear_interrupt(line);
        }
    }

    /// Take an interrupt exception if one is pending and enabled
    ///
    /// Called between instructions. Returns true if the exception was taken.
    ///
    /// # Example
    ///
    /// ```
    /// use n64rx::core::cpu::{CPU, COP0, EXCEPTION_VECTOR, INTERRUPT_RSP};
    ///
    /// let mut cpu = CPU::new();
    /// // IE = 1, IM2 = 1, EXL = ERL = 0
    /// cpu.set_cop0_reg(COP0::STATUS, 0x0000_0401);
    ///
    /// cpu.raise_interrupt(INTERRUPT_RSP);
    /// assert!(cpu.check_interrupts());
    /// assert_eq!(cpu.pc(), EXCEPTION_VECTOR);
    /// ```
    pub fn check_interrupts(&mut self) -> bool {
        if !self.cop0.interrupts_enabled() || self.cop0.pending_interrupts() == 0 {
            return false;
        }
        self.enter_exception(ExceptionCause::Interrupt, self.pc, self.delay_slot_pending);
        true
    }

    /// Check if the instruction at `pc` is a branch delay slot
    pub fn in_delay_slot(&self) -> bool {
        self.delay_slot_pending
    }

    /// Get current PC value
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// Redirect execution to `pc`, discarding any pending delay slot
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
        self.next_pc = pc.wrapping_add(4);
        self.delay_slot_pending = false;
        self.in_branch_delay = false;
        self.current_pc = pc;
    }

    pub fn current_instruction(&self) -> u32 {
        self.current_instruction
    }

    /// Dump all CPU registers for debugging
    pub fn dump_registers(&self) {
        println!("CPU Registers:");
        println!("PC: 0x{:08X}  Next PC: 0x{:08X}", self.pc, self.next_pc);
        println!("HI: 0x{:08X}  LO: 0x{:08X}", self.hi, self.lo);
        println!();

        for i in 0..32 {
            if i % 4 == 0 && i > 0 {
                println!();
            }
            print!("r{:2}: 0x{:08X}  ", i, self.reg(i));
        }
        println!("\n");

        println!("COP0 Registers:");
        println!("Status:   0x{:08X}", self.cop0.regs[COP0::STATUS]);
        println!("Cause:    0x{:08X}", self.cop0.regs[COP0::CAUSE]);
        println!("EPC:      0x{:08X}", self.cop0.regs[COP0::EPC]);
        println!("Count:    0x{:08X}", self.cop0.regs[COP0::COUNT]);
        println!("Compare:  0x{:08X}", self.cop0.regs[COP0::COMPARE]);
        println!("ErrorEPC: 0x{:08X}", self.cop0.regs[COP0::ERROREPC]);
    }
}

impl Default for CPU {
    fn default() -> Self {
        Self::new()
    }
}

impl StateSave for CPU {
    type State = CpuState;

    fn to_state(&self) -> CpuState {
        CpuState {
            regs: self.regs,
            pc: self.pc,
            next_pc: self.next_pc,
            hi: self.hi,
            lo: self.lo,
            cop0_regs: self.cop0.regs,
            delay_slot_pending: self.delay_slot_pending,
        }
    }

    fn restore_from_state(&mut self, state: &CpuState) {
        self.regs = state.regs;
        self.regs[0] = 0;
        self.pc = state.pc;
        self.next_pc = state.next_pc;
        self.hi = state.hi;
        self.lo = state.lo;
        self.cop0.regs = state.cop0_regs;
        self.delay_slot_pending = state.delay_slot_pending;
        self.in_branch_delay = false;
        self.current_pc = state.pc;
    }
}
