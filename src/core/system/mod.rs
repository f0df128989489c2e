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

//! System integration module
//!
//! This module ties together all emulator components (CPU, Bus, RSP, RDP,
//! controller ports) and performs the macro-step the step loop drives.

mod cheats;
mod controller_ports;
mod step_loop;

#[cfg(test)]
mod tests;

pub use cheats::Cheat;
pub use controller_ports::ControllerPorts;
pub use step_loop::{LoopState, StepLoop, StopReason};

use super::cartridge::{Cartridge, CartridgeHeader};
use super::config::MachineConfig;
use super::cpu::{CpuTracer, CPU, INTERRUPT_RSP};
use super::error::{EmulatorError, Result};
use super::mailbox::{self, TaskStatus};
use super::memory::Bus;
use super::peripherals::{AudioSink, InputProvider, Peripherals, VideoSink};
use super::rdp::{FRAME_HEIGHT, FRAME_WIDTH, RDP};
use super::rsp::{RspOutcome, RSP};
use super::save_state::{Snapshot, SnapshotMetadata, StateSave, SNAPSHOT_VERSION};
use std::path::Path;

/// Nintendo 64 system
///
/// Owns every hardware component and the host collaborators.
///
/// # Components
/// - CPU: NEC VR4300 processor
/// - Bus: RAM and cartridge ROM
/// - RSP: task processor (HLE graphics and audio microcode)
/// - RDP: rasterizer
/// - Controller Ports: four controllers mirrored into RAM
///
/// A macro-step executes `instruction_budget` instructions, polls the RSP,
/// renders pending RDP commands and then yields to the host (audio, input,
/// video).
///
/// # Example
/// ```
/// use n64rx::core::system::System;
///
/// let mut system = System::new();
/// assert_eq!(system.pc(), 0xB0001000);
/// assert_eq!(system.macro_steps(), 0);
/// ```
pub struct System {
    /// Construction parameters
    config: MachineConfig,
    /// CPU instance
    cpu: CPU,
    /// Memory bus
    bus: Bus,
    /// Reality Signal Processor
    rsp: RSP,
    /// Reality Display Processor
    rdp: RDP,
    /// Controller ports
    controller_ports: ControllerPorts,
    /// Host input, audio and video
    peripherals: Peripherals,
    /// Header of the loaded cartridge
    cartridge: Option<CartridgeHeader>,
    /// Macro-steps completed since reset
    macro_steps: u64,
    /// Instructions executed since reset
    instructions: u64,
    /// CPU tracer for debugging (optional)
    tracer: Option<CpuTracer>,
}

impl System {
    /// Create a system with the default configuration
    pub fn new() -> Self {
        Self::build(MachineConfig::default())
    }

    /// Create a system from a configuration
    ///
    /// # Errors
    ///
    /// `Config` if the configuration does not validate.
    ///
    /// # Example
    /// ```
    /// use n64rx::core::config::MachineConfig;
    /// use n64rx::core::system::System;
    ///
    /// let config = MachineConfig { ram_size: 4 * 1024 * 1024, ..Default::default() };
    /// let system = System::with_config(config).unwrap();
    /// assert_eq!(system.bus().ram_size(), 4 * 1024 * 1024);
    ///
    /// let broken = MachineConfig { instruction_budget: 0, ..Default::default() };
    /// assert!(System::with_config(broken).is_err());
    /// ```
    pub fn with_config(config: MachineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: MachineConfig) -> Self {
        let mut cpu = CPU::new();
        cpu.set_execution_mode(config.execution_mode);
        cpu.reset_to(config.entry_point);

        log::info!(
            "System: {} KiB RAM, entry 0x{:08X}, {} instructions per step, {:?} mode",
            config.ram_size / 1024,
            config.entry_point,
            config.instruction_budget,
            config.execution_mode
        );

        Self {
            bus: Bus::new(config.ram_size),
            cpu,
            rsp: RSP::new(),
            rdp: RDP::new(),
            controller_ports: ControllerPorts::new(),
            peripherals: Peripherals::default(),
            cartridge: None,
            macro_steps: 0,
            instructions: 0,
            tracer: None,
            config,
        }
    }

    /// Install a cartridge and reset the machine
    ///
    /// The ROM stays mapped until the next cartridge load.
    pub fn load_cartridge(&mut self, cartridge: &Cartridge) {
        self.bus.load_cartridge(cartridge);
        let header = cartridge.header().clone();
        log::info!(
            "Cartridge loaded: \"{}\" ({}), {} bytes",
            header.title,
            header.game_code,
            cartridge.len()
        );
        self.cartridge = Some(header);
        self.reset();
    }

    /// Load a cartridge image from disk and reset the machine
    pub fn load_cartridge_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let cartridge = Cartridge::load(path)?;
        self.load_cartridge(&cartridge);
        Ok(())
    }

    /// Reset the system to initial state
    ///
    /// Clears RAM, registers and coprocessor state. The cartridge stays
    /// mapped and the host collaborators stay attached.
    pub fn reset(&mut self) {
        self.cpu.reset_to(self.config.entry_point);
        self.bus.reset();
        self.rsp.reset();
        self.rdp.reset();
        self.controller_ports.reset();
        self.macro_steps = 0;
        self.instructions = 0;
        log::info!("System reset (PC=0x{:08X})", self.cpu.pc());
    }

    /// Execute one macro-step
    ///
    /// # Errors
    ///
    /// Bus faults and strict-mode unsupported opcodes. The faulting
    /// instruction is not applied and the step counter is not advanced.
    ///
    /// # Example
    /// ```
    /// use n64rx::core::config::MachineConfig;
    /// use n64rx::core::system::System;
    ///
    /// let config = MachineConfig { entry_point: 0x8000_1000, ..Default::default() };
    /// let mut system = System::with_config(config).unwrap();
    ///
    /// // Zeroed RAM decodes as NOPs
    /// system.macro_step().unwrap();
    /// assert_eq!(system.pc(), 0x8000_1000 + 4 * 1000);
    /// ```
    pub fn macro_step(&mut self) -> Result<()> {
        for _ in 0..self.config.instruction_budget {
            self.step_instruction()?;
        }
        self.run_coprocessors()?;
        self.yield_to_host()?;
        self.macro_steps += 1;
        Ok(())
    }

    /// Execute `count` macro-steps, stopping at the first error
    pub fn run_macro_steps(&mut self, count: u64) -> Result<()> {
        for _ in 0..count {
            self.macro_step()?;
        }
        Ok(())
    }

    /// Execute a single CPU instruction
    ///
    /// The RSP interrupt line follows the mailbox DONE bit before every
    /// instruction, so acknowledging a task lowers it immediately.
    pub fn step_instruction(&mut self) -> Result<()> {
        self.update_rsp_interrupt()?;
        self.cpu.check_interrupts();

        if let Some(tracer) = self.tracer.as_mut() {
            if let Err(e) = tracer.trace(&self.cpu, &self.bus) {
                log::warn!("Failed to write trace: {}", e);
            }
        }

        self.cpu.step(&mut self.bus)?;
        self.instructions += 1;
        Ok(())
    }

    fn update_rsp_interrupt(&mut self) -> Result<()> {
        let done = mailbox::task_status(&self.bus)?.contains(TaskStatus::DONE);
        self.cpu.set_interrupt_line(INTERRUPT_RSP, done);
        Ok(())
    }

    fn run_coprocessors(&mut self) -> Result<()> {
        if let RspOutcome::Completed(report) = self.rsp.step(&mut self.bus)? {
            log::debug!(
                "RSP task type {} completed ({} bytes)",
                report.task_type,
                report.result_len
            );
            if let Some((start, end)) = report.rdp_commands {
                self.rdp.submit(start, end);
            }
        }
        self.update_rsp_interrupt()?;

        let frames = self.rdp.frame_count();
        self.rdp.render_if_ready(&self.bus)?;
        if self.rdp.frame_count() != frames {
            self.peripherals
                .video
                .present(self.rdp.pixels(), FRAME_WIDTH, FRAME_HEIGHT);
        }
        Ok(())
    }

    fn yield_to_host(&mut self) -> Result<()> {
        let audio = self.rsp.take_audio();
        if !audio.is_empty() {
            self.peripherals.audio.queue_samples(&audio);
        }

        self.controller_ports.poll(self.peripherals.input.as_mut());
        self.controller_ports.mirror(&mut self.bus)
    }

    /// Write a 32-bit value straight into RAM
    ///
    /// # Errors
    ///
    /// `InvalidAddress` unless `address` is a word-aligned physical offset
    /// with the whole word inside `[0, ram_size)`. Segment addresses such as
    /// `0x8000_0100` are rejected. RAM is untouched on failure.
    ///
    /// # Example
    /// ```
    /// use n64rx::core::error::EmulatorError;
    /// use n64rx::core::system::System;
    ///
    /// let mut system = System::new();
    /// system.apply_cheat(0x0000_0100, 0xDEAD_BEEF).unwrap();
    /// assert_eq!(system.bus().read32(0x8000_0100).unwrap(), 0xDEAD_BEEF);
    ///
    /// assert!(matches!(
    ///     system.apply_cheat(0x8000_0100, 1),
    ///     Err(EmulatorError::InvalidAddress { address: 0x8000_0100 })
    /// ));
    /// ```
    pub fn apply_cheat(&mut self, address: u32, value: u32) -> Result<()> {
        let offset = self.cheat_offset(address)?;
        self.write_cheat(offset, value);
        log::debug!("Cheat applied: [0x{:08X}] = 0x{:08X}", address, value);
        Ok(())
    }

    /// Apply a list of cheats
    ///
    /// Every address is checked before anything is written.
    pub fn apply_cheats(&mut self, cheats: &[Cheat]) -> Result<()> {
        let offsets = cheats
            .iter()
            .map(|cheat| self.cheat_offset(cheat.address))
            .collect::<Result<Vec<_>>>()?;

        for (cheat, offset) in cheats.iter().zip(offsets) {
            self.write_cheat(offset, cheat.value);
        }
        log::debug!("{} cheats applied", cheats.len());
        Ok(())
    }

    fn cheat_offset(&self, address: u32) -> Result<usize> {
        let offset = address as usize;
        let in_ram = offset
            .checked_add(4)
            .is_some_and(|end| end <= self.bus.ram_size());
        if address & 0x3 != 0 || !in_ram {
            return Err(EmulatorError::InvalidAddress { address });
        }
        Ok(offset)
    }

    fn write_cheat(&mut self, offset: usize, value: u32) {
        self.bus.ram_mut()[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }

    /// Capture the whole machine
    ///
    /// The pixel buffer is included when the configuration asks for it.
    pub fn save_state(&self) -> Snapshot {
        let (title, game_code) = self
            .cartridge
            .as_ref()
            .map(|header| (header.title.clone(), header.game_code.clone()))
            .unwrap_or_default();

        let mut rdp = self.rdp.to_state();
        if !self.config.include_pixels_in_snapshots {
            rdp.pixels = None;
        }

        log::info!("Snapshot taken at macro-step {}", self.macro_steps);

        Snapshot {
            version: SNAPSHOT_VERSION,
            metadata: SnapshotMetadata::new(
                title,
                game_code,
                self.macro_steps,
                self.instructions,
            ),
            cpu: self.cpu.to_state(),
            rsp: self.rsp.to_state(),
            rdp,
            ram: self.bus.ram().to_vec(),
            controllers: self.controller_ports.to_state(),
        }
    }

    /// Restore the whole machine from a snapshot
    ///
    /// The step counters are rewound to the snapshot's.
    ///
    /// # Errors
    ///
    /// `CorruptState` if the snapshot has another version, fails validation
    /// or was taken with a different RAM size. Nothing is modified in that
    /// case.
    pub fn load_state(&mut self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(EmulatorError::CorruptState(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        snapshot.validate()?;
        if snapshot.ram.len() != self.bus.ram_size() {
            return Err(EmulatorError::CorruptState(format!(
                "RAM is {} bytes, machine has {}",
                snapshot.ram.len(),
                self.bus.ram_size()
            )));
        }

        self.cpu.restore_from_state(&snapshot.cpu);
        self.rsp.restore_from_state(&snapshot.rsp);
        self.rdp.restore_from_state(&snapshot.rdp);
        self.bus.ram_mut().copy_from_slice(&snapshot.ram);
        self.controller_ports
            .restore_from_state(&snapshot.controllers);
        self.macro_steps = snapshot.metadata.macro_steps;
        self.instructions = snapshot.metadata.instructions;

        log::info!(
            "Snapshot restored (taken {}, PC=0x{:08X})",
            snapshot.metadata.timestamp,
            self.cpu.pc()
        );
        Ok(())
    }

    /// Replace all host collaborators
    pub fn set_peripherals(&mut self, peripherals: Peripherals) {
        self.peripherals = peripherals;
    }

    pub fn set_input(&mut self, input: Box<dyn InputProvider>) {
        self.peripherals.input = input;
    }

    pub fn set_audio(&mut self, audio: Box<dyn AudioSink>) {
        self.peripherals.audio = audio;
    }

    pub fn set_video(&mut self, video: Box<dyn VideoSink>) {
        self.peripherals.video = video;
    }

    /// Get current PC value
    pub fn pc(&self) -> u32 {
        self.cpu.pc()
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn cpu(&self) -> &CPU {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut CPU {
        &mut self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    pub fn rsp(&self) -> &RSP {
        &self.rsp
    }

    pub fn rdp(&self) -> &RDP {
        &self.rdp
    }

    pub fn controller_ports(&self) -> &ControllerPorts {
        &self.controller_ports
    }

    pub fn controller_ports_mut(&mut self) -> &mut ControllerPorts {
        &mut self.controller_ports
    }

    /// Header of the loaded cartridge, if any
    pub fn cartridge(&self) -> Option<&CartridgeHeader> {
        self.cartridge.as_ref()
    }

    /// Macro-steps completed since reset
    pub fn macro_steps(&self) -> u64 {
        self.macro_steps
    }

    /// Instructions executed since reset
    pub fn instructions(&self) -> u64 {
        self.instructions
    }

    /// Enable CPU execution tracing
    ///
    /// Writes one line per executed instruction to `path`. `limit` caps the
    /// number of lines (`None` = unlimited).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use n64rx::core::system::System;
    ///
    /// let mut system = System::new();
    /// system.enable_tracing("trace.log", Some(5000)).unwrap();
    /// ```
    pub fn enable_tracing<P: AsRef<Path>>(&mut self, path: P, limit: Option<u64>) -> Result<()> {
        let mut tracer = CpuTracer::new(path.as_ref())?;
        tracer.set_limit(limit);
        self.tracer = Some(tracer);
        log::info!(
            "CPU tracing enabled: {} (limit: {})",
            path.as_ref().display(),
            limit.map_or_else(|| "unlimited".to_string(), |n| n.to_string())
        );
        Ok(())
    }

    /// Disable CPU execution tracing and flush the trace file
    pub fn disable_tracing(&mut self) {
        if let Some(mut tracer) = self.tracer.take() {
            if let Err(e) = tracer.flush() {
                log::warn!("Failed to flush trace: {}", e);
            }
            log::info!(
                "CPU tracing disabled (traced {} instructions)",
                tracer.lines_written()
            );
        }
    }

    /// Check if tracing is currently enabled
    pub fn is_tracing(&self) -> bool {
        self.tracer.is_some()
    }

    /// Number of instructions traced so far
    pub fn trace_count(&self) -> u64 {
        self.tracer.as_ref().map_or(0, CpuTracer::lines_written)
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}
