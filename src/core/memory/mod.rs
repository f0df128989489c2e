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

//! Memory bus implementation for the Nintendo 64 emulator core
//!
//! The Bus owns main RAM and the cartridge ROM image and decodes every 32-bit
//! address to exactly one of RAM, ROM or unmapped.
//!
//! # Memory Map
//!
//! | Physical Address Range   | Region         | Access  |
//! |--------------------------|----------------|---------|
//! | 0x00000000-(ram_size-1)  | RAM            | R/W     |
//! | 0x10000000-(+rom_size-1) | Cartridge ROM  | R only  |
//! | everything else          | Unmapped       | error   |
//!
//! # Address Translation
//!
//! The VR4300 kernel segments mirror the low 512MB of physical memory:
//! - KSEG0 (0x80000000-0x9FFFFFFF): cached
//! - KSEG1 (0xA0000000-0xBFFFFFFF): uncached
//!
//! KUSEG and KSEG2/3 addresses are used as-is (no TLB is modeled).
//!
//! # Byte Order
//!
//! All multi-byte values are big-endian.
//!
//! # Example
//!
//! ```
//! use n64rx::core::memory::Bus;
//!
//! let mut bus = Bus::new(8 * 1024 * 1024);
//!
//! bus.write32(0x100, 0xDEADBEEF).unwrap();
//! assert_eq!(bus.read32(0x100).unwrap(), 0xDEADBEEF);
//!
//! // KSEG0 and KSEG1 mirror the same physical word
//! assert_eq!(bus.read32(0x80000100).unwrap(), 0xDEADBEEF);
//! assert_eq!(bus.read32(0xA0000100).unwrap(), 0xDEADBEEF);
//! ```

use crate::core::cartridge::Cartridge;
use crate::core::error::{EmulatorError, Result};

#[cfg(test)]
mod tests;

/// Memory bus managing all memory accesses
pub struct Bus {
    /// Main RAM (RDRAM)
    ///
    /// Physical address: 0x00000000-(ram_size-1)
    ram: Vec<u8>,

    /// Cartridge ROM image
    ///
    /// Physical address: 0x10000000 upwards. Immutable between cartridge loads.
    rom: Vec<u8>,
}

/// Memory region identification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegion {
    /// Main RAM
    RAM,
    /// Cartridge ROM
    ROM,
    /// No backing storage
    Unmapped,
}

impl Bus {
    /// Physical base of the cartridge domain
    pub const CARTRIDGE_BASE: u32 = 0x1000_0000;

    /// Create a new Bus with zero-filled RAM and no cartridge
    ///
    /// # Arguments
    ///
    /// * `ram_size` - Size of main RAM in bytes
    pub fn new(ram_size: usize) -> Self {
        Self {
            ram: vec![0u8; ram_size],
            rom: Vec::new(),
        }
    }

    /// Reset the bus to initial state
    ///
    /// Clears RAM to zero. The cartridge ROM is preserved.
    ///
    /// # Example
    ///
    /// ```
    /// use n64rx::core::memory::Bus;
    ///
    /// let mut bus = Bus::new(64 * 1024);
    /// bus.write32(0x80000000, 0x12345678).unwrap();
    /// bus.reset();
    /// assert_eq!(bus.read32(0x80000000).unwrap(), 0x00000000);
    /// ```
    pub fn reset(&mut self) {
        self.ram.fill(0);
    }

    /// Install a cartridge image as ROM
    pub fn load_cartridge(&mut self, cartridge: &Cartridge) {
        self.rom = cartridge.data().to_vec();
        log::info!(
            "Cartridge mapped at 0x{:08X} ({} bytes)",
            Self::CARTRIDGE_BASE,
            self.rom.len()
        );
    }

    /// Translate a virtual address to a physical address
    ///
    /// - 0x80001234 (KSEG0) → 0x00001234
    /// - 0xA0001234 (KSEG1) → 0x00001234
    /// - anything else is returned unchanged
    #[inline(always)]
    pub(crate) fn translate_address(&self, vaddr: u32) -> u32 {
        match vaddr >> 29 {
            0b100 | 0b101 => vaddr & 0x1FFF_FFFF,
            _ => vaddr,
        }
    }

    /// Identify memory region for an address
    ///
    /// # Example
    ///
    /// ```
    /// use n64rx::core::memory::{Bus, MemoryRegion};
    ///
    /// let bus = Bus::new(8 * 1024 * 1024);
    ///
    /// assert_eq!(bus.identify_region(0x00000000), MemoryRegion::RAM);
    /// assert_eq!(bus.identify_region(0x807FFFFC), MemoryRegion::RAM);
    /// assert_eq!(bus.identify_region(0x00800000), MemoryRegion::Unmapped);
    /// // No cartridge loaded yet
    /// assert_eq!(bus.identify_region(0x10000000), MemoryRegion::Unmapped);
    /// ```
    pub fn identify_region(&self, vaddr: u32) -> MemoryRegion {
        let paddr = self.translate_address(vaddr);

        if (paddr as usize) < self.ram.len() {
            MemoryRegion::RAM
        } else if paddr
            .checked_sub(Self::CARTRIDGE_BASE)
            .is_some_and(|offset| (offset as usize) < self.rom.len())
        {
            MemoryRegion::ROM
        } else {
            MemoryRegion::Unmapped
        }
    }

    /// Resolve an access to its region and byte offset
    ///
    /// Fails with `AddressError` when the address is unmapped or when the
    /// access would run past the end of its region.
    fn locate(&self, vaddr: u32, size: usize) -> Result<(MemoryRegion, usize)> {
        let paddr = self.translate_address(vaddr);

        let (region, offset, len) = match self.identify_region(vaddr) {
            MemoryRegion::RAM => (MemoryRegion::RAM, paddr as usize, self.ram.len()),
            MemoryRegion::ROM => (
                MemoryRegion::ROM,
                (paddr - Self::CARTRIDGE_BASE) as usize,
                self.rom.len(),
            ),
            MemoryRegion::Unmapped => {
                return Err(EmulatorError::AddressError { address: vaddr });
            }
        };

        if offset.checked_add(size).is_none_or(|end| end > len) {
            return Err(EmulatorError::AddressError { address: vaddr });
        }

        Ok((region, offset))
    }

    /// Check that `len` bytes from `vaddr` can be written with `size`-byte
    /// accesses, without writing anything
    ///
    /// The whole range must sit inside one region.
    ///
    /// # Example
    ///
    /// ```
    /// use n64rx::core::memory::Bus;
    ///
    /// let bus = Bus::new(64 * 1024);
    /// assert!(bus.check_write_range(0x80000000, 64 * 1024, 4).is_ok());
    /// assert!(bus.check_write_range(0x80000000, 64 * 1024 + 4, 4).is_err());
    /// assert!(bus.check_write_range(0x80000002, 8, 4).is_err());
    /// ```
    pub fn check_write_range(&self, vaddr: u32, len: u32, size: u8) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        Self::check_alignment(vaddr, size)?;
        self.locate(vaddr, len as usize).map(|_| ())
    }

    #[inline]
    fn check_alignment(vaddr: u32, size: u8) -> Result<()> {
        if vaddr & (size as u32 - 1) != 0 {
            return Err(EmulatorError::AlignmentError {
                address: vaddr,
                size,
            });
        }
        Ok(())
    }

    fn read_bytes<const N: usize>(&self, vaddr: u32) -> Result<[u8; N]> {
        Self::check_alignment(vaddr, N as u8)?;
        let (region, offset) = self.locate(vaddr, N)?;

        let source = match region {
            MemoryRegion::RAM => &self.ram,
            _ => &self.rom,
        };

        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&source[offset..offset + N]);
        Ok(bytes)
    }

    fn write_bytes<const N: usize>(&mut self, vaddr: u32, bytes: [u8; N]) -> Result<()> {
        Self::check_alignment(vaddr, N as u8)?;
        let (region, offset) = self.locate(vaddr, N)?;

        match region {
            MemoryRegion::RAM => {
                self.ram[offset..offset + N].copy_from_slice(&bytes);
            }
            _ => {
                // ROM is read-only hardware
                log::trace!("Ignored {}-byte write to ROM at 0x{:08X}", N, vaddr);
            }
        }
        Ok(())
    }

    /// Read 8-bit value from memory
    pub fn read8(&self, vaddr: u32) -> Result<u8> {
        Ok(self.read_bytes::<1>(vaddr)?[0])
    }

    /// Read 16-bit big-endian value from memory
    ///
    /// # Example
    ///
    /// ```
    /// use n64rx::core::memory::Bus;
    ///
    /// let mut bus = Bus::new(64 * 1024);
    /// bus.write16(0x80000000, 0x1234).unwrap();
    /// assert_eq!(bus.read16(0x80000000).unwrap(), 0x1234);
    ///
    /// // Unaligned access fails
    /// assert!(bus.read16(0x80000001).is_err());
    /// ```
    pub fn read16(&self, vaddr: u32) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_bytes::<2>(vaddr)?))
    }

    /// Read 32-bit big-endian value from memory
    ///
    /// # Returns
    ///
    /// - `Ok(u32)` containing the value
    /// - `Err(EmulatorError::AlignmentError)` if address is not 4-byte aligned
    /// - `Err(EmulatorError::AddressError)` if address is unmapped
    pub fn read32(&self, vaddr: u32) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_bytes::<4>(vaddr)?))
    }

    /// Write 8-bit value to memory
    pub fn write8(&mut self, vaddr: u32, value: u8) -> Result<()> {
        self.write_bytes(vaddr, [value])
    }

    /// Write 16-bit big-endian value to memory
    pub fn write16(&mut self, vaddr: u32, value: u16) -> Result<()> {
        self.write_bytes(vaddr, value.to_be_bytes())
    }

    /// Write 32-bit big-endian value to memory
    ///
    /// Writes to ROM are dropped without error.
    pub fn write32(&mut self, vaddr: u32, value: u32) -> Result<()> {
        self.write_bytes(vaddr, value.to_be_bytes())
    }

    /// RAM byte offset of a `size`-byte access, if it lies entirely in RAM
    pub fn ram_offset(&self, vaddr: u32, size: usize) -> Option<usize> {
        match self.locate(vaddr, size) {
            Ok((MemoryRegion::RAM, offset)) => Some(offset),
            _ => None,
        }
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    pub fn ram_mut(&mut self) -> &mut [u8] {
        &mut self.ram
    }

    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    pub fn ram_size(&self) -> usize {
        self.ram.len()
    }
}
