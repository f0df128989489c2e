// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Memory Bus Tests
//!
//! - `basic`: region identification and reset behavior
//! - `bus`: read/write operations with various data sizes
//! - `regions`: address translation, segment mirroring and the cartridge window

use super::*;
use crate::core::memory::MemoryRegion;

mod bus;

/// 8MB bus matching the default machine configuration
fn create_test_bus() -> Bus {
    Bus::new(8 * 1024 * 1024)
}

/// Bus with a cartridge image whose every word encodes its own offset
fn create_bus_with_cartridge(len: usize) -> Bus {
    let mut image = vec![0u8; len];
    for (i, chunk) in image.chunks_exact_mut(4).enumerate() {
        chunk.copy_from_slice(&((i * 4) as u32).to_be_bytes());
    }
    let cartridge = Cartridge::from_bytes(image).unwrap();

    let mut bus = create_test_bus();
    bus.load_cartridge(&cartridge);
    bus
}
