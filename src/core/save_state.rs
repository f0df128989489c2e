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

//! Save state serialization for the Nintendo 64 emulator
//!
//! A snapshot captures the complete machine state at a macro-step boundary:
//! CPU registers and COP0, RSP task state, RDP state (pixel buffer optional),
//! all of RAM and the controller ports. The cartridge image is not saved; it
//! never changes while a cartridge is loaded.
//!
//! # Snapshot Format
//!
//! ```text
//! magic         8 bytes   "N64RXSNP"
//! version       u32 BE
//! section count u32 BE
//! section*      tag (4 bytes ASCII) | length (u32 BE) | payload
//! ```
//!
//! Payloads are bincode (standard configuration). Sections may appear in any
//! order. Sections with an unknown tag are skipped so that newer writers can
//! add data without breaking older readers. Every required section must be
//! present exactly once.
//!
//! # Validation
//!
//! [`Snapshot::from_bytes`] checks framing, version, decoding and the shape
//! of every section before returning. Any failure is reported as
//! `CorruptState`, and callers apply nothing from a snapshot that failed to
//! parse.
//!
//! # Example
//!
//! ```no_run
//! use n64rx::core::save_state::Snapshot;
//! use n64rx::core::system::System;
//!
//! let mut system = System::new();
//! // ... run emulation ...
//!
//! let snapshot = system.save_state();
//! snapshot.save_to_file("save.state").unwrap();
//!
//! // Later
//! let loaded = Snapshot::load_from_file("save.state").unwrap();
//! system.load_state(&loaded).unwrap();
//! ```

use crate::core::error::{EmulatorError, Result};
use crate::core::peripherals::{ControllerInput, MAX_PORTS};
use crate::core::rdp::PIXEL_BUFFER_SIZE;
use crate::core::rsp::{Vertex, VERTEX_BUFFER_SIZE};
use bincode::{config, Decode, Encode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Leading bytes of every snapshot
pub const SNAPSHOT_MAGIC: [u8; 8] = *b"N64RXSNP";

/// Snapshot format version
///
/// Incremented whenever a section payload changes shape.
pub const SNAPSHOT_VERSION: u32 = 1;

pub const TAG_META: [u8; 4] = *b"META";
pub const TAG_CPU: [u8; 4] = *b"CPU ";
pub const TAG_RSP: [u8; 4] = *b"RSP ";
pub const TAG_RDP: [u8; 4] = *b"RDP ";
pub const TAG_RAM: [u8; 4] = *b"RAM ";
pub const TAG_CTRL: [u8; 4] = *b"CTRL";

/// Upper bound on bytes claimed by a single decoded section
const DECODE_LIMIT: usize = 320 * 1024 * 1024;

/// Complete machine snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Format version the snapshot was read with (or written as)
    pub version: u32,

    pub metadata: SnapshotMetadata,

    pub cpu: CpuState,

    pub rsp: RspState,

    /// RDP state; `pixels` is `None` when the frame buffer was left out
    pub rdp: RdpState,

    /// Full contents of main RAM
    pub ram: Vec<u8>,

    pub controllers: ControllerState,
}

/// Snapshot metadata
///
/// The step counters are restored on load; the rest is informational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[bincode(encode_bounds = "", decode_bounds = "")]
pub struct SnapshotMetadata {
    /// Time the snapshot was taken
    #[bincode(with_serde)]
    pub timestamp: DateTime<Utc>,

    /// Cartridge title from the ROM header (empty if none loaded)
    pub cartridge_title: String,

    /// Cartridge game code from the ROM header
    pub game_code: String,

    /// Macro-steps executed since reset
    pub macro_steps: u64,

    /// Instructions executed since reset
    pub instructions: u64,
}

impl SnapshotMetadata {
    pub fn new(
        cartridge_title: String,
        game_code: String,
        macro_steps: u64,
        instructions: u64,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            cartridge_title,
            game_code,
            macro_steps,
            instructions,
        }
    }
}

/// CPU state (NEC VR4300)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct CpuState {
    /// General purpose registers (R0-R31)
    pub regs: [u32; 32],

    /// Program counter
    pub pc: u32,

    /// Next PC (for delay slot handling)
    pub next_pc: u32,

    pub hi: u32,
    pub lo: u32,

    /// COP0 registers (System Control Coprocessor)
    pub cop0_regs: [u32; 32],

    /// The instruction at `pc` is a branch delay slot
    pub delay_slot_pending: bool,
}

/// RSP state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct RspState {
    /// Scalar unit registers
    pub scalar_regs: [u32; 32],

    /// READY as seen on the last poll
    pub task_ready: bool,

    /// Vertex buffer of the graphics microcode
    pub vertices: Vec<Vertex>,

    /// Screen offset applied to triangles
    pub offset_x: i16,
    pub offset_y: i16,

    /// Tasks completed since reset
    pub tasks_completed: u64,
}

/// RDP state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct RdpState {
    /// A command range is waiting to be rendered
    pub pending: bool,

    /// Pending command range `[start, end)`
    pub start: u32,
    pub end: u32,

    /// Fill color (RGBA8888)
    pub fill_color: u32,

    /// Scissor rectangle in pixels: left, top, right, bottom (exclusive)
    pub scissor: [u16; 4],

    /// Completed frames (SYNC_FULL count)
    pub frame_count: u64,

    /// RGBA8 frame buffer, if captured
    pub pixels: Option<Vec<u8>>,
}

/// Controller state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct ControllerState {
    /// One entry per port
    pub ports: Vec<ControllerInput>,
}

impl Snapshot {
    /// Encode the snapshot
    ///
    /// Sections are written in a fixed order: META, CPU, RSP, RDP, RAM, CTRL.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let sections = [
            (TAG_META, encode_payload(&self.metadata)?),
            (TAG_CPU, encode_payload(&self.cpu)?),
            (TAG_RSP, encode_payload(&self.rsp)?),
            (TAG_RDP, encode_payload(&self.rdp)?),
            (TAG_RAM, encode_payload(&self.ram)?),
            (TAG_CTRL, encode_payload(&self.controllers)?),
        ];

        let total: usize = sections.iter().map(|(_, p)| p.len() + 8).sum();
        let mut out = Vec::with_capacity(16 + total);
        out.extend_from_slice(&SNAPSHOT_MAGIC);
        out.extend_from_slice(&self.version.to_be_bytes());
        out.extend_from_slice(&(sections.len() as u32).to_be_bytes());

        for (tag, payload) in &sections {
            write_section(&mut out, *tag, payload)?;
        }

        Ok(out)
    }

    /// Parse and validate a snapshot
    ///
    /// # Errors
    ///
    /// `CorruptState` if the magic or version is wrong, the data is
    /// truncated, a required section is missing or repeated, a payload fails
    /// to decode, or a section has the wrong shape.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = SectionReader::new(bytes);

        if reader.take(SNAPSHOT_MAGIC.len(), "magic")? != SNAPSHOT_MAGIC {
            return Err(corrupt("bad magic"));
        }

        let version = reader.read_u32("version")?;
        if version != SNAPSHOT_VERSION {
            return Err(corrupt(format!(
                "unsupported version {} (expected {})",
                version, SNAPSHOT_VERSION
            )));
        }

        let section_count = reader.read_u32("section count")?;

        let mut metadata = None;
        let mut cpu = None;
        let mut rsp = None;
        let mut rdp = None;
        let mut ram = None;
        let mut controllers = None;

        for _ in 0..section_count {
            let (tag, payload) = reader.read_section()?;
            match tag {
                TAG_META => put_once(&mut metadata, tag, decode_payload(tag, payload)?)?,
                TAG_CPU => put_once(&mut cpu, tag, decode_payload(tag, payload)?)?,
                TAG_RSP => put_once(&mut rsp, tag, decode_payload(tag, payload)?)?,
                TAG_RDP => put_once(&mut rdp, tag, decode_payload(tag, payload)?)?,
                TAG_RAM => put_once(&mut ram, tag, decode_payload(tag, payload)?)?,
                TAG_CTRL => put_once(&mut controllers, tag, decode_payload(tag, payload)?)?,
                _ => {
                    log::debug!(
                        "Skipping unknown snapshot section '{}' ({} bytes)",
                        tag_name(tag),
                        payload.len()
                    );
                }
            }
        }

        if !reader.is_empty() {
            return Err(corrupt(format!(
                "{} trailing bytes after last section",
                reader.remaining()
            )));
        }

        let snapshot = Self {
            version,
            metadata: required(metadata, TAG_META)?,
            cpu: required(cpu, TAG_CPU)?,
            rsp: required(rsp, TAG_RSP)?,
            rdp: required(rdp, TAG_RDP)?,
            ram: required(ram, TAG_RAM)?,
            controllers: required(controllers, TAG_CTRL)?,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check section shapes that do not depend on the target machine
    pub fn validate(&self) -> Result<()> {
        if self.cpu.pc & 0x3 != 0 || self.cpu.next_pc & 0x3 != 0 {
            return Err(corrupt(format!(
                "misaligned program counter 0x{:08X}",
                self.cpu.pc
            )));
        }
        if let Some(pixels) = &self.rdp.pixels {
            if pixels.len() != PIXEL_BUFFER_SIZE {
                return Err(corrupt(format!(
                    "pixel buffer is {} bytes, expected {}",
                    pixels.len(),
                    PIXEL_BUFFER_SIZE
                )));
            }
        }
        if self.rsp.vertices.len() > VERTEX_BUFFER_SIZE {
            return Err(corrupt(format!(
                "{} vertices, buffer holds {}",
                self.rsp.vertices.len(),
                VERTEX_BUFFER_SIZE
            )));
        }
        if self.controllers.ports.len() != MAX_PORTS {
            return Err(corrupt(format!(
                "{} controller ports, expected {}",
                self.controllers.ports.len(),
                MAX_PORTS
            )));
        }
        Ok(())
    }

    /// Save state to file
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use n64rx::core::system::System;
    /// # let system = System::new();
    /// system.save_state().save_to_file("save.state").unwrap();
    /// ```
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let encoded = self.to_bytes()?;
        let mut file = File::create(path.as_ref())?;
        file.write_all(&encoded)?;
        log::info!(
            "Snapshot written to {} ({} bytes)",
            path.as_ref().display(),
            encoded.len()
        );
        Ok(())
    }

    /// Load and validate a snapshot file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

/// Trait for components that can be saved and restored
///
/// # Example
///
/// ```
/// use n64rx::core::cpu::CPU;
/// use n64rx::core::save_state::StateSave;
///
/// let mut cpu = CPU::new();
/// cpu.set_reg(4, 0x1234);
/// let state = cpu.to_state();
///
/// let mut other = CPU::new();
/// other.restore_from_state(&state);
/// assert_eq!(other.reg(4), 0x1234);
/// ```
pub trait StateSave {
    /// The state type for this component
    type State: Serialize + for<'de> Deserialize<'de>;

    /// Convert this component to a saveable state
    fn to_state(&self) -> Self::State;

    /// Restore this component from a saved state
    fn restore_from_state(&mut self, state: &Self::State);
}

fn corrupt(message: impl Into<String>) -> EmulatorError {
    EmulatorError::CorruptState(message.into())
}

fn tag_name(tag: [u8; 4]) -> String {
    String::from_utf8_lossy(&tag).trim_end().to_string()
}

fn encode_payload<T: Encode>(value: &T) -> Result<Vec<u8>> {
    bincode::encode_to_vec(value, config::standard())
        .map_err(|e| EmulatorError::Serialization(e.to_string()))
}

fn decode_payload<T: Decode<()>>(tag: [u8; 4], payload: &[u8]) -> Result<T> {
    let config = config::standard().with_limit::<DECODE_LIMIT>();
    let (value, consumed): (T, usize) = bincode::decode_from_slice(payload, config)
        .map_err(|e| corrupt(format!("section '{}': {}", tag_name(tag), e)))?;
    if consumed != payload.len() {
        return Err(corrupt(format!(
            "section '{}': {} unused payload bytes",
            tag_name(tag),
            payload.len() - consumed
        )));
    }
    Ok(value)
}

fn write_section(out: &mut Vec<u8>, tag: [u8; 4], payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        EmulatorError::Serialization(format!(
            "section '{}' is too large ({} bytes)",
            tag_name(tag),
            payload.len()
        ))
    })?;
    out.extend_from_slice(&tag);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(payload);
    Ok(())
}

fn put_once<T>(slot: &mut Option<T>, tag: [u8; 4], value: T) -> Result<()> {
    if slot.is_some() {
        return Err(corrupt(format!("duplicate section '{}'", tag_name(tag))));
    }
    *slot = Some(value);
    Ok(())
}

fn required<T>(slot: Option<T>, tag: [u8; 4]) -> Result<T> {
    slot.ok_or_else(|| corrupt(format!("missing section '{}'", tag_name(tag))))
}

/// Cursor over snapshot bytes; every short read is `CorruptState`
struct SectionReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> SectionReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let end = self
            .position
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| {
                corrupt(format!(
                    "truncated {} at offset {} (need {} bytes, have {})",
                    what,
                    self.position,
                    len,
                    self.remaining()
                ))
            })?;
        let slice = &self.bytes[self.position..end];
        self.position = end;
        Ok(slice)
    }

    fn read_u32(&mut self, what: &str) -> Result<u32> {
        let bytes = self.take(4, what)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_section(&mut self) -> Result<([u8; 4], &'a [u8])> {
        let raw = self.take(4, "section tag")?;
        let tag = [raw[0], raw[1], raw[2], raw[3]];
        let len = self.read_u32("section length")? as usize;
        let payload = self.take(len, "section payload")?;
        Ok((tag, payload))
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> Snapshot {
        let mut cpu = CpuState {
            pc: 0x8000_1000,
            next_pc: 0x8000_1004,
            ..Default::default()
        };
        cpu.regs[4] = 0xCAFE_F00D;
        cpu.cop0_regs[12] = 0x3400_0004;

        Snapshot {
            version: SNAPSHOT_VERSION,
            metadata: SnapshotMetadata::new("TEST".to_string(), "NTSE".to_string(), 42, 42_000),
            cpu,
            rsp: RspState {
                vertices: vec![Vertex {
                    x: 10,
                    y: -4,
                    color: 0xFF00_00FF,
                }],
                tasks_completed: 3,
                ..Default::default()
            },
            rdp: RdpState {
                fill_color: 0x1122_3344,
                scissor: [0, 0, 640, 480],
                frame_count: 7,
                pixels: None,
                ..Default::default()
            },
            ram: (0..4096u32).map(|i| i as u8).collect(),
            controllers: ControllerState {
                ports: vec![ControllerInput::default(); MAX_PORTS],
            },
        }
    }

    /// Re-frame a snapshot with the given sections
    fn frame(version: u32, sections: &[([u8; 4], Vec<u8>)]) -> Vec<u8> {
        let mut out = SNAPSHOT_MAGIC.to_vec();
        out.extend_from_slice(&version.to_be_bytes());
        out.extend_from_slice(&(sections.len() as u32).to_be_bytes());
        for (tag, payload) in sections {
            write_section(&mut out, *tag, payload).unwrap();
        }
        out
    }

    fn sections_of(snapshot: &Snapshot) -> Vec<([u8; 4], Vec<u8>)> {
        vec![
            (TAG_META, encode_payload(&snapshot.metadata).unwrap()),
            (TAG_CPU, encode_payload(&snapshot.cpu).unwrap()),
            (TAG_RSP, encode_payload(&snapshot.rsp).unwrap()),
            (TAG_RDP, encode_payload(&snapshot.rdp).unwrap()),
            (TAG_RAM, encode_payload(&snapshot.ram).unwrap()),
            (TAG_CTRL, encode_payload(&snapshot.controllers).unwrap()),
        ]
    }

    #[test]
    fn test_snapshot_bytes_round_trip() {
        let snapshot = sample_snapshot();
        let bytes = snapshot.to_bytes().unwrap();

        assert_eq!(&bytes[..8], b"N64RXSNP");
        assert_eq!(&bytes[8..12], &SNAPSHOT_VERSION.to_be_bytes());
        assert_eq!(&bytes[12..16], &6u32.to_be_bytes());
        assert_eq!(&bytes[16..20], b"META");

        let decoded = Snapshot::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_sections_in_any_order() {
        let snapshot = sample_snapshot();
        let mut sections = sections_of(&snapshot);
        sections.reverse();

        let decoded = Snapshot::from_bytes(&frame(SNAPSHOT_VERSION, &sections)).unwrap();
        assert_eq!(decoded.cpu, snapshot.cpu);
        assert_eq!(decoded.ram, snapshot.ram);
    }

    #[test]
    fn test_unknown_section_is_skipped() {
        let snapshot = sample_snapshot();
        let mut sections = sections_of(&snapshot);
        sections.insert(2, (*b"XTRA", vec![0xAB; 37]));

        let decoded = Snapshot::from_bytes(&frame(SNAPSHOT_VERSION, &sections)).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = sample_snapshot().to_bytes().unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            Snapshot::from_bytes(&bytes),
            Err(EmulatorError::CorruptState(_))
        ));
    }

    #[test]
    fn test_wrong_version() {
        let sections = sections_of(&sample_snapshot());
        let result = Snapshot::from_bytes(&frame(SNAPSHOT_VERSION + 1, &sections));
        match result {
            Err(EmulatorError::CorruptState(msg)) => assert!(msg.contains("version")),
            other => panic!("expected CorruptState, got {:?}", other.map(|s| s.version)),
        }
    }

    #[test]
    fn test_truncated_at_every_boundary() {
        let bytes = sample_snapshot().to_bytes().unwrap();
        for cut in [0, 4, 8, 12, 16, 19, 24, bytes.len() / 2, bytes.len() - 1] {
            assert!(
                matches!(
                    Snapshot::from_bytes(&bytes[..cut]),
                    Err(EmulatorError::CorruptState(_))
                ),
                "cut at {} was accepted",
                cut
            );
        }
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = sample_snapshot().to_bytes().unwrap();
        bytes.push(0);
        assert!(Snapshot::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_missing_section() {
        let mut sections = sections_of(&sample_snapshot());
        sections.retain(|(tag, _)| *tag != TAG_RAM);
        match Snapshot::from_bytes(&frame(SNAPSHOT_VERSION, &sections)) {
            Err(EmulatorError::CorruptState(msg)) => assert!(msg.contains("RAM")),
            _ => panic!("missing RAM section was accepted"),
        }
    }

    #[test]
    fn test_duplicate_section() {
        let mut sections = sections_of(&sample_snapshot());
        let cpu = sections[1].clone();
        sections.push(cpu);
        assert!(Snapshot::from_bytes(&frame(SNAPSHOT_VERSION, &sections)).is_err());
    }

    #[test]
    fn test_undecodable_payload() {
        let mut sections = sections_of(&sample_snapshot());
        sections[1].1.truncate(10);
        assert!(matches!(
            Snapshot::from_bytes(&frame(SNAPSHOT_VERSION, &sections)),
            Err(EmulatorError::CorruptState(_))
        ));
    }

    #[test]
    fn test_wrong_pixel_buffer_size() {
        let mut snapshot = sample_snapshot();
        snapshot.rdp.pixels = Some(vec![0; 16]);
        let bytes = snapshot.to_bytes().unwrap();
        assert!(Snapshot::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_full_pixel_buffer_accepted() {
        let mut snapshot = sample_snapshot();
        snapshot.rdp.pixels = Some(vec![0x7F; PIXEL_BUFFER_SIZE]);
        let bytes = snapshot.to_bytes().unwrap();
        let decoded = Snapshot::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.rdp.pixels.map(|p| p.len()), Some(PIXEL_BUFFER_SIZE));
    }

    #[test]
    fn test_oversized_vertex_buffer() {
        let mut snapshot = sample_snapshot();
        snapshot.rsp.vertices = vec![Vertex::default(); VERTEX_BUFFER_SIZE + 1];
        let bytes = snapshot.to_bytes().unwrap();
        assert!(matches!(
            Snapshot::from_bytes(&bytes),
            Err(EmulatorError::CorruptState(_))
        ));

        snapshot.rsp.vertices.pop();
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_wrong_controller_count() {
        let mut snapshot = sample_snapshot();
        snapshot.controllers.ports.pop();
        let bytes = snapshot.to_bytes().unwrap();
        assert!(Snapshot::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_save_load_file() {
        let snapshot = sample_snapshot();
        let file = tempfile::NamedTempFile::new().unwrap();

        snapshot.save_to_file(file.path()).unwrap();
        let loaded = Snapshot::load_from_file(file.path()).unwrap();

        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Snapshot::load_from_file(dir.path().join("absent.state"));
        assert!(matches!(result, Err(EmulatorError::Io(_))));
    }
}
