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

use clap::Parser;
use log::{error, info};
use n64rx::core::config::{ExecutionMode, MachineConfig};
use n64rx::core::error::{EmulatorError, Result};
use n64rx::core::save_state::{Snapshot, StateSave};
use n64rx::core::system::{Cheat, System};
use std::path::PathBuf;

/// Nintendo 64 emulator (headless)
#[derive(Parser)]
#[command(name = "n64rx")]
#[command(about = "Nintendo 64 emulator core runner", long_about = None)]
struct Args {
    /// Path to a big-endian cartridge image (.z64)
    rom: PathBuf,

    /// Machine configuration file (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Number of macro-steps to execute
    #[arg(short = 'n', long, default_value = "600")]
    steps: u64,

    /// Treat unsupported instructions as NOPs instead of halting
    #[arg(long)]
    permissive: bool,

    /// Restore this save state before running
    #[arg(long)]
    load_state: Option<PathBuf>,

    /// Write a save state here after running
    #[arg(long)]
    save_state: Option<PathBuf>,

    /// Cheat code "AAAAAAAA VVVVVVVV" (repeatable)
    #[arg(long = "cheat")]
    cheats: Vec<Cheat>,

    /// Write an instruction trace to this file
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Maximum number of traced instructions
    #[arg(long, requires = "trace")]
    trace_limit: Option<u64>,

    /// Print the final CPU registers as JSON
    #[arg(long)]
    dump_registers: bool,
}

fn main() -> Result<()> {
    // Optional .env for RUST_LOG and friends
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("n64rx v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => MachineConfig::from_file(path)?,
        None => MachineConfig::default(),
    };
    if args.permissive {
        config.execution_mode = ExecutionMode::Permissive;
    }

    let mut system = System::with_config(config)?;

    info!("Loading cartridge from: {}", args.rom.display());
    if let Err(e) = system.load_cartridge_file(&args.rom) {
        error!("Failed to load cartridge: {}", e);
        return Err(e);
    }

    if let Some(path) = &args.load_state {
        info!("Loading save state from: {}", path.display());
        let snapshot = Snapshot::load_from_file(path)?;
        system.load_state(&snapshot)?;
    }

    if !args.cheats.is_empty() {
        system.apply_cheats(&args.cheats)?;
        info!("{} cheats applied", args.cheats.len());
    }

    if let Some(path) = &args.trace {
        system.enable_tracing(path, args.trace_limit)?;
    }

    info!("Starting emulation...");
    let log_interval = (args.steps / 10).max(1);
    for step in 0..args.steps {
        if step % log_interval == 0 && step > 0 {
            info!(
                "Progress: {}/{} steps | PC: 0x{:08X} | Frames: {}",
                step,
                args.steps,
                system.pc(),
                system.rdp().frame_count()
            );
        }

        if let Err(e) = system.macro_step() {
            error!("Error at PC=0x{:08X}: {}", system.pc(), e);
            error!("Macro-step: {}", step);
            system.cpu().dump_registers();
            system.disable_tracing();
            return Err(e);
        }
    }
    system.disable_tracing();

    info!("Emulation completed successfully!");
    info!("Instructions executed: {}", system.instructions());
    info!("Frames rendered: {}", system.rdp().frame_count());
    info!("RSP tasks completed: {}", system.rsp().tasks_completed());
    info!("Final PC: 0x{:08X}", system.pc());

    if let Some(path) = &args.save_state {
        system.save_state().save_to_file(path)?;
        info!("Save state written to: {}", path.display());
    }

    if args.dump_registers {
        let json = serde_json::to_string_pretty(&system.cpu().to_state())
            .map_err(|e| EmulatorError::Serialization(e.to_string()))?;
        println!("{}", json);
    }

    Ok(())
}
