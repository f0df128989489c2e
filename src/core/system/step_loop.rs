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

//! Step loop
//!
//! Drives a [`System`] one macro-step at a time on a dedicated thread.
//!
//! ```text
//! Stopped --run/spawn--> Running <--pause/resume--> Paused
//!    ^                      |                          |
//!    +-------stop/fault-----+----------stop------------+
//! ```
//!
//! The machine sits behind its own mutex, held for the whole macro-step, so
//! every request from another thread lands on a step boundary. Loop control
//! lives under a separate mutex with a condition variable; a paused loop
//! parks on it instead of spinning.

use super::System;
use crate::core::error::{EmulatorError, Result};
use crate::core::save_state::Snapshot;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// Observable loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
    Paused,
}

/// Why a loop returned
#[derive(Debug)]
pub enum StopReason {
    /// `stop()` was called
    Requested,
    /// A macro-step failed; the machine is left at the faulting instruction
    Fault(EmulatorError),
}

#[derive(Debug)]
struct LoopControl {
    state: LoopState,
    pause_requested: bool,
    stop_requested: bool,
}

struct Shared {
    machine: Mutex<System>,
    control: Mutex<LoopControl>,
    cvar: Condvar,
}

impl Shared {
    fn machine(&self) -> MutexGuard<'_, System> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn control(&self) -> MutexGuard<'_, LoopControl> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Park while paused; returns false once a stop is requested
    fn wait_at_boundary(&self) -> bool {
        let mut control = self.control();
        loop {
            if control.stop_requested {
                control.stop_requested = false;
                control.pause_requested = false;
                control.state = LoopState::Stopped;
                self.cvar.notify_all();
                return false;
            }
            if !control.pause_requested {
                control.state = LoopState::Running;
                return true;
            }
            if control.state != LoopState::Paused {
                control.state = LoopState::Paused;
                log::info!("Step loop paused");
                self.cvar.notify_all();
            }
            control = self
                .cvar
                .wait(control)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn run_loop(&self) -> StopReason {
        loop {
            if !self.wait_at_boundary() {
                log::info!("Step loop stopped");
                return StopReason::Requested;
            }

            let result = self.machine().macro_step();

            if let Err(e) = result {
                log::error!("Step loop halted: {}", e);
                let mut control = self.control();
                control.state = LoopState::Stopped;
                control.pause_requested = false;
                control.stop_requested = false;
                self.cvar.notify_all();
                return StopReason::Fault(e);
            }

            // Let host threads take the machine between steps
            thread::yield_now();
        }
    }
}

/// Run/pause/resume/stop controller for a [`System`]
///
/// Cloning yields another handle to the same loop.
///
/// # Example
/// ```
/// use n64rx::core::config::MachineConfig;
/// use n64rx::core::system::{LoopState, StepLoop, StopReason, System};
///
/// let config = MachineConfig { entry_point: 0x8000_1000, ..Default::default() };
/// let mut system = System::with_config(config).unwrap();
/// // j 0x80001000; nop
/// system.bus_mut().write32(0x8000_1000, 0x0800_0400).unwrap();
///
/// let step_loop = StepLoop::new(system);
///
/// let handle = step_loop.spawn();
/// step_loop.pause();
/// assert_eq!(step_loop.state(), LoopState::Paused);
///
/// step_loop.stop();
/// assert!(matches!(handle.join().unwrap(), Ok(StopReason::Requested)));
/// assert_eq!(step_loop.state(), LoopState::Stopped);
/// ```
#[derive(Clone)]
pub struct StepLoop {
    shared: Arc<Shared>,
}

impl StepLoop {
    pub fn new(system: System) -> Self {
        Self {
            shared: Arc::new(Shared {
                machine: Mutex::new(system),
                control: Mutex::new(LoopControl {
                    state: LoopState::Stopped,
                    pause_requested: false,
                    stop_requested: false,
                }),
                cvar: Condvar::new(),
            }),
        }
    }

    fn start(&self) -> Result<()> {
        let mut control = self.shared.control();
        if control.state != LoopState::Stopped {
            return Err(EmulatorError::LoopState(format!(
                "cannot start a loop that is {:?}",
                control.state
            )));
        }
        control.state = LoopState::Running;
        control.pause_requested = false;
        control.stop_requested = false;
        log::info!("Step loop started");
        Ok(())
    }

    /// Run on the calling thread until stopped or faulted
    ///
    /// # Errors
    ///
    /// `LoopState` if the loop is already running or paused.
    pub fn run(&self) -> Result<StopReason> {
        self.start()?;
        Ok(self.shared.run_loop())
    }

    /// Run on a new thread
    ///
    /// The loop is `Running` when this returns. The thread yields the same
    /// result [`run`](Self::run) would.
    pub fn spawn(&self) -> JoinHandle<Result<StopReason>> {
        let started = self.start();
        let shared = Arc::clone(&self.shared);
        thread::spawn(move || {
            started?;
            Ok(shared.run_loop())
        })
    }

    /// Pause at the next boundary and wait until the loop has parked
    ///
    /// No-op unless the loop is running.
    pub fn pause(&self) {
        let mut control = self.shared.control();
        if control.state != LoopState::Running {
            return;
        }
        control.pause_requested = true;
        while control.pause_requested && control.state == LoopState::Running {
            control = self
                .shared
                .cvar
                .wait(control)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Continue a paused loop
    pub fn resume(&self) {
        let mut control = self.shared.control();
        if !control.pause_requested {
            return;
        }
        control.pause_requested = false;
        if control.state == LoopState::Paused {
            control.state = LoopState::Running;
            log::info!("Step loop resumed");
        }
        self.shared.cvar.notify_all();
    }

    /// Ask the loop to stop at the next boundary
    ///
    /// Wakes a paused loop. Does not wait for the loop to exit.
    pub fn stop(&self) {
        let mut control = self.shared.control();
        if control.state == LoopState::Stopped {
            return;
        }
        control.stop_requested = true;
        self.shared.cvar.notify_all();
    }

    pub fn state(&self) -> LoopState {
        self.shared.control().state
    }

    /// Borrow the machine at a step boundary
    pub fn with_system<R>(&self, f: impl FnOnce(&mut System) -> R) -> R {
        f(&mut self.shared.machine())
    }

    /// Snapshot the machine at a step boundary
    pub fn save_snapshot(&self) -> Snapshot {
        self.shared.machine().save_state()
    }

    /// Restore the machine at a step boundary
    pub fn load_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        self.shared.machine().load_state(snapshot)
    }
}
