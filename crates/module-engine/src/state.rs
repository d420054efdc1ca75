//! Frame-consumption state machine.
//!
//! [`ModuleState`] carries no pixel data. A module configures a window of
//! `K` sub-frames in `create`:
//! - accumulating modules call [`ModuleState::push_sub_frame`] once per input
//!   and emit when [`ModuleState::is_ready`];
//! - splitting modules call [`ModuleState::begin_drain`] on a full input and
//!   then [`ModuleState::next_drain_slot`] once per output.
//!
//! A 1-in/1-out module is simply a window of one.

use serde::Serialize;
use sphereframe_common::{SphereError, SphereResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModulePhase {
    /// Not created, or destroyed.
    Idle,
    /// Waiting for input sub-frames.
    Buffering,
    /// The window is full; the next step is to emit.
    Ready,
    /// Handing out sub-frames of a held input.
    Draining,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleState {
    phase: ModulePhase,
    window: u32,
    cursor: u32,
    frames_seen: u64,
    frames_emitted: u64,
}

impl Default for ModuleState {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleState {
    pub fn new() -> Self {
        Self {
            phase: ModulePhase::Idle,
            window: 1,
            cursor: 0,
            frames_seen: 0,
            frames_emitted: 0,
        }
    }

    pub fn phase(&self) -> ModulePhase {
        self.phase
    }

    /// Sub-frames per output (accumulating) or per input (splitting).
    pub fn window(&self) -> u32 {
        self.window
    }

    /// Position inside the current window.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    pub fn is_created(&self) -> bool {
        self.phase != ModulePhase::Idle
    }

    pub fn is_ready(&self) -> bool {
        self.phase == ModulePhase::Ready
    }

    /// Whether the next `process` call needs an input frame.
    pub fn needs_input(&self) -> bool {
        self.phase != ModulePhase::Draining
    }

    /// Enter `Buffering` with a window of `window` sub-frames.
    pub fn on_create(&mut self, window: u32) {
        *self = Self {
            phase: ModulePhase::Buffering,
            window: window.max(1),
            ..Self::new()
        };
    }

    /// Record one input sub-frame and return its slot in the window.
    pub fn push_sub_frame(&mut self) -> SphereResult<u32> {
        match self.phase {
            ModulePhase::Buffering => {}
            ModulePhase::Idle => return Err(SphereError::processing("module is not created")),
            ModulePhase::Ready => {
                return Err(SphereError::processing(
                    "window is full; emit before pushing more input",
                ))
            }
            ModulePhase::Draining => {
                return Err(SphereError::processing(
                    "module is draining and takes no input",
                ))
            }
        }
        let slot = self.cursor;
        self.cursor += 1;
        self.frames_seen += 1;
        if self.cursor == self.window {
            self.phase = ModulePhase::Ready;
        }
        Ok(slot)
    }

    /// Hand out the completed window and start the next one.
    pub fn emit(&mut self) -> SphereResult<()> {
        if self.phase != ModulePhase::Ready {
            return Err(SphereError::processing(format!(
                "cannot emit in {:?} with {}/{} sub-frames",
                self.phase, self.cursor, self.window
            )));
        }
        self.phase = ModulePhase::Buffering;
        self.cursor = 0;
        self.frames_emitted += 1;
        Ok(())
    }

    /// Accept one full input that will be split into `window` outputs.
    pub fn begin_drain(&mut self) -> SphereResult<()> {
        if self.phase != ModulePhase::Buffering {
            return Err(SphereError::processing(format!(
                "cannot accept a frame to split in {:?}",
                self.phase
            )));
        }
        self.frames_seen += 1;
        self.cursor = 0;
        self.phase = ModulePhase::Draining;
        Ok(())
    }

    /// Next sub-frame slot to emit while draining; the last slot returns the
    /// machine to `Buffering`.
    pub fn next_drain_slot(&mut self) -> Option<u32> {
        if self.phase != ModulePhase::Draining {
            return None;
        }
        let slot = self.cursor;
        self.cursor += 1;
        self.frames_emitted += 1;
        if self.cursor == self.window {
            self.phase = ModulePhase::Buffering;
            self.cursor = 0;
        }
        Some(slot)
    }

    /// Reset counters and position. An uncreated machine stays `Idle`.
    pub fn flush(&mut self) {
        if self.phase == ModulePhase::Idle {
            return;
        }
        self.on_create(self.window);
    }

    pub fn destroy(&mut self) {
        *self = Self::new();
    }
}
