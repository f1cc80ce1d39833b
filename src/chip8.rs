use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Config;
use crate::constants::{period, MEMORY_SIZE, REGISTER_COUNT};
use crate::error::Result;
use crate::frame_buffer::FrameBuffer;
use crate::instruction::from_op;
use crate::operations::Bus;
use crate::peripherals::{KeyState, Peripherals};
use crate::state::State;
use crate::timers::Tone;

/// Where the controller is in its run/pause/step lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    /// Nothing running; the state after construction, reset and faults.
    Stopped,
    /// Inside `resume`, cycling continuously.
    Running,
    /// Suspended by a halt; can be stepped or resumed.
    Paused,
}

/// Asks a running machine to pause at the end of its current cycle.
///
/// Cheap to clone and safe to hand to a capability or another thread; nothing else
/// about the machine can be touched through it.
#[derive(Debug, Clone)]
pub struct HaltHandle(Arc<AtomicBool>);

impl HaltHandle {
    pub fn halt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// A read-only copy of the machine taken between cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub pc: u16,
    pub i: u16,
    pub v: [u8; REGISTER_COUNT],
    pub delay_timer: u8,
    pub sound_timer: u8,
    /// Oldest return address first.
    pub stack: Vec<u16>,
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub exec_state: ExecState,
}

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Tracks:
///  - current `state`, which nothing but this controller mutates
///  - `previous_states` for rewinding
///  - whether it's stopped, running or paused
///
/// Supplies interfaces for:
/// - running programs, and resetting/loading for finer control
/// - halting, resuming and single stepping
/// - stepping backwards through recent cycles
/// - taking snapshots of its state
///
/// A cycle is: count down the timers for however much time has passed, poll the
/// keyboard, execute the instruction at the pc, and render the frame if it changed.
pub struct Chip8 {
    state: State,
    exec_state: ExecState,
    previous_states: VecDeque<State>,
    config: Config,
    peripherals: Peripherals,
    rng: StdRng,
    halt_requested: Arc<AtomicBool>,
    last_tick: Option<Instant>,
}

impl Chip8 {
    pub fn new(config: Config, peripherals: Peripherals) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Chip8 {
            state: State::new(config.stack_depth, config.timer_hz),
            exec_state: ExecState::Stopped,
            previous_states: VecDeque::with_capacity(config.history_len),
            config,
            peripherals,
            rng,
            halt_requested: Arc::new(AtomicBool::new(false)),
            last_tick: None,
        }
    }

    /// Resets, loads `program` and runs it until halted or faulted.
    pub fn run(&mut self, program: &[u8]) -> Result<()> {
        self.reset();
        self.load(program)?;
        self.resume()
    }

    /// Puts the machine back to power-on and stops it. A tone that's playing is stopped.
    pub fn reset(&mut self) {
        if self.state.timers.sound > 0 {
            self.peripherals.speaker.stop_sound();
        }
        self.state.reset();
        self.previous_states.clear();
        self.halt_requested.store(false, Ordering::SeqCst);
        self.last_tick = None;
        self.set_exec_state(ExecState::Stopped);
    }

    /// Copies `program` into memory at 0x200 without touching anything else.
    pub fn load(&mut self, program: &[u8]) -> Result<()> {
        self.state.load(program)?;
        info!("loaded {} byte program", program.len());
        Ok(())
    }

    /// Pauses a running machine. Does nothing otherwise.
    pub fn halt(&mut self) {
        if self.exec_state == ExecState::Running {
            self.set_exec_state(ExecState::Paused);
        }
    }

    pub fn halt_handle(&self) -> HaltHandle {
        HaltHandle(Arc::clone(&self.halt_requested))
    }

    /// Cycles continuously until a `HaltHandle` asks it to pause or the program faults.
    ///
    /// Returns `Ok` once paused. A fault leaves the machine stopped and is returned.
    pub fn resume(&mut self) -> Result<()> {
        self.halt_requested.store(false, Ordering::SeqCst);
        self.set_exec_state(ExecState::Running);

        let cycle_time = period(self.config.instructions_per_second);
        let mut last_cycle = self.peripherals.clock.now();
        // time spent paused doesn't count towards the timers
        self.last_tick = Some(last_cycle);

        while self.exec_state == ExecState::Running {
            if self.halt_requested.swap(false, Ordering::SeqCst) {
                self.halt();
                break;
            }

            let due = self.elapsed_ticks();
            self.cycle(due)?;

            if self.config.throttle {
                let current_time = self.peripherals.clock.now();
                let elapsed_cycle_time = current_time.saturating_duration_since(last_cycle);
                if cycle_time > elapsed_cycle_time {
                    self.peripherals.clock.sleep(cycle_time - elapsed_cycle_time);
                }
                last_cycle = self.peripherals.clock.now();
            }
        }
        Ok(())
    }

    /// Runs exactly one cycle, pausing first if running.
    ///
    /// Stepping feeds one instruction period into the timers rather than wall time,
    /// so a paused machine's timers only move as it's stepped.
    pub fn step(&mut self) -> Result<()> {
        self.halt();
        let due = self
            .state
            .timers
            .accumulate_slice(self.config.instructions_per_second);
        self.cycle(due)
    }

    /// Undoes the most recent cycle. Only works while not running.
    ///
    /// The restored frame is rendered and the tone follows the restored sound timer.
    ///
    /// Returns false if there's nothing left to undo.
    pub fn step_back(&mut self) -> bool {
        if self.exec_state == ExecState::Running {
            return false;
        }
        match self.previous_states.pop_front() {
            Some(state) => {
                let was_playing = self.state.timers.sound > 0;
                self.state = state;
                match (was_playing, self.state.timers.sound > 0) {
                    (true, false) => self.peripherals.speaker.stop_sound(),
                    (false, true) => self.peripherals.speaker.start_sound(),
                    _ => {}
                }
                self.peripherals.video.render(&self.state.frame_buffer);
                self.state.frame_buffer.mark_clean();
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pc: self.state.pc,
            i: self.state.i,
            v: self.state.v,
            delay_timer: self.state.timers.delay,
            sound_timer: self.state.timers.sound,
            stack: self.state.stack.frames().to_vec(),
            memory: self.state.memory,
            frame_buffer: self.state.frame_buffer.clone(),
            exec_state: self.exec_state,
        }
    }

    pub fn exec_state(&self) -> ExecState {
        self.exec_state
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// How many cycles `step_back` can currently undo.
    pub fn history_len(&self) -> usize {
        self.previous_states.len()
    }

    fn set_exec_state(&mut self, next: ExecState) {
        if self.exec_state != next {
            debug!("{:?} -> {:?}", self.exec_state, next);
            self.exec_state = next;
        }
    }

    /// Timer ticks owed for the wall time since the last cycle.
    fn elapsed_ticks(&mut self) -> u32 {
        let now = self.peripherals.clock.now();
        let elapsed = match self.last_tick {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::ZERO,
        };
        self.last_tick = Some(now);
        self.state.timers.accumulate(elapsed)
    }

    fn cycle(&mut self, due_ticks: u32) -> Result<()> {
        self.save_state();
        self.tick_timers(due_ticks);

        let keys = self.peripherals.keyboard.poll();
        let result = self.execute(keys);
        self.render();

        if let Err(fault) = result {
            warn!("stopping on fault: {}", fault);
            self.set_exec_state(ExecState::Stopped);
            return Err(fault);
        }
        Ok(())
    }

    fn tick_timers(&mut self, due: u32) {
        for _ in 0..due {
            if self.state.timers.tick() == Tone::Stopped {
                self.peripherals.speaker.stop_sound();
            }
            if self.state.timers.delay == 0 && self.state.timers.sound == 0 {
                break;
            }
        }
    }

    /// Gets, decodes and executes the opcode currently pointed at by the pc.
    fn execute(&mut self, keys: KeyState) -> Result<()> {
        let pc = self.state.pc;
        let op = self.state.read_opcode(pc)?;
        let operation = from_op(op, pc)?;
        trace!(
            "{} v{:02X?} i{:04X} pc{:04X}",
            op,
            self.state.v,
            self.state.i,
            pc
        );

        let mut bus = Bus {
            keys,
            speaker: self.peripherals.speaker.as_mut(),
            rng: &mut self.rng,
        };
        operation(op, &mut self.state, &mut bus)
    }

    fn render(&mut self) {
        if self.state.frame_buffer.is_dirty() {
            self.peripherals.video.render(&self.state.frame_buffer);
            self.state.frame_buffer.mark_clean();
        }
    }

    /// Puts the current state in previous_states
    /// - if there are already `history_len` saved then the oldest is dropped
    fn save_state(&mut self) {
        if self.config.history_len == 0 {
            return;
        }
        if self.previous_states.len() == self.config.history_len {
            self.previous_states.pop_back();
        }
        self.previous_states.push_front(self.state.clone());
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new(Config::default(), Peripherals::default())
    }
}
