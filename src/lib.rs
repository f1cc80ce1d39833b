//! A CHIP-8 virtual machine.
//!
//! The [`Chip8`] controller owns the whole machine and drives it through the
//! capabilities in [`peripherals`]: a keyboard to poll, a speaker to start and stop,
//! a sink for finished frames, and a clock.
//!
//! ```no_run
//! use emu8::{Chip8, Config, Peripherals};
//!
//! let rom = std::fs::read("pong.ch8").unwrap();
//! let mut chip8 = Chip8::new(Config::default(), Peripherals::default());
//! if let Err(fault) = chip8.run(&rom) {
//!     eprintln!("{}", fault);
//! }
//! ```

pub use chip8::{Chip8, ExecState, HaltHandle, Snapshot};
pub use config::Config;
pub use error::{Fault, Result};
pub use frame_buffer::FrameBuffer;
pub use opcode::Opcode;
pub use peripherals::{
    Clock, Headless, KeyState, Keyboard, Mute, Peripherals, Speaker, SystemClock, Unplugged,
    VideoSink,
};
pub use stack::Stack;
pub use state::State;
pub use timers::{Timers, Tone};

mod chip8;
mod config;
pub mod constants;
mod error;
mod frame_buffer;
mod instruction;
mod opcode;
mod operations;
pub mod peripherals;
mod stack;
mod state;
mod timers;
