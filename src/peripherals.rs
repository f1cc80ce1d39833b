use std::thread;
use std::time::{Duration, Instant};

use crate::constants::KEY_COUNT;
use crate::frame_buffer::FrameBuffer;

/// # Key State
/// Chip-8 input is generated with a hexadecimal keypad; this is which of its 16 keys
/// are currently held.
///
/// ```text
/// |1|2|3|C|
/// |4|5|6|D|
/// |7|8|9|E|
/// |A|0|B|F|
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState([bool; KEY_COUNT]);

impl KeyState {
    pub fn none() -> Self {
        KeyState::default()
    }

    /// Builds a state with the given keys held. Codes above 0xF are ignored.
    pub fn with(keys: &[u8]) -> Self {
        let mut state = KeyState::none();
        for &key in keys {
            state.set(key, true);
        }
        state
    }

    pub fn set(&mut self, key: u8, pressed: bool) {
        if let Some(slot) = self.0.get_mut(key as usize) {
            *slot = pressed;
        }
    }

    /// Codes above 0xF are never pressed.
    pub fn is_pressed(&self, key: u8) -> bool {
        self.0.get(key as usize).copied().unwrap_or(false)
    }

    /// The lowest held key, if any.
    pub fn first_pressed(&self) -> Option<u8> {
        self.0.iter().position(|&pressed| pressed).map(|key| key as u8)
    }
}

impl From<[bool; KEY_COUNT]> for KeyState {
    fn from(keys: [bool; KEY_COUNT]) -> Self {
        KeyState(keys)
    }
}

/// Reads the keypad. Called once per cycle, so it must return straight away.
pub trait Keyboard {
    fn poll(&mut self) -> KeyState;
}

/// A buzzer. Chip-8 only says when the tone starts and stops, not what it sounds like.
pub trait Speaker {
    fn start_sound(&mut self);
    fn stop_sound(&mut self);
}

/// Somewhere to show the frame buffer. Only called when the frame changed.
pub trait VideoSink {
    fn render(&mut self, frame: &FrameBuffer);
}

/// Monotonic time source used to pace the cycle loop and feed the timers.
pub trait Clock {
    fn now(&mut self) -> Instant;
    fn sleep(&mut self, duration: Duration);
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&mut self) -> Instant {
        Instant::now()
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// A keyboard with nothing held down.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unplugged;

impl Keyboard for Unplugged {
    fn poll(&mut self) -> KeyState {
        KeyState::none()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Mute;

impl Speaker for Mute {
    fn start_sound(&mut self) {}
    fn stop_sound(&mut self) {}
}

/// Drops every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

impl VideoSink for Headless {
    fn render(&mut self, _frame: &FrameBuffer) {}
}

/// The capabilities a running machine talks to.
pub struct Peripherals {
    pub keyboard: Box<dyn Keyboard>,
    pub speaker: Box<dyn Speaker>,
    pub video: Box<dyn VideoSink>,
    pub clock: Box<dyn Clock>,
}

impl Peripherals {
    pub fn new(
        keyboard: impl Keyboard + 'static,
        speaker: impl Speaker + 'static,
        video: impl VideoSink + 'static,
    ) -> Self {
        Peripherals {
            keyboard: Box::new(keyboard),
            speaker: Box::new(speaker),
            video: Box::new(video),
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }
}

impl Default for Peripherals {
    fn default() -> Self {
        Peripherals::new(Unplugged, Mute, Headless)
    }
}
