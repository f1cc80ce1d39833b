use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// # Timers
/// The delay and sound timers count down by one per tick while above zero.
///
/// Ticks are produced by feeding elapsed time into an accumulator: every whole tick
/// period that has built up becomes one tick and the remainder carries over. How many
/// instructions ran in that time doesn't matter.
///
/// The accumulator counts in nanoseconds scaled by the tick rate so that a tick is
/// exactly one second's worth of units and no rounding error builds up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
    hz: u32,
    accumulated: u128,
}

/// What a tick did to the sound timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Silent,
    Playing,
    /// The sound timer ran out on this tick.
    Stopped,
}

impl Timers {
    pub fn new(hz: u32) -> Self {
        Timers {
            delay: 0,
            sound: 0,
            hz: hz.max(1),
            accumulated: 0,
        }
    }

    /// Zeroes both timers and drops any partially accumulated tick.
    pub fn reset(&mut self) {
        self.delay = 0;
        self.sound = 0;
        self.accumulated = 0;
    }

    /// Decrements both timers once.
    pub fn tick(&mut self) -> Tone {
        if self.delay > 0 {
            self.delay -= 1;
        }

        match self.sound {
            0 => Tone::Silent,
            1 => {
                self.sound = 0;
                Tone::Stopped
            }
            _ => {
                self.sound -= 1;
                Tone::Playing
            }
        }
    }

    /// Adds `elapsed` wall time and returns how many whole ticks are now due.
    /// The caller is expected to `tick` that many times.
    pub fn accumulate(&mut self, elapsed: Duration) -> u32 {
        self.accumulated += elapsed.as_nanos() * u128::from(self.hz);
        self.drain()
    }

    /// Adds one `1 / per_second` slice of time, e.g. one instruction period.
    pub fn accumulate_slice(&mut self, per_second: u32) -> u32 {
        self.accumulated += NANOS_PER_SEC * u128::from(self.hz) / u128::from(per_second.max(1));
        self.drain()
    }

    fn drain(&mut self) -> u32 {
        let due = self.accumulated / NANOS_PER_SEC;
        self.accumulated %= NANOS_PER_SEC;
        u32::try_from(due).unwrap_or(u32::MAX)
    }

    pub fn hz(&self) -> u32 {
        self.hz
    }
}
