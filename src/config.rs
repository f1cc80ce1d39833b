use crate::constants::{CLOCK_SPEED, MAX_SAVED_STATES, STACK_DEPTH, TIMER_HZ};

/// # Config
/// Knobs for one machine. `Config::default()` is a stock Chip-8 running at 500Hz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How many instructions `resume` aims to run per second.
    pub instructions_per_second: u32,
    /// How often the delay and sound timers count down.
    pub timer_hz: u32,
    /// How many nested CALLs are allowed.
    pub stack_depth: usize,
    /// How many past states are kept for `step_back`; 0 turns rewinding off.
    pub history_len: usize,
    /// Whether `resume` sleeps between cycles to hold `instructions_per_second`.
    pub throttle: bool,
    /// Seed for the random number generator; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Config {
    pub fn with_instructions_per_second(mut self, ips: u32) -> Self {
        self.instructions_per_second = ips;
        self
    }

    pub fn with_stack_depth(mut self, depth: usize) -> Self {
        self.stack_depth = depth;
        self
    }

    pub fn with_history_len(mut self, len: usize) -> Self {
        self.history_len = len;
        self
    }

    pub fn with_throttle(mut self, throttle: bool) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            instructions_per_second: CLOCK_SPEED,
            timer_hz: TIMER_HZ,
            stack_depth: STACK_DEPTH,
            history_len: MAX_SAVED_STATES,
            throttle: true,
            seed: None,
        }
    }
}
