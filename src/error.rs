use thiserror::Error;

/// Everything that can stop the machine.
///
/// These all come from the program being run rather than the host, so none of
/// them are retried. The controller moves to `Stopped` and hands the fault back.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    #[error("invalid opcode {opcode:#06X} at {addr:#05X}")]
    InvalidOpcode { opcode: u16, addr: u16 },

    #[error("program is {len} bytes but at most {max} bytes fit in memory")]
    ProgramTooLarge { len: usize, max: usize },

    #[error("stack overflow: CALL beyond a depth of {depth}")]
    StackOverflow { depth: usize },

    #[error("stack underflow: RET with an empty stack")]
    StackUnderflow,

    #[error("memory access out of bounds at {addr:#06X}")]
    AddressOutOfBounds { addr: usize },
}

pub type Result<T> = std::result::Result<T, Fault>;
