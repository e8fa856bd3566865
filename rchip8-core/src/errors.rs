use core::fmt;

/// Typed failures surfaced by the emulation core. Load-time errors are
/// recoverable by the caller; everything else is fatal to the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chip8Error {
    /// Program image does not fit between the load offset and the top of RAM
    ProgramTooLarge { len: usize },
    /// Fetched word does not decode to any base-set operation
    IllegalInstruction { word: u16, pc: u16 },
    /// CALL with all sixteen stack slots in use
    StackOverflow { pc: u16 },
    /// RET with nothing on the stack
    StackUnderflow { pc: u16 },
    /// Fetch/sprite/BCD/block access past the end of memory
    MemoryFault { addr: u16, len: usize },
}

impl fmt::Display for Chip8Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Chip8Error::ProgramTooLarge { len } => {
                write!(f, "program is too large to load ({} bytes)", len)
            }
            Chip8Error::IllegalInstruction { word, pc } => {
                write!(f, "illegal instruction {:#06X} at {:#05X}", word, pc)
            }
            Chip8Error::StackOverflow { pc } => {
                write!(f, "call stack overflow at {:#05X}", pc)
            }
            Chip8Error::StackUnderflow { pc } => {
                write!(f, "return with empty call stack at {:#05X}", pc)
            }
            Chip8Error::MemoryFault { addr, len } => {
                write!(f, "memory access fault at {:#05X} (length {})", addr, len)
            }
        }
    }
}

impl std::error::Error for Chip8Error {}
