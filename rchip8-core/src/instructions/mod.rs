pub mod instructions;

// Import trait implementations for CPU instruction categories
pub use instructions::Alu;
pub use instructions::ControlFlow;
pub use instructions::MemoryAccess;
pub use instructions::Peripheral;

/// A fully decoded instruction word. The set is closed: decoding either
/// yields one of these variants or fails, and execution matches on every
/// variant, so an unhandled operation cannot slip through.
///
/// `x`/`y` are register indices already narrowed to [0,15].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    ClearDisplay,                         // 00E0
    Return,                               // 00EE
    Jump { addr: u16 },                   // 1nnn
    Call { addr: u16 },                   // 2nnn
    SkipEqImm { x: usize, value: u8 },    // 3xkk
    SkipNeImm { x: usize, value: u8 },    // 4xkk
    SkipEqReg { x: usize, y: usize },     // 5xy0
    LoadImm { x: usize, value: u8 },      // 6xkk
    AddImm { x: usize, value: u8 },       // 7xkk
    Load { x: usize, y: usize },          // 8xy0
    Or { x: usize, y: usize },            // 8xy1
    And { x: usize, y: usize },           // 8xy2
    Xor { x: usize, y: usize },           // 8xy3
    Add { x: usize, y: usize },           // 8xy4
    Sub { x: usize, y: usize },           // 8xy5
    ShiftRight { x: usize },              // 8xy6
    SubNegate { x: usize, y: usize },     // 8xy7
    ShiftLeft { x: usize },               // 8xyE
    SkipNeReg { x: usize, y: usize },     // 9xy0
    LoadIndex { addr: u16 },              // Annn
    JumpOffset { addr: u16 },             // Bnnn
    Random { x: usize, mask: u8 },        // Cxkk
    Draw { x: usize, y: usize, height: u8 }, // Dxyn
    SkipKeyPressed { x: usize },          // Ex9E
    SkipKeyNotPressed { x: usize },       // ExA1
    LoadDelay { x: usize },               // Fx07
    WaitKey { x: usize },                 // Fx0A
    StoreDelay { x: usize },              // Fx15
    StoreSound { x: usize },              // Fx18
    AddIndex { x: usize },                // Fx1E
    LoadDigit { x: usize },               // Fx29
    StoreBcd { x: usize },                // Fx33
    StoreRegisters { x: usize },          // Fx55
    LoadRegisters { x: usize },           // Fx65
}
