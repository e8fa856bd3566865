use crate::constants::registers::{REGISTER_COUNT, STACK_DEPTH};
use crate::constants::memory_map::PROGRAM_START;
use crate::constants::INSTRUCTION_SIZE;
use crate::decoder::decode;
use crate::display::FrameBuffer;
use crate::errors::Chip8Error;
use crate::input::Keypad;
use crate::instructions::{Alu, ControlFlow, Instruction, MemoryAccess, Peripheral};
use crate::memory::Ram;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Progress of the blocking key-wait operation (Fx0A). The keypad has no
/// release interrupt, so the CPU samples the bitmap once per cycle and
/// resumes on the first release edge between two samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyWait {
    Idle,
    Armed { dest: usize, previous: u16 },
}

/// The virtual CPU: register file, address register, program counter, call
/// stack, and the two countdown timers. Memory, display and keypad are
/// borrowed per cycle, never retained.
pub struct Cpu {
    // Registers a program can observe
    pub v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub delay: u8,
    pub sound: u8,

    // Internal state
    pub(crate) pc: u16,
    pub(crate) stack: heapless::Vec<u16, STACK_DEPTH>,
    pub(crate) key_wait: KeyWait,

    pub(crate) rng: StdRng,
}

impl Cpu {
    pub fn new() -> Self {
        Cpu {
            v: [0; REGISTER_COUNT],
            i: 0,
            delay: 0,
            sound: 0,
            pc: PROGRAM_START,
            stack: heapless::Vec::new(),
            key_wait: KeyWait::Idle,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// One fetch-decode-execute step, or one key-wait poll while blocked.
    /// Any error is terminal for the caller; the CPU never recovers
    /// internally.
    pub fn cycle(
        &mut self,
        ram: &mut Ram,
        display: &mut FrameBuffer,
        keypad: &Keypad,
    ) -> Result<(), Chip8Error> {
        if self.poll_key_wait(keypad) {
            return Ok(());
        }

        let pc = self.pc;
        let word = self.fetch(ram)?;
        let instruction = decode(word, pc)?;
        self.execute(instruction, ram, display, keypad)
    }

    /// Advance the key-wait state machine. Returns true while the CPU is
    /// blocked (including the cycle on which the wait completes).
    fn poll_key_wait(&mut self, keypad: &Keypad) -> bool {
        match self.key_wait {
            KeyWait::Idle => false,
            KeyWait::Armed { dest, previous } => {
                let sample = keypad.bits();
                let released = previous & !sample;
                if released == 0 {
                    self.key_wait = KeyWait::Armed {
                        dest,
                        previous: sample,
                    };
                } else {
                    // Lowest released key wins when several clear at once
                    self.v[dest] = released.trailing_zeros() as u8;
                    self.key_wait = KeyWait::Idle;
                }
                true
            }
        }
    }

    /// Read the big-endian word at the program counter and advance past it.
    fn fetch(&mut self, ram: &Ram) -> Result<u16, Chip8Error> {
        let word = ram.read_word(self.pc)?;
        self.pc = self.pc.wrapping_add(INSTRUCTION_SIZE);
        Ok(word)
    }

    /// Dispatch a decoded instruction. The match is exhaustive over the
    /// closed instruction set.
    pub fn execute(
        &mut self,
        instruction: Instruction,
        ram: &mut Ram,
        display: &mut FrameBuffer,
        keypad: &Keypad,
    ) -> Result<(), Chip8Error> {
        match instruction {
            Instruction::ClearDisplay => display.clear(),
            Instruction::Return => return self.subroutine_return(),
            Instruction::Jump { addr } => self.jump(addr),
            Instruction::Call { addr } => return self.subroutine_call(addr),
            Instruction::SkipEqImm { x, value } => self.skip_if(self.v[x] == value),
            Instruction::SkipNeImm { x, value } => self.skip_if(self.v[x] != value),
            Instruction::SkipEqReg { x, y } => self.skip_if(self.v[x] == self.v[y]),
            Instruction::SkipNeReg { x, y } => self.skip_if(self.v[x] != self.v[y]),
            Instruction::LoadImm { x, value } => self.load_immediate(x, value),
            Instruction::AddImm { x, value } => self.add_immediate(x, value),
            Instruction::Load { x, y } => self.load_register(x, y),
            Instruction::Or { x, y } => self.or(x, y),
            Instruction::And { x, y } => self.and(x, y),
            Instruction::Xor { x, y } => self.xor(x, y),
            Instruction::Add { x, y } => self.add(x, y),
            Instruction::Sub { x, y } => self.subtract(x, y),
            Instruction::ShiftRight { x } => self.shift_right(x),
            Instruction::SubNegate { x, y } => self.subtract_negate(x, y),
            Instruction::ShiftLeft { x } => self.shift_left(x),
            Instruction::LoadIndex { addr } => self.load_index(addr),
            Instruction::JumpOffset { addr } => self.jump_offset(addr),
            Instruction::Random { x, mask } => self.random(x, mask),
            Instruction::Draw { x, y, height } => return self.draw(x, y, height, ram, display),
            Instruction::SkipKeyPressed { x } => self.skip_key_pressed(x, keypad),
            Instruction::SkipKeyNotPressed { x } => self.skip_key_not_pressed(x, keypad),
            Instruction::LoadDelay { x } => self.load_delay(x),
            Instruction::WaitKey { x } => self.wait_key(x, keypad),
            Instruction::StoreDelay { x } => self.store_delay(x),
            Instruction::StoreSound { x } => self.store_sound(x),
            Instruction::AddIndex { x } => self.add_index(x),
            Instruction::LoadDigit { x } => self.load_digit(x),
            Instruction::StoreBcd { x } => return self.store_bcd(x, ram),
            Instruction::StoreRegisters { x } => return self.store_registers(x, ram),
            Instruction::LoadRegisters { x } => return self.load_registers(x, ram),
        }
        Ok(())
    }

    /// Decrement both countdown timers, floored at zero. Driven by the
    /// system's fixed-rate tick, not the instruction clock.
    pub fn tick_timers(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }
}
