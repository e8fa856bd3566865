use crate::constants::memory_map::{FONT_GLYPH_SIZE, FONT_START, PROGRAM_START};
use crate::constants::RAM_SIZE;
use crate::errors::Chip8Error;
use log::error;

/// The 16-glyph hexadecimal digit sprite table, five bytes per glyph.
/// Written once at construction; programs are expected to leave it alone.
const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// The 4096-byte address space: font table at the bottom, program image
/// from 0x200 up. All accesses are bounds-checked and reported as
/// `MemoryFault` rather than panicking.
pub struct Ram {
    bytes: [u8; RAM_SIZE],
}

impl Ram {
    pub fn new() -> Self {
        let mut ram = Ram {
            bytes: [0; RAM_SIZE],
        };
        let font_start = FONT_START as usize;
        ram.bytes[font_start..font_start + FONT.len()].copy_from_slice(&FONT);
        ram
    }

    /// Copy a program image in at the load offset. Fails with
    /// `ProgramTooLarge` when the image cannot fit above 0x200.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), Chip8Error> {
        let start = PROGRAM_START as usize;
        if program.len() > RAM_SIZE - start {
            error!(
                "program of {} bytes exceeds the {} available",
                program.len(),
                RAM_SIZE - start
            );
            return Err(Chip8Error::ProgramTooLarge {
                len: program.len(),
            });
        }
        self.bytes[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Validate an address range, yielding its starting index.
    fn check_range(&self, addr: u16, len: usize) -> Result<usize, Chip8Error> {
        let start = addr as usize;
        if start + len > RAM_SIZE {
            error!("memory access fault at {:#05X} (length {})", addr, len);
            return Err(Chip8Error::MemoryFault { addr, len });
        }
        Ok(start)
    }

    pub fn read(&self, addr: u16) -> Result<u8, Chip8Error> {
        let start = self.check_range(addr, 1)?;
        Ok(self.bytes[start])
    }

    pub fn write(&mut self, addr: u16, value: u8) -> Result<(), Chip8Error> {
        let start = self.check_range(addr, 1)?;
        self.bytes[start] = value;
        Ok(())
    }

    /// Fetch a big-endian instruction word.
    pub fn read_word(&self, addr: u16) -> Result<u16, Chip8Error> {
        let start = self.check_range(addr, 2)?;
        Ok(u16::from(self.bytes[start]) << 8 | u16::from(self.bytes[start + 1]))
    }

    /// Borrow `len` contiguous bytes for sprite compositing or register
    /// block loads.
    pub fn read_block(&self, addr: u16, len: usize) -> Result<&[u8], Chip8Error> {
        let start = self.check_range(addr, len)?;
        Ok(&self.bytes[start..start + len])
    }

    /// Write a contiguous run of bytes, used by BCD and register block
    /// stores. The range is validated before anything is mutated.
    pub fn write_block(&mut self, addr: u16, data: &[u8]) -> Result<(), Chip8Error> {
        let start = self.check_range(addr, data.len())?;
        self.bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Address of the font sprite for a hexadecimal digit value.
    pub fn digit_sprite_addr(digit: u8) -> u16 {
        FONT_START + u16::from(digit) * FONT_GLYPH_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_zeroed_above_font() {
        let ram = Ram::new();
        assert_eq!(ram.bytes[FONT.len()..], [0; RAM_SIZE - 80]);
    }

    #[test]
    fn test_font_loaded_at_bottom() {
        let ram = Ram::new();
        assert_eq!(&ram.bytes[..5], &[0xF0, 0x90, 0x90, 0x90, 0xF0]);
        assert_eq!(Ram::digit_sprite_addr(0xF), 75);
    }

    #[test]
    fn test_program_load_ok() {
        let mut ram = Ram::new();
        ram.load_program(&[0x00, 0xE0]).unwrap();
        assert_eq!(ram.read_block(0x200, 2).unwrap(), &[0x00, 0xE0]);
    }

    #[test]
    fn test_program_load_max_size() {
        let mut ram = Ram::new();
        let program = vec![0xAA; RAM_SIZE - 0x200];
        ram.load_program(&program).unwrap();
        assert_eq!(ram.read(0xFFF).unwrap(), 0xAA);
    }

    #[test]
    fn test_program_too_large() {
        let mut ram = Ram::new();
        let program = vec![0xAA; RAM_SIZE - 0x200 + 1];
        assert_eq!(
            ram.load_program(&program),
            Err(Chip8Error::ProgramTooLarge { len: 3585 })
        );
    }

    #[test]
    fn test_read_word_big_endian() {
        let mut ram = Ram::new();
        ram.write_block(0x300, &[0x12, 0x34]).unwrap();
        assert_eq!(ram.read_word(0x300).unwrap(), 0x1234);
    }

    #[test]
    fn test_sprite_read_out_of_range() {
        let ram = Ram::new();
        assert_eq!(
            ram.read_block(0xFFE, 5),
            Err(Chip8Error::MemoryFault { addr: 0xFFE, len: 5 })
        );
    }

    #[test]
    fn test_write_block_fault_leaves_memory_untouched() {
        let mut ram = Ram::new();
        assert!(ram.write_block(0xFFE, &[1, 2, 3]).is_err());
        assert_eq!(ram.read(0xFFE).unwrap(), 0);
        assert_eq!(ram.read(0xFFF).unwrap(), 0);
    }
}
