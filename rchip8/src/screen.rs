use crossterm::style::Print;
use crossterm::{cursor, execute, queue, terminal};
use rchip8_core::constants::display::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use rchip8_core::display::DotGrid;
use std::io::{self, Write};

/// Terminal renderer. Every snapshot received is drawn as a complete frame
/// replacement, two pixel rows per text line using half-block glyphs.
/// Raw mode and the alternate screen are restored on drop.
pub struct Screen {
    out: io::Stdout,
}

impl Screen {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(out, terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(Screen { out })
    }

    pub fn draw(&mut self, frame: &DotGrid) -> io::Result<()> {
        for pair in 0..DISPLAY_HEIGHT / 2 {
            let mut line = String::with_capacity(DISPLAY_WIDTH * 3);
            for x in 0..DISPLAY_WIDTH {
                line.push(match (frame[pair * 2][x], frame[pair * 2 + 1][x]) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                });
            }
            queue!(self.out, cursor::MoveTo(0, pair as u16), Print(line))?;
        }
        self.out.flush()
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = execute!(self.out, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}
