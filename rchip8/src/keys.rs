use crossbeam_channel::{Sender, TrySendError};
use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use rchip8_core::constants::keypad::KEY_COUNT;
use rchip8_core::input::Keypad;
use std::time::{Duration, Instant};

/// Left-hand QWERTY block mapped onto the 4x4 hex keypad,
/// where '1' => 0x1 and 'x' => 0x0
const KEYMAP: [(char, u8); KEY_COUNT] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

const POLL_TIMEOUT: Duration = Duration::from_millis(15);

/// Terminals deliver no key-release events; a key counts as held until it
/// has stopped auto-repeating for this long.
const HOLD_WINDOW: Duration = Duration::from_millis(250);

fn lookup(key: char) -> Option<u8> {
    KEYMAP.iter().find(|(c, _)| *c == key).map(|&(_, k)| k)
}

/// Pump keyboard events into key-state bitmaps at roughly the timer rate.
/// Esc (or Ctrl-C, which raw mode swallows before the signal handler can
/// see it) raises the stop signal. Returns once the emulator side of the
/// key channel is gone.
pub fn pump(keys_tx: Sender<Keypad>, stop_tx: Sender<()>) {
    let mut last_seen: [Option<Instant>; KEY_COUNT] = [None; KEY_COUNT];

    loop {
        if let Ok(true) = poll(POLL_TIMEOUT) {
            if let Ok(Event::Key(event)) = read() {
                match event.code {
                    KeyCode::Esc => {
                        let _ = stop_tx.try_send(());
                        return;
                    }
                    KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                        let _ = stop_tx.try_send(());
                        return;
                    }
                    KeyCode::Char(key) => {
                        if let Some(mapped) = lookup(key.to_ascii_lowercase()) {
                            last_seen[mapped as usize] = Some(Instant::now());
                        }
                    }
                    _ => {}
                }
            }
        }

        let now = Instant::now();
        let mut state = Keypad::new();
        for (key, seen) in last_seen.iter_mut().enumerate() {
            match seen {
                Some(at) if now.duration_since(*at) < HOLD_WINDOW => state.press(key as u8),
                Some(_) => *seen = None,
                None => {}
            }
        }

        // Latest state wins; a full slot just means the run loop has not
        // taken the previous one yet
        if let Err(TrySendError::Disconnected(_)) = keys_tx.try_send(state) {
            return;
        }
    }
}
