use crate::constants::timing::{DEFAULT_CYCLE_HZ, TIMER_HZ};
use crate::cpu::Cpu;
use crate::display::{DotGrid, FrameBuffer};
use crate::errors::Chip8Error;
use crate::input::Keypad;
use crate::memory::Ram;
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, info};
use std::time::{Duration, Instant};

/// Settings carried in from the host application.
pub struct Config {
    /// Instruction issue rate in Hz. The timer/display clock is fixed at
    /// 60 Hz regardless.
    pub cycle_hz: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cycle_hz: DEFAULT_CYCLE_HZ,
        }
    }
}

/// The assembled machine and its run loop. Owns every mutable component;
/// the only way in or out while running is the three boundary channels
/// handed back by `new`.
pub struct Chip8 {
    cpu: Cpu,
    ram: Ram,
    display: FrameBuffer,
    keypad: Keypad,
    config: Config,

    frame_tx: Sender<DotGrid>,
    keys_rx: Receiver<Keypad>,
    stop_rx: Receiver<()>,
}

impl Chip8 {
    /// Build a powered-on machine. Returns, along with the system itself:
    /// the outbound frame channel, the inbound key-state channel, and the
    /// stop-signal sender. All three are bounded to a single slot; the run
    /// loop never blocks on them.
    pub fn new(config: Config) -> (Self, Receiver<DotGrid>, Sender<Keypad>, Sender<()>) {
        let (frame_tx, frame_rx) = bounded(1);
        let (keys_tx, keys_rx) = bounded(1);
        let (stop_tx, stop_rx) = bounded(1);

        let system = Chip8 {
            cpu: Cpu::new(),
            ram: Ram::new(),
            display: FrameBuffer::new(),
            keypad: Keypad::new(),
            config,
            frame_tx,
            keys_rx,
            stop_rx,
        };
        (system, frame_rx, keys_tx, stop_tx)
    }

    /// Load a program image. Must happen before `run`.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), Chip8Error> {
        self.ram.load_program(program)
    }

    /// Execute until a stop signal arrives (Ok) or the CPU faults (Err).
    ///
    /// Two clock domains are paced against wall-clock time: instructions
    /// are issued in batches sized by the elapsed time since the last
    /// batch, and the 60 Hz tick (timer decrement + frame publish) is
    /// serviced with priority so heavy instruction load cannot starve it.
    pub fn run(&mut self) -> Result<(), Chip8Error> {
        let cycle_period_us = 1_000_000.0 / f64::from(self.config.cycle_hz);
        let tick_period = Duration::from_nanos(1_000_000_000 / TIMER_HZ);

        let mut next_tick = Instant::now() + tick_period;
        let mut cycle_timer = Instant::now();

        info!("starting run loop at {} cycles/s", self.config.cycle_hz);
        loop {
            if !self.stop_rx.is_empty() {
                info!("stop signal received");
                return Ok(());
            }

            let now = Instant::now();
            if now >= next_tick {
                self.service_tick();
                next_tick += tick_period;
                continue;
            }

            let due = (cycle_timer.elapsed().as_micros() as f64 / cycle_period_us) as u64;
            if due == 0 {
                // Nothing owed on either clock; yield rather than spin
                std::thread::sleep(tick_period / 4);
                continue;
            }

            cycle_timer = Instant::now();
            for _ in 0..due {
                // The tick outranks the remainder of an instruction batch
                if Instant::now() >= next_tick {
                    break;
                }
                self.drain_key_updates();
                self.cpu
                    .cycle(&mut self.ram, &mut self.display, &self.keypad)?;
            }
        }
    }

    /// One 60 Hz service point: decrement the timers, and publish a frame
    /// if pixels changed since the last one went out. A full channel means
    /// the consumer still holds the previous frame; publishing is skipped
    /// and the dirty flag stays set for the next tick.
    fn service_tick(&mut self) {
        self.cpu.tick_timers();

        if self.display.is_dirty() && !self.frame_tx.is_full() {
            let frame = self.display.snapshot();
            if self.frame_tx.try_send(frame).is_err() {
                debug!("frame receiver gone; continuing headless");
            }
        }
    }

    /// Take the freshest key-state update, if any. Most recent state wins;
    /// there is no history to replay.
    fn drain_key_updates(&mut self) {
        while let Ok(state) = self.keys_rx.try_recv() {
            self.keypad = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_program_rejects_oversize() {
        let (mut system, _frame_rx, _keys_tx, _stop_tx) = Chip8::new(Config::default());
        let oversize = vec![0u8; 0x1000];
        assert_eq!(
            system.load_program(&oversize),
            Err(Chip8Error::ProgramTooLarge { len: 0x1000 })
        );
    }

    #[test]
    fn test_stop_signal_terminates_run() {
        let (mut system, _frame_rx, _keys_tx, stop_tx) = Chip8::new(Config::default());
        // 0x200: jump to self
        system.load_program(&[0x12, 0x00]).unwrap();
        stop_tx.send(()).unwrap();
        assert_eq!(system.run(), Ok(()));
    }

    #[test]
    fn test_run_surfaces_fatal_cpu_error() {
        let (mut system, _frame_rx, _keys_tx, _stop_tx) = Chip8::new(Config {
            cycle_hz: 1_000_000,
        });
        // An unrecognized word is fatal, not skipped
        system.load_program(&[0xFF, 0xFF]).unwrap();
        assert_eq!(
            system.run(),
            Err(Chip8Error::IllegalInstruction {
                word: 0xFFFF,
                pc: 0x200
            })
        );
    }

    #[test]
    fn test_tick_decrements_timers_and_publishes_dirty_frame() {
        let (mut system, frame_rx, _keys_tx, _stop_tx) = Chip8::new(Config::default());
        system.cpu.delay = 10;
        system.display.clear();

        system.service_tick();
        assert_eq!(system.cpu.delay, 9);
        assert!(frame_rx.try_recv().is_ok());
        assert!(!system.display.is_dirty());

        // Clean frame: tick only touches the timers
        system.service_tick();
        assert_eq!(system.cpu.delay, 8);
        assert!(frame_rx.try_recv().is_err());
    }

    #[test]
    fn test_tick_skips_publish_when_consumer_stalled() {
        let (mut system, frame_rx, _keys_tx, _stop_tx) = Chip8::new(Config::default());
        system.display.clear();
        system.service_tick();
        // Consumer has not taken the frame; the next dirty tick must not
        // drop pixels on the floor
        system.display.clear();
        system.service_tick();
        assert!(system.display.is_dirty());

        frame_rx.try_recv().unwrap();
        system.service_tick();
        assert!(!system.display.is_dirty());
    }

    #[test]
    fn test_timer_reaches_zero_and_stays() {
        let (mut system, _frame_rx, _keys_tx, _stop_tx) = Chip8::new(Config::default());
        system.cpu.delay = 10;
        for _ in 0..10 {
            system.service_tick();
        }
        assert_eq!(system.cpu.delay, 0);
        for _ in 0..5 {
            system.service_tick();
        }
        assert_eq!(system.cpu.delay, 0);
    }

    #[test]
    fn test_key_updates_latest_wins() {
        let (mut system, _frame_rx, keys_tx, _stop_tx) = Chip8::new(Config::default());
        let mut first = Keypad::new();
        first.press(0x1);
        keys_tx.send(first).unwrap();
        system.drain_key_updates();

        let mut second = Keypad::new();
        second.press(0x2);
        keys_tx.send(second).unwrap();
        system.drain_key_updates();

        assert!(system.keypad.is_pressed(0x2));
        assert!(!system.keypad.is_pressed(0x1));
    }
}
