mod keys;
mod screen;

use log::error;
use rchip8_core::system::{Chip8, Config};

/// Configures the command-line interface using clap
fn get_cli_config<'a>() -> clap::ArgMatches<'a> {
    clap::App::new("Rust CHIP-8 Emulator (rchip8)")
        .version("0.1")
        .about("CHIP-8 virtual machine with a terminal front end")
        .arg(
            clap::Arg::with_name("rom")
                .required(true)
                .index(1)
                .help("CHIP-8 program image, loaded at 0x200"),
        )
        .arg(
            clap::Arg::with_name("cycle-hz")
                .long("cycle-hz")
                .takes_value(true)
                .help("Instruction issue rate in Hz (default 1000)"),
        )
        .get_matches()
}

fn main() {
    env_logger::init();

    let matches = get_cli_config();
    let rom_path = matches.value_of("rom").unwrap();

    let config = match matches.value_of("cycle-hz") {
        Some(raw) => match raw.parse::<u32>() {
            Ok(cycle_hz) if cycle_hz > 0 => Config { cycle_hz },
            _ => {
                error!("--cycle-hz must be a positive integer");
                std::process::exit(2);
            }
        },
        None => Config::default(),
    };

    // Programs are raw instruction streams; no format validation is done
    let program = match std::fs::read(rom_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("cannot read {}: {}", rom_path, e);
            std::process::exit(1);
        }
    };

    let (mut system, frame_rx, keys_tx, stop_tx) = Chip8::new(config);
    if let Err(e) = system.load_program(&program) {
        error!("{}", e);
        std::process::exit(1);
    }

    // Ctrl-C raises the same stop signal the run loop polls each tick
    let signal_stop = stop_tx.clone();
    let handler_result = ctrlc::set_handler(move || {
        if signal_stop.is_full() {
            std::process::exit(-1);
        }
        let _ = signal_stop.send(());
    });
    if let Err(e) = handler_result {
        error!("Signal handler failed: {:?}", e);
        return;
    }

    let emulator = std::thread::spawn(move || system.run());
    let keyboard = std::thread::spawn(move || keys::pump(keys_tx, stop_tx));

    let mut screen = match screen::Screen::new() {
        Ok(screen) => screen,
        Err(e) => {
            error!("cannot set up terminal: {}", e);
            std::process::exit(1);
        }
    };

    // Frames stop arriving once the run loop returns and its sender drops
    while let Ok(frame) = frame_rx.recv() {
        if screen.draw(&frame).is_err() {
            break;
        }
    }
    drop(screen);

    let _ = keyboard.join();
    match emulator.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!("emulator halted: {}", e);
            std::process::exit(1);
        }
        Err(_) => {
            error!("emulator thread panicked");
            std::process::exit(1);
        }
    }
}
