//! TMS1100 Emulator - CLI Entry Point
//!
//! Commands:
//! - `tms1100-emu play <rom>` - Play Merlin on the terminal front panel
//! - `tms1100-emu run <rom>` - Headless run with optional trace
//! - `tms1100-emu disasm <rom>` - List the de-interleaved ROM image

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tms1100::{Rom, Tms1100};

#[derive(Parser)]
#[command(name = "tms1100-emu")]
#[command(version = "0.1.0")]
#[command(about = "A TMS1100 emulator playing Milton Bradley's Merlin")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play Merlin on an interactive terminal front panel
    Play {
        /// Path to the raw fuse-map ROM dump
        #[arg(default_value = "mp3404.bin")]
        rom: String,
    },
    /// Run headless, printing R-line events
    Run {
        /// Path to the raw fuse-map ROM dump
        rom: String,
        /// Maximum number of instructions to run
        #[arg(short, long, default_value = "10000")]
        max_cycles: u64,
        /// Print every executed instruction
        #[arg(short, long)]
        trace: bool,
        /// Inter-step delay in microseconds (the hardware runs near 75)
        #[arg(long, default_value = "75")]
        tick_us: u64,
    },
    /// Disassemble a ROM into its linear fetch order
    Disasm {
        /// Path to the raw fuse-map ROM dump
        rom: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Play { rom }) => {
            play(&rom);
        }
        Some(Commands::Run {
            rom,
            max_cycles,
            trace,
            tick_us,
        }) => {
            run(&rom, max_cycles, trace, tick_us);
        }
        Some(Commands::Disasm { rom }) => {
            disassemble(&rom);
        }
        None => {
            println!("TMS1100 Emulator v0.1.0");
            println!("The 4-bit brain of Milton Bradley's Merlin");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn load_rom(path: &str) -> Arc<Rom> {
    match Rom::load(path) {
        Ok(rom) => Arc::new(rom),
        Err(e) => {
            eprintln!("failed to load ROM: {}", e);
            std::process::exit(1);
        }
    }
}

fn play(path: &str) {
    let rom = load_rom(path);
    if let Err(e) = tms1100::run_console(rom) {
        eprintln!("console error: {}", e);
        std::process::exit(1);
    }
}

fn run(path: &str, max_cycles: u64, trace: bool, tick_us: u64) {
    let rom = load_rom(path);
    let mut cpu = Tms1100::new(rom);

    cpu.on_output_r(Box::new(|index, on| {
        println!("R{:<2} {}", index, if on { "on" } else { "off" });
    }));
    cpu.on_output_o(Box::new(|value| {
        println!("O   {:#04x}", value);
    }));

    let delay = std::time::Duration::from_micros(tick_us);
    for _ in 0..max_cycles {
        let pa = cpu.state.regs.pa();
        let pc = cpu.state.regs.pc();

        match cpu.step() {
            Ok(op) => {
                if trace {
                    let regs = &cpu.state.regs;
                    println!(
                        "{:X}:{:02X} {:<10} a:{:X} x:{:X} y:{:X} s:{} cl:{}",
                        pa,
                        pc,
                        op.to_string(),
                        regs.a(),
                        regs.x(),
                        regs.y(),
                        regs.s() as u8,
                        regs.cl() as u8,
                    );
                }
            }
            Err(e) => {
                eprintln!("CPU fault at {:X}:{:02X}: {}", pa, pc, e);
                std::process::exit(1);
            }
        }

        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    println!("ran {} cycles", cpu.cycles());
}

fn disassemble(path: &str) {
    let rom = load_rom(path);

    for addr in 0..rom.size() as u16 {
        if addr % 64 == 0 {
            println!(
                "; chapter {} page {:X}",
                addr >> 10,
                (addr >> 6) & 0x0F
            );
        }
        let Ok(opcode) = rom.read(addr) else { break };
        println!(
            "{:03X}:  {:02X}  {}",
            addr,
            opcode,
            tms1100::cpu::decode(opcode)
        );
    }
}
