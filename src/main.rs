//! CHIP-8 Emulator - CLI Entry Point
//!
//! Commands:
//! - `chip8-emu run <rom>` - Run headless for a fixed number of cycles
//! - `chip8-emu debug <rom>` - Interactive terminal debugger
//! - `chip8-emu disasm <rom>` - Disassemble a program
//! - `chip8-emu info <rom>` - Summarize a program image

use chip8::{Config, Cpu, CpuError, Rom, ShiftSource, StepOutcome};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chip8-emu")]
#[command(version = "0.1.0")]
#[command(about = "A CHIP-8 virtual machine interpreter")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Settings shared by every command that runs a program.
#[derive(Args)]
struct MachineArgs {
    /// JSON config file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Seed for the random number instruction
    #[arg(long)]
    seed: Option<u64>,
    /// Register shifted by 8XY6/8XYE: vy (original) or vx (CHIP-48)
    #[arg(long)]
    shift: Option<ShiftSource>,
    /// Instructions per second
    #[arg(long)]
    hz: Option<u32>,
}

impl MachineArgs {
    fn resolve(&self) -> Config {
        let mut config = match &self.config {
            Some(path) => Config::load(path).unwrap_or_else(|e| {
                eprintln!("❌ Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }),
            None => Config::default(),
        };

        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(shift) = self.shift {
            config.quirks.shift_source = shift;
        }
        if let Some(hz) = self.hz {
            config.cpu_hz = hz.max(1);
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program headless and print the final state
    Run {
        /// Path to the program image
        rom: PathBuf,
        /// Maximum number of cycles to run (default: from config, 10000)
        #[arg(short, long)]
        max_cycles: Option<u64>,
        /// Show trace output
        #[arg(short, long)]
        trace: bool,
        /// Write the final machine state as JSON to this file
        #[arg(long)]
        dump: Option<PathBuf>,
        /// Keys (hex digits) held down for the whole run
        #[arg(long, default_value = "")]
        keys: String,
        #[command(flatten)]
        machine: MachineArgs,
    },
    /// Interactive terminal debugger
    #[cfg(feature = "tui")]
    Debug {
        /// Path to the program image
        rom: PathBuf,
        /// Start executing immediately instead of paused
        #[arg(short, long)]
        run: bool,
        #[command(flatten)]
        machine: MachineArgs,
    },
    /// Disassemble a program to readable text
    Disasm {
        /// Path to the program image
        rom: PathBuf,
    },
    /// Show size and opcode statistics for a program
    Info {
        /// Path to the program image
        rom: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { rom, max_cycles, trace, dump, keys, machine }) => {
            let mut config = machine.resolve();
            if let Some(max) = max_cycles {
                config.max_cycles = max;
            }
            run_program(&rom, &config, trace, dump, &keys);
        }
        #[cfg(feature = "tui")]
        Some(Commands::Debug { rom, run, machine }) => {
            debug_program(&rom, &machine.resolve(), run);
        }
        Some(Commands::Disasm { rom }) => {
            disassemble_file(&rom);
        }
        Some(Commands::Info { rom }) => {
            show_info(&rom);
        }
        None => {
            println!("CHIP-8 Emulator v0.1.0");
            println!("A virtual machine interpreter for CHIP-8 programs");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn read_rom(path: &PathBuf) -> Rom {
    match chip8::load_rom(path) {
        Ok(rom) => {
            println!("📂 Loaded {} ({} bytes)", rom.name, rom.len());
            rom
        }
        Err(e) => {
            eprintln!("❌ Failed to load {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn run_program(path: &PathBuf, config: &Config, trace: bool, dump: Option<PathBuf>, keys: &str) {
    use chip8::rom::disassemble_instruction;

    println!("🔧 Running: {}", path.display());
    let rom = read_rom(path);

    let mut cpu = config.build_cpu();
    if let Err(e) = cpu.load_program(&rom.bytes) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }
    for key in keys.chars().filter_map(|c| c.to_digit(16)) {
        cpu.keys.press(key as u8);
    }

    println!();
    println!("━━━ Execution ━━━");

    // No wall clock here: timers tick every `steps_per_tick` instructions.
    let steps_per_tick = config.steps_per_tick();
    let mut fault: Option<CpuError> = None;
    let mut unknown = 0u64;
    let mut waiting = 0u64;

    while cpu.cycles < config.max_cycles {
        let pc = cpu.regs.pc;
        match cpu.step() {
            Ok(outcome) => {
                match outcome {
                    StepOutcome::Unknown(_) => unknown += 1,
                    StepOutcome::WaitingForKey => waiting += 1,
                    StepOutcome::Executed(_) => {}
                }
                if trace {
                    let word = cpu.mem.read_word(pc as usize).unwrap_or(0);
                    println!("{:03X}: {:04X}  {:<16} I={:03X} VF={:02X}",
                        pc, word, disassemble_instruction(word), cpu.regs.i, cpu.flag());
                }
            }
            Err(e) => {
                eprintln!("❌ CPU error at PC={:03X}: {}", pc, e);
                fault = Some(e);
                break;
            }
        }
        if cpu.cycles % steps_per_tick == 0 {
            cpu.tick();
        }
    }

    print_result(&cpu, unknown, waiting);

    if let Some(path) = dump {
        write_dump(&cpu, &path);
    }

    if fault.is_some() {
        std::process::exit(1);
    }
    if cpu.cycles >= config.max_cycles {
        println!();
        println!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", config.max_cycles);
    }
}

fn print_result(cpu: &Cpu, unknown: u64, waiting: u64) {
    println!();
    println!("━━━ Display ━━━");
    print!("{}", cpu.display.to_ascii());
    println!();
    println!("━━━ Result ━━━");
    println!("Cycles: {}", cpu.cycles);
    println!("PC: {:03X}   I: {:03X}   DT: {}   ST: {}",
        cpu.regs.pc, cpu.regs.i, cpu.timers.delay, cpu.timers.sound);
    let regs: Vec<String> = cpu.regs.v.iter().enumerate()
        .map(|(n, v)| format!("V{:X}={:02X}", n, v))
        .collect();
    println!("{}", regs[..8].join(" "));
    println!("{}", regs[8..].join(" "));
    println!("Stack depth: {}", cpu.stack.depth());
    if unknown > 0 {
        println!("Unknown instructions skipped: {}", unknown);
    }
    if waiting > 0 {
        println!("Steps spent waiting for a key: {}", waiting);
    }
}

fn write_dump(cpu: &Cpu, path: &PathBuf) {
    let json = match serde_json::to_string_pretty(cpu) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("❌ Failed to serialize state: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = std::fs::write(path, json) {
        eprintln!("❌ Failed to write {}: {}", path.display(), e);
        std::process::exit(1);
    }
    println!("✓ State written to {}", path.display());
}

#[cfg(feature = "tui")]
fn debug_program(path: &PathBuf, config: &Config, run: bool) {
    println!("🔍 Loading: {}", path.display());
    let rom = read_rom(path);

    println!("🚀 Launching debugger...");
    if let Err(e) = chip8::run_debugger(rom, config, run) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

fn disassemble_file(path: &PathBuf) {
    let rom = read_rom(path);
    println!();
    println!("{}", chip8::disassemble(&rom.bytes, chip8::cpu::memory::PROGRAM_START as u16));
}

fn show_info(path: &PathBuf) {
    use chip8::cpu::decode::decode;
    use chip8::cpu::memory::MAX_PROGRAM_SIZE;
    use std::collections::BTreeMap;

    let rom = read_rom(path);
    let mut groups: BTreeMap<u8, usize> = BTreeMap::new();
    let mut unknown = 0;
    for word in rom.words() {
        match decode(word) {
            Ok(_) => *groups.entry((word >> 12) as u8).or_default() += 1,
            Err(_) => unknown += 1,
        }
    }

    println!();
    println!("Name:    {}", rom.name);
    println!("Size:    {} bytes ({}% of {} available)",
        rom.len(), rom.len() * 100 / MAX_PROGRAM_SIZE, MAX_PROGRAM_SIZE);
    println!("Words:   {} decodable, {} data/unknown", groups.values().sum::<usize>(), unknown);
    for (group, count) in groups {
        println!("  {:X}xxx  {}", group, count);
    }
}
