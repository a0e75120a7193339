//! BCC 500 Emulator - CLI Entry Point
//!
//! Commands:
//! - `bcc500-emu run` - Bootstrap and run the machine
//! - `bcc500-emu debug` - Interactive terminal debugger
//! - `bcc500-emu disasm <image>` - List a ROM text image
//! - `bcc500-emu dump-image` - Write the diagnostic as a ROM text image

use bcc500::{
    Machine, MachineConfig, MachineError, NoEvents, StopReason, UnitId,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bcc500-emu")]
#[command(version)]
#[command(about = "A microinstruction-level emulator of the BCC 500 micro-engines")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by `run` and `debug`.
#[derive(clap::Args)]
struct MachineArgs {
    /// Machine configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// ROM text image for CPU0 (replaces the diagnostic)
    #[arg(short, long)]
    image: Option<PathBuf>,
    /// Do not preload the diagnostic into CPU0
    #[arg(long)]
    no_diagnostic: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap the machine and run it
    Run {
        #[command(flatten)]
        machine: MachineArgs,
        /// Scheduler iterations to run (default: 10000, or the configured limit)
        #[arg(short, long)]
        steps: Option<u64>,
        /// Print a trace line per microcycle
        #[arg(short, long)]
        trace: bool,
        /// Write the final unit state as JSON
        #[arg(long)]
        dump_state: Option<PathBuf>,
    },
    /// Interactive terminal debugger
    Debug {
        #[command(flatten)]
        machine: MachineArgs,
    },
    /// List the populated entries of a ROM text image
    Disasm {
        /// Path to the image
        image: PathBuf,
    },
    /// Write the built-in diagnostic as a ROM text image
    DumpImage {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

const DEFAULT_STEPS: u64 = 10_000;

fn main() {
    let cli = Cli::parse();

    let trace = matches!(cli.command, Some(Commands::Run { trace: true, .. }));
    init_logging(trace);

    match cli.command {
        Some(Commands::Run { machine, steps, trace: _, dump_state }) => {
            run_machine(&machine, steps, dump_state);
        }
        Some(Commands::Debug { machine }) => {
            debug_machine(&machine);
        }
        Some(Commands::Disasm { image }) => {
            disassemble_image(&image);
        }
        Some(Commands::DumpImage { output }) => {
            dump_image(output);
        }
        None => {
            println!("BCC 500 Emulator v{}", env!("CARGO_PKG_VERSION"));
            println!("A microinstruction-level emulator of the BCC 500 micro-engines");
            println!();
            println!("Use --help for available commands");
        }
    }
}

/// `RUST_LOG` wins; `--trace` turns on the per-cycle lines.
fn init_logging(trace: bool) {
    let default = if trace { "info,bcc500::trace=trace,bcc500::state=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn exit_with(error: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", error);
    std::process::exit(1);
}

fn build_machine(args: &MachineArgs) -> Result<(Machine, MachineConfig), MachineError> {
    let mut config = match &args.config {
        Some(path) => MachineConfig::load(path)?,
        None => MachineConfig::default(),
    };
    if let Some(image) = &args.image {
        config.set_image(UnitId::Cpu0, image.clone());
        config.preload_diagnostic = false;
    }
    if args.no_diagnostic {
        config.preload_diagnostic = false;
    }
    let machine = Machine::from_config(&config)?;
    Ok((machine, config))
}

fn run_machine(args: &MachineArgs, steps: Option<u64>, dump_state: Option<PathBuf>) {
    let (mut machine, config) = build_machine(args).unwrap_or_else(|e| exit_with(e));
    let limit = steps.or(config.step_limit).unwrap_or(DEFAULT_STEPS);

    let units: Vec<String> = machine.enabled_units().map(|u| u.to_string()).collect();
    println!("Running {} for {} iterations", units.join(", "), limit);

    let outcome = machine.run(&mut NoEvents, Some(limit));

    println!();
    match &outcome {
        Ok(StopReason::Stepped) => println!("Stopped: step limit reached"),
        Ok(StopReason::Breakpoint { unit, address }) => {
            println!("Stopped: {} breakpoint at {:04o}", unit, address)
        }
        Ok(StopReason::HostStop) => println!("Stopped: host request"),
        Err(e) => eprintln!("Fatal: {}", e),
    }
    println!("Iterations: {}", machine.iterations());
    for unit in machine.enabled_units() {
        let engine = machine.unit(unit);
        let s = &engine.state;
        println!(
            "{:<4} O={:04o} OS={:04o} M={:08o} Q={:08o} Z={:08o} R0={:08o} cycles={}",
            unit,
            s.address(),
            s.saved_address(),
            s.m(),
            s.q(),
            s.z(),
            s.holding(0),
            engine.cycles
        );
    }

    if let Some(path) = dump_state {
        let json = serde_json::to_string_pretty(&machine.snapshot()).unwrap_or_else(|e| exit_with(e));
        if let Err(e) = std::fs::write(&path, json) {
            exit_with(format!("{}: {}", path.display(), e));
        }
        println!("State written to {}", path.display());
    }

    if outcome.is_err() {
        std::process::exit(1);
    }
}

#[cfg(feature = "tui")]
fn debug_machine(args: &MachineArgs) {
    let (machine, _) = build_machine(args).unwrap_or_else(|e| exit_with(e));
    if let Err(e) = bcc500::run_debugger(machine) {
        exit_with(format!("debugger: {}", e));
    }
}

#[cfg(not(feature = "tui"))]
fn debug_machine(_args: &MachineArgs) {
    exit_with("built without the `tui` feature");
}

fn disassemble_image(path: &Path) {
    let words = bcc500::load_rom(path).unwrap_or_else(|e| exit_with(e));
    print!("{}", bcc500::image::listing(&words));
}

fn dump_image(output: Option<PathBuf>) {
    let mut rom = bcc500::ControlStore::new();
    bcc500::image::load_diagnostic(&mut rom);
    match output {
        Some(path) => {
            bcc500::save_rom(&path, &rom).unwrap_or_else(|e| exit_with(e));
            println!("Diagnostic written to {}", path.display());
        }
        None => print!("{}", bcc500::image::format_rom(rom.words())),
    }
}
