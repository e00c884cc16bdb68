//! intcode - run IntCode programs and search amplifier phase settings

mod logging;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{Level, info};

use intcode::{BestPhases, Program, Vm, VmConfig, best_phases, parse_program};

use crate::logging::LogFormat;

#[derive(Parser)]
#[command(name = "intcode")]
#[command(version)]
#[command(about = "IntCode virtual machine and amplifier pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level for VM and pipeline events (RUST_LOG overrides)
    #[arg(long, global = true, default_value = "warn")]
    log_level: Level,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    /// Abort a run after this many instructions
    #[arg(long, global = true, value_name = "N")]
    max_steps: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program once and print its outputs
    Run {
        /// Program file (comma separated integers)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Input values, consumed in order
        #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
        input: Vec<i64>,

        /// Print a JSON report instead of one output per line
        #[arg(long)]
        json: bool,
    },

    /// Find the phase order that maximizes the final output of an amplifier ring
    Amplify {
        /// Program file (comma separated integers)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Phase settings, one per stage
        #[arg(
            short,
            long,
            value_delimiter = ',',
            allow_negative_numbers = true,
            default_values_t = [5, 6, 7, 8, 9]
        )]
        phases: Vec<i64>,

        /// Value fed to the first stage after its phase
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        signal: i64,

        /// Print a JSON report
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct RunReport<'a> {
    program: &'a Path,
    inputs: &'a [i64],
    outputs: Vec<i64>,
}

#[derive(Serialize)]
struct AmplifyReport<'a> {
    program: &'a Path,
    signal: i64,
    #[serde(flatten)]
    best: BestPhases,
}

fn main() {
    let cli = Cli::parse();

    logging::init(cli.log_level, cli.log_format);

    let config = VmConfig {
        max_steps: cli.max_steps,
        ..VmConfig::default()
    };

    let result = match cli.command {
        Commands::Run { file, input, json } => run_command(&file, &input, json, config),
        Commands::Amplify {
            file,
            phases,
            signal,
            json,
        } => amplify_command(&file, &phases, signal, json, &config),
    };

    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_program(path: &Path) -> anyhow::Result<Program> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let program = parse_program(&source)
        .with_context(|| format!("failed to parse '{}'", path.display()))?;

    info!(
        target: "intcode::cli",
        path = %path.display(),
        cells = program.len(),
        "loaded program"
    );
    Ok(program)
}

fn run_command(path: &Path, inputs: &[i64], json: bool, config: VmConfig) -> anyhow::Result<()> {
    let program = load_program(path)?;

    let mut vm = Vm::with_config(&program, config);
    vm.extend_input(inputs.iter().copied());
    let outputs = vm
        .run_to_completion()
        .with_context(|| format!("running '{}'", path.display()))?;

    if json {
        let report = RunReport {
            program: path,
            inputs,
            outputs,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for value in outputs {
            println!("{}", value);
        }
    }

    Ok(())
}

fn amplify_command(
    path: &Path,
    phases: &[i64],
    signal: i64,
    json: bool,
    config: &VmConfig,
) -> anyhow::Result<()> {
    let program = load_program(path)?;

    let best = best_phases(&program, phases, signal, config)
        .with_context(|| format!("amplifying '{}' with phases {:?}", path.display(), phases))?;

    if json {
        let report = AmplifyReport {
            program: path,
            signal,
            best,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let order: Vec<String> = best.phases.iter().map(|p| p.to_string()).collect();
        println!("{}", best.output);
        println!("phases: {}", order.join(","));
    }

    Ok(())
}
