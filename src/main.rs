//! PDP-11 Emulator - CLI Entry Point
//!
//! Usage:
//! - `pdp11-emu < program.oct` - run, print statistics
//! - `pdp11-emu -t < program.oct` - also trace each instruction
//! - `pdp11-emu -v < program.oct` - trace with registers, operands, flags and a memory dump
//! - `pdp11-emu program.oct` - read the image from a file instead of stdin

use clap::Parser;
use pdp11::config::{RunConfig, TraceMode};
use pdp11::cpu::trace::{NullSink, TraceSink};
use pdp11::loader::{self, ProgramImage};
use pdp11::report::{self, Summary, TextTracer};
use pdp11::{Cpu, CpuError};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pdp11-emu")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "An instruction-level emulator for a subset of the PDP-11")]
struct Cli {
    /// Octal program image (reads stdin when omitted)
    program: Option<String>,

    /// Trace each executed instruction
    #[arg(short, long, conflicts_with = "verbose")]
    trace: bool,

    /// Trace with registers, operand values, flags and a final memory dump
    #[arg(short, long)]
    verbose: bool,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,

    /// Stop after this many instructions
    #[arg(long)]
    max_steps: Option<u64>,

    /// Memory size in 16-bit words
    #[arg(long, default_value_t = pdp11::cpu::memory::DEFAULT_WORDS)]
    memory_words: usize,
}

impl Cli {
    fn config(&self) -> RunConfig {
        RunConfig {
            trace: TraceMode::from_switches(self.trace, self.verbose),
            memory_words: self.memory_words,
            max_steps: self.max_steps,
            json: self.json,
        }
    }
}

/// Exit status when the step limit stops a running program.
const EXIT_STEP_LIMIT: u8 = 2;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    if let Err(e) = config.validate() {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    let image = match read_program(cli.program.as_deref()) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run_program(&image, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn read_program(path: Option<&str>) -> Result<ProgramImage, loader::LoadError> {
    match path {
        Some(path) => loader::load_file(path),
        None => loader::read_image(io::stdin().lock()),
    }
}

fn run_program(image: &ProgramImage, config: &RunConfig) -> io::Result<ExitCode> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if config.trace.verbose() {
        out.write_all(report::render_image(&image.words).as_bytes())?;
    }

    let mut cpu = Cpu::new(config.memory_words);
    if let Err(e) = cpu.load_program(&image.words) {
        eprintln!("error: {}", e);
        return Ok(ExitCode::FAILURE);
    }

    if config.trace.traces() {
        out.write_all(report::render_trace_header().as_bytes())?;
    }

    let (result, out) = if config.trace.traces() {
        let mut tracer = TextTracer::new(out, config.trace.verbose());
        let result = execute(&mut cpu, config, &mut tracer);
        (result, tracer.finish()?)
    } else {
        (execute(&mut cpu, config, &mut NullSink), out)
    };
    let mut out = out;

    if let Err(e) = result {
        match e {
            CpuError::InvalidOpcode { pc, .. } => {
                out.write_all(report::render_bad_instruction(pc).as_bytes())?;
            }
            other => {
                if config.trace.traces() {
                    writeln!(out)?;
                }
                eprintln!("error: {}", other);
            }
        }
        out.flush()?;
        return Ok(ExitCode::FAILURE);
    }

    if config.json {
        let json = Summary::of(&cpu)
            .to_json()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        writeln!(out, "{}", json)?;
    } else {
        if config.trace.traces() {
            writeln!(out)?;
        }
        out.write_all(report::render_statistics(cpu.stats()).as_bytes())?;
        if config.trace.verbose() {
            out.write_all(report::render_memory_dump(&cpu.mem).as_bytes())?;
        }
    }
    out.flush()?;

    if cpu.is_running() {
        eprintln!(
            "warning: stopped after {} instructions without halting",
            cpu.stats().instructions_executed
        );
        return Ok(ExitCode::from(EXIT_STEP_LIMIT));
    }

    Ok(ExitCode::SUCCESS)
}

fn execute(cpu: &mut Cpu, config: &RunConfig, sink: &mut dyn TraceSink) -> Result<u64, CpuError> {
    match config.max_steps {
        Some(limit) => cpu.run_limited(limit, sink),
        None => cpu.run_traced(sink),
    }
}
