//! Human-readable rendering of trace records and run results.
//!
//! The output format follows the classic PDP-11 simulator coursework
//! layout: octal everywhere except the statistics block, which is decimal.

use crate::cpu::decode::{Instruction, Operand};
use crate::cpu::execute::{Cpu, CpuState};
use crate::cpu::flags::ConditionCodes;
use crate::cpu::memory::Memory;
use crate::cpu::stats::Statistics;
use crate::cpu::trace::{TraceRecord, TraceSink};
use serde::Serialize;
use std::io::{self, Write};

/// Number of words shown by the verbose memory dump.
pub const DUMP_WORDS: usize = 20;

/// Echo of the loaded image, printed in verbose mode.
pub fn render_image(words: &[u16]) -> String {
    let mut output = String::new();
    output.push_str("reading words in octal from stdin:\n");
    for word in words {
        output.push_str(&format!("  0{:06o}\n", word));
    }
    output
}

/// Header printed before the first traced instruction.
pub fn render_trace_header() -> String {
    "\ninstruction trace:\n".to_string()
}

/// Address prefix printed before each fetched instruction.
pub fn render_fetch_prefix(pc: u16) -> String {
    format!("at 0{:04o}, ", pc)
}

/// Render one executed instruction.
pub fn render_record(record: &TraceRecord, verbose: bool) -> String {
    let mut output = String::new();
    output.push_str(&render_fetch_prefix(record.pc));
    output.push_str(&describe(&record.instruction));
    output.push('\n');

    if verbose {
        if let Some(src) = record.src {
            output.push_str(&format!("  src.value = 0{:06o}\n", src));
        }
        if let Some(dst) = record.dst {
            output.push_str(&format!("  dst.value = 0{:06o}\n", dst));
        }
        if let Some(result) = record.result {
            output.push_str(&format!("  result    = 0{:06o}\n", result));
        }
        if let Some(flags) = record.flags {
            output.push_str(&format!("  nzvc bits = 4'b{}\n", render_flags(&flags)));
        }
        if let Some(write) = record.write {
            output.push_str(&format!(
                "  value 0{:06o} is written to 0{:06o}\n",
                write.value, write.addr
            ));
        }
        output.push_str(&render_registers(&record.registers));
    }

    output
}

/// Instruction description without the address prefix.
fn describe(instr: &Instruction) -> String {
    let double = |name: &str, src: &Operand, dst: &Operand| {
        format!(
            "{} instruction sm {}, sr {} dm {} dr {}",
            name,
            src.mode.bits(),
            src.reg,
            dst.mode.bits(),
            dst.reg
        )
    };
    let single = |name: &str, dst: &Operand| {
        format!("{} instruction dm {} dr {}", name, dst.mode.bits(), dst.reg)
    };
    let branch = |name: &str, offset: i8| {
        format!("{} instruction with offset {:04o}", name, offset as u8)
    };

    match instr {
        Instruction::Halt => "halt instruction".to_string(),
        Instruction::Mov { src, dst }
        | Instruction::Cmp { src, dst }
        | Instruction::Add { src, dst }
        | Instruction::Sub { src, dst } => double(instr.mnemonic(), src, dst),
        Instruction::Asl { dst } | Instruction::Asr { dst } => single(instr.mnemonic(), dst),
        Instruction::Br { offset } | Instruction::Beq { offset } | Instruction::Bne { offset } => {
            branch(instr.mnemonic(), *offset)
        }
        Instruction::Sob { reg, offset } => {
            format!("sob instruction reg {} with offset {:03o}", reg, (*offset as u8) & 0o77)
        }
    }
}

/// Flags as four binary digits, `NZVC`.
pub fn render_flags(flags: &ConditionCodes) -> String {
    format!(
        "{}{}{}{}",
        u8::from(flags.n),
        u8::from(flags.z),
        u8::from(flags.v),
        u8::from(flags.c)
    )
}

/// Two-line register dump, even registers first.
pub fn render_registers(regs: &[u16; 8]) -> String {
    format!(
        "  R0:0{:06o}  R2:0{:06o}  R4:0{:06o}  R6:0{:06o}\n  R1:0{:06o}  R3:0{:06o}  R5:0{:06o}  R7:0{:06o}\n",
        regs[0], regs[2], regs[4], regs[6], regs[1], regs[3], regs[5], regs[7]
    )
}

/// The statistics block.
pub fn render_statistics(stats: &Statistics) -> String {
    let mut output = String::new();
    output.push_str("execution statistics (in decimal):\n");
    output.push_str(&format!("  instructions executed     = {}\n", stats.instructions_executed));
    output.push_str(&format!("  instruction words fetched = {}\n", stats.instruction_words_fetched));
    output.push_str(&format!("  data words read           = {}\n", stats.data_words_read));
    output.push_str(&format!("  data words written        = {}\n", stats.data_words_written));
    output.push_str(&format!("  branches executed         = {}\n", stats.branches_executed));
    output.push_str(&format!("  branches taken            = {}", stats.branches_taken));
    if let Some(percent) = stats.branch_taken_percent() {
        output.push_str(&format!(" ({:.1}%)", percent));
    }
    output.push('\n');
    output
}

/// The verbose memory dump of the first [`DUMP_WORDS`] words.
pub fn render_memory_dump(mem: &Memory) -> String {
    let mut output = String::new();
    output.push_str("\nfirst 20 words of memory after execution halts:\n");
    for (addr, word) in mem.dump(0, DUMP_WORDS) {
        output.push_str(&format!("  0{:04o}: {:06o}\n", addr, word));
    }
    output
}

/// Line printed when decoding fails.
pub fn render_bad_instruction(pc: u16) -> String {
    format!("\nBAD INSTRUCTION AT PC = {:06o}\n", pc)
}

/// Machine-readable end-of-run summary.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub state: CpuState,
    pub statistics: Statistics,
    pub branch_taken_percent: Option<f64>,
    pub registers: [u16; 8],
    pub flags: ConditionCodes,
}

impl Summary {
    pub fn of(cpu: &Cpu) -> Self {
        Self {
            state: cpu.state,
            statistics: *cpu.stats(),
            branch_taken_percent: cpu.stats().branch_taken_percent(),
            registers: cpu.regs.snapshot(),
            flags: cpu.flags,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A trace sink that renders each record as text onto a writer.
///
/// Write failures are remembered and returned from [`TextTracer::finish`].
pub struct TextTracer<W: Write> {
    out: W,
    verbose: bool,
    error: Option<io::Error>,
}

impl<W: Write> TextTracer<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self {
            out,
            verbose,
            error: None,
        }
    }

    /// Flush and surface the first write error, if any.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> TextTracer<W> {
    fn emit(&mut self, text: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.out.write_all(text.as_bytes()) {
            self.error = Some(e);
        }
    }
}

impl<W: Write> TraceSink for TextTracer<W> {
    fn record(&mut self, record: &TraceRecord) {
        let text = render_record(record, self.verbose);
        self.emit(&text);
    }

    // The failing fetch still gets its address; the caller finishes the line.
    fn fault(&mut self, pc: u16) {
        self.emit(&render_fetch_prefix(pc));
    }
}
