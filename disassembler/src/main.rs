use std::ops::Range;

use disassembler::{Isa, Line, disassemble};

use clap::Parser;
use log::error;

/// 8-bit CPU Disassembler
#[derive(Parser)]
struct Args {
    /// Binary to disassemble
    bin: String,

    /// Instruction set of the binary
    #[arg(long, value_enum)]
    isa: Isa,

    /// Address of the first byte (or word) of the binary
    #[arg(long, value_parser = parse_number, default_value = "0")]
    origin: u16,
}

fn parse_number(s: &str) -> Result<u16, String> {
    match s.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    }
    .map_err(|e| format!("{s:?}: {e}"))
}

// Runs of the same instruction (usually zero fill) longer than this are cut
// down to their ends.
const THRESH: usize = 8;

fn repeated_runs(lines: &[Line]) -> Vec<Range<usize>> {
    let mut ranges = vec![];
    let mut start = 0;
    for i in 1..=lines.len() {
        if i == lines.len() || lines[i].text != lines[start].text {
            if i - start > THRESH {
                ranges.push(Range { start, end: i });
            }
            start = i;
        }
    }
    ranges
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    let bin = match std::fs::read(&args.bin) {
        Ok(bin) => bin,
        Err(err) => {
            error!("Unable to read {}: {err}", args.bin);
            std::process::exit(1);
        }
    };

    let lines = disassemble(args.isa, &bin, args.origin);
    let runs = repeated_runs(&lines);
    let mut runs = runs.iter().peekable();
    let mut i = 0;
    while i < lines.len() {
        println!("{}", lines[i]);
        match runs.peek() {
            Some(run) if run.start == i => {
                println!("...");
                i = run.end - 1;
                runs.next();
                println!("{}", lines[i]);
            }
            _ => (),
        }
        i += 1;
    }
}
