use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use vm::{alu::ShiftMode, bus::RAMConfig, Hart, HartConfig, HartError, StepStatus};

use loader::Format;

mod dump;
mod loader;

#[derive(Debug, Parser)]
struct App {
    /// Path to a RISC-V binary file.
    pub bin: PathBuf,
    /// Emulated RAM size in MiB.
    #[arg(long, default_value_t = 128)]
    pub ram_mib: u64,
    /// How to interpret the binary.
    #[arg(long, value_enum, default_value_t = Format::Auto)]
    pub format: Format,
    /// Stop after this many instructions.
    #[arg(long)]
    pub max_steps: Option<u64>,
    /// Print every executed instruction.
    #[arg(long)]
    pub trace: bool,
    /// Use architectural shifts instead of rotating ones.
    #[arg(long)]
    pub standard_shifts: bool,
    /// Include non-zero CSRs in the final register dump.
    #[arg(long)]
    pub dump_csrs: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let app = App::parse();
    let bytes = std::fs::read(&app.bin)
        .with_context(|| format!("Failed to read {}", app.bin.display()))?;

    let ram = RAMConfig {
        size: app
            .ram_mib
            .checked_mul(1024 * 1024)
            .context("RAM size is too large")?,
        ..RAMConfig::default()
    };
    let program = loader::load(&bytes, app.format, ram.start_address, ram.size)?;

    let config = HartConfig {
        ram,
        shift_mode: if app.standard_shifts {
            ShiftMode::Standard
        } else {
            ShiftMode::Rotating
        },
        ..HartConfig::default()
    };
    let mut hart = Hart::with_config(config, &program.image)?;

    if let Some(entry) = program.entry {
        hart.set_pc(entry);
    }

    if app.trace {
        hart.set_tracer(|event| info!("{event}"));
    }

    let (steps, result) = run(&mut hart, app.max_steps);

    match &result {
        Ok(StepStatus::Halted) => info!("Halted after {steps} instructions"),
        Ok(StepStatus::Running) => warn!("Stopped after {steps} instructions without halting"),
        Err(e) => warn!("Fault after {steps} instructions: {e}"),
    }

    print!("{}", dump::dump(&hart, app.dump_csrs));

    result
        .map(|_| ())
        .with_context(|| format!("Execution stopped at 0x{:X}", hart.pc()))
}

fn run(hart: &mut Hart, max_steps: Option<u64>) -> (u64, Result<StepStatus, HartError>) {
    let mut steps = 0;

    while max_steps.map_or(true, |max| steps < max) {
        steps += 1;

        match hart.step() {
            Ok(StepStatus::Running) => {}
            status => return (steps, status),
        }
    }

    (steps, Ok(StepStatus::Running))
}

#[cfg(test)]
mod tests {
    use super::run;
    use hex_literal::hex;
    use vm::{bus::RAMConfig, ifu::DecodeError, Hart, HartConfig, HartError, StepStatus};

    fn make_hart(program: &[u8]) -> Hart {
        let config = HartConfig {
            ram: RAMConfig {
                size: 0x1_0000,
                ..RAMConfig::default()
            },
            reserved: 0x1000,
            ..HartConfig::default()
        };
        let image: Vec<u8> = program
            .chunks_exact(4)
            .flat_map(|word| u32::from_be_bytes(word.try_into().unwrap()).to_le_bytes())
            .collect();

        Hart::with_config(config, &image).unwrap()
    }

    #[test]
    fn bounded_loop() {
        // beq x0, x0, 0
        let mut hart = make_hart(&hex!("00000063"));

        assert_eq!(run(&mut hart, Some(5)), (5, Ok(StepStatus::Running)));
        assert_eq!(hart.pc(), 0x8000_0000);

        assert_eq!(run(&mut hart, Some(0)), (0, Ok(StepStatus::Running)));
    }

    #[test]
    fn halts_before_bound() {
        // addi x1, x0, 1
        // jalr x0, 0(x0)
        let program = hex!("00100093 00000067");

        let mut hart = make_hart(&program);
        assert_eq!(run(&mut hart, Some(10)), (2, Ok(StepStatus::Halted)));
        assert_eq!(hart.read_register(1), 1);

        let mut hart = make_hart(&program);
        assert_eq!(run(&mut hart, None), (2, Ok(StepStatus::Halted)));
    }

    #[test]
    fn decode_fault() {
        // addi x1, x0, 1
        // (invalid)
        let mut hart = make_hart(&hex!("00100093 ffffffff"));

        assert_eq!(
            run(&mut hart, Some(10)),
            (
                2,
                Err(HartError::Decode(DecodeError::UnknownInstruction {
                    instruction: 0xFFFF_FFFF,
                    opcode: 0x7F
                }))
            )
        );
    }
}
