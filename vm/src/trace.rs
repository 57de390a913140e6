use crate::isa::Instruction;
use std::fmt;

/// One decoded instruction, reported right before it executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEvent {
    /// Address the instruction was fetched from.
    pub pc: u64,
    pub raw: u32,
    pub instruction: Instruction,
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}: {:08x}  {}", self.pc, self.raw, self.instruction)
    }
}

pub type Tracer = Box<dyn FnMut(&TraceEvent)>;

#[cfg(test)]
mod tests {
    use super::TraceEvent;
    use crate::isa::{ImmOp, Instruction, InstructionI};
    use crate::registers::{T5, ZERO};

    #[test]
    fn display() {
        let event = TraceEvent {
            pc: 0x8000_0000,
            raw: 0x00500f13,
            instruction: Instruction::Imm(ImmOp::Addi, InstructionI::new(T5, ZERO, 5)),
        };

        assert_eq!(event.to_string(), "0x80000000: 00500f13  addi x30, x0, 5");
    }
}
