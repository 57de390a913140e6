use crate::registers::Register;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionR {
    pub rd: Register,
    pub rs1: Register,
    pub rs2: Register,
}

impl InstructionR {
    pub const fn new(rd: Register, rs1: Register, rs2: Register) -> Self {
        Self { rd, rs1, rs2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionI {
    pub rd: Register,
    pub rs1: Register,
    pub imm: i64,
}

impl InstructionI {
    pub const fn new(rd: Register, rs1: Register, imm: i64) -> Self {
        Self { rd, rs1, imm }
    }
}

/// I-type with a shift amount in place of the immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionShift {
    pub rd: Register,
    pub rs1: Register,
    pub shamt: u32,
}

impl InstructionShift {
    pub const fn new(rd: Register, rs1: Register, shamt: u32) -> Self {
        Self { rd, rs1, shamt }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionS {
    pub rs1: Register,
    pub rs2: Register,
    pub imm: i64,
}

impl InstructionS {
    pub const fn new(rs1: Register, rs2: Register, imm: i64) -> Self {
        Self { rs1, rs2, imm }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionB {
    pub rs1: Register,
    pub rs2: Register,
    pub imm: i64,
}

impl InstructionB {
    pub const fn new(rs1: Register, rs2: Register, imm: i64) -> Self {
        Self { rs1, rs2, imm }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionU {
    pub rd: Register,
    pub imm: i64,
}

impl InstructionU {
    pub const fn new(rd: Register, imm: i64) -> Self {
        Self { rd, imm }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionJ {
    pub rd: Register,
    pub imm: i64,
}

impl InstructionJ {
    pub const fn new(rd: Register, imm: i64) -> Self {
        Self { rd, imm }
    }
}

/// R-type with the acquire/release ordering bits of the A extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionAmo {
    pub rd: Register,
    pub rs1: Register,
    pub rs2: Register,
    pub aq: bool,
    pub rl: bool,
}

impl InstructionAmo {
    pub const fn new(rd: Register, rs1: Register, rs2: Register, aq: bool, rl: bool) -> Self {
        Self {
            rd,
            rs1,
            rs2,
            aq,
            rl,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrSource {
    Register(Register),
    /// 5-bit unsigned immediate from the `rs1` field.
    Immediate(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionCsr {
    pub rd: Register,
    pub csr: u16,
    pub source: CsrSource,
}

impl InstructionCsr {
    pub const fn new(rd: Register, csr: u16, source: CsrSource) -> Self {
        Self { rd, csr, source }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionFence {
    pub rd: Register,
    pub rs1: Register,
    pub succ: u8,
    pub pred: u8,
    pub fm: u8,
}

impl InstructionFence {
    pub const fn new(rd: Register, rs1: Register, succ: u8, pred: u8, fm: u8) -> Self {
        Self {
            rd,
            rs1,
            succ,
            pred,
            fm,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    Lb,
    Lh,
    Lw,
    Ld,
    Lbu,
    Lhu,
    Lwu,
}

impl LoadOp {
    /// Access width in bits.
    pub const fn size(self) -> u32 {
        match self {
            LoadOp::Lb | LoadOp::Lbu => 8,
            LoadOp::Lh | LoadOp::Lhu => 16,
            LoadOp::Lw | LoadOp::Lwu => 32,
            LoadOp::Ld => 64,
        }
    }

    pub const fn is_signed(self) -> bool {
        matches!(self, LoadOp::Lb | LoadOp::Lh | LoadOp::Lw | LoadOp::Ld)
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            LoadOp::Lb => "lb",
            LoadOp::Lh => "lh",
            LoadOp::Lw => "lw",
            LoadOp::Ld => "ld",
            LoadOp::Lbu => "lbu",
            LoadOp::Lhu => "lhu",
            LoadOp::Lwu => "lwu",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Sb,
    Sh,
    Sw,
    Sd,
}

impl StoreOp {
    /// Access width in bits.
    pub const fn size(self) -> u32 {
        match self {
            StoreOp::Sb => 8,
            StoreOp::Sh => 16,
            StoreOp::Sw => 32,
            StoreOp::Sd => 64,
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            StoreOp::Sb => "sb",
            StoreOp::Sh => "sh",
            StoreOp::Sw => "sw",
            StoreOp::Sd => "sd",
        }
    }
}

/// Register-immediate operations other than shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmOp {
    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
}

impl ImmOp {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            ImmOp::Addi => "addi",
            ImmOp::Slti => "slti",
            ImmOp::Sltiu => "sltiu",
            ImmOp::Xori => "xori",
            ImmOp::Ori => "ori",
            ImmOp::Andi => "andi",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    Sll,
    Srl,
    Sra,
}

impl ShiftOp {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            ShiftOp::Sll => "sll",
            ShiftOp::Srl => "srl",
            ShiftOp::Sra => "sra",
        }
    }
}

/// Register-register operations on the full 64-bit registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegOp {
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,
    Mul,
    Mulh,
    Mulhsu,
    Mulhu,
    Div,
    Divu,
    Rem,
    Remu,
}

impl RegOp {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            RegOp::Add => "add",
            RegOp::Sub => "sub",
            RegOp::Sll => "sll",
            RegOp::Slt => "slt",
            RegOp::Sltu => "sltu",
            RegOp::Xor => "xor",
            RegOp::Srl => "srl",
            RegOp::Sra => "sra",
            RegOp::Or => "or",
            RegOp::And => "and",
            RegOp::Mul => "mul",
            RegOp::Mulh => "mulh",
            RegOp::Mulhsu => "mulhsu",
            RegOp::Mulhu => "mulhu",
            RegOp::Div => "div",
            RegOp::Divu => "divu",
            RegOp::Rem => "rem",
            RegOp::Remu => "remu",
        }
    }
}

/// Register-register operations on the low 32 bits, results sign-extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegWordOp {
    Addw,
    Subw,
    Sllw,
    Srlw,
    Sraw,
    Mulw,
    Divw,
    Divuw,
    Remw,
    Remuw,
}

impl RegWordOp {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            RegWordOp::Addw => "addw",
            RegWordOp::Subw => "subw",
            RegWordOp::Sllw => "sllw",
            RegWordOp::Srlw => "srlw",
            RegWordOp::Sraw => "sraw",
            RegWordOp::Mulw => "mulw",
            RegWordOp::Divw => "divw",
            RegWordOp::Divuw => "divuw",
            RegWordOp::Remw => "remw",
            RegWordOp::Remuw => "remuw",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmoOp {
    Add,
    Swap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmoWidth {
    Word,
    Double,
}

impl AmoWidth {
    pub const fn size(self) -> u32 {
        match self {
            AmoWidth::Word => 32,
            AmoWidth::Double => 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchOp {
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
}

impl BranchOp {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            BranchOp::Beq => "beq",
            BranchOp::Bne => "bne",
            BranchOp::Blt => "blt",
            BranchOp::Bge => "bge",
            BranchOp::Bltu => "bltu",
            BranchOp::Bgeu => "bgeu",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrOp {
    ReadWrite,
    ReadSet,
    ReadClear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemOp {
    Sret,
    Mret,
    SfenceVma { rs1: Register, rs2: Register },
}

/// A decoded instruction: the encoding family, the operation within it and
/// the operands extracted from the word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Load(LoadOp, InstructionI),
    Fence(InstructionFence),
    Imm(ImmOp, InstructionI),
    ShiftImm(ShiftOp, InstructionShift),
    Auipc(InstructionU),
    AddImmWord(InstructionI),
    ShiftImmWord(ShiftOp, InstructionShift),
    Store(StoreOp, InstructionS),
    Amo(AmoOp, AmoWidth, InstructionAmo),
    Reg(RegOp, InstructionR),
    RegWord(RegWordOp, InstructionR),
    Lui(InstructionU),
    Branch(BranchOp, InstructionB),
    Jalr(InstructionI),
    Jal(InstructionJ),
    Csr(CsrOp, InstructionCsr),
    System(SystemOp),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::Load(op, InstructionI { rd, rs1, imm }) => {
                write!(f, "{} {rd}, {imm}({rs1})", op.mnemonic())
            }
            Instruction::Fence(InstructionFence { pred, succ, .. }) => {
                write!(f, "fence {pred:#x}, {succ:#x}")
            }
            Instruction::Imm(op, InstructionI { rd, rs1, imm }) => {
                write!(f, "{} {rd}, {rs1}, {imm}", op.mnemonic())
            }
            Instruction::ShiftImm(op, InstructionShift { rd, rs1, shamt }) => {
                write!(f, "{}i {rd}, {rs1}, {shamt}", op.mnemonic())
            }
            Instruction::Auipc(InstructionU { rd, imm }) => {
                write!(f, "auipc {rd}, {:#x}", (imm >> 12) & 0xF_FFFF)
            }
            Instruction::AddImmWord(InstructionI { rd, rs1, imm }) => {
                write!(f, "addiw {rd}, {rs1}, {imm}")
            }
            Instruction::ShiftImmWord(op, InstructionShift { rd, rs1, shamt }) => {
                write!(f, "{}iw {rd}, {rs1}, {shamt}", op.mnemonic())
            }
            Instruction::Store(op, InstructionS { rs1, rs2, imm }) => {
                write!(f, "{} {rs2}, {imm}({rs1})", op.mnemonic())
            }
            Instruction::Amo(op, width, InstructionAmo { rd, rs1, rs2, .. }) => {
                let op = match op {
                    AmoOp::Add => "amoadd",
                    AmoOp::Swap => "amoswap",
                };
                let width = match width {
                    AmoWidth::Word => "w",
                    AmoWidth::Double => "d",
                };

                write!(f, "{op}.{width} {rd}, {rs2}, ({rs1})")
            }
            Instruction::Reg(op, InstructionR { rd, rs1, rs2 }) => {
                write!(f, "{} {rd}, {rs1}, {rs2}", op.mnemonic())
            }
            Instruction::RegWord(op, InstructionR { rd, rs1, rs2 }) => {
                write!(f, "{} {rd}, {rs1}, {rs2}", op.mnemonic())
            }
            Instruction::Lui(InstructionU { rd, imm }) => {
                write!(f, "lui {rd}, {:#x}", (imm >> 12) & 0xF_FFFF)
            }
            Instruction::Branch(op, InstructionB { rs1, rs2, imm }) => {
                write!(f, "{} {rs1}, {rs2}, {imm}", op.mnemonic())
            }
            Instruction::Jalr(InstructionI { rd, rs1, imm }) => {
                write!(f, "jalr {rd}, {imm}({rs1})")
            }
            Instruction::Jal(InstructionJ { rd, imm }) => write!(f, "jal {rd}, {imm}"),
            Instruction::Csr(op, InstructionCsr { rd, csr, source }) => {
                let op = match op {
                    CsrOp::ReadWrite => "csrrw",
                    CsrOp::ReadSet => "csrrs",
                    CsrOp::ReadClear => "csrrc",
                };

                match source {
                    CsrSource::Register(rs1) => write!(f, "{op} {rd}, {csr:#x}, {rs1}"),
                    CsrSource::Immediate(imm) => write!(f, "{op}i {rd}, {csr:#x}, {imm}"),
                }
            }
            Instruction::System(SystemOp::Sret) => f.write_str("sret"),
            Instruction::System(SystemOp::Mret) => f.write_str("mret"),
            Instruction::System(SystemOp::SfenceVma { rs1, rs2 }) => {
                write!(f, "sfence.vma {rs1}, {rs2}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::{A0, A1, RA, SP, T5, T6, ZERO};

    #[test]
    fn display() {
        assert_eq!(
            Instruction::Imm(ImmOp::Addi, InstructionI::new(T5, ZERO, 5)).to_string(),
            "addi x30, x0, 5"
        );
        assert_eq!(
            Instruction::Load(LoadOp::Ld, InstructionI::new(A0, SP, -8)).to_string(),
            "ld x10, -8(x2)"
        );
        assert_eq!(
            Instruction::ShiftImm(ShiftOp::Srl, InstructionShift::new(T6, T5, 3)).to_string(),
            "srli x31, x30, 3"
        );
        assert_eq!(
            Instruction::Amo(
                AmoOp::Swap,
                AmoWidth::Double,
                InstructionAmo::new(A0, A1, RA, false, false)
            )
            .to_string(),
            "amoswap.d x10, x1, (x11)"
        );
        assert_eq!(
            Instruction::Csr(
                CsrOp::ReadSet,
                InstructionCsr::new(A0, 0x300, CsrSource::Immediate(8))
            )
            .to_string(),
            "csrrsi x10, 0x300, 8"
        );
        assert_eq!(Instruction::System(SystemOp::Mret).to_string(), "mret");
    }

    #[test]
    fn access_sizes() {
        assert_eq!(LoadOp::Lwu.size(), 32);
        assert!(!LoadOp::Lwu.is_signed());
        assert!(LoadOp::Ld.is_signed());
        assert_eq!(StoreOp::Sh.size(), 16);
        assert_eq!(AmoWidth::Word.size(), 32);
    }
}
