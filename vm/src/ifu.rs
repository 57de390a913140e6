use crate::{
    isa::{
        AmoOp, AmoWidth, BranchOp, CsrOp, CsrSource, ImmOp, Instruction, InstructionAmo,
        InstructionB, InstructionCsr, InstructionFence, InstructionI, InstructionJ, InstructionR,
        InstructionS, InstructionShift, InstructionU, LoadOp, RegOp, RegWordOp, ShiftOp, StoreOp,
        SystemOp,
    },
    registers::Register,
};
use thiserror::Error;

pub mod opcode {
    pub const LOAD: u8 = 0x03;
    pub const MISC_MEM: u8 = 0x0f;
    pub const OP_IMM: u8 = 0x13;
    pub const AUIPC: u8 = 0x17;
    pub const OP_IMM_32: u8 = 0x1b;
    pub const STORE: u8 = 0x23;
    pub const AMO: u8 = 0x2f;
    pub const OP: u8 = 0x33;
    pub const LUI: u8 = 0x37;
    pub const OP_32: u8 = 0x3b;
    pub const BRANCH: u8 = 0x63;
    pub const JALR: u8 = 0x67;
    pub const JAL: u8 = 0x6f;
    pub const SYSTEM: u8 = 0x73;
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unknown instruction '0x{instruction:08X}' (opcode 0x{opcode:02X})")]
    UnknownInstruction { instruction: u32, opcode: u8 },
}

/// `len` bits of `value` starting at bit `pos`, shifted down to bit 0.
const fn field(value: u32, len: u32, pos: u32) -> u32 {
    (value >> pos) & ((1 << len) - 1)
}

/// Sign-extends the low `bits` bits of `value`.
const fn sign_extend(value: u32, bits: u32) -> i64 {
    let shift = 64 - bits;

    ((value as u64) << shift) as i64 >> shift
}

const fn fetch_opcode(instruction: u32) -> u8 {
    field(instruction, 7, 0) as u8
}

const fn fetch_funct3(instruction: u32) -> u32 {
    field(instruction, 3, 12)
}

const fn fetch_funct7(instruction: u32) -> u32 {
    field(instruction, 7, 25)
}

const fn fetch_rd(instruction: u32) -> Register {
    Register::from_field(instruction >> 7)
}

const fn fetch_rs1(instruction: u32) -> Register {
    Register::from_field(instruction >> 15)
}

const fn fetch_rs2(instruction: u32) -> Register {
    Register::from_field(instruction >> 20)
}

const fn fetch_imm_i(instruction: u32) -> i64 {
    sign_extend(field(instruction, 12, 20), 12)
}

const fn fetch_imm_s(instruction: u32) -> i64 {
    // [4:0]
    let mut result = field(instruction, 5, 7);
    // [11:5]
    result |= field(instruction, 7, 25) << 5;

    sign_extend(result, 12)
}

const fn fetch_imm_b(instruction: u32) -> i64 {
    // [4:1]
    let mut result = field(instruction, 4, 8) << 1;
    // [10:5]
    result |= field(instruction, 6, 25) << 5;
    // [11]
    result |= field(instruction, 1, 7) << 11;
    // [12]
    result |= field(instruction, 1, 31) << 12;

    sign_extend(result, 13)
}

const fn fetch_imm_u(instruction: u32) -> i64 {
    (instruction & 0xFFFF_F000) as i32 as i64
}

const fn fetch_imm_j(instruction: u32) -> i64 {
    // [10:1]
    let mut result = field(instruction, 10, 21) << 1;
    // [11]
    result |= field(instruction, 1, 20) << 11;
    // [19:12]
    result |= field(instruction, 8, 12) << 12;
    // [20]
    result |= field(instruction, 1, 31) << 20;

    sign_extend(result, 21)
}

const fn fetch_instruction_r(instruction: u32) -> InstructionR {
    InstructionR::new(
        fetch_rd(instruction),
        fetch_rs1(instruction),
        fetch_rs2(instruction),
    )
}

const fn fetch_instruction_i(instruction: u32) -> InstructionI {
    InstructionI::new(
        fetch_rd(instruction),
        fetch_rs1(instruction),
        fetch_imm_i(instruction),
    )
}

const fn fetch_instruction_shift(instruction: u32, shamt_bits: u32) -> InstructionShift {
    InstructionShift::new(
        fetch_rd(instruction),
        fetch_rs1(instruction),
        field(instruction, shamt_bits, 20),
    )
}

const fn fetch_instruction_s(instruction: u32) -> InstructionS {
    InstructionS::new(
        fetch_rs1(instruction),
        fetch_rs2(instruction),
        fetch_imm_s(instruction),
    )
}

const fn fetch_instruction_b(instruction: u32) -> InstructionB {
    InstructionB::new(
        fetch_rs1(instruction),
        fetch_rs2(instruction),
        fetch_imm_b(instruction),
    )
}

const fn fetch_instruction_u(instruction: u32) -> InstructionU {
    InstructionU::new(fetch_rd(instruction), fetch_imm_u(instruction))
}

const fn fetch_instruction_j(instruction: u32) -> InstructionJ {
    InstructionJ::new(fetch_rd(instruction), fetch_imm_j(instruction))
}

const fn fetch_instruction_amo(instruction: u32) -> InstructionAmo {
    InstructionAmo::new(
        fetch_rd(instruction),
        fetch_rs1(instruction),
        fetch_rs2(instruction),
        field(instruction, 1, 26) == 1,
        field(instruction, 1, 25) == 1,
    )
}

const fn fetch_instruction_csr(instruction: u32, immediate: bool) -> InstructionCsr {
    let source = if immediate {
        CsrSource::Immediate(field(instruction, 5, 15) as u8)
    } else {
        CsrSource::Register(fetch_rs1(instruction))
    };

    InstructionCsr::new(
        fetch_rd(instruction),
        field(instruction, 12, 20) as u16,
        source,
    )
}

const fn fetch_instruction_fence(instruction: u32) -> InstructionFence {
    InstructionFence::new(
        fetch_rd(instruction),
        fetch_rs1(instruction),
        field(instruction, 4, 20) as u8,
        field(instruction, 4, 24) as u8,
        field(instruction, 4, 28) as u8,
    )
}

/// Instruction decode unit.
#[derive(Debug, Clone, Default)]
pub struct IFU;

impl IFU {
    pub fn decode(&self, instruction: u32) -> Result<Instruction, DecodeError> {
        let opcode = fetch_opcode(instruction);
        let funct3 = fetch_funct3(instruction);
        let funct7 = fetch_funct7(instruction);
        let unknown = DecodeError::UnknownInstruction {
            instruction,
            opcode,
        };

        let decoded = match opcode {
            opcode::LOAD => {
                let op = match funct3 {
                    0b000 => LoadOp::Lb,
                    0b001 => LoadOp::Lh,
                    0b010 => LoadOp::Lw,
                    0b011 => LoadOp::Ld,
                    0b100 => LoadOp::Lbu,
                    0b101 => LoadOp::Lhu,
                    0b110 => LoadOp::Lwu,
                    _ => return Err(unknown),
                };

                Instruction::Load(op, fetch_instruction_i(instruction))
            }
            opcode::MISC_MEM => match funct3 {
                0b000 => Instruction::Fence(fetch_instruction_fence(instruction)),
                _ => return Err(unknown),
            },
            opcode::OP_IMM => {
                // RV64 shifts take a 6-bit shamt, leaving funct6 above it.
                let funct6 = funct7 >> 1;

                match (funct6, funct3) {
                    (_, 0b000) => Instruction::Imm(ImmOp::Addi, fetch_instruction_i(instruction)),
                    (_, 0b010) => Instruction::Imm(ImmOp::Slti, fetch_instruction_i(instruction)),
                    (_, 0b011) => Instruction::Imm(ImmOp::Sltiu, fetch_instruction_i(instruction)),
                    (_, 0b100) => Instruction::Imm(ImmOp::Xori, fetch_instruction_i(instruction)),
                    (_, 0b110) => Instruction::Imm(ImmOp::Ori, fetch_instruction_i(instruction)),
                    (_, 0b111) => Instruction::Imm(ImmOp::Andi, fetch_instruction_i(instruction)),
                    (0b000000, 0b001) => {
                        Instruction::ShiftImm(ShiftOp::Sll, fetch_instruction_shift(instruction, 6))
                    }
                    (0b000000, 0b101) => {
                        Instruction::ShiftImm(ShiftOp::Srl, fetch_instruction_shift(instruction, 6))
                    }
                    (0b010000, 0b101) => {
                        Instruction::ShiftImm(ShiftOp::Sra, fetch_instruction_shift(instruction, 6))
                    }
                    _ => return Err(unknown),
                }
            }
            opcode::AUIPC => Instruction::Auipc(fetch_instruction_u(instruction)),
            opcode::OP_IMM_32 => match (funct7, funct3) {
                (_, 0b000) => Instruction::AddImmWord(fetch_instruction_i(instruction)),
                (0b0000000, 0b001) => {
                    Instruction::ShiftImmWord(ShiftOp::Sll, fetch_instruction_shift(instruction, 5))
                }
                (0b0000000, 0b101) => {
                    Instruction::ShiftImmWord(ShiftOp::Srl, fetch_instruction_shift(instruction, 5))
                }
                (0b0100000, 0b101) => {
                    Instruction::ShiftImmWord(ShiftOp::Sra, fetch_instruction_shift(instruction, 5))
                }
                _ => return Err(unknown),
            },
            opcode::STORE => {
                let op = match funct3 {
                    0b000 => StoreOp::Sb,
                    0b001 => StoreOp::Sh,
                    0b010 => StoreOp::Sw,
                    0b011 => StoreOp::Sd,
                    _ => return Err(unknown),
                };

                Instruction::Store(op, fetch_instruction_s(instruction))
            }
            opcode::AMO => {
                let width = match funct3 {
                    0b010 => AmoWidth::Word,
                    0b011 => AmoWidth::Double,
                    _ => return Err(unknown),
                };
                let op = match funct7 >> 2 {
                    0b00000 => AmoOp::Add,
                    0b00001 => AmoOp::Swap,
                    _ => return Err(unknown),
                };

                Instruction::Amo(op, width, fetch_instruction_amo(instruction))
            }
            opcode::OP => {
                let op = match (funct7, funct3) {
                    (0b0000000, 0b000) => RegOp::Add,
                    (0b0100000, 0b000) => RegOp::Sub,
                    (0b0000000, 0b001) => RegOp::Sll,
                    (0b0000000, 0b010) => RegOp::Slt,
                    (0b0000000, 0b011) => RegOp::Sltu,
                    (0b0000000, 0b100) => RegOp::Xor,
                    (0b0000000, 0b101) => RegOp::Srl,
                    (0b0100000, 0b101) => RegOp::Sra,
                    (0b0000000, 0b110) => RegOp::Or,
                    (0b0000000, 0b111) => RegOp::And,
                    // M Extension
                    (0b0000001, 0b000) => RegOp::Mul,
                    (0b0000001, 0b001) => RegOp::Mulh,
                    (0b0000001, 0b010) => RegOp::Mulhsu,
                    (0b0000001, 0b011) => RegOp::Mulhu,
                    (0b0000001, 0b100) => RegOp::Div,
                    (0b0000001, 0b101) => RegOp::Divu,
                    (0b0000001, 0b110) => RegOp::Rem,
                    (0b0000001, 0b111) => RegOp::Remu,
                    _ => return Err(unknown),
                };

                Instruction::Reg(op, fetch_instruction_r(instruction))
            }
            opcode::LUI => Instruction::Lui(fetch_instruction_u(instruction)),
            opcode::OP_32 => {
                let op = match (funct7, funct3) {
                    (0b0000000, 0b000) => RegWordOp::Addw,
                    (0b0100000, 0b000) => RegWordOp::Subw,
                    (0b0000000, 0b001) => RegWordOp::Sllw,
                    (0b0000000, 0b101) => RegWordOp::Srlw,
                    (0b0100000, 0b101) => RegWordOp::Sraw,
                    // M Extension
                    (0b0000001, 0b000) => RegWordOp::Mulw,
                    (0b0000001, 0b100) => RegWordOp::Divw,
                    (0b0000001, 0b101) => RegWordOp::Divuw,
                    (0b0000001, 0b110) => RegWordOp::Remw,
                    (0b0000001, 0b111) => RegWordOp::Remuw,
                    _ => return Err(unknown),
                };

                Instruction::RegWord(op, fetch_instruction_r(instruction))
            }
            opcode::BRANCH => {
                let op = match funct3 {
                    0b000 => BranchOp::Beq,
                    0b001 => BranchOp::Bne,
                    0b100 => BranchOp::Blt,
                    0b101 => BranchOp::Bge,
                    0b110 => BranchOp::Bltu,
                    0b111 => BranchOp::Bgeu,
                    _ => return Err(unknown),
                };

                Instruction::Branch(op, fetch_instruction_b(instruction))
            }
            opcode::JALR => match funct3 {
                0b000 => Instruction::Jalr(fetch_instruction_i(instruction)),
                _ => return Err(unknown),
            },
            opcode::JAL => Instruction::Jal(fetch_instruction_j(instruction)),
            opcode::SYSTEM => match funct3 {
                0b000 => {
                    let rd = fetch_rd(instruction);
                    let rs1 = fetch_rs1(instruction);
                    let rs2 = fetch_rs2(instruction);

                    match (funct7, rs2.as_u8(), rs1.as_u8(), rd.as_u8()) {
                        (0b0001000, 0b00010, 0, 0) => Instruction::System(SystemOp::Sret),
                        (0b0011000, 0b00010, 0, 0) => Instruction::System(SystemOp::Mret),
                        (0b0001001, _, _, 0) => {
                            Instruction::System(SystemOp::SfenceVma { rs1, rs2 })
                        }
                        _ => return Err(unknown),
                    }
                }
                0b001 => Instruction::Csr(CsrOp::ReadWrite, fetch_instruction_csr(instruction, false)),
                0b010 => Instruction::Csr(CsrOp::ReadSet, fetch_instruction_csr(instruction, false)),
                0b011 => Instruction::Csr(CsrOp::ReadClear, fetch_instruction_csr(instruction, false)),
                0b101 => Instruction::Csr(CsrOp::ReadWrite, fetch_instruction_csr(instruction, true)),
                0b110 => Instruction::Csr(CsrOp::ReadSet, fetch_instruction_csr(instruction, true)),
                0b111 => Instruction::Csr(CsrOp::ReadClear, fetch_instruction_csr(instruction, true)),
                _ => return Err(unknown),
            },
            _ => return Err(unknown),
        };

        Ok(decoded)
    }
}
