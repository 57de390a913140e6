use crate::{
    alu::{self, ShiftMode},
    bus::{Bus, BusError, RAMConfig},
    csr::{self, status, CSR},
    ifu::{DecodeError, IFU},
    isa::{
        AmoOp, AmoWidth, BranchOp, CsrOp, CsrSource, ImmOp, Instruction, InstructionAmo,
        InstructionB, InstructionCsr, InstructionI, InstructionJ, InstructionR, InstructionS,
        InstructionShift, InstructionU, RegOp, RegWordOp, ShiftOp, SystemOp,
    },
    privilege_level::PrivilegeLevel,
    registers::{Registers, SP},
    trace::{TraceEvent, Tracer},
};
use log::{debug, trace};
use std::fmt;
use thiserror::Error;

/// 1 MiB at the top of RAM that a loaded image may not reach into.
pub const DEFAULT_RESERVED: u64 = 1024 * 1024;

const INSTRUCTION_SIZE: u64 = std::mem::size_of::<u32>() as u64;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum HartError {
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("Image of {size} bytes does not fit in emulated RAM (limit is {capacity} bytes)")]
    ImageTooLarge { size: u64, capacity: u64 },
    #[error("RAM of {size} bytes leaves no room for an image after reserving {reserved} bytes")]
    NoLoadableRAM { size: u64, reserved: u64 },
}

#[derive(Debug, Default, Clone)]
pub struct MachineInfo {
    pub vendor_id: u64,
    pub arch_id: u64,
    pub impl_id: u64,
    pub hart_id: u64,
}

#[derive(Debug, Clone)]
pub struct HartConfig {
    pub machine_info: MachineInfo,
    pub ram: RAMConfig,
    /// Bytes at the top of RAM excluded from the loadable image.
    pub reserved: u64,
    pub shift_mode: ShiftMode,
}

impl Default for HartConfig {
    fn default() -> Self {
        Self {
            machine_info: MachineInfo::default(),
            ram: RAMConfig::default(),
            reserved: DEFAULT_RESERVED,
            shift_mode: ShiftMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Running,
    /// The program counter reached address 0, which programs use to stop.
    Halted,
}

pub struct Hart {
    privilege_level: PrivilegeLevel,
    registers: Registers,
    csr: CSR,
    bus: Bus,
    ifu: IFU,
    shift_mode: ShiftMode,
    tracer: Option<Tracer>,
}

impl fmt::Debug for Hart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hart")
            .field("privilege_level", &self.privilege_level)
            .field("registers", &self.registers)
            .field("shift_mode", &self.shift_mode)
            .field("tracer", &self.tracer.is_some())
            .finish_non_exhaustive()
    }
}

impl Hart {
    /// Creates a hart with the default configuration and `image` copied to
    /// the RAM base.
    pub fn new(image: &[u8]) -> Result<Self, HartError> {
        Self::with_config(HartConfig::default(), image)
    }

    pub fn with_config(config: HartConfig, image: &[u8]) -> Result<Self, HartError> {
        if config.ram.size <= config.reserved {
            return Err(HartError::NoLoadableRAM {
                size: config.ram.size,
                reserved: config.reserved,
            });
        }

        let capacity = config.ram.size - config.reserved;
        let size = image.len() as u64;

        if size >= capacity {
            return Err(HartError::ImageTooLarge { size, capacity });
        }

        let ram_start = config.ram.start_address;
        let ram_end = ram_start.wrapping_add(config.ram.size);
        let bus = Bus::new(config.ram, image)?;
        let mut csr = CSR::new();

        let mut misa = 0;

        // A Extension
        misa |= 0b1 << 0;
        // I Extension
        misa |= 0b1 << 8;
        // M Extension
        misa |= 0b1 << 12;
        // Supervisor
        misa |= 0b1 << 18;
        // User
        misa |= 0b1 << 20;
        // 64-bit
        misa |= 0b10 << 62;

        csr.write(csr::MISA, misa);

        let minfo = config.machine_info;

        csr.write(csr::MVENDORID, minfo.vendor_id);
        csr.write(csr::MARCHID, minfo.arch_id);
        csr.write(csr::MIMPID, minfo.impl_id);
        csr.write(csr::MHARTID, minfo.hart_id);

        let mut registers = Registers::default();

        *registers.pc_mut() = ram_start;
        registers.set(SP, ram_end);

        Ok(Self {
            privilege_level: PrivilegeLevel::Machine,
            registers,
            csr,
            bus,
            ifu: IFU,
            shift_mode: config.shift_mode,
            tracer: None,
        })
    }

    pub fn pc(&self) -> u64 {
        self.registers.pc()
    }

    /// Moves the program counter, e.g. to an ELF entry point.
    pub fn set_pc(&mut self, pc: u64) {
        *self.registers.pc_mut() = pc;
    }

    pub fn privilege_level(&self) -> PrivilegeLevel {
        self.privilege_level
    }

    pub fn read_register(&self, index: usize) -> u64 {
        self.registers.read(index)
    }

    pub fn read_csr(&self, csr: u16) -> u64 {
        self.csr.read(csr)
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn csr(&self) -> &CSR {
        &self.csr
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Installs a hook called with every decoded instruction before it runs.
    pub fn set_tracer(&mut self, tracer: impl FnMut(&TraceEvent) + 'static) {
        self.tracer = Some(Box::new(tracer));
    }

    pub fn clear_tracer(&mut self) {
        self.tracer = None;
    }

    /// Reads the instruction word at the program counter.
    pub fn fetch(&self) -> Result<u32, BusError> {
        let instruction = self.bus.load(self.registers.pc(), 32)?;

        Ok(instruction as u32)
    }

    /// Fetches, advances the program counter and executes one instruction.
    pub fn step(&mut self) -> Result<StepStatus, HartError> {
        let pc = self.registers.pc();
        let instruction = self.fetch()?;

        trace!("Step at 0x{pc:X}: 0x{instruction:08X}");

        *self.registers.pc_mut() = pc.wrapping_add(INSTRUCTION_SIZE);

        self.execute(instruction)?;

        if self.registers.pc() == 0 {
            debug!("Halted after the instruction at 0x{pc:X} jumped to address 0");

            return Ok(StepStatus::Halted);
        }

        Ok(StepStatus::Running)
    }

    /// Steps until the program halts. A decode fault or bus fault ends the
    /// run with an error.
    pub fn run(&mut self) -> Result<(), HartError> {
        loop {
            if self.step()? == StepStatus::Halted {
                return Ok(());
            }
        }
    }

    /// Decodes and executes `instruction`. The program counter is expected
    /// to already point past it, as [Hart::step] leaves it.
    pub fn execute(&mut self, instruction: u32) -> Result<(), HartError> {
        let decoded = self.ifu.decode(instruction)?;
        let pc = self.registers.pc();

        if let Some(tracer) = self.tracer.as_mut() {
            tracer(&TraceEvent {
                pc: pc.wrapping_sub(INSTRUCTION_SIZE),
                raw: instruction,
                instruction: decoded,
            });
        }

        match decoded {
            Instruction::Load(op, InstructionI { rd, rs1, imm }) => {
                let address = self.registers.get(rs1).wrapping_add(imm as u64);
                let value = self.bus.load(address, op.size())?;
                let value = if op.is_signed() {
                    alu::sign_extend(value, op.size())
                } else {
                    value
                };

                self.registers.set(rd, value);
            }
            Instruction::Fence(_) => {}
            Instruction::Imm(op, InstructionI { rd, rs1, imm }) => {
                let rs1 = self.registers.get(rs1);
                let imm = imm as u64;
                let result = match op {
                    ImmOp::Addi => rs1.wrapping_add(imm),
                    ImmOp::Slti => ((rs1 as i64) < (imm as i64)) as u64,
                    ImmOp::Sltiu => (rs1 < imm) as u64,
                    ImmOp::Xori => rs1 ^ imm,
                    ImmOp::Ori => rs1 | imm,
                    ImmOp::Andi => rs1 & imm,
                };

                self.registers.set(rd, result);
            }
            Instruction::ShiftImm(op, InstructionShift { rd, rs1, shamt }) => {
                let rs1 = self.registers.get(rs1);
                let result = alu::shift(op, rs1, shamt, self.shift_mode, true);

                self.registers.set(rd, result);
            }
            Instruction::Auipc(InstructionU { rd, imm }) => {
                let result = pc.wrapping_add(imm as u64).wrapping_sub(INSTRUCTION_SIZE);

                self.registers.set(rd, result);
            }
            Instruction::AddImmWord(InstructionI { rd, rs1, imm }) => {
                let rs1 = self.registers.get(rs1) as u32;
                let result = alu::sign_extend_word(rs1.wrapping_add(imm as u32));

                self.registers.set(rd, result);
            }
            Instruction::ShiftImmWord(op, InstructionShift { rd, rs1, shamt }) => {
                let rs1 = self.registers.get(rs1);
                let result = alu::shift_word(op, rs1, shamt, self.shift_mode, true);

                self.registers.set(rd, result);
            }
            Instruction::Store(op, InstructionS { rs1, rs2, imm }) => {
                // Store addresses are truncated to 32 bits, load addresses are not.
                let address = self.registers.get(rs1).wrapping_add(imm as u64) & 0xFFFF_FFFF;
                let value = self.registers.get(rs2);

                self.bus.store(address, op.size(), value)?;
            }
            Instruction::Amo(op, width, amo) => self.amo(op, width, amo)?,
            Instruction::Reg(op, instruction) => self.reg(op, instruction),
            Instruction::RegWord(op, instruction) => self.reg_word(op, instruction),
            Instruction::Lui(InstructionU { rd, imm }) => {
                self.registers.set(rd, imm as u64);
            }
            Instruction::Branch(op, InstructionB { rs1, rs2, imm }) => {
                let rs1 = self.registers.get(rs1);
                let rs2 = self.registers.get(rs2);
                let taken = match op {
                    BranchOp::Beq => rs1 == rs2,
                    BranchOp::Bne => rs1 != rs2,
                    BranchOp::Blt => (rs1 as i64) < (rs2 as i64),
                    BranchOp::Bge => (rs1 as i64) >= (rs2 as i64),
                    BranchOp::Bltu => rs1 < rs2,
                    BranchOp::Bgeu => rs1 >= rs2,
                };

                if taken {
                    *self.registers.pc_mut() =
                        pc.wrapping_add(imm as u64).wrapping_sub(INSTRUCTION_SIZE);
                }
            }
            Instruction::Jalr(InstructionI { rd, rs1, imm }) => {
                let target = self.registers.get(rs1).wrapping_add(imm as u64) & !1;

                self.registers.set(rd, pc);
                *self.registers.pc_mut() = target;
            }
            Instruction::Jal(InstructionJ { rd, imm }) => {
                self.registers.set(rd, pc);
                *self.registers.pc_mut() =
                    pc.wrapping_add(imm as u64).wrapping_sub(INSTRUCTION_SIZE);
            }
            Instruction::Csr(op, instruction) => self.csr_op(op, instruction),
            Instruction::System(SystemOp::Sret) => self.sret(),
            Instruction::System(SystemOp::Mret) => self.mret(),
            // No TLB to flush.
            Instruction::System(SystemOp::SfenceVma { .. }) => {}
        }

        Ok(())
    }

    fn amo(&mut self, op: AmoOp, width: AmoWidth, amo: InstructionAmo) -> Result<(), HartError> {
        let InstructionAmo { rd, rs1, rs2, .. } = amo;
        let address = self.registers.get(rs1);
        let rs2 = self.registers.get(rs2);

        let old = self.bus.load(address, width.size())?;
        let old = alu::sign_extend(old, width.size());
        let new = match op {
            AmoOp::Add => old.wrapping_add(rs2),
            AmoOp::Swap => rs2,
        };

        self.bus.store(address, width.size(), new)?;
        self.registers.set(rd, old);

        Ok(())
    }

    fn reg(&mut self, op: RegOp, InstructionR { rd, rs1, rs2 }: InstructionR) {
        let rs1 = self.registers.get(rs1);
        let rs2 = self.registers.get(rs2);
        let mode = self.shift_mode;

        let result = match op {
            RegOp::Add => rs1.wrapping_add(rs2),
            RegOp::Sub => rs1.wrapping_sub(rs2),
            RegOp::Sll => alu::shift(ShiftOp::Sll, rs1, rs2 as u32, mode, false),
            RegOp::Slt => ((rs1 as i64) < (rs2 as i64)) as u64,
            RegOp::Sltu => (rs1 < rs2) as u64,
            RegOp::Xor => rs1 ^ rs2,
            RegOp::Srl => alu::shift(ShiftOp::Srl, rs1, rs2 as u32, mode, false),
            RegOp::Sra => alu::shift(ShiftOp::Sra, rs1, rs2 as u32, mode, false),
            RegOp::Or => rs1 | rs2,
            RegOp::And => rs1 & rs2,
            // M Extension
            RegOp::Mul => rs1.wrapping_mul(rs2),
            RegOp::Mulh => alu::mulh(rs1, rs2),
            RegOp::Mulhsu => alu::mulhsu(rs1, rs2),
            RegOp::Mulhu => alu::mulhu(rs1, rs2),
            RegOp::Div => alu::div(rs1, rs2),
            RegOp::Divu => alu::divu(rs1, rs2),
            RegOp::Rem => alu::rem(rs1, rs2),
            RegOp::Remu => alu::remu(rs1, rs2),
        };

        self.registers.set(rd, result);
    }

    fn reg_word(&mut self, op: RegWordOp, InstructionR { rd, rs1, rs2 }: InstructionR) {
        let rs1 = self.registers.get(rs1);
        let rs2 = self.registers.get(rs2);
        let mode = self.shift_mode;

        let result = match op {
            RegWordOp::Addw => alu::sign_extend_word((rs1 as u32).wrapping_add(rs2 as u32)),
            RegWordOp::Subw => alu::sign_extend_word((rs1 as u32).wrapping_sub(rs2 as u32)),
            RegWordOp::Sllw => alu::shift_word(ShiftOp::Sll, rs1, rs2 as u32, mode, false),
            RegWordOp::Srlw => alu::shift_word(ShiftOp::Srl, rs1, rs2 as u32, mode, false),
            RegWordOp::Sraw => alu::shift_word(ShiftOp::Sra, rs1, rs2 as u32, mode, false),
            // M Extension
            RegWordOp::Mulw => alu::sign_extend_word((rs1 as u32).wrapping_mul(rs2 as u32)),
            RegWordOp::Divw => alu::divw(rs1, rs2),
            RegWordOp::Divuw => alu::divuw(rs1, rs2),
            RegWordOp::Remw => alu::remw(rs1, rs2),
            RegWordOp::Remuw => alu::remuw(rs1, rs2),
        };

        self.registers.set(rd, result);
    }

    fn csr_op(&mut self, op: CsrOp, InstructionCsr { rd, csr, source }: InstructionCsr) {
        let operand = match source {
            CsrSource::Register(rs1) => self.registers.get(rs1),
            CsrSource::Immediate(imm) => imm as u64,
        };
        let old_value = self.csr.read(csr);

        // Set/clear with no bits is a pure read.
        let new_value = match op {
            CsrOp::ReadWrite => Some(operand),
            CsrOp::ReadSet => (operand != 0).then_some(old_value | operand),
            CsrOp::ReadClear => (operand != 0).then_some(old_value & !operand),
        };

        if let Some(new_value) = new_value {
            self.csr.write(csr, new_value);
        }

        self.registers.set(rd, old_value);
    }

    fn sret(&mut self) {
        let mut sstatus = self.csr.read(csr::SSTATUS);
        let next = PrivilegeLevel::from_spp(sstatus & status::SPP != 0);

        if sstatus & status::SPIE != 0 {
            sstatus |= status::SIE;
        } else {
            sstatus &= !status::SIE;
        }
        sstatus |= status::SPIE;
        sstatus &= !status::SPP;

        self.csr.write(csr::SSTATUS, sstatus);
        *self.registers.pc_mut() = self.csr.read(csr::SEPC);

        debug!("sret: {} -> {next}", self.privilege_level);
        self.privilege_level = next;
    }

    fn mret(&mut self) {
        let mut mstatus = self.csr.read(csr::MSTATUS);
        let next = PrivilegeLevel::from_mpp((mstatus & status::MPP) >> status::MPP_SHIFT);

        if mstatus & status::MPIE != 0 {
            mstatus |= status::MIE;
        } else {
            mstatus &= !status::MIE;
        }
        mstatus |= status::MPIE;
        mstatus &= !status::MPP;

        self.csr.write(csr::MSTATUS, mstatus);
        *self.registers.pc_mut() = self.csr.read(csr::MEPC);

        debug!("mret: {} -> {next}", self.privilege_level);
        self.privilege_level = next;
    }
}
