pub const CSR_COUNT: usize = 4096;

/// Supervisor status
pub const SSTATUS: u16 = 0x100;
/// Supervisor interrupt-enable, a view of [MIE] through [MIDELEG]
pub const SIE: u16 = 0x104;
/// Supervisor trap handler base address
pub const STVEC: u16 = 0x105;
/// Supervisor scratch register
pub const SSCRATCH: u16 = 0x140;
/// Supervisor exception program counter
pub const SEPC: u16 = 0x141;
/// Supervisor trap cause
pub const SCAUSE: u16 = 0x142;
/// Supervisor bad address or instruction
pub const STVAL: u16 = 0x143;
/// Supervisor interrupt pending
pub const SIP: u16 = 0x144;
/// Supervisor address translation and protection, stored only
pub const SATP: u16 = 0x180;

/// Machine status
pub const MSTATUS: u16 = 0x300;
/// ISA and extensions
pub const MISA: u16 = 0x301;
/// Machine exception delegation
pub const MEDELEG: u16 = 0x302;
/// Machine interrupt delegation
pub const MIDELEG: u16 = 0x303;
/// Machine interrupt-enable
pub const MIE: u16 = 0x304;
/// Machine trap-handler base address
pub const MTVEC: u16 = 0x305;
/// Machine scratch register
pub const MSCRATCH: u16 = 0x340;
/// Machine exception program counter
pub const MEPC: u16 = 0x341;
/// Machine trap cause
pub const MCAUSE: u16 = 0x342;
/// Machine bad address or instruction
pub const MTVAL: u16 = 0x343;
/// Machine interrupt pending
pub const MIP: u16 = 0x344;

/// Vendor ID
pub const MVENDORID: u16 = 0xF11;
/// Architecture ID
pub const MARCHID: u16 = 0xF12;
/// Implementation ID
pub const MIMPID: u16 = 0xF13;
/// Hardware thread ID
pub const MHARTID: u16 = 0xF14;

/// Bit positions inside `mstatus`/`sstatus`.
pub mod status {
    pub const SIE: u64 = 1 << 1;
    pub const MIE: u64 = 1 << 3;
    pub const SPIE: u64 = 1 << 5;
    pub const MPIE: u64 = 1 << 7;
    pub const SPP: u64 = 1 << 8;
    pub const MPP_SHIFT: u32 = 11;
    pub const MPP: u64 = 0b11 << MPP_SHIFT;
}

/// Name of a well-known CSR, used by register dumps.
pub fn name(csr: u16) -> Option<&'static str> {
    let name = match csr {
        SSTATUS => "sstatus",
        SIE => "sie",
        STVEC => "stvec",
        SSCRATCH => "sscratch",
        SEPC => "sepc",
        SCAUSE => "scause",
        STVAL => "stval",
        SIP => "sip",
        SATP => "satp",
        MSTATUS => "mstatus",
        MISA => "misa",
        MEDELEG => "medeleg",
        MIDELEG => "mideleg",
        MIE => "mie",
        MTVEC => "mtvec",
        MSCRATCH => "mscratch",
        MEPC => "mepc",
        MCAUSE => "mcause",
        MTVAL => "mtval",
        MIP => "mip",
        MVENDORID => "mvendorid",
        MARCHID => "marchid",
        MIMPID => "mimpid",
        MHARTID => "mhartid",
        _ => return None,
    };

    Some(name)
}

/// The 4096 control and status registers of a hart.
#[derive(Debug, Clone)]
pub struct CSR {
    memory: Vec<u64>,
}

impl Default for CSR {
    fn default() -> Self {
        Self::new()
    }
}

impl CSR {
    pub fn new() -> Self {
        Self {
            memory: vec![0; CSR_COUNT],
        }
    }

    /// Raw backing store. [SIE] is not kept here, its slot stays zero.
    pub fn memory(&self) -> &[u64] {
        &self.memory
    }

    fn index(csr: u16) -> usize {
        let index = csr as usize;

        assert!(index < CSR_COUNT, "CSR address 0x{csr:X} is out of range");

        index
    }

    pub fn read(&self, csr: u16) -> u64 {
        match csr {
            SIE => self.memory[MIE as usize] & self.memory[MIDELEG as usize],
            _ => self.memory[Self::index(csr)],
        }
    }

    pub fn write(&mut self, csr: u16, value: u64) {
        match csr {
            SIE => {
                let delegated = self.memory[MIDELEG as usize];
                let mie = &mut self.memory[MIE as usize];

                *mie = (*mie & !delegated) | (value & delegated);
            }
            _ => self.memory[Self::index(csr)] = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CSR, CSR_COUNT, MEPC, MIDELEG, MIE, SATP, SIE};

    #[test]
    fn write_read() {
        let mut csr = CSR::new();

        for address in (0..CSR_COUNT as u16).filter(|&a| a != SIE) {
            let value = (address as u64) << 32 | 0xA5;
            csr.write(address, value);
            assert_eq!(csr.read(address), value);
        }
    }

    #[test]
    fn plain_registers_are_independent() {
        let mut csr = CSR::new();

        csr.write(MEPC, 0x8000_0004);
        csr.write(SATP, 1 << 63);

        assert_eq!(csr.read(MEPC), 0x8000_0004);
        assert_eq!(csr.read(SATP), 1 << 63);
        assert_eq!(csr.read(MIE), 0);
    }

    #[test]
    fn sie_is_delegated_view_of_mie() {
        let mut csr = CSR::new();

        csr.write(MIDELEG, 0x0F);
        csr.write(MIE, 0xFF);
        csr.write(SIE, 0x03);

        assert_eq!(csr.read(MIE), 0xF3);
        assert_eq!(csr.read(SIE), 0x03);
        assert_eq!(csr.memory()[SIE as usize], 0);
    }

    #[test]
    fn sie_without_delegation() {
        let mut csr = CSR::new();

        csr.write(MIE, 0xAA);
        csr.write(SIE, 0xFF);

        assert_eq!(csr.read(MIE), 0xAA);
        assert_eq!(csr.read(SIE), 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range() {
        let csr = CSR::new();

        csr.read(0x1000);
    }
}
