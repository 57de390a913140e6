use std::fmt;

/// Hardwired to 0, ignores writes
pub const ZERO: Register = Register(0);
/// Return address for jumps
pub const RA: Register = Register(1);
/// Stack pointer
pub const SP: Register = Register(2);
/// Global pointer
pub const GP: Register = Register(3);
/// Thread pointer
pub const TP: Register = Register(4);
/// Temporary register 0
pub const T0: Register = Register(5);
/// Temporary register 1
pub const T1: Register = Register(6);
/// Temporary register 2
pub const T2: Register = Register(7);
/// Saved register 0 or frame pointer
pub const S0: Register = Register(8);
/// Saved register 1
pub const S1: Register = Register(9);
/// Return value or function argument 0
pub const A0: Register = Register(10);
/// Return value or function argument 1
pub const A1: Register = Register(11);
/// Function argument 2
pub const A2: Register = Register(12);
/// Function argument 3
pub const A3: Register = Register(13);
/// Function argument 4
pub const A4: Register = Register(14);
/// Function argument 5
pub const A5: Register = Register(15);
/// Function argument 6
pub const A6: Register = Register(16);
/// Function argument 7
pub const A7: Register = Register(17);
/// Saved register 2
pub const S2: Register = Register(18);
/// Saved register 3
pub const S3: Register = Register(19);
/// Saved register 4
pub const S4: Register = Register(20);
/// Saved register 5
pub const S5: Register = Register(21);
/// Saved register 6
pub const S6: Register = Register(22);
/// Saved register 7
pub const S7: Register = Register(23);
/// Saved register 8
pub const S8: Register = Register(24);
/// Saved register 9
pub const S9: Register = Register(25);
/// Saved register 10
pub const S10: Register = Register(26);
/// Saved register 11
pub const S11: Register = Register(27);
/// Temporary register 3
pub const T3: Register = Register(28);
/// Temporary register 4
pub const T4: Register = Register(29);
/// Temporary register 5
pub const T5: Register = Register(30);
/// Temporary register 6
pub const T6: Register = Register(31);

pub const REGISTER_COUNT: usize = 32;

const ABI_NAMES: [&str; REGISTER_COUNT] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Index of an integer register, always in `0..32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Register(u8);

impl Register {
    pub const fn new(i: u8) -> Option<Self> {
        if (i as usize) < REGISTER_COUNT {
            Some(Self(i))
        } else {
            None
        }
    }

    /// Builds a register from the low 5 bits of an instruction field.
    pub(crate) const fn from_field(bits: u32) -> Self {
        Self((bits & 0b11111) as u8)
    }

    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    pub fn abi_name(&self) -> &'static str {
        ABI_NAMES[self.0 as usize]
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Integer and floating-point register files.
///
/// See [ASM Manual](https://github.com/riscv-non-isa/riscv-asm-manual/blob/main/riscv-asm.md#general-registers)
#[derive(Debug, Default, Clone)]
pub struct Registers {
    x: [u64; REGISTER_COUNT],
    // Reserved for the F/D extensions, nothing executes against them yet.
    f: [u64; REGISTER_COUNT],
    pc: u64,
}

impl Registers {
    pub fn get(&self, register: Register) -> u64 {
        self.x[register.as_u8() as usize]
    }

    pub fn set(&mut self, register: Register, value: u64) {
        if register == ZERO {
            return;
        }

        self.x[register.as_u8() as usize] = value;
    }

    /// Reads integer register `index`. Panics if `index >= 32`.
    pub fn read(&self, index: usize) -> u64 {
        assert!(
            index < REGISTER_COUNT,
            "attempted to read invalid integer register x{index}"
        );

        self.x[index]
    }

    /// Writes integer register `index`, writes to x0 are dropped.
    /// Panics if `index >= 32`.
    pub fn write(&mut self, index: usize, value: u64) {
        assert!(
            index < REGISTER_COUNT,
            "attempted to write invalid integer register x{index}"
        );

        if index != 0 {
            self.x[index] = value;
        }
    }

    pub fn float_registers(&self) -> &[u64; REGISTER_COUNT] {
        &self.f
    }

    pub fn pc(&self) -> u64 {
        self.pc
    }

    pub fn pc_mut(&mut self) -> &mut u64 {
        &mut self.pc
    }
}

#[cfg(test)]
mod tests {
    use super::{Register, Registers, A0, REGISTER_COUNT, ZERO};

    #[test]
    fn zero_is_hardwired() {
        let mut registers = Registers::default();

        registers.write(0, 0xDEAD_BEEF);
        registers.set(ZERO, 42);

        assert_eq!(registers.read(0), 0);
        assert_eq!(registers.get(ZERO), 0);
    }

    #[test]
    fn write_read() {
        let mut registers = Registers::default();

        for i in 1..REGISTER_COUNT {
            let value = (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            registers.write(i, value);
            assert_eq!(registers.read(i), value);
        }

        registers.set(A0, u64::MAX);
        assert_eq!(registers.read(10), u64::MAX);
    }

    #[test]
    fn register_bounds() {
        assert_eq!(Register::new(31).map(|r| r.as_u8()), Some(31));
        assert_eq!(Register::new(32), None);
        assert_eq!(Register::from_field(0b1_00101).as_u8(), 5);
    }

    #[test]
    fn names() {
        assert_eq!(A0.abi_name(), "a0");
        assert_eq!(A0.to_string(), "x10");
        assert_eq!(Register::new(31).unwrap().abi_name(), "t6");
    }

    #[test]
    #[should_panic(expected = "invalid integer register")]
    fn read_out_of_range() {
        let registers = Registers::default();

        registers.read(32);
    }

    #[test]
    #[should_panic(expected = "invalid integer register")]
    fn write_out_of_range() {
        let mut registers = Registers::default();

        registers.write(40, 1);
    }
}
