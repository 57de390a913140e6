//! Pure integer arithmetic shared by the 64-bit and word-sliced instruction
//! forms.

use crate::isa::ShiftOp;

/// How right shifts and register-amount shifts fill vacated bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShiftMode {
    /// Vacated bits are refilled with the bits shifted out of the opposite
    /// end of the same value. Immediate left shifts (`slli`, `slliw`) stay
    /// plain shifts. Arithmetic right shifts OR the rotated bits over the
    /// sign fill.
    #[default]
    Rotating,
    /// Architectural RV64I shifts: zero fill, or sign fill for `sra*`.
    Standard,
}

/// Shifts a full 64-bit register. `shamt` is masked to 6 bits.
pub fn shift(op: ShiftOp, value: u64, shamt: u32, mode: ShiftMode, immediate: bool) -> u64 {
    let shamt = shamt & 0x3f;

    match (mode, op) {
        (ShiftMode::Rotating, ShiftOp::Sll) if !immediate => value.rotate_left(shamt),
        (_, ShiftOp::Sll) => value << shamt,
        (ShiftMode::Rotating, ShiftOp::Srl) => value.rotate_right(shamt),
        (ShiftMode::Standard, ShiftOp::Srl) => value >> shamt,
        (ShiftMode::Rotating, ShiftOp::Sra) => {
            ((value as i64) >> shamt) as u64 | value.rotate_right(shamt)
        }
        (ShiftMode::Standard, ShiftOp::Sra) => ((value as i64) >> shamt) as u64,
    }
}

/// Shifts the low 32 bits of a register and sign-extends the 32-bit result.
/// `shamt` is masked to 5 bits.
pub fn shift_word(op: ShiftOp, value: u64, shamt: u32, mode: ShiftMode, immediate: bool) -> u64 {
    let value = value as u32;
    let shamt = shamt & 0x1f;

    let result = match (mode, op) {
        (ShiftMode::Rotating, ShiftOp::Sll) if !immediate => value.rotate_left(shamt),
        (_, ShiftOp::Sll) => value << shamt,
        (ShiftMode::Rotating, ShiftOp::Srl) => value.rotate_right(shamt),
        (ShiftMode::Standard, ShiftOp::Srl) => value >> shamt,
        (ShiftMode::Rotating, ShiftOp::Sra) => {
            ((value as i32) >> shamt) as u32 | value.rotate_right(shamt)
        }
        (ShiftMode::Standard, ShiftOp::Sra) => ((value as i32) >> shamt) as u32,
    };

    sign_extend_word(result)
}

pub const fn sign_extend_word(value: u32) -> u64 {
    value as i32 as i64 as u64
}

/// Sign-extends a zero-extended `bits`-wide memory value to 64 bits.
pub const fn sign_extend(value: u64, bits: u32) -> u64 {
    match bits {
        8 => value as i8 as i64 as u64,
        16 => value as i16 as i64 as u64,
        32 => value as i32 as i64 as u64,
        _ => value,
    }
}

pub fn mulh(a: u64, b: u64) -> u64 {
    ((a as i64 as i128 * b as i64 as i128) >> 64) as u64
}

pub fn mulhsu(a: u64, b: u64) -> u64 {
    ((a as i64 as i128).wrapping_mul(b as i128) >> 64) as u64
}

pub fn mulhu(a: u64, b: u64) -> u64 {
    ((a as u128 * b as u128) >> 64) as u64
}

/// Signed division. Division by zero yields all ones, `MIN / -1` yields `MIN`.
pub fn div(a: u64, b: u64) -> u64 {
    if b == 0 {
        return u64::MAX;
    }

    (a as i64).wrapping_div(b as i64) as u64
}

pub fn divu(a: u64, b: u64) -> u64 {
    a.checked_div(b).unwrap_or(u64::MAX)
}

/// Signed remainder. Division by zero yields the dividend, `MIN % -1` yields 0.
pub fn rem(a: u64, b: u64) -> u64 {
    if b == 0 {
        return a;
    }

    (a as i64).wrapping_rem(b as i64) as u64
}

pub fn remu(a: u64, b: u64) -> u64 {
    a.checked_rem(b).unwrap_or(a)
}

pub fn divw(a: u64, b: u64) -> u64 {
    let (a, b) = (a as i32, b as i32);

    if b == 0 {
        return u64::MAX;
    }

    sign_extend_word(a.wrapping_div(b) as u32)
}

pub fn divuw(a: u64, b: u64) -> u64 {
    let (a, b) = (a as u32, b as u32);

    sign_extend_word(a.checked_div(b).unwrap_or(u32::MAX))
}

pub fn remw(a: u64, b: u64) -> u64 {
    let (a, b) = (a as i32, b as i32);

    if b == 0 {
        return sign_extend_word(a as u32);
    }

    sign_extend_word(a.wrapping_rem(b) as u32)
}

pub fn remuw(a: u64, b: u64) -> u64 {
    let (a, b) = (a as u32, b as u32);

    sign_extend_word(a.checked_rem(b).unwrap_or(a))
}
