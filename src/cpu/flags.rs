//! Condition codes and the arithmetic that sets them.
//!
//! Each operation here is a pure function of its inputs: it returns the
//! 16-bit result together with the condition codes the instruction leaves
//! behind. Flags an instruction does not define are carried over from
//! `prior` unchanged.

use serde::{Serialize, Deserialize};

const SIGN: u16 = 0o100000;

/// The four processor status flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionCodes {
    /// Result was negative.
    pub n: bool,
    /// Result was zero.
    pub z: bool,
    /// Signed overflow.
    pub v: bool,
    /// Carry out of (or borrow into) bit 15.
    pub c: bool,
}

impl ConditionCodes {
    /// N and Z from a result, V and C supplied.
    fn from_result(result: u16, v: bool, c: bool) -> Self {
        Self {
            n: is_negative(result),
            z: result == 0,
            v,
            c,
        }
    }

    /// Flags packed as the low nibble `NZVC`.
    pub fn bits(&self) -> u8 {
        (u8::from(self.n) << 3) | (u8::from(self.z) << 2) | (u8::from(self.v) << 1) | u8::from(self.c)
    }
}

#[inline]
fn is_negative(value: u16) -> bool {
    value & SIGN != 0
}

/// MOV: N and Z follow the moved value, V cleared, C untouched.
pub fn mov(src: u16, prior: ConditionCodes) -> ConditionCodes {
    ConditionCodes::from_result(src, false, prior.c)
}

/// CMP: computes `src - dst` without storing it.
pub fn cmp(src: u16, dst: u16) -> (u16, ConditionCodes) {
    let wide = i32::from(src) - i32::from(dst);
    let result = wide as u16;
    let c = wide & 0o200000 != 0;
    let v = is_negative(src) != is_negative(dst) && is_negative(src) == is_negative(result);
    (result, ConditionCodes::from_result(result, v, c))
}

/// ADD: `src + dst`.
pub fn add(src: u16, dst: u16) -> (u16, ConditionCodes) {
    let wide = u32::from(src) + u32::from(dst);
    let result = wide as u16;
    let c = wide > u32::from(u16::MAX);
    let v = is_negative(src) == is_negative(dst) && is_negative(src) != is_negative(result);
    (result, ConditionCodes::from_result(result, v, c))
}

/// SUB: `dst - src`.
pub fn sub(src: u16, dst: u16) -> (u16, ConditionCodes) {
    let wide = i32::from(dst) - i32::from(src);
    let result = wide as u16;
    let c = wide & 0o200000 != 0;
    let v = is_negative(src) != is_negative(dst) && is_negative(src) == is_negative(result);
    (result, ConditionCodes::from_result(result, v, c))
}

/// ASL: shifts `value` left one place. C is taken from bit 15 of `operand`,
/// the resolved destination operand.
pub fn asl(value: u16, operand: u16) -> (u16, ConditionCodes) {
    let result = value << 1;
    let c = is_negative(operand);
    let n = is_negative(result);
    (result, ConditionCodes::from_result(result, c ^ n, c))
}

/// ASR: shifts `value` right one place, replicating the sign bit. C is
/// taken from bit 0 of `operand`.
pub fn asr(value: u16, operand: u16) -> (u16, ConditionCodes) {
    let result = ((value as i16) >> 1) as u16;
    let c = operand & 1 != 0;
    let n = is_negative(result);
    (result, ConditionCodes::from_result(result, c ^ n, c))
}
