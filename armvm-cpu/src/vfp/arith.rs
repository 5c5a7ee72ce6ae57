// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! VFP data operations (CDP space).

use crate::decoder::{bit, bits};
use crate::error::{ExecError, ExecResult};
use crate::state::{CpuState, FLAGS_MASK, FLAG_C, FLAG_N, FLAG_V, FLAG_Z};
use super::{dd, dm, dn, is_double, sd, sm, sn, Vfp};

/// Opcode selecting the extension space (second-level dispatch on Fn:N).
const OP_EXTENSION: u32 = 0b1111;

/// FPSCR rounding mode field (bits 23:22).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundingMode {
    Nearest,
    PlusInfinity,
    MinusInfinity,
    Zero,
}

impl RoundingMode {
    fn from_fpscr(fpscr: u32) -> Self {
        match bits(fpscr, 23, 22) {
            0 => Self::Nearest,
            1 => Self::PlusInfinity,
            2 => Self::MinusInfinity,
            _ => Self::Zero,
        }
    }

    fn apply(self, value: f64) -> f64 {
        match self {
            Self::Nearest => value.round_ties_even(),
            Self::PlusInfinity => value.ceil(),
            Self::MinusInfinity => value.floor(),
            Self::Zero => value.trunc(),
        }
    }
}

/// Round an f64 intermediate to the operating precision.
#[inline]
fn narrow(value: f64, double: bool) -> f64 {
    if double {
        value
    } else {
        value as f32 as f64
    }
}

pub(super) fn data_operation(vfp: &mut Vfp, state: &mut CpuState, raw: u32) -> ExecResult<()> {
    let double = is_double(raw)?;
    let opcode = (bit(raw, 23) << 3) | (bit(raw, 21) << 2) | (bit(raw, 20) << 1) | bit(raw, 6);
    if opcode == OP_EXTENSION {
        return extension(vfp, state, raw, double);
    }

    let (d, n, m) = if double {
        (dd(raw), dn(raw), dm(raw))
    } else {
        (sd(raw), sn(raw), sm(raw))
    };
    let regs = &mut vfp.regs;
    let acc = regs.read_fp(d, double);
    let a = regs.read_fp(n, double);
    let b = regs.read_fp(m, double);
    let product = || narrow(a * b, double);

    let result = match opcode {
        0b0000 => acc + product(),    // FMAC
        0b0001 => acc - product(),    // FNMAC
        0b0010 => -acc + product(),   // FMSC
        0b0011 => -acc - product(),   // FNMSC
        0b0100 => product(),          // FMUL
        0b0101 => -product(),         // FNMUL
        0b0110 => a + b,              // FADD
        0b0111 => a - b,              // FSUB
        0b1000 => a / b,              // FDIV
        _ => return Err(ExecError::Unimplemented("VFP data operation opcode")),
    };
    regs.write_fp(d, double, result);
    Ok(())
}

/// Extension opcodes: copy/abs/neg/sqrt, compares and conversions.
fn extension(vfp: &mut Vfp, state: &mut CpuState, raw: u32, double: bool) -> ExecResult<()> {
    let ext = sn(raw);
    let (d, m) = if double { (dd(raw), dm(raw)) } else { (sd(raw), sm(raw)) };
    let regs = &mut vfp.regs;

    match ext {
        // FCPY / FABS / FNEG operate on the sign bit only.
        0b00000..=0b00010 => {
            let sign_op = |bits: u64, sign: u64| match ext {
                0b00000 => bits,
                0b00001 => bits & !sign,
                _ => bits ^ sign,
            };
            if double {
                let v = sign_op(regs.double(m), 1 << 63);
                regs.set_double(d, v);
            } else {
                let v = sign_op(regs.single(m) as u64, 1 << 31);
                regs.set_single(d, v as u32);
            }
        }
        // FSQRT
        0b00011 => {
            let v = regs.read_fp(m, double).sqrt();
            regs.write_fp(d, double, v);
        }
        // FCMP / FCMPE / FCMPZ / FCMPEZ
        0b01000..=0b01011 => {
            let a = regs.read_fp(d, double);
            let b = if ext & 0b10 != 0 { 0.0 } else { regs.read_fp(m, double) };
            let flags = compare_flags(a, b);
            vfp.fpscr = (vfp.fpscr & !FLAGS_MASK) | flags;
            state.set_flags(flags);
        }
        // FCVTDS (cp10) / FCVTSD (cp11)
        0b01111 => {
            if double {
                let v = regs.double_f64(dm(raw));
                regs.set_single_f32(sd(raw), v as f32);
            } else {
                let v = regs.single_f32(sm(raw));
                regs.set_double_f64(dd(raw), v as f64);
            }
        }
        // FUITO / FSITO: integer source is always a single slot.
        0b10000 | 0b10001 => {
            let int = regs.single(sm(raw));
            let v = if ext & 1 != 0 { int as i32 as f64 } else { int as f64 };
            regs.write_fp(d, double, v);
        }
        // FTOUI / FTOUIZ / FTOSI / FTOSIZ: integer destination is always a single slot.
        0b11000..=0b11011 => {
            let v = regs.read_fp(m, double);
            let mode = if ext & 1 != 0 {
                RoundingMode::Zero
            } else {
                RoundingMode::from_fpscr(vfp.fpscr)
            };
            let rounded = mode.apply(v);
            let int = if ext & 0b10 != 0 {
                rounded as i32 as u32
            } else {
                rounded as u32
            };
            regs.set_single(sd(raw), int);
        }
        _ => return Err(ExecError::Unimplemented("VFP extension opcode")),
    }
    Ok(())
}

/// IEEE-754 compare result in N/Z/C/V layout.
fn compare_flags(a: f64, b: f64) -> u32 {
    if a.is_nan() || b.is_nan() {
        FLAG_V
    } else if a < b {
        FLAG_N
    } else if a == b {
        FLAG_Z | FLAG_C
    } else {
        FLAG_C
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Encoders for the tests; cp = 10 or 11.
    fn cdp(cp: u32, opcode: u32, d: usize, n: usize, m: usize) -> u32 {
        let (p, q, r, s) = (opcode >> 3 & 1, opcode >> 2 & 1, opcode >> 1 & 1, opcode & 1);
        let (fd, dbit, fnn, nbit, fm, mbit) = if cp == 11 {
            (d as u32, 0, n as u32, 0, m as u32, 0)
        } else {
            (d as u32 >> 1, d as u32 & 1, n as u32 >> 1, n as u32 & 1, m as u32 >> 1, m as u32 & 1)
        };
        0xEE00_0000 | p << 23 | dbit << 22 | q << 21 | r << 20 | fnn << 16 | fd << 12
            | cp << 8 | nbit << 7 | s << 6 | mbit << 5 | fm
    }

    fn ext(cp: u32, code: u32, d: usize, m: usize) -> u32 {
        cdp(cp, OP_EXTENSION, d, 0, m) | (code >> 1) << 16 | (code & 1) << 7
    }

    fn setup() -> (Vfp, CpuState) {
        (Vfp::new(), CpuState::new())
    }

    #[test]
    fn test_encoder_matches_assembler() {
        assert_eq!(cdp(10, 0b0110, 1, 2, 3), 0xEE71_0A21);
        assert_eq!(cdp(11, 0b0110, 1, 2, 3), 0xEE32_1B03);
    }

    #[test]
    fn test_single_arithmetic() {
        let (mut vfp, mut st) = setup();
        vfp.regs.set_single_f32(2, 1.5);
        vfp.regs.set_single_f32(3, 2.25);
        data_operation(&mut vfp, &mut st, cdp(10, 0b0110, 1, 2, 3)).unwrap();
        assert_eq!(vfp.regs.single_f32(1), 3.75);
        data_operation(&mut vfp, &mut st, cdp(10, 0b0111, 1, 2, 3)).unwrap();
        assert_eq!(vfp.regs.single_f32(1), -0.75);
        data_operation(&mut vfp, &mut st, cdp(10, 0b0100, 1, 2, 3)).unwrap();
        assert_eq!(vfp.regs.single_f32(1), 3.375);
        data_operation(&mut vfp, &mut st, cdp(10, 0b0101, 1, 2, 3)).unwrap();
        assert_eq!(vfp.regs.single_f32(1), -3.375);
        data_operation(&mut vfp, &mut st, cdp(10, 0b1000, 1, 3, 2)).unwrap();
        assert_eq!(vfp.regs.single_f32(1), 1.5);
    }

    #[test]
    fn test_single_division_rounds_to_single() {
        let (mut vfp, mut st) = setup();
        vfp.regs.set_single_f32(0, 1.0);
        vfp.regs.set_single_f32(1, 3.0);
        data_operation(&mut vfp, &mut st, cdp(10, 0b1000, 2, 0, 1)).unwrap();
        assert_eq!(vfp.regs.single_f32(2), 1.0f32 / 3.0f32);
    }

    #[test]
    fn test_multiply_accumulate_family() {
        let (mut vfp, mut st) = setup();
        let set = |vfp: &mut Vfp| {
            vfp.regs.set_double_f64(0, 10.0);
            vfp.regs.set_double_f64(1, 2.0);
            vfp.regs.set_double_f64(2, 3.0);
        };
        for (op, expected) in [(0b0000, 16.0), (0b0001, 4.0), (0b0010, -4.0), (0b0011, -16.0)] {
            set(&mut vfp);
            data_operation(&mut vfp, &mut st, cdp(11, op, 0, 1, 2)).unwrap();
            assert_eq!(vfp.regs.double_f64(0), expected, "opcode {op:04b}");
        }
    }

    #[test]
    fn test_double_divide_and_aliasing() {
        let (mut vfp, mut st) = setup();
        vfp.regs.set_double_f64(2, 1.0);
        vfp.regs.set_double_f64(3, 4.0);
        data_operation(&mut vfp, &mut st, cdp(11, 0b1000, 1, 2, 3)).unwrap();
        assert_eq!(vfp.regs.double_f64(1), 0.25);
        let bits = 0.25f64.to_bits();
        assert_eq!(vfp.regs.single(2), bits as u32);
        assert_eq!(vfp.regs.single(3), (bits >> 32) as u32);
    }

    #[test]
    fn test_copy_abs_neg_sqrt() {
        let (mut vfp, mut st) = setup();
        vfp.regs.set_single_f32(4, -9.0);
        data_operation(&mut vfp, &mut st, ext(10, 0b00000, 5, 4)).unwrap();
        assert_eq!(vfp.regs.single_f32(5), -9.0);
        data_operation(&mut vfp, &mut st, ext(10, 0b00001, 5, 4)).unwrap();
        assert_eq!(vfp.regs.single_f32(5), 9.0);
        data_operation(&mut vfp, &mut st, ext(10, 0b00010, 6, 5)).unwrap();
        assert_eq!(vfp.regs.single_f32(6), -9.0);
        data_operation(&mut vfp, &mut st, ext(10, 0b00011, 7, 5)).unwrap();
        assert_eq!(vfp.regs.single_f32(7), 3.0);

        vfp.regs.set_double_f64(1, 2.5);
        data_operation(&mut vfp, &mut st, ext(11, 0b00010, 2, 1)).unwrap();
        assert_eq!(vfp.regs.double_f64(2), -2.5);
    }

    #[test]
    fn test_compare_sets_fpscr_and_cpsr() {
        let (mut vfp, mut st) = setup();
        let cases = [
            (1.0, 2.0, FLAG_N),
            (2.0, 2.0, FLAG_Z | FLAG_C),
            (3.0, 2.0, FLAG_C),
            (f64::NAN, 2.0, FLAG_V),
        ];
        for (a, b, flags) in cases {
            vfp.regs.set_double_f64(0, a);
            vfp.regs.set_double_f64(1, b);
            data_operation(&mut vfp, &mut st, ext(11, 0b01000, 0, 1)).unwrap();
            assert_eq!(vfp.fpscr & FLAGS_MASK, flags);
            assert_eq!(st.flags(), flags);
        }
    }

    #[test]
    fn test_compare_with_zero() {
        let (mut vfp, mut st) = setup();
        vfp.regs.set_single_f32(0, -1.0);
        data_operation(&mut vfp, &mut st, ext(10, 0b01010, 0, 0)).unwrap();
        assert!(st.n());
        vfp.regs.set_single_f32(0, 0.0);
        data_operation(&mut vfp, &mut st, ext(10, 0b01011, 0, 0)).unwrap();
        assert!(st.z() && st.c());
    }

    #[test]
    fn test_precision_conversion() {
        let (mut vfp, mut st) = setup();
        vfp.regs.set_single_f32(1, 0.5);
        // FCVTDS d2, s1
        data_operation(&mut vfp, &mut st, ext(10, 0b01111, 4, 1)).unwrap();
        assert_eq!(vfp.regs.double_f64(2), 0.5);
        // FCVTSD s0, d2 (cp11 encodes Sd as Fd:D)
        let raw = 0xEEB7_0BC2;
        data_operation(&mut vfp, &mut st, raw).unwrap();
        assert_eq!(vfp.regs.single_f32(0), 0.5);
    }

    #[test]
    fn test_integer_conversions() {
        let (mut vfp, mut st) = setup();
        vfp.regs.set_single(3, (-7i32) as u32);
        // FSITOD d1, s3
        data_operation(&mut vfp, &mut st, ext(11, 0b10001, 1, 0) | (1 << 5) | 1).unwrap();
        assert_eq!(vfp.regs.double_f64(1), -7.0);
        // FUITOS s4, s3
        data_operation(&mut vfp, &mut st, ext(10, 0b10000, 4, 3)).unwrap();
        assert_eq!(vfp.regs.single_f32(4), 4_294_967_289.0f32);

        vfp.regs.set_single_f32(6, -2.5);
        // FTOSIS s7, s6 (round to nearest even)
        data_operation(&mut vfp, &mut st, ext(10, 0b11010, 7, 6)).unwrap();
        assert_eq!(vfp.regs.single(7) as i32, -2);
        // FTOSIZS s7, s6 (truncate)
        data_operation(&mut vfp, &mut st, ext(10, 0b11011, 7, 6)).unwrap();
        assert_eq!(vfp.regs.single(7) as i32, -2);
        // FTOUIS saturates negatives to zero
        data_operation(&mut vfp, &mut st, ext(10, 0b11000, 7, 6)).unwrap();
        assert_eq!(vfp.regs.single(7), 0);

        vfp.fpscr = 2 << 22; // round towards minus infinity
        data_operation(&mut vfp, &mut st, ext(10, 0b11010, 7, 6)).unwrap();
        assert_eq!(vfp.regs.single(7) as i32, -3);
    }

    #[test]
    fn test_unknown_extension_is_unimplemented() {
        let (mut vfp, mut st) = setup();
        let err = data_operation(&mut vfp, &mut st, ext(10, 0b00100, 0, 0)).unwrap_err();
        assert!(matches!(err, ExecError::Unimplemented(_)));
    }
}
