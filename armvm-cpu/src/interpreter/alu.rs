// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Data-processing and multiply instruction execution.

use crate::decoder::*;
use crate::error::{ExecError, ExecResult};
use crate::state::CpuState;
use super::shifter;
use super::StepResult;

/// 32-bit add with carry-in, returning (result, carry_out, overflow).
#[inline]
pub fn add_with_carry(a: u32, b: u32, carry_in: bool) -> (u32, bool, bool) {
    let wide = a as u64 + b as u64 + carry_in as u64;
    let result = wide as u32;
    let carry = wide > u32::MAX as u64;
    let overflow = (!(a ^ b) & (a ^ result)) >> 31 != 0;
    (result, carry, overflow)
}

/// a - b - !carry_in, computed as a + !b + carry_in (ARM borrow convention).
#[inline]
fn sub_with_carry(a: u32, b: u32, carry_in: bool) -> (u32, bool, bool) {
    add_with_carry(a, !b, carry_in)
}

pub fn exec_data_processing(
    state: &mut CpuState,
    opcode: DpOpcode,
    set_flags: bool,
    rn: u8,
    rd: u8,
    op2: Operand2,
) -> ExecResult<StepResult> {
    if set_flags && rd == 15 {
        return Err(ExecError::Unimplemented("flag-setting data processing with Rd = r15"));
    }

    let register_shift = matches!(op2, Operand2::Register { amount: ShiftAmount::Register(_), .. });
    let a = state.read_operand(rn, register_shift);
    let (b, shifter_carry) = shifter::operand2(state, op2);
    let c = state.c();

    // (result, Some((carry, overflow))) for arithmetic ops, None for logical.
    let (result, arith) = match opcode {
        DpOpcode::And | DpOpcode::Tst => (a & b, None),
        DpOpcode::Eor | DpOpcode::Teq => (a ^ b, None),
        DpOpcode::Orr => (a | b, None),
        DpOpcode::Mov => (b, None),
        DpOpcode::Bic => (a & !b, None),
        DpOpcode::Mvn => (!b, None),
        DpOpcode::Sub | DpOpcode::Cmp => split(sub_with_carry(a, b, true)),
        DpOpcode::Rsb => split(sub_with_carry(b, a, true)),
        DpOpcode::Add | DpOpcode::Cmn => split(add_with_carry(a, b, false)),
        DpOpcode::Adc => split(add_with_carry(a, b, c)),
        DpOpcode::Sbc => split(sub_with_carry(a, b, c)),
        DpOpcode::Rsc => split(sub_with_carry(b, a, c)),
    };

    if !opcode.is_test() {
        state.set_reg(rd, result);
    }

    if set_flags {
        state.set_nz(result);
        match arith {
            Some((carry, overflow)) => {
                state.set_c(carry);
                state.set_v(overflow);
            }
            None => state.set_c(shifter_carry),
        }
    }
    Ok(StepResult::Continue)
}

#[inline]
fn split((result, carry, overflow): (u32, bool, bool)) -> (u32, Option<(bool, bool)>) {
    (result, Some((carry, overflow)))
}

/// MUL/MLA: Rd = Rm * Rs (+ Rn).
pub fn exec_multiply(
    state: &mut CpuState,
    accumulate: bool,
    set_flags: bool,
    rd: u8,
    rn: u8,
    rs: u8,
    rm: u8,
) -> ExecResult<StepResult> {
    let mut result = state.get_reg(rm).wrapping_mul(state.get_reg(rs));
    if accumulate {
        result = result.wrapping_add(state.get_reg(rn));
    }
    state.set_reg(rd, result);
    if set_flags && rd != 15 {
        state.set_nz(result);
    }
    Ok(StepResult::Continue)
}

/// UMULL/UMLAL/SMULL/SMLAL: RdHi:RdLo = Rm * Rs (+ RdHi:RdLo).
#[allow(clippy::too_many_arguments)]
pub fn exec_multiply_long(
    state: &mut CpuState,
    signed: bool,
    accumulate: bool,
    set_flags: bool,
    rd_hi: u8,
    rd_lo: u8,
    rs: u8,
    rm: u8,
) -> ExecResult<StepResult> {
    let m = state.get_reg(rm);
    let s = state.get_reg(rs);
    let mut result = if signed {
        ((m as i32 as i64) * (s as i32 as i64)) as u64
    } else {
        m as u64 * s as u64
    };
    if accumulate {
        let acc = ((state.get_reg(rd_hi) as u64) << 32) | state.get_reg(rd_lo) as u64;
        result = result.wrapping_add(acc);
    }
    state.set_reg(rd_lo, result as u32);
    state.set_reg(rd_hi, (result >> 32) as u32);
    if set_flags && rd_hi != 15 && rd_lo != 15 {
        state.set_n(result >> 63 != 0);
        state.set_z(result == 0);
    }
    Ok(StepResult::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FLAG_C, FLAG_V};

    fn reg(rm: u8) -> Operand2 {
        Operand2::Register { rm, shift: ShiftType::LSL, amount: ShiftAmount::Immediate(0) }
    }

    fn run(state: &mut CpuState, opcode: DpOpcode, set_flags: bool) {
        exec_data_processing(state, opcode, set_flags, 1, 0, reg(2)).unwrap();
    }

    #[test]
    fn test_adds_signed_overflow() {
        let mut s = CpuState::new();
        s.set_reg(1, 0x7FFF_FFFF);
        s.set_reg(2, 1);
        run(&mut s, DpOpcode::Add, true);
        assert_eq!(s.get_reg(0), 0x8000_0000);
        assert!(s.n());
        assert!(!s.z());
        assert!(!s.c());
        assert!(s.v());
    }

    #[test]
    fn test_subs_equal_operands() {
        let mut s = CpuState::new();
        s.set_reg(1, 0xFFFF_FFFF);
        s.set_reg(2, 0xFFFF_FFFF);
        run(&mut s, DpOpcode::Sub, true);
        assert_eq!(s.get_reg(0), 0);
        assert!(s.z());
        assert!(s.c());
        assert!(!s.v());
        assert!(!s.n());
    }

    #[test]
    fn test_sub_borrow_clears_carry() {
        let mut s = CpuState::new();
        s.set_reg(1, 1);
        s.set_reg(2, 2);
        run(&mut s, DpOpcode::Sub, true);
        assert_eq!(s.get_reg(0), 0xFFFF_FFFF);
        assert!(!s.c());
        assert!(s.n());
    }

    #[test]
    fn test_adc_sbc_rsc_use_carry() {
        let mut s = CpuState::new();
        s.set_flags(FLAG_C);
        s.set_reg(1, 10);
        s.set_reg(2, 3);
        run(&mut s, DpOpcode::Adc, false);
        assert_eq!(s.get_reg(0), 14);
        run(&mut s, DpOpcode::Sbc, false);
        assert_eq!(s.get_reg(0), 7);
        run(&mut s, DpOpcode::Rsc, false);
        assert_eq!(s.get_reg(0), 0xFFFF_FFF9);

        s.set_flags(0);
        run(&mut s, DpOpcode::Sbc, false);
        assert_eq!(s.get_reg(0), 6);
        run(&mut s, DpOpcode::Rsb, false);
        assert_eq!(s.get_reg(0), 0xFFFF_FFF9);
    }

    #[test]
    fn test_logical_flags_keep_v() {
        let mut s = CpuState::new();
        s.set_flags(FLAG_V);
        s.set_reg(1, 0xF0);
        let op2 = Operand2::Immediate { imm8: 0x0F, rotate: 2 };
        exec_data_processing(&mut s, DpOpcode::Orr, true, 1, 0, op2).unwrap();
        assert_eq!(s.get_reg(0), 0xF000_00F0);
        assert!(s.n());
        assert!(s.c());
        assert!(s.v());
    }

    #[test]
    fn test_compare_discards_result() {
        let mut s = CpuState::new();
        s.set_reg(0, 0x1234);
        s.set_reg(1, 5);
        s.set_reg(2, 5);
        run(&mut s, DpOpcode::Cmp, true);
        assert_eq!(s.get_reg(0), 0x1234);
        assert!(s.z());
        assert_eq!(s.flags() & FLAG_C, FLAG_C);
    }

    #[test]
    fn test_flag_setting_pc_destination_is_unimplemented() {
        let mut s = CpuState::new();
        let err = exec_data_processing(&mut s, DpOpcode::Mov, true, 0, 15, reg(14)).unwrap_err();
        assert!(matches!(err, ExecError::Unimplemented(_)));
    }

    #[test]
    fn test_mov_pc_branches() {
        let mut s = CpuState::new();
        s.set_reg(14, 0x400);
        exec_data_processing(&mut s, DpOpcode::Mov, false, 0, 15, reg(14)).unwrap();
        assert_eq!(s.pc(), 0x400);
    }

    #[test]
    fn test_mla_and_flags() {
        let mut s = CpuState::new();
        s.set_flags(FLAG_C | FLAG_V);
        s.set_reg(1, 6);
        s.set_reg(2, 7);
        s.set_reg(3, 0xFFFF_FFD6); // -42
        exec_multiply(&mut s, true, true, 0, 3, 2, 1).unwrap();
        assert_eq!(s.get_reg(0), 0);
        assert!(s.z());
        assert!(s.c());
        assert!(s.v());
    }

    #[test]
    fn test_long_multiply_signed_and_unsigned() {
        let mut s = CpuState::new();
        s.set_reg(2, 0xFFFF_FFFF);
        s.set_reg(3, 2);
        exec_multiply_long(&mut s, false, false, true, 1, 0, 3, 2).unwrap();
        assert_eq!((s.get_reg(1), s.get_reg(0)), (1, 0xFFFF_FFFE));
        assert!(!s.n());

        exec_multiply_long(&mut s, true, false, true, 1, 0, 3, 2).unwrap();
        assert_eq!((s.get_reg(1), s.get_reg(0)), (0xFFFF_FFFF, 0xFFFF_FFFE));
        assert!(s.n());

        // SMLAL: -2 + 3 = 1
        s.set_reg(2, 3);
        s.set_reg(3, 1);
        exec_multiply_long(&mut s, true, true, true, 1, 0, 3, 2).unwrap();
        assert_eq!((s.get_reg(1), s.get_reg(0)), (0, 1));
        assert!(!s.z());
    }
}
