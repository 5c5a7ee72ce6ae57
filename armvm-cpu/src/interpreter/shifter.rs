// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Barrel shifter shared by data processing and single data transfer.
//!
//! Every function returns `(value, carry_out)`.

use crate::decoder::{Operand2, ShiftAmount, ShiftType};
use crate::state::CpuState;

/// Shift by a non-zero amount (register amounts may exceed 32).
fn shift_nonzero(value: u32, shift: ShiftType, amount: u32) -> (u32, bool) {
    match shift {
        ShiftType::LSL => match amount {
            1..=31 => (value << amount, (value >> (32 - amount)) & 1 != 0),
            32 => (0, value & 1 != 0),
            _ => (0, false),
        },
        ShiftType::LSR => match amount {
            1..=31 => (value >> amount, (value >> (amount - 1)) & 1 != 0),
            32 => (0, value >> 31 != 0),
            _ => (0, false),
        },
        ShiftType::ASR => {
            if amount < 32 {
                (((value as i32) >> amount) as u32, (value >> (amount - 1)) & 1 != 0)
            } else {
                let sign = value >> 31 != 0;
                (if sign { u32::MAX } else { 0 }, sign)
            }
        }
        ShiftType::ROR => {
            let rot = amount % 32;
            if rot == 0 {
                (value, value >> 31 != 0)
            } else {
                (value.rotate_right(rot), (value >> (rot - 1)) & 1 != 0)
            }
        }
    }
}

/// Rotate right by one through the carry flag.
#[inline]
fn rrx(value: u32, carry_in: bool) -> (u32, bool) {
    (((carry_in as u32) << 31) | (value >> 1), value & 1 != 0)
}

/// Shift by a 5-bit amount encoded in the instruction.
///
/// Amount 0 leaves LSL/LSR operands unchanged (carry 0); ASR/ROR by 0 encode RRX.
pub fn shift_immediate(value: u32, shift: ShiftType, amount: u8, carry_in: bool) -> (u32, bool) {
    if amount == 0 {
        return match shift {
            ShiftType::LSL | ShiftType::LSR => (value, false),
            ShiftType::ASR | ShiftType::ROR => rrx(value, carry_in),
        };
    }
    shift_nonzero(value, shift, amount as u32)
}

/// Shift by the bottom byte of a register.
pub fn shift_register(value: u32, shift: ShiftType, amount: u32) -> (u32, bool) {
    let amount = amount & 0xFF;
    if amount == 0 {
        return (value, false);
    }
    shift_nonzero(value, shift, amount)
}

/// Expand a rotated 8-bit immediate.
pub fn rotate_immediate(imm8: u8, rotate: u8) -> (u32, bool) {
    let value = (imm8 as u32).rotate_right(2 * rotate as u32);
    (value, rotate != 0 && value >> 31 != 0)
}

/// Evaluate a data-processing second operand.
pub fn operand2(state: &CpuState, op: Operand2) -> (u32, bool) {
    match op {
        Operand2::Immediate { imm8, rotate } => rotate_immediate(imm8, rotate),
        Operand2::Register { rm, shift, amount: ShiftAmount::Immediate(amount) } => {
            shift_immediate(state.read_operand(rm, false), shift, amount, state.c())
        }
        Operand2::Register { rm, shift, amount: ShiftAmount::Register(rs) } => {
            shift_register(state.read_operand(rm, true), shift, state.read_operand(rs, true))
        }
    }
}
