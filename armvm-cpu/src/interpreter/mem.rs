// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Load/Store instruction execution.

use armvm_common::{VAddr, REGISTER_COUNT};

use crate::decoder::*;
use crate::error::{ExecError, ExecResult};
use crate::memory::MemoryAccess;
use crate::state::CpuState;
use super::shifter;
use super::StepResult;

/// Helper: compute (access address, write-back address) for a transfer.
fn effective_address(base: u32, offset: u32, mode: AddressMode) -> (VAddr, VAddr) {
    let offset_addr = if mode.up {
        base.wrapping_add(offset)
    } else {
        base.wrapping_sub(offset)
    };
    let addr = if mode.pre { offset_addr } else { base };
    (addr, offset_addr)
}

/// Value stored for `rd`; r15 stores 8 bytes past the fetch pointer.
#[inline]
fn store_value(state: &CpuState, rd: u8) -> u32 {
    if rd == 15 {
        state.pc().wrapping_add(8)
    } else {
        state.get_reg(rd)
    }
}

/// LDR/STR/LDRB/STRB.
#[allow(clippy::too_many_arguments)]
pub fn exec_single_transfer(
    state: &mut CpuState,
    mem: &mut dyn MemoryAccess,
    mode: AddressMode,
    load: bool,
    byte: bool,
    rn: u8,
    rd: u8,
    offset: TransferOffset,
) -> ExecResult<StepResult> {
    let offset = match offset {
        TransferOffset::Immediate(imm) => imm as u32,
        TransferOffset::Register { rm, shift, amount } => {
            shifter::shift_immediate(state.read_operand(rm, false), shift, amount, state.c()).0
        }
    };
    let base = state.read_operand(rn, false);
    let (addr, wb_addr) = effective_address(base, offset, mode);

    if load {
        let value = if byte {
            mem.read_u8(addr)? as u32
        } else {
            mem.read_u32(addr)?
        };
        if mode.writes_back() {
            state.set_reg(rn, wb_addr);
        }
        state.set_reg(rd, value);
    } else {
        let value = store_value(state, rd);
        if byte {
            mem.write_u8(addr, value as u8)?;
        } else {
            mem.write_u32(addr, value)?;
        }
        if mode.writes_back() {
            state.set_reg(rn, wb_addr);
        }
    }
    Ok(StepResult::Continue)
}

/// LDRH/STRH/LDRSB/LDRSH.
#[allow(clippy::too_many_arguments)]
pub fn exec_halfword_transfer(
    state: &mut CpuState,
    mem: &mut dyn MemoryAccess,
    mode: AddressMode,
    load: bool,
    kind: HalfwordKind,
    rn: u8,
    rd: u8,
    offset: HalfwordOffset,
) -> ExecResult<StepResult> {
    let offset = match offset {
        HalfwordOffset::Immediate(imm) => imm as u32,
        HalfwordOffset::Register(rm) => state.read_operand(rm, false),
    };
    let base = state.read_operand(rn, false);
    let (addr, wb_addr) = effective_address(base, offset, mode);

    if load {
        let value = match kind {
            HalfwordKind::UnsignedHalf => mem.read_u16(addr)? as u32,
            HalfwordKind::SignedByte => mem.read_u8(addr)? as i8 as i32 as u32,
            HalfwordKind::SignedHalf => mem.read_u16(addr)? as i16 as i32 as u32,
        };
        if mode.writes_back() {
            state.set_reg(rn, wb_addr);
        }
        state.set_reg(rd, value);
    } else {
        if kind != HalfwordKind::UnsignedHalf {
            return Err(ExecError::Unimplemented("signed halfword/byte store"));
        }
        mem.write_u16(addr, store_value(state, rd) as u16)?;
        if mode.writes_back() {
            state.set_reg(rn, wb_addr);
        }
    }
    Ok(StepResult::Continue)
}

/// LDM/STM in all four addressing modes.
///
/// Increment modes walk the list upwards from the base, decrement modes walk
/// it downwards, so the lowest register always lands at the lowest address.
#[allow(clippy::too_many_arguments)]
pub fn exec_block_transfer(
    state: &mut CpuState,
    mem: &mut dyn MemoryAccess,
    pre: bool,
    up: bool,
    psr: bool,
    writeback: bool,
    load: bool,
    rn: u8,
    list: u16,
) -> ExecResult<StepResult> {
    if psr {
        return Err(ExecError::Unimplemented("block transfer with S bit"));
    }
    if list == 0 {
        return Ok(StepResult::Continue);
    }

    let regs: Vec<u8> = if up {
        (0..REGISTER_COUNT as u8).filter(|r| list & (1 << r) != 0).collect()
    } else {
        (0..REGISTER_COUNT as u8).rev().filter(|r| list & (1 << r) != 0).collect()
    };

    let mut addr = state.get_reg(rn);
    let step = |a: u32| if up { a.wrapping_add(4) } else { a.wrapping_sub(4) };
    let mut addrs = Vec::with_capacity(regs.len());
    for _ in &regs {
        if pre {
            addr = step(addr);
        }
        addrs.push(addr);
        if !pre {
            addr = step(addr);
        }
    }

    // Stores are all-or-nothing: a fault must not leave a partial list behind.
    if !load {
        for &a in &addrs {
            mem.check_write(a, 4)?;
        }
    }

    let mut loaded = [0u32; REGISTER_COUNT];
    for (&r, &a) in regs.iter().zip(&addrs) {
        if load {
            loaded[r as usize] = mem.read_u32(a)?;
        } else {
            let value = if r == 15 {
                state.pc().wrapping_add(4)
            } else {
                state.get_reg(r)
            };
            mem.write_u32(a, value)?;
        }
    }

    if load {
        for &r in &regs {
            state.set_reg(r, loaded[r as usize]);
        }
    }
    if writeback {
        state.set_reg(rn, addr);
    }
    Ok(StepResult::Continue)
}

/// SWP/SWPB: Rd = [Rn]; [Rn] = Rm.
pub fn exec_swap(
    state: &mut CpuState,
    mem: &mut dyn MemoryAccess,
    byte: bool,
    rn: u8,
    rd: u8,
    rm: u8,
) -> ExecResult<StepResult> {
    let addr = state.get_reg(rn);
    let source = state.get_reg(rm);
    let old = if byte {
        let old = mem.read_u8(addr)? as u32;
        mem.write_u8(addr, source as u8)?;
        old
    } else {
        let old = mem.read_u32(addr)?;
        mem.write_u32(addr, source)?;
        old
    };
    state.set_reg(rd, old);
    Ok(StepResult::Continue)
}
