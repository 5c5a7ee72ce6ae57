// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! VFP register transfers (MRC/MCR space) and load/store (LDC/STC space).

use log::warn;

use crate::decoder::{bits, flag};
use crate::error::{ExecError, ExecResult};
use crate::memory::MemoryAccess;
use crate::state::{CpuState, FLAGS_MASK};
use super::regs::{DOUBLE_COUNT, SINGLE_COUNT};
use super::{dd, dm, dn, is_double, sd, sm, sn, Vfp, FPSID_VALUE};

/// System register numbers (Fn field of FMXR/FMRX).
const REG_FPSID: u32 = 0b0000;
const REG_FPSCR: u32 = 0b0001;

/// FMSR/FMRS/FMDLR/FMRDL/FMDHR/FMRDH/FMXR/FMRX.
pub(super) fn register_transfer(vfp: &mut Vfp, state: &mut CpuState, raw: u32) -> ExecResult<()> {
    let double = is_double(raw)?;
    let to_arm = flag(raw, 20);
    let rd = bits(raw, 15, 12) as u8;

    match (bits(raw, 23, 21), double) {
        // FMSR / FMRS
        (0b000, false) => {
            if to_arm {
                state.set_reg(rd, vfp.regs.single(sn(raw)));
            } else {
                vfp.regs.set_single(sn(raw), state.get_reg(rd));
            }
        }
        // FMDLR / FMRDL, FMDHR / FMRDH
        (0b000 | 0b001, true) => {
            let slot = dn(raw) * 2 + bits(raw, 21, 21) as usize;
            if to_arm {
                state.set_reg(rd, vfp.regs.single(slot));
            } else {
                vfp.regs.set_single(slot, state.get_reg(rd));
            }
        }
        // FMXR / FMRX
        (0b111, false) => system_transfer(vfp, state, bits(raw, 19, 16), rd, to_arm)?,
        _ => return Err(ExecError::Unimplemented("VFP register transfer")),
    }
    Ok(())
}

fn system_transfer(vfp: &mut Vfp, state: &mut CpuState, reg: u32, rd: u8, to_arm: bool) -> ExecResult<()> {
    match (reg, to_arm) {
        (REG_FPSID, true) => state.set_reg(rd, FPSID_VALUE),
        (REG_FPSID, false) => warn!("ignoring write of 0x{:08X} to read-only FPSID", state.get_reg(rd)),
        // FMSTAT: FPSCR flags into CPSR.
        (REG_FPSCR, true) if rd == 15 => state.set_flags(vfp.fpscr & FLAGS_MASK),
        (REG_FPSCR, _) => return Err(ExecError::Unimplemented("FPSCR transfer")),
        _ => return Err(ExecError::Unimplemented("VFP system register transfer")),
    }
    Ok(())
}

/// Loads, stores and two-register transfers.
pub(super) fn data_transfer(
    vfp: &mut Vfp,
    state: &mut CpuState,
    mem: &mut dyn MemoryAccess,
    raw: u32,
) -> ExecResult<()> {
    let double = is_double(raw)?;
    let pre = flag(raw, 24);
    let up = flag(raw, 23);
    let writeback = flag(raw, 21);
    let load = flag(raw, 20);
    let rn = bits(raw, 19, 16) as u8;
    let offset = bits(raw, 7, 0);

    // P U D W = 0 0 1 0: FMDRR/FMRRD/FMSRR/FMRRS
    if bits(raw, 24, 21) == 0b0010 {
        return two_register_transfer(vfp, state, raw, double, load);
    }

    let base = state.read_operand(rn, false);
    let first = if double { dd(raw) } else { sd(raw) };

    if pre && !writeback {
        // FLDS/FSTS/FLDD/FSTD [Rn, #±offset*4]
        let delta = offset * 4;
        let addr = if up { base.wrapping_add(delta) } else { base.wrapping_sub(delta) };
        return transfer_block(vfp, mem, addr, first, 1, double, load);
    }

    let (start, final_addr) = match (pre, up, writeback) {
        // FLDMIA/FSTMIA
        (false, true, _) => (base, base.wrapping_add(offset * 4)),
        // FLDMDB/FSTMDB with write-back
        (true, false, true) => {
            let start = base.wrapping_sub(offset * 4);
            (start, start)
        }
        _ => return Err(ExecError::Unimplemented("VFP data transfer addressing mode")),
    };
    let count = if double { offset as usize / 2 } else { offset as usize };
    transfer_block(vfp, mem, start, first, count, double, load)?;
    if writeback {
        state.set_reg(rn, final_addr);
    }
    Ok(())
}

/// Move `count` consecutive registers from `first` to/from `addr` upwards.
fn transfer_block(
    vfp: &mut Vfp,
    mem: &mut dyn MemoryAccess,
    addr: u32,
    first: usize,
    count: usize,
    double: bool,
    load: bool,
) -> ExecResult<()> {
    let bank = if double { DOUBLE_COUNT } else { SINGLE_COUNT };
    if count == 0 || first + count > bank {
        return Err(ExecError::Unimplemented("VFP register list outside the bank"));
    }
    let width: u32 = if double { 8 } else { 4 };

    if load {
        let mut values = Vec::with_capacity(count);
        for i in 0..count as u32 {
            let a = addr.wrapping_add(i * width);
            values.push(if double { mem.read_u64(a)? } else { mem.read_u32(a)? as u64 });
        }
        for (i, value) in values.into_iter().enumerate() {
            if double {
                vfp.regs.set_double(first + i, value);
            } else {
                vfp.regs.set_single(first + i, value as u32);
            }
        }
    } else {
        for i in 0..count as u32 {
            mem.check_write(addr.wrapping_add(i * width), width as usize)?;
        }
        for i in 0..count {
            let a = addr.wrapping_add(i as u32 * width);
            if double {
                mem.write_u64(a, vfp.regs.double(first + i))?;
            } else {
                mem.write_u32(a, vfp.regs.single(first + i))?;
            }
        }
    }
    Ok(())
}

/// Two ARM registers <-> one double or two consecutive singles.
fn two_register_transfer(vfp: &mut Vfp, state: &mut CpuState, raw: u32, double: bool, to_arm: bool) -> ExecResult<()> {
    let rd = bits(raw, 15, 12) as u8;
    let rn = bits(raw, 19, 16) as u8;
    let slot = if double { dm(raw) * 2 } else { sm(raw) };
    if slot + 1 >= SINGLE_COUNT {
        return Err(ExecError::Unimplemented("VFP register pair outside the bank"));
    }
    if to_arm {
        state.set_reg(rd, vfp.regs.single(slot));
        state.set_reg(rn, vfp.regs.single(slot + 1));
    } else {
        vfp.regs.set_single(slot, state.get_reg(rd));
        vfp.regs.set_single(slot + 1, state.get_reg(rn));
    }
    Ok(())
}
