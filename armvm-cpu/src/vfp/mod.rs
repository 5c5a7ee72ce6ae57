// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! VFP reference coprocessor (cp10 single precision, cp11 double precision).

mod arith;
pub mod regs;
mod transfer;

use crate::coprocessor::Coprocessor;
use crate::decoder::{bit, bits};
use crate::error::{ExecError, ExecResult};
use crate::memory::MemoryAccess;
use crate::state::CpuState;
pub use regs::VfpRegisters;

/// FPSID value reported by `FMRX Rd, FPSID` (VFP11-style implementation id).
pub const FPSID_VALUE: u32 = 0x4101_20B4;

/// Coprocessor number of single-precision instructions.
const CP_SINGLE: u32 = 10;
/// Coprocessor number of double-precision instructions.
const CP_DOUBLE: u32 = 11;

/// VFP unit state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vfp {
    pub regs: VfpRegisters,
    /// Status and control; compare results live in bits 31:28.
    pub fpscr: u32,
    pub fpexc: u32,
}

impl Vfp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fpsid(&self) -> u32 {
        FPSID_VALUE
    }
}

/// `true` for double precision; other coprocessor numbers are not ours.
fn is_double(raw: u32) -> ExecResult<bool> {
    match bits(raw, 11, 8) {
        CP_SINGLE => Ok(false),
        CP_DOUBLE => Ok(true),
        _ => Err(ExecError::Undefined),
    }
}

// Register field helpers. Single registers are 5 bits (4-bit field + 1 extra
// bit), double registers use the 4-bit field alone.

/// Sd = Fd:D
#[inline]
fn sd(raw: u32) -> usize {
    ((bits(raw, 15, 12) << 1) | bit(raw, 22)) as usize
}

/// Sn = Fn:N
#[inline]
fn sn(raw: u32) -> usize {
    ((bits(raw, 19, 16) << 1) | bit(raw, 7)) as usize
}

/// Sm = Fm:M
#[inline]
fn sm(raw: u32) -> usize {
    ((bits(raw, 3, 0) << 1) | bit(raw, 5)) as usize
}

#[inline]
fn dd(raw: u32) -> usize {
    bits(raw, 15, 12) as usize
}

#[inline]
fn dn(raw: u32) -> usize {
    bits(raw, 19, 16) as usize
}

#[inline]
fn dm(raw: u32) -> usize {
    bits(raw, 3, 0) as usize
}

impl Coprocessor for Vfp {
    fn data_transfer(
        &mut self,
        state: &mut CpuState,
        mem: &mut dyn MemoryAccess,
        raw: u32,
    ) -> ExecResult<()> {
        transfer::data_transfer(self, state, mem, raw)
    }

    fn data_operation(&mut self, state: &mut CpuState, raw: u32) -> ExecResult<()> {
        arith::data_operation(self, state, raw)
    }

    fn register_transfer(&mut self, state: &mut CpuState, raw: u32) -> ExecResult<()> {
        transfer::register_transfer(self, state, raw)
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
