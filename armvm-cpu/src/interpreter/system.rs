// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Software interrupt and PSR transfer execution.

use log::{debug, warn};

use crate::decoder::MsrSource;
use crate::error::ExecResult;
use crate::state::{CpuState, FLAGS_MASK};
use super::shifter;
use super::StepResult;

/// MSR field mask bit for the flags byte (PSR bits 31:24).
const FIELD_FLAGS: u8 = 0b1000;

pub fn exec_swi(comment: u32) -> ExecResult<StepResult> {
    Ok(StepResult::Swi(comment))
}

pub fn exec_mrs(state: &mut CpuState, rd: u8, spsr: bool) -> ExecResult<StepResult> {
    let value = if spsr { state.spsr } else { state.cpsr };
    state.set_reg(rd, value);
    Ok(StepResult::Continue)
}

/// MSR: only the condition flags are writable; control bits are not modelled.
pub fn exec_msr(state: &mut CpuState, spsr: bool, fields: u8, source: MsrSource) -> ExecResult<StepResult> {
    let value = match source {
        MsrSource::Register(rm) => state.get_reg(rm),
        MsrSource::Immediate { imm8, rotate } => shifter::rotate_immediate(imm8, rotate).0,
    };
    if fields & FIELD_FLAGS == 0 {
        debug!("MSR without flags field (mask {fields:#06b}) ignored");
        return Ok(StepResult::Continue);
    }
    if spsr {
        state.spsr = (state.spsr & !FLAGS_MASK) | (value & FLAGS_MASK);
    } else {
        state.set_flags(value);
    }
    Ok(StepResult::Continue)
}

/// Unallocated encoding in the PSR transfer space.
pub fn exec_psr_other(raw: u32) -> ExecResult<StepResult> {
    warn!("ignoring unsupported PSR transfer 0x{raw:08X}");
    Ok(StepResult::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FLAG_N, FLAG_Z};

    #[test]
    fn test_mrs_reads_status() {
        let mut s = CpuState::new();
        s.cpsr = FLAG_N | 0x10;
        s.spsr = FLAG_Z;
        exec_mrs(&mut s, 0, false).unwrap();
        exec_mrs(&mut s, 1, true).unwrap();
        assert_eq!(s.get_reg(0), FLAG_N | 0x10);
        assert_eq!(s.get_reg(1), FLAG_Z);
    }

    #[test]
    fn test_msr_updates_flags_only() {
        let mut s = CpuState::new();
        s.cpsr = 0x10;
        s.set_reg(2, 0xFFFF_FFFF);
        exec_msr(&mut s, false, 0b1001, MsrSource::Register(2)).unwrap();
        assert_eq!(s.cpsr, 0xF000_0010);

        exec_msr(&mut s, false, 0b0001, MsrSource::Immediate { imm8: 0, rotate: 0 }).unwrap();
        assert_eq!(s.cpsr, 0xF000_0010);

        exec_msr(&mut s, true, 0b1000, MsrSource::Immediate { imm8: 0x04, rotate: 2 }).unwrap();
        assert_eq!(s.spsr, 0x4000_0000);
    }

    #[test]
    fn test_swi_carries_comment() {
        assert!(matches!(exec_swi(7), Ok(StepResult::Swi(7))));
    }
}
