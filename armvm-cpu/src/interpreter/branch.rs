// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Branch instruction execution.

use log::warn;

use crate::error::ExecResult;
use crate::state::CpuState;
use super::StepResult;

/// B/BL: target = PC + 4 + offset; BL saves the already-advanced PC in LR.
pub fn exec_branch(state: &mut CpuState, link: bool, offset: i32) -> ExecResult<StepResult> {
    let pc = state.pc();
    if link {
        state.set_lr(pc);
    }
    state.set_pc(pc.wrapping_add(4).wrapping_add(offset as u32));
    Ok(StepResult::Continue)
}

/// BX: PC = Rm with bit 0 cleared. Thumb state is not modelled.
pub fn exec_branch_exchange(state: &mut CpuState, rm: u8) -> ExecResult<StepResult> {
    let target = state.read_operand(rm, false);
    if target & 1 != 0 {
        warn!("BX to 0x{target:08X} requests Thumb state; continuing in ARM state");
    }
    state.set_pc(target & !1);
    Ok(StepResult::Continue)
}
