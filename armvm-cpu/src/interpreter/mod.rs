// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Pure-Rust ARMv4 interpreter.
//!
//! A fetch-decode-execute loop over [`MemoryAccess`]. Coprocessor formats are
//! forwarded to the attached [`Coprocessor`]; SWI ends the current `run`
//! call with the interrupt its comment field maps to.

pub mod alu;
pub mod branch;
pub mod mem;
pub mod shifter;
pub mod system;
mod watch;

use armvm_common::{VAddr, INSTRUCTION_SIZE};
use log::{debug, trace, warn};

use crate::coprocessor::{Coprocessor, NoCoprocessor};
use crate::decoder::{self, Condition, Instruction};
use crate::error::{CpuError, ExecError, ExecResult};
use crate::memory::MemoryAccess;
use crate::state::{CpuState, Interrupt};
use watch::WatchedMemory;

/// Result of executing a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// Instruction executed normally.
    Continue,
    /// SWI: return to the host with this comment field.
    Swi(u32),
}

/// Pure-Rust ARMv4 interpreter.
pub struct Interpreter<C: Coprocessor = NoCoprocessor> {
    coprocessor: C,
    /// Stores covering this address end the `run` call with `Suspend`.
    suspend_address: Option<VAddr>,
    last_swi: Option<u32>,
    executed: u64,
}

impl Default for Interpreter<NoCoprocessor> {
    fn default() -> Self {
        Self::new(NoCoprocessor)
    }
}

impl<C: Coprocessor> Interpreter<C> {
    pub fn new(coprocessor: C) -> Self {
        Self {
            coprocessor,
            suspend_address: None,
            last_swi: None,
            executed: 0,
        }
    }

    pub fn with_suspend_address(mut self, addr: Option<VAddr>) -> Self {
        self.suspend_address = addr;
        self
    }

    pub fn set_suspend_address(&mut self, addr: Option<VAddr>) {
        self.suspend_address = addr;
    }

    pub fn suspend_address(&self) -> Option<VAddr> {
        self.suspend_address
    }

    pub fn coprocessor(&self) -> &C {
        &self.coprocessor
    }

    pub fn coprocessor_mut(&mut self) -> &mut C {
        &mut self.coprocessor
    }

    /// Comment field of the most recent SWI.
    pub fn last_swi(&self) -> Option<u32> {
        self.last_swi
    }

    /// Instructions executed (including condition-failed ones) since reset.
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Reset bookkeeping and the coprocessor.
    pub fn reset(&mut self) {
        self.last_swi = None;
        self.executed = 0;
        self.coprocessor.reset();
    }

    /// Execute a single decoded instruction.
    fn execute(
        &mut self,
        state: &mut CpuState,
        mem_access: &mut dyn MemoryAccess,
        inst: Instruction,
    ) -> ExecResult<StepResult> {
        use Instruction::*;

        match inst {
            DataProcessing { opcode, set_flags, rn, rd, operand2 } => {
                alu::exec_data_processing(state, opcode, set_flags, rn, rd, operand2)
            }
            Mrs { rd, spsr } => system::exec_mrs(state, rd, spsr),
            Msr { spsr, fields, source } => system::exec_msr(state, spsr, fields, source),
            PsrOther { raw } => system::exec_psr_other(raw),
            Multiply { accumulate, set_flags, rd, rn, rs, rm } => {
                alu::exec_multiply(state, accumulate, set_flags, rd, rn, rs, rm)
            }
            MultiplyLong { signed, accumulate, set_flags, rd_hi, rd_lo, rs, rm } => {
                alu::exec_multiply_long(state, signed, accumulate, set_flags, rd_hi, rd_lo, rs, rm)
            }
            Swap { byte, rn, rd, rm } => mem::exec_swap(state, mem_access, byte, rn, rd, rm),
            BranchExchange { rm } => branch::exec_branch_exchange(state, rm),
            HalfwordTransfer { mode, load, kind, rn, rd, offset } => {
                mem::exec_halfword_transfer(state, mem_access, mode, load, kind, rn, rd, offset)
            }
            SingleTransfer { mode, load, byte, rn, rd, offset } => {
                mem::exec_single_transfer(state, mem_access, mode, load, byte, rn, rd, offset)
            }
            BlockTransfer { pre, up, psr, writeback, load, rn, list } => {
                mem::exec_block_transfer(state, mem_access, pre, up, psr, writeback, load, rn, list)
            }
            Branch { link, offset } => branch::exec_branch(state, link, offset),
            CoprocDataTransfer { raw } => self
                .coprocessor
                .data_transfer(state, mem_access, raw)
                .map(|_| StepResult::Continue),
            CoprocDataOp { raw } => self
                .coprocessor
                .data_operation(state, raw)
                .map(|_| StepResult::Continue),
            CoprocRegTransfer { raw } => self
                .coprocessor
                .register_transfer(state, raw)
                .map(|_| StepResult::Continue),
            SoftwareInterrupt { comment } => system::exec_swi(comment),
            Undefined { .. } => Err(ExecError::Undefined),
        }
    }

    /// Fetch, decode and execute one instruction.
    ///
    /// Returns `Some(interrupt)` when the instruction ends the `run` call. On
    /// error the PC is left at the failing instruction.
    pub fn step(
        &mut self,
        state: &mut CpuState,
        mem: &mut dyn MemoryAccess,
    ) -> Result<Option<Interrupt>, CpuError> {
        let pc = state.pc();
        let raw = mem
            .read_u32(pc)
            .map_err(|fault| CpuError::Memory { pc, fault })?;
        state.set_pc(pc.wrapping_add(INSTRUCTION_SIZE));
        self.executed += 1;

        let cond = Condition::of(raw);
        if !state.check_condition(cond) {
            if cond == Condition::Nv {
                warn!("0x{pc:08X}: NV condition on 0x{raw:08X}, treated as never");
            }
            return Ok(None);
        }

        let (format, inst) = decoder::decode_classified(raw);
        trace!("0x{pc:08X}: 0x{raw:08X} {format:?} {inst:?}");

        let mut watched = WatchedMemory::new(mem, self.suspend_address);
        let result = match self.execute(state, &mut watched, inst) {
            Ok(result) => result,
            Err(err) => {
                state.set_pc(pc);
                return Err(CpuError::from_exec(err, pc, raw));
            }
        };

        match result {
            StepResult::Swi(comment) => {
                self.last_swi = Some(comment);
                let interrupt = Interrupt::from_swi(comment);
                debug!("0x{pc:08X}: SWI 0x{comment:06X} -> {interrupt:?}");
                Ok(Some(interrupt))
            }
            StepResult::Continue if watched.hit() => {
                debug!("0x{pc:08X}: store to suspend address");
                Ok(Some(Interrupt::Suspend))
            }
            StepResult::Continue => Ok(None),
        }
    }

    /// Run until an interrupt, an error, or `max_iterations` instructions
    /// (0 means no limit). Running out of iterations returns `Resume`.
    pub fn run(
        &mut self,
        state: &mut CpuState,
        mem: &mut dyn MemoryAccess,
        max_iterations: u32,
    ) -> Result<Interrupt, CpuError> {
        let mut remaining = max_iterations;
        loop {
            if max_iterations != 0 {
                if remaining == 0 {
                    return Ok(Interrupt::Resume);
                }
                remaining -= 1;
            }
            if let Some(interrupt) = self.step(state, mem)? {
                return Ok(interrupt);
            }
        }
    }
}
