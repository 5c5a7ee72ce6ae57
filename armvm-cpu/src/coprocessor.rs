// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Coprocessor dispatch interface.
//!
//! The interpreter forwards the three coprocessor formats verbatim; the
//! attached unit does its own sub-decoding and gets access to the register
//! file and guest memory for the duration of the call.

use crate::error::{ExecError, ExecResult};
use crate::memory::MemoryAccess;
use crate::state::CpuState;

/// A boxed coprocessor, for hosts that pick the unit at runtime.
pub type CoprocessorImpl = Box<dyn Coprocessor + Send>;

/// ARMv4 coprocessor interface.
pub trait Coprocessor {
    /// LDC/STC space: transfers between memory (or ARM registers) and the unit.
    fn data_transfer(
        &mut self,
        state: &mut CpuState,
        mem: &mut dyn MemoryAccess,
        raw: u32,
    ) -> ExecResult<()>;

    /// CDP space: internal data operation.
    fn data_operation(&mut self, state: &mut CpuState, raw: u32) -> ExecResult<()>;

    /// MRC/MCR space: moves between ARM registers and unit registers.
    fn register_transfer(&mut self, state: &mut CpuState, raw: u32) -> ExecResult<()>;

    /// Return to power-on state.
    fn reset(&mut self) {}
}

impl<C: Coprocessor + ?Sized> Coprocessor for Box<C> {
    fn data_transfer(
        &mut self,
        state: &mut CpuState,
        mem: &mut dyn MemoryAccess,
        raw: u32,
    ) -> ExecResult<()> {
        (**self).data_transfer(state, mem, raw)
    }

    fn data_operation(&mut self, state: &mut CpuState, raw: u32) -> ExecResult<()> {
        (**self).data_operation(state, raw)
    }

    fn register_transfer(&mut self, state: &mut CpuState, raw: u32) -> ExecResult<()> {
        (**self).register_transfer(state, raw)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Empty coprocessor slot: every coprocessor instruction is undefined.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCoprocessor;

impl Coprocessor for NoCoprocessor {
    fn data_transfer(&mut self, _: &mut CpuState, _: &mut dyn MemoryAccess, _: u32) -> ExecResult<()> {
        Err(ExecError::Undefined)
    }

    fn data_operation(&mut self, _: &mut CpuState, _: u32) -> ExecResult<()> {
        Err(ExecError::Undefined)
    }

    fn register_transfer(&mut self, _: &mut CpuState, _: u32) -> ExecResult<()> {
        Err(ExecError::Undefined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::test_memory::TestMemory;

    #[test]
    fn test_no_coprocessor_rejects_everything() {
        let mut cp = NoCoprocessor;
        let mut state = CpuState::new();
        let mut mem = TestMemory::new();
        assert_eq!(cp.data_transfer(&mut state, &mut mem, 0xED93_0A00), Err(ExecError::Undefined));
        assert_eq!(cp.data_operation(&mut state, 0xEE30_0A01), Err(ExecError::Undefined));
        assert_eq!(cp.register_transfer(&mut state, 0xEE10_0A10), Err(ExecError::Undefined));
    }

    #[test]
    fn test_boxed_coprocessor_forwards() {
        let mut cp: CoprocessorImpl = Box::new(NoCoprocessor);
        let mut state = CpuState::new();
        assert_eq!(cp.data_operation(&mut state, 0), Err(ExecError::Undefined));
    }
}
