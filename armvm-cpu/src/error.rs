// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Execution errors.
//!
//! Instruction handlers fail with [`ExecError`]; the run loop attaches the
//! faulting instruction's address and word to produce a [`CpuError`].

use armvm_common::VAddr;
use thiserror::Error;

use crate::memory::MemoryFault;
use crate::state::Interrupt;

/// Failure inside a single instruction handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("undefined instruction")]
    Undefined,
    #[error("unimplemented: {0}")]
    Unimplemented(&'static str),
    #[error(transparent)]
    Memory(#[from] MemoryFault),
}

/// Result of an instruction handler.
pub type ExecResult<T> = Result<T, ExecError>;

/// Error that stopped a `run` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("undefined instruction 0x{raw:08X} at 0x{pc:08X}")]
    Undefined { pc: VAddr, raw: u32 },

    #[error("unimplemented {what} (instruction 0x{raw:08X} at 0x{pc:08X})")]
    Unimplemented {
        pc: VAddr,
        raw: u32,
        what: &'static str,
    },

    #[error("memory fault executing instruction at 0x{pc:08X}: {fault}")]
    Memory {
        pc: VAddr,
        #[source]
        fault: MemoryFault,
    },
}

impl CpuError {
    /// Attach the instruction address and word to a handler failure.
    pub fn from_exec(err: ExecError, pc: VAddr, raw: u32) -> Self {
        match err {
            ExecError::Undefined => Self::Undefined { pc, raw },
            ExecError::Unimplemented(what) => Self::Unimplemented { pc, raw, what },
            ExecError::Memory(fault) => Self::Memory { pc, fault },
        }
    }

    /// Address of the instruction that failed (or could not be fetched).
    pub fn pc(&self) -> VAddr {
        match *self {
            Self::Undefined { pc, .. } | Self::Unimplemented { pc, .. } | Self::Memory { pc, .. } => pc,
        }
    }

    /// The interrupt code a host that only understands interrupts should see.
    pub fn interrupt(&self) -> Interrupt {
        match self {
            Self::Undefined { .. } => Interrupt::Undefined,
            _ => Interrupt::Fatal,
        }
    }

    /// The memory fault behind this error, if any.
    pub fn memory_fault(&self) -> Option<MemoryFault> {
        match *self {
            Self::Memory { fault, .. } => Some(fault),
            _ => None,
        }
    }
}
