// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod coprocessor;
pub mod decoder;
pub mod error;
pub mod interpreter;
pub mod memory;
pub mod pattern_decoder;
pub mod state;
pub mod vfp;

pub use coprocessor::{Coprocessor, NoCoprocessor};
pub use error::{CpuError, ExecError};
pub use interpreter::Interpreter;
pub use memory::{AccessKind, MemoryAccess, MemoryFault};
pub use state::{CpuState, Interrupt};
pub use vfp::Vfp;
