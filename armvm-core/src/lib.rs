// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! VM lifecycle: memory initialization, image loading, running and
//! inspection.

pub mod error;
pub mod vm;

pub use error::VmError;
pub use vm::{HostVm, Vm};
