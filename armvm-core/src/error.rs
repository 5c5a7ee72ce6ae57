// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use armvm_cpu::CpuError;
use thiserror::Error;

/// Errors returned by [`crate::Vm`] operations.
#[derive(Debug, Error)]
pub enum VmError {
    #[error("guest memory has not been initialized")]
    NotInitialized,

    #[error("failed to load {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image of {size:#X} bytes does not fit in {capacity:#X} bytes of guest memory")]
    ImageTooLarge { size: usize, capacity: usize },

    #[error(transparent)]
    Cpu(#[from] CpuError),
}

/// Result alias for VM operations.
pub type VmResult<T> = Result<T, VmError>;
