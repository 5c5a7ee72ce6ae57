// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

/// Address in guest memory (32-bit).
pub type VAddr = u32;

/// Number of general-purpose registers (r0-r15).
pub const REGISTER_COUNT: usize = 16;

/// Link register index.
pub const REG_LR: usize = 14;

/// Program counter register index.
pub const REG_PC: usize = 15;

/// Size of one ARM instruction word in bytes.
pub const INSTRUCTION_SIZE: u32 = 4;

/// Default guest memory size (1 MiB).
pub const DEFAULT_MEMORY_SIZE: usize = 0x10_0000;

/// Guest images are loaded at this address.
pub const LOAD_ADDRESS: VAddr = 0;

/// SWI comment values understood by the host.
///
/// The comment field of an SWI instruction selects the interrupt the host
/// observes when `run` returns.
pub mod swi {
    pub const RESUME: u32 = 0;
    pub const STOP: u32 = 1;
    pub const SUSPEND: u32 = 2;
    pub const FATAL: u32 = 3;
}

/// Check that `[addr, addr + len)` lies inside a buffer of `size` bytes.
#[inline]
pub const fn span_in_bounds(addr: VAddr, len: usize, size: usize) -> bool {
    let start = addr as usize;
    match start.checked_add(len) {
        Some(end) => end <= size,
        None => false,
    }
}

/// Check whether `[addr, addr + len)` covers `target`.
#[inline]
pub const fn span_covers(addr: VAddr, len: usize, target: VAddr) -> bool {
    let start = addr as u64;
    let target = target as u64;
    target >= start && target < start + len as u64
}
