// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Memory access trait for the CPU interpreter.
//!
//! This trait abstracts guest memory so the interpreter can run against a
//! raw image or a permission-checked one without duplicating the instruction
//! set.

use armvm_common::VAddr;
use thiserror::Error;

/// Direction of a guest memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

impl std::fmt::Display for AccessKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Memory access error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryFault {
    #[error("segmentation fault: {access} of {width} bytes at 0x{addr:08X}")]
    Segfault {
        addr: VAddr,
        width: usize,
        access: AccessKind,
    },
    #[error("{width}-byte access at 0x{addr:08X} is outside guest memory")]
    OutOfBounds { addr: VAddr, width: usize },
}

impl MemoryFault {
    /// Guest address of the failing access.
    pub fn addr(&self) -> VAddr {
        match *self {
            Self::Segfault { addr, .. } | Self::OutOfBounds { addr, .. } => addr,
        }
    }
}

/// Trait for guest memory access, used by the interpreter and coprocessors.
///
/// All multi-byte reads/writes are little-endian and may be unaligned. A
/// failing access must leave memory untouched.
pub trait MemoryAccess {
    fn read_u8(&self, addr: VAddr) -> Result<u8, MemoryFault>;
    fn read_u16(&self, addr: VAddr) -> Result<u16, MemoryFault>;
    fn read_u32(&self, addr: VAddr) -> Result<u32, MemoryFault>;
    fn read_u64(&self, addr: VAddr) -> Result<u64, MemoryFault>;
    fn write_u8(&mut self, addr: VAddr, val: u8) -> Result<(), MemoryFault>;
    fn write_u16(&mut self, addr: VAddr, val: u16) -> Result<(), MemoryFault>;
    fn write_u32(&mut self, addr: VAddr, val: u32) -> Result<(), MemoryFault>;
    fn write_u64(&mut self, addr: VAddr, val: u64) -> Result<(), MemoryFault>;

    /// Authorize a `width`-byte store at `addr` without performing it.
    fn check_write(&self, addr: VAddr, width: usize) -> Result<(), MemoryFault>;
}
