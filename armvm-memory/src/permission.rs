// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use bitflags::bitflags;

use armvm_common::settings::{RangePermission, RangeSetting};
use armvm_common::VAddr;
use armvm_cpu::AccessKind;

bitflags! {
    /// Access permission of a guest memory window.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessPermission: u32 {
        const READ  = 1;
        const WRITE = 2;

        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
        const NONE       = 0;
    }
}

impl AccessPermission {
    /// Permission an access of the given kind requires.
    pub fn required_for(kind: AccessKind) -> Self {
        match kind {
            AccessKind::Read => Self::READ,
            AccessKind::Write => Self::WRITE,
        }
    }
}

impl std::fmt::Display for AccessPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let r = if self.contains(Self::READ) { 'R' } else { '-' };
        let w = if self.contains(Self::WRITE) { 'W' } else { '-' };
        write!(f, "{r}{w}")
    }
}

impl From<RangePermission> for AccessPermission {
    fn from(p: RangePermission) -> Self {
        match p {
            RangePermission::Read => Self::READ,
            RangePermission::Write => Self::WRITE,
            RangePermission::ReadWrite => Self::READ_WRITE,
        }
    }
}

/// A permission window `[start, start + size)` over guest memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRange {
    pub start: VAddr,
    pub size: usize,
    pub permission: AccessPermission,
}

impl AccessRange {
    pub fn new(start: VAddr, size: usize, permission: AccessPermission) -> Self {
        Self { start, size, permission }
    }

    /// True when this window grants `required` for all of `[addr, addr + width)`.
    pub fn authorizes(&self, addr: VAddr, width: usize, required: AccessPermission) -> bool {
        let start = self.start as u64;
        let end = start + self.size as u64;
        let addr = addr as u64;
        self.permission.contains(required) && addr >= start && addr + width as u64 <= end
    }
}

impl From<&RangeSetting> for AccessRange {
    fn from(s: &RangeSetting) -> Self {
        Self::new(s.start, s.size, s.permission.into())
    }
}

impl std::fmt::Display for AccessRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[0x{:08X}..0x{:08X}) {}",
            self.start,
            self.start as u64 + self.size as u64,
            self.permission
        )
    }
}
