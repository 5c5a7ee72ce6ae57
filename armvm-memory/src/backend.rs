// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use log::debug;

use armvm_common::settings::{MemoryModel, Settings};
use armvm_common::VAddr;
use armvm_cpu::{MemoryAccess, MemoryFault};

use crate::permission::AccessRange;
use crate::protected::ProtectedMemory;
use crate::raw::RawMemory;

/// Owner of the guest image: typed access plus host-side byte access.
pub trait MemoryBackend: MemoryAccess {
    /// Replace the image with `size` zero bytes and return it for loading.
    fn allocate(&mut self, size: usize) -> &mut [u8];

    fn size(&self) -> usize;

    /// Host view of the image; bypasses permission checks.
    fn bytes(&self) -> &[u8];

    fn bytes_mut(&mut self) -> &mut [u8];
}

/// Memory model chosen at runtime.
#[derive(Debug, Clone)]
pub enum GuestMemory {
    Raw(RawMemory),
    Protected(ProtectedMemory),
}

impl Default for GuestMemory {
    fn default() -> Self {
        Self::Raw(RawMemory::new())
    }
}

impl GuestMemory {
    /// Build the configured backend (unallocated) with its access ranges.
    pub fn from_settings(settings: &Settings) -> Self {
        match settings.memory_model {
            MemoryModel::Raw => Self::Raw(RawMemory::new()),
            // Without explicit ranges the whole image is authorized, sized by
            // the later `allocate` call rather than by `memory_size`.
            MemoryModel::Protected if settings.access_ranges.is_empty() => {
                Self::Protected(ProtectedMemory::covering_image())
            }
            MemoryModel::Protected => {
                let mut mem = ProtectedMemory::new();
                for range in &settings.access_ranges {
                    mem.add_access_range(AccessRange::from(range));
                }
                Self::Protected(mem)
            }
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Self::Protected(_))
    }

    /// Register a permission window. The raw model has nothing to check, so
    /// the range is dropped and `false` returned.
    pub fn add_access_range(&mut self, range: AccessRange) -> bool {
        match self {
            Self::Raw(_) => {
                debug!("raw memory ignores access range {range}");
                false
            }
            Self::Protected(mem) => {
                mem.add_access_range(range);
                true
            }
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $mem:ident => $body:expr) => {
        match $self {
            GuestMemory::Raw($mem) => $body,
            GuestMemory::Protected($mem) => $body,
        }
    };
}

impl MemoryAccess for GuestMemory {
    fn read_u8(&self, addr: VAddr) -> Result<u8, MemoryFault> {
        dispatch!(self, m => m.read_u8(addr))
    }
    fn read_u16(&self, addr: VAddr) -> Result<u16, MemoryFault> {
        dispatch!(self, m => m.read_u16(addr))
    }
    fn read_u32(&self, addr: VAddr) -> Result<u32, MemoryFault> {
        dispatch!(self, m => m.read_u32(addr))
    }
    fn read_u64(&self, addr: VAddr) -> Result<u64, MemoryFault> {
        dispatch!(self, m => m.read_u64(addr))
    }
    fn write_u8(&mut self, addr: VAddr, val: u8) -> Result<(), MemoryFault> {
        dispatch!(self, m => m.write_u8(addr, val))
    }
    fn write_u16(&mut self, addr: VAddr, val: u16) -> Result<(), MemoryFault> {
        dispatch!(self, m => m.write_u16(addr, val))
    }
    fn write_u32(&mut self, addr: VAddr, val: u32) -> Result<(), MemoryFault> {
        dispatch!(self, m => m.write_u32(addr, val))
    }
    fn write_u64(&mut self, addr: VAddr, val: u64) -> Result<(), MemoryFault> {
        dispatch!(self, m => m.write_u64(addr, val))
    }
    fn check_write(&self, addr: VAddr, width: usize) -> Result<(), MemoryFault> {
        dispatch!(self, m => m.check_write(addr, width))
    }
}

impl MemoryBackend for GuestMemory {
    fn allocate(&mut self, size: usize) -> &mut [u8] {
        dispatch!(self, m => m.allocate(size))
    }
    fn size(&self) -> usize {
        dispatch!(self, m => m.size())
    }
    fn bytes(&self) -> &[u8] {
        dispatch!(self, m => m.bytes())
    }
    fn bytes_mut(&mut self) -> &mut [u8] {
        dispatch!(self, m => m.bytes_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use armvm_common::settings::{RangePermission, RangeSetting};
    use crate::permission::AccessPermission;

    #[test]
    fn test_raw_from_settings() {
        let mut mem = GuestMemory::from_settings(&Settings::default());
        assert!(!mem.is_protected());
        mem.allocate(0x100);
        mem.write_u32(0xFC, 1).unwrap();
        assert!(!mem.add_access_range(AccessRange::new(0, 4, AccessPermission::READ)));
        assert!(mem.write_u32(0, 1).is_ok());
    }

    #[test]
    fn test_protected_default_range_tracks_allocated_size() {
        let settings = Settings {
            memory_size: 0x100,
            memory_model: MemoryModel::Protected,
            ..Settings::default()
        };
        let mut mem = GuestMemory::from_settings(&settings);
        mem.allocate(0x10000);
        assert!(mem.write_u32(0x8000, 7).is_ok());
        assert_eq!(mem.read_u32(0x8000).unwrap(), 7);
        assert!(matches!(mem.read_u32(0x10000), Err(MemoryFault::Segfault { .. })));
    }

    #[test]
    fn test_protected_from_settings_uses_ranges() {
        let settings = Settings {
            memory_model: MemoryModel::Protected,
            access_ranges: vec![
                RangeSetting { start: 0, size: 0x80, permission: RangePermission::Read },
                RangeSetting { start: 0x80, size: 0x80, permission: RangePermission::ReadWrite },
            ],
            ..Settings::default()
        };
        let mut mem = GuestMemory::from_settings(&settings);
        assert!(mem.is_protected());
        mem.allocate(0x100);
        assert!(mem.write_u32(0x10, 1).is_err());
        assert!(mem.write_u32(0x90, 1).is_ok());
        assert!(matches!(mem.read_u32(0x100), Err(MemoryFault::Segfault { .. })));

        mem.bytes_mut()[0x10] = 9;
        assert_eq!(mem.read_u8(0x10).unwrap(), 9);
        assert_eq!(mem.size(), 0x100);
    }
}
