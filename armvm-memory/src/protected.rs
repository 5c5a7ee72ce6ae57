// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Permission-checked guest memory.
//!
//! An access of `width` bytes at `addr` is allowed when at least one
//! registered [`AccessRange`] grants the required permission over the whole
//! span. Ranges may overlap; they are never merged or deduplicated.
//! A rejected access fails with [`MemoryFault::Segfault`] before touching
//! the image.

use log::{debug, trace};

use armvm_common::{span_in_bounds, VAddr};
use armvm_cpu::{AccessKind, MemoryAccess, MemoryFault};

use crate::backend::MemoryBackend;
use crate::permission::{AccessPermission, AccessRange};
use crate::raw::RawMemory;

#[derive(Debug, Clone, Default)]
pub struct ProtectedMemory {
    raw: RawMemory,
    ranges: Vec<AccessRange>,
    /// The whole allocated image is readable and writable, at whatever size
    /// it is allocated.
    cover_image: bool,
}

impl ProtectedMemory {
    /// Empty image with no authorized ranges.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-filled image of `size` bytes with no authorized ranges.
    pub fn with_size(size: usize) -> Self {
        Self {
            raw: RawMemory::with_size(size),
            ..Self::default()
        }
    }

    /// Image whose every allocated byte is authorized for reads and writes.
    /// Registered ranges are checked in addition.
    pub fn covering_image() -> Self {
        Self {
            cover_image: true,
            ..Self::default()
        }
    }

    /// Append a permission window.
    pub fn add_access_range(&mut self, range: AccessRange) {
        debug!("access range {range}");
        self.ranges.push(range);
    }

    pub fn ranges(&self) -> &[AccessRange] {
        &self.ranges
    }

    pub fn is_authorized(&self, addr: VAddr, width: usize, required: AccessPermission) -> bool {
        (self.cover_image && span_in_bounds(addr, width, self.raw.size()))
            || self.ranges.iter().any(|r| r.authorizes(addr, width, required))
    }

    #[inline]
    fn check(&self, addr: VAddr, width: usize, access: AccessKind) -> Result<(), MemoryFault> {
        if self.is_authorized(addr, width, AccessPermission::required_for(access)) {
            Ok(())
        } else {
            trace!("denied {access} of {width} bytes at 0x{addr:08X}");
            Err(MemoryFault::Segfault { addr, width, access })
        }
    }
}

impl MemoryAccess for ProtectedMemory {
    fn read_u8(&self, addr: VAddr) -> Result<u8, MemoryFault> {
        self.check(addr, 1, AccessKind::Read)?;
        self.raw.read_u8(addr)
    }
    fn read_u16(&self, addr: VAddr) -> Result<u16, MemoryFault> {
        self.check(addr, 2, AccessKind::Read)?;
        self.raw.read_u16(addr)
    }
    fn read_u32(&self, addr: VAddr) -> Result<u32, MemoryFault> {
        self.check(addr, 4, AccessKind::Read)?;
        self.raw.read_u32(addr)
    }
    fn read_u64(&self, addr: VAddr) -> Result<u64, MemoryFault> {
        self.check(addr, 8, AccessKind::Read)?;
        self.raw.read_u64(addr)
    }
    fn write_u8(&mut self, addr: VAddr, val: u8) -> Result<(), MemoryFault> {
        self.check(addr, 1, AccessKind::Write)?;
        self.raw.write_u8(addr, val)
    }
    fn write_u16(&mut self, addr: VAddr, val: u16) -> Result<(), MemoryFault> {
        self.check(addr, 2, AccessKind::Write)?;
        self.raw.write_u16(addr, val)
    }
    fn write_u32(&mut self, addr: VAddr, val: u32) -> Result<(), MemoryFault> {
        self.check(addr, 4, AccessKind::Write)?;
        self.raw.write_u32(addr, val)
    }
    fn write_u64(&mut self, addr: VAddr, val: u64) -> Result<(), MemoryFault> {
        self.check(addr, 8, AccessKind::Write)?;
        self.raw.write_u64(addr, val)
    }
    fn check_write(&self, addr: VAddr, width: usize) -> Result<(), MemoryFault> {
        self.check(addr, width, AccessKind::Write)?;
        self.raw.check_write(addr, width)
    }
}

impl MemoryBackend for ProtectedMemory {
    fn allocate(&mut self, size: usize) -> &mut [u8] {
        self.raw.allocate(size)
    }

    fn size(&self) -> usize {
        self.raw.size()
    }

    fn bytes(&self) -> &[u8] {
        self.raw.bytes()
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self.raw.bytes_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn memory() -> ProtectedMemory {
        let mut m = ProtectedMemory::with_size(0x1000);
        m.add_access_range(AccessRange::new(0x000, 0x100, AccessPermission::READ));
        m.add_access_range(AccessRange::new(0x100, 0x100, AccessPermission::READ_WRITE));
        m.add_access_range(AccessRange::new(0x200, 0x10, AccessPermission::WRITE));
        m
    }

    #[test]
    fn test_unregistered_access_segfaults() {
        let m = memory();
        assert_eq!(
            m.read_u32(0x800),
            Err(MemoryFault::Segfault { addr: 0x800, width: 4, access: AccessKind::Read })
        );
    }

    #[test]
    fn test_write_to_read_only_has_no_effect() {
        let mut m = memory();
        m.bytes_mut()[0x10] = 0xAA;
        let err = m.write_u32(0x10, 0xDEAD_BEEF).unwrap_err();
        assert!(matches!(err, MemoryFault::Segfault { access: AccessKind::Write, .. }));
        assert_eq!(m.read_u8(0x10).unwrap(), 0xAA);
        assert_eq!(&m.bytes()[0x11..0x14], &[0, 0, 0]);
    }

    #[test]
    fn test_span_must_fit_one_range() {
        let mut m = memory();
        // Straddles the RW window and the write-only window: both allow writes
        // but neither covers the whole span.
        assert!(m.write_u32(0x1FE, 1).is_err());
        assert!(m.write_u32(0x1FC, 1).is_ok());
        // Straddles read-only and read-write: no single range authorizes it.
        assert!(m.read_u32(0xFE).is_err());
    }

    #[test]
    fn test_overlapping_ranges_are_a_disjunction() {
        let mut m = ProtectedMemory::with_size(0x100);
        m.add_access_range(AccessRange::new(0x10, 0x10, AccessPermission::READ));
        m.add_access_range(AccessRange::new(0x00, 0x40, AccessPermission::READ_WRITE));
        assert!(m.write_u64(0x18, 5).is_ok());
        assert_eq!(m.read_u64(0x18).unwrap(), 5);
        assert_eq!(m.ranges().len(), 2);
    }

    #[test]
    fn test_write_only_window_rejects_reads() {
        let mut m = memory();
        m.write_u8(0x205, 7).unwrap();
        assert!(m.read_u8(0x205).is_err());
        assert_eq!(m.bytes()[0x205], 7);
    }

    #[test]
    fn test_covering_image_follows_allocation() {
        let mut m = ProtectedMemory::covering_image();
        m.allocate(0x100);
        assert!(m.write_u32(0xFC, 1).is_ok());
        assert!(matches!(m.write_u32(0x100, 1), Err(MemoryFault::Segfault { .. })));
        m.allocate(0x10000);
        assert!(m.write_u32(0x8000, 2).is_ok());
        assert_eq!(m.read_u32(0x8000).unwrap(), 2);
        assert!(m.check_write(0xFFFC, 4).is_ok());
        assert!(m.check_write(0xFFFE, 4).is_err());
    }

    #[test]
    fn test_authorized_but_past_image_is_out_of_bounds() {
        let mut m = ProtectedMemory::with_size(0x10);
        m.add_access_range(AccessRange::new(0, 0x100, AccessPermission::READ_WRITE));
        assert_eq!(m.read_u32(0x20), Err(MemoryFault::OutOfBounds { addr: 0x20, width: 4 }));
    }

    proptest! {
        #[test]
        fn test_round_trip_in_authorized_window(offset in 0u32..0xF8, value in any::<u64>()) {
            let mut m = memory();
            let addr = 0x100 + offset;
            m.write_u8(addr, value as u8).unwrap();
            prop_assert_eq!(m.read_u8(addr).unwrap(), value as u8);
            m.write_u16(addr, value as u16).unwrap();
            prop_assert_eq!(m.read_u16(addr).unwrap(), value as u16);
            m.write_u32(addr, value as u32).unwrap();
            prop_assert_eq!(m.read_u32(addr).unwrap(), value as u32);
            m.write_u64(addr, value).unwrap();
            prop_assert_eq!(m.read_u64(addr).unwrap(), value);
        }

        #[test]
        fn test_rejected_writes_never_mutate(addr in 0u32..0x1000, width in prop::sample::select(vec![1usize, 2, 4, 8])) {
            let mut m = memory();
            let before = m.bytes().to_vec();
            let result = match width {
                1 => m.write_u8(addr, 0xFF),
                2 => m.write_u16(addr, 0xFFFF),
                4 => m.write_u32(addr, 0xFFFF_FFFF),
                _ => m.write_u64(addr, u64::MAX),
            };
            let allowed = m.is_authorized(addr, width, AccessPermission::WRITE);
            prop_assert_eq!(result.is_ok(), allowed);
            if !allowed {
                prop_assert_eq!(m.bytes(), &before[..]);
            }
        }
    }
}
