// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Store watch for the write-triggered suspend address.

use armvm_common::{span_covers, VAddr};

use crate::memory::{MemoryAccess, MemoryFault};

/// Pass-through memory view that notes completed stores touching `watch`.
pub(crate) struct WatchedMemory<'a> {
    inner: &'a mut dyn MemoryAccess,
    watch: Option<VAddr>,
    hit: bool,
}

impl<'a> WatchedMemory<'a> {
    pub(crate) fn new(inner: &'a mut dyn MemoryAccess, watch: Option<VAddr>) -> Self {
        Self { inner, watch, hit: false }
    }

    /// True once a store covering the watched address has completed.
    pub(crate) fn hit(&self) -> bool {
        self.hit
    }

    #[inline]
    fn note(&mut self, addr: VAddr, width: usize) {
        if let Some(target) = self.watch {
            self.hit |= span_covers(addr, width, target);
        }
    }
}

impl MemoryAccess for WatchedMemory<'_> {
    fn read_u8(&self, addr: VAddr) -> Result<u8, MemoryFault> {
        self.inner.read_u8(addr)
    }
    fn read_u16(&self, addr: VAddr) -> Result<u16, MemoryFault> {
        self.inner.read_u16(addr)
    }
    fn read_u32(&self, addr: VAddr) -> Result<u32, MemoryFault> {
        self.inner.read_u32(addr)
    }
    fn read_u64(&self, addr: VAddr) -> Result<u64, MemoryFault> {
        self.inner.read_u64(addr)
    }
    fn write_u8(&mut self, addr: VAddr, val: u8) -> Result<(), MemoryFault> {
        self.inner.write_u8(addr, val)?;
        self.note(addr, 1);
        Ok(())
    }
    fn write_u16(&mut self, addr: VAddr, val: u16) -> Result<(), MemoryFault> {
        self.inner.write_u16(addr, val)?;
        self.note(addr, 2);
        Ok(())
    }
    fn write_u32(&mut self, addr: VAddr, val: u32) -> Result<(), MemoryFault> {
        self.inner.write_u32(addr, val)?;
        self.note(addr, 4);
        Ok(())
    }
    fn write_u64(&mut self, addr: VAddr, val: u64) -> Result<(), MemoryFault> {
        self.inner.write_u64(addr, val)?;
        self.note(addr, 8);
        Ok(())
    }
    fn check_write(&self, addr: VAddr, width: usize) -> Result<(), MemoryFault> {
        self.inner.check_write(addr, width)
    }
}
