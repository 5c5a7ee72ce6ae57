// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Unchecked guest memory: a flat, zero-filled byte image.

use log::debug;

use armvm_common::{span_in_bounds, VAddr};
use armvm_cpu::{MemoryAccess, MemoryFault};

use crate::backend::MemoryBackend;

#[derive(Debug, Clone, Default)]
pub struct RawMemory {
    data: Vec<u8>,
}

impl RawMemory {
    /// Empty image; call [`MemoryBackend::allocate`] before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-filled image of `size` bytes.
    pub fn with_size(size: usize) -> Self {
        Self { data: vec![0u8; size] }
    }

    /// Offset of `[addr, addr + width)` in the image.
    #[inline]
    fn resolve(&self, addr: VAddr, width: usize) -> Result<usize, MemoryFault> {
        if span_in_bounds(addr, width, self.data.len()) {
            Ok(addr as usize)
        } else {
            Err(MemoryFault::OutOfBounds { addr, width })
        }
    }

    #[inline]
    fn load<const N: usize>(&self, addr: VAddr) -> Result<[u8; N], MemoryFault> {
        let off = self.resolve(addr, N)?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(&self.data[off..off + N]);
        Ok(buf)
    }

    #[inline]
    fn store<const N: usize>(&mut self, addr: VAddr, bytes: [u8; N]) -> Result<(), MemoryFault> {
        let off = self.resolve(addr, N)?;
        self.data[off..off + N].copy_from_slice(&bytes);
        Ok(())
    }
}

impl MemoryAccess for RawMemory {
    fn read_u8(&self, addr: VAddr) -> Result<u8, MemoryFault> {
        Ok(self.load::<1>(addr)?[0])
    }
    fn read_u16(&self, addr: VAddr) -> Result<u16, MemoryFault> {
        self.load(addr).map(u16::from_le_bytes)
    }
    fn read_u32(&self, addr: VAddr) -> Result<u32, MemoryFault> {
        self.load(addr).map(u32::from_le_bytes)
    }
    fn read_u64(&self, addr: VAddr) -> Result<u64, MemoryFault> {
        self.load(addr).map(u64::from_le_bytes)
    }
    fn write_u8(&mut self, addr: VAddr, val: u8) -> Result<(), MemoryFault> {
        self.store(addr, [val])
    }
    fn write_u16(&mut self, addr: VAddr, val: u16) -> Result<(), MemoryFault> {
        self.store(addr, val.to_le_bytes())
    }
    fn write_u32(&mut self, addr: VAddr, val: u32) -> Result<(), MemoryFault> {
        self.store(addr, val.to_le_bytes())
    }
    fn write_u64(&mut self, addr: VAddr, val: u64) -> Result<(), MemoryFault> {
        self.store(addr, val.to_le_bytes())
    }
    fn check_write(&self, addr: VAddr, width: usize) -> Result<(), MemoryFault> {
        self.resolve(addr, width).map(|_| ())
    }
}

impl MemoryBackend for RawMemory {
    fn allocate(&mut self, size: usize) -> &mut [u8] {
        debug!("allocating {size:#X} bytes of guest memory");
        self.data = vec![0u8; size];
        &mut self.data
    }

    fn size(&self) -> usize {
        self.data.len()
    }

    fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}
