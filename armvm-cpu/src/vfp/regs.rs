// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! VFP register bank.
//!
//! 32 single-precision slots; double register `i` is slot `2i` (low word)
//! and slot `2i + 1` (high word). Both views share the same storage.

/// Number of single-precision slots.
pub const SINGLE_COUNT: usize = 32;
/// Number of double-precision registers.
pub const DOUBLE_COUNT: usize = SINGLE_COUNT / 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VfpRegisters {
    slots: [u32; SINGLE_COUNT],
}

impl VfpRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn single(&self, index: usize) -> u32 {
        self.slots[index % SINGLE_COUNT]
    }

    #[inline]
    pub fn set_single(&mut self, index: usize, bits: u32) {
        self.slots[index % SINGLE_COUNT] = bits;
    }

    #[inline]
    pub fn double(&self, index: usize) -> u64 {
        let i = (index % DOUBLE_COUNT) * 2;
        ((self.slots[i + 1] as u64) << 32) | self.slots[i] as u64
    }

    #[inline]
    pub fn set_double(&mut self, index: usize, bits: u64) {
        let i = (index % DOUBLE_COUNT) * 2;
        self.slots[i] = bits as u32;
        self.slots[i + 1] = (bits >> 32) as u32;
    }

    pub fn single_f32(&self, index: usize) -> f32 {
        f32::from_bits(self.single(index))
    }

    pub fn set_single_f32(&mut self, index: usize, value: f32) {
        self.set_single(index, value.to_bits());
    }

    pub fn double_f64(&self, index: usize) -> f64 {
        f64::from_bits(self.double(index))
    }

    pub fn set_double_f64(&mut self, index: usize, value: f64) {
        self.set_double(index, value.to_bits());
    }

    /// Read register `index` of the selected precision as f64.
    pub fn read_fp(&self, index: usize, double: bool) -> f64 {
        if double {
            self.double_f64(index)
        } else {
            self.single_f32(index) as f64
        }
    }

    /// Write `value` to register `index` of the selected precision,
    /// rounding to single when needed.
    pub fn write_fp(&mut self, index: usize, double: bool, value: f64) {
        if double {
            self.set_double_f64(index, value);
        } else {
            self.set_single_f32(index, value as f32);
        }
    }
}
