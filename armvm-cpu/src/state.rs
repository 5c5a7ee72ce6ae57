// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use armvm_common::{swi, REGISTER_COUNT, REG_LR, REG_PC};

use crate::decoder::Condition;

/// CPSR negative flag.
pub const FLAG_N: u32 = 1 << 31;
/// CPSR zero flag.
pub const FLAG_Z: u32 = 1 << 30;
/// CPSR carry flag.
pub const FLAG_C: u32 = 1 << 29;
/// CPSR overflow flag.
pub const FLAG_V: u32 = 1 << 28;
/// All four condition flags.
pub const FLAGS_MASK: u32 = FLAG_N | FLAG_Z | FLAG_C | FLAG_V;

/// ARMv4 CPU state: general-purpose registers and program status registers.
///
/// `r[15]` always holds the address of the next instruction to fetch, so
/// while an instruction executes it reads as the fetch address + 4.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuState {
    /// General-purpose registers r0-r15 (r13 = SP, r14 = LR, r15 = PC).
    pub r: [u32; REGISTER_COUNT],
    /// Current program status register. Only N/Z/C/V are modelled.
    pub cpsr: u32,
    /// Saved program status register.
    pub spsr: u32,
}

impl CpuState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every register and both status registers.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn get_reg(&self, index: u8) -> u32 {
        self.r[index as usize & 0xF]
    }

    #[inline]
    pub fn set_reg(&mut self, index: u8, value: u32) {
        self.r[index as usize & 0xF] = value;
    }

    /// Read a register as an instruction operand.
    ///
    /// r15 reads 4 bytes ahead of the fetch pointer (fetch address + 8), or
    /// 8 bytes ahead when the instruction shifts by a register amount.
    #[inline]
    pub fn read_operand(&self, index: u8, register_shift: bool) -> u32 {
        if index as usize == REG_PC {
            let ahead = if register_shift { 8 } else { 4 };
            self.pc().wrapping_add(ahead)
        } else {
            self.get_reg(index)
        }
    }

    #[inline]
    pub fn pc(&self) -> u32 {
        self.r[REG_PC]
    }

    #[inline]
    pub fn set_pc(&mut self, value: u32) {
        self.r[REG_PC] = value;
    }

    #[inline]
    pub fn lr(&self) -> u32 {
        self.r[REG_LR]
    }

    #[inline]
    pub fn set_lr(&mut self, value: u32) {
        self.r[REG_LR] = value;
    }

    // -- Flags ----------------------------------------------------------------

    #[inline]
    pub fn n(&self) -> bool {
        self.cpsr & FLAG_N != 0
    }

    #[inline]
    pub fn z(&self) -> bool {
        self.cpsr & FLAG_Z != 0
    }

    #[inline]
    pub fn c(&self) -> bool {
        self.cpsr & FLAG_C != 0
    }

    #[inline]
    pub fn v(&self) -> bool {
        self.cpsr & FLAG_V != 0
    }

    #[inline]
    fn set_flag(&mut self, flag: u32, value: bool) {
        if value {
            self.cpsr |= flag;
        } else {
            self.cpsr &= !flag;
        }
    }

    pub fn set_n(&mut self, value: bool) {
        self.set_flag(FLAG_N, value);
    }

    pub fn set_z(&mut self, value: bool) {
        self.set_flag(FLAG_Z, value);
    }

    pub fn set_c(&mut self, value: bool) {
        self.set_flag(FLAG_C, value);
    }

    pub fn set_v(&mut self, value: bool) {
        self.set_flag(FLAG_V, value);
    }

    /// Set N and Z from a 32-bit result.
    #[inline]
    pub fn set_nz(&mut self, result: u32) {
        self.set_n(result & 0x8000_0000 != 0);
        self.set_z(result == 0);
    }

    /// The N/Z/C/V nibble in bits 31:28.
    #[inline]
    pub fn flags(&self) -> u32 {
        self.cpsr & FLAGS_MASK
    }

    /// Replace N/Z/C/V with bits 31:28 of `bits`, leaving the rest of CPSR.
    #[inline]
    pub fn set_flags(&mut self, bits: u32) {
        self.cpsr = (self.cpsr & !FLAGS_MASK) | (bits & FLAGS_MASK);
    }

    /// Evaluate a condition code against the current flags.
    pub fn check_condition(&self, cond: Condition) -> bool {
        let (n, z, c, v) = (self.n(), self.z(), self.c(), self.v());
        match cond {
            Condition::Eq => z,
            Condition::Ne => !z,
            Condition::Cs => c,
            Condition::Cc => !c,
            Condition::Mi => n,
            Condition::Pl => !n,
            Condition::Vs => v,
            Condition::Vc => !v,
            Condition::Hi => c && !z,
            Condition::Ls => !c || z,
            Condition::Ge => n == v,
            Condition::Lt => n != v,
            Condition::Gt => !z && n == v,
            Condition::Le => z || n != v,
            Condition::Al => true,
            Condition::Nv => false,
        }
    }
}

/// Reason a `run` call returned control to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Iteration budget exhausted, or the guest asked to yield. Call `run` again.
    Resume,
    /// The guest program finished.
    Stop,
    /// The guest has something for the host (e.g. a UART byte).
    Suspend,
    /// The guest reported an unrecoverable condition.
    Fatal,
    /// The guest raised an unknown interrupt, or executed an undefined instruction.
    Undefined,
}

impl Interrupt {
    /// Map an SWI comment field to the interrupt the host observes.
    pub fn from_swi(comment: u32) -> Self {
        match comment {
            swi::RESUME => Self::Resume,
            swi::STOP => Self::Stop,
            swi::SUSPEND => Self::Suspend,
            swi::FATAL => Self::Fatal,
            _ => Self::Undefined,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_operand_pc_offsets() {
        let mut s = CpuState::new();
        s.set_pc(0x104);
        s.set_reg(3, 77);
        assert_eq!(s.read_operand(15, false), 0x108);
        assert_eq!(s.read_operand(15, true), 0x10C);
        assert_eq!(s.read_operand(3, true), 77);
    }

    #[test]
    fn test_set_flags_preserves_low_bits() {
        let mut s = CpuState::new();
        s.cpsr = 0x0000_00D3;
        s.set_flags(0xA123_4567);
        assert_eq!(s.cpsr, 0xA000_00D3);
        assert!(s.n());
        assert!(!s.z());
        assert!(s.c());
        assert!(!s.v());
    }

    #[test]
    fn test_conditions() {
        let mut s = CpuState::new();
        s.set_flags(FLAG_Z | FLAG_C);
        assert!(s.check_condition(Condition::Eq));
        assert!(!s.check_condition(Condition::Ne));
        assert!(s.check_condition(Condition::Cs));
        assert!(!s.check_condition(Condition::Hi));
        assert!(s.check_condition(Condition::Ls));
        assert!(s.check_condition(Condition::Ge));
        assert!(!s.check_condition(Condition::Gt));
        assert!(s.check_condition(Condition::Le));
        assert!(s.check_condition(Condition::Al));
        assert!(!s.check_condition(Condition::Nv));

        s.set_flags(FLAG_N);
        assert!(s.check_condition(Condition::Mi));
        assert!(s.check_condition(Condition::Lt));
        assert!(!s.check_condition(Condition::Ge));

        assert!(!s.check_condition(Condition::Pl));
        assert!(s.check_condition(Condition::Cc));

        s.set_flags(FLAG_N | FLAG_V);
        assert!(s.check_condition(Condition::Ge));
        assert!(s.check_condition(Condition::Gt));
        assert!(s.check_condition(Condition::Vs));
        assert!(!s.check_condition(Condition::Vc));
    }

    #[test]
    fn test_interrupt_from_swi() {
        assert_eq!(Interrupt::from_swi(0), Interrupt::Resume);
        assert_eq!(Interrupt::from_swi(1), Interrupt::Stop);
        assert_eq!(Interrupt::from_swi(2), Interrupt::Suspend);
        assert_eq!(Interrupt::from_swi(3), Interrupt::Fatal);
        assert_eq!(Interrupt::from_swi(0x123456), Interrupt::Undefined);
    }
}
