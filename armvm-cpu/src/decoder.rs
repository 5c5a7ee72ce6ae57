// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! ARMv4 (A32) instruction model.
//!
//! A 32-bit instruction word is classified into one of fifteen formats by
//! [`crate::pattern_decoder`] and turned into a structured [`Instruction`].
//! The condition field (bits 31:28) is not part of [`Instruction`]; the
//! interpreter evaluates it before decoding.

pub use crate::pattern_decoder::{classify, decode, decode_classified, Format};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Condition code in bits 31:28.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Eq = 0,
    Ne = 1,
    Cs = 2,
    Cc = 3,
    Mi = 4,
    Pl = 5,
    Vs = 6,
    Vc = 7,
    Hi = 8,
    Ls = 9,
    Ge = 10,
    Lt = 11,
    Gt = 12,
    Le = 13,
    Al = 14,
    Nv = 15,
}

impl Condition {
    pub fn from_u32(val: u32) -> Self {
        match val & 0xF {
            0 => Self::Eq,
            1 => Self::Ne,
            2 => Self::Cs,
            3 => Self::Cc,
            4 => Self::Mi,
            5 => Self::Pl,
            6 => Self::Vs,
            7 => Self::Vc,
            8 => Self::Hi,
            9 => Self::Ls,
            10 => Self::Ge,
            11 => Self::Lt,
            12 => Self::Gt,
            13 => Self::Le,
            14 => Self::Al,
            _ => Self::Nv,
        }
    }

    /// Condition of an instruction word.
    #[inline]
    pub fn of(raw: u32) -> Self {
        Self::from_u32(raw >> 28)
    }
}

/// Barrel shifter operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftType {
    LSL = 0,
    LSR = 1,
    ASR = 2,
    ROR = 3,
}

impl ShiftType {
    pub fn from_u32(val: u32) -> Self {
        match val & 3 {
            0 => Self::LSL,
            1 => Self::LSR,
            2 => Self::ASR,
            _ => Self::ROR,
        }
    }
}

/// Where a register shift takes its amount from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftAmount {
    /// 5-bit amount encoded in bits 11:7.
    Immediate(u8),
    /// Bottom byte of the register in bits 11:8.
    Register(u8),
}

/// Second operand of a data-processing instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand2 {
    /// 8-bit immediate rotated right by `2 * rotate`.
    Immediate { imm8: u8, rotate: u8 },
    /// Register `rm` passed through the barrel shifter.
    Register {
        rm: u8,
        shift: ShiftType,
        amount: ShiftAmount,
    },
}

/// Data-processing opcode (bits 24:21).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DpOpcode {
    And = 0,
    Eor = 1,
    Sub = 2,
    Rsb = 3,
    Add = 4,
    Adc = 5,
    Sbc = 6,
    Rsc = 7,
    Tst = 8,
    Teq = 9,
    Cmp = 10,
    Cmn = 11,
    Orr = 12,
    Mov = 13,
    Bic = 14,
    Mvn = 15,
}

impl DpOpcode {
    pub fn from_u32(val: u32) -> Self {
        match val & 0xF {
            0 => Self::And,
            1 => Self::Eor,
            2 => Self::Sub,
            3 => Self::Rsb,
            4 => Self::Add,
            5 => Self::Adc,
            6 => Self::Sbc,
            7 => Self::Rsc,
            8 => Self::Tst,
            9 => Self::Teq,
            10 => Self::Cmp,
            11 => Self::Cmn,
            12 => Self::Orr,
            13 => Self::Mov,
            14 => Self::Bic,
            _ => Self::Mvn,
        }
    }

    /// TST/TEQ/CMP/CMN: flags only, no destination write.
    pub fn is_test(self) -> bool {
        matches!(self, Self::Tst | Self::Teq | Self::Cmp | Self::Cmn)
    }
}

/// Pre/post indexing, direction and write-back bits of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressMode {
    /// P: apply the offset before the access.
    pub pre: bool,
    /// U: add (true) or subtract the offset.
    pub up: bool,
    /// W: write the address back (pre-indexed forms only).
    pub writeback: bool,
}

impl AddressMode {
    /// Post-indexed addressing always writes back.
    #[inline]
    pub fn writes_back(&self) -> bool {
        self.writeback || !self.pre
    }
}

/// Halfword/signed transfer kind (S and H bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfwordKind {
    /// SH = 01
    UnsignedHalf,
    /// SH = 10
    SignedByte,
    /// SH = 11
    SignedHalf,
}

/// Offset of a halfword transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfwordOffset {
    Immediate(u8),
    Register(u8),
}

/// Offset of a single data transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOffset {
    /// 12-bit immediate.
    Immediate(u16),
    /// Register shifted by an immediate amount.
    Register { rm: u8, shift: ShiftType, amount: u8 },
}

/// Source operand of MSR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsrSource {
    Register(u8),
    Immediate { imm8: u8, rotate: u8 },
}

// ---------------------------------------------------------------------------
// Instruction enum
// ---------------------------------------------------------------------------

/// Decoded ARMv4 instruction (condition stripped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    DataProcessing {
        opcode: DpOpcode,
        set_flags: bool,
        rn: u8,
        rd: u8,
        operand2: Operand2,
    },
    /// MRS Rd, CPSR|SPSR
    Mrs { rd: u8, spsr: bool },
    /// MSR CPSR|SPSR{_fields}, Rm|#imm
    Msr {
        spsr: bool,
        fields: u8,
        source: MsrSource,
    },
    /// Encoding in the PSR-transfer space that is neither MRS nor MSR.
    PsrOther { raw: u32 },
    Multiply {
        accumulate: bool,
        set_flags: bool,
        rd: u8,
        rn: u8,
        rs: u8,
        rm: u8,
    },
    MultiplyLong {
        signed: bool,
        accumulate: bool,
        set_flags: bool,
        rd_hi: u8,
        rd_lo: u8,
        rs: u8,
        rm: u8,
    },
    Swap { byte: bool, rn: u8, rd: u8, rm: u8 },
    BranchExchange { rm: u8 },
    HalfwordTransfer {
        mode: AddressMode,
        load: bool,
        kind: HalfwordKind,
        rn: u8,
        rd: u8,
        offset: HalfwordOffset,
    },
    SingleTransfer {
        mode: AddressMode,
        load: bool,
        byte: bool,
        rn: u8,
        rd: u8,
        offset: TransferOffset,
    },
    BlockTransfer {
        pre: bool,
        up: bool,
        psr: bool,
        writeback: bool,
        load: bool,
        rn: u8,
        list: u16,
    },
    /// B/BL; `offset` is the sign-extended byte offset.
    Branch { link: bool, offset: i32 },
    CoprocDataTransfer { raw: u32 },
    CoprocDataOp { raw: u32 },
    CoprocRegTransfer { raw: u32 },
    SoftwareInterrupt { comment: u32 },
    Undefined { raw: u32 },
}

// ---------------------------------------------------------------------------
// Bit helpers
// ---------------------------------------------------------------------------

/// Sign-extend the low `bits` bits of `value` to i32.
#[inline]
pub fn sign_extend(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

/// Extract a bit field from an instruction word.
#[inline]
pub fn bits(raw: u32, hi: u32, lo: u32) -> u32 {
    (raw >> lo) & (((1u64 << (hi - lo + 1)) - 1) as u32)
}

/// Extract a single bit.
#[inline]
pub fn bit(raw: u32, pos: u32) -> u32 {
    (raw >> pos) & 1
}

/// Extract a single bit as a flag.
#[inline]
pub fn flag(raw: u32, pos: u32) -> bool {
    bit(raw, pos) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_helpers() {
        assert_eq!(bits(0xE3A0_1005, 31, 28), 0xE);
        assert_eq!(bits(0xFFFF_FFFF, 31, 0), 0xFFFF_FFFF);
        assert_eq!(bit(0x0010_0000, 20), 1);
        assert!(flag(0x0000_0010, 4));
        assert_eq!(sign_extend(0x00FF_FFFE, 24), -2);
        assert_eq!(sign_extend(0x0000_0010, 24), 16);
    }

    #[test]
    fn test_condition_of() {
        assert_eq!(Condition::of(0x0A00_0000), Condition::Eq);
        assert_eq!(Condition::of(0xE1A0_0000), Condition::Al);
        assert_eq!(Condition::of(0xF000_0000), Condition::Nv);
    }

    #[test]
    fn test_opcode_groups() {
        assert!(DpOpcode::Cmp.is_test());
        assert!(!DpOpcode::Sub.is_test());
    }

    #[test]
    fn test_post_index_forces_writeback() {
        let post = AddressMode { pre: false, up: true, writeback: false };
        let pre = AddressMode { pre: true, up: true, writeback: false };
        assert!(post.writes_back());
        assert!(!pre.writes_back());
    }
}
