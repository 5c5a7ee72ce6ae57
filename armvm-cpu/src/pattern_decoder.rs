// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Pattern-based ARMv4 instruction classifier.
//!
//! Each of the fifteen instruction formats is described by a 32-character
//! pattern string where `0`/`1` are fixed bits and any other character is a
//! wildcard. Formats are tried in table order: several patterns are subsets
//! of more general ones (BX and SWP sit inside the multiply/data-processing
//! space), so the order resolves the overlap.

use crate::decoder::{
    bit, bits, flag, sign_extend, AddressMode, DpOpcode, HalfwordKind, HalfwordOffset,
    Instruction, MsrSource, Operand2, ShiftAmount, ShiftType, TransferOffset,
};

// ---------------------------------------------------------------------------
// Pattern infrastructure
// ---------------------------------------------------------------------------

/// Parse a 32-character pattern string into (mask, expected) at compile time.
/// '0' → mask bit set, expected bit clear.
/// '1' → mask bit set, expected bit set.
/// Any other char → mask bit clear (wildcard).
const fn parse_pattern(pat: &[u8; 32]) -> (u32, u32) {
    let mut mask: u32 = 0;
    let mut expected: u32 = 0;
    let mut i: usize = 0;
    while i < 32 {
        let bit_pos = 31 - i;
        match pat[i] {
            b'0' => {
                mask |= 1 << bit_pos;
            }
            b'1' => {
                mask |= 1 << bit_pos;
                expected |= 1 << bit_pos;
            }
            _ => {}
        }
        i += 1;
    }
    (mask, expected)
}

/// The fifteen ARMv4 instruction formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    BranchExchange,
    SingleDataSwap,
    Multiply,
    MultiplyLong,
    HalfwordRegister,
    HalfwordImmediate,
    DataProcessing,
    Undefined,
    SingleDataTransfer,
    BlockDataTransfer,
    Branch,
    CoprocDataTransfer,
    CoprocDataOperation,
    CoprocRegisterTransfer,
    SoftwareInterrupt,
}

struct Matcher {
    mask: u32,
    expected: u32,
    format: Format,
    handler: fn(u32) -> Instruction,
}

macro_rules! inst {
    ($pat:expr, $format:expr, $handler:expr) => {{
        const P: (u32, u32) = parse_pattern($pat);
        Matcher {
            mask: P.0,
            expected: P.1,
            format: $format,
            handler: $handler,
        }
    }};
}

// ---------------------------------------------------------------------------
// Handler functions
// ---------------------------------------------------------------------------

fn h_branch_exchange(raw: u32) -> Instruction {
    Instruction::BranchExchange { rm: bits(raw, 3, 0) as u8 }
}

fn h_swap(raw: u32) -> Instruction {
    Instruction::Swap {
        byte: flag(raw, 22),
        rn: bits(raw, 19, 16) as u8,
        rd: bits(raw, 15, 12) as u8,
        rm: bits(raw, 3, 0) as u8,
    }
}

fn h_multiply(raw: u32) -> Instruction {
    Instruction::Multiply {
        accumulate: flag(raw, 21),
        set_flags: flag(raw, 20),
        rd: bits(raw, 19, 16) as u8,
        rn: bits(raw, 15, 12) as u8,
        rs: bits(raw, 11, 8) as u8,
        rm: bits(raw, 3, 0) as u8,
    }
}

fn h_multiply_long(raw: u32) -> Instruction {
    Instruction::MultiplyLong {
        signed: flag(raw, 22),
        accumulate: flag(raw, 21),
        set_flags: flag(raw, 20),
        rd_hi: bits(raw, 19, 16) as u8,
        rd_lo: bits(raw, 15, 12) as u8,
        rs: bits(raw, 11, 8) as u8,
        rm: bits(raw, 3, 0) as u8,
    }
}

fn address_mode(raw: u32) -> AddressMode {
    AddressMode {
        pre: flag(raw, 24),
        up: flag(raw, 23),
        writeback: flag(raw, 21),
    }
}

fn halfword_kind(raw: u32) -> Option<HalfwordKind> {
    match bits(raw, 6, 5) {
        0b01 => Some(HalfwordKind::UnsignedHalf),
        0b10 => Some(HalfwordKind::SignedByte),
        0b11 => Some(HalfwordKind::SignedHalf),
        _ => None,
    }
}

fn h_halfword_register(raw: u32) -> Instruction {
    let Some(kind) = halfword_kind(raw) else {
        return Instruction::Undefined { raw };
    };
    Instruction::HalfwordTransfer {
        mode: address_mode(raw),
        load: flag(raw, 20),
        kind,
        rn: bits(raw, 19, 16) as u8,
        rd: bits(raw, 15, 12) as u8,
        offset: HalfwordOffset::Register(bits(raw, 3, 0) as u8),
    }
}

fn h_halfword_immediate(raw: u32) -> Instruction {
    let Some(kind) = halfword_kind(raw) else {
        return Instruction::Undefined { raw };
    };
    let imm = (bits(raw, 11, 8) << 4) | bits(raw, 3, 0);
    Instruction::HalfwordTransfer {
        mode: address_mode(raw),
        load: flag(raw, 20),
        kind,
        rn: bits(raw, 19, 16) as u8,
        rd: bits(raw, 15, 12) as u8,
        offset: HalfwordOffset::Immediate(imm as u8),
    }
}

fn h_psr_transfer(raw: u32) -> Instruction {
    let spsr = flag(raw, 22);
    let immediate = flag(raw, 25);
    if !flag(raw, 21) {
        // MRS: cond 00010 R 00 1111 Rd 000000000000
        if !immediate && bits(raw, 19, 16) == 0xF && bits(raw, 11, 0) == 0 {
            return Instruction::Mrs { rd: bits(raw, 15, 12) as u8, spsr };
        }
        return Instruction::PsrOther { raw };
    }
    // MSR: cond 00I10 R 10 field 1111 source
    if bits(raw, 15, 12) != 0xF {
        return Instruction::PsrOther { raw };
    }
    let source = if immediate {
        MsrSource::Immediate {
            imm8: bits(raw, 7, 0) as u8,
            rotate: bits(raw, 11, 8) as u8,
        }
    } else if bits(raw, 11, 4) == 0 {
        MsrSource::Register(bits(raw, 3, 0) as u8)
    } else {
        return Instruction::PsrOther { raw };
    };
    Instruction::Msr {
        spsr,
        fields: bits(raw, 19, 16) as u8,
        source,
    }
}

fn h_data_processing(raw: u32) -> Instruction {
    let opcode = DpOpcode::from_u32(bits(raw, 24, 21));
    let set_flags = flag(raw, 20);
    if opcode.is_test() && !set_flags {
        return h_psr_transfer(raw);
    }
    let immediate = flag(raw, 25);
    // Register-shifted-by-register with bit 7 set is the multiply/extension
    // space; anything that fell through the earlier patterns is undefined.
    if !immediate && bit(raw, 4) == 1 && bit(raw, 7) == 1 {
        return Instruction::Undefined { raw };
    }
    let operand2 = if immediate {
        Operand2::Immediate {
            imm8: bits(raw, 7, 0) as u8,
            rotate: bits(raw, 11, 8) as u8,
        }
    } else {
        let amount = if flag(raw, 4) {
            ShiftAmount::Register(bits(raw, 11, 8) as u8)
        } else {
            ShiftAmount::Immediate(bits(raw, 11, 7) as u8)
        };
        Operand2::Register {
            rm: bits(raw, 3, 0) as u8,
            shift: ShiftType::from_u32(bits(raw, 6, 5)),
            amount,
        }
    };
    Instruction::DataProcessing {
        opcode,
        set_flags,
        rn: bits(raw, 19, 16) as u8,
        rd: bits(raw, 15, 12) as u8,
        operand2,
    }
}

fn h_undefined(raw: u32) -> Instruction {
    Instruction::Undefined { raw }
}

fn h_single_transfer(raw: u32) -> Instruction {
    // I = 1 selects a register offset; bit 4 (shift-by-register) is ignored.
    let offset = if flag(raw, 25) {
        TransferOffset::Register {
            rm: bits(raw, 3, 0) as u8,
            shift: ShiftType::from_u32(bits(raw, 6, 5)),
            amount: bits(raw, 11, 7) as u8,
        }
    } else {
        TransferOffset::Immediate(bits(raw, 11, 0) as u16)
    };
    Instruction::SingleTransfer {
        mode: address_mode(raw),
        load: flag(raw, 20),
        byte: flag(raw, 22),
        rn: bits(raw, 19, 16) as u8,
        rd: bits(raw, 15, 12) as u8,
        offset,
    }
}

fn h_block_transfer(raw: u32) -> Instruction {
    Instruction::BlockTransfer {
        pre: flag(raw, 24),
        up: flag(raw, 23),
        psr: flag(raw, 22),
        writeback: flag(raw, 21),
        load: flag(raw, 20),
        rn: bits(raw, 19, 16) as u8,
        list: bits(raw, 15, 0) as u16,
    }
}

fn h_branch(raw: u32) -> Instruction {
    Instruction::Branch {
        link: flag(raw, 24),
        offset: sign_extend(bits(raw, 23, 0), 24) << 2,
    }
}

fn h_coproc_data_transfer(raw: u32) -> Instruction {
    Instruction::CoprocDataTransfer { raw }
}

fn h_coproc_data_op(raw: u32) -> Instruction {
    Instruction::CoprocDataOp { raw }
}

fn h_coproc_reg_transfer(raw: u32) -> Instruction {
    Instruction::CoprocRegTransfer { raw }
}

fn h_swi(raw: u32) -> Instruction {
    Instruction::SoftwareInterrupt { comment: bits(raw, 23, 0) }
}

// ---------------------------------------------------------------------------
// Pattern table
// ---------------------------------------------------------------------------

/// Formats in priority order.
static DECODE_TABLE: [Matcher; 15] = [
    // BX: cond 0001 0010 1111 1111 1111 0001 Rm
    inst!(b"----000100101111111111110001----", Format::BranchExchange, h_branch_exchange),
    // SWP{B}: cond 00010 B 00 Rn Rd 0000 1001 Rm
    inst!(b"----00010-00--------00001001----", Format::SingleDataSwap, h_swap),
    // MUL/MLA: cond 000000 A S Rd Rn Rs 1001 Rm
    inst!(b"----000000--------------1001----", Format::Multiply, h_multiply),
    // UMULL/UMLAL/SMULL/SMLAL: cond 00001 U A S RdHi RdLo Rs 1001 Rm
    inst!(b"----00001---------------1001----", Format::MultiplyLong, h_multiply_long),
    // LDRH/STRH/LDRSB/LDRSH register offset: cond 000 P U 0 W L Rn Rd 0000 1 S H 1 Rm
    inst!(b"----000--0----------00001--1----", Format::HalfwordRegister, h_halfword_register),
    // Immediate offset: cond 000 P U 1 W L Rn Rd imm4 1 S H 1 imm4
    inst!(b"----000--1--------------1--1----", Format::HalfwordImmediate, h_halfword_immediate),
    // Data processing / PSR transfer: cond 00 I opcode S Rn Rd operand2
    inst!(b"----00--------------------------", Format::DataProcessing, h_data_processing),
    // Undefined: cond 011 ... 1 ....
    inst!(b"----011--------------------1----", Format::Undefined, h_undefined),
    // LDR/STR: cond 01 I P U B W L Rn Rd offset
    inst!(b"----01--------------------------", Format::SingleDataTransfer, h_single_transfer),
    // LDM/STM: cond 100 P U S W L Rn list
    inst!(b"----100-------------------------", Format::BlockDataTransfer, h_block_transfer),
    // B/BL: cond 101 L offset24
    inst!(b"----101-------------------------", Format::Branch, h_branch),
    // LDC/STC: cond 110 P U N W L Rn CRd CP# offset
    inst!(b"----110-------------------------", Format::CoprocDataTransfer, h_coproc_data_transfer),
    // CDP: cond 1110 op1 CRn CRd CP# op2 0 CRm
    inst!(b"----1110-------------------0----", Format::CoprocDataOperation, h_coproc_data_op),
    // MRC/MCR: cond 1110 op1 L CRn Rd CP# op2 1 CRm
    inst!(b"----1110-------------------1----", Format::CoprocRegisterTransfer, h_coproc_reg_transfer),
    // SWI: cond 1111 comment24
    inst!(b"----1111------------------------", Format::SoftwareInterrupt, h_swi),
];

fn lookup(raw: u32) -> Option<&'static Matcher> {
    DECODE_TABLE.iter().find(|m| (raw & m.mask) == m.expected)
}

// ---------------------------------------------------------------------------
// Public decode functions
// ---------------------------------------------------------------------------

/// Classify an instruction word into its format.
pub fn classify(raw: u32) -> Option<Format> {
    lookup(raw).map(|m| m.format)
}

/// Decode a 32-bit A32 instruction word using the pattern table.
pub fn decode(raw: u32) -> Instruction {
    decode_classified(raw).1
}

/// Decode with a single table walk, also returning the matched format.
pub fn decode_classified(raw: u32) -> (Option<Format>, Instruction) {
    match lookup(raw) {
        Some(m) => (Some(m.format), (m.handler)(raw)),
        None => (None, Instruction::Undefined { raw }),
    }
}
