//! The 256-entry instruction descriptor table.
//!
//! One dense row per opcode: mnemonic tag, addressing-mode tag, base cycle
//! count. Undocumented opcodes map to `Xxx` (pure no-op) or `Nop` (the
//! common multi-byte NOP forms) with the cycle counts the hardware spends
//! on them.

/// Operation mnemonic tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
    /// Catch-all for undocumented opcodes without a NOP form.
    Xxx,
}

/// Addressing-mode tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Implied (operand is A or none).
    Imp,
    /// Immediate.
    Imm,
    /// Zero page.
    Zp0,
    /// Zero page, X-indexed.
    Zpx,
    /// Zero page, Y-indexed.
    Zpy,
    /// Relative (branches).
    Rel,
    /// Absolute.
    Abs,
    /// Absolute, X-indexed.
    Abx,
    /// Absolute, Y-indexed.
    Aby,
    /// Indirect (JMP only, with the $xxFF page-wrap bug).
    Ind,
    /// Indexed indirect: ($nn,X).
    Izx,
    /// Indirect indexed: ($nn),Y.
    Izy,
}

/// One instruction descriptor.
#[derive(Debug, Clone, Copy)]
pub struct Instr {
    pub op: Op,
    pub mode: Mode,
    pub cycles: u8,
}

const fn i(op: Op, mode: Mode, cycles: u8) -> Instr {
    Instr { op, mode, cycles }
}

use Mode::*;
use Op::*;

/// Descriptor table indexed by opcode. 16 opcodes per row.
#[rustfmt::skip]
pub static LOOKUP: [Instr; 256] = [
    // 0x00
    i(Brk,Imp,7), i(Ora,Izx,6), i(Xxx,Imp,2), i(Xxx,Imp,8), i(Nop,Imp,3), i(Ora,Zp0,3), i(Asl,Zp0,5), i(Xxx,Imp,5),
    i(Php,Imp,3), i(Ora,Imm,2), i(Asl,Imp,2), i(Xxx,Imp,2), i(Nop,Imp,4), i(Ora,Abs,4), i(Asl,Abs,6), i(Xxx,Imp,6),
    // 0x10
    i(Bpl,Rel,2), i(Ora,Izy,5), i(Xxx,Imp,2), i(Xxx,Imp,8), i(Nop,Imp,4), i(Ora,Zpx,4), i(Asl,Zpx,6), i(Xxx,Imp,6),
    i(Clc,Imp,2), i(Ora,Aby,4), i(Nop,Imp,2), i(Xxx,Imp,7), i(Nop,Imp,4), i(Ora,Abx,4), i(Asl,Abx,7), i(Xxx,Imp,7),
    // 0x20
    i(Jsr,Abs,6), i(And,Izx,6), i(Xxx,Imp,2), i(Xxx,Imp,8), i(Bit,Zp0,3), i(And,Zp0,3), i(Rol,Zp0,5), i(Xxx,Imp,5),
    i(Plp,Imp,4), i(And,Imm,2), i(Rol,Imp,2), i(Xxx,Imp,2), i(Bit,Abs,4), i(And,Abs,4), i(Rol,Abs,6), i(Xxx,Imp,6),
    // 0x30
    i(Bmi,Rel,2), i(And,Izy,5), i(Xxx,Imp,2), i(Xxx,Imp,8), i(Nop,Imp,4), i(And,Zpx,4), i(Rol,Zpx,6), i(Xxx,Imp,6),
    i(Sec,Imp,2), i(And,Aby,4), i(Nop,Imp,2), i(Xxx,Imp,7), i(Nop,Imp,4), i(And,Abx,4), i(Rol,Abx,7), i(Xxx,Imp,7),
    // 0x40
    i(Rti,Imp,6), i(Eor,Izx,6), i(Xxx,Imp,2), i(Xxx,Imp,8), i(Nop,Imp,3), i(Eor,Zp0,3), i(Lsr,Zp0,5), i(Xxx,Imp,5),
    i(Pha,Imp,3), i(Eor,Imm,2), i(Lsr,Imp,2), i(Xxx,Imp,2), i(Jmp,Abs,3), i(Eor,Abs,4), i(Lsr,Abs,6), i(Xxx,Imp,6),
    // 0x50
    i(Bvc,Rel,2), i(Eor,Izy,5), i(Xxx,Imp,2), i(Xxx,Imp,8), i(Nop,Imp,4), i(Eor,Zpx,4), i(Lsr,Zpx,6), i(Xxx,Imp,6),
    i(Cli,Imp,2), i(Eor,Aby,4), i(Nop,Imp,2), i(Xxx,Imp,7), i(Nop,Imp,4), i(Eor,Abx,4), i(Lsr,Abx,7), i(Xxx,Imp,7),
    // 0x60
    i(Rts,Imp,6), i(Adc,Izx,6), i(Xxx,Imp,2), i(Xxx,Imp,8), i(Nop,Imp,3), i(Adc,Zp0,3), i(Ror,Zp0,5), i(Xxx,Imp,5),
    i(Pla,Imp,4), i(Adc,Imm,2), i(Ror,Imp,2), i(Xxx,Imp,2), i(Jmp,Ind,5), i(Adc,Abs,4), i(Ror,Abs,6), i(Xxx,Imp,6),
    // 0x70
    i(Bvs,Rel,2), i(Adc,Izy,5), i(Xxx,Imp,2), i(Xxx,Imp,8), i(Nop,Imp,4), i(Adc,Zpx,4), i(Ror,Zpx,6), i(Xxx,Imp,6),
    i(Sei,Imp,2), i(Adc,Aby,4), i(Nop,Imp,2), i(Xxx,Imp,7), i(Nop,Imp,4), i(Adc,Abx,4), i(Ror,Abx,7), i(Xxx,Imp,7),
    // 0x80
    i(Nop,Imp,2), i(Sta,Izx,6), i(Nop,Imp,2), i(Xxx,Imp,6), i(Sty,Zp0,3), i(Sta,Zp0,3), i(Stx,Zp0,3), i(Xxx,Imp,3),
    i(Dey,Imp,2), i(Nop,Imp,2), i(Txa,Imp,2), i(Xxx,Imp,2), i(Sty,Abs,4), i(Sta,Abs,4), i(Stx,Abs,4), i(Xxx,Imp,4),
    // 0x90
    i(Bcc,Rel,2), i(Sta,Izy,6), i(Xxx,Imp,2), i(Xxx,Imp,6), i(Sty,Zpx,4), i(Sta,Zpx,4), i(Stx,Zpy,4), i(Xxx,Imp,4),
    i(Tya,Imp,2), i(Sta,Aby,5), i(Txs,Imp,2), i(Xxx,Imp,5), i(Nop,Imp,5), i(Sta,Abx,5), i(Xxx,Imp,5), i(Xxx,Imp,5),
    // 0xA0
    i(Ldy,Imm,2), i(Lda,Izx,6), i(Ldx,Imm,2), i(Xxx,Imp,6), i(Ldy,Zp0,3), i(Lda,Zp0,3), i(Ldx,Zp0,3), i(Xxx,Imp,3),
    i(Tay,Imp,2), i(Lda,Imm,2), i(Tax,Imp,2), i(Xxx,Imp,2), i(Ldy,Abs,4), i(Lda,Abs,4), i(Ldx,Abs,4), i(Xxx,Imp,4),
    // 0xB0
    i(Bcs,Rel,2), i(Lda,Izy,5), i(Xxx,Imp,2), i(Xxx,Imp,5), i(Ldy,Zpx,4), i(Lda,Zpx,4), i(Ldx,Zpy,4), i(Xxx,Imp,4),
    i(Clv,Imp,2), i(Lda,Aby,4), i(Tsx,Imp,2), i(Xxx,Imp,4), i(Ldy,Abx,4), i(Lda,Abx,4), i(Ldx,Aby,4), i(Xxx,Imp,4),
    // 0xC0
    i(Cpy,Imm,2), i(Cmp,Izx,6), i(Nop,Imp,2), i(Xxx,Imp,8), i(Cpy,Zp0,3), i(Cmp,Zp0,3), i(Dec,Zp0,5), i(Xxx,Imp,5),
    i(Iny,Imp,2), i(Cmp,Imm,2), i(Dex,Imp,2), i(Xxx,Imp,2), i(Cpy,Abs,4), i(Cmp,Abs,4), i(Dec,Abs,6), i(Xxx,Imp,6),
    // 0xD0
    i(Bne,Rel,2), i(Cmp,Izy,5), i(Xxx,Imp,2), i(Xxx,Imp,8), i(Nop,Imp,4), i(Cmp,Zpx,4), i(Dec,Zpx,6), i(Xxx,Imp,6),
    i(Cld,Imp,2), i(Cmp,Aby,4), i(Nop,Imp,2), i(Xxx,Imp,7), i(Nop,Imp,4), i(Cmp,Abx,4), i(Dec,Abx,7), i(Xxx,Imp,7),
    // 0xE0
    i(Cpx,Imm,2), i(Sbc,Izx,6), i(Nop,Imp,2), i(Xxx,Imp,8), i(Cpx,Zp0,3), i(Sbc,Zp0,3), i(Inc,Zp0,5), i(Xxx,Imp,5),
    i(Inx,Imp,2), i(Sbc,Imm,2), i(Nop,Imp,2), i(Sbc,Imp,2), i(Cpx,Abs,4), i(Sbc,Abs,4), i(Inc,Abs,6), i(Xxx,Imp,6),
    // 0xF0
    i(Beq,Rel,2), i(Sbc,Izy,5), i(Xxx,Imp,2), i(Xxx,Imp,8), i(Nop,Imp,4), i(Sbc,Zpx,4), i(Inc,Zpx,6), i(Xxx,Imp,6),
    i(Sed,Imp,2), i(Sbc,Aby,4), i(Nop,Imp,2), i(Xxx,Imp,7), i(Nop,Imp,4), i(Sbc,Abx,4), i(Inc,Abx,7), i(Xxx,Imp,7),
];

#[cfg(test)]
mod tests {
    use super::*;
    use super::{Mode::*, Op::*};

    #[test]
    fn documented_entries_spot_check() {
        // LDA in all eight of its modes.
        assert!(matches!(LOOKUP[0xA9], Instr { op: Lda, mode: Imm, cycles: 2 }));
        assert!(matches!(LOOKUP[0xA5], Instr { op: Lda, mode: Zp0, cycles: 3 }));
        assert!(matches!(LOOKUP[0xB5], Instr { op: Lda, mode: Zpx, cycles: 4 }));
        assert!(matches!(LOOKUP[0xAD], Instr { op: Lda, mode: Abs, cycles: 4 }));
        assert!(matches!(LOOKUP[0xBD], Instr { op: Lda, mode: Abx, cycles: 4 }));
        assert!(matches!(LOOKUP[0xB9], Instr { op: Lda, mode: Aby, cycles: 4 }));
        assert!(matches!(LOOKUP[0xA1], Instr { op: Lda, mode: Izx, cycles: 6 }));
        assert!(matches!(LOOKUP[0xB1], Instr { op: Lda, mode: Izy, cycles: 5 }));
        // Control flow.
        assert!(matches!(LOOKUP[0x4C], Instr { op: Jmp, mode: Abs, cycles: 3 }));
        assert!(matches!(LOOKUP[0x6C], Instr { op: Jmp, mode: Ind, cycles: 5 }));
        assert!(matches!(LOOKUP[0x20], Instr { op: Jsr, mode: Abs, cycles: 6 }));
        assert!(matches!(LOOKUP[0x00], Instr { op: Brk, mode: Imp, cycles: 7 }));
        // Read-modify-write takes 7 on Abx regardless of page crossing.
        assert!(matches!(LOOKUP[0xFE], Instr { op: Inc, mode: Abx, cycles: 7 }));
    }

    #[test]
    fn branches_use_relative_mode() {
        for opcode in [0x10, 0x30, 0x50, 0x70, 0x90, 0xB0, 0xD0, 0xF0] {
            assert_eq!(LOOKUP[opcode].mode, Rel);
            assert_eq!(LOOKUP[opcode].cycles, 2);
        }
    }
}
