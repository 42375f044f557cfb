//! Addressing-mode resolution.
//!
//! Each mode consumes its operand bytes from PC and leaves the effective
//! address in `addr_abs` (or the signed branch offset in `addr_rel`). The
//! return value is 1 when the mode *may* charge a page-crossing penalty;
//! the executed operation gets the other vote (the penalty applies only
//! when both agree).

use crate::table::Mode;
use crate::{Bus, Cpu};

impl Cpu {
    pub(crate) fn address(&mut self, mode: Mode, bus: &mut impl Bus) -> u8 {
        match mode {
            Mode::Imp => {
                self.fetched = self.a;
                0
            }
            Mode::Imm => {
                self.addr_abs = self.pc;
                self.pc = self.pc.wrapping_add(1);
                0
            }
            Mode::Zp0 => {
                self.addr_abs = u16::from(bus.read(self.pc));
                self.pc = self.pc.wrapping_add(1);
                0
            }
            Mode::Zpx => {
                let base = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                self.addr_abs = u16::from(base.wrapping_add(self.x));
                0
            }
            Mode::Zpy => {
                let base = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                self.addr_abs = u16::from(base.wrapping_add(self.y));
                0
            }
            Mode::Rel => {
                // Sign-extend the 8-bit offset.
                self.addr_rel = u16::from(bus.read(self.pc));
                self.pc = self.pc.wrapping_add(1);
                if self.addr_rel & 0x80 != 0 {
                    self.addr_rel |= 0xFF00;
                }
                0
            }
            Mode::Abs => {
                self.addr_abs = self.read_word_at_pc(bus);
                0
            }
            Mode::Abx => {
                let base = self.read_word_at_pc(bus);
                self.addr_abs = base.wrapping_add(u16::from(self.x));
                u8::from(self.addr_abs & 0xFF00 != base & 0xFF00)
            }
            Mode::Aby => {
                let base = self.read_word_at_pc(bus);
                self.addr_abs = base.wrapping_add(u16::from(self.y));
                u8::from(self.addr_abs & 0xFF00 != base & 0xFF00)
            }
            Mode::Ind => {
                let ptr = self.read_word_at_pc(bus);
                // 6502 bug: the high byte of a pointer at $xxFF wraps
                // within the page instead of carrying into the next one.
                let hi_addr = if ptr & 0x00FF == 0x00FF {
                    ptr & 0xFF00
                } else {
                    ptr.wrapping_add(1)
                };
                self.addr_abs =
                    (u16::from(bus.read(hi_addr)) << 8) | u16::from(bus.read(ptr));
                0
            }
            Mode::Izx => {
                let t = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                let lo = bus.read(u16::from(t.wrapping_add(self.x)));
                let hi = bus.read(u16::from(t.wrapping_add(self.x).wrapping_add(1)));
                self.addr_abs = (u16::from(hi) << 8) | u16::from(lo);
                0
            }
            Mode::Izy => {
                let t = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                let lo = bus.read(u16::from(t));
                let hi = bus.read(u16::from(t.wrapping_add(1)));
                let base = (u16::from(hi) << 8) | u16::from(lo);
                self.addr_abs = base.wrapping_add(u16::from(self.y));
                u8::from(self.addr_abs & 0xFF00 != base & 0xFF00)
            }
        }
    }

    /// Read a little-endian word at PC, advancing PC past it.
    fn read_word_at_pc(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        let hi = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        (u16::from(hi) << 8) | u16::from(lo)
    }
}
