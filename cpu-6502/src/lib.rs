//! Cycle-counted MOS 6502 core.
//!
//! This is the 2A03 flavour of the 6502: the full documented instruction
//! set plus the common multi-byte NOP forms, with no decimal-mode
//! arithmetic (the D flag is storable but inert). Execution is modelled
//! with a per-instruction cycle countdown: the first `clock()` of an
//! instruction performs all of its work and charges the full cycle cost;
//! the remaining clocks burn down the counter. `is_instruction_complete()` reports the
//! instruction boundary for steppers and test harnesses.

mod addressing;
mod flags;
mod table;

pub use flags::{FLAG_B, FLAG_C, FLAG_D, FLAG_I, FLAG_N, FLAG_U, FLAG_V, FLAG_Z};
pub use table::{Instr, Mode, Op, LOOKUP};

/// Memory connection. The machine's address decoder implements this.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, addr: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, addr: u16, value: u8);
}

/// The 6502 CPU state.
pub struct Cpu {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Stack pointer (offset into $0100-$01FF).
    pub sp: u8,
    /// Program counter.
    pub pc: u16,
    /// Status register (NV-BDIZC).
    pub p: u8,

    // Per-instruction transients.
    opcode: u8,
    fetched: u8,
    addr_abs: u16,
    addr_rel: u16,
    cycles: u8,
}

impl Cpu {
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            p: FLAG_U,
            opcode: 0,
            fetched: 0,
            addr_abs: 0,
            addr_rel: 0,
            cycles: 0,
        }
    }

    /// Advance one CPU cycle. A new instruction begins when the previous
    /// one's cycle budget is exhausted.
    pub fn clock(&mut self, bus: &mut impl Bus) {
        if self.cycles == 0 {
            self.opcode = bus.read(self.pc);
            self.set_flag(FLAG_U, true);
            self.pc = self.pc.wrapping_add(1);

            let instr = LOOKUP[self.opcode as usize];
            self.cycles = instr.cycles;

            let extra_addr = self.address(instr.mode, bus);
            let extra_op = self.operate(instr.op, bus);
            self.cycles += extra_addr & extra_op;

            self.set_flag(FLAG_U, true);
        }
        self.cycles -= 1;
    }

    /// True exactly at an instruction boundary.
    #[must_use]
    pub fn is_instruction_complete(&self) -> bool {
        self.cycles == 0
    }

    /// Reset: load PC from the vector at $FFFC, SP to $FD, status to U
    /// only. Takes 8 cycles.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        let lo = u16::from(bus.read(0xFFFC));
        let hi = u16::from(bus.read(0xFFFD));
        self.pc = (hi << 8) | lo;

        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        self.p = FLAG_U;

        self.addr_abs = 0;
        self.addr_rel = 0;
        self.fetched = 0;
        self.cycles = 8;
    }

    /// Maskable interrupt: honored only with I clear. Pushes PC and P
    /// (B clear) and vectors through $FFFE. 7 cycles.
    pub fn irq(&mut self, bus: &mut impl Bus) {
        if self.flag(FLAG_I) == 0 {
            self.interrupt(bus, 0xFFFE);
            self.cycles = 7;
        }
    }

    /// Non-maskable interrupt: always honored, vectors through $FFFA.
    /// 8 cycles.
    pub fn nmi(&mut self, bus: &mut impl Bus) {
        self.interrupt(bus, 0xFFFA);
        self.cycles = 8;
    }

    fn interrupt(&mut self, bus: &mut impl Bus, vector: u16) {
        self.push(bus, (self.pc >> 8) as u8);
        self.push(bus, (self.pc & 0xFF) as u8);

        self.set_flag(FLAG_B, false);
        self.set_flag(FLAG_U, true);
        self.set_flag(FLAG_I, true);
        self.push(bus, self.p);

        let lo = u16::from(bus.read(vector));
        let hi = u16::from(bus.read(vector.wrapping_add(1)));
        self.pc = (hi << 8) | lo;
    }

    // =====================================================================
    // Operand fetch and stack
    // =====================================================================

    /// Load the operand for the current instruction. Implied mode already
    /// captured A during addressing.
    fn fetch(&mut self, bus: &mut impl Bus) -> u8 {
        if LOOKUP[self.opcode as usize].mode != Mode::Imp {
            self.fetched = bus.read(self.addr_abs);
        }
        self.fetched
    }

    fn push(&mut self, bus: &mut impl Bus, value: u8) {
        bus.write(0x0100 + u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pull(&mut self, bus: &mut impl Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 + u16::from(self.sp))
    }

    /// Taken branch: 1 extra cycle, 2 when the target is on another page
    /// than the incremented PC.
    fn branch(&mut self) {
        self.cycles += 1;
        self.addr_abs = self.pc.wrapping_add(self.addr_rel);
        if self.addr_abs & 0xFF00 != self.pc & 0xFF00 {
            self.cycles += 1;
        }
        self.pc = self.addr_abs;
    }

    // =====================================================================
    // Operation dispatch
    // =====================================================================

    /// Execute the operation. Returns 1 when the operation can absorb a
    /// page-crossing penalty from the addressing mode.
    #[allow(clippy::too_many_lines)]
    fn operate(&mut self, op: Op, bus: &mut impl Bus) -> u8 {
        match op {
            Op::Adc => {
                self.fetch(bus);
                self.add_to_accumulator(self.fetched);
                1
            }
            Op::Sbc => {
                // Subtraction is addition of the operand's complement.
                self.fetch(bus);
                self.add_to_accumulator(self.fetched ^ 0xFF);
                1
            }
            Op::And => {
                self.fetch(bus);
                self.a &= self.fetched;
                self.set_zn(self.a);
                1
            }
            Op::Ora => {
                self.fetch(bus);
                self.a |= self.fetched;
                self.set_zn(self.a);
                1
            }
            Op::Eor => {
                self.fetch(bus);
                self.a ^= self.fetched;
                self.set_zn(self.a);
                1
            }
            Op::Asl => {
                self.fetch(bus);
                let result = u16::from(self.fetched) << 1;
                self.set_flag(FLAG_C, result & 0xFF00 != 0);
                self.set_zn(result as u8);
                self.store_shift_result(bus, result as u8);
                0
            }
            Op::Lsr => {
                self.fetch(bus);
                self.set_flag(FLAG_C, self.fetched & 0x01 != 0);
                let result = self.fetched >> 1;
                self.set_zn(result);
                self.store_shift_result(bus, result);
                0
            }
            Op::Rol => {
                self.fetch(bus);
                let result = (u16::from(self.fetched) << 1) | u16::from(self.flag(FLAG_C));
                self.set_flag(FLAG_C, result & 0xFF00 != 0);
                self.set_zn(result as u8);
                self.store_shift_result(bus, result as u8);
                0
            }
            Op::Ror => {
                self.fetch(bus);
                let result = (u16::from(self.flag(FLAG_C)) << 7) | u16::from(self.fetched >> 1);
                self.set_flag(FLAG_C, self.fetched & 0x01 != 0);
                self.set_zn(result as u8);
                self.store_shift_result(bus, result as u8);
                0
            }
            Op::Bit => {
                self.fetch(bus);
                self.set_flag(FLAG_Z, self.a & self.fetched == 0);
                self.set_flag(FLAG_N, self.fetched & 0x80 != 0);
                self.set_flag(FLAG_V, self.fetched & 0x40 != 0);
                0
            }
            Op::Cmp => {
                self.fetch(bus);
                self.compare(self.a, self.fetched);
                1
            }
            Op::Cpx => {
                self.fetch(bus);
                self.compare(self.x, self.fetched);
                0
            }
            Op::Cpy => {
                self.fetch(bus);
                self.compare(self.y, self.fetched);
                0
            }
            Op::Inc => {
                self.fetch(bus);
                let result = self.fetched.wrapping_add(1);
                bus.write(self.addr_abs, result);
                self.set_zn(result);
                0
            }
            Op::Dec => {
                self.fetch(bus);
                let result = self.fetched.wrapping_sub(1);
                bus.write(self.addr_abs, result);
                self.set_zn(result);
                0
            }
            Op::Inx => {
                self.x = self.x.wrapping_add(1);
                self.set_zn(self.x);
                0
            }
            Op::Iny => {
                self.y = self.y.wrapping_add(1);
                self.set_zn(self.y);
                0
            }
            Op::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.set_zn(self.x);
                0
            }
            Op::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.set_zn(self.y);
                0
            }
            Op::Lda => {
                self.fetch(bus);
                self.a = self.fetched;
                self.set_zn(self.a);
                1
            }
            Op::Ldx => {
                self.fetch(bus);
                self.x = self.fetched;
                self.set_zn(self.x);
                1
            }
            Op::Ldy => {
                self.fetch(bus);
                self.y = self.fetched;
                self.set_zn(self.y);
                1
            }
            Op::Sta => {
                bus.write(self.addr_abs, self.a);
                0
            }
            Op::Stx => {
                bus.write(self.addr_abs, self.x);
                0
            }
            Op::Sty => {
                bus.write(self.addr_abs, self.y);
                0
            }
            Op::Tax => {
                self.x = self.a;
                self.set_zn(self.x);
                0
            }
            Op::Tay => {
                self.y = self.a;
                self.set_zn(self.y);
                0
            }
            Op::Txa => {
                self.a = self.x;
                self.set_zn(self.a);
                0
            }
            Op::Tya => {
                self.a = self.y;
                self.set_zn(self.a);
                0
            }
            Op::Tsx => {
                self.x = self.sp;
                self.set_zn(self.x);
                0
            }
            Op::Txs => {
                self.sp = self.x;
                0
            }
            Op::Pha => {
                self.push(bus, self.a);
                0
            }
            Op::Php => {
                // The stacked copy carries B and U set; the live flags
                // drop them again.
                self.push(bus, self.p | FLAG_B | FLAG_U);
                self.set_flag(FLAG_B, false);
                self.set_flag(FLAG_U, false);
                0
            }
            Op::Pla => {
                self.a = self.pull(bus);
                self.set_zn(self.a);
                0
            }
            Op::Plp => {
                self.p = self.pull(bus);
                self.set_flag(FLAG_U, true);
                0
            }
            Op::Jmp => {
                self.pc = self.addr_abs;
                0
            }
            Op::Jsr => {
                self.pc = self.pc.wrapping_sub(1);
                self.push(bus, (self.pc >> 8) as u8);
                self.push(bus, (self.pc & 0xFF) as u8);
                self.pc = self.addr_abs;
                0
            }
            Op::Rts => {
                let lo = u16::from(self.pull(bus));
                let hi = u16::from(self.pull(bus));
                self.pc = ((hi << 8) | lo).wrapping_add(1);
                0
            }
            Op::Brk => {
                self.pc = self.pc.wrapping_add(1);
                self.set_flag(FLAG_I, true);
                self.push(bus, (self.pc >> 8) as u8);
                self.push(bus, (self.pc & 0xFF) as u8);

                self.set_flag(FLAG_B, true);
                self.push(bus, self.p);
                self.set_flag(FLAG_B, false);

                let lo = u16::from(bus.read(0xFFFE));
                let hi = u16::from(bus.read(0xFFFF));
                self.pc = (hi << 8) | lo;
                0
            }
            Op::Rti => {
                self.p = self.pull(bus);
                self.p &= !FLAG_B;
                self.p &= !FLAG_U;
                let lo = u16::from(self.pull(bus));
                let hi = u16::from(self.pull(bus));
                self.pc = (hi << 8) | lo;
                0
            }
            Op::Bcc => {
                if self.flag(FLAG_C) == 0 {
                    self.branch();
                }
                0
            }
            Op::Bcs => {
                if self.flag(FLAG_C) == 1 {
                    self.branch();
                }
                0
            }
            Op::Bne => {
                if self.flag(FLAG_Z) == 0 {
                    self.branch();
                }
                0
            }
            Op::Beq => {
                if self.flag(FLAG_Z) == 1 {
                    self.branch();
                }
                0
            }
            Op::Bpl => {
                if self.flag(FLAG_N) == 0 {
                    self.branch();
                }
                0
            }
            Op::Bmi => {
                if self.flag(FLAG_N) == 1 {
                    self.branch();
                }
                0
            }
            Op::Bvc => {
                if self.flag(FLAG_V) == 0 {
                    self.branch();
                }
                0
            }
            Op::Bvs => {
                if self.flag(FLAG_V) == 1 {
                    self.branch();
                }
                0
            }
            Op::Clc => {
                self.set_flag(FLAG_C, false);
                0
            }
            Op::Sec => {
                self.set_flag(FLAG_C, true);
                0
            }
            Op::Cli => {
                self.set_flag(FLAG_I, false);
                0
            }
            Op::Sei => {
                self.set_flag(FLAG_I, true);
                0
            }
            Op::Cld => {
                self.set_flag(FLAG_D, false);
                0
            }
            Op::Sed => {
                self.set_flag(FLAG_D, true);
                0
            }
            Op::Clv => {
                self.set_flag(FLAG_V, false);
                0
            }
            Op::Nop => {
                // The $xC/$x4 NOP forms read an operand and are eligible
                // for the page-crossing cycle.
                match self.opcode {
                    0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => 1,
                    _ => 0,
                }
            }
            Op::Xxx => 0,
        }
    }

    /// Shared ADC/SBC core: A + value + C with carry and signed-overflow
    /// flags from the 9-bit intermediate.
    fn add_to_accumulator(&mut self, value: u8) {
        let sum = u16::from(self.a) + u16::from(value) + u16::from(self.flag(FLAG_C));
        self.set_flag(FLAG_C, sum > 0xFF);
        self.set_flag(FLAG_Z, sum & 0xFF == 0);
        let overflow = !(u16::from(self.a) ^ u16::from(value)) & (u16::from(self.a) ^ sum) & 0x80;
        self.set_flag(FLAG_V, overflow != 0);
        self.set_flag(FLAG_N, sum & 0x80 != 0);
        self.a = (sum & 0xFF) as u8;
    }

    fn compare(&mut self, register: u8, value: u8) {
        let result = register.wrapping_sub(value);
        self.set_flag(FLAG_C, register >= value);
        self.set_zn(result);
    }

    /// Shifts and rotates target A in implied mode, memory otherwise.
    fn store_shift_result(&mut self, bus: &mut impl Bus, result: u8) {
        if LOOKUP[self.opcode as usize].mode == Mode::Imp {
            self.a = result;
        } else {
            bus.write(self.addr_abs, result);
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat 64K RAM.
    struct TestBus {
        ram: Vec<u8>,
    }

    impl TestBus {
        fn new() -> Self {
            Self { ram: vec![0; 65536] }
        }

        fn load(&mut self, addr: u16, bytes: &[u8]) {
            let addr = addr as usize;
            self.ram[addr..addr + bytes.len()].copy_from_slice(bytes);
        }
    }

    impl Bus for TestBus {
        fn read(&mut self, addr: u16) -> u8 {
            self.ram[addr as usize]
        }

        fn write(&mut self, addr: u16, value: u8) {
            self.ram[addr as usize] = value;
        }
    }

    /// Run exactly one instruction, returning the cycles it consumed.
    fn step(cpu: &mut Cpu, bus: &mut TestBus) -> u32 {
        let mut cycles = 0;
        loop {
            cpu.clock(bus);
            cycles += 1;
            if cpu.is_instruction_complete() {
                return cycles;
            }
        }
    }

    fn cpu_at(bus: &mut TestBus, pc: u16) -> Cpu {
        let mut cpu = Cpu::new();
        bus.ram[0xFFFC] = (pc & 0xFF) as u8;
        bus.ram[0xFFFD] = (pc >> 8) as u8;
        cpu.reset(bus);
        // Burn the reset cycles so the next clock fetches an opcode.
        for _ in 0..8 {
            cpu.clock(bus);
        }
        cpu
    }

    #[test]
    fn reset_loads_vector_and_initial_state() {
        let mut bus = TestBus::new();
        bus.ram[0xFFFC] = 0x34;
        bus.ram[0xFFFD] = 0x12;
        let mut cpu = Cpu::new();
        cpu.a = 0x55;
        cpu.reset(&mut bus);
        assert_eq!(cpu.pc, 0x1234);
        assert_eq!(cpu.sp, 0xFD);
        assert_eq!(cpu.p, FLAG_U);
        assert_eq!(cpu.a, 0);
    }

    #[test]
    fn lda_immediate_sets_flags() {
        let mut bus = TestBus::new();
        bus.load(0x8000, &[0xA9, 0x00, 0xA9, 0x80]);
        let mut cpu = cpu_at(&mut bus, 0x8000);

        assert_eq!(step(&mut cpu, &mut bus), 2);
        assert_eq!(cpu.a, 0x00);
        assert_eq!(cpu.flag(FLAG_Z), 1);

        step(&mut cpu, &mut bus);
        assert_eq!(cpu.a, 0x80);
        assert_eq!(cpu.flag(FLAG_N), 1);
        assert_eq!(cpu.flag(FLAG_Z), 0);
    }

    #[test]
    fn absolute_x_page_cross_costs_a_cycle() {
        let mut bus = TestBus::new();
        // LDA $80F0,X with X=$20 crosses into $8110.
        bus.load(0x8000, &[0xBD, 0xF0, 0x80]);
        bus.ram[0x8110] = 0x42;
        let mut cpu = cpu_at(&mut bus, 0x8000);
        cpu.x = 0x20;
        assert_eq!(step(&mut cpu, &mut bus), 5);
        assert_eq!(cpu.a, 0x42);

        // Same instruction without crossing stays at 4.
        bus.load(0x9000, &[0xBD, 0x00, 0x80]);
        bus.ram[0x8001] = 0x24;
        let mut cpu = cpu_at(&mut bus, 0x9000);
        cpu.x = 0x01;
        assert_eq!(step(&mut cpu, &mut bus), 4);
        assert_eq!(cpu.a, 0x24);
    }

    #[test]
    fn store_never_pays_page_cross() {
        let mut bus = TestBus::new();
        // STA $80F0,X with X=$20: 5 cycles regardless of crossing.
        bus.load(0x8000, &[0x9D, 0xF0, 0x80]);
        let mut cpu = cpu_at(&mut bus, 0x8000);
        cpu.a = 0x99;
        cpu.x = 0x20;
        assert_eq!(step(&mut cpu, &mut bus), 5);
        assert_eq!(bus.ram[0x8110], 0x99);
    }

    #[test]
    fn taken_branch_costs_three_cycles() {
        let mut bus = TestBus::new();
        // BEQ +4 with Z set, no page crossing.
        bus.load(0x8000, &[0xF0, 0x04]);
        let mut cpu = cpu_at(&mut bus, 0x8000);
        cpu.set_flag(FLAG_Z, true);
        assert_eq!(step(&mut cpu, &mut bus), 3);
        assert_eq!(cpu.pc, 0x8006);
    }

    #[test]
    fn not_taken_branch_costs_two_cycles() {
        let mut bus = TestBus::new();
        bus.load(0x8000, &[0xF0, 0x04]);
        let mut cpu = cpu_at(&mut bus, 0x8000);
        cpu.set_flag(FLAG_Z, false);
        assert_eq!(step(&mut cpu, &mut bus), 2);
        assert_eq!(cpu.pc, 0x8002);
    }

    #[test]
    fn taken_branch_across_page_costs_four_cycles() {
        let mut bus = TestBus::new();
        // At $80F0: BEQ +$20 → operand PC is $80F2, target $8112.
        bus.load(0x80F0, &[0xF0, 0x20]);
        let mut cpu = cpu_at(&mut bus, 0x80F0);
        cpu.set_flag(FLAG_Z, true);
        assert_eq!(step(&mut cpu, &mut bus), 4);
        assert_eq!(cpu.pc, 0x8112);
    }

    #[test]
    fn branch_at_page_tail_lands_in_next_page() {
        // From $00FE, BEQ +4: the incremented PC is $0100 and the target
        // $0104 sits on the same page, so no crossing penalty applies.
        let mut bus = TestBus::new();
        bus.load(0x00FE, &[0xF0, 0x04]);
        let mut cpu = cpu_at(&mut bus, 0x00FE);
        cpu.set_flag(FLAG_Z, true);
        assert_eq!(step(&mut cpu, &mut bus), 3);
        assert_eq!(cpu.pc, 0x0104);
    }

    #[test]
    fn adc_carry_zero_overflow() {
        let mut bus = TestBus::new();
        bus.load(0x8000, &[0x69, 0x01]); // ADC #$01
        let mut cpu = cpu_at(&mut bus, 0x8000);
        cpu.a = 0xFF;
        step(&mut cpu, &mut bus);
        assert_eq!(cpu.a, 0x00);
        assert_eq!(cpu.flag(FLAG_C), 1);
        assert_eq!(cpu.flag(FLAG_Z), 1);
        assert_eq!(cpu.flag(FLAG_V), 0);

        // 0x7F + 1 overflows into the sign bit.
        bus.load(0x9000, &[0x69, 0x01]);
        let mut cpu = cpu_at(&mut bus, 0x9000);
        cpu.a = 0x7F;
        step(&mut cpu, &mut bus);
        assert_eq!(cpu.a, 0x80);
        assert_eq!(cpu.flag(FLAG_V), 1);
        assert_eq!(cpu.flag(FLAG_N), 1);
    }

    #[test]
    fn sbc_equals_adc_of_complement() {
        // SBC(M) and ADC(M ^ $FF) must agree in A and all flags for any
        // starting A, operand, and carry.
        let mut bus = TestBus::new();
        bus.load(0x8000, &[0xE9, 0x00]); // SBC #imm
        bus.load(0x9000, &[0x69, 0x00]); // ADC #imm

        for a in (0..=255u8).step_by(7) {
            for m in (0..=255u8).step_by(11) {
                for carry in [false, true] {
                    bus.ram[0x8001] = m;
                    let mut sbc = cpu_at(&mut bus, 0x8000);
                    sbc.a = a;
                    sbc.set_flag(FLAG_C, carry);
                    step(&mut sbc, &mut bus);

                    bus.ram[0x9001] = m ^ 0xFF;
                    let mut adc = cpu_at(&mut bus, 0x9000);
                    adc.a = a;
                    adc.set_flag(FLAG_C, carry);
                    step(&mut adc, &mut bus);

                    assert_eq!(sbc.a, adc.a, "A mismatch for a={a} m={m} c={carry}");
                    assert_eq!(sbc.p, adc.p, "P mismatch for a={a} m={m} c={carry}");
                }
            }
        }
    }

    #[test]
    fn jmp_indirect_page_wrap_bug() {
        let mut bus = TestBus::new();
        // Pointer at $02FF: low byte from $02FF, high byte from $0200
        // (not $0300).
        bus.load(0x8000, &[0x6C, 0xFF, 0x02]);
        bus.ram[0x02FF] = 0x34;
        bus.ram[0x0200] = 0x12;
        bus.ram[0x0300] = 0x99; // must not be used
        let mut cpu = cpu_at(&mut bus, 0x8000);
        step(&mut cpu, &mut bus);
        assert_eq!(cpu.pc, 0x1234);
    }

    #[test]
    fn jsr_rts_round_trip() {
        let mut bus = TestBus::new();
        bus.load(0x8000, &[0x20, 0x00, 0x90]); // JSR $9000
        bus.load(0x9000, &[0x60]); // RTS
        let mut cpu = cpu_at(&mut bus, 0x8000);
        assert_eq!(step(&mut cpu, &mut bus), 6);
        assert_eq!(cpu.pc, 0x9000);
        assert_eq!(cpu.sp, 0xFB);
        assert_eq!(step(&mut cpu, &mut bus), 6);
        assert_eq!(cpu.pc, 0x8003);
        assert_eq!(cpu.sp, 0xFD);
    }

    #[test]
    fn php_plp_stack_copy_carries_break_bits() {
        let mut bus = TestBus::new();
        bus.load(0x8000, &[0x08, 0x28]); // PHP, PLP
        let mut cpu = cpu_at(&mut bus, 0x8000);
        cpu.set_flag(FLAG_C, true);
        step(&mut cpu, &mut bus);
        // Stacked copy has B and U set.
        assert_eq!(bus.ram[0x01FD], FLAG_C | FLAG_B | FLAG_U);
        step(&mut cpu, &mut bus);
        assert_eq!(cpu.flag(FLAG_C), 1);
        assert_eq!(cpu.flag(FLAG_U), 1);
    }

    #[test]
    fn brk_pushes_and_vectors() {
        let mut bus = TestBus::new();
        bus.load(0x8000, &[0x00]);
        bus.ram[0xFFFE] = 0x00;
        bus.ram[0xFFFF] = 0x90;
        let mut cpu = cpu_at(&mut bus, 0x8000);
        step(&mut cpu, &mut bus);
        assert_eq!(cpu.pc, 0x9000);
        assert_eq!(cpu.flag(FLAG_I), 1);
        // Pushed PC is the byte after the BRK padding byte.
        assert_eq!(bus.ram[0x01FD], 0x80);
        assert_eq!(bus.ram[0x01FC], 0x02);
        // Pushed status has B set; live status does not.
        assert_ne!(bus.ram[0x01FB] & FLAG_B, 0);
        assert_eq!(cpu.flag(FLAG_B), 0);
    }

    #[test]
    fn irq_honors_interrupt_disable() {
        let mut bus = TestBus::new();
        bus.ram[0xFFFE] = 0x00;
        bus.ram[0xFFFF] = 0x90;
        let mut cpu = cpu_at(&mut bus, 0x8000);

        cpu.set_flag(FLAG_I, true);
        cpu.irq(&mut bus);
        assert_eq!(cpu.pc, 0x8000, "masked IRQ must not vector");

        cpu.set_flag(FLAG_I, false);
        cpu.irq(&mut bus);
        assert_eq!(cpu.pc, 0x9000);
        assert_eq!(cpu.flag(FLAG_I), 1);
    }

    #[test]
    fn nmi_vectors_unconditionally() {
        let mut bus = TestBus::new();
        bus.ram[0xFFFA] = 0x22;
        bus.ram[0xFFFB] = 0x91;
        let mut cpu = cpu_at(&mut bus, 0x8000);
        cpu.set_flag(FLAG_I, true);
        cpu.nmi(&mut bus);
        assert_eq!(cpu.pc, 0x9122);
        // Status pushed with B clear, U set.
        let pushed = bus.ram[0x01FB];
        assert_eq!(pushed & FLAG_B, 0);
        assert_ne!(pushed & FLAG_U, 0);
    }

    #[test]
    fn rti_restores_status_and_pc() {
        let mut bus = TestBus::new();
        bus.ram[0xFFFA] = 0x00;
        bus.ram[0xFFFB] = 0x90;
        bus.load(0x9000, &[0x40]); // RTI
        let mut cpu = cpu_at(&mut bus, 0x8000);
        cpu.set_flag(FLAG_C, true);
        cpu.nmi(&mut bus);
        for _ in 0..8 {
            cpu.clock(&mut bus);
        }
        step(&mut cpu, &mut bus);
        assert_eq!(cpu.pc, 0x8000);
        assert_eq!(cpu.flag(FLAG_C), 1);
    }

    #[test]
    fn rmw_absolute_x_ignores_page_cross_bonus() {
        let mut bus = TestBus::new();
        // INC $80F0,X with X=$20: always 7 cycles.
        bus.load(0x8000, &[0xFE, 0xF0, 0x80]);
        bus.ram[0x8110] = 0x41;
        let mut cpu = cpu_at(&mut bus, 0x8000);
        cpu.x = 0x20;
        assert_eq!(step(&mut cpu, &mut bus), 7);
        assert_eq!(bus.ram[0x8110], 0x42);
    }

    #[test]
    fn nop_forms_burn_their_table_cycles() {
        let mut bus = TestBus::new();
        // $04 is an undocumented zero-page NOP slot: 3 cycles, no state
        // change beyond PC.
        bus.load(0x8000, &[0x04]);
        let mut cpu = cpu_at(&mut bus, 0x8000);
        let (a, x, y, p) = (cpu.a, cpu.x, cpu.y, cpu.p);
        assert_eq!(step(&mut cpu, &mut bus), 3);
        assert_eq!((cpu.a, cpu.x, cpu.y, cpu.p), (a, x, y, p));
    }
}
