//! The console: master clock coordination.
//!
//! One `tick()` is one master cycle. The PPU runs every master cycle, the
//! APU's timebase advances every master cycle, and the CPU takes every
//! third — unless an OAM DMA transfer has the CPU halted, in which case
//! the DMA engine uses the CPU's slots. An NMI latched by the PPU during a
//! cycle is delivered to the CPU at that cycle's end.

use cpu_6502::{Bus, Cpu};

use crate::bus::NesBus;
use crate::cartridge::Cartridge;
use crate::config::NesConfig;
use crate::input::{InputQueue, NesButton};
use crate::ppu::{FB_HEIGHT, FB_WIDTH};

/// PPU (= master tick) frequency, NTSC.
pub const PPU_HZ: f64 = 5_369_318.0;
/// CPU frequency, NTSC (PPU / 3).
pub const CPU_HZ: u32 = 1_789_773;

/// Dropped-on-full bound for pending audio samples (~1/10 s at 44.1 kHz).
const AUDIO_BUFFER_CAP: usize = 4096;

/// The NES console.
pub struct Nes {
    cpu: Cpu,
    bus: NesBus,
    master_clock: u64,
    frame_count: u64,
    input_queue: InputQueue,

    // Audio resampling gate: emit one sample each time the accumulated
    // emulated time crosses the host sample period.
    time_per_sample: f64,
    time_per_clock: f64,
    audio_accum: f64,
    audio_buffer: Vec<f32>,
}

impl Nes {
    /// Build a console around a ROM image.
    ///
    /// # Errors
    ///
    /// Fails when the iNES image is malformed or needs an unsupported
    /// mapper.
    pub fn new(config: &NesConfig) -> Result<Self, String> {
        let cartridge = Cartridge::from_ines(&config.rom_data)?;
        let mut nes = Self {
            cpu: Cpu::new(),
            bus: NesBus::new(cartridge),
            master_clock: 0,
            frame_count: 0,
            input_queue: InputQueue::new(),
            time_per_sample: 0.0,
            time_per_clock: 1.0 / PPU_HZ,
            audio_accum: 0.0,
            audio_buffer: Vec::new(),
        };
        nes.reset();
        Ok(nes)
    }

    /// Reset the console: mapper banking, CPU (via the reset vector), PPU
    /// latches, APU, clock and DMA state. Memory contents survive.
    pub fn reset(&mut self) {
        self.bus.cartridge.reset();
        self.cpu.reset(&mut self.bus);
        self.bus.ppu.reset();
        self.bus.apu.reset();
        self.bus.dma = crate::bus::DmaState { dummy: true, ..Default::default() };
        self.master_clock = 0;
        self.audio_accum = 0.0;
    }

    /// Advance one master cycle.
    pub fn tick(&mut self) {
        self.bus.ppu.clock(&mut self.bus.cartridge);
        self.bus.apu.clock();

        if self.master_clock % 3 == 0 {
            if self.bus.dma.active {
                self.tick_dma();
            } else {
                self.cpu.clock(&mut self.bus);
            }
        }

        if self.time_per_sample > 0.0 {
            self.audio_accum += self.time_per_clock;
            if self.audio_accum >= self.time_per_sample {
                self.audio_accum -= self.time_per_sample;
                let sample = self.bus.apu.output();
                // Best-effort delivery: drop the newest when the sink lags.
                if self.audio_buffer.len() < AUDIO_BUFFER_CAP {
                    self.audio_buffer.push(sample);
                }
            }
        }

        if self.bus.ppu.take_nmi() {
            self.cpu.nmi(&mut self.bus);
        }

        self.master_clock += 1;
    }

    /// One DMA sub-step in a CPU slot: a dummy wait until an odd master
    /// cycle aligns the engine, then alternating read/write at two cycles
    /// per byte. 256 bytes cost 513 or 514 CPU cycles by start parity.
    fn tick_dma(&mut self) {
        if self.bus.dma.dummy {
            if self.master_clock % 2 == 1 {
                self.bus.dma.dummy = false;
            }
        } else if self.master_clock % 2 == 0 {
            let addr = (u16::from(self.bus.dma.page) << 8) | u16::from(self.bus.dma.addr);
            self.bus.dma.data = self.bus.read(addr);
        } else {
            let (addr, data) = (self.bus.dma.addr, self.bus.dma.data);
            self.bus.ppu.dma_write(addr, data);
            self.bus.dma.addr = self.bus.dma.addr.wrapping_add(1);
            if self.bus.dma.addr == 0 {
                self.bus.dma.active = false;
                self.bus.dma.dummy = true;
            }
        }
    }

    /// Run until the PPU finishes the current frame. Scripted input due
    /// this frame is applied first. Returns the master cycles consumed.
    pub fn run_frame(&mut self) -> u64 {
        let queue = &mut self.input_queue;
        queue.process(self.frame_count, &mut self.bus.controllers[0]);
        self.frame_count += 1;

        let start = self.master_clock;
        loop {
            self.tick();
            if self.bus.ppu.frame_complete() {
                self.bus.ppu.clear_frame_complete();
                break;
            }
        }
        self.master_clock - start
    }

    // =====================================================================
    // Observation and front-end surface
    // =====================================================================

    /// ARGB framebuffer, 256×240.
    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        self.bus.ppu.framebuffer()
    }

    /// Framebuffer width in pixels.
    #[must_use]
    pub fn framebuffer_width(&self) -> u32 {
        FB_WIDTH as u32
    }

    /// Framebuffer height in pixels.
    #[must_use]
    pub fn framebuffer_height(&self) -> u32 {
        FB_HEIGHT as u32
    }

    /// Choose the host audio rate; enables the resampling gate.
    pub fn set_sample_rate(&mut self, hz: u32) {
        self.time_per_sample = 1.0 / f64::from(hz);
    }

    /// Drain the pending audio samples.
    pub fn take_audio_samples(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.audio_buffer)
    }

    /// Replace controller `port`'s live byte.
    pub fn set_controller(&mut self, port: usize, buttons: u8) {
        self.bus.controllers[port & 1].set_buttons(buttons);
    }

    /// Press a button on controller 1.
    pub fn press_button(&mut self, button: NesButton) {
        self.bus.controllers[0].set_button(button.mask(), true);
    }

    /// Release a button on controller 1.
    pub fn release_button(&mut self, button: NesButton) {
        self.bus.controllers[0].set_button(button.mask(), false);
    }

    /// The timed input queue (applies to controller 1 per frame).
    pub fn input_queue(&mut self) -> &mut InputQueue {
        &mut self.input_queue
    }

    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &NesBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.bus
    }

    /// Master cycles since reset.
    #[must_use]
    pub fn master_clock(&self) -> u64 {
        self.master_clock
    }

    /// Completed frames.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// True while OAM DMA has the CPU halted.
    #[must_use]
    pub fn dma_active(&self) -> bool {
        self.bus.dma.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::PRG_BANK_SIZE;
    use crate::config::NesConfig;

    /// 32K NROM of NOPs with vectors pointing at $8000.
    fn nop_rom() -> Vec<u8> {
        let mut data = vec![0u8; 16 + 2 * PRG_BANK_SIZE + 0x2000];
        data[4] = 2;
        data[5] = 1;
        for b in &mut data[16..16 + 2 * PRG_BANK_SIZE] {
            *b = 0xEA;
        }
        // Reset/NMI/IRQ vectors → $8000.
        for vector in [0x7FFA, 0x7FFC, 0x7FFE] {
            data[16 + vector] = 0x00;
            data[16 + vector + 1] = 0x80;
        }
        data
    }

    fn make_nes() -> Nes {
        Nes::new(&NesConfig { rom_data: nop_rom() }).unwrap()
    }

    #[test]
    fn reset_reads_vector() {
        let nes = make_nes();
        assert_eq!(nes.cpu().pc, 0x8000);
    }

    #[test]
    fn master_clock_advances_per_tick() {
        let mut nes = make_nes();
        nes.tick();
        nes.tick();
        assert_eq!(nes.master_clock(), 2);
    }

    #[test]
    fn frame_of_master_cycles_matches_dot_count() {
        let mut nes = make_nes();
        // Reset leaves the PPU at (0,0): the first frame omits the
        // pre-render line and the skipped dot — 341×261 − 1.
        let ticks = nes.run_frame();
        assert_eq!(ticks, 341 * 261 - 1);
        // Steady state: full frame minus the skipped dot — 341×262 − 1.
        let ticks = nes.run_frame();
        assert_eq!(ticks, 341 * 262 - 1);
    }

    #[test]
    fn cpu_runs_every_third_master_cycle() {
        let mut nes = make_nes();
        // Drain the 8-cycle reset sequence: 8 CPU slots = 24 master ticks.
        for _ in 0..24 {
            nes.tick();
        }
        // NOP is 2 cycles → one instruction per 6 master cycles.
        let pc0 = nes.cpu().pc;
        for _ in 0..6 {
            nes.tick();
        }
        assert_eq!(nes.cpu().pc, pc0 + 1);
        for _ in 0..594 {
            nes.tick();
        }
        assert_eq!(nes.cpu().pc, pc0 + 100);
    }

    #[test]
    fn oam_dma_copies_a_page_and_halts_cpu() {
        let mut nes = make_nes();
        // Fill RAM page $02 with 0..=255.
        for i in 0..=255u8 {
            nes.bus_mut().write(0x0200 + u16::from(i), i);
        }
        // Align to a CPU instruction boundary before triggering.
        while !nes.cpu().is_instruction_complete() {
            nes.tick();
        }
        let pc_before = nes.cpu().pc;

        nes.bus_mut().write(0x4014, 0x02);
        assert!(nes.dma_active());

        let start = nes.master_clock();
        let mut cpu_slots = 0u32;
        while nes.dma_active() {
            if nes.master_clock() % 3 == 0 {
                cpu_slots += 1;
            }
            nes.tick();
            assert_eq!(nes.cpu().pc, pc_before, "CPU ran during DMA");
            assert!(nes.master_clock() - start < 4000, "DMA never completed");
        }

        assert!(
            cpu_slots == 513 || cpu_slots == 514,
            "DMA stole {cpu_slots} CPU cycles"
        );
        for i in 0..=255u8 {
            assert_eq!(nes.bus().ppu.oam()[usize::from(i)], i);
        }
    }

    #[test]
    fn audio_gate_resamples_to_host_rate() {
        let mut nes = make_nes();
        nes.set_sample_rate(44_100);
        let ticks = nes.run_frame();
        let samples = nes.take_audio_samples();
        // One frame of master cycles at 44.1 kHz is ~734 samples.
        let expected = (ticks as f64 / PPU_HZ * 44_100.0) as usize;
        assert!(
            samples.len().abs_diff(expected) <= 1,
            "got {} samples, expected ~{expected}",
            samples.len()
        );
        // Draining leaves the buffer empty.
        assert!(nes.take_audio_samples().is_empty());
    }

    #[test]
    fn no_samples_without_a_rate() {
        let mut nes = make_nes();
        nes.run_frame();
        assert!(nes.take_audio_samples().is_empty());
    }
}
