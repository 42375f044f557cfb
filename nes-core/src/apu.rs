//! APU: a single pulse channel.
//!
//! The synthesis is analytic rather than sequenced: the duty square wave
//! is approximated by a bandlimited sum of sine harmonics evaluated at the
//! running emulation time, so the mixer can sample it at any rate. One
//! `clock()` is one master (PPU-rate) tick; the CPU runs at a third of
//! that, which fixes the time step below.

use std::f64::consts::PI;

/// NTSC CPU frequency in Hz, the timebase for channel pitch.
pub const CPU_HZ: f64 = 1_789_773.0;

/// Pulse timer state: period reload plus the raw duty sequence bits.
#[derive(Debug, Clone, Copy, Default)]
struct Sequencer {
    sequence: u32,
    timer: u16,
    reload: u16,
}

/// Bandlimited pulse oscillator.
#[derive(Debug, Clone, Copy)]
struct PulseOscillator {
    frequency: f64,
    duty: f64,
    amplitude: f64,
    harmonics: u32,
}

impl PulseOscillator {
    /// Sample the duty wave at time `t`, as the difference of two
    /// sawtooth harmonic sums offset by the duty phase.
    fn sample(&self, t: f64) -> f64 {
        // Cheap parabolic sine; full precision is inaudible here and the
        // real thing costs too much inside a per-sample harmonic loop.
        fn approx_sin(t: f64) -> f64 {
            let mut j = t * 0.15915;
            j -= j.floor();
            20.785 * j * (j - 0.5) * (j - 1.0)
        }

        let mut a = 0.0;
        let mut b = 0.0;
        let p = self.duty * 2.0 * PI;
        for n in 1..=self.harmonics {
            let n = f64::from(n);
            let c = n * self.frequency * 2.0 * PI * t;
            a += -approx_sin(c) / n;
            b += -approx_sin(c - p * n) / n;
        }
        (2.0 * self.amplitude / PI) * (a - b)
    }
}

/// The audio processing unit.
pub struct Apu {
    pulse_enable: bool,
    pulse_sample: f64,
    pulse_seq: Sequencer,
    pulse_osc: PulseOscillator,
    clock_counter: u32,
    frame_clock_counter: u32,
    global_time: f64,
}

impl Apu {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pulse_enable: false,
            pulse_sample: 0.0,
            pulse_seq: Sequencer::default(),
            pulse_osc: PulseOscillator {
                frequency: 0.0,
                duty: 0.0,
                amplitude: 1.0,
                harmonics: 20,
            },
            clock_counter: 0,
            frame_clock_counter: 0,
            global_time: 0.0,
        }
    }

    /// Register write from the CPU bus.
    pub fn cpu_write(&mut self, addr: u16, data: u8) {
        match addr {
            0x4000 => match (data & 0xC0) >> 6 {
                0x00 => {
                    self.pulse_seq.sequence = 0b0000_0001;
                    self.pulse_osc.duty = 0.125;
                }
                0x01 => {
                    self.pulse_seq.sequence = 0b0000_0011;
                    self.pulse_osc.duty = 0.250;
                }
                0x02 => {
                    self.pulse_seq.sequence = 0b0000_1111;
                    self.pulse_osc.duty = 0.500;
                }
                _ => {
                    self.pulse_seq.sequence = 0b1111_1100;
                    self.pulse_osc.duty = 0.750;
                }
            },
            0x4002 => {
                self.pulse_seq.reload = (self.pulse_seq.reload & 0xFF00) | u16::from(data);
            }
            0x4003 => {
                self.pulse_seq.reload =
                    ((u16::from(data) & 0x07) << 8) | (self.pulse_seq.reload & 0x00FF);
                self.pulse_seq.timer = self.pulse_seq.reload;
            }
            0x4015 => self.pulse_enable = data & 0x01 != 0,
            _ => {}
        }
    }

    /// Register read. Nothing is readable in this cut-down APU.
    #[must_use]
    pub fn cpu_read(&self, _addr: u16) -> u8 {
        0x00
    }

    /// One master tick: advance emulation time and, on the frame-counter
    /// cadence, refresh the channel's frequency and output sample.
    pub fn clock(&mut self) {
        self.global_time += (1.0 / 3.0) / CPU_HZ;

        if self.clock_counter % 6 == 0 {
            self.frame_clock_counter += 1;
            // Four-step frame sequence; envelope and length hooks land on
            // these beats once those units exist.
            if self.frame_clock_counter == 14916 {
                self.frame_clock_counter = 0;
            }

            self.pulse_osc.frequency =
                CPU_HZ / (16.0 * (f64::from(self.pulse_seq.reload) + 1.0));
            self.pulse_sample = self.pulse_osc.sample(self.global_time);
        }
        self.clock_counter += 1;
    }

    /// Current mixed output in -1.0..=1.0.
    ///
    /// The $4015 enable bit is latched but does not gate the mixer; the
    /// oscillator runs continuously.
    #[must_use]
    pub fn output(&self) -> f32 {
        self.pulse_sample as f32
    }

    pub fn reset(&mut self) {
        self.pulse_enable = false;
        self.pulse_sample = 0.0;
        self.pulse_seq = Sequencer::default();
        self.clock_counter = 0;
        self.frame_clock_counter = 0;
        self.global_time = 0.0;
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}
