//! Cycle-accurate NES machine emulation.
//!
//! The master clock ticks at the PPU rate (5,369,318 Hz NTSC); the CPU
//! takes every third tick and OAM DMA steals its slots. One frame is 341
//! dots × 262 scanlines. [`Nes::run_frame`] drives the machine to the next
//! frame boundary and the front end presents the ARGB framebuffer and
//! drains the resampled audio.

mod apu;
mod bus;
pub mod capture;
mod cartridge;
mod config;
mod controller;
pub mod input;
mod mapper;
mod nes;
mod palette;
pub mod ppu;

pub use apu::Apu;
pub use bus::NesBus;
pub use cartridge::{Cartridge, Mirroring};
pub use config::NesConfig;
pub use controller::Controller;
pub use input::{InputQueue, NesButton};
pub use mapper::{MapResult, Mapper};
pub use nes::{Nes, CPU_HZ, PPU_HZ};
pub use ppu::Ppu;
