//! iNES cartridge image.
//!
//! Parses the iNES container (16-byte header, optional 512-byte trainer,
//! PRG then CHR), owns the PRG/CHR memory, and routes every bus access
//! through its mapper. The 4-byte magic is deliberately not validated —
//! header geometry and a supported mapper id are what actually matter.

use crate::mapper::{MapResult, Mapper};

/// Nametable mirroring arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    /// Nametables 0,1 share a page; 2,3 share the other.
    Horizontal,
    /// Nametables 0,2 share a page; 1,3 share the other.
    Vertical,
    /// Every nametable maps to the first page.
    SingleScreenLower,
    /// Every nametable maps to the second page.
    SingleScreenUpper,
}

/// PRG bank granularity (16 KiB).
pub const PRG_BANK_SIZE: usize = 0x4000;
/// CHR bank granularity (8 KiB).
pub const CHR_BANK_SIZE: usize = 0x2000;

/// A parsed cartridge: PRG/CHR memory behind a mapper.
#[derive(Debug)]
pub struct Cartridge {
    prg_banks: u16,
    chr_banks: u16,
    prg: Vec<u8>,
    chr: Vec<u8>,
    mapper: Mapper,
    hardware_mirroring: Mirroring,
}

impl Cartridge {
    /// Parse an iNES image from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error when the image is shorter than its header claims
    /// or names an unsupported mapper.
    pub fn from_ines(data: &[u8]) -> Result<Self, String> {
        if data.len() < 16 {
            return Err("iNES image shorter than the 16-byte header".to_string());
        }

        let prg_chunks = data[4];
        let chr_chunks = data[5];
        let flags1 = data[6];
        let flags2 = data[7];
        let prg_ram = data[8];

        let mapper_id = (flags2 & 0xF0) | (flags1 >> 4);
        let hardware_mirroring = if flags1 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        // NES 2.0 keeps high bank-count bits in byte 8.
        let nes2 = flags2 & 0x0C == 0x08;
        let (prg_banks, chr_banks) = if nes2 {
            (
                (u16::from(prg_ram & 0x07) << 8) | u16::from(prg_chunks),
                (u16::from(prg_ram & 0x38) << 5) | u16::from(chr_chunks),
            )
        } else {
            (u16::from(prg_chunks), u16::from(chr_chunks))
        };

        let mut offset = 16;
        if flags1 & 0x04 != 0 {
            offset += 512; // trainer, ignored
        }

        let prg_len = usize::from(prg_banks) * PRG_BANK_SIZE;
        if data.len() < offset + prg_len {
            return Err(format!(
                "iNES image truncated: PRG needs {} bytes past offset {}",
                prg_len, offset
            ));
        }
        let prg = data[offset..offset + prg_len].to_vec();
        offset += prg_len;

        let chr = if chr_banks == 0 {
            // CHR-RAM board: 8K of writable pattern memory.
            vec![0u8; CHR_BANK_SIZE]
        } else {
            let chr_len = usize::from(chr_banks) * CHR_BANK_SIZE;
            if data.len() < offset + chr_len {
                return Err(format!(
                    "iNES image truncated: CHR needs {} bytes past offset {}",
                    chr_len, offset
                ));
            }
            data[offset..offset + chr_len].to_vec()
        };

        let mapper = Mapper::new(mapper_id, prg_banks, chr_banks)?;

        Ok(Self {
            prg_banks,
            chr_banks,
            prg,
            chr,
            mapper,
            hardware_mirroring,
        })
    }

    /// CPU-space read. `None` when the address is not cartridge territory.
    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        match self.mapper.cpu_map_read(addr) {
            MapResult::Offset(offset) => Some(self.prg[offset % self.prg.len()]),
            MapResult::Claimed => Some(0),
            MapResult::Pass => None,
        }
    }

    /// CPU-space write. True when the cartridge consumed it.
    pub fn cpu_write(&mut self, addr: u16, value: u8) -> bool {
        match self.mapper.cpu_map_write(addr, value) {
            MapResult::Offset(offset) => {
                let len = self.prg.len();
                self.prg[offset % len] = value;
                true
            }
            MapResult::Claimed => true,
            MapResult::Pass => false,
        }
    }

    /// PPU-space read (pattern memory).
    pub fn ppu_read(&self, addr: u16) -> Option<u8> {
        match self.mapper.ppu_map_read(addr) {
            MapResult::Offset(offset) => Some(self.chr[offset % self.chr.len()]),
            MapResult::Claimed => Some(0),
            MapResult::Pass => None,
        }
    }

    /// PPU-space write (CHR-RAM only).
    pub fn ppu_write(&mut self, addr: u16, value: u8) -> bool {
        match self.mapper.ppu_map_write(addr) {
            MapResult::Offset(offset) => {
                let len = self.chr.len();
                self.chr[offset % len] = value;
                true
            }
            MapResult::Claimed => true,
            MapResult::Pass => false,
        }
    }

    /// Effective nametable mirroring: the mapper's latched mode when it
    /// has one, else the solder-pad wiring from the header.
    #[must_use]
    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring().unwrap_or(self.hardware_mirroring)
    }

    /// Reset mapper banking. ROM contents are untouched.
    pub fn reset(&mut self) {
        self.mapper.reset();
    }

    /// PRG bank count (16 KiB units).
    #[must_use]
    pub fn prg_banks(&self) -> u16 {
        self.prg_banks
    }

    /// CHR bank count (8 KiB units); 0 means CHR-RAM.
    #[must_use]
    pub fn chr_banks(&self) -> u16 {
        self.chr_banks
    }
}
