//! Console configuration.

/// Everything [`crate::Nes::new`] needs to build a console.
pub struct NesConfig {
    /// iNES file contents.
    pub rom_data: Vec<u8>,
}
