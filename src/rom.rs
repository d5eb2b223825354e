//! Program ROM and PC-sequence de-interleaving.
//!
//! The TMS1100 does not step its program counter with a binary adder: the
//! low six address bits come out of a linear-feedback shift register, so
//! consecutive fetches walk each 64-word page in a fixed scrambled order.
//! A raw fuse-map dump stores words in silicon order. The loader rearranges
//! every page into fetch order once, up front, so the interpreter can use a
//! plain incrementing PC.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Bytes per ROM page (one 6-bit PC worth of words).
pub const PAGE_SIZE: usize = 64;

/// The order in which the PC shift register visits the 64 offsets of a page.
///
/// `PC_SEQUENCE[n]` is the silicon offset of the word fetched n-th.
pub const PC_SEQUENCE: [u8; PAGE_SIZE] = [
    0x00, 0x01, 0x03, 0x07, 0x0F, 0x1F, 0x3F, 0x3E,
    0x3D, 0x3B, 0x37, 0x2F, 0x1E, 0x3C, 0x39, 0x33,
    0x27, 0x0E, 0x1D, 0x3A, 0x35, 0x2B, 0x16, 0x2C,
    0x18, 0x30, 0x21, 0x02, 0x05, 0x0B, 0x17, 0x2E,
    0x1C, 0x38, 0x31, 0x23, 0x06, 0x0D, 0x1B, 0x36,
    0x2D, 0x1A, 0x34, 0x29, 0x12, 0x24, 0x08, 0x11,
    0x22, 0x04, 0x09, 0x13, 0x26, 0x0C, 0x19, 0x32,
    0x25, 0x0A, 0x15, 0x2A, 0x14, 0x28, 0x10, 0x20,
];

/// Inverse of [`PC_SEQUENCE`], built at compile time.
///
/// The sequence is a permutation of 0..64, so the inverse is total.
const INVERSE_SEQUENCE: [u8; PAGE_SIZE] = build_inverse();

const fn build_inverse() -> [u8; PAGE_SIZE] {
    let mut inv = [0u8; PAGE_SIZE];
    let mut n = 0;
    while n < PAGE_SIZE {
        inv[PC_SEQUENCE[n] as usize] = n as u8;
        n += 1;
    }
    inv
}

/// A de-interleaved TMS1100 program ROM.
///
/// Addressed by the 12-bit fetch address `(CA << 10) | (PA << 6) | PC`.
/// Immutable once built; share it between CPU instances with `Arc`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Rom {
    image: Vec<u8>,
}

impl Rom {
    /// Load a raw fuse-map dump from a binary file and de-interleave it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RomError> {
        let raw = std::fs::read(path.as_ref()).map_err(|e| {
            RomError::Open(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_raw(&raw)
    }

    /// De-interleave a raw fuse-map image already in memory.
    ///
    /// For every linear address the stored byte is fetched from the silicon
    /// offset the PC sequence would visit. Branch and call opcodes (top bit
    /// set) carry a 6-bit target in sequence space; their operand field is
    /// rewritten through the inverse sequence so that after the remap the
    /// target is a linear page offset too.
    pub fn from_raw(raw: &[u8]) -> Result<Self, RomError> {
        if raw.is_empty() || raw.len() % PAGE_SIZE != 0 {
            return Err(RomError::Image { len: raw.len() });
        }

        let mut image = vec![0u8; raw.len()];
        for (i, slot) in image.iter_mut().enumerate() {
            let page = i & !(PAGE_SIZE - 1);
            let offset = i & (PAGE_SIZE - 1);
            let mut word = raw[page | PC_SEQUENCE[offset] as usize];

            if word & 0x80 != 0 {
                let target = INVERSE_SEQUENCE[(word & 0x3F) as usize];
                word = (word & 0xC0) | target;
            }
            *slot = word;
        }

        Ok(Self { image })
    }

    /// Read the opcode at a 12-bit fetch address.
    pub fn read(&self, addr: u16) -> Result<u8, RomError> {
        self.image
            .get(addr as usize)
            .copied()
            .ok_or(RomError::OutOfRange {
                addr,
                size: self.image.len(),
            })
    }

    /// ROM size in bytes.
    pub fn size(&self) -> usize {
        self.image.len()
    }
}

impl std::fmt::Debug for Rom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rom")
            .field("size", &self.image.len())
            .field("pages", &(self.image.len() / PAGE_SIZE))
            .finish()
    }
}

/// Errors raised while loading or addressing a ROM.
#[derive(Debug, Clone, Error)]
pub enum RomError {
    #[error("cannot open ROM file: {0}")]
    Open(String),

    #[error("bad ROM image: {len} bytes is not a whole number of 64-byte pages")]
    Image { len: usize },

    #[error("ROM fetch at {addr:#05x} beyond image size {size:#05x}")]
    OutOfRange { addr: u16, size: usize },
}

/// Build a 2 KB ROM whose de-interleaved image contains each segment's
/// ops starting at its linear origin, by placing every byte at the silicon
/// offset the loader will pull it back from. Branch/call targets are
/// pre-mapped through the forward sequence so the loader's inverse rewrite
/// restores them.
#[cfg(test)]
pub(crate) fn rom_from_segments(segments: &[(usize, &[u8])]) -> Rom {
    let mut raw = vec![0u8; 2048];
    for &(origin, ops) in segments {
        for (i, &op) in ops.iter().enumerate() {
            let lin = origin + i;
            let page = lin & !(PAGE_SIZE - 1);
            let offset = lin & (PAGE_SIZE - 1);
            let stored = if op & 0x80 != 0 {
                (op & 0xC0) | PC_SEQUENCE[(op & 0x3F) as usize]
            } else {
                op
            };
            raw[page | PC_SEQUENCE[offset] as usize] = stored;
        }
    }
    Rom::from_raw(&raw).expect("2048-byte image is page-aligned")
}

#[cfg(test)]
pub(crate) fn rom_from_program(origin: usize, ops: &[u8]) -> Rom {
    rom_from_segments(&[(origin, ops)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_a_permutation() {
        let mut seen = [false; PAGE_SIZE];
        for &offset in &PC_SEQUENCE {
            assert!(!seen[offset as usize], "duplicate offset {:#04x}", offset);
            seen[offset as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_inverse_sequence() {
        for n in 0..PAGE_SIZE {
            assert_eq!(INVERSE_SEQUENCE[PC_SEQUENCE[n] as usize] as usize, n);
            assert_eq!(PC_SEQUENCE[INVERSE_SEQUENCE[n] as usize] as usize, n);
        }
    }

    #[test]
    fn test_deinterleave_page() {
        // Fill one page with distinct non-branch bytes and check each
        // linear offset reads back the silicon word the sequence names.
        let mut raw = vec![0u8; PAGE_SIZE];
        for (i, b) in raw.iter_mut().enumerate() {
            *b = i as u8; // 0x00..0x3F, top bit clear
        }
        let rom = Rom::from_raw(&raw).unwrap();
        for offset in 0..PAGE_SIZE {
            assert_eq!(rom.read(offset as u16).unwrap(), PC_SEQUENCE[offset]);
        }
    }

    #[test]
    fn test_deinterleave_is_bijective_per_page() {
        let mut raw = vec![0u8; PAGE_SIZE];
        for (i, b) in raw.iter_mut().enumerate() {
            *b = i as u8;
        }
        let rom = Rom::from_raw(&raw).unwrap();

        // Every raw byte appears exactly once in the linear image.
        let mut seen = [false; PAGE_SIZE];
        for offset in 0..PAGE_SIZE {
            let word = rom.read(offset as u16).unwrap() as usize;
            assert!(!seen[word]);
            seen[word] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_branch_operand_rewrite() {
        // A BR stored at silicon offset SEQ[0] with operand in sequence
        // space must come out at linear 0 with a linear operand.
        let mut raw = vec![0u8; PAGE_SIZE];
        let target = 5usize; // linear target
        raw[PC_SEQUENCE[0] as usize] = 0x80 | PC_SEQUENCE[target];
        let rom = Rom::from_raw(&raw).unwrap();
        assert_eq!(rom.read(0).unwrap(), 0x80 | target as u8);
    }

    #[test]
    fn test_call_keeps_opcode_class() {
        let mut raw = vec![0u8; PAGE_SIZE];
        raw[PC_SEQUENCE[0] as usize] = 0xC0 | PC_SEQUENCE[0x3F];
        let rom = Rom::from_raw(&raw).unwrap();
        let word = rom.read(0).unwrap();
        assert_eq!(word & 0xC0, 0xC0);
        assert_eq!(word & 0x3F, 0x3F);
    }

    #[test]
    fn test_rejects_truncated_image() {
        assert!(matches!(
            Rom::from_raw(&[0u8; 100]),
            Err(RomError::Image { len: 100 })
        ));
        assert!(matches!(Rom::from_raw(&[]), Err(RomError::Image { len: 0 })));
    }

    #[test]
    fn test_read_out_of_range() {
        let rom = Rom::from_raw(&[0u8; PAGE_SIZE]).unwrap();
        assert!(rom.read(63).is_ok());
        assert!(matches!(
            rom.read(64),
            Err(RomError::OutOfRange { addr: 64, size: 64 })
        ));
    }

    #[test]
    fn test_program_helper_roundtrip() {
        let ops = [0x7F, 0x40, 0x27, 0x85, 0xC2];
        let rom = rom_from_program(0, &ops);
        for (i, &op) in ops.iter().enumerate() {
            assert_eq!(rom.read(i as u16).unwrap(), op);
        }
    }
}
