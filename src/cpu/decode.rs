//! Opcode decoder.
//!
//! The TMS1100 has a flat 8-bit opcode space. The upper quarter splits
//! into BR (0x80-0xBF) and CALL (0xC0-0xFF), each carrying a 6-bit page
//! offset; four sixteen-opcode blocks carry a 4-bit constant and three
//! four-opcode blocks a 2-bit constant. The constant fields reach the
//! ALU bit-reversed, so each block goes through a fixed permutation map.
//! Every one of the 256 encodings decodes to an operation.

use serde::{Deserialize, Serialize};

/// 4-bit constants for the LDP/TCY/YNEC/TCMIY blocks, indexed by the low
/// nibble of the opcode (the nibble bit-reversed).
const NIBBLE_CONSTANTS: [u8; 16] = [0, 8, 4, 12, 2, 10, 6, 14, 1, 9, 5, 13, 3, 11, 7, 15];

/// Addends for the 0x70-0x7E accumulator-add block.
const ADD_CONSTANTS: [u8; 15] = [1, 9, 5, 13, 3, 11, 7, 15, 2, 10, 6, 14, 4, 12, 8];

/// 2-bit constants for SBIT/RBIT/TBIT1.
const BIT_CONSTANTS: [u8; 4] = [0, 2, 1, 3];

/// 3-bit constants for LDX.
const X_CONSTANTS: [u8; 8] = [0, 4, 2, 6, 1, 5, 3, 7];

/// A decoded TMS1100 operation, with block constants already pulled
/// through their permutation maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    // Register and memory transfers
    /// Y := A
    Tay,
    /// A := Y
    Tya,
    /// A := 0
    Cla,
    /// RAM[X,Y] := A
    Tam,
    /// RAM[X,Y] := A; S := (Y == 15); Y := Y + 1
    Tamiyc,
    /// RAM[X,Y] := A; S := (Y >= 1); Y := Y - 1
    Tamdyn,
    /// RAM[X,Y] := A; A := 0
    Tamza,
    /// Y := RAM[X,Y]
    Tmy,
    /// A := RAM[X,Y]
    Tma,
    /// swap A and RAM[X,Y]
    Xma,

    // Arithmetic, S := carry out of the 4-bit adder
    /// A := A + RAM[X,Y]
    Amaac,
    /// A := RAM[X,Y] - A (complement-add)
    Saman,
    /// A := RAM[X,Y] + 1
    Imac,
    /// A := RAM[X,Y] - 1 (add 15)
    Dman,
    /// Y := Y + 1
    Iyc,
    /// Y := Y - 1 (add 15)
    Dyn,
    /// A := -A (two's complement of the nibble)
    Cpaiz,
    /// A := A + constant (IAC, DAN and the AnAAC family)
    Aaac(u8),

    // Compares
    /// S := A <= RAM[X,Y]
    Alem,
    /// S := RAM[X,Y] != A
    Mnea,
    /// S := RAM[X,Y] != 0
    Mnez,
    /// S := A != Y; SL := S
    Ynea,
    /// S := Y != constant
    Ynec(u8),

    // Constant loads
    /// PB := constant
    Ldp(u8),
    /// Y := constant
    Tcy(u8),
    /// RAM[X,Y] := constant; Y := Y + 1 (no status)
    Tcmiy(u8),
    /// X := constant
    Ldx(u8),

    // RAM bit operations
    /// RAM[X,Y] |= 1 << bit
    Sbit(u8),
    /// RAM[X,Y] &= !(1 << bit)
    Rbit(u8),
    /// S := RAM[X,Y] bit set
    Tbit1(u8),
    /// X ^= 0b100
    Comx,
    /// CB := !CB
    Comc,

    // Input
    /// S := K != 0 (polls the K hook)
    Knez,
    /// A := K (polls the K hook)
    Tka,

    // Output
    /// R[Y] := 1 when X <= 3 and Y is within the wired lines
    Setr,
    /// R[Y] := 0, same gating
    Rstr,
    /// O := A | SL << 4
    Tdo,

    // ROM addressing
    /// branch within page/chapter when the prior S was set
    Br(u8),
    /// single-level call when the prior S was set
    Call(u8),
    /// return: PA := PB, and when a call is live restore CA/PC
    Retn,
}

/// Decode one opcode byte. Total: every byte maps to an operation.
pub fn decode(opcode: u8) -> Op {
    match opcode {
        0x00 => Op::Mnea,
        0x01 => Op::Alem,
        0x02 => Op::Ynea,
        0x03 => Op::Xma,
        0x04 => Op::Dyn,
        0x05 => Op::Iyc,
        0x06 => Op::Amaac,
        0x07 => Op::Dman,
        0x08 => Op::Tka,
        0x09 => Op::Comx,
        0x0A => Op::Tdo,
        0x0B => Op::Comc,
        0x0C => Op::Rstr,
        0x0D => Op::Setr,
        0x0E => Op::Knez,
        0x0F => Op::Retn,
        0x10..=0x1F => Op::Ldp(NIBBLE_CONSTANTS[(opcode & 0x0F) as usize]),
        0x20 => Op::Tay,
        0x21 => Op::Tma,
        0x22 => Op::Tmy,
        0x23 => Op::Tya,
        0x24 => Op::Tamdyn,
        0x25 => Op::Tamiyc,
        0x26 => Op::Tamza,
        0x27 => Op::Tam,
        0x28..=0x2F => Op::Ldx(X_CONSTANTS[(opcode & 0x07) as usize]),
        0x30..=0x33 => Op::Sbit(BIT_CONSTANTS[(opcode & 0x03) as usize]),
        0x34..=0x37 => Op::Rbit(BIT_CONSTANTS[(opcode & 0x03) as usize]),
        0x38..=0x3B => Op::Tbit1(BIT_CONSTANTS[(opcode & 0x03) as usize]),
        0x3C => Op::Saman,
        0x3D => Op::Cpaiz,
        0x3E => Op::Imac,
        0x3F => Op::Mnez,
        0x40..=0x4F => Op::Tcy(NIBBLE_CONSTANTS[(opcode & 0x0F) as usize]),
        0x50..=0x5F => Op::Ynec(NIBBLE_CONSTANTS[(opcode & 0x0F) as usize]),
        0x60..=0x6F => Op::Tcmiy(NIBBLE_CONSTANTS[(opcode & 0x0F) as usize]),
        0x70..=0x7E => Op::Aaac(ADD_CONSTANTS[(opcode - 0x70) as usize]),
        0x7F => Op::Cla,
        0x80..=0xBF => Op::Br(opcode & 0x3F),
        0xC0..=0xFF => Op::Call(opcode & 0x3F),
    }
}

impl std::fmt::Display for Op {
    /// Datasheet mnemonics, used by the trace and disassembly listings.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Tay => write!(f, "TAY"),
            Op::Tya => write!(f, "TYA"),
            Op::Cla => write!(f, "CLA"),
            Op::Tam => write!(f, "TAM"),
            Op::Tamiyc => write!(f, "TAMIYC"),
            Op::Tamdyn => write!(f, "TAMDYN"),
            Op::Tamza => write!(f, "TAMZA"),
            Op::Tmy => write!(f, "TMY"),
            Op::Tma => write!(f, "TMA"),
            Op::Xma => write!(f, "XMA"),
            Op::Amaac => write!(f, "AMAAC"),
            Op::Saman => write!(f, "SAMAN"),
            Op::Imac => write!(f, "IMAC"),
            Op::Dman => write!(f, "DMAN"),
            Op::Iyc => write!(f, "IYC"),
            Op::Dyn => write!(f, "DYN"),
            Op::Cpaiz => write!(f, "CPAIZ"),
            Op::Aaac(1) => write!(f, "IAC"),
            Op::Aaac(15) => write!(f, "DAN"),
            Op::Aaac(k) => write!(f, "A{}AAC", k),
            Op::Alem => write!(f, "ALEM"),
            Op::Mnea => write!(f, "MNEA"),
            Op::Mnez => write!(f, "MNEZ"),
            Op::Ynea => write!(f, "YNEA"),
            Op::Ynec(k) => write!(f, "YNEC {}", k),
            Op::Ldp(k) => write!(f, "LDP {}", k),
            Op::Tcy(k) => write!(f, "TCY {}", k),
            Op::Tcmiy(k) => write!(f, "TCMIY {}", k),
            Op::Ldx(k) => write!(f, "LDX {}", k),
            Op::Sbit(b) => write!(f, "SBIT {}", b),
            Op::Rbit(b) => write!(f, "RBIT {}", b),
            Op::Tbit1(b) => write!(f, "TBIT1 {}", b),
            Op::Comx => write!(f, "COMX"),
            Op::Comc => write!(f, "COMC"),
            Op::Knez => write!(f, "KNEZ"),
            Op::Tka => write!(f, "TKA"),
            Op::Setr => write!(f, "SETR"),
            Op::Rstr => write!(f, "RSTR"),
            Op::Tdo => write!(f, "TDO"),
            Op::Br(t) => write!(f, "BR {:#04x}", t),
            Op::Call(t) => write!(f, "CALL {:#04x}", t),
            Op::Retn => write!(f, "RETN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_opcodes() {
        assert_eq!(decode(0x00), Op::Mnea);
        assert_eq!(decode(0x03), Op::Xma);
        assert_eq!(decode(0x0F), Op::Retn);
        assert_eq!(decode(0x20), Op::Tay);
        assert_eq!(decode(0x27), Op::Tam);
        assert_eq!(decode(0x3C), Op::Saman);
        assert_eq!(decode(0x3F), Op::Mnez);
        assert_eq!(decode(0x7F), Op::Cla);
    }

    #[test]
    fn test_nibble_constant_blocks() {
        // The constant is the opcode's low nibble bit-reversed.
        assert_eq!(decode(0x10), Op::Ldp(0));
        assert_eq!(decode(0x11), Op::Ldp(8));
        assert_eq!(decode(0x1F), Op::Ldp(15));
        assert_eq!(decode(0x40), Op::Tcy(0));
        assert_eq!(decode(0x48), Op::Tcy(1));
        assert_eq!(decode(0x4F), Op::Tcy(15));
        assert_eq!(decode(0x51), Op::Ynec(8));
        assert_eq!(decode(0x6E), Op::Tcmiy(7));
    }

    #[test]
    fn test_add_block() {
        assert_eq!(decode(0x70), Op::Aaac(1)); // IAC
        assert_eq!(decode(0x71), Op::Aaac(9));
        assert_eq!(decode(0x77), Op::Aaac(15)); // DAN
        assert_eq!(decode(0x7E), Op::Aaac(8));
    }

    #[test]
    fn test_bit_blocks() {
        assert_eq!(decode(0x30), Op::Sbit(0));
        assert_eq!(decode(0x31), Op::Sbit(2));
        assert_eq!(decode(0x32), Op::Sbit(1));
        assert_eq!(decode(0x33), Op::Sbit(3));
        assert_eq!(decode(0x34), Op::Rbit(0));
        assert_eq!(decode(0x3B), Op::Tbit1(3));
    }

    #[test]
    fn test_ldx_block() {
        assert_eq!(decode(0x28), Op::Ldx(0));
        assert_eq!(decode(0x29), Op::Ldx(4));
        assert_eq!(decode(0x2F), Op::Ldx(7));
    }

    #[test]
    fn test_branch_and_call_ranges() {
        assert_eq!(decode(0x80), Op::Br(0));
        assert_eq!(decode(0xBF), Op::Br(0x3F));
        assert_eq!(decode(0xC0), Op::Call(0));
        assert_eq!(decode(0xFF), Op::Call(0x3F));
    }

    #[test]
    fn test_decode_is_total() {
        // Constants always land inside their declared widths.
        for opcode in 0..=0xFFu8 {
            match decode(opcode) {
                Op::Ldp(k) | Op::Tcy(k) | Op::Ynec(k) | Op::Tcmiy(k) | Op::Aaac(k) => {
                    assert!(k < 16)
                }
                Op::Ldx(k) => assert!(k < 8),
                Op::Sbit(b) | Op::Rbit(b) | Op::Tbit1(b) => assert!(b < 4),
                Op::Br(t) | Op::Call(t) => assert!(t < 64),
                _ => {}
            }
        }
    }

    #[test]
    fn test_mnemonics() {
        // Transfers
        assert_eq!(decode(0x20).to_string(), "TAY");
        assert_eq!(decode(0x23).to_string(), "TYA");
        assert_eq!(decode(0x7F).to_string(), "CLA");
        assert_eq!(decode(0x27).to_string(), "TAM");
        assert_eq!(decode(0x25).to_string(), "TAMIYC");
        assert_eq!(decode(0x24).to_string(), "TAMDYN");
        assert_eq!(decode(0x26).to_string(), "TAMZA");
        assert_eq!(decode(0x22).to_string(), "TMY");
        assert_eq!(decode(0x21).to_string(), "TMA");
        assert_eq!(decode(0x03).to_string(), "XMA");

        // Arithmetic
        assert_eq!(decode(0x06).to_string(), "AMAAC");
        assert_eq!(decode(0x3C).to_string(), "SAMAN");
        assert_eq!(decode(0x3E).to_string(), "IMAC");
        assert_eq!(decode(0x07).to_string(), "DMAN");
        assert_eq!(decode(0x05).to_string(), "IYC");
        assert_eq!(decode(0x04).to_string(), "DYN");
        assert_eq!(decode(0x3D).to_string(), "CPAIZ");
        assert_eq!(decode(0x70).to_string(), "IAC");
        assert_eq!(decode(0x77).to_string(), "DAN");
        assert_eq!(decode(0x71).to_string(), "A9AAC");

        // Compares
        assert_eq!(decode(0x01).to_string(), "ALEM");
        assert_eq!(decode(0x00).to_string(), "MNEA");
        assert_eq!(decode(0x3F).to_string(), "MNEZ");
        assert_eq!(decode(0x02).to_string(), "YNEA");
        assert_eq!(decode(0x51).to_string(), "YNEC 8");

        // Constant loads
        assert_eq!(decode(0x1F).to_string(), "LDP 15");
        assert_eq!(decode(0x48).to_string(), "TCY 1");
        assert_eq!(decode(0x6E).to_string(), "TCMIY 7");
        assert_eq!(decode(0x29).to_string(), "LDX 4");

        // RAM bits
        assert_eq!(decode(0x31).to_string(), "SBIT 2");
        assert_eq!(decode(0x34).to_string(), "RBIT 0");
        assert_eq!(decode(0x3B).to_string(), "TBIT1 3");
        assert_eq!(decode(0x09).to_string(), "COMX");
        assert_eq!(decode(0x0B).to_string(), "COMC");

        // Input and output
        assert_eq!(decode(0x0E).to_string(), "KNEZ");
        assert_eq!(decode(0x08).to_string(), "TKA");
        assert_eq!(decode(0x0D).to_string(), "SETR");
        assert_eq!(decode(0x0C).to_string(), "RSTR");
        assert_eq!(decode(0x0A).to_string(), "TDO");

        // ROM addressing
        assert_eq!(decode(0x95).to_string(), "BR 0x15");
        assert_eq!(decode(0xC1).to_string(), "CALL 0x01");
        assert_eq!(decode(0x0F).to_string(), "RETN");
    }
}
