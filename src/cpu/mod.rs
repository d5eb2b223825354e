//! CPU emulation for the TMS1100.
//!
//! This module implements the complete core:
//! - a register file with hardware bit widths and the documented power-up
//!   pattern
//! - 128 nibbles of data RAM addressed by (X, Y)
//! - a total 256-entry opcode decode
//! - the fetch/advance/status-capture/execute step, including the
//!   single-level CALL linkage and the three host I/O hooks

pub mod decode;
pub mod execute;
pub mod ram;
pub mod registers;
pub mod state;

pub use decode::{decode, Op};
pub use execute::{CpuError, Tms1100, MERLIN_R_LINE_LIMIT};
pub use ram::{Ram, RAM_SIZE};
pub use registers::{Registers, R_WIDTH};
pub use state::{CpuState, InputK, OutputO, OutputR};
