//! The TMS1100 interpreter.
//!
//! One `step` is one instruction: fetch from ROM at `(CA, PA, PC)`,
//! advance PC within the page, capture the status flag, force it true,
//! then execute. Status-producing opcodes overwrite S with their result;
//! BR and CALL test the captured value from the instruction before. This
//! one-instruction status pipeline is how the silicon sequences
//! compare-then-branch.

use super::decode::{decode, Op};
use super::ram::Ram;
use super::state::{CpuState, InputK, OutputO, OutputR};
use crate::rom::{Rom, RomError};
use std::sync::Arc;
use thiserror::Error;

/// R lines above this Y value are not wired on the Merlin board, so SETR
/// and RSTR ignore them. Other TMS1100 devices wire more; see
/// [`Tms1100::set_r_line_limit`].
pub const MERLIN_R_LINE_LIMIT: u8 = 10;

/// A TMS1100 core: CPU state, data RAM, and a shared program ROM.
pub struct Tms1100 {
    /// Registers and I/O hooks.
    pub state: CpuState,
    /// The 128-nibble data RAM.
    pub ram: Ram,
    rom: Arc<Rom>,
    r_line_limit: u8,
    cycles: u64,
    last_op: Option<Op>,
}

impl Tms1100 {
    /// Build a CPU around a loaded ROM, in power-up state.
    pub fn new(rom: Arc<Rom>) -> Self {
        Self {
            state: CpuState::new(),
            ram: Ram::new(),
            rom,
            r_line_limit: MERLIN_R_LINE_LIMIT,
            cycles: 0,
            last_op: None,
        }
    }

    /// Register the R-line output hook.
    pub fn on_output_r(&mut self, hook: OutputR) {
        self.state.on_output_r(hook);
    }

    /// Register the O-register output hook.
    pub fn on_output_o(&mut self, hook: OutputO) {
        self.state.on_output_o(hook);
    }

    /// Register the K-input hook.
    pub fn on_input_k(&mut self, hook: InputK) {
        self.state.on_input_k(hook);
    }

    /// Raise the SETR/RSTR Y bound for TMS1100 devices that wire more
    /// than Merlin's eleven R lines.
    pub fn set_r_line_limit(&mut self, limit: u8) {
        self.r_line_limit = limit;
    }

    /// Instructions executed since power-up.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// The most recently executed operation.
    pub fn last_op(&self) -> Option<Op> {
        self.last_op
    }

    /// The program ROM this core fetches from.
    pub fn rom(&self) -> &Arc<Rom> {
        &self.rom
    }

    /// Execute one instruction.
    pub fn step(&mut self) -> Result<Op, CpuError> {
        let opcode = self.rom.read(self.state.regs.fetch_addr())?;
        self.state.regs.increment_pc();

        let last_status = self.state.regs.s();
        self.state.regs.set_s(true);

        let op = decode(opcode);
        self.exec(op, last_status);

        self.cycles += 1;
        self.last_op = Some(op);
        Ok(op)
    }

    fn exec(&mut self, op: Op, last_status: bool) {
        let regs = &mut self.state.regs;
        match op {
            // ==================== Transfers ====================
            Op::Tay => regs.set_y(regs.a()),
            Op::Tya => regs.set_a(regs.y()),
            Op::Cla => regs.set_a(0),

            Op::Tam => self.write_ram(self.state.regs.a()),
            Op::Tamiyc => {
                self.write_ram(self.state.regs.a());
                let regs = &mut self.state.regs;
                regs.set_s(regs.y() == 0x0F);
                regs.inc_y();
            }
            Op::Tamdyn => {
                self.write_ram(self.state.regs.a());
                let regs = &mut self.state.regs;
                regs.set_s(regs.y() >= 1);
                regs.dec_y();
            }
            Op::Tamza => {
                self.write_ram(self.state.regs.a());
                self.state.regs.set_a(0);
            }
            Op::Tmy => {
                let m = self.read_ram();
                self.state.regs.set_y(m);
            }
            Op::Tma => {
                let m = self.read_ram();
                self.state.regs.set_a(m);
            }
            Op::Xma => {
                let m = self.read_ram();
                self.write_ram(self.state.regs.a());
                self.state.regs.set_a(m);
            }

            // ==================== Arithmetic ====================
            Op::Amaac => {
                let m = self.read_ram();
                self.add_to_a(m);
            }
            Op::Saman => {
                let m = self.read_ram();
                let regs = &mut self.state.regs;
                let sum = (!regs.a() & 0x0F) + m + 1;
                regs.set_s(sum > 0x0F);
                regs.set_a(sum);
            }
            Op::Imac => {
                let m = self.read_ram();
                self.state.regs.set_a(m);
                self.add_to_a(1);
            }
            Op::Dman => {
                let m = self.read_ram();
                self.state.regs.set_a(m);
                self.add_to_a(0x0F);
            }
            Op::Iyc => self.add_to_y(1),
            Op::Dyn => self.add_to_y(0x0F),
            Op::Cpaiz => {
                let sum = (!regs.a() & 0x0F) + 1;
                regs.set_s(sum > 0x0F);
                regs.set_a(sum);
            }
            Op::Aaac(k) => self.add_to_a(k),

            // ==================== Compares ====================
            Op::Alem => {
                let m = self.read_ram();
                let regs = &mut self.state.regs;
                regs.set_s((!regs.a() & 0x0F) + m + 1 > 0x0F);
            }
            Op::Mnea => {
                let m = self.read_ram();
                let regs = &mut self.state.regs;
                regs.set_s(m != regs.a());
            }
            Op::Mnez => {
                let m = self.read_ram();
                self.state.regs.set_s(m != 0);
            }
            Op::Ynea => {
                regs.set_s(regs.a() != regs.y());
                regs.set_sl(regs.s());
            }
            Op::Ynec(k) => regs.set_s(regs.y() != k),

            // ==================== Constant loads ====================
            Op::Ldp(k) => regs.set_pb(k),
            Op::Tcy(k) => regs.set_y(k),
            Op::Tcmiy(k) => {
                self.write_ram(k);
                self.state.regs.inc_y();
            }
            Op::Ldx(k) => regs.set_x(k),

            // ==================== RAM bits ====================
            Op::Sbit(b) => {
                let m = self.read_ram();
                self.write_ram(m | 1 << b);
            }
            Op::Rbit(b) => {
                let m = self.read_ram();
                self.write_ram(m & !(1 << b));
            }
            Op::Tbit1(b) => {
                let m = self.read_ram();
                self.state.regs.set_s(m & (1 << b) != 0);
            }
            Op::Comx => regs.com_x(),
            Op::Comc => regs.com_cb(),

            // ==================== Input ====================
            Op::Knez => {
                let k = self.state.read_k();
                self.state.regs.set_s(k != 0);
            }
            Op::Tka => {
                let k = self.state.read_k();
                self.state.regs.set_a(k);
            }

            // ==================== Output ====================
            Op::Setr => self.write_r_line(true),
            Op::Rstr => self.write_r_line(false),
            Op::Tdo => {
                let value = regs.a() | if regs.sl() { 0x10 } else { 0 };
                self.state.write_o(value);
            }

            // ==================== ROM addressing ====================
            Op::Br(target) => {
                if last_status {
                    regs.set_ca(regs.cb());
                    regs.set_pc(target);
                    if !regs.cl() {
                        regs.set_pa(regs.pb());
                    }
                }
            }
            Op::Call(target) => {
                if last_status {
                    if regs.cl() {
                        // The call latch is already set: no second frame,
                        // the call degenerates into a branch.
                        regs.set_pb(regs.pa());
                    } else {
                        regs.set_cs(regs.ca());
                        regs.set_sr(regs.pc());
                        let pa = regs.pa();
                        regs.set_pa(regs.pb());
                        regs.set_pb(pa);
                        regs.set_cl(true);
                    }
                    regs.set_ca(regs.cb());
                    regs.set_pc(target);
                }
            }
            Op::Retn => {
                regs.set_pa(regs.pb());
                if regs.cl() {
                    regs.set_ca(regs.cs());
                    regs.set_pc(regs.sr());
                    regs.set_cl(false);
                }
            }
        }
    }

    #[inline]
    fn read_ram(&self) -> u8 {
        self.ram.read(self.state.regs.x(), self.state.regs.y())
    }

    #[inline]
    fn write_ram(&mut self, value: u8) {
        self.ram
            .write(self.state.regs.x(), self.state.regs.y(), value);
    }

    /// 4-bit add into A with carry-out landing in S.
    fn add_to_a(&mut self, operand: u8) {
        let regs = &mut self.state.regs;
        let sum = regs.a() + operand;
        regs.set_s(sum > 0x0F);
        regs.set_a(sum);
    }

    /// 4-bit add into Y with carry-out landing in S.
    fn add_to_y(&mut self, operand: u8) {
        let regs = &mut self.state.regs;
        let sum = regs.y() + operand;
        regs.set_s(sum > 0x0F);
        regs.set_y(sum);
    }

    /// SETR/RSTR: Y addresses the R line, gated by the board wiring.
    fn write_r_line(&mut self, on: bool) {
        let x = self.state.regs.x();
        let y = self.state.regs.y();
        if x <= 3 && y <= self.r_line_limit {
            self.state.write_r(y as usize, on);
        }
    }
}

impl std::fmt::Debug for Tms1100 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tms1100")
            .field("cycles", &self.cycles)
            .field("last_op", &self.last_op)
            .field("state", &self.state)
            .finish()
    }
}

/// Errors that abort a `step`.
#[derive(Debug, Clone, Error)]
pub enum CpuError {
    #[error("ROM error: {0}")]
    Rom(#[from] RomError),
}
