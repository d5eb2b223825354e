//! WebAssembly bindings for the Merlin emulator.
//!
//! The embedding triple maps onto the wrapper's lifecycle: the
//! constructor is `init` (ROM bytes in, hooks wired), `step` is `step`,
//! and the generated `free` is `deinit`. Sound pulses are accumulated as
//! a counter the host drains, since wasm has no monotonic clock of its
//! own.

use crate::panel::{KeyMatrix, LED_COUNT};
use crate::{Rom, Tms1100};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Front-panel state the hooks write and JavaScript reads.
#[derive(Default)]
struct Shared {
    leds: [bool; LED_COUNT],
    keys: KeyMatrix,
    sound_pulses: u32,
}

/// JavaScript-friendly Merlin wrapper.
#[wasm_bindgen]
pub struct WasmMerlin {
    cpu: Tms1100,
    shared: Rc<RefCell<Shared>>,
}

#[wasm_bindgen]
impl WasmMerlin {
    /// Create an emulator from a raw fuse-map ROM dump.
    #[wasm_bindgen(constructor)]
    pub fn new(rom_bytes: &[u8]) -> Result<WasmMerlin, JsError> {
        let rom = Rom::from_raw(rom_bytes).map_err(|e| JsError::new(&format!("{}", e)))?;
        let shared = Rc::new(RefCell::new(Shared::default()));
        let mut cpu = Tms1100::new(Arc::new(rom));

        let leds = Rc::clone(&shared);
        cpu.on_output_r(Box::new(move |index, on| {
            if index < LED_COUNT {
                leds.borrow_mut().leds[index] = on;
            }
        }));

        let sound = Rc::clone(&shared);
        cpu.on_output_o(Box::new(move |value| {
            if value & 0x01 != 0 {
                sound.borrow_mut().sound_pulses += 1;
            }
        }));

        let keys = Rc::clone(&shared);
        cpu.on_input_k(Box::new(move |o| keys.borrow_mut().keys.poll(o)));

        Ok(Self { cpu, shared })
    }

    /// Run `count` instructions.
    #[wasm_bindgen]
    pub fn step(&mut self, count: u32) -> Result<(), JsError> {
        for _ in 0..count {
            self.cpu
                .step()
                .map_err(|e| JsError::new(&format!("{}", e)))?;
        }
        Ok(())
    }

    /// Press a panel key: `~`, `0`-`9`, `s`, `c`, `n`, `h`.
    #[wasm_bindgen]
    pub fn press_key(&mut self, key: &str) {
        if let Some(c) = key.chars().next() {
            self.shared
                .borrow_mut()
                .keys
                .press(c.to_ascii_lowercase());
        }
    }

    /// Current LED levels as 0/1, playfield order.
    #[wasm_bindgen]
    pub fn leds(&self) -> Vec<u8> {
        self.shared.borrow().leds.iter().map(|&on| on as u8).collect()
    }

    /// Sound pulses seen since the last call; the host beeps on > 0.
    #[wasm_bindgen]
    pub fn take_sound_pulses(&mut self) -> u32 {
        std::mem::take(&mut self.shared.borrow_mut().sound_pulses)
    }

    /// Instructions executed since power-up.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles()
    }

    /// Current O latch value.
    #[wasm_bindgen]
    pub fn output_o(&self) -> u8 {
        self.cpu.state.regs.o()
    }

    /// Current program counter within the page.
    #[wasm_bindgen]
    pub fn pc(&self) -> u8 {
        self.cpu.state.regs.pc()
    }

    /// Current page address.
    #[wasm_bindgen]
    pub fn pa(&self) -> u8 {
        self.cpu.state.regs.pa()
    }

    /// The last executed instruction's mnemonic.
    #[wasm_bindgen]
    pub fn last_op(&self) -> String {
        match self.cpu.last_op() {
            Some(op) => op.to_string(),
            None => String::new(),
        }
    }

    /// RAM nibble at a flat index (0-127).
    #[wasm_bindgen]
    pub fn ram_at(&self, index: usize) -> u8 {
        if index < crate::cpu::RAM_SIZE {
            self.cpu.ram.get(index)
        } else {
            0
        }
    }

    /// Registers as JSON.
    #[wasm_bindgen]
    pub fn registers_json(&self) -> String {
        let regs = &self.cpu.state.regs;
        format!(
            r#"{{"a":{},"x":{},"y":{},"s":{},"sl":{},"pc":{},"pa":{},"pb":{},"ca":{},"cl":{},"k":{},"o":{},"cycles":{}}}"#,
            regs.a(),
            regs.x(),
            regs.y(),
            regs.s(),
            regs.sl(),
            regs.pc(),
            regs.pa(),
            regs.pb(),
            regs.ca(),
            regs.cl(),
            regs.k(),
            regs.o(),
            self.cpu.cycles(),
        )
    }
}
