//! Merlin console application state.
//!
//! Wires the three CPU hooks to a front-panel model: eleven playfield
//! LEDs on the R lines, a speaker flag on O bit 0, and the keyboard
//! matrix scanned through the O register.

use crate::panel::{KeyMatrix, LED_COUNT};
use crate::{Rom, Tms1100};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long the speaker indicator stays lit after a sound pulse.
const SOUND_DECAY: Duration = Duration::from_millis(50);

/// Front-panel state shared between the CPU hooks and the renderer.
#[derive(Debug, Default)]
pub struct Panel {
    pub leds: [bool; LED_COUNT],
    keys: KeyMatrix,
    sound_since: Option<Instant>,
}

impl Panel {
    /// Is the speaker indicator currently lit?
    pub fn sound_active(&self) -> bool {
        matches!(self.sound_since, Some(t) if t.elapsed() < SOUND_DECAY)
    }
}

/// The Merlin console application.
pub struct ConsoleApp {
    pub cpu: Tms1100,
    pub panel: Rc<RefCell<Panel>>,
    pub should_quit: bool,
    pub status: String,
}

impl ConsoleApp {
    /// Create a console around a loaded ROM, hooks wired.
    pub fn new(rom: Arc<Rom>) -> Self {
        let panel = Rc::new(RefCell::new(Panel::default()));
        let mut cpu = Tms1100::new(rom);

        let leds = Rc::clone(&panel);
        cpu.on_output_r(Box::new(move |index, on| {
            if index < LED_COUNT {
                leds.borrow_mut().leds[index] = on;
            }
        }));

        let sound = Rc::clone(&panel);
        cpu.on_output_o(Box::new(move |value| {
            if value & 0x01 != 0 {
                sound.borrow_mut().sound_since = Some(Instant::now());
            }
        }));

        let keys = Rc::clone(&panel);
        cpu.on_input_k(Box::new(move |o| keys.borrow_mut().keys.poll(o)));

        Self {
            cpu,
            panel,
            should_quit: false,
            status: "Merlin ready. Keys: ~ 0-9 s c n h, q to quit.".into(),
        }
    }

    /// Feed a console keystroke to the keyboard matrix.
    pub fn press(&mut self, key: char) {
        self.panel.borrow_mut().keys.press(key);
    }

    /// Run a batch of CPU steps. Stops the console on a CPU fault.
    pub fn tick(&mut self, steps: usize) {
        for _ in 0..steps {
            if let Err(e) = self.cpu.step() {
                self.status = format!("CPU fault: {}", e);
                self.should_quit = true;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rom::rom_from_program;

    #[test]
    fn test_led_hook_drives_panel() {
        // LDX 0; TCY 0; SETR at the reset vector.
        let rom = Arc::new(rom_from_program(0x3C0, &[0x28, 0x40, 0x0D]));
        let mut app = ConsoleApp::new(rom);
        app.tick(3);
        assert!(app.panel.borrow().leds[0]);
    }

    #[test]
    fn test_pressed_key_reaches_the_accumulator() {
        // O is 0 at power-up, so '~' answers a TKA with 1.
        let rom = Arc::new(rom_from_program(0x3C0, &[0x08]));
        let mut app = ConsoleApp::new(rom);
        app.press('~');
        app.tick(1);
        assert_eq!(app.cpu.state.regs.a(), 1);
        assert!(app.panel.borrow().keys.held());
    }

    #[test]
    fn test_cpu_fault_stops_the_console() {
        // A single-page ROM cannot satisfy the reset vector fetch.
        let rom = Arc::new(Rom::from_raw(&[0u8; 64]).unwrap());
        let mut app = ConsoleApp::new(rom);
        app.tick(1);
        assert!(app.should_quit);
        assert!(app.status.contains("CPU fault"));
    }
}
