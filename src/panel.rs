//! The Merlin front-panel wiring shared by the hosts.
//!
//! Merlin's eleven playfield buttons and four control buttons sit on a
//! keyboard matrix the firmware scans by strobing rows through the O
//! register and reading columns back on K. The speaker hangs off R/O and
//! the playfield LEDs off the R lines; those stay in the hosts.

/// Playfield LEDs: the `~` button, digits 1-9, and 0.
pub const LED_COUNT: usize = 11;

/// The firmware reads a pressed key repeatedly for debouncing; a single
/// host keystroke answers this many K polls before it releases.
pub const KEY_HOLD_READS: u32 = 32;

/// Map a host key to its K nibble for the row currently strobed on O.
///
/// Rows: O=0 scans `~ 1 2 3`, O=4 scans `4 5 6 7`, O=8 scans `8 9 0` and
/// Same Game, O=12 scans Computer Turn / New Game / Hit Me.
pub fn key_nibble(o: u8, key: char) -> u8 {
    match (o, key) {
        (0, '~') => 1,
        (0, '1') => 2,
        (0, '2') => 8,
        (0, '3') => 4,
        (4, '4') => 1,
        (4, '5') => 2,
        (4, '6') => 8,
        (4, '7') => 4,
        (8, '8') => 1,
        (8, '9') => 2,
        (8, '0') => 8,
        (8, 's') => 4,
        (12, 'c') => 2,
        (12, 'n') => 8,
        (12, 'h') => 4,
        _ => 0,
    }
}

/// One-shot debounced key source for the K hook.
///
/// Host keyboards deliver single keystrokes, not levels, so a press is
/// held down for [`KEY_HOLD_READS`] matching K polls and then released.
#[derive(Debug, Default)]
pub struct KeyMatrix {
    pressed: Option<char>,
    reads_left: u32,
}

impl KeyMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Press a panel key.
    pub fn press(&mut self, key: char) {
        self.pressed = Some(key);
        self.reads_left = KEY_HOLD_READS;
    }

    /// Answer one K poll for the row strobed on `o`.
    pub fn poll(&mut self, o: u8) -> u8 {
        let nibble = match self.pressed {
            Some(key) => key_nibble(o, key),
            None => 0,
        };
        if nibble > 0 {
            self.reads_left = self.reads_left.saturating_sub(1);
            if self.reads_left == 0 {
                self.pressed = None;
            }
        }
        nibble
    }

    /// Is a key currently held?
    pub fn held(&self) -> bool {
        self.pressed.is_some()
    }
}
