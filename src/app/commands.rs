//! Inbound commands decoded from control-channel messages.
//!
//! Produced by the [`CommandRouter`](super::router::CommandRouter) and
//! consumed immediately by the control loop, which applies them through
//! the [`OutputPort`](super::ports::OutputPort).

/// Brightness level of the dimmable indicator, guaranteed to be in `0..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BrightnessLevel(u8);

impl BrightnessLevel {
    /// Highest accepted level.
    pub const MAX: u8 = 5;
    /// Number of levels (size of the brightness table).
    pub const COUNT: usize = Self::MAX as usize + 1;

    /// Returns `None` when `n` is outside `0..=5`.
    pub fn new(n: i32) -> Option<Self> {
        if (0..=i32::from(Self::MAX)).contains(&n) {
            Some(Self(n as u8))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// Commands that the control channels can send into the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Drive the on/off indicator.
    SetSwitch(bool),
    /// Drive the dimmable indicator to a table level.
    SetBrightnessLevel(BrightnessLevel),
}
