/// Key events as seen by processors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    /// Printable input.
    Char(char),
    Space,
    Enter,
    Backspace,
    Escape,
    /// Any other key, by host keycode.
    Other(u32),
}

impl KeyEvent {
    /// Keys that cancel or delete: they suppress the next prediction.
    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Backspace | Self::Escape)
    }
}

/// Outcome of offering a key to a processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    /// The processor consumed the key; later processors do not see it.
    Accepted,
    /// Not handled here; continue down the chain.
    Noop,
}
