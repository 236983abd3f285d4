//! Keyboard input decoding.

use crate::cell_ref::Axis;

/// A key the controller reacts to, decoded from `KeyboardEvent.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Tab,
    Delete,
    /// Arrow key as an axis and a step of -1 or +1.
    Arrow(Axis, i64),
    /// Single printable character, lowercased.
    Char(char),
    Other,
}

/// Modifier-key commands. These are checked before anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Copy,
    Cut,
    Paste,
    Save,
    Compile,
}

/// One keydown with its relevant modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    /// Ctrl, or Cmd on macOS.
    pub command: bool,
    pub shift: bool,
    /// Typed into an editable element outside the grid, such as an editor
    /// buffer. Only the save and compile shortcuts apply there.
    pub in_text_field: bool,
}

impl Key {
    #[must_use]
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Enter" => Self::Enter,
            "Escape" | "Esc" => Self::Escape,
            "Tab" => Self::Tab,
            "Delete" => Self::Delete,
            "ArrowUp" => Self::Arrow(Axis::Row, -1),
            "ArrowDown" => Self::Arrow(Axis::Row, 1),
            "ArrowLeft" => Self::Arrow(Axis::Col, -1),
            "ArrowRight" => Self::Arrow(Axis::Col, 1),
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c.to_ascii_lowercase()),
                    _ => Self::Other,
                }
            }
        }
    }
}

impl KeyInput {
    #[must_use]
    pub fn new(key: &str, command: bool, shift: bool) -> Self {
        Self {
            key: Key::from_dom(key),
            command,
            shift,
            in_text_field: false,
        }
    }

    #[must_use]
    pub fn in_text_field(mut self, in_text_field: bool) -> Self {
        self.in_text_field = in_text_field;
        self
    }

    /// The command bound to this key, if a command modifier is held.
    #[must_use]
    pub fn shortcut(&self) -> Option<Shortcut> {
        if !self.command {
            return None;
        }
        match self.key {
            Key::Char('c') => Some(Shortcut::Copy),
            Key::Char('x') => Some(Shortcut::Cut),
            Key::Char('v') => Some(Shortcut::Paste),
            Key::Char('s') => Some(Shortcut::Save),
            Key::Enter => Some(Shortcut::Compile),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("ArrowUp", Key::Arrow(Axis::Row, -1))]
    #[test_case("ArrowDown", Key::Arrow(Axis::Row, 1))]
    #[test_case("ArrowLeft", Key::Arrow(Axis::Col, -1))]
    #[test_case("ArrowRight", Key::Arrow(Axis::Col, 1))]
    #[test_case("Enter", Key::Enter)]
    #[test_case("Esc", Key::Escape)]
    #[test_case("C", Key::Char('c'))]
    #[test_case("é", Key::Char('é'))]
    #[test_case("Shift", Key::Other)]
    #[test_case("", Key::Other)]
    fn test_key_from_dom(dom: &str, expected: Key) {
        assert_eq!(Key::from_dom(dom), expected);
    }

    #[test_case("c", true, Some(Shortcut::Copy))]
    #[test_case("X", true, Some(Shortcut::Cut))]
    #[test_case("v", true, Some(Shortcut::Paste))]
    #[test_case("s", true, Some(Shortcut::Save))]
    #[test_case("Enter", true, Some(Shortcut::Compile))]
    #[test_case("a", true, None)]
    #[test_case("c", false, None)]
    #[test_case("Enter", false, None)]
    fn test_shortcut(dom: &str, command: bool, expected: Option<Shortcut>) {
        assert_eq!(KeyInput::new(dom, command, false).shortcut(), expected);
    }

    #[test]
    fn test_text_field_keeps_shortcut_decoding() {
        let input = KeyInput::new("s", true, false).in_text_field(true);
        assert!(input.in_text_field);
        assert_eq!(input.shortcut(), Some(Shortcut::Save));
        assert!(!KeyInput::new("s", true, false).in_text_field);
    }
}
