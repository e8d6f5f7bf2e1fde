use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::SelectorEvent;

/// Translate a key press into a selector event. Unbound keys map to `None`.
pub fn map_key(key: KeyEvent) -> Option<SelectorEvent> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    let event = match key.code {
        KeyCode::Char('c') if ctrl => SelectorEvent::Cancel,
        KeyCode::Char('u') if ctrl => SelectorEvent::ClearFilter,
        KeyCode::Char('p') if alt => SelectorEvent::TogglePin,
        KeyCode::Char('p') | KeyCode::Char('k') if ctrl => SelectorEvent::Up,
        KeyCode::Char('n') | KeyCode::Char('j') if ctrl => SelectorEvent::Down,
        // Some terminals send Ctrl+Backspace as Ctrl+H.
        KeyCode::Char('h') if ctrl => SelectorEvent::ClearFilter,
        KeyCode::Backspace if ctrl || alt => SelectorEvent::ClearFilter,
        KeyCode::Backspace => SelectorEvent::Backspace,
        KeyCode::Esc => SelectorEvent::ClearFilter,
        KeyCode::Enter => SelectorEvent::Confirm,
        KeyCode::Up => SelectorEvent::Up,
        KeyCode::Down => SelectorEvent::Down,
        KeyCode::PageUp => SelectorEvent::PageUp,
        KeyCode::PageDown => SelectorEvent::PageDown,
        KeyCode::Char(_) if ctrl || alt => return None,
        KeyCode::Char(c) => SelectorEvent::Insert(c),
        _ => return None,
    };
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Option<SelectorEvent> {
        map_key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn plain_characters_edit_the_query() {
        assert_eq!(key(KeyCode::Char('b'), KeyModifiers::NONE), Some(SelectorEvent::Insert('b')));
        assert_eq!(key(KeyCode::Char('B'), KeyModifiers::SHIFT), Some(SelectorEvent::Insert('B')));
        // `q` is part of a query, not a quit key.
        assert_eq!(key(KeyCode::Char('q'), KeyModifiers::NONE), Some(SelectorEvent::Insert('q')));
        assert_eq!(key(KeyCode::Backspace, KeyModifiers::NONE), Some(SelectorEvent::Backspace));
    }

    #[test]
    fn clear_shortcuts() {
        for (code, modifiers) in [
            (KeyCode::Char('u'), KeyModifiers::CONTROL),
            (KeyCode::Backspace, KeyModifiers::ALT),
            (KeyCode::Backspace, KeyModifiers::CONTROL),
            (KeyCode::Esc, KeyModifiers::NONE),
        ] {
            assert_eq!(key(code, modifiers), Some(SelectorEvent::ClearFilter));
        }
    }

    #[test]
    fn navigation_and_control() {
        assert_eq!(key(KeyCode::Up, KeyModifiers::NONE), Some(SelectorEvent::Up));
        assert_eq!(key(KeyCode::Char('p'), KeyModifiers::CONTROL), Some(SelectorEvent::Up));
        assert_eq!(key(KeyCode::Char('n'), KeyModifiers::CONTROL), Some(SelectorEvent::Down));
        assert_eq!(key(KeyCode::PageDown, KeyModifiers::NONE), Some(SelectorEvent::PageDown));
        assert_eq!(key(KeyCode::Enter, KeyModifiers::NONE), Some(SelectorEvent::Confirm));
        assert_eq!(key(KeyCode::Char('c'), KeyModifiers::CONTROL), Some(SelectorEvent::Cancel));
        assert_eq!(key(KeyCode::Char('p'), KeyModifiers::ALT), Some(SelectorEvent::TogglePin));
    }

    #[test]
    fn unbound_keys_are_ignored() {
        assert_eq!(key(KeyCode::Tab, KeyModifiers::NONE), None);
        assert_eq!(key(KeyCode::Char('z'), KeyModifiers::CONTROL), None);
        assert_eq!(key(KeyCode::F(1), KeyModifiers::NONE), None);
    }
}
