use std::collections::HashSet;

use super::types::{InputEvent, Key, KeyState};

/// Current keyboard state of the window.
#[derive(Debug, Default)]
pub struct InputState {
    pub focused: bool,

    /// Keys currently held.
    pub keys_down: HashSet<Key>,
}

impl InputState {
    /// Applies `ev` to the current state. Returns `true` when a key changed
    /// between held and released; repeats and unmatched releases return `false`.
    pub fn apply_event(&mut self, ev: InputEvent) -> bool {
        match ev {
            InputEvent::Focused(f) => {
                self.focused = f;
                if !f {
                    // Release events are not delivered to an unfocused window.
                    self.keys_down.clear();
                }
                false
            }

            InputEvent::Key { key, state, .. } => match state {
                KeyState::Pressed => self.keys_down.insert(key),
                KeyState::Released => self.keys_down.remove(&key),
            },
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    /// State with `keys` held.
    pub fn with_keys_down(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            focused: true,
            keys_down: keys.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: KeyState, repeat: bool) -> InputEvent {
        InputEvent::Key {
            key,
            state,
            code: 0,
            repeat,
        }
    }

    #[test]
    fn press_and_release_are_transitions_once() {
        let mut state = InputState::default();

        assert!(state.apply_event(key(Key::Escape, KeyState::Pressed, false)));
        assert!(!state.apply_event(key(Key::Escape, KeyState::Pressed, true)));
        assert!(state.key_down(Key::Escape));

        assert!(state.apply_event(key(Key::Escape, KeyState::Released, false)));
        assert!(!state.key_down(Key::Escape));
    }

    #[test]
    fn release_without_press_is_not_a_transition() {
        let mut state = InputState::default();
        assert!(!state.apply_event(key(Key::Space, KeyState::Released, false)));
        assert!(state.keys_down.is_empty());
    }

    #[test]
    fn focus_loss_clears_held_keys() {
        let mut state = InputState::with_keys_down([Key::Escape, Key::W]);

        state.apply_event(InputEvent::Focused(false));
        assert!(!state.focused);
        assert!(state.keys_down.is_empty());
    }

    #[test]
    fn focus_gain_keeps_held_keys() {
        let mut state = InputState::with_keys_down([Key::A]);

        state.apply_event(InputEvent::Focused(true));
        assert!(state.focused);
        assert!(state.key_down(Key::A));
    }
}
