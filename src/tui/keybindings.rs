use crate::tui::action::Action;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Maps KeyEvents to Actions
#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings_list: Vec<KeyBinding>,
    bindings_map: HashMap<KeyPattern, Action>,
}

/// Single keybinding entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: String,
    pub action: Action,
}

/// Pattern for matching key events
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPattern {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let bindings_list = vec![
            // Column list navigation
            KeyBinding::new("Up", Action::MoveUp),
            KeyBinding::new("Down", Action::MoveDown),
            KeyBinding::new("k", Action::MoveUp),
            KeyBinding::new("j", Action::MoveDown),
            // Preview scrolling
            KeyBinding::new("Left", Action::ScrollLeft),
            KeyBinding::new("Right", Action::ScrollRight),
            KeyBinding::new("h", Action::ScrollLeft),
            KeyBinding::new("l", Action::ScrollRight),
            // Column configuration
            KeyBinding::new("Space", Action::ToggleColumn),
            KeyBinding::new("r", Action::RenameColumn),
            KeyBinding::new("K", Action::MoveColumnUp),
            KeyBinding::new("J", Action::MoveColumnDown),
            KeyBinding::new("Shift+Up", Action::MoveColumnUp),
            KeyBinding::new("Shift+Down", Action::MoveColumnDown),
            // Download options
            KeyBinding::new("n", Action::EditTagName),
            KeyBinding::new("v", Action::EditTagValue),
            KeyBinding::new("d", Action::ToggleRemoveDuplicates),
            KeyBinding::new("x", Action::ToggleRemoveEmpty),
            // Files
            KeyBinding::new("o", Action::OpenFile),
            KeyBinding::new("s", Action::Download),
            // Application
            KeyBinding::new("q", Action::Quit),
            KeyBinding::new("Esc", Action::Cancel),
            KeyBinding::new("Enter", Action::Confirm),
        ];

        let bindings_map = Self::build_map(&bindings_list);

        Self {
            bindings_list,
            bindings_map,
        }
    }
}

impl KeyBindings {
    /// Default bindings with user entries layered on top.
    ///
    /// An override replaces every default bound to the same key.
    pub fn with_overrides(overrides: &[KeyBinding]) -> Self {
        let mut bindings_list = Self::default().bindings_list;
        for binding in overrides {
            match KeyPattern::from_string(&binding.key) {
                Ok(pattern) => {
                    bindings_list.retain(|b| {
                        KeyPattern::from_string(&b.key).map_or(true, |p| p != pattern)
                    });
                    bindings_list.push(binding.clone());
                }
                Err(e) => warn!("Ignoring keybinding '{}': {}", binding.key, e),
            }
        }
        let bindings_map = Self::build_map(&bindings_list);
        Self {
            bindings_list,
            bindings_map,
        }
    }

    /// Build hashmap from bindings list
    fn build_map(bindings: &[KeyBinding]) -> HashMap<KeyPattern, Action> {
        bindings
            .iter()
            .filter_map(|b| {
                KeyPattern::from_string(&b.key)
                    .ok()
                    .map(|pattern| (pattern, b.action))
            })
            .collect()
    }

    /// Get action for key event
    pub fn get_action(&self, key: &KeyEvent) -> Option<Action> {
        let pattern = KeyPattern::from_event(key);
        self.bindings_map.get(&pattern).copied()
    }

    /// Get all bindings for an action (for help display)
    pub fn get_keys_for_action(&self, action: Action) -> Vec<String> {
        self.bindings_list
            .iter()
            .filter(|b| b.action == action)
            .map(|b| b.key.clone())
            .collect()
    }

    /// "key: label" pairs for the hint line
    pub fn hints(&self, actions: &[Action]) -> String {
        actions
            .iter()
            .filter_map(|action| {
                self.get_keys_for_action(*action)
                    .first()
                    .map(|key| format!("{key}: {}", action.label()))
            })
            .collect::<Vec<_>>()
            .join("  ")
    }

    /// Check for actions that don't have any keybindings
    pub fn get_unbound_actions(&self) -> Vec<(Action, &'static str)> {
        let bound_actions: HashSet<Action> = self.bindings_list.iter().map(|b| b.action).collect();

        Action::all()
            .into_iter()
            .filter(|action| !bound_actions.contains(action))
            .map(|action| (action, action.description()))
            .collect()
    }

    /// Validate bindings and return warnings
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let mut seen_keys: HashMap<String, Action> = HashMap::new();
        for binding in &self.bindings_list {
            if let Some(existing_action) = seen_keys.get(&binding.key) {
                warnings.push(format!(
                    "Duplicate key '{}': bound to both {:?} and {:?}",
                    binding.key, existing_action, binding.action
                ));
            } else {
                seen_keys.insert(binding.key.clone(), binding.action);
            }
        }

        let unbound = self.get_unbound_actions();
        if !unbound.is_empty() {
            warnings.push(format!(
                "{} action(s) have no keybindings: {}",
                unbound.len(),
                unbound
                    .iter()
                    .map(|(action, _)| format!("{:?}", action))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        for binding in &self.bindings_list {
            if KeyPattern::from_string(&binding.key).is_err() {
                warnings.push(format!(
                    "Invalid key pattern '{}' for action {:?}",
                    binding.key, binding.action
                ));
            }
        }

        warnings
    }
}

impl KeyBinding {
    pub fn new(key: &str, action: Action) -> Self {
        Self {
            key: key.to_string(),
            action,
        }
    }
}

impl KeyPattern {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Terminals report `K` as `Char('K')` + SHIFT; patterns store the
    /// lowercase char, so character codes are folded here.
    pub fn from_event(event: &KeyEvent) -> Self {
        let code = match event.code {
            KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
            other => other,
        };
        let mut modifiers = event.modifiers;
        if let KeyCode::Char(c) = event.code {
            if c.is_ascii_uppercase() {
                modifiers |= KeyModifiers::SHIFT;
            }
        }
        Self { code, modifiers }
    }

    /// Parse from string (e.g., "Ctrl+C", "Shift+Up", "K", "Space")
    pub fn from_string(s: &str) -> Result<Self, String> {
        let parts: Vec<&str> = s.split('+').collect();

        let mut modifiers = KeyModifiers::empty();
        let key_part = if parts.len() > 1 {
            for part in &parts[..parts.len() - 1] {
                match part.to_lowercase().as_str() {
                    "ctrl" => modifiers |= KeyModifiers::CONTROL,
                    "alt" => modifiers |= KeyModifiers::ALT,
                    "shift" => modifiers |= KeyModifiers::SHIFT,
                    _ => return Err(format!("Unknown modifier: {}", part)),
                }
            }
            parts[parts.len() - 1]
        } else {
            let mut chars = s.chars();
            if let (Some(ch), None) = (chars.next(), chars.next()) {
                if ch.is_ascii_uppercase() {
                    modifiers |= KeyModifiers::SHIFT;
                }
            }
            parts[0]
        };

        let code = match key_part.to_lowercase().as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdown" | "pgdn" => KeyCode::PageDown,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "tab" => KeyCode::Tab,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "backspace" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "space" => KeyCode::Char(' '),

            // Single characters before the function key check so 'f' stays a char
            k if k.chars().count() == 1 => match k.chars().next() {
                Some(ch) => KeyCode::Char(ch),
                None => return Err(format!("Unknown key: {}", key_part)),
            },

            k if k.starts_with('f') && k.len() <= 3 => match k[1..].parse::<u8>() {
                Ok(n) if (1..=12).contains(&n) => KeyCode::F(n),
                _ => return Err(format!("Invalid function key: {}", k)),
            },

            _ => return Err(format!("Unknown key: {}", key_part)),
        };

        Ok(Self { code, modifiers })
    }
}
