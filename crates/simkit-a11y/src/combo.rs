//! Key Combos
//!
//! Canonical identifiers for a key plus its held modifiers. Registration
//! and dispatch both go through [`KeyCombo::encode`], so a shortcut always
//! matches the event that names the same key and modifier set.

use std::fmt;

use serde::{Deserialize, Serialize};
use simkit_dom::Modifiers;

const CTRL: &str = "ctrl+";
const ALT: &str = "alt+";
const SHIFT: &str = "shift+";

/// Canonical combo string, e.g. `"ctrl+shift+s"` or `" "`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCombo(String);

/// Decoded combo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboParts<'a> {
    pub key: &'a str,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl KeyCombo {
    /// Build the combo: modifiers in ctrl, alt, shift order, then the
    /// lowercased key, joined with `+`
    pub fn encode(key: &str, ctrl: bool, alt: bool, shift: bool) -> Self {
        let mut combo = String::with_capacity(key.len() + 16);
        if ctrl { combo.push_str(CTRL); }
        if alt { combo.push_str(ALT); }
        if shift { combo.push_str(SHIFT); }
        combo.push_str(&key.to_lowercase());
        Self(combo)
    }

    /// Encode from an event's modifier state; meta is not part of a combo
    pub fn from_modifiers(key: &str, modifiers: Modifiers) -> Self {
        Self::encode(key, modifiers.ctrl, modifiers.alt, modifiers.shift)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split back into key and modifiers
    pub fn parts(&self) -> ComboParts<'_> {
        let mut rest = self.0.as_str();
        let mut take = |prefix: &str| match rest.strip_prefix(prefix) {
            // A bare "+" key after a modifier is still a key
            Some(tail) if !tail.is_empty() => {
                rest = tail;
                true
            }
            _ => false,
        };
        let ctrl = take(CTRL);
        let alt = take(ALT);
        let shift = take(SHIFT);
        ComboParts { key: rest, ctrl, alt, shift }
    }

    /// Human-readable form for help surfaces, e.g. `Ctrl+Shift+S`
    pub fn display(&self) -> String {
        let parts = self.parts();
        let mut out = Vec::new();
        if parts.ctrl { out.push("Ctrl".to_string()); }
        if parts.alt { out.push("Alt".to_string()); }
        if parts.shift { out.push("Shift".to_string()); }
        out.push(match parts.key {
            " " => "Space".to_string(),
            key if key.chars().count() == 1 => key.to_uppercase(),
            key => key.to_string(),
        });
        out.join("+")
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for KeyCombo {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_orders_modifiers() {
        assert_eq!(KeyCombo::encode("S", true, false, true).as_str(), "ctrl+shift+s");
        assert_eq!(KeyCombo::encode("x", true, true, true).as_str(), "ctrl+alt+shift+x");
        assert_eq!(KeyCombo::encode("Escape", false, false, false).as_str(), "escape");
        assert_eq!(KeyCombo::encode(" ", false, false, false).as_str(), " ");
    }

    #[test]
    fn test_encode_is_case_insensitive() {
        assert_eq!(KeyCombo::encode("R", false, false, false), KeyCombo::encode("r", false, false, false));
        assert_eq!(
            KeyCombo::encode("ArrowRight", false, true, false),
            KeyCombo::encode("arrowright", false, true, false)
        );
    }

    #[test]
    fn test_modifier_sets_distinguish() {
        let plain = KeyCombo::encode("p", false, false, false);
        assert_ne!(plain, KeyCombo::encode("p", true, false, false));
        assert_ne!(plain, KeyCombo::encode("p", false, true, false));
        assert_ne!(plain, KeyCombo::encode("p", false, false, true));
        assert_ne!(KeyCombo::encode("p", true, false, false), KeyCombo::encode("p", false, true, false));
    }

    #[test]
    fn test_from_modifiers_ignores_meta() {
        let mods = Modifiers::NONE.ctrl().meta();
        assert_eq!(KeyCombo::from_modifiers("k", mods), KeyCombo::encode("k", true, false, false));
    }

    #[test]
    fn test_parts() {
        let combo = KeyCombo::encode("Tab", false, false, true);
        assert_eq!(combo.parts(), ComboParts { key: "tab", ctrl: false, alt: false, shift: true });

        let plus = KeyCombo::encode("+", true, false, false);
        assert_eq!(plus.parts(), ComboParts { key: "+", ctrl: true, alt: false, shift: false });

        let bare = KeyCombo::encode("ctrl", false, false, false);
        assert_eq!(bare.parts().key, "ctrl");
        assert!(!bare.parts().ctrl);
    }

    #[test]
    fn test_display() {
        assert_eq!(KeyCombo::encode("s", true, false, true).display(), "Ctrl+Shift+S");
        assert_eq!(KeyCombo::encode(" ", false, false, false).display(), "Space");
        assert_eq!(KeyCombo::encode("Escape", false, false, false).display(), "escape");
    }
}
