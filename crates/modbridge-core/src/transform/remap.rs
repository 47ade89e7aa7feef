// Modbridge Transform Layer - Remap Table
// Fixed pointer-button to keyboard-modifier mappings

use crate::event::codes::{
    BTN_EXTRA, BTN_SIDE, KEY_LEFTCTRL, KEY_LEFTSHIFT, SCAN_BTN_EXTRA, SCAN_BTN_SIDE,
    SCAN_KEY_CTRL, SCAN_KEY_SHIFT,
};

/// One pointer button rewritten as a keyboard modifier.
///
/// Applies to every transition (press, release, autorepeat); the scan value
/// the pointer reports alongside the button is rewritten in parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemapRule {
    pub button: u16,
    pub modifier: u16,
    pub button_scan: i32,
    pub modifier_scan: i32,
}

/// Side button → left shift, extra button → left control
pub const REMAP_RULES: [RemapRule; 2] = [
    RemapRule {
        button: BTN_SIDE,
        modifier: KEY_LEFTSHIFT,
        button_scan: SCAN_BTN_SIDE,
        modifier_scan: SCAN_KEY_SHIFT,
    },
    RemapRule {
        button: BTN_EXTRA,
        modifier: KEY_LEFTCTRL,
        button_scan: SCAN_BTN_EXTRA,
        modifier_scan: SCAN_KEY_CTRL,
    },
];

impl RemapRule {
    /// Modifier key code for a remapped button, if any
    pub fn modifier_for(button: u16) -> Option<u16> {
        REMAP_RULES
            .iter()
            .find(|rule| rule.button == button)
            .map(|rule| rule.modifier)
    }

    /// Modifier scan value for a remapped button scan value, if any
    pub fn modifier_scan_for(scan: i32) -> Option<i32> {
        REMAP_RULES
            .iter()
            .find(|rule| rule.button_scan == scan)
            .map(|rule| rule.modifier_scan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::codes::BTN_LEFT;

    #[test]
    fn test_button_lookup() {
        assert_eq!(RemapRule::modifier_for(BTN_SIDE), Some(KEY_LEFTSHIFT));
        assert_eq!(RemapRule::modifier_for(BTN_EXTRA), Some(KEY_LEFTCTRL));
        assert_eq!(RemapRule::modifier_for(BTN_LEFT), None);
    }

    #[test]
    fn test_scan_lookup() {
        assert_eq!(RemapRule::modifier_scan_for(0x90004), Some(0x70004));
        assert_eq!(RemapRule::modifier_scan_for(0x90005), Some(0x70005));
        assert_eq!(RemapRule::modifier_scan_for(0x90001), None);
    }
}
