// Modbridge Event Codes
// Subset of linux/input-event-codes.h used by the pipeline

/// Synchronization marker type
pub const EV_SYN: u16 = 0x00;
/// Key and button transitions
pub const EV_KEY: u16 = 0x01;
/// Relative axis motion
pub const EV_REL: u16 = 0x02;
/// Miscellaneous (scan codes)
pub const EV_MSC: u16 = 0x04;

pub const SYN_REPORT: u16 = 0;
pub const SYN_DROPPED: u16 = 3;

pub const REL_X: u16 = 0x00;
pub const REL_Y: u16 = 0x01;
pub const REL_WHEEL: u16 = 0x08;

pub const MSC_SCAN: u16 = 0x04;

pub const KEY_LEFTCTRL: u16 = 29;
pub const KEY_LEFTSHIFT: u16 = 42;

pub const BTN_LEFT: u16 = 0x110;
pub const BTN_RIGHT: u16 = 0x111;
pub const BTN_MIDDLE: u16 = 0x112;
pub const BTN_SIDE: u16 = 0x113;
pub const BTN_EXTRA: u16 = 0x114;

/// HID usage scan values reported alongside the side buttons
pub const SCAN_BTN_SIDE: i32 = 0x90004;
pub const SCAN_BTN_EXTRA: i32 = 0x90005;
/// Scan values forwarded with the remapped modifiers
pub const SCAN_KEY_SHIFT: i32 = 0x70004;
pub const SCAN_KEY_CTRL: i32 = 0x70005;

/// Key transition values carried in `EV_KEY` events
pub const KEY_RELEASE: i32 = 0;
pub const KEY_PRESS: i32 = 1;
pub const KEY_REPEAT: i32 = 2;

/// Human readable name of an event type, for log lines.
pub fn type_name(event_type: u16) -> &'static str {
    match event_type {
        EV_SYN => "EV_SYN",
        EV_KEY => "EV_KEY",
        EV_REL => "EV_REL",
        EV_MSC => "EV_MSC",
        _ => "EV_OTHER",
    }
}
