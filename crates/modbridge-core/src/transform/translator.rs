// Modbridge Transform Layer - Event Translator
// Classify each raw event and decide where it goes

use super::motion::MotionScaler;
use super::remap::RemapRule;
use crate::event::codes::{EV_KEY, EV_MSC, EV_REL, EV_SYN, MSC_SCAN, REL_X, REL_Y};
use crate::event::RawEvent;

/// Destination decided for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Write to the virtual pointer
    Pointer(RawEvent),
    /// Enqueue for the virtual keyboard
    Keyboard(RawEvent),
    /// Frame boundary needed by both outputs
    Both(RawEvent),
}

impl Route {
    pub fn event(&self) -> RawEvent {
        match *self {
            Route::Pointer(event) | Route::Keyboard(event) | Route::Both(event) => event,
        }
    }

    pub fn reaches_pointer(&self) -> bool {
        matches!(self, Route::Pointer(_) | Route::Both(_))
    }

    pub fn reaches_keyboard(&self) -> bool {
        matches!(self, Route::Keyboard(_) | Route::Both(_))
    }
}

/// Routing rules for pointer events. Keyboard events bypass translation.
///
/// The only state is the motion remainder, owned by the pointer side and
/// cleared with `reset` when the pointer reconnects.
#[derive(Debug, Clone)]
pub struct EventTranslator {
    motion: MotionScaler,
}

impl EventTranslator {
    pub fn new(motion_scale: f64) -> Self {
        Self {
            motion: MotionScaler::new(motion_scale),
        }
    }

    /// Rules, first match wins:
    /// remapped button, scaled axis, remapped scan, sync, anything else.
    pub fn translate_pointer(&mut self, event: RawEvent) -> Route {
        match event.event_type {
            EV_KEY => match RemapRule::modifier_for(event.code) {
                Some(modifier) => Route::Keyboard(event.with_code(modifier)),
                None => Route::Pointer(event),
            },
            EV_REL if event.code == REL_X => {
                Route::Pointer(event.with_value(self.motion.scale_x(event.value)))
            }
            EV_REL if event.code == REL_Y => {
                Route::Pointer(event.with_value(self.motion.scale_y(event.value)))
            }
            EV_MSC if event.code == MSC_SCAN => match RemapRule::modifier_scan_for(event.value) {
                Some(scan) => Route::Keyboard(event.with_value(scan)),
                None => Route::Pointer(event),
            },
            EV_SYN => Route::Both(event),
            _ => Route::Pointer(event),
        }
    }

    /// Forget the motion remainder
    pub fn reset(&mut self) {
        self.motion.reset();
    }

    pub fn motion(&self) -> &MotionScaler {
        &self.motion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::codes::*;
    use crate::event::EventTime;

    #[test]
    fn test_side_buttons_become_modifiers() {
        let mut translator = EventTranslator::new(1.0);
        for (button, modifier) in [(BTN_SIDE, KEY_LEFTSHIFT), (BTN_EXTRA, KEY_LEFTCTRL)] {
            for value in [KEY_PRESS, KEY_REPEAT, KEY_RELEASE] {
                let route = translator.translate_pointer(RawEvent::key(button, value));
                assert_eq!(route, Route::Keyboard(RawEvent::key(modifier, value)));
            }
        }
    }

    #[test]
    fn test_other_buttons_stay_on_pointer() {
        let mut translator = EventTranslator::new(1.0);
        let event = RawEvent::key(BTN_LEFT, KEY_PRESS);
        assert_eq!(translator.translate_pointer(event), Route::Pointer(event));
    }

    #[test]
    fn test_motion_is_scaled() {
        let mut translator = EventTranslator::new(0.5);
        assert_eq!(
            translator.translate_pointer(RawEvent::rel(REL_X, 3)),
            Route::Pointer(RawEvent::rel(REL_X, 2))
        );
        assert_eq!(
            translator.translate_pointer(RawEvent::rel(REL_X, 3)),
            Route::Pointer(RawEvent::rel(REL_X, 1))
        );
        assert_eq!(
            translator.translate_pointer(RawEvent::rel(REL_Y, -4)),
            Route::Pointer(RawEvent::rel(REL_Y, -2))
        );
    }

    #[test]
    fn test_wheel_is_not_scaled() {
        let mut translator = EventTranslator::new(0.5);
        let wheel = RawEvent::rel(REL_WHEEL, -1);
        assert_eq!(translator.translate_pointer(wheel), Route::Pointer(wheel));
    }

    #[test]
    fn test_scan_codes() {
        let mut translator = EventTranslator::new(1.0);
        assert_eq!(
            translator.translate_pointer(RawEvent::scan(SCAN_BTN_SIDE)),
            Route::Keyboard(RawEvent::scan(SCAN_KEY_SHIFT))
        );
        assert_eq!(
            translator.translate_pointer(RawEvent::scan(SCAN_BTN_EXTRA)),
            Route::Keyboard(RawEvent::scan(SCAN_KEY_CTRL))
        );
        let left = RawEvent::scan(0x90001);
        assert_eq!(translator.translate_pointer(left), Route::Pointer(left));
    }

    #[test]
    fn test_sync_goes_to_both() {
        let mut translator = EventTranslator::new(1.0);
        let route = translator.translate_pointer(RawEvent::sync());
        assert!(route.reaches_pointer());
        assert!(route.reaches_keyboard());
        assert_eq!(route.event(), RawEvent::sync());
    }

    #[test]
    fn test_timestamp_survives_rewrite() {
        let mut translator = EventTranslator::new(1.0);
        let time = EventTime::new(12, 345);
        let route = translator.translate_pointer(RawEvent::key(BTN_SIDE, KEY_PRESS).with_time(time));
        assert_eq!(route.event().time, time);
    }

    #[test]
    fn test_reset_clears_remainder() {
        let mut translator = EventTranslator::new(0.5);
        translator.translate_pointer(RawEvent::rel(REL_X, 1));
        assert_ne!(translator.motion().remainders().0, 0.0);
        translator.reset();
        assert_eq!(translator.motion().remainders(), (0.0, 0.0));
    }
}
