// Modbridge Transform Layer
// Button-to-modifier remapping, motion scaling and output routing

mod motion;
mod remap;
mod translator;

pub use motion::{AxisAccumulator, MotionScaler};
pub use remap::{RemapRule, REMAP_RULES};
pub use translator::{EventTranslator, Route};
