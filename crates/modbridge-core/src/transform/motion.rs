// Modbridge Transform Layer - Motion Scaling
// Fractional relative-motion scaling without drift

/// Running remainder for one axis.
///
/// Each step adds the scaled delta, emits the nearest integer and keeps the
/// leftover, so the emitted total never strays more than half a unit from
/// the exact scaled total.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisAccumulator {
    remainder: f64,
}

impl AxisAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&mut self, raw: i32, scale: f64) -> i32 {
        self.remainder += f64::from(raw) * scale;
        let rounded = self.remainder.round();
        self.remainder -= rounded;
        rounded as i32
    }

    pub fn remainder(&self) -> f64 {
        self.remainder
    }

    pub fn reset(&mut self) {
        self.remainder = 0.0;
    }
}

/// Scales `REL_X`/`REL_Y` deltas by a fixed factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionScaler {
    scale: f64,
    x: AxisAccumulator,
    y: AxisAccumulator,
}

impl MotionScaler {
    pub fn new(scale: f64) -> Self {
        Self {
            scale,
            x: AxisAccumulator::new(),
            y: AxisAccumulator::new(),
        }
    }

    pub fn scale_x(&mut self, raw: i32) -> i32 {
        self.x.step(raw, self.scale)
    }

    pub fn scale_y(&mut self, raw: i32) -> i32 {
        self.y.step(raw, self.scale)
    }

    /// Drop both remainders (new device instance)
    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn remainders(&self) -> (f64, f64) {
        (self.x.remainder(), self.y.remainder())
    }
}
