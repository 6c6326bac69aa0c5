use super::ScaleFunctionTrait;

/// Linearithmic cost, `raw * ln(raw)`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogLinear {
    scale_factor: f64,
}
impl LogLinear {
    pub fn new(scale_factor: f64) -> Self {
        Self { scale_factor }
    }
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }
}
impl ScaleFunctionTrait for LogLinear {
    fn scale(&self, raw: f64) -> f64 {
        // linear up to e, where both branches equal e
        if raw <= std::f64::consts::E {
            raw * self.scale_factor
        } else {
            raw * raw.ln() * self.scale_factor
        }
    }
}
