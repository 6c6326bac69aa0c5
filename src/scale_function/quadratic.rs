use super::ScaleFunctionTrait;

/// Quadratic cost, e.g. all-pairs distance computations
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quadratic {
    scale_factor: f64,
}
impl Quadratic {
    pub fn new(scale_factor: f64) -> Self {
        Self { scale_factor }
    }
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }
}
impl ScaleFunctionTrait for Quadratic {
    fn scale(&self, raw: f64) -> f64 {
        raw * raw * self.scale_factor
    }
}
