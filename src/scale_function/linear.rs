use super::ScaleFunctionTrait;

/// Cost growing linearly with data size
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Linear {
    scale_factor: f64,
}
impl Linear {
    pub fn new(scale_factor: f64) -> Self {
        Self { scale_factor }
    }
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }
}
impl ScaleFunctionTrait for Linear {
    fn scale(&self, raw: f64) -> f64 {
        raw * self.scale_factor
    }
}
