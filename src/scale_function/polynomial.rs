use super::ScaleFunctionTrait;

/// Cost growing as `raw^degree`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Polynomial {
    degree: f64,
    scale_factor: f64,
}
impl Polynomial {
    pub fn new(degree: f64, scale_factor: f64) -> Self {
        assert!(
            degree >= 1.0,
            "Polynomial degree should be at least 1, found {}",
            degree
        );
        Self {
            degree,
            scale_factor,
        }
    }
    pub fn degree(&self) -> f64 {
        self.degree
    }
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }
}
impl ScaleFunctionTrait for Polynomial {
    fn scale(&self, raw: f64) -> f64 {
        raw.powf(self.degree) * self.scale_factor
    }
}
