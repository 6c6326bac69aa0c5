use num_traits::Float;

/// Separation `coord2 - coord1` under the minimum image convention of an
/// orthorhombic box; non-positive edges are not periodic
pub fn minimum_image(coord1: &[f64; 3], coord2: &[f64; 3], box_lengths: &[f64; 3]) -> [f64; 3] {
    let mut d = [0.0; 3];
    for k in 0..3 {
        d[k] = coord2[k] - coord1[k];
        if box_lengths[k] > 0.0 {
            d[k] -= box_lengths[k] * (d[k] / box_lengths[k]).round();
        }
    }
    d
}

/// Squared distance under the minimum image convention of an orthorhombic box
pub fn minimum_image_distance_squared(
    coord1: &[f64; 3],
    coord2: &[f64; 3],
    box_lengths: &[f64; 3],
) -> f64 {
    minimum_image(coord1, coord2, box_lengths)
        .iter()
        .map(|d| d * d)
        .sum()
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean<T: Float>(values: &[T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    let n = T::from(values.len())?;
    Some(values.iter().fold(T::zero(), |acc, &v| acc + v) / n)
}

/// Standard error of the mean from the sample variance; zero below two values
pub fn standard_error<T: Float>(values: &[T]) -> T {
    let m = match mean(values) {
        Some(m) if values.len() > 1 => m,
        _ => return T::zero(),
    };
    let n = T::from(values.len()).unwrap_or_else(T::one);
    let variance = values
        .iter()
        .fold(T::zero(), |acc, &v| acc + (v - m) * (v - m))
        / (n - T::one());
    (variance / n).sqrt()
}

/// Trapezoidal integral of evenly spaced samples.
///
/// ```rust
/// use mdflow::utils::trapezoid;
///
/// assert_eq!(trapezoid(&[1.0, 1.0, 1.0], 0.5), 1.0);
/// assert_eq!(trapezoid(&[0.0, 1.0, 2.0], 1.0), 2.0);
/// ```
pub fn trapezoid<T: Float>(values: &[T], dx: T) -> T {
    let two = T::one() + T::one();
    values
        .windows(2)
        .fold(T::zero(), |acc, pair| acc + (pair[0] + pair[1]) / two * dx)
}

/// Least-squares straight line through `(x, y)`, returned as `(slope, intercept)`
pub fn linear_fit<T: Float>(x: &[T], y: &[T]) -> Option<(T, T)> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let (sxy, sxx) = x
        .iter()
        .zip(y.iter())
        .fold((T::zero(), T::zero()), |(sxy, sxx), (&xi, &yi)| {
            (sxy + (xi - mx) * (yi - my), sxx + (xi - mx) * (xi - mx))
        });
    if sxx == T::zero() {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, my - slope * mx))
}

/// Largest divisor of `n` not above `limit` (at least 1).
///
/// ```rust
/// use mdflow::utils::largest_divisor_at_most;
///
/// assert_eq!(largest_divisor_at_most(1000, 130), 125);
/// assert_eq!(largest_divisor_at_most(997, 500), 1);
/// assert_eq!(largest_divisor_at_most(12, 20), 12);
/// ```
pub fn largest_divisor_at_most(n: usize, limit: usize) -> usize {
    let mut best = 1;
    let mut i = 1;
    while i * i <= n {
        if n % i == 0 {
            for d in [i, n / i] {
                if d <= limit && d > best {
                    best = d;
                }
            }
        }
        i += 1;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics() {
        assert_eq!(mean::<f64>(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(standard_error(&[5.0]), 0.0);
        // sample variance 1, n = 3
        let se = standard_error(&[1.0f64, 2.0, 3.0]);
        assert!((se - (1.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn fits_lines() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0];
        let (slope, intercept) = linear_fit(&x, &y).unwrap();
        assert!((slope - 2.0f64).abs() < 1e-12);
        assert!((intercept - 1.0f64).abs() < 1e-12);
        assert_eq!(linear_fit(&[1.0, 1.0], &[0.0, 2.0]), None);
        assert_eq!(linear_fit(&[1.0], &[0.0]), None);
    }

    #[test]
    fn minimum_image_wraps() {
        let l = [10.0, 10.0, 10.0];
        let d2 = minimum_image_distance_squared(&[0.5, 0.0, 0.0], &[9.5, 0.0, 0.0], &l);
        assert!((d2 - 1.0).abs() < 1e-12);
        let d2 = minimum_image_distance_squared(&[1.0, 2.0, 0.0], &[2.0, 4.0, 2.0], &l);
        assert!((d2 - 9.0).abs() < 1e-12);
        let d = minimum_image(&[0.5, 9.0, 0.0], &[9.5, 1.0, 3.0], &l);
        assert!((d[0] + 1.0).abs() < 1e-12 && (d[1] - 2.0).abs() < 1e-12 && d[2] == 3.0);
    }
}
