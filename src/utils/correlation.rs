//! Window kernels shared by the correlation and MSD calculators.
//!
//! Every kernel takes a window laid out as `[atoms, configurations, components]`
//! and measures lags from the first configuration of the window. Results are
//! sums over atoms, so kernels evaluated on disjoint atom subsets add up to the
//! kernel of the union.

use ndarray::{Array1, Array2, ArrayView3, Axis};

/// `Σ_atoms |x(t) - x(0)|²` for every lag `t`
pub fn squared_displacement(window: ArrayView3<f64>) -> Array1<f64> {
    let (_, length, _) = window.dim();
    let mut msd = Array1::zeros(length);
    for atom in window.axis_iter(Axis(0)) {
        let origin = atom.row(0);
        for (t, row) in atom.axis_iter(Axis(0)).enumerate() {
            msd[t] += row
                .iter()
                .zip(origin.iter())
                .map(|(x, x0)| (x - x0) * (x - x0))
                .sum::<f64>();
        }
    }
    msd
}

/// `Σ_atoms a(0) · b(t)` for every lag `t`
pub fn origin_correlation(a: ArrayView3<f64>, b: ArrayView3<f64>) -> Array1<f64> {
    assert_eq!(a.dim(), b.dim(), "Correlated windows should share a shape");
    let (_, length, _) = a.dim();
    let mut correlation = Array1::zeros(length);
    for (atom_a, atom_b) in a.axis_iter(Axis(0)).zip(b.axis_iter(Axis(0))) {
        let origin = atom_a.row(0);
        for (t, row) in atom_b.axis_iter(Axis(0)).enumerate() {
            correlation[t] += origin.dot(&row);
        }
    }
    correlation
}

/// `Σ_atoms (x(t) - x(0))` as a `[configurations, components]` array
pub fn summed_displacement(window: ArrayView3<f64>) -> Array2<f64> {
    let (_, length, components) = window.dim();
    let mut total = Array2::zeros((length, components));
    for atom in window.axis_iter(Axis(0)) {
        let origin = atom.row(0);
        for (t, row) in atom.axis_iter(Axis(0)).enumerate() {
            let mut target = total.row_mut(t);
            target += &row;
            target -= &origin;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use ndarray::Array3;

    use super::*;

    fn ballistic(atoms: usize, length: usize) -> Array3<f64> {
        // atom i moves along x with speed i + 1
        Array3::from_shape_fn((atoms, length, 3), |(i, t, k)| {
            if k == 0 {
                (i + 1) as f64 * t as f64
            } else {
                1.0
            }
        })
    }

    #[test]
    fn msd_of_ballistic_motion() {
        let data = ballistic(2, 4);
        let msd = squared_displacement(data.view());
        // (1 + 4) t²
        assert_eq!(msd.to_vec(), vec![0.0, 5.0, 20.0, 45.0]);
    }

    #[test]
    fn msd_is_additive_over_atoms() {
        let data = ballistic(5, 6);
        let all = squared_displacement(data.view());
        let part = squared_displacement(data.slice(ndarray::s![..2, .., ..]))
            + squared_displacement(data.slice(ndarray::s![2.., .., ..]));
        assert_eq!(all, part);
    }

    #[test]
    fn correlation_of_constant_vectors() {
        let v = Array3::from_elem((3, 5, 3), 2.0);
        let c = origin_correlation(v.view(), v.view());
        assert_eq!(c.to_vec(), vec![36.0; 5]);
    }

    #[test]
    fn displacement_sum() {
        let data = ballistic(2, 3);
        let total = summed_displacement(data.view());
        assert_eq!(total.row(2).to_vec(), vec![6.0, 0.0, 0.0]);
    }
}
