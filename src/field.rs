use core::fmt;

use faer_core::{Mat, MatMut, MatRef};

use crate::{error::SimError, mesh::Grid, Float};

/// A named, double-buffered array of values over a [`Grid`].
///
/// `current` is the published state. `previous` holds the state before the last
/// published sweep; while a sweep is in flight it is the scratch buffer the new
/// values are written to, and the two are swapped (not copied) when it ends.
#[derive(Clone)]
pub struct Field {
    name: String,
    grid: Grid,
    current: Mat<Float>,
    previous: Mat<Float>,
    sweeps: usize,
}

impl Field {
    /// Evaluates `init(x, y)` at every node (`y == 0` on a 1-D grid).
    pub fn new(name: impl AsRef<str>, grid: &Grid, init: impl Fn(Float, Float) -> Float) -> Self {
        Self::from_index_fn(name, grid, |i, j| {
            let (x, y) = grid.coords(i, j);
            init(x, y)
        })
    }

    /// Evaluates `init(i, j)` at every node index.
    pub fn from_index_fn(
        name: impl AsRef<str>,
        grid: &Grid,
        init: impl Fn(usize, usize) -> Float,
    ) -> Self {
        let (nx, ny) = grid.shape();
        let current = Mat::from_fn(nx, ny, init);
        Self {
            name: name.as_ref().to_string(),
            grid: *grid,
            previous: current.clone(),
            current,
            sweeps: 0,
        }
    }

    pub fn constant(name: impl AsRef<str>, grid: &Grid, value: Float) -> Self {
        Self::from_index_fn(name, grid, |_, _| value)
    }

    /// Takes values in the order [`Field::snapshot`] produces them.
    pub fn from_values(
        name: impl AsRef<str>,
        grid: &Grid,
        values: &[Float],
    ) -> Result<Self, SimError> {
        let (nx, ny) = grid.shape();
        if values.len() != nx * ny {
            return Err(SimError::ShapeMismatch {
                what: format!("initial values of `{}`", name.as_ref()),
                expected: (nx, ny),
                found: (values.len(), 1),
            });
        }
        Ok(Self::from_index_fn(name, grid, |i, j| values[i * ny + j]))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.current.nrows(), self.current.ncols())
    }

    /// Number of sweeps published since construction.
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    pub fn current(&self) -> MatRef<'_, Float> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> MatRef<'_, Float> {
        self.previous.as_ref()
    }

    pub fn get(&self, i: usize, j: usize) -> Float {
        self.current.read(i, j)
    }

    pub fn set(&mut self, i: usize, j: usize, value: Float) {
        self.current.write(i, j, value)
    }

    pub(crate) fn current_mut(&mut self) -> MatMut<'_, Float> {
        self.current.as_mut()
    }

    /// Copies `current` into `previous`.
    pub fn snapshot_previous(&mut self) {
        self.previous.as_mut().clone_from(self.current.as_ref());
    }

    /// Starts a sweep: snapshots, then hands out the published state for reading
    /// and the scratch buffer for writing. Cells the sweep does not touch keep
    /// their current value.
    pub(crate) fn stage(&mut self) -> (MatRef<'_, Float>, MatMut<'_, Float>) {
        self.snapshot_previous();
        (self.current.as_ref(), self.previous.as_mut())
    }

    /// Ends a sweep started with [`Field::stage`].
    pub(crate) fn publish(&mut self) {
        std::mem::swap(&mut self.current, &mut self.previous);
        self.sweeps += 1;
    }

    /// Current values, x-major (`i * ny + j`).
    pub fn snapshot(&self) -> Vec<Float> {
        let (nx, ny) = self.shape();
        let mut out = Vec::with_capacity(nx * ny);
        for i in 0..nx {
            for j in 0..ny {
                out.push(self.current.read(i, j));
            }
        }
        out
    }

    /// Values along x at a fixed y index.
    pub fn row(&self, j: usize) -> Vec<Float> {
        (0..self.current.nrows())
            .map(|i| self.current.read(i, j))
            .collect()
    }

    pub fn l1_norm(&self) -> Float {
        l1_norm(self.current.as_ref())
    }

    pub fn previous_l1_norm(&self) -> Float {
        l1_norm(self.previous.as_ref())
    }

    /// Largest pointwise change made by the last published sweep.
    pub fn max_change(&self) -> Float {
        let (nx, ny) = self.shape();
        let mut max: Float = 0.0;
        for j in 0..ny {
            for i in 0..nx {
                max = max.max((self.current.read(i, j) - self.previous.read(i, j)).abs());
            }
        }
        max
    }

    pub fn min(&self) -> Float {
        self.fold(Float::INFINITY, Float::min)
    }

    pub fn max(&self) -> Float {
        self.fold(Float::NEG_INFINITY, Float::max)
    }

    fn fold(&self, init: Float, f: impl Fn(Float, Float) -> Float) -> Float {
        let (nx, ny) = self.shape();
        let mut acc = init;
        for j in 0..ny {
            for i in 0..nx {
                acc = f(acc, self.current.read(i, j));
            }
        }
        acc
    }

    /// Reports the first NaN/Inf in `current`. Never modifies values.
    pub fn check_finite(&self) -> Result<(), SimError> {
        let (nx, ny) = self.shape();
        for i in 0..nx {
            for j in 0..ny {
                if !self.current.read(i, j).is_finite() {
                    return Err(SimError::NonFinite {
                        field: self.name.clone(),
                        step: self.sweeps,
                        index: (i, j),
                    });
                }
            }
        }
        Ok(())
    }

    pub(crate) fn expect_shape(&self, grid: &Grid) -> Result<(), SimError> {
        if self.shape() != grid.shape() {
            return Err(SimError::ShapeMismatch {
                what: format!("field `{}`", self.name),
                expected: grid.shape(),
                found: self.shape(),
            });
        }
        Ok(())
    }
}

pub(crate) fn l1_norm(m: MatRef<'_, Float>) -> Float {
    let mut sum = 0.0;
    for j in 0..m.ncols() {
        for i in 0..m.nrows() {
            sum += m.read(i, j).abs();
        }
    }
    sum
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("shape", &self.shape())
            .field("sweeps", &self.sweeps)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Dimensionality, Grid};

    fn plane() -> Grid {
        Grid::new(Dimensionality::Two, &[4, 3], &[(0.0, 3.0), (0.0, 2.0)]).unwrap()
    }

    #[test]
    fn initializer_sees_node_coordinates() {
        let field = Field::new("p", &plane(), |x, y| 10.0 * x + y);
        assert_eq!(field.shape(), (4, 3));
        assert_eq!(field.get(2, 1), 21.0);
        assert_eq!(field.snapshot()[2 * 3 + 1], 21.0);
    }

    #[test]
    fn from_values_checks_length() {
        let grid = plane();
        let values: Vec<Float> = (0..12).map(|v| v as Float).collect();
        let field = Field::from_values("u", &grid, &values).unwrap();
        assert_eq!(field.snapshot(), values);
        assert!(matches!(
            Field::from_values("u", &grid, &values[1..]),
            Err(SimError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn stage_then_publish_keeps_untouched_cells() {
        let mut field = Field::from_index_fn("u", &plane(), |i, j| (i + j) as Float);
        {
            let (old, mut new) = field.stage();
            new.write(1, 1, old.read(1, 1) + 100.0);
        }
        field.publish();

        assert_eq!(field.sweeps(), 1);
        assert_eq!(field.get(1, 1), 102.0);
        assert_eq!(field.get(3, 2), 5.0);
        assert_eq!(field.previous().read(1, 1), 2.0);
        assert_eq!(field.max_change(), 100.0);
    }

    #[test]
    fn norms_and_extrema() {
        let field = Field::from_index_fn("u", &plane(), |i, _| i as Float - 1.0);
        assert_eq!(field.l1_norm(), 3.0 * (1.0 + 0.0 + 1.0 + 2.0));
        assert_eq!(field.min(), -1.0);
        assert_eq!(field.max(), 2.0);
    }

    #[test]
    fn check_finite_reports_without_touching() {
        let mut field = Field::constant("u", &plane(), 1.0);
        assert!(field.check_finite().is_ok());
        field.set(2, 0, Float::NAN);
        assert!(matches!(
            field.check_finite(),
            Err(SimError::NonFinite { index: (2, 0), .. })
        ));
        assert!(field.get(2, 0).is_nan());
    }
}
