use crate::{error::SimError, Float};

/// How finely an axis is sampled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// Number of nodes, both extents included.
    Count(usize),
    /// Target spacing. The node count is rounded up so that `delta` divides the extent.
    Delta(Float),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    X,
    Y,
}

impl Direction {
    pub fn name(self) -> &'static str {
        match self {
            Direction::X => "x",
            Direction::Y => "y",
        }
    }
}

// axis[0] <-> lower
// axis[i] <-> lower + i * delta forall i
// axis[count - 1] <-> upper
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    pub(crate) lower: Float,
    pub(crate) upper: Float,
    pub(crate) delta: Float,
    pub(crate) count: usize,
}

impl Axis {
    pub fn new(lower: Float, upper: Float, resolution: Resolution) -> Result<Self, SimError> {
        Self::build("axis", lower, upper, resolution)
    }

    pub fn from_count(lower: Float, upper: Float, count: usize) -> Result<Self, SimError> {
        Self::new(lower, upper, Resolution::Count(count))
    }

    pub fn from_delta(lower: Float, upper: Float, delta: Float) -> Result<Self, SimError> {
        Self::new(lower, upper, Resolution::Delta(delta))
    }

    fn build(
        name: &'static str,
        lower: Float,
        upper: Float,
        resolution: Resolution,
    ) -> Result<Self, SimError> {
        let invalid = |reason: String| SimError::InvalidGrid { axis: name, reason };

        if !lower.is_finite() || !upper.is_finite() {
            return Err(invalid(format!("non-finite extent [{lower}, {upper}]")));
        }
        if lower >= upper {
            return Err(invalid(format!("degenerate extent [{lower}, {upper}]")));
        }

        let count = match resolution {
            Resolution::Count(count) => count,
            Resolution::Delta(delta) => {
                if delta.is_nan() || delta <= 0.0 {
                    return Err(invalid(format!("spacing must be positive, got {delta}")));
                }
                let steps = (upper - lower) / delta;
                // absorb the rounding of e.g. 2.0 / 0.025
                let steps = if (steps - steps.round()).abs() < 1e-9 {
                    steps.round()
                } else {
                    steps.ceil()
                };
                // a float-to-int cast saturates, so a tiny spacing ends up at usize::MAX
                (steps as usize)
                    .checked_add(1)
                    .ok_or_else(|| invalid(format!("spacing {delta} gives too many nodes")))?
            }
        };
        if count < 2 {
            return Err(invalid(format!("needs at least 2 nodes, got {count}")));
        }

        Ok(Self {
            lower,
            upper,
            delta: (upper - lower) / (count - 1) as Float,
            count,
        })
    }

    fn renamed(self, name: &'static str) -> Result<Self, SimError> {
        Self::build(name, self.lower, self.upper, Resolution::Count(self.count))
    }

    pub fn lower(&self) -> Float {
        self.lower
    }

    pub fn upper(&self) -> Float {
        self.upper
    }

    pub fn delta(&self) -> Float {
        self.delta
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn coord(&self, i: usize) -> Float {
        self.lower + self.delta * i as Float
    }

    pub fn iter(self) -> impl Iterator<Item = Float> {
        (0..self.count).map(move |i| self.coord(i))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimensionality {
    One,
    Two,
}

impl Dimensionality {
    pub fn rank(self) -> usize {
        match self {
            Dimensionality::One => 1,
            Dimensionality::Two => 2,
        }
    }
}

/// Immutable spatial discretization, one or two axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub(crate) x: Axis,
    pub(crate) y: Option<Axis>,
}

impl Grid {
    /// Builds a grid from per-axis node counts and `[min, max]` extents.
    pub fn new(
        dims: Dimensionality,
        counts: &[usize],
        extents: &[(Float, Float)],
    ) -> Result<Self, SimError> {
        let rank = dims.rank();
        if counts.len() != rank || extents.len() != rank {
            return Err(SimError::InvalidGrid {
                axis: "grid",
                reason: format!(
                    "{rank}-D grid needs {rank} counts and extents, got {} and {}",
                    counts.len(),
                    extents.len()
                ),
            });
        }

        let x = Axis::build("x", extents[0].0, extents[0].1, Resolution::Count(counts[0]))?;
        let y = match dims {
            Dimensionality::One => None,
            Dimensionality::Two => Some(Axis::build(
                "y",
                extents[1].0,
                extents[1].1,
                Resolution::Count(counts[1]),
            )?),
        };

        Ok(Self { x, y })
    }

    pub fn line(x: Axis) -> Self {
        Self { x, y: None }
    }

    pub fn plane(x: Axis, y: Axis) -> Self {
        Self { x, y: Some(y) }
    }

    /// Re-validates axes built elsewhere, tagging errors with the axis name.
    pub fn from_axes(x: Axis, y: Option<Axis>) -> Result<Self, SimError> {
        Ok(Self {
            x: x.renamed("x")?,
            y: y.map(|y| y.renamed("y")).transpose()?,
        })
    }

    pub fn dims(&self) -> Dimensionality {
        match self.y {
            None => Dimensionality::One,
            Some(_) => Dimensionality::Two,
        }
    }

    pub fn x(&self) -> Axis {
        self.x
    }

    pub fn y(&self) -> Option<Axis> {
        self.y
    }

    pub fn axis(&self, direction: Direction) -> Option<Axis> {
        match direction {
            Direction::X => Some(self.x),
            Direction::Y => self.y,
        }
    }

    pub fn dx(&self) -> Float {
        self.x.delta
    }

    pub fn dy(&self) -> Option<Float> {
        self.y.map(|y| y.delta)
    }

    /// `(nx, ny)`, with `ny == 1` on a 1-D grid.
    pub fn shape(&self) -> (usize, usize) {
        (self.x.count, self.y.map_or(1, |y| y.count))
    }

    pub fn cell_count(&self) -> usize {
        let (nx, ny) = self.shape();
        nx * ny
    }

    pub fn coords(&self, i: usize, j: usize) -> (Float, Float) {
        (self.x.coord(i), self.y.map_or(0.0, |y| y.coord(j)))
    }
}
