use std::ops::Range;

use faer_core::{MatMut, MatRef};

use crate::{
    mesh::{Dimensionality, Direction, Grid},
    Float,
};

/// How the fields handed to a stencil relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coupling {
    /// Each field is updated on its own; any number of fields.
    Independent,
    /// The fields are the components of one vector quantity, e.g. `(u, v)`.
    Vector(usize),
}

/// Per-sweep context.
#[derive(Debug, Clone, Copy)]
pub struct Ctx<'a> {
    pub(crate) grid: &'a Grid,
    pub(crate) dt: Float,
    pub(crate) n: usize,
    pub(crate) t: Float,
    pub(crate) wrap: [bool; 2],
}

impl<'a> Ctx<'a> {
    pub fn grid(&self) -> &'a Grid {
        self.grid
    }

    pub fn dt(&self) -> Float {
        self.dt
    }

    /// Index of the step being computed (1 for the first sweep).
    pub fn step(&self) -> usize {
        self.n
    }

    /// Time at the start of the step.
    pub fn time(&self) -> Float {
        self.t
    }

    pub fn dx(&self) -> Float {
        self.grid.dx()
    }

    pub fn dy(&self) -> Option<Float> {
        self.grid.dy()
    }

    pub fn planar(&self) -> bool {
        self.grid.dims() == Dimensionality::Two
    }

    pub fn wraps(&self, direction: Direction) -> bool {
        match direction {
            Direction::X => self.wrap[0],
            Direction::Y => self.wrap[1],
        }
    }

    fn count(&self, direction: Direction) -> usize {
        self.grid.axis(direction).map_or(1, |axis| axis.count)
    }

    /// Indices updated along `direction`. A ring axis is updated everywhere;
    /// otherwise the edges are left to the boundary rules, except the
    /// downstream edge of a stencil that only looks upstream.
    pub(crate) fn span(&self, direction: Direction, one_sided: bool) -> Range<usize> {
        let count = self.count(direction);
        if self.grid.axis(direction).is_none() {
            0..1
        } else if self.wraps(direction) {
            0..count
        } else if one_sided {
            1..count
        } else {
            1..count - 1
        }
    }

    /// `i - 1`, wrapping on a ring axis.
    pub(crate) fn behind(&self, direction: Direction, i: usize) -> usize {
        match i {
            0 if self.wraps(direction) => self.count(direction) - 1,
            0 => 0,
            i => i - 1,
        }
    }

    /// `i + 1`, wrapping on a ring axis.
    pub(crate) fn ahead(&self, direction: Direction, i: usize) -> usize {
        let count = self.count(direction);
        if i + 1 < count {
            i + 1
        } else if self.wraps(direction) {
            0
        } else {
            i
        }
    }
}

/// An explicit update rule: new values over the updated cells, computed from
/// the pre-step state only.
pub trait Stencil {
    fn name(&self) -> &'static str;

    fn coupling(&self, dims: Dimensionality) -> Coupling;

    /// True when the update reads no downstream neighbour.
    fn one_sided(&self, dims: Dimensionality) -> bool {
        let _ = dims;
        false
    }

    /// Dimensionless numbers governing stability, for logging.
    fn numbers(&self, ctx: &Ctx<'_>) -> Vec<(&'static str, Float)> {
        let _ = ctx;
        Vec::new()
    }

    /// `old[k]` and `new[k]` are the pre-step and scratch buffers of field `k`.
    /// Only the cells in [`Ctx::span`] may be written.
    fn apply(&self, ctx: Ctx<'_>, old: &[MatRef<'_, Float>], new: &mut [MatMut<'_, Float>]);
}

impl<S: Stencil + ?Sized> Stencil for &S {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn coupling(&self, dims: Dimensionality) -> Coupling {
        (**self).coupling(dims)
    }

    fn one_sided(&self, dims: Dimensionality) -> bool {
        (**self).one_sided(dims)
    }

    fn numbers(&self, ctx: &Ctx<'_>) -> Vec<(&'static str, Float)> {
        (**self).numbers(ctx)
    }

    fn apply(&self, ctx: Ctx<'_>, old: &[MatRef<'_, Float>], new: &mut [MatMut<'_, Float>]) {
        (**self).apply(ctx, old, new)
    }
}
