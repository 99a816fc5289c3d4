use faer_core::MatMut;
use reborrow::*;

use crate::{
    error::SimError,
    field::Field,
    mesh::{Dimensionality, Direction, Grid},
    Float,
};

/// Grid edges, in the order boundary rules are applied. A corner cell ends up
/// holding the value of the last rule that touches it, i.e. its y edge on a 2-D grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    XMin,
    XMax,
    YMin,
    YMax,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::XMin, Edge::XMax, Edge::YMin, Edge::YMax];

    pub fn direction(self) -> Direction {
        match self {
            Edge::XMin | Edge::XMax => Direction::X,
            Edge::YMin | Edge::YMax => Direction::Y,
        }
    }

    pub fn opposite(self) -> Edge {
        match self {
            Edge::XMin => Edge::XMax,
            Edge::XMax => Edge::XMin,
            Edge::YMin => Edge::YMax,
            Edge::YMax => Edge::YMin,
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Number of cells along this edge.
    fn len(self, (nx, ny): (usize, usize)) -> usize {
        match self.direction() {
            Direction::X => ny,
            Direction::Y => nx,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dirichlet {
    Constant(Float),
    /// One value per cell along the edge.
    Profile(Vec<Float>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EdgeRule {
    Dirichlet(Dirichlet),
    /// Zero normal gradient: the edge copies its interior neighbour.
    Neumann,
    /// Closes the axis into a ring; must be set on both sides of the axis.
    Periodic,
}

impl EdgeRule {
    pub fn fixed(value: Float) -> Self {
        EdgeRule::Dirichlet(Dirichlet::Constant(value))
    }

    pub fn profile(values: impl Into<Vec<Float>>) -> Self {
        EdgeRule::Dirichlet(Dirichlet::Profile(values.into()))
    }
}

/// A validated set of edge rules for one grid shape.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundarySpec {
    rules: [Option<EdgeRule>; 4],
    shape: (usize, usize),
}

#[derive(Debug, Clone, Default)]
pub struct BoundarySpecBuilder {
    rules: [Option<EdgeRule>; 4],
}

impl BoundarySpecBuilder {
    pub fn edge(mut self, edge: Edge, rule: EdgeRule) -> Self {
        self.rules[edge.index()] = Some(rule);
        self
    }

    pub fn x_min(self, rule: EdgeRule) -> Self {
        self.edge(Edge::XMin, rule)
    }

    pub fn x_max(self, rule: EdgeRule) -> Self {
        self.edge(Edge::XMax, rule)
    }

    pub fn y_min(self, rule: EdgeRule) -> Self {
        self.edge(Edge::YMin, rule)
    }

    pub fn y_max(self, rule: EdgeRule) -> Self {
        self.edge(Edge::YMax, rule)
    }

    pub fn build(self, grid: &Grid) -> Result<BoundarySpec, SimError> {
        let shape = grid.shape();
        let invalid = |edge: Edge, reason: String| SimError::InvalidBoundary { edge, reason };

        for edge in Edge::ALL {
            let present = grid.axis(edge.direction()).is_some();
            match (&self.rules[edge.index()], present) {
                (None, true) => return Err(invalid(edge, "no rule given".to_string())),
                (Some(_), false) => {
                    return Err(invalid(edge, "edge does not exist on a 1-D grid".to_string()))
                }
                (Some(EdgeRule::Dirichlet(Dirichlet::Profile(p))), true)
                    if p.len() != edge.len(shape) =>
                {
                    return Err(invalid(
                        edge,
                        format!("profile has {} values, edge has {}", p.len(), edge.len(shape)),
                    ))
                }
                (Some(EdgeRule::Periodic), true)
                    if self.rules[edge.opposite().index()] != Some(EdgeRule::Periodic) =>
                {
                    return Err(invalid(
                        edge,
                        format!("periodic edge needs a periodic {:?}", edge.opposite()),
                    ))
                }
                _ => {}
            }
        }

        Ok(BoundarySpec {
            rules: self.rules,
            shape,
        })
    }
}

impl BoundarySpec {
    pub fn builder() -> BoundarySpecBuilder {
        BoundarySpecBuilder::default()
    }

    /// The same rule on every edge of `grid`.
    pub fn uniform(grid: &Grid, rule: EdgeRule) -> Result<Self, SimError> {
        let builder = Self::builder().x_min(rule.clone()).x_max(rule.clone());
        match grid.dims() {
            Dimensionality::One => builder.build(grid),
            Dimensionality::Two => builder.y_min(rule.clone()).y_max(rule).build(grid),
        }
    }

    pub fn periodic(grid: &Grid) -> Result<Self, SimError> {
        Self::uniform(grid, EdgeRule::Periodic)
    }

    pub fn rule(&self, edge: Edge) -> Option<&EdgeRule> {
        self.rules[edge.index()].as_ref()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Whether the axis is a ring whose seam the stencils update themselves.
    pub fn wraps(&self, direction: Direction) -> bool {
        let edge = match direction {
            Direction::X => Edge::XMin,
            Direction::Y => Edge::YMin,
        };
        matches!(self.rule(edge), Some(EdgeRule::Periodic))
    }

    pub(crate) fn wrap_flags(&self) -> [bool; 2] {
        [self.wraps(Direction::X), self.wraps(Direction::Y)]
    }

    pub(crate) fn expect_shape(&self, grid: &Grid) -> Result<(), SimError> {
        if self.shape != grid.shape() {
            return Err(SimError::ShapeMismatch {
                what: "boundary spec".to_string(),
                expected: grid.shape(),
                found: self.shape,
            });
        }
        Ok(())
    }

    /// Overwrites the edge cells of `field.current`.
    pub fn apply(&self, field: &mut Field) -> Result<(), SimError> {
        if field.shape() != self.shape {
            return Err(SimError::ShapeMismatch {
                what: format!("field `{}`", field.name()),
                expected: self.shape,
                found: field.shape(),
            });
        }
        self.apply_to(field.current_mut());
        Ok(())
    }

    /// Rules run in [`Edge::ALL`] order. Neumann reads the interior neighbour from
    /// `u` itself, so interior values must already be final.
    pub(crate) fn apply_to(&self, mut u: MatMut<'_, Float>) {
        let (nx, ny) = (u.nrows(), u.ncols());
        for edge in Edge::ALL {
            let Some(rule) = self.rule(edge) else {
                continue;
            };
            // (edge cell, interior neighbour) along the normal axis
            let (at, inner) = match edge {
                Edge::XMin => (0, 1),
                Edge::XMax => (nx - 1, nx - 2),
                Edge::YMin => (0, 1),
                Edge::YMax => (ny - 1, ny - 2),
            };
            let len = edge.len((nx, ny));
            let cell = |k: usize, normal: usize| match edge.direction() {
                Direction::X => (normal, k),
                Direction::Y => (k, normal),
            };

            match rule {
                EdgeRule::Periodic => {}
                EdgeRule::Neumann => {
                    for k in 0..len {
                        let (si, sj) = cell(k, inner);
                        let (di, dj) = cell(k, at);
                        let value = u.rb().read(si, sj);
                        u.write(di, dj, value);
                    }
                }
                EdgeRule::Dirichlet(Dirichlet::Constant(value)) => {
                    for k in 0..len {
                        let (di, dj) = cell(k, at);
                        u.write(di, dj, *value);
                    }
                }
                EdgeRule::Dirichlet(Dirichlet::Profile(values)) => {
                    for (k, value) in values.iter().enumerate() {
                        let (di, dj) = cell(k, at);
                        u.write(di, dj, *value);
                    }
                }
            }
        }
    }
}
