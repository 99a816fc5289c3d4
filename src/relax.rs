//! Point-relaxation (Jacobi) solver for the Laplace and Poisson equations.
//!
//! Every sweep computes each updated node from the previous sweep's values only:
//!
//! ```text
//! p[i,j] = (dy² (p[i+1,j] + p[i-1,j]) + dx² (p[i,j+1] + p[i,j-1]) - b[i,j] dx² dy²)
//!          / (2 (dx² + dy²))
//! ```
//!
//! then applies the boundary rules. `b ≡ 0` is the Laplace equation.

use faer_core::{MatMut, MatRef};
use reborrow::*;

use crate::{
    bc::BoundarySpec,
    driver::{ObsCtx, Observer},
    error::SimError,
    field::Field,
    method::Ctx,
    mesh::{Direction, Grid},
    Float,
};

/// When the solver stops. The two disciplines are never mixed: a fixed budget
/// never looks at the residual, a tolerance run stops at the first sweep whose
/// residual magnitude is at or below it (or at the cap).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoppingCriterion {
    FixedIterations(usize),
    ResidualTolerance {
        tolerance: Float,
        max_iterations: usize,
    },
}

impl StoppingCriterion {
    pub const DEFAULT_ITERATION_CAP: usize = 100_000;

    pub fn fixed(iterations: usize) -> Self {
        StoppingCriterion::FixedIterations(iterations)
    }

    pub fn tolerance(tolerance: Float) -> Self {
        StoppingCriterion::ResidualTolerance {
            tolerance,
            max_iterations: Self::DEFAULT_ITERATION_CAP,
        }
    }

    /// Sets the hard cap of a tolerance run; no effect on a fixed budget.
    pub fn with_cap(self, cap: usize) -> Self {
        match self {
            StoppingCriterion::ResidualTolerance { tolerance, .. } => {
                StoppingCriterion::ResidualTolerance {
                    tolerance,
                    max_iterations: cap,
                }
            }
            fixed => fixed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    Initialized,
    Iterating,
    Converged,
    IterationLimitReached,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    pub iterations: usize,
    pub converged: bool,
    /// Residual of the last sweep, `None` if no sweep ran.
    pub residual: Option<Float>,
    pub state: SolverState,
}

/// Signed relative change of the L1 norm made by the last published sweep,
/// `(‖current‖₁ - ‖previous‖₁) / ‖previous‖₁`.
///
/// `0` when both norms vanish, `+∞` when only the previous one does.
pub fn residual(field: &Field) -> Float {
    let current = field.l1_norm();
    let previous = field.previous_l1_norm();
    if previous == 0.0 {
        if current == 0.0 {
            0.0
        } else {
            Float::INFINITY
        }
    } else {
        (current - previous) / previous
    }
}

/// A forcing term that is zero except at the given `(i, j, value)` nodes.
pub fn point_sources(grid: &Grid, sources: &[(usize, usize, Float)]) -> Result<Field, SimError> {
    let mut rhs = Field::constant("rhs", grid, 0.0);
    let (nx, ny) = grid.shape();
    for &(i, j, value) in sources {
        if i >= nx || j >= ny {
            return Err(SimError::ShapeMismatch {
                what: format!("point source at ({i}, {j})"),
                expected: (nx, ny),
                found: (i + 1, j + 1),
            });
        }
        rhs.set(i, j, value);
    }
    Ok(rhs)
}

pub struct RelaxationSolver<'d> {
    grid: Grid,
    spec: BoundarySpec,
    criterion: StoppingCriterion,
    state: SolverState,
    observers: Vec<Box<dyn Observer + 'd>>,
    sampling: usize,
}

impl<'d> RelaxationSolver<'d> {
    pub fn new(grid: Grid, spec: BoundarySpec, criterion: StoppingCriterion) -> Self {
        Self {
            grid,
            spec,
            criterion,
            state: SolverState::Initialized,
            observers: Vec::new(),
            sampling: 1,
        }
    }

    pub fn with_observer(mut self, observer: impl Observer + 'd) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn with_sampling_period(mut self, period: usize) -> Self {
        self.sampling = period.max(1);
        self
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn criterion(&self) -> StoppingCriterion {
        self.criterion
    }

    fn name(&self) -> &'static str {
        match self.criterion {
            StoppingCriterion::FixedIterations(_) => "jacobi (fixed budget)",
            StoppingCriterion::ResidualTolerance { .. } => "jacobi (residual tolerance)",
        }
    }

    /// Relaxes `field` in place. `rhs` is the Poisson forcing term, `None` for Laplace.
    pub fn solve(
        &mut self,
        field: &mut Field,
        rhs: Option<&Field>,
    ) -> Result<SolveReport, SimError> {
        self.spec.expect_shape(&self.grid)?;
        field.expect_shape(&self.grid)?;
        if let Some(rhs) = rhs {
            rhs.expect_shape(&self.grid)?;
        }

        let _span = tracing::debug_span!("solve", solver = self.name()).entered();
        tracing::debug!("relaxing `{}` with {:?}", field.name(), self.criterion);

        let ctx = Ctx {
            grid: &self.grid,
            dt: 0.0,
            n: 0,
            t: 0.0,
            wrap: self.spec.wrap_flags(),
        };
        let rhs = rhs.map(Field::current);

        self.state = SolverState::Iterating;
        for o in self.observers.iter_mut() {
            o.at_startup(ObsCtx {
                label: "jacobi",
                grid: &self.grid,
                numbers: &[],
                sampling: self.sampling,
                iter: 0,
                time: None,
                residual: None,
                fields: std::slice::from_ref(field),
            })?;
        }

        let (budget, tolerance) = match self.criterion {
            StoppingCriterion::FixedIterations(n) => (n, None),
            StoppingCriterion::ResidualTolerance {
                tolerance,
                max_iterations,
            } => (max_iterations, Some(tolerance)),
        };

        let mut iterations = 0;
        let mut last = None;
        while iterations < budget {
            {
                let (old, mut new) = field.stage();
                jacobi_sweep(&ctx, old, new.rb_mut(), rhs);
                self.spec.apply_to(new);
            }
            field.publish();
            iterations += 1;

            // a fixed budget never evaluates the stopping rule
            let r = tolerance.map(|_| residual(field));
            last = r.or(last);

            if iterations % self.sampling == 0 {
                tracing::trace!("sweep {iterations}: residual {r:?}");
                for o in self.observers.iter_mut() {
                    o.at_each_iteration(ObsCtx {
                        label: "jacobi",
                        grid: &self.grid,
                        numbers: &[],
                        sampling: self.sampling,
                        iter: iterations,
                        time: None,
                        residual: r,
                        fields: std::slice::from_ref(field),
                    })?;
                }
            }

            // a shrinking norm gives a negative residual, compare magnitudes
            if let (Some(r), Some(tolerance)) = (r, tolerance) {
                if r.abs() <= tolerance {
                    self.state = SolverState::Converged;
                    break;
                }
            }
        }

        if self.state != SolverState::Converged {
            self.state = SolverState::IterationLimitReached;
        }

        match (self.state, tolerance) {
            (SolverState::Converged, _) => {
                tracing::info!("`{}` converged after {iterations} sweeps", field.name())
            }
            (_, Some(tolerance)) => tracing::warn!(
                "`{}` did not reach tolerance {tolerance:e} within {iterations} sweeps (residual {last:?})",
                field.name()
            ),
            (_, None) => tracing::debug!("`{}`: ran {iterations} sweeps", field.name()),
        }

        for o in self.observers.iter_mut() {
            o.at_cleanup(ObsCtx {
                label: "jacobi",
                grid: &self.grid,
                numbers: &[],
                sampling: self.sampling,
                iter: iterations,
                time: None,
                residual: last,
                fields: std::slice::from_ref(field),
            })?;
        }

        Ok(SolveReport {
            iterations,
            converged: self.state == SolverState::Converged,
            residual: last,
            state: self.state,
        })
    }
}

/// One-shot relaxation with the given stopping discipline.
pub fn solve(
    grid: &Grid,
    field: &mut Field,
    rhs: Option<&Field>,
    spec: &BoundarySpec,
    criterion: StoppingCriterion,
) -> Result<SolveReport, SimError> {
    RelaxationSolver::new(*grid, spec.clone(), criterion).solve(field, rhs)
}

fn jacobi_sweep(
    ctx: &Ctx<'_>,
    old: MatRef<'_, Float>,
    mut new: MatMut<'_, Float>,
    rhs: Option<MatRef<'_, Float>>,
) {
    let dx2 = ctx.dx() * ctx.dx();
    let b = |i: usize, j: usize| rhs.map_or(0.0, |rhs| rhs.read(i, j));
    let ys = ctx.span(Direction::Y, false);

    for i in ctx.span(Direction::X, false) {
        let (xm, xp) = (ctx.behind(Direction::X, i), ctx.ahead(Direction::X, i));
        for j in ys.clone() {
            let sum_x = old.read(xp, j) + old.read(xm, j);
            let value = match ctx.dy() {
                None => (sum_x - b(i, j) * dx2) / 2.0,
                Some(dy) => {
                    let dy2 = dy * dy;
                    let (ym, yp) = (ctx.behind(Direction::Y, j), ctx.ahead(Direction::Y, j));
                    let sum_y = old.read(i, yp) + old.read(i, ym);
                    (dy2 * sum_x + dx2 * sum_y - b(i, j) * dx2 * dy2) / (2.0 * (dx2 + dy2))
                }
            };
            new.write(i, j, value);
        }
    }
}
