use faer_core::{MatMut, MatRef};
use reborrow::*;

use crate::{
    bc::BoundarySpec,
    error::SimError,
    field::Field,
    method::{Coupling, Ctx, Stencil},
    methods::{Operator, OperatorKind, Parameters},
    mesh::Grid,
    Float,
};

pub struct ObsCtx<'ctx> {
    // Meta
    pub(crate) label: &'static str,
    pub(crate) grid: &'ctx Grid,
    pub(crate) numbers: &'ctx [(&'static str, Float)],
    pub(crate) sampling: usize,

    // Iteration info
    pub(crate) iter: usize,
    pub(crate) time: Option<Float>,
    pub(crate) residual: Option<Float>,
    pub(crate) fields: &'ctx [Field],
}

impl<'ctx> ObsCtx<'ctx> {
    /// Name of the stencil or solver driving the fields.
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn grid(&self) -> &'ctx Grid {
        self.grid
    }

    /// Dimensionless numbers reported by the stencil (Courant, diffusion number).
    pub fn numbers(&self) -> &'ctx [(&'static str, Float)] {
        self.numbers
    }

    pub fn sampling_period(&self) -> usize {
        self.sampling
    }

    pub fn iter(&self) -> usize {
        self.iter
    }

    /// Simulated time; `None` for the relaxation solver.
    pub fn time(&self) -> Option<Float> {
        self.time
    }

    /// Residual of the last sweep; only set by the relaxation solver.
    pub fn residual(&self) -> Option<Float> {
        self.residual
    }

    pub fn fields(&self) -> &'ctx [Field] {
        self.fields
    }
}

#[allow(unused_variables)]
pub trait Observer {
    fn at_startup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        Ok(())
    }

    fn at_each_iteration(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        Ok(())
    }

    fn at_cleanup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        Ok(())
    }
}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn at_startup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        (**self).at_startup(ctx)
    }

    fn at_each_iteration(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        (**self).at_each_iteration(ctx)
    }

    fn at_cleanup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        (**self).at_cleanup(ctx)
    }
}

/// Explicit time marching: snapshot, stencil, boundary rules, buffer swap.
///
/// The stepper keeps the step count and simulated time across calls to
/// [`Stepper::advance`], so a run can be advanced in chunks.
pub struct Stepper<'d, S> {
    pub(crate) grid: Grid,
    pub(crate) stencil: S,
    pub(crate) spec: BoundarySpec,
    pub(crate) dt: Float,
    pub(crate) t0: Float,
    pub(crate) steps: usize,
    pub(crate) observers: Vec<Box<dyn Observer + 'd>>,
    pub(crate) sampling: usize,
    pub(crate) finite_check: bool,
}

impl<'d, S: Stencil> Stepper<'d, S> {
    pub fn new(grid: Grid, stencil: S, spec: BoundarySpec, dt: Float) -> Self {
        Self {
            grid,
            stencil,
            spec,
            dt,
            t0: 0.0,
            steps: 0,
            observers: Vec::new(),
            sampling: 1,
            finite_check: false,
        }
    }

    pub fn with_start_time(mut self, t0: Float) -> Self {
        self.t0 = t0;
        self
    }

    /// Observers see every `period`-th step.
    pub fn with_sampling_period(mut self, period: usize) -> Self {
        self.sampling = period.max(1);
        self
    }

    pub fn with_observer(mut self, observer: impl Observer + 'd) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Stop with [`SimError::NonFinite`] as soon as a step produces NaN/Inf.
    /// Off by default; values are reported, never corrected.
    pub fn with_finite_check(mut self, enabled: bool) -> Self {
        self.finite_check = enabled;
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn stencil(&self) -> &S {
        &self.stencil
    }

    pub fn dt(&self) -> Float {
        self.dt
    }

    pub fn steps_taken(&self) -> usize {
        self.steps
    }

    pub fn time(&self) -> Float {
        self.t0 + self.steps as Float * self.dt
    }

    fn validate(&self, fields: &[Field]) -> Result<(), SimError> {
        self.spec.expect_shape(&self.grid)?;

        let expected = match self.stencil.coupling(self.grid.dims()) {
            Coupling::Vector(k) => Some(k),
            Coupling::Independent if fields.is_empty() => Some(1),
            Coupling::Independent => None,
        };
        if let Some(expected) = expected.filter(|&k| k != fields.len()) {
            return Err(SimError::FieldCount {
                operator: self.stencil.name(),
                expected,
                found: fields.len(),
            });
        }

        fields.iter().try_for_each(|f| f.expect_shape(&self.grid))
    }

    /// Runs `steps` sweeps over `fields`, mutating them in place.
    pub fn advance(&mut self, fields: &mut [Field], steps: usize) -> Result<(), SimError> {
        self.validate(fields)?;

        let _span = tracing::debug_span!("advance", stencil = self.stencil.name()).entered();

        let wrap = self.spec.wrap_flags();
        let numbers = self.stencil.numbers(&Ctx {
            grid: &self.grid,
            dt: self.dt,
            n: self.steps,
            t: self.time(),
            wrap,
        });
        tracing::debug!(
            "advancing {} field(s) by {} step(s) from t={:e} (Δt={:e}, {:?})",
            fields.len(),
            steps,
            self.time(),
            self.dt,
            numbers,
        );

        for o in self.observers.iter_mut() {
            o.at_startup(ObsCtx {
                label: self.stencil.name(),
                grid: &self.grid,
                numbers: &numbers,
                sampling: self.sampling,
                iter: self.steps,
                time: Some(self.t0 + self.steps as Float * self.dt),
                residual: None,
                fields: &*fields,
            })?;
        }

        for _ in 0..steps {
            let ctx = Ctx {
                grid: &self.grid,
                dt: self.dt,
                n: self.steps + 1,
                t: self.t0 + self.steps as Float * self.dt,
                wrap,
            };
            tracing::trace!("step {} from t={:e}", ctx.step(), ctx.time());

            {
                // read the pre-step state, write the scratch buffers
                let (old, mut new): (Vec<MatRef<'_, Float>>, Vec<MatMut<'_, Float>>) =
                    fields.iter_mut().map(Field::stage).unzip();

                self.stencil.apply(ctx, &old, &mut new);

                for v in new.iter_mut() {
                    self.spec.apply_to(v.rb_mut());
                }
            }

            // exchange current and scratch
            for f in fields.iter_mut() {
                f.publish();
            }
            self.steps += 1;

            if self.finite_check {
                fields.iter().try_for_each(Field::check_finite)?;
            }

            if self.steps % self.sampling == 0 {
                for o in self.observers.iter_mut() {
                    o.at_each_iteration(ObsCtx {
                        label: self.stencil.name(),
                        grid: &self.grid,
                        numbers: &numbers,
                        sampling: self.sampling,
                        iter: self.steps,
                        time: Some(self.t0 + self.steps as Float * self.dt),
                        residual: None,
                        fields: &*fields,
                    })?;
                }
            }
        }

        for o in self.observers.iter_mut() {
            o.at_cleanup(ObsCtx {
                label: self.stencil.name(),
                grid: &self.grid,
                numbers: &numbers,
                sampling: self.sampling,
                iter: self.steps,
                time: Some(self.t0 + self.steps as Float * self.dt),
                residual: None,
                fields: &*fields,
            })?;
        }

        tracing::debug!("reached step {} (t={:e})", self.steps, self.time());

        Ok(())
    }
}

/// One-shot explicit run: builds the operator from `params` and advances `fields`.
pub fn advance(
    grid: &Grid,
    fields: &mut [Field],
    params: &Parameters,
    kind: OperatorKind,
    spec: &BoundarySpec,
    steps: usize,
) -> Result<(), SimError> {
    let operator = Operator::from_parameters(kind, params)?;
    Stepper::new(*grid, operator, spec.clone(), params.dt).advance(fields, steps)
}

pub struct Logger;

impl Observer for Logger {
    fn at_startup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        let (nx, ny) = ctx.grid().shape();
        tracing::event!(
            tracing::Level::INFO,
            "start of `{}` on {}x{} nodes (Δx={:e}, Δy={:?}) at iteration {}, {:?}",
            ctx.label(),
            nx,
            ny,
            ctx.grid().dx(),
            ctx.grid().dy(),
            ctx.iter(),
            ctx.numbers(),
        );
        Ok(())
    }

    fn at_each_iteration(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        tracing::event!(
            tracing::Level::TRACE,
            "`{}`: iteration {} (t={:?}, residual={:?})",
            ctx.label(),
            ctx.iter(),
            ctx.time(),
            ctx.residual(),
        );
        Ok(())
    }

    fn at_cleanup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        tracing::event!(
            tracing::Level::INFO,
            "finished `{}` at iteration {}",
            ctx.label(),
            ctx.iter()
        );
        Ok(())
    }
}

/// A recorded state of every field.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub iter: usize,
    pub time: Option<Float>,
    /// One [`Field::snapshot`] per field.
    pub values: Vec<Vec<Float>>,
}

/// Keeps snapshots of the fields at startup and at every sampled iteration.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    frames: Vec<Frame>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    fn record(&mut self, ctx: &ObsCtx) {
        // chunked runs report their starting state again, skip it
        if self.frames.last().is_some_and(|f| f.iter == ctx.iter()) {
            return;
        }
        self.frames.push(Frame {
            iter: ctx.iter(),
            time: ctx.time(),
            values: ctx.fields().iter().map(Field::snapshot).collect(),
        });
    }
}

impl Observer for Recorder {
    fn at_startup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        self.record(&ctx);
        Ok(())
    }

    fn at_each_iteration(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        self.record(&ctx);
        Ok(())
    }
}
