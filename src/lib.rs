//! Explicit finite-difference solvers for the classic 1-D and 2-D model
//! equations (linear and nonlinear convection, diffusion, Burgers) and a
//! point-relaxation solver for Laplace and Poisson problems on uniform grids.

pub mod bc;
pub mod driver;
mod error;
pub mod field;
pub mod mesh;
pub mod method;
pub mod methods;
pub mod oracle;
pub mod relax;

pub type Float = f64;

pub use bc::{BoundarySpec, BoundarySpecBuilder, Dirichlet, Edge, EdgeRule};
pub use driver::{advance, Frame, Logger, ObsCtx, Observer, Recorder, Stepper};
pub use error::SimError;
pub use field::Field;
pub use mesh::{Axis, Dimensionality, Direction, Grid, Resolution};
pub use method::{Coupling, Ctx, Stencil};
pub use methods::{
    ConvectionDiffusion, Diffusion, LinearConvection, NonlinearConvection, Operator, OperatorKind,
    Parameters,
};
pub use relax::{
    point_sources, RelaxationSolver, SolveReport, SolverState, StoppingCriterion,
};
