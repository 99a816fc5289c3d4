use faer_core::{MatMut, MatRef};

use super::{ConvectionDiffusion, Diffusion, LinearConvection, NonlinearConvection};
use crate::{
    error::SimError,
    method::{Coupling, Ctx, Stencil},
    mesh::Dimensionality,
    Float,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    LinearConvection,
    NonlinearConvection,
    Diffusion,
    ConvectionDiffusion,
    Laplace,
    Poisson,
}

impl OperatorKind {
    /// Whether the kind is time-marched by the explicit stepper.
    pub fn is_explicit(self) -> bool {
        !matches!(self, OperatorKind::Laplace | OperatorKind::Poisson)
    }
}

/// Physical constants, caller-supplied and never validated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    pub dt: Float,
    pub speed: Option<Float>,
    pub viscosity: Option<Float>,
}

impl Parameters {
    pub fn new(dt: Float) -> Self {
        Self {
            dt,
            speed: None,
            viscosity: None,
        }
    }

    pub fn with_speed(mut self, speed: Float) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_viscosity(mut self, viscosity: Float) -> Self {
        self.viscosity = Some(viscosity);
        self
    }

    /// `speed * dt / dx`
    pub fn courant_number(&self, dx: Float) -> Option<Float> {
        self.speed.map(|c| c * self.dt / dx)
    }

    /// `viscosity * dt / dx²`
    pub fn diffusion_number(&self, dx: Float) -> Option<Float> {
        self.viscosity.map(|nu| nu * self.dt / (dx * dx))
    }
}

/// The closed set of explicit update rules, chosen at run time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operator {
    LinearConvection(LinearConvection),
    NonlinearConvection(NonlinearConvection),
    Diffusion(Diffusion),
    ConvectionDiffusion(ConvectionDiffusion),
}

impl Operator {
    pub fn from_parameters(kind: OperatorKind, params: &Parameters) -> Result<Self, SimError> {
        let speed = || {
            params.speed.ok_or(SimError::MissingParameter {
                operator: kind,
                parameter: "speed",
            })
        };
        let viscosity = || {
            params.viscosity.ok_or(SimError::MissingParameter {
                operator: kind,
                parameter: "viscosity",
            })
        };

        Ok(match kind {
            OperatorKind::LinearConvection => {
                Operator::LinearConvection(LinearConvection { speed: speed()? })
            }
            OperatorKind::NonlinearConvection => Operator::NonlinearConvection(NonlinearConvection),
            OperatorKind::Diffusion => Operator::Diffusion(Diffusion {
                viscosity: viscosity()?,
            }),
            OperatorKind::ConvectionDiffusion => {
                Operator::ConvectionDiffusion(ConvectionDiffusion {
                    viscosity: viscosity()?,
                })
            }
            OperatorKind::Laplace | OperatorKind::Poisson => {
                return Err(SimError::NotExplicit(kind))
            }
        })
    }

    pub fn kind(&self) -> OperatorKind {
        match self {
            Operator::LinearConvection(_) => OperatorKind::LinearConvection,
            Operator::NonlinearConvection(_) => OperatorKind::NonlinearConvection,
            Operator::Diffusion(_) => OperatorKind::Diffusion,
            Operator::ConvectionDiffusion(_) => OperatorKind::ConvectionDiffusion,
        }
    }

    fn inner(&self) -> &dyn Stencil {
        match self {
            Operator::LinearConvection(s) => s,
            Operator::NonlinearConvection(s) => s,
            Operator::Diffusion(s) => s,
            Operator::ConvectionDiffusion(s) => s,
        }
    }
}

impl Stencil for Operator {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn coupling(&self, dims: Dimensionality) -> Coupling {
        self.inner().coupling(dims)
    }

    fn one_sided(&self, dims: Dimensionality) -> bool {
        self.inner().one_sided(dims)
    }

    fn numbers(&self, ctx: &Ctx<'_>) -> Vec<(&'static str, Float)> {
        self.inner().numbers(ctx)
    }

    fn apply(&self, ctx: Ctx<'_>, old: &[MatRef<'_, Float>], new: &mut [MatMut<'_, Float>]) {
        self.inner().apply(ctx, old, new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_parameters() {
        let params = Parameters::new(0.025).with_speed(1.0);
        let op = Operator::from_parameters(OperatorKind::LinearConvection, &params).unwrap();
        assert_eq!(op, Operator::LinearConvection(LinearConvection { speed: 1.0 }));
        assert_eq!(op.kind(), OperatorKind::LinearConvection);
        assert_eq!(op.name(), "linear convection");

        // the nonlinear coefficient is the field itself, no speed needed
        assert!(Operator::from_parameters(OperatorKind::NonlinearConvection, &params).is_ok());
    }

    #[test]
    fn reports_missing_coefficients() {
        let params = Parameters::new(0.01).with_speed(1.0);
        assert_eq!(
            Operator::from_parameters(OperatorKind::Diffusion, &params),
            Err(SimError::MissingParameter {
                operator: OperatorKind::Diffusion,
                parameter: "viscosity",
            })
        );
        assert_eq!(
            Operator::from_parameters(OperatorKind::Poisson, &params),
            Err(SimError::NotExplicit(OperatorKind::Poisson))
        );
        assert!(!OperatorKind::Laplace.is_explicit());
    }

    #[test]
    fn dimensionless_numbers() {
        let params = Parameters::new(0.01).with_speed(2.0).with_viscosity(0.1);
        assert!((params.courant_number(0.05).unwrap() - 0.4).abs() < 1e-12);
        assert!((params.diffusion_number(0.1).unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(Parameters::new(0.1).courant_number(0.1), None);
    }
}
