use std::f64::consts::PI;

use fdevolve::{
    oracle, BoundarySpec, Dimensionality, Grid, Logger, Operator, OperatorKind, Parameters,
    Stepper,
};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let nu = 0.1;
    let grid = Grid::new(Dimensionality::One, &[151], &[(0.0, 2.0 * PI)]).expect("invalid grid");
    let spec = BoundarySpec::periodic(&grid).expect("invalid boundaries");
    let params = Parameters::new(0.5 / 150.0).with_viscosity(nu);
    let operator = Operator::from_parameters(OperatorKind::ConvectionDiffusion, &params)
        .expect("missing parameter");

    let mut fields = [oracle::sawtooth_field("u", &grid, 0.0, nu)];
    let mut stepper = Stepper::new(grid, operator, spec, params.dt)
        .with_observer(Logger)
        .with_finite_check(true);

    for _ in 0..5 {
        stepper
            .advance(&mut fields, 30)
            .expect("failed to run simulation");

        let exact = oracle::sawtooth_field("exact", &grid, stepper.time(), nu);
        let error = fields[0]
            .snapshot()
            .iter()
            .zip(exact.snapshot())
            .map(|(u, e)| (u - e).abs())
            .sum::<f64>()
            / grid.cell_count() as f64;
        println!("t={:.3} mean |u - exact| = {:.4}", stepper.time(), error);
    }
}
