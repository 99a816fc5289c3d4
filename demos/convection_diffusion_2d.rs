use fdevolve::{
    oracle, BoundarySpec, Dimensionality, EdgeRule, Field, Grid, Logger, Operator, OperatorKind,
    Parameters, Stepper,
};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let (nx, ny) = (41, 41);
    let grid = Grid::new(Dimensionality::Two, &[nx, ny], &[(0.0, 2.0), (0.0, 2.0)])
        .expect("invalid grid");
    let spec = BoundarySpec::uniform(&grid, EdgeRule::fixed(1.0)).expect("invalid boundaries");

    let nu = 0.01;
    let sigma = 0.0009;
    let dt = sigma * grid.dx() * grid.dy().unwrap_or(1.0) / nu;
    let params = Parameters::new(dt).with_viscosity(nu);
    let operator = Operator::from_parameters(OperatorKind::ConvectionDiffusion, &params)
        .expect("missing parameter");

    let hat = |x: f64, y: f64| oracle::hat(x, 0.5, 1.0).min(oracle::hat(y, 0.5, 1.0));
    let mut fields = [Field::new("u", &grid, hat), Field::new("v", &grid, hat)];

    Stepper::new(grid, operator, spec, dt)
        .with_sampling_period(100)
        .with_observer(Logger)
        .advance(&mut fields, 500)
        .expect("failed to run simulation");

    for f in &fields {
        println!("{}: min={:.4} max={:.4}", f.name(), f.min(), f.max());
    }
}
