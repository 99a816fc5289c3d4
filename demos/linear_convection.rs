use fdevolve::{
    BoundarySpec, Dimensionality, Field, Grid, Logger, Operator, OperatorKind, Parameters,
    Recorder, Stepper,
};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let grid = Grid::new(Dimensionality::One, &[81], &[(0.0, 2.0)]).expect("invalid grid");
    let spec = BoundarySpec::periodic(&grid).expect("invalid boundaries");
    let params = Parameters::new(0.025).with_speed(1.0);
    let operator = Operator::from_parameters(OperatorKind::LinearConvection, &params)
        .expect("missing parameter");

    // 2 on the nodes floor(0.5/dx) ..= floor(1/dx)
    let (lo, hi) = (
        (0.5 / grid.dx()).floor() as usize,
        (1.0 / grid.dx()).floor() as usize,
    );
    let mut fields = [Field::from_index_fn("u", &grid, |i, _| {
        if (lo..=hi).contains(&i) {
            2.0
        } else {
            1.0
        }
    })];
    let mut recorder = Recorder::new();

    Stepper::new(grid, operator, spec, params.dt)
        .with_sampling_period(5)
        .with_observer(Logger)
        .with_observer(&mut recorder)
        .advance(&mut fields, 25)
        .expect("failed to run simulation");

    for frame in recorder.frames() {
        let u = &frame.values[0];
        let peak = u.iter().cloned().fold(f64::MIN, f64::max);
        println!("t={:.3} max(u)={:.4}", frame.time.unwrap_or(0.0), peak);
    }
}
