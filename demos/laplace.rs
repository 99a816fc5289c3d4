use fdevolve::{
    BoundarySpec, Dimensionality, EdgeRule, Field, Grid, Logger, RelaxationSolver,
    StoppingCriterion,
};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let grid = Grid::new(Dimensionality::Two, &[31, 31], &[(0.0, 2.0), (0.0, 1.0)])
        .expect("invalid grid");
    let right: Vec<f64> = grid.y().expect("planar grid").iter().collect();
    let spec = BoundarySpec::builder()
        .x_min(EdgeRule::fixed(0.0))
        .x_max(EdgeRule::profile(right))
        .y_min(EdgeRule::Neumann)
        .y_max(EdgeRule::Neumann)
        .build(&grid)
        .expect("invalid boundaries");

    let mut p = Field::constant("p", &grid, 0.0);
    spec.apply(&mut p).expect("shape mismatch");

    let report = RelaxationSolver::new(grid, spec, StoppingCriterion::tolerance(1e-4))
        .with_sampling_period(100)
        .with_observer(Logger)
        .solve(&mut p, None)
        .expect("failed to relax");

    println!("{report:?}");
    for j in (0..31).step_by(10) {
        let row = p.row(j);
        println!("y={:.2}: {:?}", grid.coords(0, j).1, &row[..row.len().min(6)]);
    }
}
