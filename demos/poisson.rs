use fdevolve::{
    point_sources, BoundarySpec, Dimensionality, EdgeRule, Field, Grid, Logger,
    RelaxationSolver, StoppingCriterion,
};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let (nx, ny) = (50, 50);
    let grid = Grid::new(Dimensionality::Two, &[nx, ny], &[(0.0, 2.0), (0.0, 1.0)])
        .expect("invalid grid");
    let spec = BoundarySpec::uniform(&grid, EdgeRule::fixed(0.0)).expect("invalid boundaries");
    let rhs = point_sources(
        &grid,
        &[(nx / 4, ny / 4, 100.0), (3 * nx / 4, 3 * ny / 4, -100.0)],
    )
    .expect("source outside the grid");

    let mut p = Field::constant("p", &grid, 0.0);
    for budget in [100, 900] {
        let report = RelaxationSolver::new(grid, spec.clone(), StoppingCriterion::fixed(budget))
            .with_sampling_period(100)
            .with_observer(Logger)
            .solve(&mut p, Some(&rhs))
            .expect("failed to relax");
        println!(
            "{:?}: min={:.5} max={:.5}",
            report,
            p.min(),
            p.max()
        );
    }
}
