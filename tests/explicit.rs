mod common;

use std::f64::consts::PI;

use fdevolve::{
    advance, oracle, BoundarySpec, EdgeRule, Field, NonlinearConvection, Operator, OperatorKind,
    Parameters, Recorder, SimError, Stepper,
};
use proptest::prelude::*;

use common::{excess_centroid, index_hat, line, mean_abs_difference, plane};

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::MIN), |(k, best), (i, &u)| if u > best { (i, u) } else { (k, best) })
        .0
}

/// Nodes strictly inside the jump, behind and ahead of the crest.
fn front_widths(values: &[f64]) -> (usize, usize) {
    let crest = argmax(values);
    let inside = |u: &&f64| **u > 1.1 && **u < 1.9;
    (
        values[..crest].iter().filter(inside).count(),
        values[crest..].iter().filter(inside).count(),
    )
}

proptest! {
    #[test]
    fn standing_wave_is_left_alone(
        values in prop::collection::vec(-10.0f64..10.0, 3..40),
        dt in 1e-4f64..10.0,
        steps in 0usize..20,
    ) {
        let grid = line(values.len(), (0.0, 1.0));
        let spec = BoundarySpec::periodic(&grid).unwrap();
        let mut fields = [Field::from_values("u", &grid, &values).unwrap()];
        let params = Parameters::new(dt).with_speed(0.0);

        advance(&grid, &mut fields, &params, OperatorKind::LinearConvection, &spec, steps).unwrap();
        prop_assert_eq!(fields[0].snapshot(), values);
    }

    #[test]
    fn constant_state_is_steady(
        value in 0.1f64..5.0,
        kind in prop::sample::select(vec![
            OperatorKind::LinearConvection,
            OperatorKind::NonlinearConvection,
            OperatorKind::Diffusion,
            OperatorKind::ConvectionDiffusion,
        ]),
    ) {
        let grid = plane([12, 9], (0.0, 2.0), (0.0, 1.0));
        let spec = BoundarySpec::uniform(&grid, EdgeRule::Neumann).unwrap();
        let mut fields = vec![Field::constant("u", &grid, value), Field::constant("v", &grid, value)];
        let params = Parameters::new(1e-3).with_speed(1.0).with_viscosity(0.1);

        advance(&grid, &mut fields, &params, kind, &spec, 10).unwrap();
        for f in &fields {
            prop_assert!((f.max() - value).abs() < 1e-12);
            prop_assert!((f.min() - value).abs() < 1e-12);
        }
    }
}

#[test]
fn hat_translates_at_the_convection_speed() {
    let grid = line(81, (0.0, 2.0));
    let spec = BoundarySpec::periodic(&grid).unwrap();
    let (speed, dt, steps) = (1.0, 0.0125, 40);
    let mut fields = [Field::new("u", &grid, |x, _| oracle::hat(x, 0.5, 1.0))];
    let before = excess_centroid(&grid, &fields[0].snapshot());

    let params = Parameters::new(dt).with_speed(speed);
    advance(&grid, &mut fields, &params, OperatorKind::LinearConvection, &spec, steps).unwrap();

    let shift = excess_centroid(&grid, &fields[0].snapshot()) - before;
    let expected = speed * dt * steps as f64;
    assert!((shift - expected).abs() < grid.dx(), "shift {shift}, expected {expected}");
    // the front has been smeared but nothing overshoots
    assert!(fields[0].max() <= 2.0 && fields[0].min() >= 1.0);
}

#[test]
fn diffusion_flattens_a_hat() {
    let grid = line(41, (0.0, 2.0));
    let spec = BoundarySpec::periodic(&grid).unwrap();
    let nu = 0.3;
    let dt = 0.2 * grid.dx() * grid.dx() / nu;
    let op = Operator::from_parameters(OperatorKind::Diffusion, &Parameters::new(dt).with_viscosity(nu))
        .unwrap();
    let mut fields = [Field::new("u", &grid, |x, _| oracle::hat(x, 0.5, 1.0))];
    let mut recorder = Recorder::new();

    Stepper::new(grid, op, spec, dt)
        .with_observer(&mut recorder)
        .advance(&mut fields, 200)
        .unwrap();

    let extrema: Vec<(f64, f64)> = recorder
        .frames()
        .iter()
        .map(|f| {
            let u = &f.values[0];
            let max = u.iter().cloned().fold(f64::MIN, f64::max);
            let min = u.iter().cloned().fold(f64::MAX, f64::min);
            (max, min)
        })
        .collect();
    assert_eq!(extrema.len(), 201);

    for pair in extrema.windows(2) {
        let ((max0, min0), (max1, min1)) = (pair[0], pair[1]);
        assert!(max1 <= max0 + 1e-12);
        assert!(min1 >= min0 - 1e-12);
    }
    // once the plateau has eroded both extrema move every step
    for pair in extrema[20..].windows(2) {
        let ((max0, min0), (max1, min1)) = (pair[0], pair[1]);
        assert!(max1 < max0, "max stalled at {max1}");
        assert!(min1 > min0, "min stalled at {min1}");
    }
    let (max, min) = extrema[200];
    assert!(max < 1.5 && min > 1.05, "max {max}, min {min}");
}

#[test]
fn fixed_edges_hold_under_diffusion() {
    let grid = line(21, (0.0, 1.0));
    let spec = BoundarySpec::builder()
        .x_min(EdgeRule::fixed(0.0))
        .x_max(EdgeRule::fixed(1.0))
        .build(&grid)
        .unwrap();
    let mut fields = [Field::constant("u", &grid, 0.5)];
    let params = Parameters::new(0.001).with_viscosity(0.2);
    advance(&grid, &mut fields, &params, OperatorKind::Diffusion, &spec, 2000).unwrap();

    let u = fields[0].snapshot();
    assert_eq!(u[0], 0.0);
    assert_eq!(u[20], 1.0);
    // relaxes toward the straight line between the edges
    for (i, value) in u.iter().enumerate() {
        assert!((value - i as f64 / 20.0).abs() < 0.05);
    }
}

#[test]
fn nonlinear_convection_steepens_the_leading_edge() {
    let grid = line(81, (0.0, 2.0));
    let spec = BoundarySpec::periodic(&grid).unwrap();
    let mut fields = [index_hat(&grid, 20, 40)];
    assert_eq!(front_widths(&fields[0].snapshot()), (0, 0));

    Stepper::new(grid, NonlinearConvection, spec, 0.01)
        .with_finite_check(true)
        .advance(&mut fields, 25)
        .unwrap();

    let u = fields[0].snapshot();
    let (trailing, leading) = front_widths(&u);
    assert!(leading < trailing, "leading {leading}, trailing {trailing}");
    assert!(leading <= 4);
    assert!(argmax(&u) > 40);
}

#[test]
fn oversized_step_is_caught_by_the_finite_check() {
    let grid = line(81, (0.0, 2.0));
    let spec = BoundarySpec::periodic(&grid).unwrap();
    let mut fields = [index_hat(&grid, 20, 40)];

    let err = Stepper::new(grid, NonlinearConvection, spec, 0.025)
        .with_finite_check(true)
        .advance(&mut fields, 25)
        .unwrap_err();
    assert!(matches!(err, SimError::NonFinite { .. }), "{err:?}");
}

#[test]
fn burgers_tracks_the_sawtooth_solution() {
    let nu = 0.1;
    let grid = line(151, (0.0, 2.0 * PI));
    let spec = BoundarySpec::periodic(&grid).unwrap();
    let params = Parameters::new(0.5 / 150.0).with_viscosity(nu);
    let op = Operator::from_parameters(OperatorKind::ConvectionDiffusion, &params).unwrap();
    let mut fields = [oracle::sawtooth_field("u", &grid, 0.0, nu)];

    let mut stepper = Stepper::new(grid, op, spec, params.dt);
    stepper.advance(&mut fields, 100).unwrap();

    let exact = oracle::sawtooth_field("exact", &grid, stepper.time(), nu);
    let error = mean_abs_difference(&fields[0].snapshot(), &exact.snapshot());
    assert!(error < 0.2, "mean error {error}");
    assert!((fields[0].max() - exact.max()).abs() < 0.3);
    assert!((fields[0].min() - exact.min()).abs() < 0.3);
}

#[test]
fn chunked_runs_match_a_single_run() {
    let grid = line(41, (0.0, 2.0));
    let spec = BoundarySpec::periodic(&grid).unwrap();
    let op = Operator::from_parameters(
        OperatorKind::ConvectionDiffusion,
        &Parameters::new(0.005).with_viscosity(0.05),
    )
    .unwrap();

    let mut once = [index_hat(&grid, 10, 20)];
    Stepper::new(grid, op, spec.clone(), 0.005).advance(&mut once, 30).unwrap();

    let mut chunked = [index_hat(&grid, 10, 20)];
    let mut stepper = Stepper::new(grid, op, spec, 0.005);
    stepper.advance(&mut chunked, 12).unwrap();
    stepper.advance(&mut chunked, 18).unwrap();

    assert_eq!(stepper.steps_taken(), 30);
    assert!((stepper.time() - 0.15).abs() < 1e-12);
    assert_eq!(once[0].snapshot(), chunked[0].snapshot());
}

fn planar_hat(grid: &fdevolve::Grid, name: &str) -> Field {
    Field::new(name, grid, |x, y| oracle::hat(x, 0.5, 1.0).min(oracle::hat(y, 0.5, 1.0)))
}

fn planar_x_centroid(u: &Field) -> f64 {
    let (nx, ny) = u.shape();
    let (mut weighted, mut total) = (0.0, 0.0);
    for i in 0..nx {
        for j in 0..ny {
            let w = u.get(i, j) - 1.0;
            weighted += w * u.grid().coords(i, j).0;
            total += w;
        }
    }
    weighted / total
}

fn assert_transposed(u: &Field, v: &Field) {
    let (nx, ny) = u.shape();
    for i in 0..nx {
        for j in 0..ny {
            assert!((u.get(i, j) - v.get(j, i)).abs() < 1e-12);
        }
    }
}

#[test]
fn velocity_pair_advects_itself_in_the_plane() {
    let grid = plane([41, 41], (0.0, 2.0), (0.0, 2.0));
    let spec = BoundarySpec::uniform(&grid, EdgeRule::fixed(1.0)).unwrap();
    let mut fields = [planar_hat(&grid, "u"), planar_hat(&grid, "v")];
    let before = planar_x_centroid(&fields[0]);

    let params = Parameters::new(0.2 * grid.dx());
    advance(&grid, &mut fields, &params, OperatorKind::NonlinearConvection, &spec, 50).unwrap();

    for f in &fields {
        assert!(f.max() <= 2.0 + 1e-12 && f.min() >= 1.0 - 1e-12);
    }
    assert_transposed(&fields[0], &fields[1]);
    assert!(planar_x_centroid(&fields[0]) > before + 0.5);
}

#[test]
fn coupled_convection_diffusion_in_the_plane() {
    let grid = plane([41, 41], (0.0, 2.0), (0.0, 2.0));
    let spec = BoundarySpec::uniform(&grid, EdgeRule::fixed(1.0)).unwrap();
    let nu = 0.01;
    let dt = 0.0009 * grid.dx() * grid.dx() / nu;
    let mut fields = [planar_hat(&grid, "u"), planar_hat(&grid, "v")];

    let params = Parameters::new(dt).with_viscosity(nu);
    advance(&grid, &mut fields, &params, OperatorKind::ConvectionDiffusion, &spec, 100).unwrap();

    for f in &fields {
        assert!(f.max() <= 2.0 + 1e-12 && f.min() >= 1.0 - 1e-12);
        assert!(f.max_change() > 0.0);
        // corners and edges keep the fixed value
        assert_eq!(f.get(0, 0), 1.0);
        assert_eq!(f.get(40, 17), 1.0);
    }
    assert_transposed(&fields[0], &fields[1]);
}

#[test]
fn vector_operators_need_both_components() {
    let grid = plane([11, 11], (0.0, 1.0), (0.0, 1.0));
    let spec = BoundarySpec::uniform(&grid, EdgeRule::fixed(1.0)).unwrap();
    let mut fields = [planar_hat(&grid, "u")];
    let params = Parameters::new(0.01).with_viscosity(0.1);

    let err = advance(&grid, &mut fields, &params, OperatorKind::ConvectionDiffusion, &spec, 1)
        .unwrap_err();
    assert!(matches!(err, SimError::FieldCount { expected: 2, found: 1, .. }));

    let err = advance(&grid, &mut fields, &params, OperatorKind::Laplace, &spec, 1).unwrap_err();
    assert_eq!(err, SimError::NotExplicit(OperatorKind::Laplace));
}
