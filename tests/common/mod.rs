#![allow(dead_code)]

use fdevolve::{Dimensionality, Field, Grid};

pub fn line(count: usize, extent: (f64, f64)) -> Grid {
    Grid::new(Dimensionality::One, &[count], &[extent]).unwrap()
}

pub fn plane(counts: [usize; 2], x: (f64, f64), y: (f64, f64)) -> Grid {
    Grid::new(Dimensionality::Two, &counts, &[x, y]).unwrap()
}

/// `2` on the node range `[lower, upper]`, `1` elsewhere.
pub fn index_hat(grid: &Grid, lower: usize, upper: usize) -> Field {
    Field::from_index_fn("u", grid, |i, _| {
        if (lower..=upper).contains(&i) {
            2.0
        } else {
            1.0
        }
    })
}

/// Centroid of `values - 1` along x.
pub fn excess_centroid(grid: &Grid, values: &[f64]) -> f64 {
    let (weighted, total) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(weighted, total), (i, u)| {
            let w = u - 1.0;
            (weighted + w * grid.coords(i, 0).0, total + w)
        });
    weighted / total
}

pub fn mean_abs_difference(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(a, b)| (a - b).abs()).sum::<f64>() / a.len() as f64
}
