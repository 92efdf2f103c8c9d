//! Joint space trajectory returned by planning solvers

use serde::Serialize;

/// Piecewise linear path through joint space
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    pub waypoints: Vec<Vec<f64>>,
}

impl Trajectory {
    pub fn new(waypoints: Vec<Vec<f64>>) -> Self {
        Self { waypoints }
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn start(&self) -> Option<&[f64]> {
        self.waypoints.first().map(Vec::as_slice)
    }

    pub fn end(&self) -> Option<&[f64]> {
        self.waypoints.last().map(Vec::as_slice)
    }

    /// Sum of Euclidean joint space distances between consecutive waypoints
    pub fn path_length(&self) -> f64 {
        self.waypoints
            .windows(2)
            .map(|pair| distance(&pair[0], &pair[1]))
            .sum()
    }
}

pub(crate) fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
