//! Circle obstacle validity backend
//!
//! A configuration is valid when every joint is inside its limits and no link
//! segment comes within `radius + margin` of any obstacle center.

use super::skeleton::Skeleton;
use crate::error::CloneError;
use crate::world::ValidityBackend;
use serde::{Deserialize, Serialize};

/// Circular obstacle in the arm's plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Circle {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self { x, y, radius }
    }

    /// Returns true if segment `a`-`b` comes within `radius + margin`
    pub fn hits_segment(&self, a: [f64; 2], b: [f64; 2], margin: f64) -> bool {
        let reach = self.radius + margin;
        segment_distance_sq([self.x, self.y], a, b) <= reach * reach
    }
}

/// Squared distance from `p` to the segment `a`-`b`
fn segment_distance_sq(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    let d = [b[0] - a[0], b[1] - a[1]];
    let v = [p[0] - a[0], p[1] - a[1]];
    let len_sq = d[0] * d[0] + d[1] * d[1];
    let t = if len_sq > 0.0 {
        ((v[0] * d[0] + v[1] * d[1]) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let dx = v[0] - t * d[0];
    let dy = v[1] - t * d[1];
    dx * dx + dy * dy
}

/// Collision checker against a fixed set of circles
#[derive(Debug, Clone)]
pub struct CircleObstacles {
    obstacles: Vec<Circle>,
    margin: f64,
    dof: Option<usize>,
    checks: u64,
}

impl CircleObstacles {
    pub fn new(obstacles: Vec<Circle>) -> Self {
        Self {
            obstacles,
            margin: 0.0,
            dof: None,
            checks: 0,
        }
    }

    /// Extra clearance required around every obstacle
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    pub fn obstacles(&self) -> &[Circle] {
        &self.obstacles
    }

    /// Degrees of freedom of the installed skeleton
    pub fn installed_dof(&self) -> Option<usize> {
        self.dof
    }

    /// Number of validity checks run by this instance
    pub fn checks(&self) -> u64 {
        self.checks
    }

    fn collides(&self, world: &Skeleton) -> bool {
        let frames = world.frames();
        frames.windows(2).any(|link| {
            self.obstacles
                .iter()
                .any(|c| c.hits_segment(link[0], link[1], self.margin))
        })
    }
}

impl ValidityBackend<Skeleton> for CircleObstacles {
    fn name(&self) -> &str {
        "circle_obstacles"
    }

    fn install(&mut self, world: &Skeleton) -> Result<(), CloneError> {
        if world.dof() == 0 {
            return Err(CloneError::BackendRejected {
                backend: self.name().to_string(),
                reason: format!("skeleton '{}' has 0 degrees of freedom", world.name()),
            });
        }
        self.dof = Some(world.dof());
        Ok(())
    }

    fn is_valid(&mut self, world: &Skeleton) -> bool {
        self.checks += 1;
        world.within_limits() && !self.collides(world)
    }
}
