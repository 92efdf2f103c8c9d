//! Planar serial arm
//!
//! A skeleton is a chain of named revolute joints rooted at a fixed base.
//! Joint `i` rotates link `i`, and link angles accumulate down the chain, so
//! the frame of joint `i + 1` sits at the end of link `i`.

use crate::error::CloneError;
use crate::world::World;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::PI;

/// One revolute joint and the link it drives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    pub name: String,
    /// Length of the link driven by this joint
    pub length: f64,
    #[serde(default = "default_lower")]
    pub lower: f64,
    #[serde(default = "default_upper")]
    pub upper: f64,
    #[serde(default)]
    pub position: f64,
}

fn default_lower() -> f64 {
    -PI
}

fn default_upper() -> f64 {
    PI
}

impl Joint {
    pub fn new(name: impl Into<String>, length: f64) -> Self {
        Self {
            name: name.into(),
            length,
            lower: default_lower(),
            upper: default_upper(),
            position: 0.0,
        }
    }

    /// Replace the position limits
    pub fn with_limits(mut self, lower: f64, upper: f64) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    pub fn contains(&self, position: f64) -> bool {
        position >= self.lower && position <= self.upper
    }
}

/// Planar serial arm
///
/// Deliberately not `Clone`: copies go through `World::try_clone`, which
/// validates the source first.
#[derive(Debug, PartialEq)]
pub struct Skeleton {
    name: String,
    base: [f64; 2],
    joints: Vec<Joint>,
}

impl Skeleton {
    pub fn new(name: impl Into<String>, joints: Vec<Joint>) -> Self {
        Self {
            name: name.into(),
            base: [0.0, 0.0],
            joints,
        }
    }

    /// Arm with one joint per link length, named `j0`, `j1`, ...
    pub fn planar_arm(name: impl Into<String>, lengths: &[f64]) -> Self {
        let joints = lengths
            .iter()
            .enumerate()
            .map(|(i, &length)| Joint::new(format!("j{}", i), length))
            .collect();
        Self::new(name, joints)
    }

    /// Move the base of the arm
    pub fn with_base(mut self, x: f64, y: f64) -> Self {
        self.base = [x, y];
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> [f64; 2] {
        self.base
    }

    /// Degrees of freedom
    pub fn dof(&self) -> usize {
        self.joints.len()
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, name: &str) -> Option<&Joint> {
        self.joints.iter().find(|j| j.name == name)
    }

    pub fn joint_names(&self) -> Vec<&str> {
        self.joints.iter().map(|j| j.name.as_str()).collect()
    }

    /// Lower and upper limit per joint
    pub fn limits(&self) -> Vec<(f64, f64)> {
        self.joints.iter().map(|j| (j.lower, j.upper)).collect()
    }

    pub fn positions(&self) -> Vec<f64> {
        self.joints.iter().map(|j| j.position).collect()
    }

    /// Set joint positions in chain order
    ///
    /// Extra values are ignored and missing ones leave the remaining joints
    /// where they are; callers compare against `dof()` first.
    pub fn set_positions(&mut self, positions: &[f64]) {
        for (joint, &position) in self.joints.iter_mut().zip(positions) {
            joint.position = position;
        }
    }

    /// Returns true if every joint is inside its limits
    pub fn within_limits(&self) -> bool {
        self.joints.iter().all(|j| j.contains(j.position))
    }

    /// Position of every joint frame plus the end effector
    ///
    /// The result has `dof() + 1` points, starting with the base.
    pub fn frames(&self) -> Vec<[f64; 2]> {
        let mut frames = Vec::with_capacity(self.joints.len() + 1);
        let mut point = self.base;
        let mut angle = 0.0;
        frames.push(point);
        for joint in &self.joints {
            angle += joint.position;
            point = [
                point[0] + joint.length * angle.cos(),
                point[1] + joint.length * angle.sin(),
            ];
            frames.push(point);
        }
        frames
    }

    pub fn end_effector(&self) -> [f64; 2] {
        let mut point = self.base;
        let mut angle = 0.0;
        for joint in &self.joints {
            angle += joint.position;
            point[0] += joint.length * angle.cos();
            point[1] += joint.length * angle.sin();
        }
        point
    }

    /// Check that the skeleton is well formed
    pub fn validate(&self) -> Result<(), CloneError> {
        if !self.base.iter().all(|v| v.is_finite()) {
            return Err(CloneError::Malformed(format!(
                "skeleton '{}' has a non-finite base",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for joint in &self.joints {
            if !seen.insert(joint.name.as_str()) {
                return Err(CloneError::Malformed(format!(
                    "skeleton '{}' has duplicate joint '{}'",
                    self.name, joint.name
                )));
            }
            let values = [joint.length, joint.lower, joint.upper, joint.position];
            if !values.iter().all(|v| v.is_finite()) {
                return Err(CloneError::Malformed(format!(
                    "joint '{}' has a non-finite value",
                    joint.name
                )));
            }
            if joint.length < 0.0 {
                return Err(CloneError::Malformed(format!(
                    "joint '{}' has negative length {}",
                    joint.name, joint.length
                )));
            }
            if joint.lower > joint.upper {
                return Err(CloneError::Malformed(format!(
                    "joint '{}' has inverted limits [{}, {}]",
                    joint.name, joint.lower, joint.upper
                )));
            }
        }
        Ok(())
    }
}

impl World for Skeleton {
    fn try_clone(&self) -> Result<Self, CloneError> {
        self.validate()?;
        Ok(Self {
            name: self.name.clone(),
            base: self.base,
            joints: self.joints.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn close(a: [f64; 2], b: [f64; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-9 && (a[1] - b[1]).abs() < 1e-9
    }

    #[test]
    fn test_planar_arm_names_joints() {
        let arm = Skeleton::planar_arm("arm", &[1.0, 0.5, 0.25]);
        assert_eq!(arm.dof(), 3);
        assert_eq!(arm.joint_names(), vec!["j0", "j1", "j2"]);
        assert_eq!(arm.joint("j1").map(|j| j.length), Some(0.5));
        assert!(arm.joint("j9").is_none());
    }

    #[test]
    fn test_forward_kinematics() {
        let mut arm = Skeleton::planar_arm("arm", &[1.0, 1.0]);
        assert!(close(arm.end_effector(), [2.0, 0.0]));

        arm.set_positions(&[PI / 2.0, 0.0]);
        assert!(close(arm.end_effector(), [0.0, 2.0]));

        arm.set_positions(&[0.0, PI / 2.0]);
        let frames = arm.frames();
        assert_eq!(frames.len(), 3);
        assert!(close(frames[0], [0.0, 0.0]));
        assert!(close(frames[1], [1.0, 0.0]));
        assert!(close(frames[2], [1.0, 1.0]));
        assert!(close(arm.end_effector(), frames[2]));
    }

    #[test]
    fn test_base_offsets_every_frame() {
        let arm = Skeleton::planar_arm("arm", &[1.0]).with_base(2.0, -1.0);
        let frames = arm.frames();
        assert!(close(frames[0], [2.0, -1.0]));
        assert!(close(frames[1], [3.0, -1.0]));
    }

    #[test]
    fn test_within_limits() {
        let mut arm = Skeleton::new("arm", vec![Joint::new("shoulder", 1.0).with_limits(-1.0, 1.0)]);
        arm.set_positions(&[0.5]);
        assert!(arm.within_limits());
        arm.set_positions(&[1.5]);
        assert!(!arm.within_limits());
    }

    #[test]
    fn test_try_clone_preserves_names() {
        let arm = Skeleton::new(
            "arm",
            vec![Joint::new("shoulder", 1.0), Joint::new("elbow", 0.8)],
        );
        let copy = arm.try_clone().unwrap();
        assert_eq!(copy.name(), "arm");
        assert_eq!(copy.joint_names(), vec!["shoulder", "elbow"]);
        assert_eq!(copy, arm);
    }

    #[test]
    fn test_try_clone_is_independent() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let original = Skeleton::planar_arm("arm", &[1.0, 1.0, 1.0]);

        for _ in 0..50 {
            let mut a = original.try_clone().unwrap();
            let b = original.try_clone().unwrap();
            let q: Vec<f64> = (0..3).map(|_| rng.gen_range(-PI..PI)).collect();
            a.set_positions(&q);

            assert_eq!(a.positions(), q);
            assert_eq!(b.positions(), vec![0.0; 3]);
            assert_eq!(original.positions(), vec![0.0; 3]);
        }
    }

    #[test]
    fn test_try_clone_rejects_malformed() {
        let inverted = Skeleton::new("arm", vec![Joint::new("j0", 1.0).with_limits(1.0, -1.0)]);
        assert!(matches!(inverted.try_clone(), Err(CloneError::Malformed(_))));

        let mut nan = Skeleton::planar_arm("arm", &[1.0]);
        nan.set_positions(&[f64::NAN]);
        assert!(matches!(nan.try_clone(), Err(CloneError::Malformed(_))));

        let duplicate = Skeleton::new("arm", vec![Joint::new("j", 1.0), Joint::new("j", 1.0)]);
        assert!(matches!(duplicate.try_clone(), Err(CloneError::Malformed(_))));

        let negative = Skeleton::planar_arm("arm", &[-1.0]);
        assert!(matches!(negative.try_clone(), Err(CloneError::Malformed(_))));
    }

    #[test]
    fn test_joint_defaults_from_toml() {
        let joint: Joint = ::toml::from_str("name = \"j0\"\nlength = 1.5").unwrap();
        assert_eq!(joint.length, 1.5);
        assert_eq!(joint.lower, -PI);
        assert_eq!(joint.upper, PI);
        assert_eq!(joint.position, 0.0);
    }
}
