//! Motion planning domain
//!
//! A concrete world, validity backend, problem set and solver that plug into
//! the racing coordinator:
//!
//! - `Skeleton`: planar serial arm of named revolute joints
//! - `CircleObstacles`: link-versus-circle collision checks plus joint limits
//! - `PlanningProblem`: configuration goals and end effector region goals
//! - `RandomizedSolver`: seeded via-point planner producing a `Trajectory`

pub mod collision;
pub mod problem;
pub mod skeleton;
pub mod solver;
pub mod trajectory;

pub use collision::{Circle, CircleObstacles};
pub use problem::{GoalRegion, PlanningProblem, ProblemKind};
pub use skeleton::{Joint, Skeleton};
pub use solver::{RandomizedSolver, SolverConfig};
pub use trajectory::Trajectory;
