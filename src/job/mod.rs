//! Job lifecycle: one translation at a time, observed through snapshots.

mod controller;
mod state;

pub use controller::{JobController, JobOptions};
pub use state::{JobPhase, JobSnapshot};
