mod process;
mod solve;

pub use process::{SolverCommand, SolverOutput};
pub use solve::{Run, Solve};
