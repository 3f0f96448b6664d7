// Analyzer module: the three independent ecosystem analyses.
// Each one is a pure function of the records it is handed.

pub mod corporate;
pub mod influence;
pub mod trend;
