//! Per-iteration tabular metrics.
//!
//! The controller pushes a prefix, records named scalars, dumps the row and
//! pops the prefix once per iteration. Key names are stable so downstream
//! tooling can rely on them.

mod tabular;

pub use tabular::{MemoryTabular, TabularLogger, TabularRow, TracingTabular};

pub const ITERATION: &str = "Iteration";
pub const CUR_STD_MEAN: &str = "CurStdMean";
pub const AVERAGE_RETURN: &str = "AverageReturn";
pub const STD_RETURN: &str = "StdReturn";
pub const MAX_RETURN: &str = "MaxReturn";
pub const MIN_RETURN: &str = "MinReturn";
pub const AVERAGE_DISCOUNTED_RETURN: &str = "AverageDiscountedReturn";
pub const NUM_TRAJS: &str = "NumTrajs";
pub const AVG_TRAJ_LEN: &str = "AvgTrajLen";
