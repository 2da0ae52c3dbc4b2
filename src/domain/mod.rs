pub mod category;
pub mod process;
pub mod reading;

pub use category::MetricCategory;
pub use process::{SupervisedProcess, SupervisorState};
pub use reading::{CpuUsage, CtxSwitches, Reading};
