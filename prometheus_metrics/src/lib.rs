pub use crate::metrics::{Metrics, OperationResult};

mod metrics;
