pub mod closure;
pub mod latency;
pub mod limit;

pub use closure::FnCheck;
pub use latency::SimulatedLatencyCheck;
pub use limit::AmountLimitCheck;
