pub mod client;
pub mod de;
pub mod downsample;
pub mod timestamp;
pub mod types;
pub mod window;

pub use client::{ApiConfig, TelemetryClient};
pub use downsample::filter_by_interval;
pub use timestamp::{Timestamp, Timestamped};
pub use window::TimeWindow;
