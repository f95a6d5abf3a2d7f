//! The two pipeline entry points: washing and rebalancing.

mod sample;
mod wash;

pub use sample::{sample_data, SampleMethod};
pub use wash::{wash_data, WashReport};
