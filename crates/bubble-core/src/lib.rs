pub mod animation;
pub mod bubble;
pub mod catalogue;
pub mod config;
pub mod constants;
pub mod curves;
pub mod error;
pub mod noise;
pub mod pool;
pub mod simulator;
pub mod tracker;

pub use animation::*;
pub use bubble::*;
pub use catalogue::*;
pub use config::*;
pub use curves::*;
pub use error::{BubbleError, Result, UnknownName};
pub use noise::*;
pub use pool::*;
pub use simulator::*;
pub use tracker::*;
