#![warn(clippy::pedantic)]
#![warn(clippy::perf)]
#![warn(clippy::style)]
#![warn(clippy::correctness)]
#![warn(clippy::complexity)]
#![warn(clippy::suspicious)]
#![warn(clippy::cargo)]

pub mod config;
pub mod error;
pub mod operation_history;
pub mod shared_state;
pub mod traits;

pub mod prelude {
	pub use crate::config::HistoryConfig;
	pub use crate::error::HistoryError;
	pub use crate::operation_history::{OperationHistory, Recorded};
	pub use crate::shared_state::SharedState;
	pub use crate::traits::operation::{BoxedOperation, Merge, Operation};
}
