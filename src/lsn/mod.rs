//! Log sequence numbers and replication-progress waiting
//!
//! - `Lsn`: totally ordered log position
//! - `LsnWaitList`: fire callbacks once the applied position catches up

mod errors;
mod position;
mod wait_list;

pub use errors::{LsnError, LsnResult};
pub use position::Lsn;
pub use wait_list::{LsnWaitList, WaitHandle};
