//! Leave planning core: date interval predicates, the leave request
//! state machine, and the calendar month grid builder. Everything in
//! here is framework-free; the HTTP layer in `api` maps it onto
//! requests and responses.

pub mod calendar;
pub mod interval;
pub mod state;
pub mod store;

pub use state::{LeaveDecision, PlanningError};
pub use store::{LeaveStore, MemoryLeaveStore, NewLeave, SqliteLeaveStore};
