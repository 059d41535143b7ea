//! Database repositories module
//!
//! Postgres implementations of the lottery storage seams

pub mod event;
pub mod waiting_list;

pub use event::{CreateEventRequest, EventRepository};
pub use waiting_list::WaitingListRepository;
