//! Waiting-list lottery
//!
//! Given an event's seat targets and its waiting pool, decides how many
//! entrants to draw, draws them uniformly without replacement and commits
//! the WAITING -> SELECTED transitions under a per-event run lock.

pub mod capacity;
pub mod coordinator;
pub mod engine;
pub mod lock;
pub mod memory;
pub mod notify;
pub mod store;

pub use capacity::{num_to_draw, DrawTarget};
pub use coordinator::{DrawPreview, LotteryRun, LotteryRunCoordinator, RunOutcome};
pub use engine::{Draw, DrawPlan, LotteryEngine, PoolSnapshot};
pub use lock::{LocalRunLock, RedisRunLock, RunLease, RunLock};
pub use memory::MemoryStore;
pub use notify::{DeliveryReport, LotteryNotice, NoticeKind, NotificationDispatcher};
pub use store::{transition_excluding_conflicts, EventStore, TransitionResult, WaitingListStore};
