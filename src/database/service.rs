//! Database service layer
//!
//! Bundles the repositories that share one pool

use std::sync::Arc;
use crate::database::{DatabasePool, EventRepository, WaitingListRepository};
use crate::lottery::store::{EventStore, WaitingListStore};

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub events: EventRepository,
    pub waiting_list: WaitingListRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            waiting_list: WaitingListRepository::new(pool),
        }
    }

    pub fn event_store(&self) -> Arc<dyn EventStore> {
        Arc::new(self.events.clone())
    }

    pub fn waiting_list_store(&self) -> Arc<dyn WaitingListStore> {
        Arc::new(self.waiting_list.clone())
    }
}
