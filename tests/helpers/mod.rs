//! Test helpers module
//!
//! Fixtures, instrumented stores and a recording notifier for exercising the
//! lottery without a database or Telegram.

#![allow(dead_code)]

pub mod database_helper;
pub mod stores;
pub mod test_data;

pub use database_helper::*;
pub use stores::*;
pub use test_data::*;
