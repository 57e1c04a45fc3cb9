//! Database access for identity-svc
//!
//! Pool creation and schema live in `identity_common::db`; this module holds
//! the transactional contact store the resolver runs against.

mod contacts;

pub use contacts::SqliteContactStore;
