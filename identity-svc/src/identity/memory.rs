//! In-memory [`ContactStore`] for tests
//!
//! Rows live in a `Vec` in insertion order. Timestamps come from a
//! deterministic clock that advances one second per created row, so tests
//! can reason about creation order without sleeping.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use identity_common::{Contact, LinkPrecedence, NewContact};

use super::{ContactStore, ResolveError};

#[derive(Debug, Clone)]
pub struct MemoryContactStore {
    rows: Vec<Contact>,
    next_id: i64,
    clock: DateTime<Utc>,
}

impl Default for MemoryContactStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContactStore {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
            clock: DateTime::from_timestamp(1_680_307_200, 0).unwrap_or_default(), // 2023-04-01
        }
    }

    /// Insert a row with an explicit creation time
    pub fn insert_at(&mut self, contact: NewContact, created_at: DateTime<Utc>) -> Contact {
        let row = Contact {
            id: self.next_id,
            email: contact.email,
            phone_number: contact.phone_number,
            link_precedence: contact.link_precedence,
            linked_id: contact.linked_id,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        };
        self.next_id += 1;
        self.rows.push(row.clone());
        row
    }

    /// Mark a row deleted; it disappears from every read
    pub fn soft_delete(&mut self, id: i64) {
        let now = self.tick();
        if let Some(row) = self.rows.iter_mut().find(|r| r.id == id) {
            row.deleted_at = Some(now);
        }
    }

    /// All rows, deleted ones included
    pub fn rows(&self) -> &[Contact] {
        &self.rows
    }

    pub fn get(&self, id: i64) -> Option<&Contact> {
        self.rows.iter().find(|r| r.id == id)
    }

    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += Duration::seconds(1);
        self.clock
    }

    fn live(&self) -> impl Iterator<Item = &Contact> {
        self.rows.iter().filter(|r| r.deleted_at.is_none())
    }

    fn sorted(mut rows: Vec<Contact>) -> Vec<Contact> {
        rows.sort_by_key(|r| (r.created_at, r.id));
        rows
    }
}

#[async_trait]
impl ContactStore for MemoryContactStore {
    async fn find_matching(
        &mut self,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<Vec<Contact>, ResolveError> {
        let rows = self
            .live()
            .filter(|r| {
                let email_hit = email.is_some() && r.email.as_deref() == email;
                let phone_hit = phone_number.is_some() && r.phone_number.as_deref() == phone_number;
                email_hit || phone_hit
            })
            .cloned()
            .collect();
        Ok(Self::sorted(rows))
    }

    async fn find_clusters(&mut self, primary_ids: &[i64]) -> Result<Vec<Contact>, ResolveError> {
        let rows = self
            .live()
            .filter(|r| {
                primary_ids.contains(&r.id)
                    || r.linked_id.map(|l| primary_ids.contains(&l)).unwrap_or(false)
            })
            .cloned()
            .collect();
        Ok(Self::sorted(rows))
    }

    async fn find_by_id(&mut self, id: i64) -> Result<Option<Contact>, ResolveError> {
        Ok(self.live().find(|r| r.id == id).cloned())
    }

    async fn create(&mut self, contact: NewContact) -> Result<Contact, ResolveError> {
        let created_at = self.tick();
        Ok(self.insert_at(contact, created_at))
    }

    async fn reparent(&mut self, from_ids: &[i64], to: i64) -> Result<u64, ResolveError> {
        let now = self.tick();
        let mut affected = 0;
        for row in self.rows.iter_mut() {
            if row.linked_id.map(|l| from_ids.contains(&l)).unwrap_or(false) {
                row.linked_id = Some(to);
                row.updated_at = now;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn demote(&mut self, ids: &[i64], to: i64) -> Result<u64, ResolveError> {
        let now = self.tick();
        let mut affected = 0;
        for row in self.rows.iter_mut() {
            if ids.contains(&row.id) && row.link_precedence == LinkPrecedence::Primary {
                row.link_precedence = LinkPrecedence::Secondary;
                row.linked_id = Some(to);
                row.updated_at = now;
                affected += 1;
            }
        }
        Ok(affected)
    }
}
