//! Contact persistence
//!
//! [`SqliteContactStore`] borrows one open transaction, so every query a
//! resolution issues shares a single snapshot and commits or rolls back
//! together.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use identity_common::time;
use identity_common::{Contact, LinkPrecedence, NewContact};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, Transaction};

use crate::identity::{ContactStore, ResolveError};

const CONTACT_COLUMNS: &str =
    "id, email, phone_number, link_precedence, linked_id, created_at, updated_at, deleted_at";

/// Contact store over an open SQLite transaction
pub struct SqliteContactStore<'t, 'c> {
    tx: &'t mut Transaction<'c, Sqlite>,
}

impl<'t, 'c> SqliteContactStore<'t, 'c> {
    pub fn new(tx: &'t mut Transaction<'c, Sqlite>) -> Self {
        Self { tx }
    }
}

/// Fixed-width UTC text (`2024-01-01T00:00:00.000000Z`) so that string
/// order in SQL equals chronological order.
fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, ResolveError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| ResolveError::Internal(format!("Invalid {} '{}': {}", column, raw, e)))
}

fn contact_from_row(row: &SqliteRow) -> Result<Contact, ResolveError> {
    let link_precedence: String = row.try_get("link_precedence")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    let deleted_at: Option<String> = row.try_get("deleted_at")?;

    Ok(Contact {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        phone_number: row.try_get("phone_number")?,
        link_precedence: link_precedence.parse::<LinkPrecedence>()?,
        linked_id: row.try_get("linked_id")?,
        created_at: decode_timestamp("created_at", &created_at)?,
        updated_at: decode_timestamp("updated_at", &updated_at)?,
        deleted_at: deleted_at
            .as_deref()
            .map(|raw| decode_timestamp("deleted_at", raw))
            .transpose()?,
    })
}

fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    qb.push("(");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}

#[async_trait]
impl<'t, 'c> ContactStore for SqliteContactStore<'t, 'c> {
    async fn find_matching(
        &mut self,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<Vec<Contact>, ResolveError> {
        if email.is_none() && phone_number.is_none() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM contacts WHERE deleted_at IS NULL AND (",
            CONTACT_COLUMNS
        ));
        if let Some(email) = email {
            qb.push("email = ").push_bind(email.to_string());
        }
        if let Some(phone_number) = phone_number {
            if email.is_some() {
                qb.push(" OR ");
            }
            qb.push("phone_number = ").push_bind(phone_number.to_string());
        }
        qb.push(") ORDER BY created_at ASC, id ASC");

        let rows = qb.build().fetch_all(&mut **self.tx).await?;
        rows.iter().map(contact_from_row).collect()
    }

    async fn find_clusters(&mut self, primary_ids: &[i64]) -> Result<Vec<Contact>, ResolveError> {
        if primary_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM contacts WHERE deleted_at IS NULL AND (id IN ",
            CONTACT_COLUMNS
        ));
        push_id_list(&mut qb, primary_ids);
        qb.push(" OR linked_id IN ");
        push_id_list(&mut qb, primary_ids);
        qb.push(") ORDER BY created_at ASC, id ASC");

        let rows = qb.build().fetch_all(&mut **self.tx).await?;
        rows.iter().map(contact_from_row).collect()
    }

    async fn find_by_id(&mut self, id: i64) -> Result<Option<Contact>, ResolveError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM contacts WHERE id = ? AND deleted_at IS NULL",
            CONTACT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **self.tx)
        .await?;

        row.as_ref().map(contact_from_row).transpose()
    }

    async fn create(&mut self, contact: NewContact) -> Result<Contact, ResolveError> {
        let now = encode_timestamp(time::now());

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO contacts (email, phone_number, link_precedence, linked_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            CONTACT_COLUMNS
        ))
        .bind(&contact.email)
        .bind(&contact.phone_number)
        .bind(contact.link_precedence.as_str())
        .bind(contact.linked_id)
        .bind(&now)
        .bind(&now)
        .fetch_one(&mut **self.tx)
        .await?;

        contact_from_row(&row)
    }

    async fn reparent(&mut self, from_ids: &[i64], to: i64) -> Result<u64, ResolveError> {
        if from_ids.is_empty() {
            return Ok(0);
        }

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE contacts SET linked_id = ");
        qb.push_bind(to)
            .push(", updated_at = ")
            .push_bind(encode_timestamp(time::now()))
            .push(" WHERE linked_id IN ");
        push_id_list(&mut qb, from_ids);

        let result = qb.build().execute(&mut **self.tx).await?;
        Ok(result.rows_affected())
    }

    async fn demote(&mut self, ids: &[i64], to: i64) -> Result<u64, ResolveError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE contacts SET link_precedence = ");
        qb.push_bind(LinkPrecedence::Secondary.as_str())
            .push(", linked_id = ")
            .push_bind(to)
            .push(", updated_at = ")
            .push_bind(encode_timestamp(time::now()))
            .push(" WHERE link_precedence = ")
            .push_bind(LinkPrecedence::Primary.as_str())
            .push(" AND id IN ");
        push_id_list(&mut qb, ids);

        let result = qb.build().execute(&mut **self.tx).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_text_is_fixed_width_and_ordered() {
        let a = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let b = DateTime::from_timestamp(1_700_000_000, 500_000_000).unwrap();

        let (ea, eb) = (encode_timestamp(a), encode_timestamp(b));
        assert_eq!(ea, "2023-11-14T22:13:20.000000Z");
        assert_eq!(ea.len(), eb.len());
        assert!(ea < eb);
        assert_eq!(decode_timestamp("created_at", &eb).unwrap(), b);
    }

    #[test]
    fn test_bad_timestamp_is_internal_error() {
        let err = decode_timestamp("created_at", "yesterday").unwrap_err();
        assert!(matches!(err, ResolveError::Internal(_)));
    }
}
