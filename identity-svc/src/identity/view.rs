//! Identity view projection

use identity_common::Contact;
use serde::{Deserialize, Serialize};

/// Externally visible shape of a resolved cluster
///
/// `primaryContatctId` is misspelled on the wire for compatibility with
/// existing clients; renaming it requires a new API version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityView {
    #[serde(rename = "primaryContatctId")]
    pub primary_contact_id: i64,
    pub emails: Vec<String>,
    pub phone_numbers: Vec<String>,
    pub secondary_contact_ids: Vec<i64>,
}

/// Project a cluster into an [`IdentityView`]
///
/// The canonical contact's own values come first; the rest follow in
/// first-seen order of `members`, each value once.
pub fn project(canonical: &Contact, members: &[Contact]) -> IdentityView {
    let others: Vec<&Contact> = members.iter().filter(|c| c.id != canonical.id).collect();

    let mut emails = Vec::new();
    let mut phone_numbers = Vec::new();
    push_unique(&mut emails, canonical.email.as_deref());
    push_unique(&mut phone_numbers, canonical.phone_number.as_deref());
    for contact in &others {
        push_unique(&mut emails, contact.email.as_deref());
        push_unique(&mut phone_numbers, contact.phone_number.as_deref());
    }

    IdentityView {
        primary_contact_id: canonical.id,
        emails,
        phone_numbers,
        secondary_contact_ids: others.iter().map(|c| c.id).collect(),
    }
}

fn push_unique(values: &mut Vec<String>, value: Option<&str>) {
    if let Some(value) = value {
        if !values.iter().any(|v| v == value) {
            values.push(value.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use identity_common::LinkPrecedence;

    fn contact(id: i64, email: Option<&str>, phone: Option<&str>, linked_id: Option<i64>) -> Contact {
        let created_at = Utc::now() + Duration::seconds(id);
        Contact {
            id,
            email: email.map(str::to_string),
            phone_number: phone.map(str::to_string),
            link_precedence: if linked_id.is_some() {
                LinkPrecedence::Secondary
            } else {
                LinkPrecedence::Primary
            },
            linked_id,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        }
    }

    #[test]
    fn test_single_contact() {
        let p = contact(1, Some("a@x.com"), None, None);
        let view = project(&p, &[p.clone()]);

        assert_eq!(view.primary_contact_id, 1);
        assert_eq!(view.emails, vec!["a@x.com"]);
        assert!(view.phone_numbers.is_empty());
        assert!(view.secondary_contact_ids.is_empty());
    }

    #[test]
    fn test_canonical_values_first_even_when_listed_last() {
        let p = contact(1, Some("lorraine@hillvalley.edu"), Some("123456"), None);
        let s1 = contact(23, Some("mcfly@hillvalley.edu"), Some("123456"), Some(1));
        let s2 = contact(24, None, Some("999"), Some(1));

        let view = project(&p, &[s1.clone(), s2.clone(), p.clone()]);

        assert_eq!(view.emails, vec!["lorraine@hillvalley.edu", "mcfly@hillvalley.edu"]);
        assert_eq!(view.phone_numbers, vec!["123456", "999"]);
        assert_eq!(view.secondary_contact_ids, vec![23, 24]);
    }

    #[test]
    fn test_values_are_deduplicated() {
        let p = contact(1, Some("a@x.com"), Some("111"), None);
        let s1 = contact(2, Some("a@x.com"), Some("222"), Some(1));
        let s2 = contact(3, Some("b@x.com"), Some("222"), Some(1));
        let s3 = contact(4, Some("b@x.com"), Some("111"), Some(1));

        let view = project(&p, &[p.clone(), s1, s2, s3]);

        assert_eq!(view.emails, vec!["a@x.com", "b@x.com"]);
        assert_eq!(view.phone_numbers, vec!["111", "222"]);
        assert_eq!(view.secondary_contact_ids, vec![2, 3, 4]);
    }

    #[test]
    fn test_canonical_without_email() {
        let p = contact(1, None, Some("111"), None);
        let s1 = contact(2, Some("a@x.com"), Some("111"), Some(1));

        let view = project(&p, &[p.clone(), s1]);

        assert_eq!(view.emails, vec!["a@x.com"]);
        assert_eq!(view.phone_numbers, vec!["111"]);
    }

    #[test]
    fn test_wire_field_names() {
        let p = contact(7, Some("a@x.com"), Some("111"), None);
        let json = serde_json::to_value(project(&p, &[p.clone()])).unwrap();

        assert_eq!(json["primaryContatctId"], 7);
        assert_eq!(json["emails"][0], "a@x.com");
        assert_eq!(json["phoneNumbers"][0], "111");
        assert!(json["secondaryContactIds"].as_array().unwrap().is_empty());
    }
}
