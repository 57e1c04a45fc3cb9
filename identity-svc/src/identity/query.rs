//! Request normalization
//!
//! Turns raw caller input into an [`IdentityQuery`]: trimmed, email
//! lower-cased, empty strings treated as absent. The resolver only ever
//! sees `Option<String>` fields and never has to tell "missing" from "".

use serde_json::{Number, Value};

use super::ResolveError;

/// Message returned when neither field carries a value
pub const MISSING_FIELDS_MESSAGE: &str = "At least one of email or phoneNumber must be provided";

/// A normalized identify request. At least one field is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityQuery {
    email: Option<String>,
    phone_number: Option<String>,
}

impl IdentityQuery {
    /// Normalize raw string input
    ///
    /// Email is trimmed and lower-cased; phone number is trimmed only
    /// (phone values are compared case-sensitively).
    pub fn new(email: Option<&str>, phone_number: Option<&str>) -> Result<Self, ResolveError> {
        let email = email
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let phone_number = phone_number
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if email.is_none() && phone_number.is_none() {
            return Err(ResolveError::InvalidRequest(MISSING_FIELDS_MESSAGE.to_string()));
        }

        Ok(Self {
            email,
            phone_number,
        })
    }

    /// Normalize loosely-typed JSON input
    ///
    /// Strings pass through, numbers are rendered as their decimal text
    /// (clients commonly send phone numbers as JSON numbers), `null` means
    /// absent. Any other JSON type is rejected.
    pub fn from_json(
        email: Option<&Value>,
        phone_number: Option<&Value>,
    ) -> Result<Self, ResolveError> {
        let email = json_text("email", email)?;
        let phone_number = json_text("phoneNumber", phone_number)?;
        Self::new(email.as_deref(), phone_number.as_deref())
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }
}

fn json_text(field: &str, value: Option<&Value>) -> Result<Option<String>, ResolveError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(number_text(n))),
        Some(_) => Err(ResolveError::InvalidRequest(format!(
            "{} must be a string or a number",
            field
        ))),
    }
}

/// Decimal text of a JSON number; integral floats (`1e3`, `1000.0`) lose
/// the fractional part so they compare equal to the integer form.
fn number_text(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        _ => n.to_string(),
    }
}
