use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wrapper for contact data that must not end up in log output.
///
/// Debug and Display render a fixed mask; Serialize passes the inner value
/// through unchanged so persisted documents keep the real data. Wrap a
/// field in this before handing it to a tracing macro.
#[derive(Clone, Deserialize)]
pub struct Redacted<T>(pub T);

impl<T> Redacted<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl<T> fmt::Display for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl<T: Serialize> Serialize for Redacted<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

/// Partial mask for an e-mail address, for log lines that need enough of
/// the address to correlate a report with a record: first character of the
/// local part plus the domain.
pub fn redact_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let head: String = local.chars().take(1).collect();
            format!("{}***@{}", head, domain)
        }
        _ => "<invalid-email>".to_string(),
    }
}

/// Mask for a phone number: keeps the leading `+` and the last two digits.
pub fn redact_phone(phone: &str) -> String {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if digits < 3 {
        return "<redacted>".to_string();
    }
    let tail: String = phone.chars().skip(phone.chars().count() - 2).collect();
    let prefix = if phone.starts_with('+') { "+" } else { "" };
    format!("{}***{}", prefix, tail)
}
