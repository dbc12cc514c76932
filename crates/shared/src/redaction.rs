//! Secret detection and redaction utilities.
//!
//! Provides consistent logic for detecting sensitive keys and redacting
//! their values in error metadata, logs, and printed configuration.

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

/// Checks if a key name likely refers to a secret.
///
/// # Examples
///
/// ```
/// use checkconf_shared::is_secret_key;
///
/// assert!(is_secret_key("password"));
/// assert!(is_secret_key("automation_secret"));
/// assert!(!is_secret_key("aggregation_name"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    key.contains("SECRET")
        || key.contains("PASSWORD")
        || key.contains("TOKEN")
        || key.contains("API_KEY")
        || key.contains("APIKEY")
        || key.contains("CREDENTIAL")
}

/// Redacts a value if the key is likely a secret.
///
/// # Examples
///
/// ```
/// use checkconf_shared::redact_if_secret;
///
/// assert_eq!(redact_if_secret("password", "hunter2"), "[REDACTED]");
/// assert_eq!(redact_if_secret("field", "port"), "port");
/// ```
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}
