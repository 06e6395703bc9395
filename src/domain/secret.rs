//! Redacting wrapper for sensitive values.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::MalformedOutputError;

const REDACTED: &str = "[secret]";

/// A value that must never show up in logs or terminal output.
///
/// `Debug` and `Display` print a placeholder; the value is only reachable
/// through [`Secret::expose`]. Serialization is transparent so the state
/// file keeps the real value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret<T>(T);

impl<T> Secret<T> {
    /// Wrap a value.
    pub const fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the wrapped value.
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

/// The master's admin kubeconfig.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterCredential(Secret<String>);

impl ClusterCredential {
    /// Wrap the raw `microk8s config` output.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedOutputError::EmptyOutput`] for blank output.
    pub fn from_output(output: &str) -> Result<Self, MalformedOutputError> {
        if output.trim().is_empty() {
            return Err(MalformedOutputError::EmptyOutput);
        }
        Ok(Self(Secret::new(output.to_string())))
    }

    /// The kubeconfig text.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_and_display_are_redacted() {
        let secret = Secret::new("hunter2".to_string());
        assert_eq!(format!("{secret:?}"), "[secret]");
        assert_eq!(secret.to_string(), "[secret]");
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn credential_serializes_in_plain_text() {
        let credential = ClusterCredential::from_output("apiVersion: v1\n").unwrap();
        let json = serde_json::to_string(&credential).unwrap();
        assert_eq!(json, r#""apiVersion: v1\n""#);
        assert!(!format!("{credential:?}").contains("apiVersion"));
    }

    #[test]
    fn blank_credential_is_rejected() {
        assert_eq!(
            ClusterCredential::from_output(" \n"),
            Err(MalformedOutputError::EmptyOutput)
        );
    }
}
