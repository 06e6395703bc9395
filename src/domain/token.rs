//! Join token extraction.
//!
//! `microk8s add-node` prints a short banner followed by the join command
//! to run on the new node:
//!
//! ```text
//! From the node you wish to join to this cluster, run the following:
//! microk8s join 10.64.140.43:25000/92b2db237428470dc4fcfc4ebbd9dc81/2c0cb3284b05
//!
//! Use the '--worker' flag to join a node as a worker not running the control plane, eg:
//! ...
//! ```
//!
//! The token is the second line. This positional contract is brittle, so it
//! lives here alone and is validated instead of indexed blindly.

use super::error::MalformedOutputError;
use super::secret::Secret;

/// Line index of the join command in `add-node` output.
pub const JOIN_TOKEN_LINE: usize = 1;

/// A single-use join credential: the full `microk8s join ...` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinToken(Secret<String>);

impl JoinToken {
    /// The join command text.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose()
    }
}

/// Extract the join token from `add-node` output.
///
/// # Errors
///
/// Returns [`MalformedOutputError::TooFewLines`] when the output has fewer
/// than two lines and [`MalformedOutputError::EmptyLine`] when the token
/// line is blank.
pub fn parse_join_token(output: &str) -> Result<JoinToken, MalformedOutputError> {
    let lines: Vec<&str> = output.lines().collect();
    let line = lines
        .get(JOIN_TOKEN_LINE)
        .ok_or(MalformedOutputError::TooFewLines {
            expected: JOIN_TOKEN_LINE + 1,
            actual: lines.len(),
        })?;

    let token = line.trim();
    if token.is_empty() {
        return Err(MalformedOutputError::EmptyLine {
            line: JOIN_TOKEN_LINE,
        });
    }
    Ok(JoinToken(Secret::new(token.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADD_NODE_OUTPUT: &str = "\
From the node you wish to join to this cluster, run the following:
microk8s join 10.64.140.43:25000/92b2db237428470dc4fcfc4ebbd9dc81/2c0cb3284b05

Use the '--worker' flag to join a node as a worker not running the control plane, eg:
microk8s join 10.64.140.43:25000/92b2db237428470dc4fcfc4ebbd9dc81/2c0cb3284b05 --worker
";

    #[test]
    fn token_is_second_line() {
        let token = parse_join_token(ADD_NODE_OUTPUT).unwrap();
        assert_eq!(
            token.expose(),
            "microk8s join 10.64.140.43:25000/92b2db237428470dc4fcfc4ebbd9dc81/2c0cb3284b05"
        );
    }

    #[test]
    fn token_is_trimmed() {
        let token = parse_join_token("banner\r\n  microk8s join a:1/b  \r\n").unwrap();
        assert_eq!(token.expose(), "microk8s join a:1/b");
    }

    #[test]
    fn single_line_output_is_rejected() {
        assert_eq!(
            parse_join_token("error: microk8s is not running"),
            Err(MalformedOutputError::TooFewLines {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            parse_join_token(""),
            Err(MalformedOutputError::TooFewLines {
                expected: 2,
                actual: 0
            })
        );
    }

    #[test]
    fn blank_token_line_is_rejected() {
        assert_eq!(
            parse_join_token("banner\n   \nmicrok8s join a:1/b\n"),
            Err(MalformedOutputError::EmptyLine { line: 1 })
        );
    }

    #[test]
    fn token_is_redacted_in_debug() {
        let token = parse_join_token(ADD_NODE_OUTPUT).unwrap();
        assert!(!format!("{token:?}").contains("25000"));
    }
}
