//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example,
//! a [`RepositoryName`] with a [`ReleaseGuid`] even though both are strings under
//! the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: forge-assigned strings
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies a repository in `"owner/name"` format.
    ///
    /// Globally unique on the forge; used as the join key between listing
    /// results, cursor entries, and digest groups. Ordering is plain string
    /// ordering, which is what listing and digest output sort by.
    RepositoryName
}

string_id! {
    /// Identifies one release within its repository's release feed.
    ///
    /// Opaque: only compared for equality against the stored cursor.
    ReleaseGuid
}

string_id! {
    /// The login of the forge user whose starred repositories are tracked.
    UserLogin
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Opaque API credential carried to the forge on every listing request.
///
/// `Debug` is redacted so the token never ends up in logs or panic messages.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a token, returning `None` if it is empty or whitespace.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let t = token.into();
        if t.trim().is_empty() {
            None
        } else {
            Some(Self(t))
        }
    }

    /// Returns the raw token for use in an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single tracking run (one invocation of the CLI).
///
/// Generated fresh for every run and attached to the run span so all log
/// events from one run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_identifiers_are_rejected() {
        assert!(RepositoryName::new("").is_none());
        assert!(ReleaseGuid::new(String::new()).is_none());
        assert!(UserLogin::new("octocat").is_some());
    }

    #[test]
    fn repository_names_order_as_strings() {
        let mut names = vec![
            RepositoryName::new("zed/b").unwrap(),
            RepositoryName::new("alpha/z").unwrap(),
            RepositoryName::new("alpha/a").unwrap(),
        ];
        names.sort();
        let ordered: Vec<&str> = names.iter().map(RepositoryName::as_str).collect();
        assert_eq!(ordered, ["alpha/a", "alpha/z", "zed/b"]);
    }

    #[test]
    fn identifiers_serialize_as_plain_strings() {
        let guid = ReleaseGuid::new("tag:github.com,2008:Repository/1/v1.0").unwrap();
        let json = serde_json::to_string(&guid).unwrap();
        assert_eq!(json, "\"tag:github.com,2008:Repository/1/v1.0\"");
    }

    #[test]
    fn access_token_debug_is_redacted() {
        let token = AccessToken::new("ghp_secret").unwrap();
        assert!(!format!("{token:?}").contains("ghp_secret"));
        assert_eq!(token.expose(), "ghp_secret");
        assert!(AccessToken::new("   ").is_none());
    }
}
