use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SharedError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn parse(s: &str) -> Result<Self, SharedError> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| SharedError::InvalidId(s.to_string()))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = SharedError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

uuid_id!(
    /// Identity of a registered (or pre-seeded) account.
    UserId
);
uuid_id!(
    /// Identity of an uploaded photo.
    PhotoId
);
uuid_id!(
    /// Identity of a comment, unique within its parent photo.
    CommentId
);
uuid_id!(ActivityId);

/// The closed set of events recorded in the activity log.
///
/// The serialized names are the ones clients display verbatim.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    #[serde(rename = "Photo Upload")]
    PhotoUpload,
    #[serde(rename = "New Comment")]
    NewComment,
    #[serde(rename = "User Registration")]
    UserRegistration,
    #[serde(rename = "User Login")]
    UserLogin,
    #[serde(rename = "User Logout")]
    UserLogout,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 5] = [
        ActivityKind::PhotoUpload,
        ActivityKind::NewComment,
        ActivityKind::UserRegistration,
        ActivityKind::UserLogin,
        ActivityKind::UserLogout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::PhotoUpload => "Photo Upload",
            ActivityKind::NewComment => "New Comment",
            ActivityKind::UserRegistration => "User Registration",
            ActivityKind::UserLogin => "User Login",
            ActivityKind::UserLogout => "User Logout",
        }
    }

    /// Whether entries of this kind reference a photo.
    pub fn concerns_photo(&self) -> bool {
        matches!(self, ActivityKind::PhotoUpload | ActivityKind::NewComment)
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SharedError::UnknownActivityKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_parse() {
        let id = UserId::new();
        let parsed: UserId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_invalid_id_rejected() {
        assert_eq!(
            PhotoId::parse("not-an-id"),
            Err(SharedError::InvalidId("not-an-id".to_string()))
        );
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = CommentId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));
    }

    #[test]
    fn test_activity_kind_names() {
        for kind in ActivityKind::ALL {
            assert_eq!(kind.as_str().parse::<ActivityKind>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_unknown_activity_kind_rejected() {
        assert!("Password Created".parse::<ActivityKind>().is_err());
        assert!(serde_json::from_str::<ActivityKind>("\"Photo Deleted\"").is_err());
    }

    #[test]
    fn test_concerns_photo() {
        assert!(ActivityKind::PhotoUpload.concerns_photo());
        assert!(ActivityKind::NewComment.concerns_photo());
        assert!(!ActivityKind::UserLogin.concerns_photo());
    }
}
