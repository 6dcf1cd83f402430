//! Per-photo visibility.
//!
//! A photo carries an optional toggle and an allow-list. The toggle is `None`
//! only for documents written before visibility existed; those stay public.

use serde::{Deserialize, Serialize};

use crate::types::UserId;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Visibility {
    #[serde(rename = "visibility_toggle", default)]
    pub toggle: Option<bool>,
    #[serde(rename = "visibility", default)]
    pub allow_list: Vec<UserId>,
}

impl Visibility {
    /// Visible to every viewer.
    pub fn public() -> Self {
        Self {
            toggle: Some(false),
            allow_list: Vec::new(),
        }
    }

    /// Restricted to `allow_list`, or to the owner alone when it is empty.
    pub fn restricted(allow_list: Vec<UserId>) -> Self {
        let mut deduped = Vec::with_capacity(allow_list.len());
        for user in allow_list {
            if !deduped.contains(&user) {
                deduped.push(user);
            }
        }
        Self {
            toggle: Some(true),
            allow_list: deduped,
        }
    }

    /// Settings as submitted with an upload. The allow-list is dropped when
    /// the toggle is off.
    pub fn from_upload(enabled: bool, allow_list: Vec<UserId>) -> Self {
        if enabled {
            Self::restricted(allow_list)
        } else {
            Self::public()
        }
    }

    /// A document that predates the visibility fields.
    pub fn legacy() -> Self {
        Self {
            toggle: None,
            allow_list: Vec::new(),
        }
    }

    pub fn permits(&self, owner: UserId, viewer: UserId) -> bool {
        let public = self.toggle == Some(false);
        let owner_only =
            self.toggle == Some(true) && self.allow_list.is_empty() && viewer == owner;
        let allowed = self.toggle == Some(true) && self.allow_list.contains(&viewer);
        let legacy = self.toggle.is_none();

        public || owner_only || allowed || legacy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_visible_to_everyone() {
        let owner = UserId::new();
        let vis = Visibility::public();
        assert!(vis.permits(owner, owner));
        assert!(vis.permits(owner, UserId::new()));
    }

    #[test]
    fn test_empty_allow_list_is_owner_only() {
        let owner = UserId::new();
        let vis = Visibility::restricted(vec![]);
        assert!(vis.permits(owner, owner));
        assert!(!vis.permits(owner, UserId::new()));
    }

    #[test]
    fn test_allow_list_members_only() {
        let owner = UserId::new();
        let friend = UserId::new();
        let stranger = UserId::new();
        let vis = Visibility::restricted(vec![friend]);

        assert!(vis.permits(owner, friend));
        assert!(!vis.permits(owner, stranger));
        // A non-empty list that leaves out the owner hides the photo from them too.
        assert!(!vis.permits(owner, owner));
    }

    #[test]
    fn test_legacy_documents_are_public() {
        let owner = UserId::new();
        assert!(Visibility::legacy().permits(owner, UserId::new()));
    }

    #[test]
    fn test_upload_with_toggle_off_drops_allow_list() {
        let vis = Visibility::from_upload(false, vec![UserId::new()]);
        assert_eq!(vis, Visibility::public());
    }

    #[test]
    fn test_restricted_dedups() {
        let friend = UserId::new();
        let vis = Visibility::restricted(vec![friend, friend]);
        assert_eq!(vis.allow_list, vec![friend]);
    }

    #[test]
    fn test_missing_toggle_deserializes_as_legacy() {
        let vis: Visibility = serde_json::from_str("{}").unwrap();
        assert_eq!(vis, Visibility::legacy());
    }
}
