//! Inline mention markup.
//!
//! Comments reference users as `@[Display Name](user-id)`. Parsing is pure
//! text scanning; resolving the ids against storage is the caller's job.

use crate::types::UserId;

/// One `@[name](target)` occurrence, borrowed from the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MentionMarkup<'a> {
    pub display_name: &'a str,
    pub target: &'a str,
}

/// A mention whose target parsed as a user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMention {
    pub display_name: String,
    pub user_id: UserId,
}

/// Every markup occurrence, left to right, without overlap.
///
/// Both the name and the target must be non-empty; the name ends at the first
/// `]` and the target at the first `)`.
pub fn scan(text: &str) -> Vec<MentionMarkup<'_>> {
    let mut found = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find("@[") {
        let start = cursor + offset;
        match match_at(text, start) {
            Some((markup, end)) => {
                found.push(markup);
                cursor = end;
            }
            None => cursor = start + 1,
        }
    }

    found
}

/// Mentions whose target is a well-formed user id. Others are ignored.
pub fn parse_mentions(text: &str) -> Vec<ParsedMention> {
    scan(text)
        .into_iter()
        .filter_map(|markup| {
            UserId::parse(markup.target)
                .ok()
                .map(|user_id| ParsedMention {
                    display_name: markup.display_name.to_string(),
                    user_id,
                })
        })
        .collect()
}

/// The user named by the first markup occurrence, if it is a valid id.
pub fn first_mentioned_user(text: &str) -> Option<UserId> {
    scan(text)
        .first()
        .and_then(|markup| UserId::parse(markup.target).ok())
}

/// Try to match markup starting at the `@` found at byte `start`.
/// Returns the markup and the byte index just past the closing `)`.
fn match_at(text: &str, start: usize) -> Option<(MentionMarkup<'_>, usize)> {
    let name_start = start + 2;
    let name_len = text[name_start..].find(']')?;
    if name_len == 0 {
        return None;
    }
    let name_end = name_start + name_len;

    if !text[name_end + 1..].starts_with('(') {
        return None;
    }

    let target_start = name_end + 2;
    let target_len = text[target_start..].find(')')?;
    if target_len == 0 {
        return None;
    }
    let target_end = target_start + target_len;

    Some((
        MentionMarkup {
            display_name: &text[name_start..name_end],
            target: &text[target_start..target_end],
        },
        target_end + 1,
    ))
}
