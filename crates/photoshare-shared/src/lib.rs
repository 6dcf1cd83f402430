//! # photoshare-shared
//!
//! Types and pure helpers shared by the store and the server: typed record
//! identifiers, the closed set of activity kinds, the per-photo visibility
//! predicate, `@[Name](id)` mention parsing and credential derivation.
//!
//! Nothing in this crate performs I/O.

pub mod constants;
pub mod crypto;
pub mod error;
pub mod mention;
pub mod types;
pub mod visibility;

pub use error::SharedError;
pub use types::{ActivityId, ActivityKind, CommentId, PhotoId, UserId};
pub use visibility::Visibility;
