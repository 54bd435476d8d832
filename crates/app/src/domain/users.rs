//! Users
//!
//! Users are owned by an external identity collaborator. The engine only ever
//! sees their identifiers.

use crate::uuids::TypedUuid;

/// Marker for user identifiers.
#[derive(Debug)]
pub struct User;

/// User UUID
pub type UserUuid = TypedUuid<User>;
