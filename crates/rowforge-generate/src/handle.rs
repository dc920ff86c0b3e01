use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// Opaque token identifying one produced or deferred field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ValueHandle(Uuid);

impl ValueHandle {
    /// Mint a handle that has never been issued before.
    pub fn mint() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ValueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}
