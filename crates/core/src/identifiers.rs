use std::fmt;
use std::sync::Arc;

/// Key of an objective, derived from its rounded position (see [`crate::position::objective_key`]).
///
/// Cloning shares the underlying string, so ids can go into events and the visited set freely.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectiveId(Arc<str>);

impl ObjectiveId {
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
