//! Boundary for resource commands that talk to an API server.
//!
//! No client ships with this crate. Commands that delete resources take any
//! [`DynamicClient`] and get fail-fast batch semantics from
//! [`delete_resources`].

use std::fmt;

use thiserror::Error;

/// Group/version/kind of a generically-typed API resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}, Kind={}", self.group, self.version, self.kind)
    }
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("{kind} \"{name}\" not found in namespace \"{namespace}\"")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("failed to reach the API server: {0}")]
    Transport(String),
}

/// Namespace-scoped operations on resources of any kind.
pub trait DynamicClient {
    fn delete(&self, gvk: &GroupVersionKind, namespace: &str, name: &str) -> Result<(), ResourceError>;
}

/// Delete `names` in order, stopping at the first failure.
///
/// Returns the names that were deleted. Names after a failing one are never
/// attempted.
pub fn delete_resources<C: DynamicClient + ?Sized>(
    client: &C,
    gvk: &GroupVersionKind,
    namespace: &str,
    names: &[String],
) -> Result<Vec<String>, ResourceError> {
    let mut deleted = Vec::with_capacity(names.len());
    for name in names {
        client.delete(gvk, namespace, name)?;
        tracing::debug!("Deleted {} {}/{}", gvk.kind, namespace, name);
        deleted.push(name.clone());
    }
    Ok(deleted)
}
