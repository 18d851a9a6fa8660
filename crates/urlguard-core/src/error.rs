//! Error taxonomy for `urlguard-core`.
//!
//! Evaluation itself never returns a `Result` — a bad *reference* becomes
//! [`crate::Classification::Invalid`], not an `Err`. The only place this
//! crate can fail eagerly is constructing a [`crate::UrlContext`], whose
//! base URL must parse as absolute and hierarchical.

use thiserror::Error;

/// Failure constructing a [`crate::UrlContext`] from a base URL.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolverError {
    #[error("base url {0:?} has no scheme")]
    BaseMissingScheme(String),
    #[error("base url {0:?} scheme {1:?} is not registered as hierarchical")]
    BaseNotHierarchical(String, String),
    #[error("base url {0:?} has no authority")]
    BaseMissingAuthority(String),
    #[error("base url {0:?} could not be decomposed into parts")]
    BaseUndecomposable(String),
}
