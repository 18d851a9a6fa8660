use thiserror::Error;
use urlguard_core::pathglob::PathGlobError;
use urlguard_core::ResolverError;

/// Eager builder-time failures (spec §7: "Builder misconfiguration... is an
/// eager error raised at build time, not at evaluation time").
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("path glob is malformed: {0}")]
    MalformedPathGlob(#[from] PathGlobError),
    #[error("base url does not parse as an absolute, hierarchical url with an authority: {0}")]
    InvalidBaseUrl(#[from] ResolverError),
    #[error("ruleset option {0:?} is contradictory: {1}")]
    ContradictoryOption(String, String),
    #[error("ruleset json could not be parsed: {0}")]
    Json(#[from] serde_json::Error),
}
