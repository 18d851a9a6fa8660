//! urlguard-builders
//!
//! Fluent builders and a declarative JSON ruleset format for assembling
//! `urlguard-core` classifiers (spec §6 "External Interfaces").

pub mod builder;
pub mod error;
pub mod spec;

pub use builder::{AuthorityBuilder, FragmentBuilder, QueryBuilder, TopLevelBuilder};
pub use error::BuildError;
pub use spec::RulesetSpec;
