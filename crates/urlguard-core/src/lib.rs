//! urlguard-core
//!
//! Core URL reference resolver and tri-state classifier engine.
//!
//! # Architecture
//!
//! A raw reference string plus a base [`UrlContext`] enters the
//! [`resolver`], which consults the [`scheme`] registry and produces a
//! [`url::UrlValue`]: an absolutized form with byte-exact part ranges and a
//! set of "corner case" flags observed while resolving. A classifier tree
//! built from [`authority`], [`hostglob`], [`pathglob`], [`query`] and
//! [`fragment`] sub-classifiers is then run over the `UrlValue` by
//! [`classifier`], producing a [`verdict::Classification`].
//!
//! # Modules
//!
//! - `percent`: `%HH` percent-decoding and encoding
//! - `scheme`: per-scheme structural descriptor, decompose/recompose, registry
//! - `resolver`: RFC 3986 §5 reference resolution and dot-segment removal
//! - `url`: `UrlValue`, `UrlContext`, IP-literal parsing
//! - `trie`: generic sorted-prefix trie
//! - `hostglob`: grouped suffix-trie host-glob matcher
//! - `pathglob`: glob-to-regex path matcher compiler
//! - `psl`: public-suffix-aware domain name parsing
//! - `authority`, `query`, `fragment`: per-part sub-classifiers
//! - `classifier`: top-level URL classifier and the `or` combinator algebra
//! - `diagnostics`: the `Receiver` diagnostic sink trait
//! - `verdict`: the tri-state `Classification` enum
//! - `error`: the error taxonomy surfaced by `UrlContext` construction

pub mod authority;
pub mod classifier;
pub mod diagnostics;
pub mod error;
pub mod fragment;
pub mod hostglob;
pub mod pathglob;
pub mod percent;
pub mod psl;
pub mod query;
pub mod resolver;
pub mod scheme;
pub mod trie;
pub mod url;
pub mod verdict;

pub use classifier::{Classify, UrlClassifier};
pub use error::ResolverError;
pub use scheme::{Scheme, SchemeParts, SchemeRegistry};
pub use url::{UrlContext, UrlValue};
pub use verdict::{Classification, CornerCase, CornerCaseSet};
