//! Error types for the bevy_adaptive_quality plugin.
//!
//! Nothing in the monitoring loop returns these to its caller; they surface
//! while validating settings and from host adapters reporting on the
//! rendering context.

use thiserror::Error;

/// Invalid plugin settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A GPU renderer or user agent pattern failed to compile.
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// The offending pattern text
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },
    /// A bounded history was configured with no room.
    #[error("{name} history capacity must be at least 1")]
    EmptyHistory {
        /// Which history was misconfigured
        name: &'static str,
    },
    /// A periodic interval was configured as zero.
    #[error("{name} interval must be greater than zero")]
    ZeroInterval {
        /// Which interval was misconfigured
        name: &'static str,
    },
    /// Threshold values are out of order.
    #[error("threshold `{name}` is out of range: {detail}")]
    Threshold {
        /// Which threshold was misconfigured
        name: &'static str,
        /// Human readable description of the violated ordering
        detail: String,
    },
}

/// Failure reported by a rendering context health query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The context reports itself as lost.
    #[error("rendering context is lost")]
    Lost,
    /// The cheap query against the context failed.
    #[error("rendering context query failed: {0}")]
    QueryFailed(String),
}
