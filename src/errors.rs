//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`LimeError`] covers the structural failure modes of the
//! scene tree and its animation subsystem:
//! - Cyclic external-scene dependencies and content replacement mismatches
//! - Tree reparenting violations and stale node handles
//! - Animator registry misses for non-enum value types
//! - Lookup misses surfaced by the throwing `find_*` / `run_*` variants
//! - Scene codec I/O and JSON errors
//!
//! Expected lookup misses are reported through `Option` / `bool` by the `try_*`
//! family instead; scrub-cache invalidation is never an error.
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, LimeError>`.
//!
//! ```rust,ignore
//! use lime::errors::{LimeError, Result};
//!
//! fn mount(scene: &mut Scene, host: NodeHandle, child: NodeHandle) -> Result<()> {
//!     scene.push_node(host, child)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the Lime engine.
#[derive(Error, Debug)]
pub enum LimeError {
    // ========================================================================
    // Structural Errors
    // ========================================================================
    /// A scene is referenced (directly or transitively) from itself.
    #[error("Cyclic scenes dependency was detected: {path}")]
    CyclicDependency {
        /// Resolved path of the scene that was entered twice
        path: String,
    },

    /// External content can not stand in for the host node.
    #[error("Can not replace {host} content with {content}")]
    ContentTypeMismatch {
        /// Runtime kind of the host node
        host: String,
        /// Runtime kind of the loaded content root
        content: String,
    },

    /// The node still belongs to another parent; it must be unlinked first.
    #[error("Node {node} already has a parent; unlink it first")]
    AlreadyParented {
        /// Description of the offending node
        node: String,
    },

    /// A node was asked to become its own ancestor.
    #[error("Node {node} can not be attached under itself or its descendant")]
    CyclicHierarchy {
        /// Description of the offending node
        node: String,
    },

    /// No animator implementation is registered for a non-enum value type.
    #[error("Can't find animator type for property of {type_name}")]
    UnregisteredAnimatorType {
        /// Name of the value type
        type_name: String,
    },

    /// An animator produced a value that does not match the property kind.
    #[error("Property '{property}' expects {expected}, got {found}")]
    PropertyTypeMismatch {
        /// Property name
        property: String,
        /// Kind stored on the node
        expected: &'static str,
        /// Kind produced by the animator
        found: &'static str,
    },

    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// A node id or path could not be resolved.
    #[error("'{path}' not found for '{context}'")]
    NodeNotFound {
        /// Id or slash-delimited path that was searched
        path: String,
        /// Description of the node the search started from
        context: String,
    },

    /// An animation does not contain the requested marker.
    #[error("Unknown marker '{marker}' in animation '{animation}'")]
    MarkerNotFound {
        /// Marker id
        marker: String,
        /// Animation id (`<legacy>` for the default animation)
        animation: String,
    },

    /// A node does not own an animation with the requested id.
    #[error("Unknown animation '{animation}' for '{context}'")]
    AnimationNotFound {
        /// Animation id (`<legacy>` for the default animation)
        animation: String,
        /// Description of the node that was searched
        context: String,
    },

    /// The node handle refers to a node that was disposed.
    #[error("Stale node handle")]
    StaleHandle,

    // ========================================================================
    // Asset Errors
    // ========================================================================
    /// None of the candidate scene files exists.
    #[error("Scene '{path}' not found: none of {candidates} exists")]
    SceneNotFound {
        path: String,
        /// Comma separated list of probed paths
        candidates: String,
    },

    /// More than one candidate scene file exists for the same path.
    #[error("Ambiguity between: {candidates}")]
    AmbiguousScenePath {
        /// Semicolon separated list of existing paths
        candidates: String,
    },

    /// A scene description is well-formed JSON but describes an impossible node.
    #[error("Invalid scene description: {reason}")]
    InvalidDescription {
        /// What is wrong with the description
        reason: String,
    },

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Alias for `Result<T, LimeError>`.
pub type Result<T> = std::result::Result<T, LimeError>;
