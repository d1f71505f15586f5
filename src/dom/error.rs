//! Structural error contract of the DOM substrate.
//!
//! Error messages mirror the phrasing browsers use for `DOMException`,
//! because downstream recovery logic classifies failures by kind *and* by
//! message substring ("not a child"). The wording is part of the contract.

use thiserror::Error;

/// Errors raised by the raw structural primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The node required by the operation is not where the caller said it is.
    #[error("{0}")]
    NotFound(String),

    /// The requested mutation would produce an impossible tree shape.
    #[error("{0}")]
    HierarchyRequest(String),

    /// The node is not in a state that supports the operation.
    #[error("{0}")]
    InvalidState(String),
}

impl DomError {
    /// Builds a browser-style "not a child of this node" error for `op`.
    pub fn not_a_child(op: &str, subject: &str) -> DomError {
        DomError::NotFound(format!(
            "Failed to execute '{op}' on 'Node': {subject} is not a child of this node."
        ))
    }

    /// Builds a browser-style hierarchy error for `op`.
    pub fn hierarchy(op: &str, detail: &str) -> DomError {
        DomError::HierarchyRequest(format!("Failed to execute '{op}' on 'Node': {detail}"))
    }

    /// The `DOMException`-style name of this error kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DomError::NotFound(_) => "NotFoundError",
            DomError::HierarchyRequest(_) => "HierarchyRequestError",
            DomError::InvalidState(_) => "InvalidStateError",
        }
    }

    /// The human-readable message carried by this error.
    pub fn message(&self) -> &str {
        match self {
            DomError::NotFound(msg)
            | DomError::HierarchyRequest(msg)
            | DomError::InvalidState(msg) => msg,
        }
    }
}
