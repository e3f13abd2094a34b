// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

extern crate alloc;

use alloc::string::String;

/// Errors returned when a dataset cannot be normalized into a [`Hierarchy`](crate::Hierarchy).
///
/// These are fatal for a pipeline update: no partial hierarchy is produced and no tiling runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    /// A node of the nested input is not a JSON object.
    #[error("node at depth {depth} is not a record")]
    NotARecord {
        /// Depth of the offending leaf.
        depth: usize,
    },
    /// A node's children entry exists but is not an array.
    #[error("children of node at depth {depth} are not a list")]
    ChildrenNotAList {
        /// Depth of the offending node.
        depth: usize,
    },
    /// A leaf value is present but cannot be read as a number.
    #[error("leaf at depth {depth} has a non-numeric value `{found}`")]
    NonNumericValue {
        /// Depth of the offending node.
        depth: usize,
        /// The offending value, rendered as JSON.
        found: String,
    },
    /// A leaf value is negative or not finite, or a branch sum overflows.
    #[error("node at depth {depth} has an invalid value {value}")]
    InvalidValue {
        /// Depth of the offending node.
        depth: usize,
        /// The offending value.
        value: String,
    },
    /// No row of a stratified table is a root (every row names a parent).
    #[error("no root row")]
    NoRoot,
    /// More than one row of a stratified table has no parent.
    #[error("multiple root rows")]
    MultipleRoots,
    /// Two rows of a stratified table share the same id.
    #[error("duplicate id `{0}`")]
    DuplicateId(String),
    /// A row references a parent id that no row carries.
    #[error("missing parent `{0}`")]
    MissingParent(String),
    /// Parent links form a cycle, leaving rows unreachable from the root.
    #[error("cycle through `{0}`")]
    Cycle(String),
}

/// Errors returned when parsing a number format specifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The specifier has trailing characters that are not part of the grammar.
    #[error("invalid format specifier `{0}`")]
    InvalidSpecifier(String),
    /// The specifier names an unsupported format type.
    #[error("unsupported format type `{0}`")]
    UnsupportedType(char),
}
