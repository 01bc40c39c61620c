// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Errors for reading, writing and comparing exchange files.
use graft_core::{EntityLabel, ModelError, TypeName};
use thiserror::Error;

/// Error type for exchange-file operations.
#[derive(Debug, Error)]
pub enum StepError {
    /// The text does not follow the exchange grammar.
    #[error("syntax error at line {line}: {message}")]
    Syntax {
        /// 1-based line of the failure.
        line: usize,
        /// Parser diagnostic.
        message: String,
    },
    /// An instance names a type the schema does not declare.
    #[error("line {line}: unknown entity type {type_name}")]
    UnknownType {
        /// 1-based line of the instance.
        line: usize,
        /// Offending type.
        type_name: TypeName,
    },
    /// An instance carries the wrong number of attributes.
    #[error("line {line}: {label}={type_name} has {found} attributes, expected {expected}")]
    Arity {
        /// 1-based line of the instance.
        line: usize,
        /// Instance label.
        label: EntityLabel,
        /// Instance type.
        type_name: TypeName,
        /// Attribute count declared by the schema.
        expected: usize,
        /// Attribute count found in the file.
        found: usize,
    },
    /// A reference names a label that no instance carries.
    #[error("line {line}: reference to undefined instance {label}")]
    DanglingReference {
        /// 1-based line of the referring instance.
        line: usize,
        /// Missing label.
        label: EntityLabel,
    },
    /// Two instances share a label.
    #[error("line {line}: label {label} is defined more than once")]
    DuplicateLabel {
        /// 1-based line of the second definition.
        line: usize,
        /// Repeated label.
        label: EntityLabel,
    },
    /// A real attribute holds NaN or an infinity, which the text format
    /// cannot carry.
    #[error("{label} holds a non-finite real")]
    NonFiniteReal {
        /// Entity holding the value.
        label: EntityLabel,
    },
    /// The model rejected an operation while loading or a value could not be
    /// written.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
