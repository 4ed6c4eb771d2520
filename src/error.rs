//! Error types.

use thiserror::Error;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while building, running, training or
/// persisting a network.
///
/// Every operation that returns an error leaves the network exactly as it
/// was before the call.
#[derive(Error, Debug)]
pub enum Error {
    /// The layer widths or transfer functions do not describe a valid
    /// network.
    #[error("cannot construct a network with these parameters: {0}")]
    Topology(String),

    /// An input vector does not match the network's input width.
    #[error("input has {actual} values, network expects {expected}")]
    InputLength { expected: usize, actual: usize },

    /// A desired output vector does not match the output layer width.
    #[error("desired output has {actual} values, network produces {expected}")]
    DesiredLength { expected: usize, actual: usize },

    /// Training was requested without any examples.
    #[error("cannot train on an empty example set")]
    EmptyTrainingSet,

    /// A required element or attribute is absent from a saved network.
    #[error("cannot find specified node: {0}")]
    MissingField(String),

    /// A saved network contains a value that cannot be used.
    #[error("invalid value {value:?} for {field}")]
    InvalidValue { field: String, value: String },

    /// The XML document could not be read or written.
    #[error("document error: {0}")]
    Document(#[from] quick_xml::DeError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
