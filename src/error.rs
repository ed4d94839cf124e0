//! Crate-level error types.

use std::fmt;

/// Errors produced by the ribbon-chain crate.
#[derive(Debug)]
pub enum ChainError {
    /// A chain or element index outside its valid range.
    OutOfRange {
        /// What was being indexed ("chain" or "element").
        what: &'static str,
        /// The rejected index.
        index: usize,
        /// Number of valid slots at the time of the call.
        len: usize,
    },
    /// Configuration that would leave the chain unrenderable.
    InvalidConfiguration(String),
    /// Removal from a chain with no live elements.
    EmptyChain(usize),
    /// Texture load or decode failure.
    Texture(String),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// The render backend rejected a request.
    Backend(String),
}

impl ChainError {
    pub(crate) fn chain_index(index: usize, len: usize) -> Self {
        Self::OutOfRange {
            what: "chain",
            index,
            len,
        }
    }

    pub(crate) fn element_index(index: usize, len: usize) -> Self {
        Self::OutOfRange {
            what: "element",
            index,
            len,
        }
    }
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { what, index, len } => {
                write!(f, "{what} index {index} out of range (len {len})")
            }
            Self::InvalidConfiguration(msg) => {
                write!(f, "invalid configuration: {msg}")
            }
            Self::EmptyChain(chain) => write!(f, "chain {chain} is empty"),
            Self::Texture(msg) => write!(f, "texture error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Backend(msg) => write!(f, "render backend error: {msg}"),
        }
    }
}

impl std::error::Error for ChainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ChainError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
