//! Error types for Shader Forge
//!
//! One error type is shared by the core crate and the backends. Variants follow
//! the failure categories of the loader, the synthesizer and the pipeline factory:
//! malformed input, binding conflicts, caller contract violations and driver failures.

use std::fmt;
use crate::program::DescriptorKind;

/// Result type for Shader Forge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Shader Forge errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Shader binary could not be read from its source
    ShaderLoadFailed(String),

    /// Shader binary is not a valid SPIR-V container or lacks the requested entry point
    MalformedShader(String),

    /// A binding uses a resource class or descriptor set this system does not support
    UnsupportedBinding {
        binding: u32,
        detail: String,
    },

    /// A binding slot index exceeds the supported range (0..=31)
    BindingOutOfRange {
        binding: u32,
    },

    /// Two stages (or two variables of one stage) disagree on a slot's descriptor kind
    BindingConflict {
        binding: u32,
        first: DescriptorKind,
        second: DescriptorKind,
    },

    /// Requested push-constant size does not match what the stages declare
    PushConstantMismatch(String),

    /// Descriptor info array does not match the program's bindings
    DescriptorMismatch(String),

    /// The set of stages cannot form a program or pipeline
    InvalidStageCombination(String),

    /// Invalid resource passed by the caller (program, render target, ...)
    InvalidResource(String),

    /// Backend-specific error (driver rejected the call)
    BackendError(String),

    /// Out of host or device memory
    OutOfMemory,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ShaderLoadFailed(msg) => write!(f, "Shader load failed: {}", msg),
            Error::MalformedShader(msg) => write!(f, "Malformed shader: {}", msg),
            Error::UnsupportedBinding { binding, detail } => {
                write!(f, "Unsupported binding {}: {}", binding, detail)
            }
            Error::BindingOutOfRange { binding } => write!(
                f,
                "Binding {} is out of range (max {})",
                binding,
                crate::program::MAX_BINDINGS - 1
            ),
            Error::BindingConflict { binding, first, second } => write!(
                f,
                "Binding {} declared as {:?} and as {:?}",
                binding, first, second
            ),
            Error::PushConstantMismatch(msg) => write!(f, "Push constant mismatch: {}", msg),
            Error::DescriptorMismatch(msg) => write!(f, "Descriptor mismatch: {}", msg),
            Error::InvalidStageCombination(msg) => write!(f, "Invalid stage combination: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of memory"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
