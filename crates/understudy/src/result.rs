//! Result and error types for Understudy.

use thiserror::Error;

/// Result type for Understudy operations
pub type DoubleResult<T> = Result<T, DoubleError>;

/// Errors produced while configuring, calling or verifying a double.
///
/// The `Display` output of every variant is the exact message handed to the
/// fail handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DoubleError {
    /// An observed call matched no configured interaction
    #[error("Unexpected interaction: {call}")]
    UnexpectedInteraction {
        /// Rendered call, e.g. `query("arg")`
        call: String,
    },

    /// A required interaction never happened
    #[error("Expected interaction: {interaction}")]
    ExpectedInteraction {
        /// Rendered interaction
        interaction: String,
    },

    /// The collaborator type has no method with this name
    #[error("Invalid interaction: type '{type_name}' has no method '{method}'")]
    NoSuchMethod {
        /// Collaborator type name
        type_name: String,
        /// Method name
        method: String,
    },

    /// Wrong number of configured arguments
    #[error(
        "Invalid interaction: method '{type_name}.{method}' takes {expected} arguments, {given} specified"
    )]
    ArgumentCount {
        /// Collaborator type name
        type_name: String,
        /// Method name
        method: String,
        /// Declared parameter count
        expected: usize,
        /// Configured argument count
        given: usize,
    },

    /// A configured argument does not fit the declared parameter
    #[error(
        "Invalid interaction: type of argument {index} of method '{type_name}.{method}' is '{expected}', '{given}' given"
    )]
    ArgumentType {
        /// 1-based argument position
        index: usize,
        /// Collaborator type name
        type_name: String,
        /// Method name
        method: String,
        /// Declared kind
        expected: String,
        /// Kind of the configured value, or `nil`
        given: String,
    },

    /// Wrong number of configured return values
    #[error(
        "Invalid interaction: method '{type_name}.{method}' returns {expected} values, {given} specified"
    )]
    ReturnCount {
        /// Collaborator type name
        type_name: String,
        /// Method name
        method: String,
        /// Declared return count
        expected: usize,
        /// Configured return count
        given: usize,
    },

    /// A configured return value does not fit the declared return kind
    #[error(
        "Invalid interaction: type of return value {index} of method '{type_name}.{method}' is '{expected}', '{given}' given"
    )]
    ReturnType {
        /// 1-based return value position
        index: usize,
        /// Collaborator type name
        type_name: String,
        /// Method name
        method: String,
        /// Declared kind
        expected: String,
        /// Kind of the configured value, or `nil`
        given: String,
    },

    /// Rejection reported by a custom validator or interaction
    #[error("{message}")]
    Rejected {
        /// Message passed through verbatim
        message: String,
    },

    /// No default fail handler registered on the current thread
    #[error("No fail handler registered on this thread: call register_doubles_fail_handler first")]
    NoFailHandler,
}

impl DoubleError {
    /// Create a rejection carrying a verbatim message
    #[must_use]
    pub fn rejected(message: &str) -> Self {
        Self::Rejected {
            message: message.to_string(),
        }
    }

    /// Whether this error comes from static shape validation
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::NoSuchMethod { .. }
                | Self::ArgumentCount { .. }
                | Self::ArgumentType { .. }
                | Self::ReturnCount { .. }
                | Self::ReturnType { .. }
        )
    }
}
