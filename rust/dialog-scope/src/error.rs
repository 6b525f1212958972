use thiserror::Error;

/// Result type used throughout this crate.
pub type ScopeResult<T> = Result<T, DialogScopeError>;

/// The common error type used by this crate.
///
/// Lookups of hidden members and lookups of members that were never declared
/// fail with the very same [`DialogScopeError::MemberNotFound`] variant, so an
/// outside observer can not tell a hidden member apart from an absent one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialogScopeError {
    /// A declaration or resolution was attempted on a closed [`Scope`](crate::Scope).
    #[error("Cannot access a closed scope")]
    ClosedScope,

    /// A hidden member has no derivable name and none was given explicitly.
    #[error("Could not resolve the name of a hidden member")]
    NameResolution,

    /// Strict wrapping was requested for a callable that does not accept the
    /// capability parameter.
    #[error("Function '{function}' does not accept capability parameter '{parameter}'")]
    Signature {
        /// Name of the offending function.
        function: String,
        /// Name of the capability parameter that was expected.
        parameter: String,
    },

    /// No member with the given name is reachable.
    #[error("'{owner}' object has no attribute '{name}'")]
    MemberNotFound {
        /// Name of the object (type name, or `scope`) the lookup ran against.
        owner: String,
        /// Name that was looked up.
        name: String,
    },

    /// A reserved capability slot was assigned or deleted.
    #[error("Name '{name}' is reserved and can not be modified")]
    ReservedName {
        /// The reserved name.
        name: String,
    },

    /// A scoped function was called without a capability.
    #[error("Function '{function}' is missing its capability parameter '{parameter}'")]
    MissingCapability {
        /// Name of the function.
        function: String,
        /// Name of the capability parameter.
        parameter: String,
    },

    /// A method was called without a receiver.
    #[error("Method '{function}' was called without a receiver")]
    MissingReceiver {
        /// Name of the method.
        function: String,
    },

    /// A value that is not callable was invoked.
    #[error("'{name}' is not callable")]
    NotCallable {
        /// Name (or kind) of the value.
        name: String,
    },

    /// A property does not provide the requested accessor.
    #[error("Property '{name}' can not be {operation}")]
    PropertyAccess {
        /// Name of the property.
        name: String,
        /// The failed operation (`read`, `assigned` or `deleted`).
        operation: &'static str,
    },

    /// An error raised by a native function body.
    #[error("{0}")]
    Native(String),

    /// Scope settings could not be decoded.
    #[error("Invalid scope settings: {0}")]
    Settings(String),
}

impl DialogScopeError {
    /// Shorthand for a [`DialogScopeError::MemberNotFound`].
    pub fn not_found(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::MemberNotFound {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Shorthand for a [`DialogScopeError::Native`], for use in function bodies.
    pub fn native(message: impl Into<String>) -> Self {
        Self::Native(message.into())
    }
}

impl From<serde_json::Error> for DialogScopeError {
    fn from(error: serde_json::Error) -> Self {
        Self::Settings(error.to_string())
    }
}
