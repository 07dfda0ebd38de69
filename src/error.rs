use thiserror::Error;

#[derive(Debug, Error)]
pub enum FiaError {
    #[error("Library not found: {0}")]
    LibraryNotFound(String),

    #[error("Library load error: {0}")]
    LibraryLoadError(String),

    #[error("Symbol resolution error: {0}")]
    SymbolResolutionError(String),

    #[error("Unknown operation: {0}")]
    UnknownOperationError(String),

    #[error("{operation} takes {expected} arguments, got {got}")]
    ArityMismatchError {
        operation: String,
        expected: usize,
        got: usize,
    },

    #[error("Argument type error: {0}")]
    ArgumentTypeError(String),

    #[error("Unsupported signature: {0}")]
    UnsupportedSignatureError(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedImageFormatError(String),

    #[error("Native call failed: {0}")]
    NativeCallError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`FiaError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl FiaError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a library-not-found error.
    library_not_found => LibraryNotFound,
    /// Create a library load error.
    library_load => LibraryLoadError,
    /// Create a symbol resolution error.
    symbol_resolution => SymbolResolutionError,
    /// Create an unknown operation error.
    unknown_operation => UnknownOperationError,
    /// Create an argument type error.
    argument_type => ArgumentTypeError,
    /// Create an unsupported signature error.
    unsupported_signature => UnsupportedSignatureError,
    /// Create an unsupported image format error.
    unsupported_image_format => UnsupportedImageFormatError,
    /// Create a native call error.
    native_call => NativeCallError,
    /// Create a configuration error.
    config => ConfigError,
}

impl FiaError {
    /// Create an arity mismatch error for a logical operation.
    pub fn arity_mismatch(operation: impl Into<String>, expected: usize, got: usize) -> Self {
        Self::ArityMismatchError {
            operation: operation.into(),
            expected,
            got,
        }
    }
}

impl From<serde_yml::Error> for FiaError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FiaError>;
