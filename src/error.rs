//! Error types for the PDF assembly library.
//!
//! Structural failures (missing handles, wrong object types, allocation
//! failures, I/O) are reported through [`Error`]. Page lookups that miss are
//! not errors: they are logged and returned as `None`.

/// Result type alias for PDF library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while assembling or writing a PDF.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)] // "Invalid" prefix is intentional for clarity
pub enum Error {
    /// A required collaborator or object was absent
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Allocation of an output buffer failed
    #[error("Out of memory: could not reserve {0} bytes")]
    OutOfMemory(usize),

    /// Referenced object not found in the object store
    #[error("Object not found: {0} {1} R")]
    ObjectNotFound(u32, u16),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid PDF structure (generic)
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// Unsupported feature
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// An error annotated with the operation that was running when it occurred
    #[error("{context}: {source}")]
    Context {
        /// Call-site breadcrumb
        context: String,
        /// Underlying error
        #[source]
        source: Box<Error>,
    },
}

/// Coarse classification of an [`Error`], independent of context layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required collaborator was absent.
    InvalidHandle,
    /// A structurally required field was missing or had the wrong type.
    InvalidDataType,
    /// A buffer allocation failed.
    OutOfMemory,
    /// An object or page could not be found.
    NotFound,
    /// The output device failed.
    Io,
    /// The object graph is malformed.
    Malformed,
    /// The requested feature is not supported.
    Unsupported,
}

impl Error {
    /// Wrap this error with a call-site breadcrumb.
    pub fn context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Kind of the innermost error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidHandle(_) => ErrorKind::InvalidHandle,
            Error::InvalidObjectType { .. } => ErrorKind::InvalidDataType,
            Error::OutOfMemory(_) => ErrorKind::OutOfMemory,
            Error::ObjectNotFound(..) => ErrorKind::NotFound,
            Error::Io(_) => ErrorKind::Io,
            Error::InvalidPdf(_) => ErrorKind::Malformed,
            Error::Unsupported(_) => ErrorKind::Unsupported,
            Error::Context { source, .. } => source.kind(),
        }
    }

    /// Breadcrumbs accumulated on the way up, outermost first.
    pub fn context_chain(&self) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut current = self;
        while let Error::Context { context, source } = current {
            chain.push(context.as_str());
            current = source;
        }
        chain
    }

    /// The error underneath all context layers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Attach context to the error side of a [`Result`].
pub trait ResultExt<T> {
    /// Wrap an error with a breadcrumb naming the failing operation.
    fn context(self, context: &str) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: &str) -> Result<T> {
        self.map_err(|e| e.into().context(context))
    }
}
