use thiserror::Error;

/// Rejections and failures raised by the store and the library operations.
/// The `Display` text is what the TUI shows in its footer, so the domain
/// variants read as user-facing messages.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("{0} is required.")]
    MissingField(&'static str),

    #[error("Book {0} already exists.")]
    DuplicateBook(String),

    #[error("Username {0} already exists.")]
    DuplicateUser(String),

    #[error("Book {0} not found.")]
    BookNotFound(String),

    #[error("User {0} not found.")]
    UserNotFound(String),

    #[error("Invalid credentials!")]
    InvalidCredentials,

    #[error("Only students can borrow or return books.")]
    NotAStudent,

    #[error("No copies of {0} available.")]
    NoCopiesAvailable(String),

    #[error("{0} is not on your borrowed list.")]
    NotBorrowed(String),

    #[error("Unable to return {0}: every copy is already on the shelf.")]
    AllCopiesShelved(String),

    #[error("Cannot delete the {0} account.")]
    ReservedAccount(String),

    #[error("Storage error: failed to {op}: {source}")]
    Storage {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LibraryResult<T> = Result<T, LibraryError>;

/// Attach the storage step that failed to a raw SQLite error.
pub(crate) trait StorageContext<T> {
    fn storage(self, op: &'static str) -> LibraryResult<T>;
}

impl<T> StorageContext<T> for Result<T, rusqlite::Error> {
    fn storage(self, op: &'static str) -> LibraryResult<T> {
        self.map_err(|source| LibraryError::Storage { op, source })
    }
}

impl LibraryError {
    /// Domain rejections leave state untouched; storage failures may leave
    /// memory ahead of disk.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            LibraryError::Storage { .. } | LibraryError::Serialization(_) | LibraryError::Io(_)
        )
    }
}
