//! Domain records shared by the store, the library operations and the TUI.
//! They stay plain data holders with a handful of counter helpers; everything
//! that touches persistence lives in `db` and everything that touches more
//! than one record lives in `library`.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Display format used for transaction timestamps.
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredBook")]
/// A catalog title and its copy counters.
pub struct Book {
    /// Catalog id such as `B001`. Never changes once the book exists.
    pub id: String,
    pub title: String,
    pub author: String,
    /// Number of copies the library owns.
    pub total_copies: u32,
    /// Copies currently on the shelf. Always within `0..=total_copies`.
    pub available_copies: u32,
}

impl Book {
    /// A fresh book has every copy on the shelf.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        copies: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            total_copies: copies,
            available_copies: copies,
        }
    }

    /// Change the owned count and shift availability by the same delta,
    /// clamping at zero when copies on loan exceed the new total.
    pub fn set_total_copies(&mut self, copies: u32) {
        let delta = i64::from(copies) - i64::from(self.total_copies);
        let available = (i64::from(self.available_copies) + delta).max(0);
        self.total_copies = copies;
        self.available_copies = available.min(i64::from(copies)) as u32;
    }

    /// Take one copy off the shelf. Returns `false` when none are left.
    pub fn borrow_copy(&mut self) -> bool {
        if self.available_copies > 0 {
            self.available_copies -= 1;
            true
        } else {
            false
        }
    }

    /// Put one copy back. Returns `false` when every copy is already shelved.
    pub fn return_copy(&mut self) -> bool {
        if self.available_copies < self.total_copies {
            self.available_copies += 1;
            true
        } else {
            false
        }
    }

    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    /// Case-insensitive match against id, title and author. The query is
    /// expected to be lowercased already.
    pub fn matches(&self, query_lower: &str) -> bool {
        self.id.to_lowercase().contains(query_lower)
            || self.title.to_lowercase().contains(query_lower)
            || self.author.to_lowercase().contains(query_lower)
    }
}

/// Wire shape of a book. Converting it into a `Book` rejects counters that
/// break the shelf invariant, so a bad record fails like unparseable JSON.
#[derive(Deserialize)]
struct StoredBook {
    id: String,
    title: String,
    author: String,
    total_copies: u32,
    available_copies: u32,
}

impl TryFrom<StoredBook> for Book {
    type Error = String;

    fn try_from(stored: StoredBook) -> Result<Self, Self::Error> {
        if stored.available_copies > stored.total_copies {
            return Err(format!(
                "book {} has {} copies available but only {} owned",
                stored.id, stored.available_copies, stored.total_copies
            ));
        }
        Ok(Self {
            id: stored.id,
            title: stored.title,
            author: stored.author,
            total_copies: stored.total_copies,
            available_copies: stored.available_copies,
        })
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.id, self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
/// Account type. Only students carry loans.
pub enum Role {
    Admin,
    Student {
        /// Ids of books currently out, in borrow order. The same id may
        /// appear more than once.
        #[serde(default)]
        borrowed: Vec<String>,
    },
}

impl Role {
    pub fn student() -> Self {
        Role::Student {
            borrowed: Vec::new(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Student { .. } => "Student",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    /// Stored as entered; there is no hashing.
    pub password: String,
    /// Display name shown in dashboard headers.
    pub name: String,
    pub role: Role,
}

impl User {
    pub fn admin(
        username: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            name: name.into(),
            role: Role::Admin,
        }
    }

    pub fn student(
        username: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            name: name.into(),
            role: Role::student(),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Borrowed ids for students, an empty slice for admins.
    pub fn borrowed(&self) -> &[String] {
        match &self.role {
            Role::Admin => &[],
            Role::Student { borrowed } => borrowed,
        }
    }

    pub fn borrowed_mut(&mut self) -> Option<&mut Vec<String>> {
        match &mut self.role {
            Role::Admin => None,
            Role::Student { borrowed } => Some(borrowed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Borrowed,
    Returned,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Borrowed => write!(f, "Borrowed"),
            Action::Returned => write!(f, "Returned"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One entry of the loan log. Username and title are copied at the time of
/// the event, so later renames or deletions leave the history untouched.
pub struct Transaction {
    pub username: String,
    pub book_id: String,
    pub book_title: String,
    pub action: Action,
    pub timestamp: DateTime<Local>,
}

impl Transaction {
    pub fn now(username: &str, book: &Book, action: Action) -> Self {
        Self {
            username: username.to_string(),
            book_id: book.id.clone(),
            book_title: book.title.clone(),
            action,
            timestamp: Local::now(),
        }
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raising_total_adds_to_available() {
        let mut book = Book::new("B001", "Clean Code", "Robert C. Martin", 4);
        book.borrow_copy();
        book.set_total_copies(6);
        assert_eq!(book.total_copies, 6);
        assert_eq!(book.available_copies, 5);
    }

    #[test]
    fn lowering_total_clamps_available_at_zero() {
        let mut book = Book::new("B002", "Effective Java", "Joshua Bloch", 3);
        book.borrow_copy();
        book.borrow_copy();
        book.set_total_copies(1);
        assert_eq!(book.total_copies, 1);
        assert_eq!(book.available_copies, 0);

        book.set_total_copies(0);
        assert_eq!(book.available_copies, 0);
    }

    #[test]
    fn counters_stop_at_bounds() {
        let mut book = Book::new("B015", "Deep Learning", "Ian Goodfellow", 1);
        assert!(!book.return_copy());
        assert!(book.borrow_copy());
        assert!(!book.borrow_copy());
        assert_eq!(book.available_copies, 0);
        assert!(book.return_copy());
        assert_eq!(book.available_copies, 1);
    }

    #[test]
    fn search_covers_id_title_and_author() {
        let book = Book::new("B008", "Computer Networks", "Andrew S. Tanenbaum", 4);
        assert!(book.matches("b008"));
        assert!(book.matches("networks"));
        assert!(book.matches("tanenbaum"));
        assert!(!book.matches("java"));
    }

    #[test]
    fn stored_book_with_excess_available_is_rejected() {
        let json = r#"{"id":"B001","title":"Clean Code","author":"Robert C. Martin","total_copies":4,"available_copies":9}"#;
        let err = serde_json::from_str::<Book>(json).unwrap_err();
        assert!(err.to_string().contains("B001"));

        let book = Book::new("B001", "Clean Code", "Robert C. Martin", 4);
        let back: Book = serde_json::from_str(&serde_json::to_string(&book).unwrap()).unwrap();
        assert_eq!(back, book);
    }

    #[test]
    fn admins_have_no_borrowed_list() {
        let mut admin = User::admin("admin", "admin", "Library Admin");
        assert!(admin.borrowed().is_empty());
        assert!(admin.borrowed_mut().is_none());

        let mut student = User::student("student1", "pass", "Student One");
        student.borrowed_mut().unwrap().push("B001".into());
        assert_eq!(student.borrowed(), ["B001".to_string()]);
        assert_eq!(student.role.label(), "Student");
    }

    #[test]
    fn roles_round_trip_through_json() {
        let student = User::student("student1", "pass", "Student One");
        let json = serde_json::to_string(&student).unwrap();
        let back: User = serde_json::from_str(&json).unwrap();
        assert_eq!(back, student);
    }
}
