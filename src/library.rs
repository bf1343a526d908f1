//! Operations that combine several records: loans, catalog and account
//! administration, login and history lookups. Each function validates
//! everything before it touches the store, so a rejected call leaves every
//! collection exactly as it was.

use std::fmt;

use tracing::{info, warn};

use crate::db::{LibraryStore, RESERVED_ADMIN};
use crate::error::{LibraryError, LibraryResult};
use crate::models::{Action, Book, Role, Transaction, User};

/// Role picked on the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountKind {
    #[default]
    Student,
    Admin,
}

impl AccountKind {
    pub fn toggle(self) -> Self {
        match self {
            AccountKind::Student => AccountKind::Admin,
            AccountKind::Admin => AccountKind::Student,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AccountKind::Student => "Student",
            AccountKind::Admin => "Admin",
        }
    }
}

/// Validated input for creating or editing a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    pub id: String,
    pub title: String,
    pub author: String,
    pub copies: u32,
}

/// One entry of a student's borrowed list, resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowedEntry {
    pub book_id: String,
    /// `None` when the book has been deleted since it was borrowed.
    pub title: Option<String>,
}

impl fmt::Display for BorrowedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => write!(f, "{} - {}", self.book_id, title),
            None => write!(f, "{} - (unknown)", self.book_id),
        }
    }
}

pub fn login(store: &LibraryStore, username: &str, password: &str) -> LibraryResult<User> {
    let username = username.trim();
    match store.user(username) {
        Some(user) if user.password == password => {
            info!(username, role = user.role.label(), "login");
            Ok(user.clone())
        }
        _ => {
            warn!(username, "rejected login");
            Err(LibraryError::InvalidCredentials)
        }
    }
}

pub fn register_user(
    store: &mut LibraryStore,
    name: &str,
    username: &str,
    password: &str,
    kind: AccountKind,
) -> LibraryResult<User> {
    let name = name.trim();
    let username = username.trim();
    if name.is_empty() {
        return Err(LibraryError::MissingField("Full name"));
    }
    if username.is_empty() {
        return Err(LibraryError::MissingField("Username"));
    }
    if password.is_empty() {
        return Err(LibraryError::MissingField("Password"));
    }
    if store.user(username).is_some() {
        return Err(LibraryError::DuplicateUser(username.to_string()));
    }

    let user = match kind {
        AccountKind::Admin => User::admin(username, password, name),
        AccountKind::Student => User::student(username, password, name),
    };
    store.upsert_user(user.clone())?;
    info!(username, role = kind.label(), "registered user");
    Ok(user)
}

/// Remove an account. Only the reserved admin is protected; loans held by the
/// removed student are simply forgotten.
pub fn delete_user(store: &mut LibraryStore, username: &str) -> LibraryResult<User> {
    if username == RESERVED_ADMIN {
        return Err(LibraryError::ReservedAccount(username.to_string()));
    }
    let removed = store
        .remove_user(username)?
        .ok_or_else(|| LibraryError::UserNotFound(username.to_string()))?;
    info!(username, "deleted user");
    Ok(removed)
}

pub fn add_book(store: &mut LibraryStore, draft: BookDraft) -> LibraryResult<Book> {
    let id = draft.id.trim();
    if id.is_empty() {
        return Err(LibraryError::MissingField("Book id"));
    }
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(LibraryError::MissingField("Title"));
    }
    if store.book(id).is_some() {
        return Err(LibraryError::DuplicateBook(id.to_string()));
    }

    let book = Book::new(id, title, draft.author.trim(), draft.copies);
    store.upsert_book(book.clone())?;
    info!(book_id = id, copies = draft.copies, "added book");
    Ok(book)
}

/// Update title, author and copy count. The id in `draft` selects the book
/// and is never changed.
pub fn edit_book(store: &mut LibraryStore, draft: BookDraft) -> LibraryResult<Book> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(LibraryError::MissingField("Title"));
    }
    let mut book = store
        .book(&draft.id)
        .cloned()
        .ok_or_else(|| LibraryError::BookNotFound(draft.id.clone()))?;

    book.title = title.to_string();
    book.author = draft.author.trim().to_string();
    book.set_total_copies(draft.copies);
    store.upsert_book(book.clone())?;
    info!(
        book_id = %book.id,
        total = book.total_copies,
        available = book.available_copies,
        "edited book"
    );
    Ok(book)
}

/// Remove a book regardless of outstanding loans. Borrowed lists keep the id
/// and render it as unknown from then on.
pub fn delete_book(store: &mut LibraryStore, id: &str) -> LibraryResult<Book> {
    let removed = store
        .remove_book(id)?
        .ok_or_else(|| LibraryError::BookNotFound(id.to_string()))?;
    info!(book_id = id, "deleted book");
    Ok(removed)
}

pub fn borrow_book(
    store: &mut LibraryStore,
    username: &str,
    book_id: &str,
) -> LibraryResult<Transaction> {
    let mut user = student(store, username)?;
    let mut book = store
        .book(book_id)
        .cloned()
        .ok_or_else(|| LibraryError::BookNotFound(book_id.to_string()))?;

    if !book.borrow_copy() {
        warn!(username, book_id, "borrow rejected, no copies left");
        return Err(LibraryError::NoCopiesAvailable(book.title));
    }
    if let Some(borrowed) = user.borrowed_mut() {
        borrowed.push(book.id.clone());
    }

    let transaction = Transaction::now(username, &book, Action::Borrowed);
    store.record_loan(book, user, transaction.clone())?;
    info!(username, book_id, "borrowed book");
    Ok(transaction)
}

pub fn return_book(
    store: &mut LibraryStore,
    username: &str,
    book_id: &str,
) -> LibraryResult<Transaction> {
    let mut user = student(store, username)?;
    let position = user
        .borrowed()
        .iter()
        .position(|id| id == book_id)
        .ok_or_else(|| LibraryError::NotBorrowed(book_id.to_string()))?;
    let mut book = store
        .book(book_id)
        .cloned()
        .ok_or_else(|| LibraryError::BookNotFound(book_id.to_string()))?;

    if !book.return_copy() {
        warn!(username, book_id, "return rejected, no copies outstanding");
        return Err(LibraryError::AllCopiesShelved(book.title));
    }
    if let Some(borrowed) = user.borrowed_mut() {
        borrowed.remove(position);
    }

    let transaction = Transaction::now(username, &book, Action::Returned);
    store.record_loan(book, user, transaction.clone())?;
    info!(username, book_id, "returned book");
    Ok(transaction)
}

/// Case-insensitive substring search over id, title and author. A blank query
/// returns the whole catalog.
pub fn search_books(store: &LibraryStore, query: &str) -> Vec<Book> {
    filter_books(store.books(), query)
}

/// Same matching rules as [`search_books`], applied to an already loaded list.
pub fn filter_books<'a>(books: impl IntoIterator<Item = &'a Book>, query: &str) -> Vec<Book> {
    let query = query.trim().to_lowercase();
    books
        .into_iter()
        .filter(|book| query.is_empty() || book.matches(&query))
        .cloned()
        .collect()
}

/// Whole history for `None`, one user's rows otherwise.
pub fn history(store: &LibraryStore, username: Option<&str>) -> Vec<Transaction> {
    store
        .transactions()
        .iter()
        .filter(|entry| username.map_or(true, |name| entry.username == name))
        .cloned()
        .collect()
}

pub fn borrowed_entries(store: &LibraryStore, username: &str) -> Vec<BorrowedEntry> {
    store
        .user(username)
        .map(|user| {
            user.borrowed()
                .iter()
                .map(|id| BorrowedEntry {
                    book_id: id.clone(),
                    title: store.book(id).map(|book| book.title.clone()),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn student(store: &LibraryStore, username: &str) -> LibraryResult<User> {
    let user = store
        .user(username)
        .cloned()
        .ok_or_else(|| LibraryError::UserNotFound(username.to_string()))?;
    match user.role {
        Role::Student { .. } => Ok(user),
        Role::Admin => Err(LibraryError::NotAStudent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn store() -> LibraryStore {
        LibraryStore::load_or_seed(Connection::open_in_memory().unwrap()).unwrap()
    }

    fn assert_copy_invariant(store: &LibraryStore) {
        for book in store.books() {
            assert!(
                book.available_copies <= book.total_copies,
                "{} has {} of {} copies available",
                book.id,
                book.available_copies,
                book.total_copies
            );
        }
    }

    #[test]
    fn borrow_then_return_restores_counters() {
        let mut store = store();

        let borrowed = borrow_book(&mut store, "student1", "B001").unwrap();
        assert_eq!(borrowed.action, Action::Borrowed);
        assert_eq!(store.book("B001").unwrap().available_copies, 3);
        assert_eq!(
            store.user("student1").unwrap().borrowed(),
            ["B001".to_string()]
        );

        let returned = return_book(&mut store, "student1", "B001").unwrap();
        assert_eq!(returned.action, Action::Returned);
        assert_eq!(store.book("B001").unwrap().available_copies, 4);
        assert!(store.user("student1").unwrap().borrowed().is_empty());

        assert_eq!(history(&store, Some("student1")).len(), 2);
        assert_copy_invariant(&store);
    }

    #[test]
    fn borrowing_an_exhausted_book_changes_nothing() {
        let mut store = store();
        borrow_book(&mut store, "student1", "B015").unwrap();
        borrow_book(&mut store, "student1", "B015").unwrap();
        assert_eq!(store.book("B015").unwrap().available_copies, 0);

        let err = borrow_book(&mut store, "student1", "B015").unwrap_err();
        assert!(matches!(err, LibraryError::NoCopiesAvailable(_)));
        assert_eq!(store.book("B015").unwrap().available_copies, 0);
        assert_eq!(store.user("student1").unwrap().borrowed().len(), 2);
        assert_eq!(store.transactions().len(), 2);
    }

    #[test]
    fn same_title_can_be_borrowed_twice_and_returned_once() {
        let mut store = store();
        borrow_book(&mut store, "student1", "B002").unwrap();
        borrow_book(&mut store, "student1", "B002").unwrap();
        return_book(&mut store, "student1", "B002").unwrap();

        assert_eq!(
            store.user("student1").unwrap().borrowed(),
            ["B002".to_string()]
        );
        assert_eq!(store.book("B002").unwrap().available_copies, 2);
    }

    #[test]
    fn admins_cannot_borrow() {
        let mut store = store();
        let err = borrow_book(&mut store, "admin", "B001").unwrap_err();
        assert!(matches!(err, LibraryError::NotAStudent));
        assert_eq!(store.book("B001").unwrap().available_copies, 4);
    }

    #[test]
    fn returning_a_deleted_book_is_rejected_and_keeps_the_entry() {
        let mut store = store();
        borrow_book(&mut store, "student1", "B003").unwrap();
        delete_book(&mut store, "B003").unwrap();

        let entries = borrowed_entries(&store, "student1");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].to_string(), "B003 - (unknown)");

        let err = return_book(&mut store, "student1", "B003").unwrap_err();
        assert!(matches!(err, LibraryError::BookNotFound(_)));
        assert_eq!(
            store.user("student1").unwrap().borrowed(),
            ["B003".to_string()]
        );
        assert_eq!(store.transactions().len(), 1);
    }

    #[test]
    fn returning_when_every_copy_is_shelved_is_rejected() {
        let mut store = store();
        borrow_book(&mut store, "student1", "B004").unwrap();
        // An admin edit that shrinks the catalog below the loans in flight.
        let draft = BookDraft {
            id: "B004".into(),
            title: "Introduction to Algorithms".into(),
            author: "Thomas H. Cormen".into(),
            copies: 0,
        };
        edit_book(&mut store, draft).unwrap();

        let err = return_book(&mut store, "student1", "B004").unwrap_err();
        assert!(matches!(err, LibraryError::AllCopiesShelved(_)));
        assert_eq!(store.user("student1").unwrap().borrowed().len(), 1);
        assert_copy_invariant(&store);
    }

    #[test]
    fn returning_a_book_never_borrowed_is_rejected() {
        let mut store = store();
        let err = return_book(&mut store, "student1", "B001").unwrap_err();
        assert!(matches!(err, LibraryError::NotBorrowed(_)));
        assert!(store.transactions().is_empty());
    }

    #[test]
    fn registration_rejects_duplicates_and_enables_login() {
        let mut store = store();
        let err = register_user(&mut store, "Someone", "student1", "x", AccountKind::Student)
            .unwrap_err();
        assert!(matches!(err, LibraryError::DuplicateUser(_)));

        register_user(&mut store, " Ada ", " ada ", "lovelace", AccountKind::Student).unwrap();
        let user = login(&store, "ada", "lovelace").unwrap();
        assert_eq!(user.name, "Ada");
        assert!(!user.is_admin());

        assert!(matches!(
            login(&store, "ada", "wrong"),
            Err(LibraryError::InvalidCredentials)
        ));
    }

    #[test]
    fn registration_requires_every_field() {
        let mut store = store();
        let err = register_user(&mut store, "", "new", "pw", AccountKind::Admin).unwrap_err();
        assert!(matches!(err, LibraryError::MissingField("Full name")));
        let err = register_user(&mut store, "New", "new", "", AccountKind::Admin).unwrap_err();
        assert!(matches!(err, LibraryError::MissingField("Password")));
        assert!(store.user("new").is_none());
    }

    #[test]
    fn reserved_admin_cannot_be_deleted() {
        let mut store = store();
        register_user(&mut store, "Second Admin", "boss", "pw", AccountKind::Admin).unwrap();

        let err = delete_user(&mut store, RESERVED_ADMIN).unwrap_err();
        assert!(matches!(err, LibraryError::ReservedAccount(_)));
        assert!(store.user(RESERVED_ADMIN).is_some());

        delete_user(&mut store, "boss").unwrap();
        assert!(store.user("boss").is_none());
    }

    #[test]
    fn duplicate_book_ids_are_rejected() {
        let mut store = store();
        let draft = BookDraft {
            id: "B001".into(),
            title: "Another Clean Code".into(),
            author: "Somebody".into(),
            copies: 1,
        };
        let err = add_book(&mut store, draft).unwrap_err();
        assert!(matches!(err, LibraryError::DuplicateBook(_)));
        assert_eq!(store.book("B001").unwrap().title, "Clean Code");
    }

    #[test]
    fn editing_copies_shifts_availability() {
        let mut store = store();
        borrow_book(&mut store, "student1", "B005").unwrap();
        let draft = BookDraft {
            id: "B005".into(),
            title: "The Pragmatic Programmer".into(),
            author: "Andrew Hunt".into(),
            copies: 6,
        };
        let book = edit_book(&mut store, draft).unwrap();
        assert_eq!(book.total_copies, 6);
        assert_eq!(book.available_copies, 5);
    }

    #[test]
    fn history_keeps_the_title_from_borrow_time() {
        let mut store = store();
        borrow_book(&mut store, "student1", "B006").unwrap();
        let draft = BookDraft {
            id: "B006".into(),
            title: "AIMA".into(),
            author: "Stuart Russell".into(),
            copies: 3,
        };
        edit_book(&mut store, draft).unwrap();

        let rows = history(&store, None);
        assert_eq!(rows[0].book_title, "Artificial Intelligence: A Modern Approach");
        assert_eq!(rows[0].book_id, "B006");
    }

    #[test]
    fn search_is_case_insensitive() {
        let store = store();
        let hits = search_books(&store, "TANENBAUM");
        let ids: Vec<_> = hits.iter().map(|book| book.id.as_str()).collect();
        assert_eq!(ids, ["B008", "B019"]);
        assert_eq!(search_books(&store, "  ").len(), 20);
    }

    #[test]
    fn filter_matches_search_on_a_loaded_list() {
        let store = store();
        let loaded: Vec<Book> = store.books().cloned().collect();
        assert_eq!(
            filter_books(&loaded, " machine "),
            search_books(&store, "MACHINE")
        );
    }
}
