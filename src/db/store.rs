use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::connection::{ensure_schema, open_database, read_blob, write_blob};
use super::seed::{default_books, default_users};
use crate::error::{LibraryResult, StorageContext};
use crate::models::{Book, Transaction, User};

const BOOKS_KEY: &str = "books";
const USERS_KEY: &str = "users";
const HISTORY_KEY: &str = "history";

/// In-memory copy of the three collections plus the connection that persists
/// them. Every mutator writes the affected collection back before returning.
pub struct LibraryStore {
    conn: Connection,
    books: BTreeMap<String, Book>,
    users: BTreeMap<String, User>,
    history: Vec<Transaction>,
}

impl LibraryStore {
    /// Open the database file and hydrate the store from it.
    pub fn open(path: &Path) -> LibraryResult<Self> {
        let conn = open_database(path)?;
        Self::load_or_seed(conn)
    }

    /// Load each collection independently. One that is missing or does not
    /// parse is replaced by its default and written straight back.
    pub fn load_or_seed(conn: Connection) -> LibraryResult<Self> {
        ensure_schema(&conn)?;

        let books: BTreeMap<String, Book> = match load_collection(&conn, BOOKS_KEY) {
            Some(books) => books,
            None => {
                let books = default_books();
                persist(&conn, BOOKS_KEY, &books)?;
                books
            }
        };
        let users: BTreeMap<String, User> = match load_collection(&conn, USERS_KEY) {
            Some(users) => users,
            None => {
                let users = default_users();
                persist(&conn, USERS_KEY, &users)?;
                users
            }
        };
        let history: Vec<Transaction> = match load_collection(&conn, HISTORY_KEY) {
            Some(history) => history,
            None => {
                let history = Vec::new();
                persist(&conn, HISTORY_KEY, &history)?;
                history
            }
        };

        info!(
            books = books.len(),
            users = users.len(),
            transactions = history.len(),
            "library store loaded"
        );

        Ok(Self {
            conn,
            books,
            users,
            history,
        })
    }

    pub fn book(&self, id: &str) -> Option<&Book> {
        self.books.get(id)
    }

    /// Books ordered by id.
    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    pub fn upsert_book(&mut self, book: Book) -> LibraryResult<()> {
        self.books.insert(book.id.clone(), book);
        self.save_books()
    }

    pub fn remove_book(&mut self, id: &str) -> LibraryResult<Option<Book>> {
        let removed = self.books.remove(id);
        if removed.is_some() {
            self.save_books()?;
        }
        Ok(removed)
    }

    pub fn user(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    /// Users ordered by username.
    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn upsert_user(&mut self, user: User) -> LibraryResult<()> {
        self.users.insert(user.username.clone(), user);
        self.save_users()
    }

    pub fn remove_user(&mut self, username: &str) -> LibraryResult<Option<User>> {
        let removed = self.users.remove(username);
        if removed.is_some() {
            self.save_users()?;
        }
        Ok(removed)
    }

    /// Append to the history. Entries are never edited or removed.
    pub fn add_transaction(&mut self, transaction: Transaction) -> LibraryResult<()> {
        self.history.push(transaction);
        self.save_history()
    }

    /// All transactions in the order they happened.
    pub fn transactions(&self) -> &[Transaction] {
        &self.history
    }

    /// Apply a borrow or return in one step: replace the book and the user and
    /// append the log entry, then write all three collections together.
    pub fn record_loan(
        &mut self,
        book: Book,
        user: User,
        transaction: Transaction,
    ) -> LibraryResult<()> {
        self.books.insert(book.id.clone(), book);
        self.users.insert(user.username.clone(), user);
        self.history.push(transaction);
        self.save_all()
    }

    /// Rewrite every collection inside a single SQLite transaction.
    pub fn save_all(&mut self) -> LibraryResult<()> {
        let books = serde_json::to_string(&self.books)?;
        let users = serde_json::to_string(&self.users)?;
        let history = serde_json::to_string(&self.history)?;

        let tx = self
            .conn
            .transaction()
            .storage("start the save transaction")?;
        write_blob(&tx, BOOKS_KEY, &books)?;
        write_blob(&tx, USERS_KEY, &users)?;
        write_blob(&tx, HISTORY_KEY, &history)?;
        tx.commit().storage("commit the save transaction")?;

        debug!("saved all collections");
        Ok(())
    }

    fn save_books(&self) -> LibraryResult<()> {
        persist(&self.conn, BOOKS_KEY, &self.books)
    }

    fn save_users(&self) -> LibraryResult<()> {
        persist(&self.conn, USERS_KEY, &self.users)
    }

    fn save_history(&self) -> LibraryResult<()> {
        persist(&self.conn, HISTORY_KEY, &self.history)
    }
}

fn persist<T: Serialize>(conn: &Connection, name: &str, value: &T) -> LibraryResult<()> {
    let payload = serde_json::to_string(value)?;
    write_blob(conn, name, &payload)?;
    debug!(collection = name, bytes = payload.len(), "saved collection");
    Ok(())
}

fn load_collection<T: DeserializeOwned>(conn: &Connection, name: &str) -> Option<T> {
    match read_blob(conn, name) {
        Ok(Some(payload)) => match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(collection = name, error = %err, "stored collection is unreadable, reseeding");
                None
            }
        },
        Ok(None) => {
            info!(collection = name, "no stored collection, seeding defaults");
            None
        }
        Err(err) => {
            warn!(collection = name, error = %err, "failed to read collection, reseeding");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Action;
    use tempfile::tempdir;

    fn memory_store() -> LibraryStore {
        LibraryStore::load_or_seed(Connection::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn empty_database_is_seeded() {
        let store = memory_store();
        assert_eq!(store.books().count(), 20);
        assert_eq!(store.users().count(), 2);
        assert!(store.transactions().is_empty());
        assert_eq!(
            store.books().next().map(|book| book.id.as_str()),
            Some("B001")
        );
    }

    #[test]
    fn corrupt_collection_is_reseeded_without_touching_others() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        write_blob(&conn, BOOKS_KEY, "definitely not json").unwrap();
        write_blob(&conn, USERS_KEY, "{}").unwrap();

        let store = LibraryStore::load_or_seed(conn).unwrap();
        assert_eq!(store.books().count(), 20);
        assert_eq!(store.users().count(), 0);

        let stored = read_blob(&store.conn, BOOKS_KEY).unwrap().unwrap();
        let reparsed: BTreeMap<String, Book> = serde_json::from_str(&stored).unwrap();
        assert_eq!(reparsed.len(), 20);
    }

    #[test]
    fn books_breaking_the_copy_invariant_are_reseeded() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        write_blob(
            &conn,
            BOOKS_KEY,
            r#"{"B001":{"id":"B001","title":"Clean Code","author":"Robert C. Martin","total_copies":4,"available_copies":9}}"#,
        )
        .unwrap();

        let store = LibraryStore::load_or_seed(conn).unwrap();
        assert_eq!(store.books().count(), 20);
        assert!(store
            .books()
            .all(|book| book.available_copies <= book.total_copies));
        assert_eq!(store.book("B001").unwrap().available_copies, 4);
    }

    #[test]
    fn upsert_and_remove_books() {
        let mut store = memory_store();
        store
            .upsert_book(Book::new("B021", "Rust in Action", "Tim McNamara", 2))
            .unwrap();
        assert_eq!(store.book("B021").unwrap().available_copies, 2);

        let removed = store.remove_book("B021").unwrap();
        assert_eq!(removed.map(|book| book.title), Some("Rust in Action".to_string()));
        assert!(store.book("B021").is_none());
        assert!(store.remove_book("B021").unwrap().is_none());
    }

    #[test]
    fn mutations_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("library.sqlite");

        {
            let mut store = LibraryStore::open(&path).unwrap();
            store
                .upsert_user(User::student("student2", "secret", "Student Two"))
                .unwrap();
            store.remove_book("B020").unwrap();
            let book = store.book("B001").cloned().unwrap();
            store
                .add_transaction(Transaction::now("student2", &book, Action::Borrowed))
                .unwrap();
        }

        let store = LibraryStore::open(&path).unwrap();
        assert!(store.user("student2").is_some());
        assert!(store.book("B020").is_none());
        assert_eq!(store.books().count(), 19);
        assert_eq!(store.transactions().len(), 1);
        assert_eq!(store.transactions()[0].book_title, "Clean Code");
    }

    #[test]
    fn save_all_round_trips_every_collection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("library.sqlite");

        let mut store = LibraryStore::open(&path).unwrap();
        let mut book = store.book("B002").cloned().unwrap();
        book.borrow_copy();
        let mut user = store.user("student1").cloned().unwrap();
        user.borrowed_mut().unwrap().push("B002".into());
        let transaction = Transaction::now("student1", &book, Action::Borrowed);
        store.record_loan(book, user, transaction).unwrap();
        store.save_all().unwrap();
        drop(store);

        let store = LibraryStore::open(&path).unwrap();
        assert_eq!(store.book("B002").unwrap().available_copies, 2);
        assert_eq!(
            store.user("student1").unwrap().borrowed(),
            ["B002".to_string()]
        );
        assert_eq!(store.transactions().len(), 1);
    }
}
