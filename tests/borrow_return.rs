use digital_library::library::{
    borrow_book, borrowed_entries, delete_book, history, login, register_user, return_book,
    AccountKind,
};
use digital_library::{Action, LibraryError, LibraryStore};
use tempfile::tempdir;

#[test]
fn loans_survive_a_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("library.sqlite");

    {
        let mut store = LibraryStore::open(&path).unwrap();
        let student = login(&store, "student1", "pass").unwrap();
        assert_eq!(student.name, "Student One");

        borrow_book(&mut store, "student1", "B001").unwrap();
        assert_eq!(store.book("B001").unwrap().available_copies, 3);
        assert_eq!(store.user("student1").unwrap().borrowed(), ["B001"]);
    }

    let mut store = LibraryStore::open(&path).unwrap();
    assert_eq!(store.book("B001").unwrap().available_copies, 3);
    assert_eq!(store.user("student1").unwrap().borrowed(), ["B001"]);

    let returned = return_book(&mut store, "student1", "B001").unwrap();
    assert_eq!(returned.action, Action::Returned);
    assert_eq!(store.book("B001").unwrap().available_copies, 4);
    assert!(store.user("student1").unwrap().borrowed().is_empty());

    let rows = history(&store, Some("student1"));
    let actions: Vec<_> = rows.iter().map(|row| row.action).collect();
    assert_eq!(actions, [Action::Borrowed, Action::Returned]);
    assert!(rows.iter().all(|row| row.book_title == "Clean Code"));
}

#[test]
fn exhausted_title_rejects_the_next_borrower() {
    let dir = tempdir().unwrap();
    let mut store = LibraryStore::open(&dir.path().join("library.sqlite")).unwrap();
    register_user(&mut store, "Ada", "ada", "pw", AccountKind::Student).unwrap();

    // B015 ships with two copies.
    for _ in 0..2 {
        borrow_book(&mut store, "student1", "B015").unwrap();
    }
    let err = borrow_book(&mut store, "ada", "B015").unwrap_err();
    assert!(matches!(err, LibraryError::NoCopiesAvailable(_)));
    assert!(store.user("ada").unwrap().borrowed().is_empty());
    assert_eq!(history(&store, None).len(), 2);
}

#[test]
fn deleted_titles_show_as_unknown_loans() {
    let dir = tempdir().unwrap();
    let mut store = LibraryStore::open(&dir.path().join("library.sqlite")).unwrap();
    borrow_book(&mut store, "student1", "B002").unwrap();
    delete_book(&mut store, "B002").unwrap();

    let entries = borrowed_entries(&store, "student1");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].to_string(), "B002 - (unknown)");

    let err = return_book(&mut store, "student1", "B002").unwrap_err();
    assert!(matches!(err, LibraryError::BookNotFound(_)));
}
