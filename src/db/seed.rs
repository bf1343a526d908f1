use std::collections::BTreeMap;

use crate::models::{Book, User};

/// Account that can never be deleted.
pub const RESERVED_ADMIN: &str = "admin";

const SEED_BOOKS: &[(&str, &str, &str, u32)] = &[
    ("B001", "Clean Code", "Robert C. Martin", 4),
    ("B002", "Effective Java", "Joshua Bloch", 3),
    ("B003", "Design Patterns", "Erich Gamma", 3),
    ("B004", "Introduction to Algorithms", "Thomas H. Cormen", 5),
    ("B005", "The Pragmatic Programmer", "Andrew Hunt", 4),
    ("B006", "Artificial Intelligence: A Modern Approach", "Stuart Russell", 3),
    ("B007", "Operating System Concepts", "Abraham Silberschatz", 4),
    ("B008", "Computer Networks", "Andrew S. Tanenbaum", 4),
    ("B009", "Database System Concepts", "Henry F. Korth", 4),
    ("B010", "Python Crash Course", "Eric Matthes", 5),
    ("B011", "Head First Java", "Kathy Sierra", 5),
    ("B012", "C Programming Language", "Brian W. Kernighan", 4),
    ("B013", "JavaScript: The Good Parts", "Douglas Crockford", 3),
    ("B014", "You Don't Know JS", "Kyle Simpson", 3),
    ("B015", "Deep Learning", "Ian Goodfellow", 2),
    ("B016", "Machine Learning Yearning", "Andrew Ng", 3),
    ("B017", "Introduction to Machine Learning", "Ethem Alpaydin", 3),
    ("B018", "Data Structures & Algorithms Made Easy", "Narasimha Karumanchi", 5),
    ("B019", "Modern Operating Systems", "Andrew S. Tanenbaum", 3),
    ("B020", "System Design Interview", "Alex Xu", 4),
];

/// Default catalog written on first run or when the stored one is unreadable.
pub fn default_books() -> BTreeMap<String, Book> {
    SEED_BOOKS
        .iter()
        .map(|&(id, title, author, copies)| (id.to_string(), Book::new(id, title, author, copies)))
        .collect()
}

/// The reserved admin plus one demo student.
pub fn default_users() -> BTreeMap<String, User> {
    [
        User::admin(RESERVED_ADMIN, "admin", "Library Admin"),
        User::student("student1", "pass", "Student One"),
    ]
    .into_iter()
    .map(|user| (user.username.clone(), user))
    .collect()
}
