use std::cmp::min;

use crate::library::filter_books;
use crate::models::{Book, Transaction, User};

fn step(selected: usize, len: usize, offset: isize) -> usize {
    if len == 0 {
        return 0;
    }
    let new = (selected as isize + offset).clamp(0, len as isize - 1);
    new as usize
}

/// Catalog table with an optional search filter. Shared by both dashboards.
pub(crate) struct BookListScreen {
    pub(crate) books: Vec<Book>,
    pub(crate) filtered_books: Vec<Book>,
    pub(crate) filter: Option<String>,
    pub(crate) selected: usize,
}

impl BookListScreen {
    pub(crate) fn new(books: Vec<Book>) -> Self {
        let mut screen = Self {
            books,
            filtered_books: Vec::new(),
            filter: None,
            selected: 0,
        };
        screen.apply_filter();
        screen
    }

    fn apply_filter(&mut self) {
        let query = self.filter.as_deref().unwrap_or_default();
        self.filtered_books = filter_books(&self.books, query);
        self.ensure_in_bounds();
    }

    pub(crate) fn set_filter(&mut self, filter: Option<String>) {
        self.filter = filter;
        self.apply_filter();
    }

    pub(crate) fn has_filter(&self) -> bool {
        self.filter
            .as_ref()
            .map(|q| !q.trim().is_empty())
            .unwrap_or(false)
    }

    /// Replace the backing rows, keeping the cursor on `focus_id` if it is
    /// still visible.
    pub(crate) fn set_books(&mut self, books: Vec<Book>, focus_id: Option<&str>) {
        self.books = books;
        self.apply_filter();
        if let Some(id) = focus_id {
            if let Some(idx) = self.filtered_books.iter().position(|book| book.id == id) {
                self.selected = idx;
            }
        }
    }

    pub(crate) fn current_book(&self) -> Option<&Book> {
        self.filtered_books.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step(self.selected, self.filtered_books.len(), offset);
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.filtered_books.len().saturating_sub(1);
    }

    fn ensure_in_bounds(&mut self) {
        if self.filtered_books.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.filtered_books.len() {
            self.selected = self.filtered_books.len() - 1;
        }
    }
}

pub(crate) struct UserListScreen {
    pub(crate) users: Vec<User>,
    pub(crate) selected: usize,
}

impl UserListScreen {
    pub(crate) fn new(users: Vec<User>) -> Self {
        Self { users, selected: 0 }
    }

    pub(crate) fn set_users(&mut self, users: Vec<User>) {
        self.users = users;
        self.selected = min(self.selected, self.users.len().saturating_sub(1));
    }

    pub(crate) fn current_user(&self) -> Option<&User> {
        self.users.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step(self.selected, self.users.len(), offset);
    }
}

/// Which table on the admin dashboard receives navigation keys.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum AdminPane {
    Books,
    Users,
}

pub(crate) struct AdminScreen {
    pub(crate) name: String,
    pub(crate) books: BookListScreen,
    pub(crate) users: UserListScreen,
    pub(crate) focus: AdminPane,
}

impl AdminScreen {
    pub(crate) fn new(name: String, books: Vec<Book>, users: Vec<User>) -> Self {
        Self {
            name,
            books: BookListScreen::new(books),
            users: UserListScreen::new(users),
            focus: AdminPane::Books,
        }
    }

    pub(crate) fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            AdminPane::Books => AdminPane::Users,
            AdminPane::Users => AdminPane::Books,
        };
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        match self.focus {
            AdminPane::Books => self.books.move_selection(offset),
            AdminPane::Users => self.users.move_selection(offset),
        }
    }

    pub(crate) fn select_first(&mut self) {
        match self.focus {
            AdminPane::Books => self.books.select_first(),
            AdminPane::Users => self.users.selected = 0,
        }
    }

    pub(crate) fn select_last(&mut self) {
        match self.focus {
            AdminPane::Books => self.books.select_last(),
            AdminPane::Users => self.users.selected = self.users.users.len().saturating_sub(1),
        }
    }
}

pub(crate) struct StudentScreen {
    pub(crate) username: String,
    pub(crate) name: String,
    pub(crate) books: BookListScreen,
}

impl StudentScreen {
    pub(crate) fn new(username: String, name: String, books: Vec<Book>) -> Self {
        Self {
            username,
            name,
            books: BookListScreen::new(books),
        }
    }
}

/// Read-only history table, either the whole log or one student's rows.
pub(crate) struct HistoryScreen {
    pub(crate) title: &'static str,
    pub(crate) rows: Vec<Transaction>,
    pub(crate) selected: usize,
}

impl HistoryScreen {
    pub(crate) fn issued(rows: Vec<Transaction>) -> Self {
        Self {
            title: "Issued History",
            rows,
            selected: 0,
        }
    }

    pub(crate) fn borrowed(rows: Vec<Transaction>) -> Self {
        Self {
            title: "Borrowed History",
            rows,
            selected: 0,
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step(self.selected, self.rows.len(), offset);
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.rows.len().saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{default_books, default_users};

    fn catalog() -> Vec<Book> {
        default_books().into_values().collect()
    }

    #[test]
    fn filter_narrows_and_clamps_selection() {
        let mut screen = BookListScreen::new(catalog());
        screen.select_last();
        assert_eq!(screen.current_book().unwrap().id, "B020");

        screen.set_filter(Some("machine".into()));
        let ids: Vec<_> = screen
            .filtered_books
            .iter()
            .map(|book| book.id.as_str())
            .collect();
        assert_eq!(ids, ["B016", "B017"]);
        assert_eq!(screen.current_book().unwrap().id, "B017");
        assert!(screen.has_filter());

        screen.set_filter(None);
        assert_eq!(screen.filtered_books.len(), 20);
    }

    #[test]
    fn filter_ignores_case_and_surrounding_space() {
        let mut screen = BookListScreen::new(catalog());
        screen.set_filter(Some("  TANENBAUM ".into()));
        let ids: Vec<_> = screen
            .filtered_books
            .iter()
            .map(|book| book.id.as_str())
            .collect();
        assert_eq!(ids, ["B008", "B019"]);

        screen.set_filter(Some("   ".into()));
        assert!(!screen.has_filter());
        assert_eq!(screen.filtered_books.len(), 20);
    }

    #[test]
    fn set_books_keeps_focus_on_the_same_id() {
        let mut screen = BookListScreen::new(catalog());
        let mut books = catalog();
        books.retain(|book| book.id != "B001");
        screen.set_books(books, Some("B010"));
        assert_eq!(screen.current_book().unwrap().id, "B010");
    }

    #[test]
    fn admin_focus_routes_navigation() {
        let users = default_users().into_values().collect();
        let mut screen = AdminScreen::new("Library Admin".into(), catalog(), users);
        screen.move_selection(3);
        assert_eq!(screen.books.selected, 3);

        screen.toggle_focus();
        screen.move_selection(10);
        assert_eq!(screen.users.selected, 1);
        assert_eq!(screen.books.selected, 3);
    }

    #[test]
    fn admin_home_and_end_follow_focus() {
        let users = default_users().into_values().collect();
        let mut screen = AdminScreen::new("Library Admin".into(), catalog(), users);
        screen.select_last();
        assert_eq!(screen.books.current_book().unwrap().id, "B020");

        screen.toggle_focus();
        screen.select_last();
        assert_eq!(screen.users.current_user().unwrap().username, "student1");
        screen.select_first();
        assert_eq!(screen.users.selected, 0);
        assert_eq!(screen.books.selected, 19);
    }

    #[test]
    fn empty_history_has_no_selection_to_move() {
        let mut history = HistoryScreen::borrowed(Vec::new());
        history.move_selection(4);
        history.select_last();
        assert_eq!(history.selected, 0);
    }
}
