use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::library::{AccountKind, BookDraft, BorrowedEntry};
use crate::models::{Book, User};

fn field_style(is_active: bool, is_empty: bool) -> Style {
    if is_active {
        Style::default().fg(Color::Yellow)
    } else if is_empty {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    }
}

fn field_line(field_name: &str, display: String, is_active: bool, is_empty: bool) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("{field_name}: ")),
        Span::styled(display, field_style(is_active, is_empty)),
    ])
}

fn masked(value: &str) -> String {
    "*".repeat(value.chars().count())
}

/// Username/password pair shown on the login screen.
#[derive(Default, Clone)]
pub(crate) struct LoginForm {
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) active: LoginField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum LoginField {
    #[default]
    Username,
    Password,
}

impl LoginForm {
    /// Start over with the username prefilled, e.g. right after registration.
    pub(crate) fn with_username(username: &str) -> Self {
        Self {
            username: username.to_string(),
            active: LoginField::Password,
            ..Self::default()
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            LoginField::Username => self.username.push(ch),
            LoginField::Password => self.password.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            LoginField::Username => {
                self.username.pop();
            }
            LoginField::Password => {
                self.password.pop();
            }
        }
    }

    /// The password is shown as asterisks.
    pub(crate) fn build_line(&self, field_name: &str, field: LoginField) -> Line<'static> {
        let is_active = self.active == field;
        let (display, is_empty) = match field {
            LoginField::Username => (self.username.clone(), self.username.is_empty()),
            LoginField::Password => (masked(&self.password), self.password.is_empty()),
        };
        field_line(field_name, display, is_active, is_empty)
    }

    pub(crate) fn value_len(&self, field: LoginField) -> usize {
        match field {
            LoginField::Username => self.username.chars().count(),
            LoginField::Password => self.password.chars().count(),
        }
    }
}

/// Registration dialog state. The role is a toggle rather than free text.
#[derive(Default, Clone)]
pub(crate) struct RegisterForm {
    pub(crate) name: String,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) role: AccountKind,
    pub(crate) active: RegisterField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum RegisterField {
    #[default]
    Name,
    Username,
    Password,
    Role,
}

impl RegisterForm {
    pub(crate) fn next_field(&mut self) {
        self.active = match self.active {
            RegisterField::Name => RegisterField::Username,
            RegisterField::Username => RegisterField::Password,
            RegisterField::Password => RegisterField::Role,
            RegisterField::Role => RegisterField::Name,
        };
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = match self.active {
            RegisterField::Name => RegisterField::Role,
            RegisterField::Username => RegisterField::Name,
            RegisterField::Password => RegisterField::Username,
            RegisterField::Role => RegisterField::Password,
        };
    }

    /// Typing on the role field flips it instead of inserting text.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            RegisterField::Name => self.name.push(ch),
            RegisterField::Username => self.username.push(ch),
            RegisterField::Password => self.password.push(ch),
            RegisterField::Role => self.role = self.role.toggle(),
        }
        true
    }

    pub(crate) fn toggle_role(&mut self) {
        if self.active == RegisterField::Role {
            self.role = self.role.toggle();
        }
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            RegisterField::Name => {
                self.name.pop();
            }
            RegisterField::Username => {
                self.username.pop();
            }
            RegisterField::Password => {
                self.password.pop();
            }
            RegisterField::Role => {}
        }
    }

    pub(crate) fn build_line(&self, field_name: &str, field: RegisterField) -> Line<'static> {
        let is_active = self.active == field;
        let (display, is_empty) = match field {
            RegisterField::Name => (self.name.clone(), self.name.is_empty()),
            RegisterField::Username => (self.username.clone(), self.username.is_empty()),
            RegisterField::Password => (masked(&self.password), self.password.is_empty()),
            RegisterField::Role => (format!("< {} >", self.role.label()), false),
        };
        let display = if is_empty {
            "<required>".to_string()
        } else {
            display
        };
        field_line(field_name, display, is_active, is_empty)
    }

    pub(crate) fn value_len(&self, field: RegisterField) -> usize {
        match field {
            RegisterField::Name => self.name.chars().count(),
            RegisterField::Username => self.username.chars().count(),
            RegisterField::Password => self.password.chars().count(),
            RegisterField::Role => 0,
        }
    }
}

/// Add/edit book form. When editing, the id is fixed and focus skips it.
#[derive(Clone)]
pub(crate) struct BookForm {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) copies: String,
    pub(crate) active: BookField,
    pub(crate) editing: bool,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum BookField {
    Id,
    Title,
    Author,
    Copies,
}

impl Default for BookForm {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            author: String::new(),
            copies: "1".to_string(),
            active: BookField::Id,
            editing: false,
            error: None,
        }
    }
}

impl BookForm {
    pub(crate) fn from_book(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            copies: book.total_copies.to_string(),
            active: BookField::Title,
            editing: true,
            error: None,
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.active = match self.active {
            BookField::Id => BookField::Title,
            BookField::Title => BookField::Author,
            BookField::Author => BookField::Copies,
            BookField::Copies if self.editing => BookField::Title,
            BookField::Copies => BookField::Id,
        };
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = match self.active {
            BookField::Id => BookField::Copies,
            BookField::Title if self.editing => BookField::Copies,
            BookField::Title => BookField::Id,
            BookField::Author => BookField::Title,
            BookField::Copies => BookField::Author,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            BookField::Id => {
                if self.editing || ch.is_whitespace() {
                    return false;
                }
                self.id.push(ch);
            }
            BookField::Title => self.title.push(ch),
            BookField::Author => self.author.push(ch),
            BookField::Copies => {
                if !ch.is_ascii_digit() {
                    return false;
                }
                self.copies.push(ch);
            }
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            BookField::Id => {
                if !self.editing {
                    self.id.pop();
                }
            }
            BookField::Title => {
                self.title.pop();
            }
            BookField::Author => {
                self.author.pop();
            }
            BookField::Copies => {
                self.copies.pop();
            }
        }
    }

    /// Validate the inputs and return a draft ready for the library layer.
    pub(crate) fn parse_inputs(&self) -> Result<BookDraft> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(anyhow!("Book id is required."));
        }
        let title = self.title.trim();
        if title.is_empty() {
            return Err(anyhow!("Title is required."));
        }
        let copies_raw = self.copies.trim();
        if copies_raw.is_empty() {
            return Err(anyhow!("Copies is required."));
        }
        let copies = copies_raw
            .parse::<u32>()
            .map_err(|_| anyhow!("Copies must be a whole number."))?;
        Ok(BookDraft {
            id: id.to_string(),
            title: title.to_string(),
            author: self.author.trim().to_string(),
            copies,
        })
    }

    pub(crate) fn build_line(&self, field_name: &str, field: BookField) -> Line<'static> {
        let is_active = self.active == field;
        let value = match field {
            BookField::Id => &self.id,
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Copies => &self.copies,
        };
        let display = if value.is_empty() {
            match field {
                BookField::Author => "<optional>".to_string(),
                _ => "<required>".to_string(),
            }
        } else if field == BookField::Id && self.editing {
            format!("{value} (fixed)")
        } else {
            value.clone()
        };
        field_line(field_name, display, is_active, value.is_empty())
    }

    pub(crate) fn value_len(&self, field: BookField) -> usize {
        match field {
            BookField::Id => self.id.chars().count(),
            BookField::Title => self.title.chars().count(),
            BookField::Author => self.author.chars().count(),
            BookField::Copies => self.copies.chars().count(),
        }
    }
}

/// What a pending delete confirmation refers to.
#[derive(Clone)]
pub(crate) enum ConfirmDelete {
    Book { id: String, title: String },
    User { username: String, name: String },
}

impl ConfirmDelete {
    pub(crate) fn book(book: &Book) -> Self {
        ConfirmDelete::Book {
            id: book.id.clone(),
            title: book.title.clone(),
        }
    }

    pub(crate) fn user(user: &User) -> Self {
        ConfirmDelete::User {
            username: user.username.clone(),
            name: user.name.clone(),
        }
    }

    pub(crate) fn prompt(&self) -> String {
        match self {
            ConfirmDelete::Book { id, title } => format!("Delete {id} ({title})?"),
            ConfirmDelete::User { username, name } => format!("Delete {username} ({name})?"),
        }
    }
}

/// Picker listing the student's outstanding loans.
pub(crate) struct ReturnPicker {
    pub(crate) entries: Vec<BorrowedEntry>,
    pub(crate) selected: usize,
}

impl ReturnPicker {
    pub(crate) fn new(entries: Vec<BorrowedEntry>) -> Self {
        Self {
            entries,
            selected: 0,
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.entries.is_empty() {
            return;
        }
        let len = self.entries.len() as isize;
        let new = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = new as usize;
    }

    pub(crate) fn current(&self) -> Option<&BorrowedEntry> {
        self.entries.get(self.selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(form: &mut BookForm, text: &str) {
        for ch in text.chars() {
            form.push_char(ch);
        }
    }

    #[test]
    fn new_book_form_validates_and_builds_draft() {
        let mut form = BookForm::default();
        assert!(form.parse_inputs().is_err());

        type_text(&mut form, "B021");
        form.next_field();
        type_text(&mut form, "Rust in Action");
        form.next_field();
        type_text(&mut form, "Tim McNamara");
        form.next_field();
        form.backspace();
        assert!(!form.push_char('x'));
        type_text(&mut form, "3");

        let draft = form.parse_inputs().unwrap();
        assert_eq!(draft.id, "B021");
        assert_eq!(draft.copies, 3);
        assert_eq!(draft.author, "Tim McNamara");
    }

    #[test]
    fn editing_form_locks_the_id() {
        let book = Book::new("B001", "Clean Code", "Robert C. Martin", 4);
        let mut form = BookForm::from_book(&book);
        assert!(form.active == BookField::Title);

        form.previous_field();
        assert!(form.active == BookField::Copies);
        form.next_field();
        assert!(form.active == BookField::Title);

        form.active = BookField::Id;
        assert!(!form.push_char('9'));
        form.backspace();
        assert_eq!(form.id, "B001");
    }

    #[test]
    fn register_role_field_toggles() {
        let mut form = RegisterForm::default();
        assert_eq!(form.role, AccountKind::Student);
        form.previous_field();
        assert!(form.active == RegisterField::Role);
        form.push_char(' ');
        assert_eq!(form.role, AccountKind::Admin);
        form.toggle_role();
        assert_eq!(form.role, AccountKind::Student);
    }

    #[test]
    fn passwords_render_masked() {
        let mut form = LoginForm::with_username("student1");
        type_text_login(&mut form, "pass");
        let line = form.build_line("Password", LoginField::Password);
        let rendered: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
        assert_eq!(rendered, "Password: ****");
        assert_eq!(form.password, "pass");
    }

    fn type_text_login(form: &mut LoginForm, text: &str) {
        for ch in text.chars() {
            form.push_char(ch);
        }
    }

    #[test]
    fn return_picker_clamps_selection() {
        let mut picker = ReturnPicker::new(vec![
            BorrowedEntry {
                book_id: "B001".into(),
                title: Some("Clean Code".into()),
            },
            BorrowedEntry {
                book_id: "B099".into(),
                title: None,
            },
        ]);
        picker.move_selection(5);
        assert_eq!(picker.current().unwrap().book_id, "B099");
        picker.move_selection(-9);
        assert_eq!(picker.selected, 0);
    }
}
