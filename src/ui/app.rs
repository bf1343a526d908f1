use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap,
};
use ratatui::Frame;

use crate::db::{LibraryStore, RESERVED_ADMIN};
use crate::library::{
    add_book, borrow_book, borrowed_entries, delete_book, delete_user, edit_book, history, login,
    register_user, return_book,
};
use crate::models::{Book, User};

use super::forms::{
    BookField, BookForm, ConfirmDelete, LoginField, LoginForm, RegisterField, RegisterForm,
    ReturnPicker,
};
use super::helpers::{
    book_row, centered_rect, cursor_x, header_row, pane_block, surface_error, transaction_row,
};
use super::screens::{AdminPane, AdminScreen, BookListScreen, HistoryScreen, StudentScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Header band above the dashboards.
const HEADER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown.
const PAGE: isize = 5;
const BOOK_COLUMNS: [&str; 5] = ["ID", "Title", "Author", "Avail", "Total"];
const USER_COLUMNS: [&str; 3] = ["Username", "Name", "Role"];
const HISTORY_COLUMNS: [&str; 4] = ["Username", "Book Title", "Action", "Date"];
const LOGIN_HINT: &str = "Admin: admin/admin • Demo: student1/pass";

/// Session-level navigation. Logging in swaps the login form for the
/// dashboard of the user's role; logging out swaps it back.
enum Screen {
    Login(LoginForm),
    Admin(AdminScreen),
    Student(StudentScreen),
}

/// Modal overlays scoped to the current screen.
enum Mode {
    Normal,
    Registering(RegisterForm),
    AddingBook(BookForm),
    EditingBook(BookForm),
    ConfirmDelete(ConfirmDelete),
    Returning(ReturnPicker),
    ViewingHistory(HistoryScreen),
    ConfirmLogout,
    Searching(SearchState),
}

/// State for an active inline catalog search.
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    store: LibraryStore,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(store: LibraryStore) -> Self {
        Self {
            store,
            screen: Screen::Login(LoginForm::default()),
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Dispatch one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Registering(form) => self.handle_register(code, form)?,
            Mode::AddingBook(form) | Mode::EditingBook(form) => {
                self.handle_book_form(code, form)?
            }
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::Returning(picker) => self.handle_return_picker(code, picker)?,
            Mode::ViewingHistory(view) => self.handle_history(code, view)?,
            Mode::ConfirmLogout => self.handle_confirm_logout(code)?,
            Mode::Searching(state) => self.handle_search(code, state)?,
        };

        self.mode = mode;
        Ok(exit)
    }

    /// Ctrl-R opens the registration dialog from the login screen.
    pub(crate) fn handle_ctrl_r(&mut self) -> Result<()> {
        if matches!(self.screen, Screen::Login(_)) && matches!(self.mode, Mode::Normal) {
            self.clear_status();
            self.mode = Mode::Registering(RegisterForm::default());
        }
        Ok(())
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match self.screen {
            Screen::Login(_) => self.handle_login_key(code, exit),
            Screen::Admin(_) => self.handle_admin_key(code, exit),
            Screen::Student(_) => self.handle_student_key(code, exit),
        }
    }

    fn handle_login_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let Screen::Login(form) = &mut self.screen else {
            return Ok(Mode::Normal);
        };
        match code {
            KeyCode::Esc => *exit = true,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::F(2) => {
                self.clear_status();
                return Ok(Mode::Registering(RegisterForm::default()));
            }
            KeyCode::Enter => {
                if form.active == LoginField::Username && form.password.is_empty() {
                    form.toggle_field();
                } else {
                    self.submit_login();
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_admin_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let Screen::Admin(admin) = &mut self.screen else {
            return Ok(Mode::Normal);
        };
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Tab | KeyCode::BackTab => admin.toggle_focus(),
            KeyCode::Up => admin.move_selection(-1),
            KeyCode::Down => admin.move_selection(1),
            KeyCode::PageUp => admin.move_selection(-PAGE),
            KeyCode::PageDown => admin.move_selection(PAGE),
            KeyCode::Home => admin.select_first(),
            KeyCode::End => admin.select_last(),
            KeyCode::Esc => {
                if admin.books.has_filter() {
                    admin.books.set_filter(None);
                    self.clear_status();
                }
            }
            KeyCode::Char('f') => {
                admin.focus = AdminPane::Books;
                return Ok(Mode::Searching(SearchState {
                    query: admin.books.filter.clone().unwrap_or_default(),
                }));
            }
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.clear_status();
                return Ok(Mode::AddingBook(BookForm::default()));
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(book) = admin.books.current_book() {
                    let form = BookForm::from_book(book);
                    self.clear_status();
                    return Ok(Mode::EditingBook(form));
                }
                self.set_status("Select a book to edit.", StatusKind::Error);
            }
            KeyCode::Char('-') | KeyCode::Delete => match admin.focus {
                AdminPane::Books => {
                    if let Some(book) = admin.books.current_book() {
                        let confirm = ConfirmDelete::book(book);
                        self.clear_status();
                        return Ok(Mode::ConfirmDelete(confirm));
                    }
                    self.set_status("Select a book to delete.", StatusKind::Error);
                }
                AdminPane::Users => match admin.users.current_user() {
                    Some(user) if user.username == RESERVED_ADMIN => {
                        self.set_status("Cannot delete admin!", StatusKind::Error);
                    }
                    Some(user) => {
                        let confirm = ConfirmDelete::user(user);
                        self.clear_status();
                        return Ok(Mode::ConfirmDelete(confirm));
                    }
                    None => self.set_status("Select a user to delete.", StatusKind::Error),
                },
            },
            KeyCode::Char('h') | KeyCode::Char('H') => {
                let mut view = HistoryScreen::issued(history(&self.store, None));
                view.select_last();
                return Ok(Mode::ViewingHistory(view));
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.refresh_tables(None);
                self.set_status("Refreshed.", StatusKind::Info);
            }
            KeyCode::Char('s') | KeyCode::Char('S') => match self.store.save_all() {
                Ok(()) => self.set_status("Saved!", StatusKind::Info),
                Err(err) => {
                    let message = surface_error(&anyhow::Error::from(err));
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char('l') | KeyCode::Char('L') => return Ok(Mode::ConfirmLogout),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_student_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let Screen::Student(student) = &mut self.screen else {
            return Ok(Mode::Normal);
        };
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Up => student.books.move_selection(-1),
            KeyCode::Down => student.books.move_selection(1),
            KeyCode::PageUp => student.books.move_selection(-PAGE),
            KeyCode::PageDown => student.books.move_selection(PAGE),
            KeyCode::Home => student.books.select_first(),
            KeyCode::End => student.books.select_last(),
            KeyCode::Esc => {
                if student.books.has_filter() {
                    student.books.set_filter(None);
                    self.clear_status();
                }
            }
            KeyCode::Char('f') | KeyCode::Char('/') => {
                return Ok(Mode::Searching(SearchState {
                    query: student.books.filter.clone().unwrap_or_default(),
                }));
            }
            KeyCode::Enter | KeyCode::Char('b') | KeyCode::Char('B') => {
                if let Err(err) = self.borrow_selected() {
                    let message = surface_error(&err);
                    self.set_status(message, StatusKind::Error);
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let entries = borrowed_entries(&self.store, &student.username);
                if entries.is_empty() {
                    self.set_status("You have no borrowed books.", StatusKind::Info);
                } else {
                    self.clear_status();
                    return Ok(Mode::Returning(ReturnPicker::new(entries)));
                }
            }
            KeyCode::Char('h') | KeyCode::Char('H') => {
                let mut view =
                    HistoryScreen::borrowed(history(&self.store, Some(&student.username)));
                view.select_last();
                return Ok(Mode::ViewingHistory(view));
            }
            KeyCode::Char('l') | KeyCode::Char('L') => return Ok(Mode::ConfirmLogout),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_register(&mut self, code: KeyCode, mut form: RegisterForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Registration cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Left | KeyCode::Right => form.toggle_role(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_registration(&form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::Registering(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_book_form(&mut self, code: KeyCode, mut form: BookForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                let message = if form.editing {
                    "Edit cancelled."
                } else {
                    "Add book cancelled."
                };
                self.set_status(message, StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_book(&form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if !keep_open {
            Ok(Mode::Normal)
        } else if form.editing {
            Ok(Mode::EditingBook(form))
        } else {
            Ok(Mode::AddingBook(form))
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Err(err) = self.perform_delete(&confirm) {
                    let message = surface_error(&err);
                    self.set_status(message, StatusKind::Error);
                }
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    fn handle_return_picker(&mut self, code: KeyCode, mut picker: ReturnPicker) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Return cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Up => picker.move_selection(-1),
            KeyCode::Down => picker.move_selection(1),
            KeyCode::PageUp => picker.move_selection(-PAGE),
            KeyCode::PageDown => picker.move_selection(PAGE),
            KeyCode::Enter => {
                if let Some(entry) = picker.current() {
                    let book_id = entry.book_id.clone();
                    if let Err(err) = self.return_selected(&book_id) {
                        let message = surface_error(&err);
                        self.set_status(message, StatusKind::Error);
                    }
                }
                return Ok(Mode::Normal);
            }
            _ => {}
        }
        Ok(Mode::Returning(picker))
    }

    fn handle_history(&mut self, code: KeyCode, mut view: HistoryScreen) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('q') => {
                return Ok(Mode::Normal);
            }
            KeyCode::Up => view.move_selection(-1),
            KeyCode::Down => view.move_selection(1),
            KeyCode::PageUp => view.move_selection(-PAGE),
            KeyCode::PageDown => view.move_selection(PAGE),
            KeyCode::Home => view.selected = 0,
            KeyCode::End => view.select_last(),
            _ => {}
        }
        Ok(Mode::ViewingHistory(view))
    }

    fn handle_confirm_logout(&mut self, code: KeyCode) -> Result<Mode> {
        match code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.screen = Screen::Login(LoginForm::default());
                self.set_status("Logged out.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => Ok(Mode::Normal),
            _ => Ok(Mode::ConfirmLogout),
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Result<Mode> {
        let books = match &mut self.screen {
            Screen::Admin(admin) => &mut admin.books,
            Screen::Student(student) => &mut student.books,
            Screen::Login(_) => return Ok(Mode::Normal),
        };

        match code {
            KeyCode::Esc => {
                books.set_filter(None);
                return Ok(Mode::Normal);
            }
            KeyCode::Enter => {
                let shown = books.filtered_books.len();
                self.set_status(format!("{shown} matching books."), StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Up => books.move_selection(-1),
            KeyCode::Down => books.move_selection(1),
            KeyCode::PageUp => books.move_selection(-PAGE),
            KeyCode::PageDown => books.move_selection(PAGE),
            KeyCode::Backspace => {
                state.query.pop();
                books.set_filter(Some(state.query.clone()));
            }
            KeyCode::Char(ch) => {
                if !ch.is_control() {
                    state.query.push(ch);
                    books.set_filter(Some(state.query.clone()));
                }
            }
            _ => {}
        }
        Ok(Mode::Searching(state))
    }

    fn submit_login(&mut self) {
        let (username, password) = match &self.screen {
            Screen::Login(form) => (form.username.clone(), form.password.clone()),
            _ => return,
        };

        match login(&self.store, &username, &password) {
            Ok(user) => {
                self.start_session(&user);
                self.set_status(format!("Welcome, {}.", user.name), StatusKind::Info);
            }
            Err(err) => {
                let message = err.to_string();
                if let Screen::Login(form) = &mut self.screen {
                    form.password.clear();
                    form.error = Some(message.clone());
                }
                self.set_status(message, StatusKind::Error);
            }
        }
    }

    fn start_session(&mut self, user: &User) {
        let books = self.all_books();
        self.screen = if user.is_admin() {
            Screen::Admin(AdminScreen::new(user.name.clone(), books, self.all_users()))
        } else {
            Screen::Student(StudentScreen::new(
                user.username.clone(),
                user.name.clone(),
                books,
            ))
        };
    }

    fn save_registration(&mut self, form: &RegisterForm) -> Result<()> {
        let user = register_user(
            &mut self.store,
            &form.name,
            &form.username,
            &form.password,
            form.role,
        )?;
        if let Screen::Login(_) = self.screen {
            self.screen = Screen::Login(LoginForm::with_username(&user.username));
        }
        self.refresh_tables(None);
        self.set_status("Registered successfully!", StatusKind::Info);
        Ok(())
    }

    fn save_book(&mut self, form: &BookForm) -> Result<()> {
        let draft = form.parse_inputs()?;
        let book = if form.editing {
            edit_book(&mut self.store, draft)?
        } else {
            add_book(&mut self.store, draft)?
        };
        self.refresh_tables(Some(&book.id));
        let verb = if form.editing { "Updated" } else { "Added" };
        self.set_status(format!("{verb} {}.", book.id), StatusKind::Info);
        Ok(())
    }

    fn perform_delete(&mut self, confirm: &ConfirmDelete) -> Result<()> {
        match confirm {
            ConfirmDelete::Book { id, .. } => {
                delete_book(&mut self.store, id)?;
                self.set_status(format!("Deleted {id}."), StatusKind::Info);
            }
            ConfirmDelete::User { username, .. } => {
                delete_user(&mut self.store, username)?;
                self.set_status(format!("Deleted {username}."), StatusKind::Info);
            }
        }
        self.refresh_tables(None);
        Ok(())
    }

    fn borrow_selected(&mut self) -> Result<()> {
        let selection = match &self.screen {
            Screen::Student(student) => student
                .books
                .current_book()
                .map(|book| (student.username.clone(), book.id.clone())),
            _ => return Ok(()),
        };
        let Some((username, book_id)) = selection else {
            self.set_status("Select a book to borrow.", StatusKind::Error);
            return Ok(());
        };

        let transaction = borrow_book(&mut self.store, &username, &book_id)?;
        self.refresh_tables(Some(&book_id));
        self.set_status(
            format!("Borrowed {}!", transaction.book_title),
            StatusKind::Info,
        );
        Ok(())
    }

    fn return_selected(&mut self, book_id: &str) -> Result<()> {
        let username = match &self.screen {
            Screen::Student(student) => student.username.clone(),
            _ => return Ok(()),
        };
        let transaction = return_book(&mut self.store, &username, book_id)?;
        self.refresh_tables(Some(book_id));
        self.set_status(
            format!("Returned {}!", transaction.book_title),
            StatusKind::Info,
        );
        Ok(())
    }

    fn refresh_tables(&mut self, focus_id: Option<&str>) {
        let books = self.all_books();
        let users = self.all_users();
        match &mut self.screen {
            Screen::Admin(admin) => {
                admin.books.set_books(books, focus_id);
                admin.users.set_users(users);
            }
            Screen::Student(student) => student.books.set_books(books, focus_id),
            Screen::Login(_) => {}
        }
    }

    fn all_books(&self) -> Vec<Book> {
        self.store.books().cloned().collect()
    }

    fn all_users(&self) -> Vec<User> {
        self.store.users().cloned().collect()
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Login(form) => self.draw_login(frame, content_area, form),
            Screen::Admin(admin) => self.draw_admin(frame, content_area, admin),
            Screen::Student(student) => self.draw_student(frame, content_area, student),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Registering(form) => self.draw_register_form(frame, area, form),
            Mode::AddingBook(form) => self.draw_book_form(frame, area, "Add Book", form),
            Mode::EditingBook(form) => self.draw_book_form(frame, area, "Edit Book", form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Returning(picker) => self.draw_return_picker(frame, area, picker),
            Mode::ViewingHistory(view) => self.draw_history(frame, area, view),
            Mode::ConfirmLogout => self.draw_confirm_logout(frame, area),
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::Normal => {}
        }
    }

    fn draw_login(&self, frame: &mut Frame, area: Rect, form: &LoginForm) {
        let popup_area = centered_rect(50, 50, area);
        let block = Block::default()
            .title(" Digital Library ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line("Username", LoginField::Username),
            form.build_line("Password", LoginField::Password),
            Line::from(""),
        ];
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to log in • Ctrl-R or F2 to register • Esc to quit",
                Style::default().fg(Color::Gray),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            LOGIN_HINT,
            Style::default().fg(Color::DarkGray),
        )));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        if matches!(self.mode, Mode::Normal) {
            let (prefix, row) = match form.active {
                LoginField::Username => ("Username: ", 0),
                LoginField::Password => ("Password: ", 1),
            };
            frame.set_cursor_position((
                cursor_x(inner, prefix.len() + form.value_len(form.active)),
                inner.y + row,
            ));
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect, title: String) {
        let header = Paragraph::new(Line::from(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, area);
    }

    fn draw_admin(&self, frame: &mut Frame, area: Rect, admin: &AdminScreen) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)])
            .split(area);
        self.draw_header(frame, rows[0], format!("Admin Dashboard: {}", admin.name));

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[1]);
        self.draw_book_table(
            frame,
            columns[0],
            &admin.books,
            "Books",
            admin.focus == AdminPane::Books,
        );

        let user_rows: Vec<Row> = admin
            .users
            .users
            .iter()
            .map(|user| {
                Row::new(vec![
                    user.username.clone(),
                    user.name.clone(),
                    user.role.label().to_string(),
                ])
            })
            .collect();
        let focused = admin.focus == AdminPane::Users;
        let table = Table::new(
            user_rows,
            [
                Constraint::Percentage(35),
                Constraint::Percentage(45),
                Constraint::Percentage(20),
            ],
        )
        .header(header_row(&USER_COLUMNS))
        .block(pane_block("Users", focused))
        .row_highlight_style(highlight_style(focused))
        .highlight_symbol("▶ ");
        let mut state = TableState::default();
        state.select(Some(admin.users.selected));
        frame.render_stateful_widget(table, columns[1], &mut state);
    }

    fn draw_student(&self, frame: &mut Frame, area: Rect, student: &StudentScreen) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)])
            .split(area);
        self.draw_header(frame, rows[0], format!("Welcome, {}", student.name));
        self.draw_book_table(frame, rows[1], &student.books, "All Books", true);
    }

    fn draw_book_table(
        &self,
        frame: &mut Frame,
        area: Rect,
        list: &BookListScreen,
        title: &str,
        focused: bool,
    ) {
        let title = match &list.filter {
            Some(query) if list.has_filter() => format!("{title} • search: {query}"),
            _ => title.to_string(),
        };

        if list.filtered_books.is_empty() {
            let message = if list.has_filter() {
                "No books match the current search."
            } else {
                "No books in the catalog."
            };
            let paragraph = Paragraph::new(message)
                .alignment(Alignment::Center)
                .block(pane_block(&title, focused));
            frame.render_widget(paragraph, area);
            return;
        }

        let rows: Vec<Row> = list.filtered_books.iter().map(book_row).collect();
        let table = Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Percentage(45),
                Constraint::Percentage(30),
                Constraint::Length(5),
                Constraint::Length(5),
            ],
        )
        .header(header_row(&BOOK_COLUMNS))
        .block(pane_block(&title, focused))
        .row_highlight_style(highlight_style(focused))
        .highlight_symbol("▶ ");
        let mut state = TableState::default();
        state.select(Some(list.selected));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let keys: &[(&str, &str)] = match (&self.screen, &self.mode) {
            (_, Mode::Registering(_)) | (_, Mode::AddingBook(_)) | (_, Mode::EditingBook(_)) => {
                &[("[Tab]", "Next Field"), ("[Enter]", "Save"), ("[Esc]", "Cancel")]
            }
            (_, Mode::ConfirmDelete(_)) | (_, Mode::ConfirmLogout) => {
                &[("[y]", "Confirm"), ("[n/Esc]", "Cancel")]
            }
            (_, Mode::Returning(_)) => &[
                ("[↑↓]", "Select"),
                ("[Enter]", "Return"),
                ("[Esc]", "Cancel"),
            ],
            (_, Mode::ViewingHistory(_)) => &[("[↑↓]", "Scroll"), ("[Esc]", "Close")],
            (_, Mode::Searching(_)) => &[
                ("[type]", "Filter"),
                ("[Enter]", "Keep"),
                ("[Esc]", "Clear"),
            ],
            (Screen::Login(_), _) => &[
                ("[Tab]", "Switch Field"),
                ("[Enter]", "Login"),
                ("[Ctrl-R]", "Register"),
                ("[Esc]", "Quit"),
            ],
            (Screen::Admin(_), _) => &[
                ("[↑↓]", "Select"),
                ("[Tab]", "Books/Users"),
                ("[+]", "Add Book"),
                ("[e]", "Edit Book"),
                ("[-]", "Delete"),
                ("[f]", "Search"),
                ("[h]", "Issued History"),
                ("[r]", "Refresh"),
                ("[s]", "Save"),
                ("[l]", "Logout"),
                ("[q]", "Quit"),
            ],
            (Screen::Student(_), _) => &[
                ("[↑↓]", "Select"),
                ("[f]", "Search"),
                ("[Enter/b]", "Borrow"),
                ("[r]", "Return"),
                ("[h]", "Borrowed History"),
                ("[l]", "Logout"),
                ("[q]", "Quit"),
            ],
        };

        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let mut spans = Vec::with_capacity(keys.len() * 2);
        for (idx, (key, label)) in keys.iter().enumerate() {
            spans.push(Span::styled(key.to_string(), key_style));
            let spacer = if idx + 1 == keys.len() { "" } else { "   " };
            spans.push(Span::raw(format!(" {label}{spacer}")));
        }
        Line::from(spans)
    }

    fn draw_register_form(&self, frame: &mut Frame, area: Rect, form: &RegisterForm) {
        let popup_area = centered_rect(60, 45, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Register New User")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line("Full Name", RegisterField::Name),
            form.build_line("Username", RegisterField::Username),
            form.build_line("Password", RegisterField::Password),
            form.build_line("Role", RegisterField::Role),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to register • Tab to switch • ←→ to change role • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (prefix, row) = match form.active {
            RegisterField::Name => ("Full Name: ", 0),
            RegisterField::Username => ("Username: ", 1),
            RegisterField::Password => ("Password: ", 2),
            RegisterField::Role => ("Role: ", 3),
        };
        frame.set_cursor_position((
            cursor_x(inner, prefix.len() + form.value_len(form.active)),
            inner.y + row,
        ));
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &BookForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line("ID", BookField::Id),
            form.build_line("Title", BookField::Title),
            form.build_line("Author", BookField::Author),
            form.build_line("Copies", BookField::Copies),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (prefix, row) = match form.active {
            BookField::Id => ("ID: ", 0),
            BookField::Title => ("Title: ", 1),
            BookField::Author => ("Author: ", 2),
            BookField::Copies => ("Copies: ", 3),
        };
        frame.set_cursor_position((
            cursor_x(inner, prefix.len() + form.value_len(form.active)),
            inner.y + row,
        ));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let detail = match confirm {
            ConfirmDelete::Book { .. } => {
                "Students who still hold a copy keep it on their borrowed list."
            }
            ConfirmDelete::User { .. } => "Their borrowed list is discarded with the account.",
        };
        self.draw_confirm(frame, area, "Confirm", &confirm.prompt(), detail);
    }

    fn draw_confirm_logout(&self, frame: &mut Frame, area: Rect) {
        self.draw_confirm(frame, area, "Confirm", "Logout?", "");
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, title: &str, prompt: &str, detail: &str) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(prompt.to_string()),
            Line::from(detail.to_string()),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_return_picker(&self, frame: &mut Frame, area: Rect, picker: &ReturnPicker) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Select a book to return")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let items: Vec<ListItem> = picker
            .entries
            .iter()
            .map(|entry| ListItem::new(entry.to_string()))
            .collect();

        let list = List::new(items)
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");

        let mut list_state = ListState::default();
        list_state.select(Some(picker.selected));
        frame.render_stateful_widget(list, inner, &mut list_state);
    }

    fn draw_history(&self, frame: &mut Frame, area: Rect, view: &HistoryScreen) {
        let popup_area = centered_rect(85, 80, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(format!("{} ({})", view.title, view.rows.len()))
            .borders(Borders::ALL);

        if view.rows.is_empty() {
            let paragraph = Paragraph::new("No transactions yet.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(paragraph, popup_area);
            return;
        }

        let rows: Vec<Row> = view.rows.iter().map(transaction_row).collect();
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(20),
                Constraint::Percentage(40),
                Constraint::Percentage(15),
                Constraint::Percentage(25),
            ],
        )
        .header(header_row(&HISTORY_COLUMNS))
        .block(block)
        .row_highlight_style(highlight_style(true));
        let mut state = TableState::default();
        state.select(Some(view.selected));
        frame.render_stateful_widget(table, popup_area, &mut state);
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let column = cursor_x(inner, "Search: ".len() + state.query.chars().count());
        frame.set_cursor_position((column, inner.y));
    }
}

fn highlight_style(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    }
}
