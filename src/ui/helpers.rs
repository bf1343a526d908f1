use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row};
use tracing::error;

use crate::error::LibraryError;
use crate::models::{Book, Transaction};

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant message from a chained error. Storage failures
/// are also written to the log, since the footer only shows the last cause.
pub(crate) fn surface_error(err: &Error) -> String {
    if let Some(library_err) = err.downcast_ref::<LibraryError>() {
        if !library_err.is_rejection() {
            error!(error = %library_err, "storage failure");
            return library_err.to_string();
        }
    }
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Column for a text cursor after `offset` characters, kept inside `area`.
pub(crate) fn cursor_x(area: Rect, offset: usize) -> u16 {
    let offset = u16::try_from(offset).unwrap_or(u16::MAX);
    area.x
        .saturating_add(offset)
        .min(area.right().saturating_sub(1))
        .max(area.x)
}

/// Bordered block whose border lights up when it has focus.
pub(crate) fn pane_block(title: &str, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(style)
}

pub(crate) fn header_row(titles: &[&'static str]) -> Row<'static> {
    Row::new(titles.iter().map(|title| Cell::from(*title)))
        .style(Style::default().add_modifier(Modifier::BOLD))
}

/// Catalog row: ID, Title, Author, Avail, Total. Exhausted titles are dimmed.
pub(crate) fn book_row(book: &Book) -> Row<'static> {
    let style = if book.is_available() {
        Style::default()
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Row::new(vec![
        Cell::from(book.id.clone()),
        Cell::from(book.title.clone()),
        Cell::from(book.author.clone()),
        Cell::from(book.available_copies.to_string()),
        Cell::from(book.total_copies.to_string()),
    ])
    .style(style)
}

pub(crate) fn transaction_row(entry: &Transaction) -> Row<'static> {
    Row::new(vec![
        Cell::from(entry.username.clone()),
        Cell::from(entry.book_title.clone()),
        Cell::from(entry.action.to_string()),
        Cell::from(entry.formatted_timestamp()),
    ])
}
