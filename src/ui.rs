//! Ratatui front-end for the digital library: the login card, the admin and
//! student dashboards, and the modal dialogs layered over them.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
