pub mod app;
pub mod dialogs;
pub mod icons;
pub mod interrupt;
pub mod pages;
pub mod router;

pub use app::{Command, TeacherMindApp};
pub use dialogs::TerminalConsole;
