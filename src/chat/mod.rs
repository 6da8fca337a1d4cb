pub mod context;
pub mod session;

pub use session::{ChatSession, SendOutcome, SessionEvent};
