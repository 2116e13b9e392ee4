pub mod documents;
pub mod history;

pub use documents::{DocumentRecord, DocumentStore};
pub use history::{HistoryStore, QaHistoryEntry};
