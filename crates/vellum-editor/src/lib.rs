pub mod action;
pub mod config;
pub mod editor;
pub mod error;
pub mod history;
pub mod reducer;
pub mod state;

pub use action::{Action, HoverEvent, LayoutPatch, Order, Target, TextPatch};
pub use config::EditorConfig;
pub use editor::Editor;
pub use error::ReducerError;
pub use history::{History, HistoryEntry};
pub use reducer::reduce;
pub use state::{Clipboard, EditorState, EditorSummary};
