pub mod context;
pub mod document;
pub mod error;
pub mod id;
pub mod model;
pub mod query;

pub use context::DocumentContext;
pub use document::{Document, Guide, Scene};
pub use error::{DocumentError, QueryError};
pub use id::NodeId;
pub use model::*;
pub use query::{Selector, Selectors, query, query_selector};
