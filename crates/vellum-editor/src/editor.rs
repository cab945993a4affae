//! The editing session facade: history plus config behind one handle.

use crate::action::Action;
use crate::config::EditorConfig;
use crate::error::ReducerError;
use crate::history::History;
use crate::state::{EditorState, EditorSummary};
use vellum_core::{Document, DocumentError, Selector, Selectors};

/// One editing session over one document.
#[derive(Debug, Clone)]
pub struct Editor {
    history: History,
    config: EditorConfig,
}

impl Editor {
    /// A session over a fresh, empty document.
    pub fn new(config: EditorConfig) -> Self {
        Self::load(Document::new(), config)
    }

    pub fn load(document: Document, config: EditorConfig) -> Self {
        let history = History::new(EditorState::new(document), config.max_history_depth);
        Self { history, config }
    }

    /// Load a JSON snapshot. The document is validated before use.
    pub fn from_json(json: &str, config: EditorConfig) -> Result<Self, DocumentError> {
        Ok(Self::load(Document::from_json(json)?, config))
    }

    pub fn dispatch(&mut self, action: Action) -> Result<(), ReducerError> {
        self.history.dispatch(&action, &self.config).inspect_err(|err| {
            log::debug!("{} rejected: {err}", action.label());
        })
    }

    /// Dispatch in order, stopping at the first rejected action. Actions
    /// before it stay applied.
    pub fn dispatch_all(
        &mut self,
        actions: impl IntoIterator<Item = Action>,
    ) -> Result<(), ReducerError> {
        actions.into_iter().try_for_each(|action| self.dispatch(action))
    }

    /// Select by selector strings, e.g. `&["~+"]` or `&["hero", "logo"]`.
    pub fn select_str(&mut self, selectors: &[&str]) -> Result<(), ReducerError> {
        let selectors = selectors
            .iter()
            .map(|s| s.parse::<Selector>())
            .collect::<Result<Selectors, _>>()?;
        self.dispatch(Action::Select { selectors })
    }

    pub fn undo(&mut self) -> Option<String> {
        self.history.undo()
    }

    pub fn redo(&mut self) -> Option<String> {
        self.history.redo()
    }

    pub fn begin_batch(&mut self, label: &str) {
        self.history.begin_batch(label);
    }

    pub fn end_batch(&mut self) -> bool {
        self.history.end_batch()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn state(&self) -> &EditorState {
        self.history.present()
    }

    pub fn document(&self) -> &Document {
        &self.state().document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn summary(&self) -> EditorSummary {
        self.history.summary()
    }

    pub fn snapshot_json(&self) -> Result<String, DocumentError> {
        self.document().to_json()
    }

    pub fn snapshot_msgpack(&self) -> Result<Vec<u8>, DocumentError> {
        self.document().to_msgpack()
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
