use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner for node and scene ids.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Counter behind [`NodeId::with_prefix`]. Shared by every document in the process.
static COUNTER: AtomicU64 = AtomicU64::new(0);

/// A lightweight, interned identifier for nodes and scenes.
/// Internally a 4-byte `Spur` index.
///
/// Scenes and nodes share one id space: a scene is the root vertex of the
/// hierarchy it owns, so `parent_of(top_level_node)` is the scene id.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Spur);

impl NodeId {
    /// Intern a string as a NodeId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        NodeId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Generate a process-unique id with a kind prefix (e.g. `rectangle-12`).
    ///
    /// Uniqueness is per process; callers that load foreign documents must
    /// still check the id is unused in their document (see
    /// [`crate::Document::fresh_id`]).
    pub fn with_prefix(prefix: &str) -> Self {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::intern(&format!("{prefix}-{n}"))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId::intern(s)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let a = NodeId::intern("hero_banner");
        let b = NodeId::intern("hero_banner");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "hero_banner");
        assert_eq!(a.to_string(), "hero_banner");
    }

    #[test]
    fn prefixed_ids_are_unique() {
        let a = NodeId::with_prefix("rectangle");
        let b = NodeId::with_prefix("rectangle");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("rectangle-"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = NodeId::intern("logo");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"logo\"");
        let back: NodeId = serde_json::from_str("\"logo\"").unwrap();
        assert_eq!(back, id);
    }
}
