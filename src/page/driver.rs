use crate::dom::dom_model::{DomSnapshot, FieldValue};
use crate::error::EngineError;

/// Keys the engine simulates against widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Enter,
    ArrowDown,
}

impl Key {
    pub fn as_str(&self) -> &'static str {
        match self {
            Key::Space => " ",
            Key::Enter => "Enter",
            Key::ArrowDown => "ArrowDown",
        }
    }
}

/// Synchronous handle to one live document.
///
/// Everything the discovery and fill engines do to a page goes through this
/// trait. The live implementation is `PageSession` (a Node.js page host);
/// tests use `FakePage`. Mutating operations return `Ok(false)` when the
/// selector resolves nothing, so a stale descriptor degrades to a per-field
/// failure instead of an error.
pub trait PageDriver {
    /// Full DOM tree snapshot. The extractor stamps each element with a
    /// `data-ff-node` ordinal so snapshot nodes can be re-addressed live.
    fn snapshot(&mut self) -> Result<DomSnapshot, EngineError>;

    /// Monotonic counter bumped on every observed document mutation.
    fn dom_version(&mut self) -> Result<u64, EngineError>;

    /// Pointer click (press and release) on the first match.
    fn click(&mut self, selector: &str) -> Result<bool, EngineError>;

    /// Simulated keypress against the first match.
    fn press_key(&mut self, selector: &str, key: Key) -> Result<bool, EngineError>;

    /// Set a control's value and dispatch input-then-change.
    fn set_value(&mut self, selector: &str, value: &str) -> Result<bool, EngineError>;

    /// Set checked state and dispatch change (plus click for radios).
    fn set_checked(&mut self, selector: &str, checked: bool) -> Result<bool, EngineError>;

    /// Select the options with the given values on a native select.
    fn select_values(&mut self, selector: &str, values: &[String]) -> Result<bool, EngineError>;

    /// Write an attribute onto the first match.
    fn set_attribute(&mut self, selector: &str, name: &str, value: &str)
        -> Result<bool, EngineError>;

    /// Live value of the first match, `None` when the selector resolves nothing.
    fn read_value(&mut self, selector: &str) -> Result<Option<FieldValue>, EngineError>;

    /// Whether any match is currently visible.
    fn query_visible(&mut self, selector: &str) -> Result<bool, EngineError>;

    /// Bounded markup snippet of the first match, for descriptor context.
    fn outer_html(&mut self, selector: &str, max_len: usize)
        -> Result<Option<String>, EngineError>;

    /// Attach a file to a file input and dispatch change. This is what can
    /// kick off a page-owned autofill pass, hence the settle waiter.
    fn upload(&mut self, selector: &str, path: &str) -> Result<bool, EngineError>;

    /// Suspend for `ms` milliseconds. The fake driver advances a virtual
    /// clock instead of sleeping, which keeps every bounded wait in the
    /// engine deterministic under test.
    fn wait(&mut self, ms: u64) -> Result<(), EngineError>;
}
