use crate::error::EditError;
use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for item IDs.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A stable identifier for an item in a document.
///
/// Internally a `Spur` index (4 bytes, Copy, O(1) Eq and Hash). An ID can
/// never be empty: every constructor rejects blank strings.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(Spur);

impl ItemId {
    /// Intern `s` as an ItemId, verbatim. Blank strings are rejected.
    pub fn new(s: &str) -> Result<Self, EditError> {
        if s.trim().is_empty() {
            return Err(EditError::EmptyId);
        }
        Ok(ItemId(INTERNER.get_or_intern(s)))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// The numeric value of this ID, if it was allocated by an [`IdAllocator`]
    /// (or is spelled exactly like one: `"7"` is numeric, `"007"` is not).
    pub fn as_number(&self) -> Option<u64> {
        let s = self.as_str();
        s.parse::<u64>().ok().filter(|n| n.to_string() == s)
    }
}

impl From<u64> for ItemId {
    fn from(n: u64) -> Self {
        ItemId(INTERNER.get_or_intern(n.to_string()))
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

/// Numeric IDs travel as JSON numbers, everything else as strings.
impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_number() {
            Some(n) => serializer.serialize_u64(n),
            None => serializer.serialize_str(self.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(ItemId::from(n)),
            Raw::Text(s) => ItemId::new(&s).map_err(serde::de::Error::custom),
        }
    }
}

/// Hands out fresh numeric IDs (`1`, `2`, …) for one editor instance.
///
/// The counter only moves forward, so an ID is never reused, even after the
/// item carrying it was deleted or its creation was undone.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate the next ID, skipping any the caller reports as taken.
    /// Fails once the counter has reached `u64::MAX`.
    pub fn allocate(&mut self, taken: impl Fn(ItemId) -> bool) -> Result<ItemId, EditError> {
        loop {
            if self.next == u64::MAX {
                return Err(EditError::invalid("item id space exhausted"));
            }
            let id = ItemId::from(self.next);
            self.next += 1;
            if !taken(id) {
                return Ok(id);
            }
        }
    }

    /// Make sure a numeric ID that entered the document from elsewhere
    /// (e.g. a renderer snapshot) is never handed out again. Saturates at
    /// `u64::MAX`.
    pub fn observe(&mut self, id: ItemId) {
        if let Some(n) = id.as_number()
            && n >= self.next
        {
            self.next = n.saturating_add(1);
        }
    }

    /// The ID the next call to `allocate` will try first.
    pub fn peek(&self) -> u64 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = ItemId::new("title").unwrap();
        let b = ItemId::new("title").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "title");
        assert_eq!(a.as_number(), None);
    }

    #[test]
    fn blank_id_rejected() {
        assert_eq!(ItemId::new(""), Err(EditError::EmptyId));
        assert_eq!(ItemId::new("   "), Err(EditError::EmptyId));
    }

    #[test]
    fn allocator_is_monotonic_and_skips_taken() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.allocate(|_| false), Ok(ItemId::from(1)));
        let two = ItemId::from(2);
        assert_eq!(ids.allocate(|id| id == two), Ok(ItemId::from(3)));
        assert_eq!(ids.peek(), 4);
    }

    #[test]
    fn observe_advances_past_foreign_ids() {
        let mut ids = IdAllocator::new();
        ids.observe(ItemId::from(41));
        ids.observe(ItemId::new("logo").unwrap());
        ids.observe(ItemId::from(7));
        assert_eq!(ids.allocate(|_| false), Ok(ItemId::from(42)));
    }

    #[test]
    fn observing_the_largest_id_exhausts_instead_of_overflowing() {
        let mut ids = IdAllocator::new();
        ids.observe(ItemId::from(u64::MAX));
        assert_eq!(ids.peek(), u64::MAX);
        assert!(ids.allocate(|_| false).is_err());
        ids.observe(ItemId::from(u64::MAX));
        assert_eq!(ids.peek(), u64::MAX);
    }

    #[test]
    fn surrounding_whitespace_is_kept() {
        let padded = ItemId::new(" a").unwrap();
        let plain = ItemId::new("a").unwrap();
        assert_ne!(padded, plain);
        assert_eq!(padded.as_str(), " a");
    }

    #[test]
    fn zero_padded_ids_stay_strings() {
        let padded = ItemId::new("007").unwrap();
        assert_eq!(padded.as_number(), None);
        assert_eq!(serde_json::to_string(&padded).unwrap(), "\"007\"");
        assert_eq!(ItemId::new("7").unwrap().as_number(), Some(7));

        let back: ItemId = serde_json::from_str("\"007\"").unwrap();
        assert_eq!(back, padded);
        assert_ne!(back, ItemId::from(7));
    }

    #[test]
    fn serde_numbers_and_strings() {
        let n: ItemId = serde_json::from_str("12").unwrap();
        assert_eq!(n, ItemId::from(12));
        assert_eq!(serde_json::to_string(&n).unwrap(), "12");

        let s: ItemId = serde_json::from_str("\"star_a\"").unwrap();
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"star_a\"");

        assert!(serde_json::from_str::<ItemId>("\"\"").is_err());
    }
}
