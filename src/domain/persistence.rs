/// Schema version written when a document arrives without one.
pub const DEFAULT_SCHEMA_VERSION: u32 = 0;

/// Storage envelope carried by every persisted entity.
///
/// `key` is assigned by the store on first insert and never changes afterwards.
/// `sequence_number` is a caller-supplied logical clock; the store layer uses it to
/// decide which of two competing writes wins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PersistenceDetails {
    pub key: Option<String>,
    pub schema_version: u32,
    pub sequence_number: u64,
}

impl PersistenceDetails {
    /// Envelope for an entity that has never been stored.
    pub fn new(sequence_number: u64) -> Self {
        Self {
            key: None,
            schema_version: DEFAULT_SCHEMA_VERSION,
            sequence_number,
        }
    }

    pub fn stored(key: impl Into<String>, schema_version: u32, sequence_number: u64) -> Self {
        Self {
            key: Some(key.into()),
            schema_version,
            sequence_number,
        }
    }

    pub fn has_valid_key(&self) -> bool {
        self.valid_key().is_some()
    }

    pub fn valid_key(&self) -> Option<&str> {
        self.key.as_deref().filter(|key| !key.is_empty())
    }

    /// Same envelope with the clock advanced by one, for callers preparing the next save.
    pub fn next_sequence(&self) -> Self {
        Self {
            key: self.key.clone(),
            schema_version: self.schema_version,
            sequence_number: self.sequence_number.saturating_add(1),
        }
    }
}
