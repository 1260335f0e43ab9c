//! Data carried across the engine seams

use std::fmt;

/// Ordered key/value pairs produced by a prefix or range scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries are kept in the order given.
    pub fn from_entries(entries: Vec<(Vec<u8>, Vec<u8>)>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.push((key, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(Vec<u8>, Vec<u8>)] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.iter().map(|(k, _)| k.as_slice())
    }
}

impl IntoIterator for ResultSet {
    type Item = (Vec<u8>, Vec<u8>);
    type IntoIter = std::vec::IntoIter<(Vec<u8>, Vec<u8>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(Vec<u8>, Vec<u8>)> for ResultSet {
    fn from_iter<I: IntoIterator<Item = (Vec<u8>, Vec<u8>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Log payload type handed to the persistence manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Insert,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::Insert => "insert",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One modification in an insert group. `value == None` deletes the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertRecord {
    pub index_id: u32,
    pub key: Vec<u8>,
    pub value: Option<Vec<u8>>,
}

impl InsertRecord {
    pub fn is_delete(&self) -> bool {
        self.value.is_none()
    }
}

/// Ordered batch of modifications against one database, applied atomically
/// by the write path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertGroup {
    database_id: u32,
    records: Vec<InsertRecord>,
}

impl InsertGroup {
    pub fn new(database_id: u32) -> Self {
        Self {
            database_id,
            records: Vec::new(),
        }
    }

    pub fn add_insert(&mut self, index_id: u32, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.records.push(InsertRecord {
            index_id,
            key: key.into(),
            value: Some(value.into()),
        });
    }

    pub fn add_delete(&mut self, index_id: u32, key: impl Into<Vec<u8>>) {
        self.records.push(InsertRecord {
            index_id,
            key: key.into(),
            value: None,
        });
    }

    pub fn database_id(&self) -> u32 {
        self.database_id
    }

    pub fn records(&self) -> &[InsertRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
