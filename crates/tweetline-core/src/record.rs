//! Raw search results and the records built from them

use std::sync::Arc;

/// Whether a raw item is an original post or a reshare of another one
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawKind {
    Original,
    Reshare { original_id: String },
}

/// One item as returned by a [`SearchSource`](crate::source::SearchSource).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawItem {
    /// Numeric identity, used for pagination
    pub id: u64,
    /// String form of `id`
    pub id_str: String,
    pub text: String,
    pub author_name: String,
    pub author_handle: String,
    pub created_at: String,
    pub kind: RawKind,
}

impl RawItem {
    /// Identity used for uniqueness: the original's id for reshares
    pub fn canonical_id(&self) -> &str {
        match &self.kind {
            RawKind::Original => &self.id_str,
            RawKind::Reshare { original_id } => original_id,
        }
    }

    /// Convert into a [`Record`] tagged with the producing worker
    pub fn into_record(self, source_name: Arc<str>) -> Record {
        let id = self.canonical_id().to_string();
        Record {
            id,
            secondary_id: self.id_str,
            payload: Payload {
                text: self.text,
                author_name: self.author_name,
                author_handle: self.author_handle,
                created_at: self.created_at,
            },
            source_name,
        }
    }
}

/// Descriptive fields carried through the pipeline untouched
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Payload {
    pub text: String,
    pub author_name: String,
    pub author_handle: String,
    pub created_at: String,
}

/// Unit flowing through worker → merger → dedup → sink.
///
/// Two records with the same `id` are the same logical item, whatever their
/// `secondary_id` or `source_name`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub secondary_id: String,
    pub payload: Payload,
    pub source_name: Arc<str>,
}
