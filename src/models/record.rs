//! Vector record types and identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::DEFAULT_NAMESPACE;

/// Unique identifier for a stored vector record.
///
/// Assigned by the record store at creation time and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a new record ID from an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh, time-ordered identifier (UUID v7).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One stored embedding plus its metadata.
///
/// Every record belongs to exactly one `(agent_name, namespace)` partition;
/// all driver operations are scoped to that partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique identifier, assigned by the record store on creation.
    pub id: RecordId,
    /// The owning logical agent. Required, non-empty.
    pub agent_name: String,
    /// Partition within the agent's memory.
    pub namespace: String,
    /// The original text the embedding represents.
    pub content: String,
    /// Open key-value metadata, opaque to the core. JSON is the
    /// serialization boundary when the record crosses into storage.
    pub metadata: Map<String, Value>,
    /// Optional provenance tag, used for filtered deletes and statistics.
    pub source: Option<String>,
    /// Optional identifier within the source (chunk number, URL, etc.).
    pub source_id: Option<String>,
    /// Name of the embedding provider that produced the vector.
    pub embedding_provider: String,
    /// Name of the embedding model that produced the vector.
    pub embedding_model: String,
    /// The embedding itself. Fixed dimensionality per provider/model.
    pub embedding_vector: Vec<f32>,
    /// Token count of the content, used only for aggregate statistics.
    pub token_count: u32,
    /// Creation timestamp, set at creation and never mutated.
    pub created_at: DateTime<Utc>,
}

impl VectorRecord {
    /// Returns the dimensionality of the stored embedding.
    #[must_use]
    pub const fn dimensions(&self) -> usize {
        self.embedding_vector.len()
    }
}

/// A record creation request, before the store assigns an id and timestamp.
#[derive(Debug, Clone, Default)]
pub struct NewVectorRecord {
    /// The owning logical agent. Required, non-empty.
    pub agent_name: String,
    /// Partition within the agent's memory.
    pub namespace: String,
    /// The original text the embedding represents.
    pub content: String,
    /// Open key-value metadata.
    pub metadata: Map<String, Value>,
    /// Optional provenance tag.
    pub source: Option<String>,
    /// Optional identifier within the source.
    pub source_id: Option<String>,
    /// Name of the embedding provider.
    pub embedding_provider: String,
    /// Name of the embedding model.
    pub embedding_model: String,
    /// The embedding vector.
    pub embedding_vector: Vec<f32>,
    /// Token count of the content.
    pub token_count: u32,
}

impl NewVectorRecord {
    /// Creates a request with the required fields and the default namespace.
    #[must_use]
    pub fn new(
        agent_name: impl Into<String>,
        content: impl Into<String>,
        embedding_vector: Vec<f32>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            content: content.into(),
            embedding_vector,
            ..Self::default()
        }
    }

    /// Sets the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the provenance source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the identifier within the source.
    #[must_use]
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// Sets the embedding provider and model names.
    #[must_use]
    pub fn with_embedding_origin(
        mut self,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        self.embedding_provider = provider.into();
        self.embedding_model = model.into();
        self
    }

    /// Sets the metadata map.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Sets the token count.
    #[must_use]
    pub const fn with_token_count(mut self, token_count: u32) -> Self {
        self.token_count = token_count;
        self
    }

    /// Finalizes the request into a record with the given id, stamping the
    /// creation time. Called by record stores, not by application code.
    #[must_use]
    pub fn into_record(self, id: RecordId) -> VectorRecord {
        VectorRecord {
            id,
            agent_name: self.agent_name,
            namespace: self.namespace,
            content: self.content,
            metadata: self.metadata,
            source: self.source,
            source_id: self.source_id,
            embedding_provider: self.embedding_provider,
            embedding_model: self.embedding_model,
            embedding_vector: self.embedding_vector,
            token_count: self.token_count,
            created_at: Utc::now(),
        }
    }
}
