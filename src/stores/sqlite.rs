use rig::OneOrMany;
use rig::embeddings::{Embedding, EmbeddingModel};
use rig_sqlite::{Column, ColumnValue, SqliteVectorStore, SqliteVectorStoreTable};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::Once;
use tokio_rusqlite::{Connection, ffi};

use crate::types::RiteError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PassageDocument {
    pub id: String,
    pub book: String,
    #[serde(deserialize_with = "deserialize_seq_index")]
    pub seq_index: usize,
    pub content: String,
    #[serde(deserialize_with = "deserialize_metadata_field")]
    pub metadata: serde_json::Value,
}

impl SqliteVectorStoreTable for PassageDocument {
    fn name() -> &'static str {
        "passages"
    }

    fn schema() -> Vec<Column> {
        vec![
            Column::new("id", "TEXT PRIMARY KEY"),
            Column::new("book", "TEXT").indexed(),
            Column::new("seq_index", "TEXT"),
            Column::new("metadata", "TEXT"),
            Column::new("content", "TEXT"),
        ]
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    fn column_values(&self) -> Vec<(&'static str, Box<dyn ColumnValue>)> {
        vec![
            ("id", Box::new(self.id.clone())),
            ("book", Box::new(self.book.clone())),
            ("seq_index", Box::new(self.seq_index.to_string())),
            ("metadata", Box::new(self.metadata.to_string())),
            ("content", Box::new(self.content.clone())),
        ]
    }
}

fn deserialize_seq_index<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(u64),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Num(value) => usize::try_from(value)
            .map_err(|_| de::Error::custom(format!("seq_index {value} does not fit in usize"))),
        Repr::Text(text) => text
            .parse::<usize>()
            .map_err(|err| de::Error::custom(format!("unable to parse seq_index '{text}': {err}"))),
    }
}

fn deserialize_metadata_field<'de, D>(deserializer: D) -> Result<serde_json::Value, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if let serde_json::Value::String(raw) = value {
        serde_json::from_str(&raw).map_or(Ok(serde_json::Value::String(raw)), Ok)
    } else {
        Ok(value)
    }
}

/// SQLite-backed passage store with vector search via `sqlite-vec`.
///
/// The embedding model is owned by the store: passage content is embedded at
/// insert time and query text at search time, so callers never see vectors.
#[derive(Clone)]
pub struct SqlitePassageStore<E>
where
    E: EmbeddingModel + 'static,
{
    inner: SqliteVectorStore<E, PassageDocument>,
    /// Separate connection handle for direct queries not supported by rig-sqlite.
    /// This is a clone of the connection used by the inner store.
    conn: Connection,
    model: E,
}

impl<E> SqlitePassageStore<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    pub async fn open(path: impl AsRef<Path>, model: &E) -> Result<Self, RiteError> {
        Self::register_sqlite_vec()?;
        let conn = Connection::open(path)
            .await
            .map_err(|err| RiteError::Storage(err.to_string()))?;
        conn.call(|conn| {
            let result = conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0));
            match result {
                Ok(_) => Ok(()),
                Err(err) => Err(tokio_rusqlite::Error::Rusqlite(err)),
            }
        })
        .await
        .map_err(|err| RiteError::Storage(err.to_string()))?;
        // Clone connection for direct access before moving into store
        let conn_for_queries = conn.clone();
        let store = SqliteVectorStore::new(conn, model)
            .await
            .map_err(|err| RiteError::Storage(err.to_string()))?;
        Ok(Self {
            inner: store,
            conn: conn_for_queries,
            model: model.clone(),
        })
    }

    async fn add_documents(
        &self,
        documents: Vec<(PassageDocument, Vec<f64>)>,
    ) -> Result<(), RiteError> {
        if documents.is_empty() {
            return Ok(());
        }
        let mut rows = Vec::with_capacity(documents.len());
        for (doc, vec) in documents {
            let embed = Embedding {
                document: doc.content.clone(),
                vec,
            };
            rows.push((doc, OneOrMany::one(embed)));
        }
        self.inner
            .add_rows(rows)
            .await
            .map_err(|err| RiteError::Storage(err.to_string()))?;
        Ok(())
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Embedding>, RiteError> {
        self.model
            .embed_texts(texts)
            .await
            .map_err(|err| RiteError::Embedding(err.to_string()))
    }

    fn register_sqlite_vec() -> Result<(), RiteError> {
        use std::sync::Mutex;

        static INIT: Once = Once::new();
        static INIT_RESULT: Mutex<Option<Result<(), String>>> = Mutex::new(None);

        INIT.call_once(|| {
            let result = unsafe {
                type SqliteExtensionInit = unsafe extern "C" fn(
                    *mut ffi::sqlite3,
                    *mut *mut c_char,
                    *const ffi::sqlite3_api_routines,
                ) -> i32;

                let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
                let init_fn: SqliteExtensionInit =
                    transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
                let rc = ffi::sqlite3_auto_extension(Some(init_fn));
                if rc != 0 {
                    Err(format!(
                        "failed to register sqlite-vec extension (code {rc})"
                    ))
                } else {
                    Ok(())
                }
            };
            *INIT_RESULT.lock().expect("init result mutex poisoned") = Some(result);
        });

        INIT_RESULT
            .lock()
            .expect("init result mutex poisoned")
            .clone()
            .expect("init was called but result not set")
            .map_err(RiteError::Storage)
    }

    /// Get the underlying connection for direct queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

// ============================================================================
// PassageStore Trait Implementation
// ============================================================================

use super::{PassageHit, PassageRecord, PassageStore};
use async_trait::async_trait;

impl From<PassageRecord> for PassageDocument {
    fn from(record: PassageRecord) -> Self {
        PassageDocument {
            id: record.key,
            book: record.book,
            seq_index: record.seq_index,
            content: record.content,
            metadata: record.metadata,
        }
    }
}

impl From<PassageDocument> for PassageRecord {
    fn from(doc: PassageDocument) -> Self {
        PassageRecord {
            key: doc.id,
            book: doc.book,
            seq_index: doc.seq_index,
            content: doc.content,
            metadata: doc.metadata,
        }
    }
}

#[async_trait]
impl<E> PassageStore for SqlitePassageStore<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    async fn insert_passages(&self, passages: Vec<PassageRecord>) -> Result<(), RiteError> {
        if passages.is_empty() {
            return Ok(());
        }

        // Respect the model's batch ceiling when embedding.
        for batch in passages.chunks(E::MAX_DOCUMENTS.max(1)) {
            let texts: Vec<String> = batch.iter().map(|record| record.content.clone()).collect();
            let embeddings = self.embed_batch(texts).await?;
            let documents: Vec<(PassageDocument, Vec<f64>)> = batch
                .iter()
                .cloned()
                .zip(embeddings)
                .map(|(record, embedding)| (PassageDocument::from(record), embedding.vec))
                .collect();
            self.add_documents(documents).await?;
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize, RiteError> {
        let conn = self.connection();

        conn.call(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM passages", [], |row| row.get(0))
                .map_err(tokio_rusqlite::Error::Rusqlite)?;
            Ok(count as usize)
        })
        .await
        .map_err(|err| RiteError::Storage(err.to_string()))
    }

    async fn query(&self, query_text: &str, k: usize) -> Result<Vec<PassageHit>, RiteError> {
        let mut embeddings = self.embed_batch(vec![query_text.to_string()]).await?;
        let embedding = embeddings
            .pop()
            .ok_or_else(|| RiteError::Embedding("model returned no query embedding".to_string()))?;
        let query_vec: Vec<f32> = embedding.vec.into_iter().map(|value| value as f32).collect();
        let embedding_json = serde_json::to_string(&query_vec)
            .map_err(|err| RiteError::Storage(err.to_string()))?;
        let conn = self.connection();

        conn.call(move |conn| {
            // sqlite-vec cosine distance; the embeddings virtual table shares
            // rowids with the passages table.
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT p.id, p.book, p.seq_index, p.content, p.metadata, \
                     vec_distance_cosine(e.embedding, vec_f32(?)) as distance \
                     FROM passages p \
                     JOIN passages_embeddings e ON e.rowid = p.rowid \
                     ORDER BY distance ASC \
                     LIMIT {}",
                    k
                ))
                .map_err(tokio_rusqlite::Error::Rusqlite)?;

            let rows = stmt
                .query_map([&embedding_json], |row| {
                    let doc = PassageDocument {
                        id: row.get(0)?,
                        book: row.get(1)?,
                        seq_index: row.get::<_, String>(2)?.parse().unwrap_or(0),
                        content: row.get(3)?,
                        metadata: row
                            .get::<_, String>(4)
                            .map(|s| serde_json::from_str(&s).unwrap_or_default())
                            .unwrap_or_default(),
                    };
                    let distance: f32 = row.get(5)?;
                    Ok(PassageHit {
                        record: PassageRecord::from(doc),
                        distance,
                    })
                })
                .map_err(tokio_rusqlite::Error::Rusqlite)?;

            let mut results = Vec::new();
            for row in rows {
                results.push(row.map_err(tokio_rusqlite::Error::Rusqlite)?);
            }
            Ok(results)
        })
        .await
        .map_err(|err| RiteError::Storage(err.to_string()))
    }
}
