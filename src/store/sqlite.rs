//! SQLite-backed section sink using `rig-sqlite` and `sqlite-vec`.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::Once;

use async_trait::async_trait;
use rig::OneOrMany;
use rig::embeddings::{Embedding, EmbeddingModel};
use rig_sqlite::{Column, ColumnValue, SqliteVectorStore, SqliteVectorStoreTable};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::{Connection, ffi};
use tracing::debug;

use crate::store::{SectionRecord, SectionSink};
use crate::types::IngestError;

/// Row shape for persisted sections. The provenance URL is the join key
/// for "all sections belonging to document X".
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SectionDocument {
    pub id: String,
    pub url: String,
    #[serde(deserialize_with = "deserialize_section_index")]
    pub section_index: usize,
    pub content: String,
    #[serde(deserialize_with = "deserialize_metadata_field")]
    pub metadata: serde_json::Value,
}

impl SqliteVectorStoreTable for SectionDocument {
    fn name() -> &'static str {
        "sections"
    }

    fn schema() -> Vec<Column> {
        vec![
            Column::new("id", "TEXT PRIMARY KEY"),
            Column::new("url", "TEXT").indexed(),
            Column::new("section_index", "TEXT"),
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
            ("url", Box::new(self.url.clone())),
            ("section_index", Box::new(self.section_index.to_string())),
            ("metadata", Box::new(self.metadata.to_string())),
            ("content", Box::new(self.content.clone())),
        ]
    }
}

fn deserialize_section_index<'de, D>(deserializer: D) -> Result<usize, D::Error>
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
            .map_err(|_| de::Error::custom(format!("section_index {value} does not fit in usize"))),
        Repr::Text(text) => text.parse::<usize>().map_err(|err| {
            de::Error::custom(format!("unable to parse section_index '{text}': {err}"))
        }),
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

/// Section store over SQLite with vector search via `sqlite-vec`.
///
/// Owns the embedding model: [`SectionSink::submit`] embeds the section
/// (newlines replaced with spaces) and inserts content, vector, and
/// provenance metadata in one step.
#[derive(Clone)]
pub struct SqliteSectionStore<E>
where
    E: EmbeddingModel + 'static,
{
    inner: SqliteVectorStore<E, SectionDocument>,
    /// Separate connection handle for direct queries not supported by
    /// rig-sqlite; a clone of the store's own connection.
    conn: Connection,
    model: E,
}

impl<E> SqliteSectionStore<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    pub async fn open(path: impl AsRef<Path>, model: E) -> Result<Self, IngestError> {
        Self::register_sqlite_vec()?;
        let conn = Connection::open(path)
            .await
            .map_err(|err| IngestError::Storage(err.to_string()))?;
        conn.call(|conn| {
            let result = conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0));
            match result {
                Ok(_) => Ok(()),
                Err(err) => Err(tokio_rusqlite::Error::Rusqlite(err)),
            }
        })
        .await
        .map_err(|err| IngestError::Storage(err.to_string()))?;
        let conn_for_queries = conn.clone();
        let inner = SqliteVectorStore::new(conn, &model)
            .await
            .map_err(|err| IngestError::Storage(err.to_string()))?;
        Ok(Self {
            inner,
            conn: conn_for_queries,
            model,
        })
    }

    fn register_sqlite_vec() -> Result<(), IngestError> {
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
            .map_err(IngestError::Storage)
    }

    /// All stored sections for one provenance URL, in section order.
    pub async fn sections_for_url(&self, url: &str) -> Result<Vec<SectionDocument>, IngestError> {
        let url = url.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT id, url, section_index, content, metadata FROM sections \
                         WHERE url = ? ORDER BY CAST(section_index AS INTEGER) ASC",
                    )
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let rows = stmt
                    .query_map([&url], |row| {
                        Ok(SectionDocument {
                            id: row.get(0)?,
                            url: row.get(1)?,
                            section_index: row.get::<_, String>(2)?.parse().unwrap_or(0),
                            content: row.get(3)?,
                            metadata: row
                                .get::<_, String>(4)
                                .map(|s| serde_json::from_str(&s).unwrap_or_default())
                                .unwrap_or_default(),
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
            .map_err(|err| IngestError::Storage(err.to_string()))
    }

    /// Total number of stored sections.
    pub async fn count(&self) -> Result<usize, IngestError> {
        self.conn
            .call(|conn| {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM sections", [], |row| row.get(0))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| IngestError::Storage(err.to_string()))
    }
}

#[async_trait]
impl<E> SectionSink for SqliteSectionStore<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    async fn submit(&self, record: SectionRecord) -> Result<(), IngestError> {
        // Embedding endpoints behave better on single-line input; the stored
        // content keeps its original newlines.
        let normalized = record.content.replace('\n', " ");
        let mut embeddings = self
            .model
            .embed_texts(vec![normalized])
            .await
            .map_err(|err| IngestError::Embedding(err.to_string()))?;
        let embedding: Embedding = embeddings
            .pop()
            .ok_or_else(|| IngestError::Embedding("model returned no embedding".to_string()))?;

        let source_url = record.source_url;
        let section_index = record.section_index;
        let document = SectionDocument {
            id: record.id,
            url: source_url.clone(),
            section_index,
            content: record.content,
            metadata: serde_json::json!({ "source_url": source_url.clone() }),
        };

        self.inner
            .add_rows(vec![(document, OneOrMany::one(embedding))])
            .await
            .map_err(|err| IngestError::Storage(err.to_string()))?;
        debug!(url = %source_url, index = section_index, "section stored");
        Ok(())
    }
}
