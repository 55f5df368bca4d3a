// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document CRUD, search, and eviction queries.
//!
//! Every read goes through a [`Scope`], which restricts rows to one
//! collection and owner and hides rows older than the collection's TTL
//! cutoff.

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use rusqlite::types::{Type, Value};
use serde_json::{Map, Value as Json};

use recall_core::types::{
    Collection, DocumentFilter, DocumentPatch, NewDocument, ScoredDocument, StoredDocument,
    format_timestamp,
};
use recall_core::vector::{blob_to_vec, cosine_similarity, vec_to_blob};
use recall_core::RecallError;

use crate::database::{Database, map_tr_err};

const COLUMNS: &str = "d.id, d.owner_id, d.text, d.embedding, d.attributes, d.created_at, d.updated_at";

/// Collection, owner, attribute constraints, and TTL cutoff for one query.
#[derive(Debug, Clone)]
pub struct Scope {
    pub collection: Collection,
    pub owner_id: String,
    pub attributes: Vec<(String, String)>,
    /// Rows created at or before this timestamp are expired. Empty means no TTL.
    pub cutoff: String,
}

impl Scope {
    pub fn new(collection: Collection, filter: &DocumentFilter, cutoff: String) -> Self {
        Self {
            collection,
            owner_id: filter.owner_id.clone(),
            attributes: filter.attributes.clone(),
            cutoff,
        }
    }

    /// `WHERE`-clause fragment over alias `d` plus its positional parameters.
    fn clause(&self) -> (String, Vec<Value>) {
        let mut sql = String::from("d.collection = ? AND d.owner_id = ? AND d.created_at > ?");
        let mut params = vec![
            Value::Text(self.collection.as_str().to_string()),
            Value::Text(self.owner_id.clone()),
            Value::Text(self.cutoff.clone()),
        ];
        for (key, value) in &self.attributes {
            sql.push_str(" AND json_extract(d.attributes, ?) = ?");
            params.push(Value::Text(format!("$.{key}")));
            params.push(Value::Text(value.clone()));
        }
        (sql, params)
    }
}

/// Only plain identifiers may be used as JSON attribute names in queries.
pub fn validate_field_name(field: &str) -> Result<(), RecallError> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RecallError::Validation(format!(
            "invalid attribute name `{field}`"
        )))
    }
}

/// Turn free text into an FTS5 query that ORs its quoted terms.
///
/// Returns `None` when the text contains no searchable terms.
pub fn fts_query(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(|term| format!("\"{term}\""))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

fn parse_timestamp(idx: usize, raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_attributes(idx: usize, raw: &str) -> Result<Map<String, Json>, rusqlite::Error> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_document(row: &rusqlite::Row) -> Result<StoredDocument, rusqlite::Error> {
    let blob: Vec<u8> = row.get(3)?;
    let attributes: String = row.get(4)?;
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;
    Ok(StoredDocument {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        text: row.get(2)?,
        embedding: blob_to_vec(&blob),
        attributes: parse_attributes(4, &attributes)?,
        created_at: parse_timestamp(5, &created_at)?,
        updated_at: parse_timestamp(6, &updated_at)?,
    })
}

fn to_json(attributes: &Map<String, Json>) -> Result<String, RecallError> {
    serde_json::to_string(attributes).map_err(|e| RecallError::Storage {
        source: Box::new(e),
    })
}

/// Insert a document, assigning a fresh UUID.
pub async fn insert(
    db: &Database,
    collection: Collection,
    document: NewDocument,
) -> Result<StoredDocument, RecallError> {
    let now = Utc::now();
    let created_at = document.created_at.unwrap_or(now);
    let stored = StoredDocument {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: document.owner_id,
        text: document.text,
        embedding: document.embedding,
        attributes: document.attributes,
        created_at,
        updated_at: now,
    };

    let row = (
        stored.id.clone(),
        collection.as_str(),
        stored.owner_id.clone(),
        stored.text.clone(),
        vec_to_blob(&stored.embedding),
        to_json(&stored.attributes)?,
        format_timestamp(&stored.created_at),
        format_timestamp(&stored.updated_at),
    );
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO documents (id, collection, owner_id, text, embedding, attributes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![row.0, row.1, row.2, row.3, row.4, row.5, row.6, row.7],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    Ok(stored)
}

/// Fetch one live document by id.
pub async fn get(
    db: &Database,
    collection: Collection,
    id: &str,
    cutoff: String,
) -> Result<Option<StoredDocument>, RecallError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<StoredDocument>, rusqlite::Error> {
            let sql = format!(
                "SELECT {COLUMNS} FROM documents d WHERE d.id = ?1 AND d.collection = ?2 AND d.created_at > ?3"
            );
            conn.query_row(
                &sql,
                rusqlite::params![id, collection.as_str(), cutoff],
                row_to_document,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a patch in one transaction: attributes are merged key by key.
pub async fn update(
    db: &Database,
    collection: Collection,
    id: &str,
    patch: DocumentPatch,
    cutoff: String,
) -> Result<bool, RecallError> {
    let id = id.to_string();
    let updated_at = format_timestamp(&Utc::now());
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction()?;
            let current: Option<String> = tx
                .query_row(
                    "SELECT attributes FROM documents WHERE id = ?1 AND collection = ?2 AND created_at > ?3",
                    rusqlite::params![id, collection.as_str(), cutoff],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(current) = current else {
                return Ok(false);
            };

            let mut attributes = parse_attributes(0, &current)?;
            for (key, value) in patch.attributes {
                attributes.insert(key, value);
            }
            let attributes = serde_json::to_string(&attributes).map_err(|e| {
                rusqlite::Error::ToSqlConversionFailure(Box::new(e))
            })?;
            let embedding = patch.embedding.as_deref().map(vec_to_blob);

            tx.execute(
                "UPDATE documents SET
                    text = COALESCE(?1, text),
                    embedding = COALESCE(?2, embedding),
                    attributes = ?3,
                    updated_at = ?4
                 WHERE id = ?5",
                rusqlite::params![patch.text, embedding, attributes, updated_at, id],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a document by id regardless of expiry.
pub async fn delete(db: &Database, collection: Collection, id: &str) -> Result<bool, RecallError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let n = conn.execute(
                "DELETE FROM documents WHERE id = ?1 AND collection = ?2",
                rusqlite::params![id, collection.as_str()],
            )?;
            Ok(n > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// List live documents in creation order (ties by insertion order).
pub async fn list(db: &Database, scope: Scope) -> Result<Vec<StoredDocument>, RecallError> {
    db.connection()
        .call(move |conn| -> Result<Vec<StoredDocument>, rusqlite::Error> {
            let (clause, params) = scope.clause();
            let sql = format!(
                "SELECT {COLUMNS} FROM documents d WHERE {clause} ORDER BY d.created_at ASC, d.rowid ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let docs = stmt
                .query_map(rusqlite::params_from_iter(params), row_to_document)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(docs)
        })
        .await
        .map_err(map_tr_err)
}

/// Brute-force cosine search over the scope.
pub async fn find_top_k_by_vector(
    db: &Database,
    scope: Scope,
    vector: Vec<f32>,
    k: usize,
) -> Result<Vec<ScoredDocument>, RecallError> {
    if k == 0 {
        return Ok(Vec::new());
    }
    let mut scored: Vec<ScoredDocument> = list(db, scope)
        .await?
        .into_iter()
        .map(|document| ScoredDocument {
            score: cosine_similarity(&vector, &document.embedding),
            document,
        })
        .collect();
    // Stable sort keeps creation order among equal scores.
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(k);
    Ok(scored)
}

/// BM25 full-text search over the scope. Scores are negated so higher is better.
pub async fn find_top_k_by_lexical(
    db: &Database,
    scope: Scope,
    text: &str,
    k: usize,
) -> Result<Vec<ScoredDocument>, RecallError> {
    let Some(query) = fts_query(text) else {
        return Ok(Vec::new());
    };
    if k == 0 {
        return Ok(Vec::new());
    }
    db.connection()
        .call(move |conn| -> Result<Vec<ScoredDocument>, rusqlite::Error> {
            let (clause, scope_params) = scope.clause();
            let sql = format!(
                "SELECT {COLUMNS}, -bm25(documents_fts) AS score
                 FROM documents_fts JOIN documents d ON d.rowid = documents_fts.rowid
                 WHERE documents_fts MATCH ? AND {clause}
                 ORDER BY score DESC, d.rowid ASC
                 LIMIT ?"
            );
            let mut params = vec![Value::Text(query)];
            params.extend(scope_params);
            params.push(Value::Integer(i64::try_from(k).unwrap_or(i64::MAX)));

            let mut stmt = conn.prepare(&sql)?;
            let results = stmt
                .query_map(rusqlite::params_from_iter(params), |row| {
                    let score: f64 = row.get(7)?;
                    Ok(ScoredDocument {
                        document: row_to_document(row)?,
                        score: score as f32,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(results)
        })
        .await
        .map_err(map_tr_err)
}

/// Count live documents in the scope.
pub async fn count(db: &Database, scope: Scope) -> Result<usize, RecallError> {
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            let (clause, params) = scope.clause();
            let sql = format!("SELECT COUNT(*) FROM documents d WHERE {clause}");
            conn.query_row(&sql, rusqlite::params_from_iter(params), |row| row.get(0))
        })
        .await
        .map_err(map_tr_err)
        .map(|n| usize::try_from(n).unwrap_or(0))
}

/// Delete the `n` live documents with the lowest numeric `field` attribute.
pub async fn delete_lowest_by_field(
    db: &Database,
    scope: Scope,
    field: &str,
    n: usize,
) -> Result<usize, RecallError> {
    validate_field_name(field)?;
    if n == 0 {
        return Ok(0);
    }
    let path = format!("$.{field}");
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            let (clause, scope_params) = scope.clause();
            let sql = format!(
                "DELETE FROM documents WHERE rowid IN (
                    SELECT d.rowid FROM documents d WHERE {clause}
                    ORDER BY CAST(json_extract(d.attributes, ?) AS REAL) ASC, d.rowid ASC
                    LIMIT ?
                 )"
            );
            let mut params = scope_params;
            params.push(Value::Text(path));
            params.push(Value::Integer(i64::try_from(n).unwrap_or(i64::MAX)));
            conn.execute(&sql, rusqlite::params_from_iter(params))
        })
        .await
        .map_err(map_tr_err)
}

/// Physically delete rows of `collection` created at or before `cutoff`.
pub async fn purge_before(
    db: &Database,
    collection: Collection,
    cutoff: String,
) -> Result<usize, RecallError> {
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND created_at <= ?2",
                rusqlite::params![collection.as_str(), cutoff],
            )
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fts_query_quotes_terms_and_drops_punctuation() {
        assert_eq!(
            fts_query("tea, coffee & \"milk\"?").as_deref(),
            Some("\"tea\" OR \"coffee\" OR \"milk\"")
        );
        assert_eq!(fts_query("  ?! "), None);
    }

    #[test]
    fn field_names_are_identifiers() {
        assert!(validate_field_name("importance").is_ok());
        assert!(validate_field_name("access_count").is_ok());
        assert!(validate_field_name("").is_err());
        assert!(validate_field_name("a') OR 1=1 --").is_err());
    }

    #[test]
    fn scope_clause_binds_attribute_paths() {
        let filter = DocumentFilter::owner("alice").with_attribute("conversation_id", "c1");
        let scope = Scope::new(Collection::Conversations, &filter, String::new());
        let (sql, params) = scope.clause();
        assert!(sql.contains("json_extract(d.attributes, ?) = ?"));
        assert_eq!(params.len(), 5);
        assert_eq!(params[3], Value::Text("$.conversation_id".to_string()));
    }
}
