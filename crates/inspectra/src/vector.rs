//! In-memory document store with linear cosine-similarity search.
//!
//! Guarded by an `RwLock` so concurrent readers do not block each other.
//! Injected into the services that need it rather than held as a global.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub score: f32,
    pub source: Option<String>,
}

#[derive(Default)]
pub struct VectorStore {
    documents: RwLock<Vec<StoredDocument>>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, text: String, embedding: Vec<f32>, source: Option<String>) -> String {
        let id = Uuid::new_v4().to_string();
        self.documents.write().push(StoredDocument {
            id: id.clone(),
            text,
            embedding,
            source,
        });
        id
    }

    pub fn get(&self, id: &str) -> Option<StoredDocument> {
        self.documents.read().iter().find(|d| d.id == id).cloned()
    }

    pub fn delete(&self, id: &str) -> bool {
        let mut docs = self.documents.write();
        let before = docs.len();
        docs.retain(|d| d.id != id);
        docs.len() != before
    }

    pub fn count(&self) -> usize {
        self.documents.read().len()
    }

    /// Top-k documents by cosine similarity against the query embedding.
    /// Documents with mismatched dimensions are skipped.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<SearchHit> {
        let docs = self.documents.read();
        let mut hits: Vec<SearchHit> = docs
            .iter()
            .filter_map(|d| {
                cosine_similarity(query, &d.embedding).map(|score| SearchHit {
                    id: d.id.clone(),
                    text: d.text.clone(),
                    score,
                    source: d.source.clone(),
                })
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        hits
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some(dot / (norm_a * norm_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_get_delete_count() {
        let store = VectorStore::new();
        let id = store.add("riser inspection notes".into(), vec![1.0, 0.0], None);
        assert_eq!(store.count(), 1);
        assert_eq!(store.get(&id).unwrap().text, "riser inspection notes");
        assert!(store.delete(&id));
        assert!(!store.delete(&id));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn search_orders_by_similarity() {
        let store = VectorStore::new();
        store.add("exact".into(), vec![1.0, 0.0], None);
        store.add("orthogonal".into(), vec![0.0, 1.0], None);
        store.add("close".into(), vec![0.9, 0.1], None);

        let hits = store.search(&[1.0, 0.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "exact");
        assert_eq!(hits[1].text, "close");
    }

    #[test]
    fn mismatched_dimensions_are_skipped() {
        let store = VectorStore::new();
        store.add("bad".into(), vec![1.0, 0.0, 0.0], None);
        assert!(store.search(&[1.0, 0.0], 5).is_empty());
    }
}
