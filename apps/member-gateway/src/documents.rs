//! In-memory document repository for the demo document endpoints.

use dashmap::DashMap;
use gateway_security::ResourceAttributes;
use serde::Serialize;

use crate::config::DocumentSeed;

/// A stored document plus its ABAC-facing attributes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(flatten)]
    pub attributes: ResourceAttributes,
}

#[derive(Debug, Default)]
pub struct DocumentRepo {
    documents: DashMap<String, Document>,
}

impl DocumentRepo {
    #[must_use]
    pub fn from_seeds(seeds: Vec<DocumentSeed>) -> Self {
        let repo = Self::default();
        for seed in seeds {
            repo.documents.insert(
                seed.id.clone(),
                Document {
                    id: seed.id,
                    title: seed.title,
                    content: seed.content,
                    attributes: ResourceAttributes {
                        resource_type: seed.resource_type,
                        owner_id: seed.owner_id,
                        sensitivity: seed.sensitivity,
                        partner_id: seed.partner_id,
                    },
                },
            );
        }
        repo
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Document> {
        self.documents.get(id).map(|d| d.clone())
    }

    /// Replace title and content, keeping attributes. Returns the updated
    /// document, or `None` when it does not exist.
    #[must_use]
    pub fn update_content(&self, id: &str, title: String, content: String) -> Option<Document> {
        let mut entry = self.documents.get_mut(id)?;
        entry.title = title;
        entry.content = content;
        Some(entry.clone())
    }
}
