use std::sync::Arc;

use validator::Validate;

use super::{Guard, fetch, remove};
use crate::access::Caller;
use crate::clock::Clock;
use crate::error::ServiceResult;
use crate::model::document::{Document, DocumentFilter, DocumentUpdate, NewDocument};
use crate::store::{Page, PageRequest, SharedStore, find_page};

/// Employee documents; files themselves live elsewhere, only the link is kept.
#[derive(Clone)]
pub struct DocumentService {
    documents: SharedStore<Document>,
    guard: Guard,
    clock: Arc<dyn Clock>,
}

impl DocumentService {
    pub fn new(documents: SharedStore<Document>, guard: Guard, clock: Arc<dyn Clock>) -> Self {
        Self {
            documents,
            guard,
            clock,
        }
    }

    /// The document belongs to `req.owner_id`, or to the uploader when absent.
    pub async fn create_document(&self, uploader_id: u64, req: NewDocument) -> ServiceResult<Document> {
        req.validate()?;
        let owner_id = req.owner_id.unwrap_or(uploader_id);
        self.guard.owner(owner_id).await?;

        let now = self.clock.now();
        let document = self
            .documents
            .save(Document {
                id: 0,
                owner_id,
                title: req.title,
                category: req.category,
                description: req.description,
                file_url: req.file_url,
                created_at: now,
                updated_at: now,
            })
            .await?;
        tracing::info!(id = document.id, owner_id, "Document created");
        Ok(document)
    }

    pub async fn get_document(&self, id: u64) -> ServiceResult<Document> {
        fetch(self.documents.as_ref(), id).await
    }

    pub async fn update_document(&self, id: u64, update: DocumentUpdate) -> ServiceResult<Document> {
        update.validate()?;
        let mut document = self.get_document(id).await?;
        if let Some(title) = update.title {
            document.title = title;
        }
        if let Some(category) = update.category {
            document.category = category;
        }
        if update.description.is_some() {
            document.description = update.description;
        }
        if let Some(url) = update.file_url {
            document.file_url = url;
        }
        document.updated_at = self.clock.now();
        Ok(self.documents.save(document).await?)
    }

    pub async fn delete_document(&self, id: u64) -> ServiceResult<()> {
        remove(self.documents.as_ref(), id).await?;
        tracing::info!(id, "Document deleted");
        Ok(())
    }

    pub async fn list_documents(&self, filter: &DocumentFilter, page: PageRequest) -> ServiceResult<Page<Document>> {
        Ok(find_page(self.documents.as_ref(), filter, page).await?)
    }

    pub async fn search_documents(&self, term: &str, page: PageRequest) -> ServiceResult<Page<Document>> {
        let filter = DocumentFilter {
            search: Some(term.to_string()),
            ..Default::default()
        };
        self.list_documents(&filter, page).await
    }

    pub async fn count_documents(&self, filter: &DocumentFilter) -> ServiceResult<u64> {
        Ok(self.documents.count(filter).await?)
    }

    pub async fn is_owner(&self, id: u64, caller: &Caller) -> ServiceResult<bool> {
        let document = self.get_document(id).await?;
        self.guard.is_owner(caller, document.owner_id).await
    }
}
