//! Document slice: uploaded file list and CRUD status.

use crate::models::{DocumentRecord, UploadReceipt};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSlice {
    pub documents: Vec<DocumentRecord>,
    pub last_upload: Option<UploadReceipt>,
    pub loading: bool,
    pub error: Option<String>,
}

impl DocumentSlice {
    pub fn request(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn create_success(&mut self, receipt: UploadReceipt) {
        self.last_upload = Some(receipt);
        self.loading = false;
    }

    pub fn list_success(&mut self, documents: Vec<DocumentRecord>) {
        self.documents = documents;
        self.loading = false;
    }

    pub fn delete_success(&mut self, filename: &str) {
        self.documents.retain(|d| d.filename != filename);
        self.loading = false;
    }

    pub fn failure(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.loading = false;
    }

    /// Reset after an authorization failure.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
