//! Document upload, listing and deletion.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::Method;

use super::client::{Auth, ApiClient};
use crate::error::ApiError;
use crate::models::{DocumentList, UploadReceipt};

/// File types the backend can parse.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt"];

/// Check a local file before upload. Returns the file name to send.
pub fn validate_upload(path: &Path) -> Result<String, ApiError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ApiError::Validation(format!("Not a file: {}", path.display())))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ApiError::Validation(format!(
            "Unsupported file type for {file_name}; accepted: .{}",
            ACCEPTED_EXTENSIONS.join(", .")
        )));
    }

    if !path.is_file() {
        return Err(ApiError::Validation(format!("Not a file: {}", path.display())));
    }

    Ok(file_name.to_string())
}

fn mime_for(file_name: &str) -> &'static str {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".docx") {
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    } else if lower.ends_with(".doc") {
        "application/msword"
    } else {
        "text/plain"
    }
}

impl ApiClient {
    /// `POST /api/upload` as multipart field `file`.
    pub async fn upload_document(&self, path: &Path) -> Result<UploadReceipt, ApiError> {
        let file_name = validate_upload(path)?;
        // Check the token before reading a potentially large file.
        let request = self.request(Method::POST, "upload", Auth::Bearer)?;

        let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::File {
            path: path.to_path_buf(),
            source,
        })?;
        let part = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(mime_for(&file_name))?;
        let request = request.multipart(Form::new().part("file", part));

        let response = self
            .send(request, Auth::Bearer, "Failed to create document")
            .await?;
        Ok(response.json().await?)
    }

    /// `GET /api/documents`.
    pub async fn list_documents(&self) -> Result<DocumentList, ApiError> {
        let request = self.request(Method::GET, "documents", Auth::Bearer)?;
        let response = self
            .send(request, Auth::Bearer, "Failed to fetch documents")
            .await?;
        Ok(response.json().await?)
    }

    /// `DELETE /api/documents/{filename}`.
    pub async fn delete_document(&self, filename: &str) -> Result<(), ApiError> {
        let path = format!("documents/{}", urlencoding::encode(filename));
        let request = self.request(Method::DELETE, &path, Auth::Bearer)?;
        self.send(request, Auth::Bearer, "Failed to delete document")
            .await?;
        Ok(())
    }
}
