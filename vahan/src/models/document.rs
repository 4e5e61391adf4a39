//! Uploaded document records.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Read-only snapshot of one uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub filename: String,
    #[serde(default)]
    pub uploaded_by: Option<String>,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}

impl DocumentRecord {
    /// Size rendered as kilobytes with two decimals, e.g. `"1.50 KB"`.
    #[allow(clippy::cast_precision_loss)]
    pub fn size_label(&self) -> String {
        format!("{:.2} KB", self.size as f64 / 1024.0)
    }

    /// Upload date rendered as `Mon DD, YYYY`, or `-` when missing.
    pub fn upload_date_label(&self) -> String {
        match self.upload_date.as_deref() {
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|d| d.format("%b %d, %Y").to_string())
                .or_else(|_| {
                    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                        .map(|d| d.format("%b %d, %Y").to_string())
                })
                .unwrap_or_else(|_| raw.to_string()),
            None => "-".to_string(),
        }
    }
}

/// `GET /api/documents` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub documents: Vec<DocumentRecord>,
    #[serde(default)]
    pub total: usize,
}

/// `POST /api/upload` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(size: u64, upload_date: Option<&str>) -> DocumentRecord {
        DocumentRecord {
            filename: "catalog.pdf".to_string(),
            uploaded_by: None,
            upload_date: upload_date.map(String::from),
            url: None,
            size,
        }
    }

    #[test]
    fn test_size_label() {
        assert_eq!(record(1536, None).size_label(), "1.50 KB");
        assert_eq!(record(0, None).size_label(), "0.00 KB");
    }

    #[test]
    fn test_upload_date_label() {
        assert_eq!(record(0, Some("2024-03-05T09:30:00Z")).upload_date_label(), "Mar 05, 2024");
        assert_eq!(record(0, Some("2024-03-05T09:30:00.123456")).upload_date_label(), "Mar 05, 2024");
        assert_eq!(record(0, Some("yesterday")).upload_date_label(), "yesterday");
        assert_eq!(record(0, None).upload_date_label(), "-");
    }
}
