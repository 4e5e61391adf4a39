//! Data models shared by the API client, the state slices and the chat lifecycle.

mod auth;
mod document;
mod message;
mod metrics;
mod session;

pub use auth::{Credentials, LoginResponse, SignupDetails};
pub use document::{DocumentList, DocumentRecord, UploadReceipt};
pub use message::{Message, Sender};
pub use metrics::{LatencyPoint, ModelMetrics, SessionMetrics, SessionSummary};
pub use session::{Session, SessionId};
