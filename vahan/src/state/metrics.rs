//! Metrics slice.

use crate::models::{ModelMetrics, SessionMetrics};

#[derive(Debug, Clone, Default)]
pub struct MetricsSlice {
    pub metrics: Option<ModelMetrics>,
    pub session: Option<SessionMetrics>,
    pub loading: bool,
    pub error: Option<String>,
}

impl MetricsSlice {
    pub fn request(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn metrics_success(&mut self, metrics: ModelMetrics) {
        self.metrics = Some(metrics);
        self.loading = false;
    }

    pub fn session_success(&mut self, session: SessionMetrics) {
        self.session = Some(session);
        self.loading = false;
    }

    pub fn failure(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.loading = false;
    }
}
