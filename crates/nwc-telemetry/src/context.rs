//! Request context for correlating one authorization request across crates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation data carried through a single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Unique request identifier.
    pub request_id: Uuid,
    /// Hex public key of the connection the request acts for.
    pub connection: Option<String>,
    /// Capability being exercised.
    pub operation: Option<String>,
    /// Component that created this context.
    pub source: String,
    /// When the request started.
    pub started_at: DateTime<Utc>,
    /// Additional metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl RequestContext {
    /// Create a new request context.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            connection: None,
            operation: None,
            source: source.into(),
            started_at: Utc::now(),
            metadata: BTreeMap::new(),
        }
    }

    /// Set the connection public key.
    #[must_use]
    pub fn with_connection(mut self, pubkey_hex: impl Into<String>) -> Self {
        self.connection = Some(pubkey_hex.into());
        self
    }

    /// Set the operation name.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Add metadata, reported when the request completes.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Milliseconds since the request started.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_milliseconds()
    }

    /// Create a tracing span with this context.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "request",
            request_id = %self.short_id(),
            source = %self.source,
            connection = self.connection.as_deref(),
            operation = self.operation.as_deref(),
        )
    }

    /// First eight hex digits of the request id.
    #[must_use]
    pub fn short_id(&self) -> String {
        self.request_id.simple().to_string().chars().take(8).collect()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new("unknown")
    }
}

/// Guard that keeps the request span entered and logs completion on drop.
pub struct RequestGuard {
    context: RequestContext,
    _span: tracing::span::EnteredSpan,
}

impl RequestGuard {
    /// Enter the context's span.
    #[must_use]
    pub fn new(context: RequestContext) -> Self {
        let span = context.span().entered();
        tracing::debug!("Request started");
        Self {
            context,
            _span: span,
        }
    }

    /// Get the request context.
    #[must_use]
    pub fn context(&self) -> &RequestContext {
        &self.context
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        tracing::debug!(
            elapsed_ms = self.context.elapsed_ms(),
            metadata = ?self.context.metadata,
            "Request completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_context_creation() {
        let ctx = RequestContext::new("test");
        assert_eq!(ctx.source, "test");
        assert!(ctx.connection.is_none());
        assert!(ctx.metadata.is_empty());
        assert_ne!(ctx.request_id, RequestContext::new("test").request_id);
    }

    #[test]
    fn test_builders_fill_fields() {
        let ctx = RequestContext::new("nwcctl")
            .with_connection("ab".repeat(32))
            .with_operation("pay_invoice")
            .with_metadata("amount_msats", "1000")
            .with_metadata("amount_msats", "2000");

        assert_eq!(ctx.connection.as_deref(), Some("ab".repeat(32).as_str()));
        assert_eq!(ctx.operation.as_deref(), Some("pay_invoice"));
        assert_eq!(ctx.metadata.len(), 1);
        assert_eq!(ctx.metadata.get("amount_msats").map(String::as_str), Some("2000"));
    }

    #[test]
    fn test_short_id() {
        let ctx = RequestContext::new("test");
        let short = ctx.short_id();
        assert_eq!(short.len(), 8);
        assert!(ctx.request_id.simple().to_string().starts_with(&short));
    }

    #[test]
    fn test_elapsed_is_non_negative() {
        let ctx = RequestContext::new("test");
        assert!(ctx.elapsed_ms() >= 0);
    }

    #[test]
    fn test_guard_exposes_context() {
        let guard = RequestGuard::new(RequestContext::new("test").with_operation("pay_invoice"));
        assert_eq!(guard.context().operation.as_deref(), Some("pay_invoice"));
    }

    #[test]
    fn test_serialization() {
        let ctx = RequestContext::new("test").with_operation("get_balance");
        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.contains("\"operation\":\"get_balance\""));
        let parsed: RequestContext = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.request_id, ctx.request_id);
    }
}
