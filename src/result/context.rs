//! Caller-supplied request context
//!
//! The token is opaque to the router and is handed back unchanged to every
//! completion listener of the request it was submitted with.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

/// Opaque per-request context with a correlation id for log lines.
#[derive(Clone)]
pub struct RequestContext {
    token: Option<Arc<dyn Any + Send + Sync>>,
    request_id: Uuid,
}

impl RequestContext {
    /// Context carrying a caller token.
    pub fn new<T: Any + Send + Sync>(token: T) -> Self {
        Self {
            token: Some(Arc::new(token)),
            request_id: Uuid::new_v4(),
        }
    }

    /// Context without a token.
    pub fn empty() -> Self {
        Self {
            token: None,
            request_id: Uuid::new_v4(),
        }
    }

    /// Borrow the token if it is a `T`.
    pub fn token<T: Any>(&self) -> Option<&T> {
        self.token.as_deref().and_then(|t| t.downcast_ref::<T>())
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Whether both contexts carry the very same token allocation.
    pub fn same_token(&self, other: &RequestContext) -> bool {
        match (&self.token, &other.token) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}
