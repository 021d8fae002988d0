use std::sync::{Arc, RwLock};

/// Source of the bearer token sent with every LISTEN
///
/// Refreshing is the provider's job; the client only ever reads the current value.
pub trait TokenSource: Send + Sync + 'static {
    fn current_token(&self) -> String;
}

/// Token that never changes
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenSource for StaticToken {
    fn current_token(&self) -> String {
        self.0.clone()
    }
}

/// Token storage shared with whatever refreshes it
#[derive(Debug, Clone, Default)]
pub struct SharedToken {
    token: Arc<RwLock<String>>,
}

impl SharedToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(token.into())),
        }
    }

    /// Replace the stored token, e.g. after an OAuth refresh
    pub fn set(&self, token: impl Into<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = token.into();
    }
}

impl TokenSource for SharedToken {
    fn current_token(&self) -> String {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
