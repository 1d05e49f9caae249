use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Arguments for one dispatcher call.
///
/// `arg` entries form the open argument set: keys naming a placeholder in
/// the client's service-path template are substituted into the path, and
/// anything left over is rejected before dispatch. Headers and timeout are
/// the transport overrides the call surface supports.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    pub(crate) token: Option<String>,
    pub(crate) data: Option<Value>,
    pub(crate) params: Option<Vec<(String, String)>>,
    pub(crate) headers: HashMap<String, String>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) kwargs: BTreeMap<String, String>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token attached to the call through the auth header.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// JSON body. Defaults to an empty object when never set.
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Query parameter appended to the request url.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.to_string()));
        self
    }

    /// Per-call header; wins over the client's default headers.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Per-call timeout forwarded to the transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Open argument; path-template substitution when the key names a
    /// placeholder.
    pub fn arg(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.kwargs.insert(key.into(), value.to_string());
        self
    }
}
