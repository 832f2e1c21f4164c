//! A worker's identity and outbound proxy settings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One record of the profiles file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerProfile {
    pub api_key: String,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_password: Option<String>,
}

impl WorkerProfile {
    pub fn new(api_key: impl Into<String>) -> Self {
        WorkerProfile {
            api_key: api_key.into(),
            proxy: None,
            proxy_username: None,
            proxy_password: None,
        }
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.proxy_username = Some(username.into());
        self.proxy_password = Some(password.into());
        self
    }

    /// Proxy URL with `username:password@` inserted after the scheme when
    /// both credentials are set. `None` without a proxy (or an empty one).
    pub fn proxy_url(&self) -> Option<String> {
        let proxy = self.proxy.as_deref().filter(|p| !p.is_empty())?;
        match (&self.proxy_username, &self.proxy_password) {
            (Some(user), Some(pass)) => {
                let auth = format!("{}:{}@", user, pass);
                Some(proxy.replacen("://", &format!("://{}", auth), 1))
            }
            _ => Some(proxy.to_string()),
        }
    }

    /// Scheme-to-URL map for HTTP clients: the same proxy for `http` and `https`.
    pub fn proxy_map(&self) -> Option<HashMap<&'static str, String>> {
        let url = self.proxy_url()?;
        let mut map = HashMap::new();
        map.insert("http", url.clone());
        map.insert("https", url);
        Some(map)
    }
}

impl fmt::Debug for WorkerProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerProfile")
            .field("api_key", &"<redacted>")
            .field("proxy", &self.proxy)
            .field("proxy_username", &self.proxy_username)
            .field(
                "proxy_password",
                &self.proxy_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
