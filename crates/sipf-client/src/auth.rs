use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{ClientError, Result};

/// Basic-Auth identity for the SIPF endpoints.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user: String,
    password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// `Basic <base64(user:password)>`.
    pub fn authorization_header(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.user, self.password));
        format!("Basic {token}")
    }

    /// Parse a session-key response body: `USER\nPASSWORD\n`.
    pub fn parse_session_key(body: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(body)
            .map_err(|_| ClientError::InvalidResponse("session key is not UTF-8".into()))?;
        let mut lines = text.split('\n').map(|line| line.trim_end_matches('\r'));

        let user = lines.next().unwrap_or_default();
        let password = lines
            .next()
            .ok_or_else(|| ClientError::InvalidResponse("session key has no password line".into()))?;
        if user.is_empty() {
            return Err(ClientError::InvalidResponse("session key has no user".into()));
        }
        Ok(Self::new(user, password))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}
