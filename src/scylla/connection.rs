use crate::{Error, Result};
use scylla::{
    client::{
        caching_session::{CachingSession, CachingSessionBuilder},
        session::Session,
        session_builder::SessionBuilder,
    },
    frame::Compression,
};
use std::time::Duration;

const DEFAULT_PORT: u16 = 9042;

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            uri: format!("127.0.0.1:{DEFAULT_PORT}"),
            username: None,
            password: None,
            caching_capacity: 1000,
            connection_timeout: Duration::from_secs(3),
            compression: None,
            fetch_keyspaces: vec![],
        }
    }
}

/// Endpoint and session settings.
///
/// Credentials are passed to the driver as-is; an empty username means no
/// authentication.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    pub uri: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub connection_timeout: Duration,
    pub caching_capacity: usize,
    pub compression: Option<Compression>,
    pub fetch_keyspaces: Vec<String>,
}

impl ConnectionParams {
    /// Params for `host` with credentials. The default port is added when
    /// `host` has none.
    pub fn new(host: &str, username: &str, password: &str) -> Self {
        let uri = if host.contains(':') {
            host.to_string()
        } else {
            format!("{host}:{DEFAULT_PORT}")
        };

        Self {
            uri,
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            ..Default::default()
        }
    }

    /// Fails with `Error::Connection` when the uri names no host.
    pub fn check_endpoint(&self) -> Result<()> {
        let uri = self.uri.trim();
        if uri.is_empty() || uri.starts_with(':') {
            return Err(Error::Connection("endpoint address is empty".to_string()));
        }

        Ok(())
    }

    pub async fn build(&self) -> Result<Session> {
        self.check_endpoint()?;

        let mut builder = SessionBuilder::new()
            .known_node(&self.uri)
            .connection_timeout(self.connection_timeout)
            .keyspaces_to_fetch(&self.fetch_keyspaces)
            .compression(self.compression);

        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            builder = builder.user(username, self.password.as_deref().unwrap_or_default());
        }

        Ok(builder.build().await?)
    }

    pub async fn caching(&self) -> Result<CachingSession> {
        let session = self.build().await?;

        let caching = CachingSessionBuilder::new(session)
            .max_capacity(self.caching_capacity)
            .build();

        Ok(caching)
    }
}
