//! Process settings read from the environment (after `.env` is loaded by the caller).

use crate::config::DEFAULT_BODY_LIMIT;
use crate::error::ConfigError;
use std::net::SocketAddr;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Clone, Debug)]
pub struct ServerSettings {
    pub bind_addr: SocketAddr,
    /// When unset, servers fall back to the in-memory store.
    pub database_url: Option<String>,
    pub body_limit: usize,
}

impl ServerSettings {
    /// Reads `BIND_ADDR`, `DATABASE_URL` and `BODY_LIMIT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.into())
            .parse()
            .map_err(|e| ConfigError::Load(format!("BIND_ADDR: {}", e)))?;
        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());
        let body_limit = match lookup("BODY_LIMIT") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|e| ConfigError::Load(format!("BODY_LIMIT: {}", e)))?,
            None => DEFAULT_BODY_LIMIT,
        };
        Ok(ServerSettings {
            bind_addr,
            database_url,
            body_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let s = ServerSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s.bind_addr.port(), 3000);
        assert!(s.database_url.is_none());
        assert_eq!(s.body_limit, DEFAULT_BODY_LIMIT);
    }

    #[test]
    fn overrides_and_errors() {
        let s = ServerSettings::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://localhost/crud"),
            ("BODY_LIMIT", "2048"),
        ]))
        .unwrap();
        assert_eq!(s.bind_addr.port(), 8080);
        assert_eq!(s.database_url.as_deref(), Some("postgres://localhost/crud"));
        assert_eq!(s.body_limit, 2048);

        let err = ServerSettings::from_lookup(lookup(&[("BODY_LIMIT", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::Load(m) if m.starts_with("BODY_LIMIT")));
    }
}
