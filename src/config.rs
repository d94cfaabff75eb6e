use crate::app::upload::DEFAULT_MAX_UPLOAD_BYTES;

pub const SESSION_TTL_ENV: &str = "EDUPANEL_SESSION_TTL_SECS";
pub const MAX_UPLOAD_BYTES_ENV: &str = "EDUPANEL_MAX_UPLOAD_BYTES";
pub const MAX_BODY_BYTES_ENV: &str = "EDUPANEL_MAX_BODY_BYTES";

pub const DEFAULT_SESSION_TTL_SECS: u32 = 86_400;
/// JSON bodies of the content and auth routes.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;

/// Which [`DocumentStore`](crate::app::document_store::DocumentStore) backs the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreKind {
    /// JSON files under `<data-dir>/collections`.
    #[default]
    Fs,
    /// Process memory; lost on exit.
    Memory,
}

/// Runtime knobs read from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tunables {
    pub session_ttl_secs: u32,
    pub max_upload_bytes: u64,
    pub max_body_bytes: u64,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Tunables {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            session_ttl_secs: parse_var(&lookup, SESSION_TTL_ENV, |v: &u32| {
                (60..=2_592_000).contains(v)
            })
            .unwrap_or(defaults.session_ttl_secs),
            max_upload_bytes: parse_var(&lookup, MAX_UPLOAD_BYTES_ENV, |v: &u64| *v > 0)
                .unwrap_or(defaults.max_upload_bytes),
            max_body_bytes: parse_var(&lookup, MAX_BODY_BYTES_ENV, |v: &u64| *v > 0)
                .unwrap_or(defaults.max_body_bytes),
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    valid: impl Fn(&T) -> bool,
) -> Option<T> {
    let raw = lookup(key)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = raw.parse::<T>().ok().filter(|v| valid(v));
    if parsed.is_none() {
        tracing::warn!(key, value = raw, "ignoring invalid value; using default");
    }
    parsed
}
