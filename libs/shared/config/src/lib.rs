use std::env;
use std::net::SocketAddr;

use chrono::{FixedOffset, Offset, Utc};
use tracing::warn;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_QUEUE_NUMBER_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_AVERAGE_CONSULTATION_MINUTES: i64 = 15;

/// Where entity records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Supabase,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Offset of the clinic's wall clock from UTC. Day windows for the
    /// walk-in queue and "today's" appointments are computed in this zone.
    pub clinic_utc_offset: FixedOffset,
    pub queue_number_max_attempts: u32,
    pub average_consultation_minutes: i64,
    pub bind_address: SocketAddr,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::Memory,
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            clinic_utc_offset: utc(),
            queue_number_max_attempts: DEFAULT_QUEUE_NUMBER_MAX_ATTEMPTS,
            average_consultation_minutes: DEFAULT_AVERAGE_CONSULTATION_MINUTES,
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Unset or
    /// unparsable values fall back to defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_backend = match lookup("STORAGE_BACKEND").as_deref() {
            Some("supabase") => StorageBackend::Supabase,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                warn!("Unknown STORAGE_BACKEND '{}', using in-memory storage", other);
                StorageBackend::Memory
            }
            None => {
                warn!("STORAGE_BACKEND not set, using in-memory storage");
                StorageBackend::Memory
            }
        };

        let config = Self {
            storage_backend,
            supabase_url: lookup("SUPABASE_URL").unwrap_or_else(|| {
                warn!("SUPABASE_URL not set, using empty value");
                String::new()
            }),
            supabase_anon_key: lookup("SUPABASE_ANON_PUBLIC_KEY").unwrap_or_else(|| {
                warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                String::new()
            }),
            clinic_utc_offset: lookup("CLINIC_UTC_OFFSET_MINUTES")
                .and_then(|raw| parse_offset_minutes(&raw))
                .unwrap_or_else(|| {
                    warn!("CLINIC_UTC_OFFSET_MINUTES not set or invalid, using UTC");
                    utc()
                }),
            queue_number_max_attempts: lookup("QUEUE_NUMBER_MAX_ATTEMPTS")
                .and_then(|raw| raw.trim().parse::<u32>().ok())
                .filter(|attempts| *attempts > 0)
                .unwrap_or(DEFAULT_QUEUE_NUMBER_MAX_ATTEMPTS),
            average_consultation_minutes: lookup("AVERAGE_CONSULTATION_MINUTES")
                .and_then(|raw| raw.trim().parse::<i64>().ok())
                .filter(|minutes| *minutes >= 0)
                .unwrap_or(DEFAULT_AVERAGE_CONSULTATION_MINUTES),
            bind_address: lookup("BIND_ADDRESS")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or_else(|| {
                    warn!("BIND_ADDRESS not set or invalid, using {}", DEFAULT_BIND_ADDRESS);
                    SocketAddr::from(([0, 0, 0, 0], 3000))
                }),
        };

        if config.storage_backend == StorageBackend::Supabase && !config.is_supabase_configured() {
            warn!("Supabase storage selected but SUPABASE_URL / SUPABASE_ANON_PUBLIC_KEY are missing");
        }

        config
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// Parses a signed minute count such as `120` or `-330` into a fixed offset.
pub fn parse_offset_minutes(raw: &str) -> Option<FixedOffset> {
    let minutes: i32 = raw.trim().parse().ok()?;
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}
