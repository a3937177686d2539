use chrono::{DateTime, FixedOffset, Utc};

use shared_config::{AppConfig, StorageBackend};

pub struct TestConfig {
    pub utc_offset_minutes: i32,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_offset_minutes(minutes: i32) -> Self {
        Self {
            utc_offset_minutes: minutes,
            ..Self::default()
        }
    }

    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).expect("test offset within a day")
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            storage_backend: StorageBackend::Memory,
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            clinic_utc_offset: self.offset(),
            ..AppConfig::default()
        }
    }
}

/// Parses an RFC 3339 literal for test fixtures.
pub fn instant(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("valid RFC 3339 fixture")
        .with_timezone(&Utc)
}
