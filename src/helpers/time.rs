use chrono::{SecondsFormat, Utc};
use tokio::time::Instant;

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn get_instant() -> Instant {
    Instant::now()
}
