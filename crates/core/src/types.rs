/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Milliseconds since the Unix epoch, the unit the cache envelope stores.
pub fn epoch_millis(at: Timestamp) -> i64 {
    at.timestamp_millis()
}
