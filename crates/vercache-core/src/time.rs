use time::OffsetDateTime;

/// The current UTC time.
#[must_use]
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}
