use chrono::{DateTime, TimeZone, Utc};

/// Custom epoch: 2024-01-01T00:00:00Z
const LANYARD_EPOCH: u64 = 1_704_067_200_000;

/// Extract the Unix timestamp (ms) from a snowflake.
/// Format: 42 bits timestamp | 10 bits worker | 12 bits sequence
pub fn timestamp_millis(id: i64) -> u64 {
    ((id as u64) >> 22) + LANYARD_EPOCH
}

/// Creation time of the entity identified by a snowflake.
pub fn created_at(id: i64) -> DateTime<Utc> {
    let millis = timestamp_millis(id);
    Utc.timestamp_millis_opt(millis as i64)
        .single()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_snowflake_maps_to_epoch() {
        assert_eq!(timestamp_millis(0), LANYARD_EPOCH);
        assert_eq!(created_at(0).timestamp_millis() as u64, LANYARD_EPOCH);
    }

    #[test]
    fn timestamp_bits_shift_out() {
        let one_second_in = 1000u64 << 22;
        assert_eq!(timestamp_millis(one_second_in as i64), LANYARD_EPOCH + 1000);
    }
}
