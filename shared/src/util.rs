/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random (4096 values per ms, collision-free at storefront scale)
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let now = now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
    (ts << 12) | rand_bits
}

/// Derive a human-readable order number from a snowflake id,
/// e.g. `INV-20260806-3F2A9C`.
pub fn order_number(id: i64) -> String {
    let date = chrono::Utc::now().format("%Y%m%d");
    format!("INV-{}-{:06X}", date, (id as u64) & 0xFF_FFFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflake_ids_are_positive_and_safe_integers() {
        for _ in 0..100 {
            let id = snowflake_id();
            assert!(id > 0);
            assert!(id < (1 << 53)); // JS Number.MAX_SAFE_INTEGER
        }
    }

    #[test]
    fn order_number_format() {
        let no = order_number(snowflake_id());
        assert!(no.starts_with("INV-"));
        assert_eq!(no.len(), "INV-20260101-ABCDEF".len());
    }
}
