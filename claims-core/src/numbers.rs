//! Claim number generation.

use chrono::Utc;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        let digit = (value % 36) as usize;
        out.push(BASE36[digit]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Generate a unique claim business key: `CLM-{base36 millisecond
/// timestamp}-{base36 random}`.
pub fn generate_claim_number() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u128;
    let salt: u32 = rand::random();
    format!("CLM-{}-{}", to_base36(millis), to_base36(u128::from(salt)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base36_round_trips_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_000_000), "lfls");
    }

    #[test]
    fn claim_numbers_carry_the_prefix_and_are_unique() {
        let a = generate_claim_number();
        let b = generate_claim_number();
        assert!(a.starts_with("CLM-"));
        assert_eq!(a.split('-').count(), 3);
        assert_ne!(a, b);
    }
}
