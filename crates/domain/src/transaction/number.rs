//! Human-readable transaction numbers: `TXN-<base36 millis>-<6 base36 chars>`.

use chrono::{DateTime, Utc};
use common::IdGenerator;

const SUFFIX_LEN: usize = 6;
const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Builds a transaction number from the creation time and a random draw.
///
/// Uniqueness is probabilistic; the store enforces it with a unique index.
pub fn generate(now: DateTime<Utc>, ids: &dyn IdGenerator) -> String {
    let millis = u128::try_from(now.timestamp_millis()).unwrap_or_default();
    let random = ids.next_uuid().as_u128() % 36u128.pow(SUFFIX_LEN as u32);
    format!(
        "TXN-{}-{:0>width$}",
        to_base36(millis),
        to_base36(random),
        width = SUFFIX_LEN
    )
}

fn to_base36(mut n: u128) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{RandomIds, SequentialIds};

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn test_deterministic_format() {
        let at = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let number = generate(at, &SequentialIds::new());
        assert_eq!(number, format!("TXN-{}-000001", to_base36(1_700_000_000_000)));
    }

    #[test]
    fn test_random_numbers_have_expected_shape() {
        let number = generate(Utc::now(), &RandomIds);
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "TXN");
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(
            number
                .chars()
                .all(|c| c == '-' || c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }
}
