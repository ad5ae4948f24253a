//! Opaque session token generation

use uuid::Uuid;

/// Generate an opaque session token.
///
/// A random UUIDv4 (122 bits of entropy from the OS generator) plus a
/// base-36 millisecond timestamp suffix for informational uniqueness. The
/// token is only ever compared against the session store, never decoded.
pub fn generate() -> String {
    let uuid = Uuid::new_v4().simple();
    let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
    format!("{}{}", uuid, to_base36(millis))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 digits are ASCII")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate();
        // 32 hex chars from the uuid plus a non-empty timestamp suffix
        assert!(token.len() > 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_000_000), "lfls");
    }

    #[test]
    fn test_token_uniqueness() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(generate()));
        }
    }
}
