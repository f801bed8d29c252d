//! Anonymous nickname generator.
//!
//! Twitch accepts any `justinfan<digits>` nick without a password and
//! gives it read-only access to chat.

use rand::RngExt;

const ANONYMOUS_PREFIX: &str = "justinfan";

/// Generate a random anonymous nickname like `justinfan48213`.
pub fn generate_nickname() -> String {
    let mut rng = rand::rng();
    let num: u32 = rng.random_range(10000..99999);
    format!("{}{}", ANONYMOUS_PREFIX, num)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_nickname() {
        for _ in 0..100 {
            let nick = generate_nickname();
            let digits = nick.strip_prefix("justinfan").unwrap();
            assert_eq!(digits.len(), 5);
            let n: u32 = digits.parse().unwrap();
            assert!((10000..99999).contains(&n));
        }
    }
}
