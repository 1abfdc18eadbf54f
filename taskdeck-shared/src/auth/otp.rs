/// One-time password generation
///
/// OTPs are 6 uniform random decimal digits, stored on the user row and
/// emailed out of band. Each issuance overwrites the previous code; a code
/// expires [`OTP_TTL_MINUTES`] after issuance and is cleared on first
/// successful verification, so it cannot be replayed.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Number of digits in a generated OTP
pub const OTP_LENGTH: usize = 6;

/// How long an issued OTP stays valid, in minutes
pub const OTP_TTL_MINUTES: i64 = 10;

/// Generates a fresh 6-digit OTP
///
/// Digits are drawn uniformly, so leading zeros are as likely as any other
/// digit — the code is a string, never a number.
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::otp::{generate, OTP_LENGTH};
///
/// let code = generate();
/// assert_eq!(code.len(), OTP_LENGTH);
/// assert!(code.chars().all(|c| c.is_ascii_digit()));
/// ```
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10)))
        .collect()
}

/// Expiry timestamp for an OTP issued now
pub fn expiry_from_now() -> DateTime<Utc> {
    Utc::now() + Duration::minutes(OTP_TTL_MINUTES)
}

/// Whether a stored OTP is still within its validity window
pub fn is_live(expires_at: Option<DateTime<Utc>>) -> bool {
    match expires_at {
        Some(expires_at) => Utc::now() < expires_at,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_six_digits() {
        for _ in 0..100 {
            let code = generate();
            assert_eq!(code.len(), OTP_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_generate_varies() {
        let codes: std::collections::HashSet<String> = (0..50).map(|_| generate()).collect();
        // 50 draws from a million-code space colliding down to 1 would mean
        // a broken generator.
        assert!(codes.len() > 1);
    }

    #[test]
    fn test_expiry_is_in_the_future() {
        let expiry = expiry_from_now();
        assert!(expiry > Utc::now());
        assert!(is_live(Some(expiry)));
    }

    #[test]
    fn test_expired_code_is_not_live() {
        let past = Utc::now() - Duration::minutes(1);
        assert!(!is_live(Some(past)));
    }

    #[test]
    fn test_missing_expiry_is_not_live() {
        assert!(!is_live(None));
    }
}
