use rand::Rng;
use time::{Duration, OffsetDateTime};

pub const CODE_TTL: Duration = Duration::minutes(10);
pub const RESEND_COOLDOWN: Duration = Duration::seconds(60);

/// A freshly generated single-use code and its absolute expiry.
#[derive(Debug, Clone)]
pub struct IssuedCode {
    pub code: String,
    pub expires_at: OffsetDateTime,
}

pub fn issue() -> IssuedCode {
    issue_at(OffsetDateTime::now_utc())
}

pub fn issue_at(now: OffsetDateTime) -> IssuedCode {
    let code: u32 = rand::thread_rng().gen_range(100_000..=999_999);
    IssuedCode {
        code: code.to_string(),
        expires_at: now + CODE_TTL,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeError {
    /// No code on file, or a code without an expiry.
    Missing,
    Mismatch,
    Expired,
}

/// Validates a submitted code against the stored pair. Used identically
/// for email verification and password reset.
pub fn check(
    stored: Option<&str>,
    expires: Option<OffsetDateTime>,
    submitted: &str,
    now: OffsetDateTime,
) -> Result<(), CodeError> {
    // A code without an expiry is treated as no code at all.
    let (code, expires) = match (stored, expires) {
        (Some(c), Some(e)) => (c, e),
        _ => return Err(CodeError::Missing),
    };
    if code != submitted {
        return Err(CodeError::Mismatch);
    }
    if now > expires {
        return Err(CodeError::Expired);
    }
    Ok(())
}

/// Whether a new code may be requested. The cooldown is anchored to the
/// previous code's expiry, not its issue time, so the effective window is
/// issuance + TTL + 60s. Kept as-is pending product confirmation.
pub fn resend_available(previous_expiry: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
    match previous_expiry {
        Some(expiry) => now >= expiry + RESEND_COOLDOWN,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn issued_codes_are_six_digits_in_range() {
        for _ in 0..200 {
            let issued = issue();
            assert_eq!(issued.code.len(), 6);
            let n: u32 = issued.code.parse().expect("numeric code");
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[test]
    fn expiry_is_exactly_ten_minutes_out() {
        let now = datetime!(2026-01-01 12:00:00 UTC);
        let issued = issue_at(now);
        assert_eq!(issued.expires_at, now + Duration::minutes(10));
    }

    #[test]
    fn check_accepts_matching_unexpired_code() {
        let now = datetime!(2026-01-01 12:00:00 UTC);
        let expires = now + Duration::minutes(5);
        assert_eq!(check(Some("123456"), Some(expires), "123456", now), Ok(()));
    }

    #[test]
    fn check_rejects_missing_code() {
        let now = datetime!(2026-01-01 12:00:00 UTC);
        assert_eq!(
            check(None, None, "123456", now),
            Err(CodeError::Missing)
        );
    }

    #[test]
    fn code_without_expiry_counts_as_missing() {
        let now = datetime!(2026-01-01 12:00:00 UTC);
        assert_eq!(
            check(Some("123456"), None, "123456", now),
            Err(CodeError::Missing)
        );
    }

    #[test]
    fn check_rejects_wrong_code() {
        let now = datetime!(2026-01-01 12:00:00 UTC);
        let expires = now + Duration::minutes(5);
        assert_eq!(
            check(Some("123456"), Some(expires), "654321", now),
            Err(CodeError::Mismatch)
        );
    }

    #[test]
    fn one_second_past_expiry_flips_to_expired() {
        let issued_at = datetime!(2026-01-01 12:00:00 UTC);
        let issued = issue_at(issued_at);
        let stored = Some(issued.code.as_str());

        // At the expiry instant the code is still good.
        assert_eq!(
            check(stored, Some(issued.expires_at), &issued.code, issued.expires_at),
            Ok(())
        );
        assert_eq!(
            check(
                stored,
                Some(issued.expires_at),
                &issued.code,
                issued.expires_at + Duration::seconds(1)
            ),
            Err(CodeError::Expired)
        );
    }

    #[test]
    fn resend_blocked_within_cooldown_after_expiry() {
        let expiry = datetime!(2026-01-01 12:10:00 UTC);
        // Still inside the code's TTL.
        assert!(!resend_available(Some(expiry), expiry - Duration::minutes(5)));
        // Expired, but inside the 60s cooldown.
        assert!(!resend_available(Some(expiry), expiry + Duration::seconds(59)));
        assert!(resend_available(Some(expiry), expiry + Duration::seconds(60)));
    }

    #[test]
    fn resend_allowed_when_no_code_outstanding() {
        assert!(resend_available(None, datetime!(2026-01-01 12:00:00 UTC)));
    }
}
