//! HTML bodies for the code-carrying emails.

pub fn verification(code: &str) -> (&'static str, String) {
    let body = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333;">Welcome to ProfileHub!</h2>
  <p>To finish registration, please confirm your email address.</p>
  <p>Your verification code: <strong style="font-size: 24px; color: #007bff;">{code}</strong></p>
  <p>The code is valid for 10 minutes.</p>
  <hr style="border: none; border-top: 1px solid #eee; margin: 20px 0;">
  <p style="color: #666; font-size: 12px;">Best regards,<br>The ProfileHub team</p>
</div>"#
    );
    ("Confirm your email", body)
}

pub fn new_verification_code(code: &str) -> (&'static str, String) {
    let body = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333;">New verification code</h2>
  <p>Your new verification code: <strong style="font-size: 24px; color: #007bff;">{code}</strong></p>
  <p>The code is valid for 10 minutes.</p>
  <p>If you did not sign up for our service, please ignore this email.</p>
  <hr style="border: none; border-top: 1px solid #eee; margin: 20px 0;">
  <p style="color: #666; font-size: 12px;">Best regards,<br>The ProfileHub team</p>
</div>"#
    );
    ("New email verification code", body)
}

pub fn password_reset(code: &str) -> (&'static str, String) {
    let body = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333;">Password recovery</h2>
  <p>Use the following code to reset your password:</p>
  <p style="text-align: center; margin: 30px 0;">
    <strong style="font-size: 24px; color: #007bff; letter-spacing: 2px;">{code}</strong>
  </p>
  <p>The code is valid for 10 minutes.</p>
  <p style="color: #ff0000; font-size: 14px;">If you did not request a password reset, please ignore this email.</p>
  <hr style="border: none; border-top: 1px solid #eee; margin: 20px 0;">
  <p style="color: #666; font-size: 12px;">Best regards,<br>The ProfileHub team</p>
</div>"#
    );
    ("Password recovery", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_carries_the_code() {
        for (_, body) in [
            verification("123456"),
            new_verification_code("123456"),
            password_reset("123456"),
        ] {
            assert!(body.contains("123456"));
            assert!(body.contains("10 minutes"));
        }
    }
}
