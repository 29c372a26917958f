use crate::auth::reset::RESET_TOKEN_MAX_AGE_SECS;

/// A rendered password reset message, in plain text and HTML.
pub struct ResetEmail {
    pub subject: &'static str,
    pub text: String,
    pub html: String,
}

pub fn password_reset(display_name: &str, reset_url: &str) -> ResetEmail {
    let minutes = RESET_TOKEN_MAX_AGE_SECS / 60;

    let text = format!(
        "Hello {display_name},\n\n\
         To reset your staff portal password, visit the following link:\n\n\
         {reset_url}\n\n\
         The link works once and expires in {minutes} minutes. \
         If you did not make this request, ignore this email and no changes will be made.\n"
    );

    let name = escape(display_name);
    let url = escape(reset_url);
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Password Reset</h2>
    <p>Hello {name},</p>
    <p>A password reset was requested for your staff portal account.</p>
    <p><a href="{url}" style="display: inline-block; padding: 10px 20px; background: #0070f3; color: white; text-decoration: none; border-radius: 4px;">Reset Password</a></p>
    <p style="color: #666; font-size: 14px;">The link works once and expires in {minutes} minutes. If you did not make this request, ignore this email and no changes will be made.</p>
</body>
</html>"#
    );

    ResetEmail {
        subject: "Password Reset - Staff Portal",
        text,
        html,
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
