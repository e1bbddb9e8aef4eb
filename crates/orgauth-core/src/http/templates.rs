//! Server-rendered HTML for the browser-facing endpoints.

const STYLES: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }

body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    background: #f4f5f9;
    min-height: 100vh;
    display: flex;
    justify-content: center;
    align-items: center;
    color: #1c1f40;
}

.card {
    width: 100%;
    max-width: 380px;
    background: #ffffff;
    border: 1px solid #e3e5ee;
    border-radius: 12px;
    padding: 1.5rem;
}

.card-title { font-size: 1.25rem; font-weight: 600; margin-bottom: 1rem; }
.form-group { margin-bottom: 1rem; }
.form-label { display: block; font-size: 0.875rem; margin-bottom: 0.25rem; }

.form-input {
    width: 100%;
    padding: 0.625rem 0.75rem;
    border: 1px solid #d0d3e0;
    border-radius: 6px;
    font-size: 0.875rem;
}

.btn {
    width: 100%;
    padding: 0.625rem;
    border: none;
    border-radius: 6px;
    background: #3b3fe3;
    color: #ffffff;
    font-size: 0.875rem;
    cursor: pointer;
}
"#;

fn html_page(title: &str, content: &str, head_extra: &str) -> String {
    let mut html = String::with_capacity(content.len() + 1600);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("    <meta charset=\"UTF-8\">\n");
    html.push_str(
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html.push_str("    <title>");
    html.push_str(&html_escape(title));
    html.push_str("</title>\n");
    html.push_str(head_extra);
    html.push_str("    <style>");
    html.push_str(STYLES);
    html.push_str("</style>\n</head>\n<body>\n");
    html.push_str(content);
    html.push_str("\n</body>\n</html>");
    html
}

/// Renders the login form.
///
/// The form posts back to the same URL, carrying the flow handle in a
/// hidden field.
pub fn render_login_form(organization: &str, session_data_key: &str) -> String {
    let mut content = String::with_capacity(1024);

    content.push_str("<div class=\"card\">\n");
    content.push_str("<div class=\"card-title\">Sign in to ");
    content.push_str(&html_escape(organization));
    content.push_str("</div>\n\n");

    content.push_str("<form method=\"POST\">\n");
    content.push_str("<input type=\"hidden\" name=\"session_data_key\" value=\"");
    content.push_str(&html_escape(session_data_key));
    content.push_str("\">\n\n");

    content.push_str("<div class=\"form-group\">\n");
    content.push_str("<label class=\"form-label\" for=\"username\">Username</label>\n");
    content
        .push_str("<input type=\"text\" id=\"username\" name=\"username\" class=\"form-input\" ");
    content.push_str("required autocomplete=\"username\">\n");
    content.push_str("</div>\n\n");

    content.push_str("<div class=\"form-group\">\n");
    content.push_str("<label class=\"form-label\" for=\"password\">Password</label>\n");
    content.push_str(
        "<input type=\"password\" id=\"password\" name=\"password\" class=\"form-input\" ",
    );
    content.push_str("required autocomplete=\"current-password\">\n");
    content.push_str("</div>\n\n");

    content.push_str("<button type=\"submit\" class=\"btn\">Sign in</button>\n");
    content.push_str("</form>\n</div>");

    html_page("Sign in", &content, "")
}

/// Renders a page that sends the browser to `target`.
///
/// Uses a script redirect with a meta refresh and a plain link as
/// fallbacks.
pub fn render_redirect_page(target: &str) -> String {
    // serde_json produces a quoted, escaped JS string literal. `</` is split
    // so the value cannot close the script element.
    let js_target = serde_json::Value::String(target.to_string())
        .to_string()
        .replace("</", "<\\/");
    let escaped = html_escape(target);

    let mut head = String::with_capacity(escaped.len() + 64);
    head.push_str("    <meta http-equiv=\"refresh\" content=\"0;url=");
    head.push_str(&escaped);
    head.push_str("\">\n");

    let mut content = String::with_capacity(escaped.len() * 2 + 256);
    content.push_str("<div class=\"card\">\n");
    content.push_str("<div class=\"card-title\">Redirecting</div>\n");
    content.push_str("<p><a href=\"");
    content.push_str(&escaped);
    content.push_str("\">Continue</a></p>\n</div>\n");
    content.push_str("<script>window.location.replace(");
    content.push_str(&js_target);
    content.push_str(");</script>");

    html_page("Redirecting", &content, &head)
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_form_carries_session_data_key() {
        let html = render_login_form("acme", "key-123");
        assert!(html.contains("name=\"session_data_key\" value=\"key-123\""));
        assert!(html.contains("Sign in to acme"));
        assert!(html.contains("method=\"POST\""));
    }

    #[test]
    fn test_login_form_escapes_input() {
        let html = render_login_form("acme", "\"><script>");
        assert!(!html.contains("\"><script>"));
        assert!(html.contains("&quot;&gt;&lt;script&gt;"));
    }

    #[test]
    fn test_redirect_page() {
        let html = render_redirect_page("https://app/cb?code=abc&state=xyz");
        assert!(html.contains("window.location.replace(\"https://app/cb?code=abc&state=xyz\")"));
        assert!(html.contains("href=\"https://app/cb?code=abc&amp;state=xyz\""));
        assert!(html.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn test_redirect_page_cannot_break_out_of_script() {
        let html = render_redirect_page("https://app/cb?x=</script><script>alert(1)");
        assert!(!html.contains("</script><script>alert"));
    }
}
