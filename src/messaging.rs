//! Message composition: placeholder substitution and pre-filled chat links.
//!
//! Nothing here calls the messaging service; the composed link is handed back
//! to the browser, which opens the external app.

/// Substitute `{{name}}` / `{{phone}}` placeholders in a template body.
/// An empty name falls back to "Customer" so greetings stay readable.
pub fn render_message(template: &str, name: &str, phone: &str) -> String {
    let name = if name.is_empty() { "Customer" } else { name };
    template
        .replace("{{name}}", name)
        .replace("{{phone}}", phone)
}

/// Pre-filled chat link for a recipient: non-digits are stripped from the
/// phone number and the message text is percent-encoded into the query.
/// An empty phone yields a recipient-less link (the app prompts for one).
pub fn whatsapp_link(phone: &str, text: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let encoded = urlencoding::encode(text);
    format!("https://wa.me/{digits}?text={encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn placeholders_are_substituted_everywhere() {
        let rendered = render_message(
            "Hi {{name}}, confirming {{phone}} for {{name}}.",
            "Alice",
            "+91 98765",
        );
        assert_eq!(rendered, "Hi Alice, confirming +91 98765 for Alice.");
    }

    #[test]
    fn empty_name_falls_back_to_customer() {
        assert_eq!(render_message("Hi {{name}}!", "", ""), "Hi Customer!");
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        assert_eq!(render_message("Plain text", "Alice", "1"), "Plain text");
    }

    #[test]
    fn link_strips_non_digits_and_encodes_text() {
        let link = whatsapp_link("+91 98765-43210", "Hi Alice & co");
        assert_eq!(
            link,
            "https://wa.me/919876543210?text=Hi%20Alice%20%26%20co"
        );
    }

    #[test]
    fn empty_phone_yields_recipientless_link() {
        assert_eq!(whatsapp_link("", "hello"), "https://wa.me/?text=hello");
    }
}
