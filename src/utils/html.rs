use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Exam descriptions, instructions, question prompts and explanations are
/// authored by admins and rendered in both portals. Whitelist-based
/// sanitization keeps safe markup (like <b>, <p>) while stripping
/// dangerous tags (like <script>, <iframe>) and event-handler attributes.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Sanitize an optional rich-text field, preserving absence.
pub fn clean_opt(input: Option<String>) -> Option<String> {
    input.map(|s| clean_html(&s))
}
