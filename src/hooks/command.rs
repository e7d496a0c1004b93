/// Splits `content` into a lowercased command and its arguments when it starts with `prefix`.
/// Returns `(None, content)` otherwise.
pub fn extract_command<'a>(content: &'a str, prefix: &str) -> (Option<String>, &'a str) {
    let Some(rest) = content.strip_prefix(prefix) else {
        return (None, content);
    };

    let rest = rest.trim_start();
    match rest.find(char::is_whitespace) {
        Some(pos) => (
            Some(rest[..pos].to_lowercase()),
            rest[pos..].trim_start(),
        ),
        None => (Some(rest.to_lowercase()), ""),
    }
}
