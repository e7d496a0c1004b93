//! Text scrubbing applied to generated replies before they are posted.

use std::collections::BTreeSet;

use crate::platform::Message;

/// Deletes author usernames echoed into `text`.
///
/// Every distinct username of the batch is removed as-is, lowercased and
/// uppercased by plain substring deletion, then whitespace runs are collapsed.
/// Other casings ("aLiCe") survive, and a short username also eats matching
/// fragments of unrelated words.
pub fn filter_usernames(text: &str, messages: &[Message]) -> String {
    let usernames: BTreeSet<&str> = messages
        .iter()
        .map(|m| m.author.username.as_str())
        .filter(|name| !name.is_empty())
        .collect();

    // Longest first so "alice" is gone before "al" can split it.
    let mut usernames: Vec<&str> = usernames.into_iter().collect();
    usernames.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut filtered = text.to_string();
    for name in usernames {
        for variant in [name.to_string(), name.to_lowercase(), name.to_uppercase()] {
            filtered = filtered.replace(&variant, "");
        }
    }

    collapse_whitespace(&filtered)
}

/// Masks each sensitive word with one `*` per character.
/// Only the exact casing is masked, once any casing of the word is present.
pub fn redact_sensitive(text: &str, words: &[String]) -> String {
    let mut redacted = text.to_string();
    for word in words.iter().filter(|w| !w.is_empty()) {
        if redacted.to_lowercase().contains(&word.to_lowercase()) {
            redacted = redacted.replace(word.as_str(), &"*".repeat(word.chars().count()));
        }
    }
    redacted
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Author;

    fn msg(id: &str, username: &str) -> Message {
        Message {
            id: id.to_string(),
            content: "hello".to_string(),
            author: Author {
                id: format!("U{id}"),
                username: username.to_string(),
            },
        }
    }

    #[test]
    fn test_removes_all_three_casings() {
        let batch = vec![msg("1", "Alice")];
        let out = filter_usernames("hey Alice, alice and ALICE!", &batch);
        assert_eq!(out, "hey , and !");
        assert!(!out.contains("  "));
    }

    #[test]
    fn test_lowercase_username_removed_from_upper_text() {
        let batch = vec![msg("1", "alice")];
        assert_eq!(filter_usernames("ALICE you there? alice", &batch), "you there?");
    }

    #[test]
    fn test_mixed_casing_survives() {
        let batch = vec![msg("1", "alice")];
        assert_eq!(filter_usernames("hi aLiCe", &batch), "hi aLiCe");
    }

    #[test]
    fn test_every_author_in_batch_is_scrubbed() {
        let batch = vec![msg("2", "alice"), msg("1", "bob"), msg("0", "alice")];
        assert_eq!(
            filter_usernames("alice told bob a joke", &batch),
            "told a joke"
        );
    }

    #[test]
    fn test_substring_deletion_is_not_word_bounded() {
        let batch = vec![msg("1", "al")];
        assert_eq!(filter_usernames("totally normal", &batch), "totly norm");
    }

    #[test]
    fn test_longer_name_removed_before_its_prefix() {
        let batch = vec![msg("1", "al"), msg("2", "alice")];
        assert_eq!(filter_usernames("thanks alice", &batch), "thanks");
    }

    #[test]
    fn test_whitespace_collapsed_even_without_match() {
        let batch = vec![msg("1", "zed")];
        assert_eq!(filter_usernames("  a \n\t b  ", &batch), "a b");
    }

    #[test]
    fn test_empty_usernames_ignored() {
        let batch = vec![msg("1", "")];
        assert_eq!(filter_usernames("nothing to see", &batch), "nothing to see");
    }

    #[test]
    fn test_redact_sensitive_masks_exact_case() {
        let words = vec!["secret".to_string()];
        assert_eq!(redact_sensitive("my secret code", &words), "my ****** code");
        assert_eq!(
            redact_sensitive("Secret and secret", &words),
            "Secret and ******"
        );
        assert_eq!(redact_sensitive("nothing here", &words), "nothing here");
    }

    #[test]
    fn test_redact_counts_characters() {
        let words = vec!["café".to_string()];
        assert_eq!(redact_sensitive("a café", &words), "a ****");
    }
}
