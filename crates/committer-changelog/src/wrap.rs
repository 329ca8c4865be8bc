/// Greedily wrap `text` at `width` columns without splitting words.
///
/// Runs of whitespace collapse to a single space. A word longer than
/// `width` sits alone on its own line.
///
/// # Examples
///
/// ```
/// use committer_changelog::wrap::wrap_words;
///
/// assert_eq!(wrap_words("Remove foo, bar, and baz.", 12), "Remove foo,\nbar, and\nbaz.");
/// ```
pub fn wrap_words(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n")
}
