//! Outgoing line formatting.

/// Longest text carried by one `PRIVMSG`, leaving room for the prefix the
/// server prepends when relaying (the protocol caps lines at 512 bytes).
pub(crate) const MAX_TEXT_LEN: usize = 400;

/// Strip characters that would end or corrupt a protocol line.
pub(crate) fn clean(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n' | '\0'))
        .collect()
}

/// One `PRIVMSG` per non-empty line of `text`, with long lines split.
pub(crate) fn privmsg_lines(target: &str, text: &str) -> Vec<String> {
    let target = clean(target);
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .flat_map(|line| split_message(line, MAX_TEXT_LEN))
        .map(|chunk| format!("PRIVMSG {target} :{}", clean(chunk)))
        .collect()
}

/// Split a line into chunks of at most `max_len` bytes, breaking at spaces
/// when possible and never inside a UTF-8 character.
pub(crate) fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    if text.len() <= max_len {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let break_at = if end < text.len() {
            text[start..end]
                .rfind(' ')
                .filter(|&i| i > 0)
                .map(|i| start + i + 1)
                .unwrap_or(end)
        } else {
            end
        };
        chunks.push(&text[start..break_at]);
        start = break_at;
    }

    chunks
}
