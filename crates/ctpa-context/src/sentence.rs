//! 句子切分

/// 切分报告为句子，返回 (字节偏移, 句子文本)
///
/// 在 `.` `?` `!` 之后紧跟空白或文本结尾处切分，空行也作为分隔；小数点不会切分。
pub fn split_sentences(text: &str) -> Vec<(usize, &str)> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        let boundary = match c {
            '.' | '?' | '!' => next.map_or(true, char::is_whitespace),
            '\n' => next == Some('\n') || (next == Some('\r') && text[index + 1..].starts_with("\r\n")),
            _ => false,
        };
        if boundary {
            let end = index + c.len_utf8();
            push_trimmed(&mut sentences, text, start, end);
            start = end;
        }
    }
    push_trimmed(&mut sentences, text, start, text.len());
    sentences
}

fn push_trimmed<'a>(sentences: &mut Vec<(usize, &'a str)>, text: &'a str, start: usize, end: usize) {
    let piece = &text[start..end];
    let trimmed_start = piece.len() - piece.trim_start().len();
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        sentences.push((start + trimmed_start, trimmed));
    }
}
