//! Plain-text segmentation: fenced code extraction and line-number cleanup.

/// One segment of a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSegment {
    Plain(String),
    Code {
        language: Option<String>,
        code: String,
    },
}

/// Splits text on ``` fences into plain and code segments.
///
/// The token after an opening fence becomes the language tag. An unclosed
/// fence runs to the end of the text.
pub fn split_fenced(text: &str) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut buffer = String::new();
    let mut language: Option<String> = None;
    let mut in_code = false;

    for line in text.lines() {
        if let Some(fence_rest) = line.trim_start().strip_prefix("```") {
            if in_code {
                segments.push(TextSegment::Code {
                    language: language.take(),
                    code: std::mem::take(&mut buffer),
                });
            } else {
                if !buffer.trim().is_empty() {
                    segments.push(TextSegment::Plain(std::mem::take(&mut buffer)));
                }
                buffer.clear();
                let tag = fence_rest.trim();
                language = (!tag.is_empty()).then(|| tag.to_string());
            }
            in_code = !in_code;
            continue;
        }
        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(line);
    }

    if in_code {
        segments.push(TextSegment::Code {
            language,
            code: buffer,
        });
    } else if !buffer.trim().is_empty() {
        segments.push(TextSegment::Plain(buffer));
    }

    segments
}

/// Strips `N: `-style line-number prefixes from every line of a code block.
pub fn strip_line_numbers(code: &str) -> String {
    code.lines()
        .map(|line| {
            let digits = line.chars().take_while(char::is_ascii_digit).count();
            match (digits > 0).then(|| line[digits..].strip_prefix(':')).flatten() {
                Some(rest) => rest.trim_start(),
                None => line,
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_one_segment() {
        assert_eq!(
            split_fenced("just words"),
            vec![TextSegment::Plain("just words".to_string())]
        );
    }

    #[test]
    fn test_fenced_block_with_language() {
        let segments = split_fenced("before\n```python\nprint(1)\n```\nafter");
        assert_eq!(
            segments,
            vec![
                TextSegment::Plain("before".to_string()),
                TextSegment::Code {
                    language: Some("python".to_string()),
                    code: "print(1)".to_string(),
                },
                TextSegment::Plain("after".to_string()),
            ]
        );
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let segments = split_fenced("```\nlet x = 1;\nlet y = 2;");
        assert_eq!(
            segments,
            vec![TextSegment::Code {
                language: None,
                code: "let x = 1;\nlet y = 2;".to_string(),
            }]
        );
    }

    #[test]
    fn test_strip_line_numbers() {
        assert_eq!(
            strip_line_numbers("1: import os\n2:   print(os)\nno prefix"),
            "import os\nprint(os)\nno prefix"
        );
    }
}
