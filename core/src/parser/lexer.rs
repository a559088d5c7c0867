//! Raw SQL text decomposition: comment stripping and statement splitting.
//!
//! Splitting tracks four mutually exclusive quoting modes (single, double,
//! dollar-tagged, none); only in mode none does a `;` terminate a statement.

/// Remove `--` line comments and blank lines.
///
/// Each line is truncated at its first `--`, with no quote tracking: a `--`
/// inside a string literal also truncates the line.
pub fn strip_comments(sql: &str) -> String {
    let mut out = String::new();
    for line in sql.lines() {
        let line = match line.find("--") {
            Some(idx) => &line[..idx],
            None => line,
        };
        if !line.trim().is_empty() {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Split SQL text into individual statements at unquoted semicolons.
///
/// Dollar quoting closes only on the identical `$tag$` sequence (the tag
/// may be empty); a doubled `''` inside a single-quoted string does not end
/// it. Emitted statements are trimmed; empty ones are discarded.
pub fn split_statements(sql: &str) -> Vec<String> {
    let chars: Vec<char> = sql.chars().collect();
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut in_dollar = false;
    let mut dollar_tag = String::new();

    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];

        if ch == '$' && !in_single && !in_double {
            // candidate tag runs to the next '$', inclusive
            if let Some(rel) = chars[i + 1..].iter().position(|&c| c == '$') {
                let tag_end = i + 1 + rel;
                let tag: String = chars[i..=tag_end].iter().collect();
                if in_dollar {
                    if tag == dollar_tag {
                        current.extend(chars[i..=tag_end].iter());
                        i = tag_end + 1;
                        in_dollar = false;
                        dollar_tag.clear();
                        continue;
                    }
                    // a different $other$ inside the body is literal text
                } else {
                    in_dollar = true;
                    dollar_tag = tag;
                    current.extend(chars[i..=tag_end].iter());
                    i = tag_end + 1;
                    continue;
                }
            }
        }

        if ch == '\'' && !in_double && !in_dollar {
            current.push(ch);
            if chars.get(i + 1) == Some(&'\'') {
                // escaped apostrophe, not a closing quote
                current.push('\'');
                i += 2;
            } else {
                in_single = !in_single;
                i += 1;
            }
            continue;
        }

        if ch == '"' && !in_single && !in_dollar {
            current.push(ch);
            in_double = !in_double;
            i += 1;
            continue;
        }

        if ch == ';' && !in_single && !in_double && !in_dollar {
            let stmt = current.trim();
            if !stmt.is_empty() {
                statements.push(stmt.to_string());
            }
            current.clear();
            i += 1;
            continue;
        }

        current.push(ch);
        i += 1;
    }

    let stmt = current.trim();
    if !stmt.is_empty() {
        statements.push(stmt.to_string());
    }

    statements
}

/// Extract the content of the first top-level parenthesized group.
pub fn paren_content(s: &str) -> Option<&str> {
    let start = s.find('(')?;
    let mut depth = 0usize;
    for (i, ch) in s[start..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start + 1..start + i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a string at a delimiter, ignoring delimiters inside parentheses.
pub fn split_top_level(s: &str, delim: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;

    for ch in s.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth -= 1;
                current.push(ch);
            }
            c if c == delim && depth == 0 => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}
