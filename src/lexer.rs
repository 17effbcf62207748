//! Turns one input line into a flat sequence of token strings.
//!
//! Handles single/double quoting, backslash escapes, and greedy longest-match
//! recognition of the operator tokens `2>&1`, `>>`, `2>`, `|`, `&`, `<`, `>`.
//! Quote and escape characters are elided from the emitted tokens.

/// Hard cap on tokens per line. Extra input past this is silently dropped.
pub const MAX_TOKENS: usize = 128;

/// Hard cap on a single token's length, in bytes. Extra bytes are dropped.
pub const MAX_TOKEN_LEN: usize = 1024;

/// The recognised multi-character operators, longest first so that matching
/// is greedy: `2>&1` must win over `2>`, and `>>`/`2>` must win over a lone
/// `>`.
const OPERATORS: &[&str] = &["2>&1", ">>", "2>", "|", "&", "<", ">"];

/// Tokenize a shell input line.
///
/// Unterminated quotes are tolerated: whatever was accumulated before EOF is
/// flushed as a final token rather than treated as an error.
pub fn tokenize(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        if tokens.len() >= MAX_TOKENS {
            break;
        }

        let c = chars[i];

        if let Some(q) = quote {
            if c == q {
                quote = None;
            } else {
                push_byte(&mut current, c);
            }
            i += 1;
            continue;
        }

        match c {
            ' ' | '\t' | '\n' => {
                flush(&mut tokens, &mut current);
                i += 1;
            }
            '"' | '\'' => {
                quote = Some(c);
                i += 1;
            }
            '\\' => {
                i += 1;
                if i < chars.len() {
                    push_byte(&mut current, chars[i]);
                    i += 1;
                }
            }
            _ => {
                if let Some((op, consumed)) = match_operator(&chars[i..]) {
                    flush(&mut tokens, &mut current);
                    if tokens.len() < MAX_TOKENS {
                        tokens.push(op.to_string());
                    }
                    i += consumed;
                } else {
                    push_byte(&mut current, c);
                    i += 1;
                }
            }
        }
    }

    flush(&mut tokens, &mut current);
    tokens.truncate(MAX_TOKENS);
    tokens
}

fn flush(tokens: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}

fn push_byte(current: &mut String, c: char) {
    if current.len() + c.len_utf8() <= MAX_TOKEN_LEN {
        current.push(c);
    }
}

fn match_operator(rest: &[char]) -> Option<(&'static str, usize)> {
    for op in OPERATORS {
        let op_chars: Vec<char> = op.chars().collect();
        if rest.len() >= op_chars.len() && rest[..op_chars.len()] == op_chars[..] {
            return Some((op, op_chars.len()));
        }
    }
    None
}
