// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Building and splitting single-string command lines.
//!
//! Debugger launchers accept the arguments for the debuggee as one string, so the arguments for a
//! test binary have to be escaped such that the receiving process splits them back into exactly
//! the original tokens. The rules used here are the ones implemented by the Microsoft C runtime
//! and `CommandLineToArgvW`:
//!
//! * arguments are separated by spaces or tabs
//! * a double quote begins or ends a quoted region, in which spaces and tabs are literal
//! * `2n` backslashes followed by a quote produce `n` backslashes, and the quote is a delimiter
//! * `2n + 1` backslashes followed by a quote produce `n` backslashes and a literal quote
//! * backslashes not followed by a quote are literal
//!
//! The special parsing rules for the program name (the first token of a full command line) do not
//! apply here: these functions only deal with the arguments after it.

/// Escapes `tokens` into a single string that [`split_args`] (or any parser following the
/// Windows rules) turns back into the same tokens.
///
/// Tokens that don't need quoting are passed through unchanged, so that simple command lines stay
/// readable in logs.
pub fn escape_args<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (idx, token) in tokens.into_iter().enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        escape_one(token.as_ref(), &mut out);
    }
    out
}

fn escape_one(token: &str, out: &mut String) {
    let needs_quotes = token.is_empty()
        || token
            .chars()
            .any(|c| matches!(c, ' ' | '\t' | '\n' | '\x0b' | '"'));
    if !needs_quotes {
        out.push_str(token);
        return;
    }

    out.push('"');
    let mut backslashes = 0;
    for c in token.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                // Escape every preceding backslash, plus one for the quote itself.
                push_backslashes(out, backslashes * 2 + 1);
                out.push('"');
                backslashes = 0;
            }
            _ => {
                push_backslashes(out, backslashes);
                out.push(c);
                backslashes = 0;
            }
        }
    }
    // Trailing backslashes precede the closing quote.
    push_backslashes(out, backslashes * 2);
    out.push('"');
}

fn push_backslashes(out: &mut String, count: usize) {
    out.extend(std::iter::repeat_n('\\', count));
}

/// Splits a command line produced by [`escape_args`] (or any other tool following the Windows
/// rules) into its arguments.
pub fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|&c| c == ' ' || c == '\t').is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut arg = String::new();
        let mut in_quotes = false;
        while let Some(&c) = chars.peek() {
            match c {
                '\\' => {
                    let mut backslashes = 0;
                    while chars.next_if_eq(&'\\').is_some() {
                        backslashes += 1;
                    }
                    if chars.peek() == Some(&'"') {
                        push_backslashes(&mut arg, backslashes / 2);
                        if backslashes % 2 == 1 {
                            arg.push('"');
                            chars.next();
                        }
                        // With an even count the quote is a delimiter, handled on the next turn.
                    } else {
                        push_backslashes(&mut arg, backslashes);
                    }
                }
                '"' => {
                    chars.next();
                    if in_quotes && chars.peek() == Some(&'"') {
                        // `""` inside a quoted region is a literal quote.
                        arg.push('"');
                        chars.next();
                    } else {
                        in_quotes = !in_quotes;
                    }
                }
                ' ' | '\t' if !in_quotes => break,
                _ => {
                    arg.push(c);
                    chars.next();
                }
            }
        }
        args.push(arg);
    }

    args
}
