//! Best-effort textual repairs applied to a located JSON span before parsing.
//!
//! Models often emit near-JSON: raw newlines inside strings, doubled escapes,
//! `\'`, stray backslashes, trailing commas. Each fix is a named pass so it
//! can be tested, added, or removed on its own. Passes run in table order.
//! They are heuristics and will not salvage everything.
//!
//! Text that already parses is left alone, but inside a span that needs
//! repair a LaTeX command whose first letter forms a valid JSON escape
//! (`\theta`, `\frac`, `\beta`) decodes to a control character followed by
//! the rest of the word. Losing one malformed card's formatting is preferred
//! to losing the whole chunk.

use std::sync::LazyLock;

use regex::Regex;

/// One named text-to-text repair.
pub struct RepairPass {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

/// The repair pipeline, in application order.
pub const REPAIR_PASSES: &[RepairPass] = &[
    RepairPass { name: "escape_raw_control_chars", apply: escape_raw_control_chars },
    RepairPass { name: "collapse_escaped_newlines", apply: collapse_escaped_newlines },
    RepairPass { name: "unescape_single_quotes", apply: unescape_single_quotes },
    RepairPass { name: "strip_invalid_escapes", apply: strip_invalid_escapes },
    RepairPass { name: "strip_trailing_commas", apply: strip_trailing_commas },
];

/// Run every pass over `span`.
pub fn repair(span: &str) -> String {
    REPAIR_PASSES
        .iter()
        .fold(span.to_string(), |text, pass| (pass.apply)(&text))
}

/// Raw newlines, carriage returns and tabs inside string literals become
/// their JSON escapes. Structural whitespace between tokens is untouched.
pub fn escape_raw_control_chars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in input.chars() {
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            continue;
        }
        if escaped {
            escaped = false;
            // A backslash directly before a raw line break.
            match c {
                '\n' => out.push('n'),
                '\r' => out.push('r'),
                '\t' => out.push('t'),
                _ => out.push(c),
            }
            continue;
        }
        match c {
            '\\' => {
                escaped = true;
                out.push(c);
            }
            '"' => {
                in_string = false;
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Doubled newline escapes (`\\n`, `\\r\\n`) collapse to a single `\n`.
pub fn collapse_escaped_newlines(input: &str) -> String {
    input.replace(r"\\r\\n", r"\n").replace(r"\\n", r"\n")
}

/// `\'` is not a JSON escape; it becomes a plain `'`.
pub fn unescape_single_quotes(input: &str) -> String {
    map_escapes(input, |c, _rest, out| {
        if c != '\'' {
            out.push('\\');
        }
        out.push(c);
    })
}

/// Drop a backslash that does not start a valid JSON escape, keeping the
/// character it preceded. `\u` counts only with four hex digits after it.
pub fn strip_invalid_escapes(input: &str) -> String {
    map_escapes(input, |c, rest, out| {
        if is_json_escape(c, rest) {
            out.push('\\');
        }
        out.push(c);
    })
}

fn is_json_escape(c: char, rest: &str) -> bool {
    match c {
        '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' => true,
        'u' => rest
            .as_bytes()
            .get(..4)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)),
        _ => false,
    }
}

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[\]}])").expect("trailing comma pattern is valid"));

/// A comma directly before `]` or `}` is removed.
pub fn strip_trailing_commas(input: &str) -> String {
    TRAILING_COMMA.replace_all(input, "$1").into_owned()
}

/// Walk `input` pairing each backslash with the character after it, letting
/// `rewrite` decide what the pair becomes. `rewrite` also sees the text that
/// follows the pair. A trailing lone backslash is kept.
fn map_escapes(input: &str, rewrite: impl Fn(char, &str, &mut String)) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next) => rewrite(next, chars.as_str(), &mut out),
            None => out.push('\\'),
        }
    }
    out
}
