// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Normalises judgment text before the regex tagger scans it.
//
// Judgments exported from word processors carry:
//   - Non-breaking spaces (U+00A0, U+202F) inside amounts: "1 500,00 $"
//   - Zero-width spaces and byte order marks
//   - Carriage returns from Windows line endings
//   - Tabs and runs of spaces from table layouts
//
// Patterns are written against single plain spaces, so all of
// those are folded first:
//   1. Map Unicode space variants and tabs to ' ', '\r' to '\n'
//   2. Replace other control characters with ' '
//   3. Collapse runs of spaces and trim each line
//
// Line breaks are kept: some patterns anchor on paragraph starts.

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean raw judgment text for pattern matching.
    pub fn clean(&self, text: &str) -> String {
        // ── Step 1: Normalise individual characters ───────────────────────────
        let normalised: String = text
            .chars()
            .map(|c| match c {
                '\t' | '\u{00A0}' | '\u{202F}' | '\u{2009}' => ' ',
                '\u{200B}' | '\u{FEFF}' => ' ',
                '\r' => '\n',
                c if c.is_control() && c != '\n' => ' ',
                c => c,
            })
            .collect();

        // ── Step 2: Collapse spaces line by line ─────────────────────────────
        normalised
            .lines()
            .map(collapse_spaces)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

fn collapse_spaces(line: &str) -> String {
    let mut out        = String::with_capacity(line.len());
    let mut last_space = false;

    for c in line.chars() {
        if c == ' ' {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
        } else {
            out.push(c);
            last_space = false;
        }
    }

    out.trim().to_string()
}
