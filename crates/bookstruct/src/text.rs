//! Text cleanup and line-level heuristics shared by the classifier and the
//! code consolidator.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Clean text extracted from a page.
///
/// Applies NFKC normalization, ligature repair, and replacement of typographic
/// punctuation with plain ASCII.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut result: String = text.nfkc().collect();

    // NFKC already folds most ligatures; these cover fonts with private mappings.
    let replacements = [
        ("\u{FB00}", "ff"),
        ("\u{FB01}", "fi"),
        ("\u{FB02}", "fl"),
        ("\u{FB03}", "ffi"),
        ("\u{FB04}", "ffl"),
        ("\u{2018}", "'"),
        ("\u{2019}", "'"),
        ("\u{201C}", "\""),
        ("\u{201D}", "\""),
        ("\u{2013}", "-"),
        ("\u{2014}", "--"),
        ("\u{2026}", "..."),
        ("\u{00A0}", " "),
    ];
    for (from, to) in &replacements {
        result = result.replace(from, to);
    }

    result
}

/// Clean a code listing, preserving indentation and dropping page furniture
/// (page numbers, running chapter headers) that leaked between code lines.
pub fn clean_code_text(text: &str) -> String {
    static RE_PAGE_NUM: OnceLock<Regex> = OnceLock::new();
    let re_page_num = RE_PAGE_NUM.get_or_init(|| Regex::new(r"^\d{1,4}$").unwrap());

    static RE_CHAPTER: OnceLock<Regex> = OnceLock::new();
    let re_chapter = RE_CHAPTER.get_or_init(|| Regex::new(r"^Chapter \d+[:.]\s").unwrap());

    clean_text(text)
        .split('\n')
        .filter(|line| {
            let stripped = line.trim();
            !re_page_num.is_match(stripped) && !re_chapter.is_match(stripped)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rejoin words split across a line break: `"com- municate"` becomes
/// `"communicate"`. Only fires between lowercase letters so real hyphenated
/// compounds (`"Python-based"`, `"x - y"`) survive.
pub fn rejoin_hyphenation(text: &str) -> String {
    static RE_HYPHEN: OnceLock<Regex> = OnceLock::new();
    let re_hyphen = RE_HYPHEN.get_or_init(|| Regex::new(r"(\p{Ll})-\s+(\p{Ll})").unwrap());
    re_hyphen.replace_all(text, "$1$2").into_owned()
}

/// Collapse runs of spaces and excess blank lines, keeping paragraph breaks.
pub fn normalize_whitespace(text: &str) -> String {
    static RE_SPACES: OnceLock<Regex> = OnceLock::new();
    let re_spaces = RE_SPACES.get_or_init(|| Regex::new(r" {2,}").unwrap());

    static RE_LINES: OnceLock<Regex> = OnceLock::new();
    let re_lines = RE_LINES.get_or_init(|| Regex::new(r"\n{3,}").unwrap());

    let collapsed = re_spaces.replace_all(text, " ");
    re_lines.replace_all(&collapsed, "\n\n").trim().to_string()
}

/// Detect running headers and footers: bare page numbers, standalone
/// "Chapter N"/"Part N" lines, `123 | Chapter 5: Title` headers, and bare URLs.
pub fn is_page_header_or_footer(text: &str) -> bool {
    let stripped = text.trim();
    if stripped.is_empty() {
        return true;
    }

    static RE_FURNITURE: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = RE_FURNITURE.get_or_init(|| {
        [
            r"^\d{1,4}$",
            r"(?i)^(chapter|part)\s+\w+$",
            r"^\d+\s*\|\s*(Chapter|Part)",
            r"(?i)^www\.\S+\.\w+",
            r"(?i)^https?://\S+$",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    });

    patterns.iter().any(|re| re.is_match(stripped))
}

fn is_prompt_line(line: &str) -> bool {
    line.starts_with(">>> ") || line.starts_with("... ") || line == ">>>" || line == "..."
}

/// Does this code look like an interactive interpreter transcript?
///
/// True when at least one line starts with a prompt and prompt lines make up
/// more than 20% of all lines.
pub fn detect_repl_code(text: &str) -> bool {
    let stripped = text.trim();
    if stripped.is_empty() {
        return false;
    }
    let lines: Vec<&str> = stripped.split('\n').collect();
    let prompts = lines.iter().filter(|l| is_prompt_line(l)).count();
    prompts >= 1 && prompts as f32 / lines.len() as f32 > 0.2
}

/// Turn a REPL transcript into runnable source: prompts are stripped and output
/// lines dropped.
pub fn strip_repl_prompts(text: &str) -> String {
    text.trim()
        .split('\n')
        .filter_map(|line| {
            [">>> ", "... ", ">>>", "..."]
                .iter()
                .find_map(|prompt| line.strip_prefix(prompt))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
