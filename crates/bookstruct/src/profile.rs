//! Per-book parsing configuration.
//!
//! A [`Profile`] carries the typographic thresholds and structural patterns the
//! classifier and structure builder rely on. Profiles are either hand-tuned
//! presets, loaded from TOML, or produced by
//! [`ProfileBuilder`](crate::parser::fonts::ProfileBuilder); all three are
//! interchangeable downstream.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::types::{TextRun, DEFAULT_LANGUAGE};
use crate::BookError;

/// Chapter pattern used whenever a profile's own pattern does not compile.
pub const DEFAULT_CHAPTER_PATTERN: &str = r"^Chapter\s+(\d+)\s*[\.:]";
pub const DEFAULT_PART_PATTERN: &str = r"^Part\s+([IVXLC]+)\.";

const DEFAULT_MONOSPACE_FONTS: &[&str] = &[
    "Courier",
    "Mono",
    "Consolas",
    "Menlo",
    "DejaVuSansMono",
    "LucidaConsole",
    "Ubuntu Mono",
    "SourceCodePro",
];

const PRESET_NAMES: &[&str] = &[
    "learning_python",
    "python_cookbook",
    "programming_python",
    "cpp_generic",
    "cpp_primer",
    "effective_cpp",
];

/// Plain, serde-friendly record of every profile setting. Missing fields take
/// their defaults, so partial TOML files are valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub name: String,
    pub language: String,
    pub heading1_min_size: f32,
    pub heading2_min_size: f32,
    pub heading3_min_size: f32,
    pub body_size: f32,
    pub code_size: f32,
    pub monospace_fonts: Vec<String>,
    pub heading_fonts: Vec<String>,
    pub chapter_pattern: String,
    pub part_pattern: String,
    pub skip_pages_start: usize,
    pub skip_pages_end: usize,
    pub exercise_start_pattern: String,
    pub exercise_answer_pattern: String,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        ProfileConfig {
            name: "default".to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            heading1_min_size: 18.0,
            heading2_min_size: 14.0,
            heading3_min_size: 12.0,
            body_size: 10.0,
            code_size: 9.0,
            monospace_fonts: DEFAULT_MONOSPACE_FONTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            heading_fonts: Vec::new(),
            chapter_pattern: DEFAULT_CHAPTER_PATTERN.to_string(),
            part_pattern: DEFAULT_PART_PATTERN.to_string(),
            skip_pages_start: 0,
            skip_pages_end: 0,
            exercise_start_pattern: String::new(),
            exercise_answer_pattern: String::new(),
            margin_top: 72.0,
            margin_bottom: 72.0,
            margin_left: 54.0,
            margin_right: 54.0,
        }
    }
}

/// Validated per-book configuration.
///
/// Heading thresholds always satisfy `h1 >= h2 >= h3`; out-of-order values
/// are sorted on construction. Monospace lookups are memoized per instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ProfileConfig", into = "ProfileConfig")]
pub struct Profile {
    config: ProfileConfig,
    mono_lower: Vec<String>,
    mono_cache: RefCell<HashMap<String, bool>>,
}

impl From<ProfileConfig> for Profile {
    fn from(mut config: ProfileConfig) -> Self {
        let mut sizes = [
            config.heading1_min_size,
            config.heading2_min_size,
            config.heading3_min_size,
        ];
        if !(sizes[0] >= sizes[1] && sizes[1] >= sizes[2]) {
            sizes.sort_by(|a, b| b.total_cmp(a));
            config.heading1_min_size = sizes[0];
            config.heading2_min_size = sizes[1];
            config.heading3_min_size = sizes[2];
        }
        let mono_lower = config
            .monospace_fonts
            .iter()
            .map(|m| m.to_lowercase())
            .collect();
        Profile {
            config,
            mono_lower,
            mono_cache: RefCell::new(HashMap::new()),
        }
    }
}

impl From<Profile> for ProfileConfig {
    fn from(profile: Profile) -> Self {
        profile.config
    }
}

impl Default for Profile {
    fn default() -> Self {
        ProfileConfig::default().into()
    }
}

impl Profile {
    /// The documented default profile for `language`.
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        ProfileConfig {
            name: name.into(),
            language: language.into(),
            ..ProfileConfig::default()
        }
        .into()
    }

    /// Look up a hand-tuned preset by name.
    pub fn named(name: &str) -> Option<Self> {
        let base = ProfileConfig {
            name: name.to_string(),
            heading1_min_size: 20.0,
            heading2_min_size: 14.0,
            heading3_min_size: 12.0,
            body_size: 10.0,
            code_size: 8.5,
            ..ProfileConfig::default()
        };
        let config = match name {
            "learning_python" => ProfileConfig {
                heading2_min_size: 15.0,
                heading3_min_size: 12.5,
                part_pattern: r"^Part\s+([IVXLCDM]+)\s*[\.:]".to_string(),
                skip_pages_start: 20,
                skip_pages_end: 30,
                exercise_start_pattern: r"Test Your Knowledge:\s*Quiz".to_string(),
                exercise_answer_pattern: r"Test Your Knowledge:\s*Answers".to_string(),
                ..base
            },
            "python_cookbook" => ProfileConfig {
                heading3_min_size: 11.5,
                skip_pages_start: 15,
                skip_pages_end: 15,
                exercise_start_pattern: r"^(\d+\.\d+)\.\s+".to_string(),
                ..base
            },
            "programming_python" => ProfileConfig {
                heading2_min_size: 15.0,
                part_pattern: r"^Part\s+([IVXLCDM]+)\s*[\.:]".to_string(),
                skip_pages_start: 20,
                skip_pages_end: 30,
                ..base
            },
            "cpp_generic" => ProfileConfig {
                language: "cpp".to_string(),
                heading1_min_size: 18.0,
                skip_pages_start: 15,
                skip_pages_end: 15,
                ..base
            },
            "cpp_primer" => ProfileConfig {
                language: "cpp".to_string(),
                skip_pages_start: 20,
                skip_pages_end: 30,
                ..base
            },
            "effective_cpp" => ProfileConfig {
                language: "cpp".to_string(),
                heading1_min_size: 18.0,
                chapter_pattern: r"^(?:Item|Chapter)\s+(\d+)".to_string(),
                skip_pages_start: 15,
                skip_pages_end: 15,
                ..base
            },
            _ => return None,
        };
        Some(config.into())
    }

    pub fn preset_names() -> &'static [&'static str] {
        PRESET_NAMES
    }

    pub fn from_config(config: ProfileConfig) -> Self {
        config.into()
    }

    pub fn from_toml_str(data: &str) -> Result<Self, BookError> {
        let config: ProfileConfig = toml::from_str(data)?;
        Ok(config.into())
    }

    pub fn to_toml_string(&self) -> Result<String, BookError> {
        toml::to_string_pretty(&self.config).map_err(|e| BookError::InvalidProfile(e.to_string()))
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn language(&self) -> &str {
        &self.config.language
    }

    pub fn h1_min(&self) -> f32 {
        self.config.heading1_min_size
    }

    pub fn h2_min(&self) -> f32 {
        self.config.heading2_min_size
    }

    pub fn h3_min(&self) -> f32 {
        self.config.heading3_min_size
    }

    pub fn body_size(&self) -> f32 {
        self.config.body_size
    }

    pub fn code_size(&self) -> f32 {
        self.config.code_size
    }

    pub fn skip_pages_start(&self) -> usize {
        self.config.skip_pages_start
    }

    pub fn skip_pages_end(&self) -> usize {
        self.config.skip_pages_end
    }

    /// Does `font_name` contain one of the configured monospace fragments?
    pub fn is_monospace(&self, font_name: &str) -> bool {
        if font_name.is_empty() {
            return false;
        }
        if let Some(&hit) = self.mono_cache.borrow().get(font_name) {
            return hit;
        }
        let lower = font_name.to_lowercase();
        let hit = self.mono_lower.iter().any(|m| lower.contains(m.as_str()));
        self.mono_cache
            .borrow_mut()
            .insert(font_name.to_string(), hit);
        hit
    }

    /// Compiled chapter-title pattern (case-insensitive). An invalid pattern
    /// logs a warning and yields [`DEFAULT_CHAPTER_PATTERN`].
    pub fn chapter_regex(&self) -> Regex {
        RegexBuilder::new(&self.config.chapter_pattern)
            .case_insensitive(true)
            .build()
            .unwrap_or_else(|e| {
                log::warn!(
                    "Invalid chapter pattern {:?} in profile {}: {}; using default",
                    self.config.chapter_pattern,
                    self.config.name,
                    e
                );
                default_chapter_regex().clone()
            })
    }

    /// Is the run inside the content area between the top and bottom margins?
    pub fn in_content_area(&self, run: &TextRun, page_height: f32) -> bool {
        run.bbox.y0 >= self.config.margin_top
            && run.bbox.y1 <= page_height - self.config.margin_bottom
    }
}

fn default_chapter_regex() -> &'static Regex {
    static RE_DEFAULT: OnceLock<Regex> = OnceLock::new();
    RE_DEFAULT.get_or_init(|| {
        RegexBuilder::new(DEFAULT_CHAPTER_PATTERN)
            .case_insensitive(true)
            .build()
            .unwrap()
    })
}
