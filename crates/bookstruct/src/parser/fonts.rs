//! Automatic discovery of per-book typographic thresholds.
//!
//! [`ProfileBuilder`] samples pages from a [`RunSource`], builds a font
//! histogram weighted by character count, and derives body/code sizes, heading
//! tiers, page margins, and front/back-matter skip ranges.
//!
//! ```text
//! sample pages -> histogram -> body / code / heading tiers
//!              -> y positions -> margins
//! first/last pages -> keywords -> skip ranges
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::source::RunSource;
use crate::profile::{Profile, ProfileConfig};
use crate::text::clean_text;
use crate::BookError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Number of pages sampled for the histogram.
const SAMPLE_PAGES: usize = 40;

/// Heading sizes with fewer total characters than this are decorative text.
const MIN_HEADING_CHARS: usize = 50;

/// Sizes closer than this are folded into the same heading tier.
const TIER_MERGE_DISTANCE: f32 = 1.0;

const MARGIN_BIN: f32 = 5.0;
const MARGIN_ZONE: f32 = 0.15;
const DEFAULT_MARGIN: f32 = 50.0;
const MAX_MARGIN: f32 = 90.0;

const FRONT_SCAN_PAGES: usize = 15;
const BACK_SCAN_PAGES: usize = 40;

const MONO_HINTS: &[&str] = &[
    "courier",
    "mono",
    "consolas",
    "menlo",
    "dejavusansmono",
    "lucidaconsole",
    "sourcecodepro",
    "inconsolata",
    "firacode",
    "droidsansmono",
    "robotomono",
    "ubuntumono",
    "liberationmono",
];

const FRONT_MATTER_KEYWORDS: &[&str] = &[
    "copyright",
    "table of contents",
    "preface",
    "foreword",
    "acknowledgment",
    "dedication",
    "about the author",
];

const BACK_MATTER_KEYWORDS: &[&str] = &["index", "appendix", "glossary", "bibliography", "colophon"];

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Why the builder fell back to the default profile.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// The sampled pages contained no text.
    NoText,
    /// Reading the document failed part way through.
    Failed(String),
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::NoText => write!(f, "no extractable text"),
            FallbackReason::Failed(msg) => write!(f, "analysis failed: {msg}"),
        }
    }
}

/// Result of profile discovery. A fallback still carries a usable profile.
#[derive(Debug, Clone)]
pub enum ProfileOutcome {
    Detected(Profile),
    Fallback {
        profile: Profile,
        reason: FallbackReason,
    },
}

impl ProfileOutcome {
    pub fn profile(&self) -> &Profile {
        match self {
            ProfileOutcome::Detected(p) => p,
            ProfileOutcome::Fallback { profile, .. } => profile,
        }
    }

    pub fn into_profile(self) -> Profile {
        match self {
            ProfileOutcome::Detected(p) => p,
            ProfileOutcome::Fallback { profile, .. } => profile,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ProfileOutcome::Fallback { .. })
    }
}

/// Histogram key: (font name, size in tenths of a point, bold, monospace).
type FontKey = (String, i32, bool, bool);

/// Character-weighted font histogram plus per-page run top positions.
#[derive(Debug, Default)]
pub struct FontHistogram {
    weights: BTreeMap<FontKey, usize>,
    page_tops: Vec<Vec<f32>>,
}

fn tenths(size: f32) -> i32 {
    (size * 10.0).round() as i32
}

fn from_tenths(key: i32) -> f32 {
    key as f32 / 10.0
}

fn round1(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}

/// Heuristic: does the font name look monospace?
pub fn looks_monospace(font_name: &str) -> bool {
    let lower = font_name.to_lowercase();
    MONO_HINTS.iter().any(|hint| lower.contains(hint))
}

/// Pick up to `target` page indices spread evenly across the document.
pub fn pick_sample_pages(total: usize, target: usize) -> Vec<usize> {
    if total <= target {
        return (0..total).collect();
    }
    let step = (total / target).max(1);
    (0..total).step_by(step).take(target).collect()
}

impl FontHistogram {
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Record one run on the page currently being sampled.
    fn add(&mut self, font: &str, size: f32, bold: bool, text_len: usize, top: f32) {
        let key = (font.to_string(), tenths(size), bold, looks_monospace(font));
        *self.weights.entry(key).or_insert(0) += text_len;
        if let Some(page) = self.page_tops.last_mut() {
            page.push(top);
        }
    }

    fn start_page(&mut self) {
        self.page_tops.push(Vec::new());
    }

    /// The heaviest non-monospace (font, size); the heaviest entry overall if
    /// every font is monospace.
    pub fn body_font(&self) -> Option<(String, f32)> {
        let mut non_mono: BTreeMap<(&str, i32), usize> = BTreeMap::new();
        for ((font, size, _, mono), weight) in &self.weights {
            if !mono {
                *non_mono.entry((font.as_str(), *size)).or_insert(0) += weight;
            }
        }
        if let Some(((font, size), _)) = heaviest(non_mono) {
            return Some((font.to_string(), from_tenths(size)));
        }
        self.weights
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|((font, size, _, _), _)| (font.clone(), from_tenths(*size)))
    }

    /// The heaviest monospace size, or a guess just under the body size.
    pub fn code_size(&self, body_size: f32) -> f32 {
        let mut mono_sizes: BTreeMap<i32, usize> = BTreeMap::new();
        for ((_, size, _, mono), weight) in &self.weights {
            if *mono {
                *mono_sizes.entry(*size).or_insert(0) += weight;
            }
        }
        match heaviest(mono_sizes) {
            Some((size, _)) => from_tenths(size),
            None => (body_size - 1.5).max(6.0),
        }
    }

    /// Distinct monospace font names, sorted.
    pub fn monospace_fonts(&self) -> Vec<String> {
        let fonts: BTreeSet<&str> = self
            .weights
            .keys()
            .filter(|(_, _, _, mono)| *mono)
            .map(|(font, _, _, _)| font.as_str())
            .collect();
        fonts.into_iter().map(str::to_string).collect()
    }

    /// Distinct heading tiers (descending) among non-monospace sizes above the
    /// body size.
    pub fn heading_tiers(&self, body_size: f32) -> Vec<f32> {
        let floor = tenths(body_size + 0.5);
        let mut large: BTreeMap<i32, usize> = BTreeMap::new();
        for ((_, size, _, mono), weight) in &self.weights {
            if !mono && *size > floor {
                *large.entry(*size).or_insert(0) += weight;
            }
        }
        if large.is_empty() {
            return Vec::new();
        }

        let mut filtered: Vec<i32> = large
            .iter()
            .filter(|(_, w)| **w >= MIN_HEADING_CHARS)
            .map(|(s, _)| *s)
            .collect();
        if filtered.is_empty() {
            // Every candidate is rare: keep only the most common one.
            filtered.extend(heaviest(large).map(|(s, _)| s));
        }

        filtered.sort_unstable_by(|a, b| b.cmp(a));
        let mut tiers: Vec<f32> = Vec::new();
        for size in filtered.into_iter().map(from_tenths) {
            match tiers.last() {
                Some(last) if (size - last).abs() <= TIER_MERGE_DISTANCE => {}
                _ => tiers.push(size),
            }
        }
        tiers
    }
}

/// Entry with the highest weight; ties go to the smallest key.
fn heaviest<K: Ord>(map: BTreeMap<K, usize>) -> Option<(K, usize)> {
    map.into_iter()
        .fold(None, |best: Option<(K, usize)>, (k, w)| match best {
            Some((bk, bw)) if bw >= w => Some((bk, bw)),
            _ => Some((k, w)),
        })
}

/// Turn heading tiers into `(h1_min, h2_min, h3_min)`.
pub fn heading_thresholds(tiers: &[f32], body_size: f32) -> (f32, f32, f32) {
    let (h1, h2, h3) = match tiers {
        [] => (body_size + 8.0, body_size + 4.0, body_size + 2.0),
        [t0] => ((t0 + body_size) / 2.0, body_size + 2.0, body_size + 1.0),
        [t0, t1] => (
            (t0 + t1) / 2.0,
            (t1 + body_size) / 2.0,
            body_size + 1.0,
        ),
        [t1, t2, t3, ..] => (
            (t1 + t2) / 2.0,
            (t2 + t3) / 2.0,
            (t3 + body_size) / 2.0,
        ),
    };
    (round1(h1), round1(h2), round1(h3))
}

/// Find header/footer bands: 5pt bins in the top or bottom 15% of the page
/// that hold text on at least half the sampled pages.
pub fn detect_margins(page_tops: &[Vec<f32>], page_height: f32) -> (f32, f32) {
    if page_tops.is_empty() || page_height <= 0.0 {
        return (DEFAULT_MARGIN, DEFAULT_MARGIN);
    }

    let threshold = page_tops.len() as f32 * 0.5;
    let top_zone = page_height * MARGIN_ZONE;
    let bottom_zone = page_height * (1.0 - MARGIN_ZONE);

    let mut top_bins: HashMap<i64, usize> = HashMap::new();
    let mut bottom_bins: HashMap<i64, usize> = HashMap::new();

    for tops in page_tops {
        // A bin counts once per page.
        let mut seen_top = BTreeSet::new();
        let mut seen_bottom = BTreeSet::new();
        for &y in tops {
            let bin = (y / MARGIN_BIN).floor() as i64;
            if y < top_zone {
                if seen_top.insert(bin) {
                    *top_bins.entry(bin).or_insert(0) += 1;
                }
            } else if y > bottom_zone && seen_bottom.insert(bin) {
                *bottom_bins.entry(bin).or_insert(0) += 1;
            }
        }
    }

    let margin_top = top_bins
        .iter()
        .filter(|(_, count)| **count as f32 >= threshold)
        .map(|(bin, _)| (*bin + 1) as f32 * MARGIN_BIN + MARGIN_BIN)
        .fold(DEFAULT_MARGIN, f32::max);

    let margin_bottom = bottom_bins
        .iter()
        .filter(|(_, count)| **count as f32 >= threshold)
        .map(|(bin, _)| page_height - *bin as f32 * MARGIN_BIN + MARGIN_BIN)
        .fold(DEFAULT_MARGIN, f32::max);

    (margin_top.min(MAX_MARGIN), margin_bottom.min(MAX_MARGIN))
}

// ---------------------------------------------------------------------------
// ProfileBuilder
// ---------------------------------------------------------------------------

/// Builds a [`Profile`] from a document without manual tuning.
///
/// The builder owns its source; the source is dropped when [`build`] returns,
/// whatever the outcome.
///
/// [`build`]: ProfileBuilder::build
pub struct ProfileBuilder<S: RunSource> {
    source: S,
}

impl<S: RunSource> ProfileBuilder<S> {
    pub fn new(source: S) -> Self {
        ProfileBuilder { source }
    }

    /// Sample the document and return a detected profile, or the documented
    /// default profile (`body_size == 10.0`) with the reason it was used.
    pub fn build(self, language: &str) -> ProfileOutcome {
        match self.analyze(language) {
            Ok(Some(profile)) => ProfileOutcome::Detected(profile),
            Ok(None) => {
                log::warn!("No text found in sampled pages, using default profile");
                ProfileOutcome::Fallback {
                    profile: Profile::new("auto", language),
                    reason: FallbackReason::NoText,
                }
            }
            Err(e) => {
                log::error!("Font analysis failed, using default profile: {}", e);
                ProfileOutcome::Fallback {
                    profile: Profile::new("auto", language),
                    reason: FallbackReason::Failed(e.to_string()),
                }
            }
        }
    }

    fn analyze(&self, language: &str) -> Result<Option<Profile>, BookError> {
        let total = self.source.page_count();
        let samples = pick_sample_pages(total, SAMPLE_PAGES);

        let histogram = self.sample_histogram(&samples)?;
        let Some((body_font, body_size)) = histogram.body_font() else {
            return Ok(None);
        };

        let code_size = histogram.code_size(body_size);
        let tiers = histogram.heading_tiers(body_size);
        let (h1, h2, h3) = heading_thresholds(&tiers, body_size);

        let (_, page_height) = self.source.page_size(samples[0])?;
        let (margin_top, margin_bottom) = detect_margins(&histogram.page_tops, page_height);

        let (skip_start, skip_end) = self.detect_skip_pages(total)?;

        let mut monospace_fonts = ProfileConfig::default().monospace_fonts;
        for font in histogram.monospace_fonts() {
            if !monospace_fonts.contains(&font) {
                monospace_fonts.push(font);
            }
        }

        log::info!(
            "Auto-detect: body={} ({}), code={}, h1>={}, h2>={}, h3>={}, margins=({:.0}, {:.0}), skip=({}, {})",
            body_size,
            body_font,
            code_size,
            h1,
            h2,
            h3,
            margin_top,
            margin_bottom,
            skip_start,
            skip_end
        );

        Ok(Some(Profile::from_config(ProfileConfig {
            name: "auto".to_string(),
            language: language.to_string(),
            heading1_min_size: h1,
            heading2_min_size: h2,
            heading3_min_size: h3,
            body_size,
            code_size,
            monospace_fonts,
            margin_top,
            margin_bottom,
            skip_pages_start: skip_start,
            skip_pages_end: skip_end,
            ..ProfileConfig::default()
        })))
    }

    fn sample_histogram(&self, samples: &[usize]) -> Result<FontHistogram, BookError> {
        let mut histogram = FontHistogram::default();
        for &page in samples {
            histogram.start_page();
            for run in self.source.page_runs(page)? {
                let text = clean_text(&run.text);
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                histogram.add(
                    &run.font_name,
                    run.font_size,
                    run.is_bold,
                    text.chars().count(),
                    run.bbox.y0,
                );
            }
        }
        Ok(histogram)
    }

    /// Scan early pages for front matter and late pages for back matter.
    fn detect_skip_pages(&self, total: usize) -> Result<(usize, usize), BookError> {
        let max_skip_start = (total / 15).max(2);
        let mut skip_start = 0;
        for page in 0..total.min(FRONT_SCAN_PAGES) {
            let text = self.source.page_text(page)?.to_lowercase();
            if FRONT_MATTER_KEYWORDS.iter().any(|kw| text.contains(kw)) {
                skip_start = page + 1;
            }
        }
        let skip_start = skip_start.min(max_skip_start);

        let mut skip_end = 0;
        for page in total.saturating_sub(BACK_SCAN_PAGES)..total {
            let text = self.source.page_text(page)?.to_lowercase();
            if BACK_MATTER_KEYWORDS.iter().any(|kw| text.contains(kw)) {
                skip_end = skip_end.max(total - page);
            }
        }

        Ok((skip_start, skip_end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::source::{DumpPage, RunDump};
    use crate::types::{BBox, TextRun};

    fn make_run(text: &str, font: &str, size: f32, bold: bool, y0: f32) -> TextRun {
        TextRun {
            text: text.to_string(),
            font_name: font.to_string(),
            font_size: size,
            is_bold: bold,
            is_italic: false,
            is_monospace: false,
            page_num: 0,
            bbox: BBox::new(72.0, y0, 300.0, y0 + size),
        }
    }

    fn page(runs: Vec<TextRun>) -> DumpPage {
        DumpPage {
            width: 612.0,
            height: 800.0,
            runs,
            images: Vec::new(),
        }
    }

    fn typical_page(i: usize) -> DumpPage {
        page(vec![
            make_run(&format!("{}", i + 1), "Minion", 9.0, false, 30.0),
            make_run(&"a".repeat(400), "Minion", 10.0, false, 200.0),
            make_run(&"b".repeat(30), "Myriad-Bold", 24.0, true, 100.0),
            make_run(&"c".repeat(40), "Myriad-Bold", 16.0, true, 150.0),
            make_run(&"d".repeat(40), "Myriad-Bold", 13.0, true, 180.0),
            make_run(&"x".repeat(120), "UbuntuMono", 8.5, false, 300.0),
        ])
    }

    /// A source whose pages cannot be read.
    struct BrokenSource;

    impl RunSource for BrokenSource {
        fn page_count(&self) -> usize {
            3
        }

        fn page_size(&self, _page: usize) -> Result<(f32, f32), BookError> {
            Ok((612.0, 792.0))
        }

        fn page_runs(&self, _page: usize) -> Result<Vec<TextRun>, BookError> {
            Err(BookError::Source("damaged xref table".to_string()))
        }
    }

    #[test]
    fn test_pick_sample_pages_small() {
        assert_eq!(pick_sample_pages(5, 40), vec![0, 1, 2, 3, 4]);
        assert!(pick_sample_pages(0, 40).is_empty());
    }

    #[test]
    fn test_pick_sample_pages_large() {
        let pages = pick_sample_pages(400, 40);
        assert_eq!(pages.len(), 40);
        assert_eq!(pages[0], 0);
        assert_eq!(pages[1], 10);
    }

    #[test]
    fn test_looks_monospace() {
        assert!(looks_monospace("FiraCode-Retina"));
        assert!(looks_monospace("CourierNewPS"));
        assert!(!looks_monospace("MinionPro"));
    }

    #[test]
    fn test_heading_thresholds_three_tiers() {
        assert_eq!(heading_thresholds(&[24.0, 16.0, 13.0], 10.0), (20.0, 14.5, 11.5));
    }

    #[test]
    fn test_heading_thresholds_two_tiers() {
        assert_eq!(heading_thresholds(&[20.0, 14.0], 10.0), (17.0, 12.0, 11.0));
    }

    #[test]
    fn test_heading_thresholds_one_tier() {
        assert_eq!(heading_thresholds(&[18.0], 10.0), (14.0, 12.0, 11.0));
    }

    #[test]
    fn test_heading_thresholds_no_tiers() {
        assert_eq!(heading_thresholds(&[], 10.0), (18.0, 14.0, 12.0));
    }

    #[test]
    fn test_heading_tiers_merge_and_filter() {
        let mut h = FontHistogram::default();
        h.start_page();
        h.add("Serif", 10.0, false, 1000, 0.0);
        h.add("Sans-Bold", 20.0, true, 60, 0.0);
        h.add("Sans", 19.5, false, 60, 0.0);
        h.add("Sans-Bold", 14.0, true, 80, 0.0);
        // Cover-page decoration: rare, must be discarded.
        h.add("Display", 48.0, false, 12, 0.0);
        // Monospace sizes never form heading tiers.
        h.add("Courier", 30.0, false, 500, 0.0);
        assert_eq!(h.heading_tiers(10.0), vec![20.0, 14.0]);
    }

    #[test]
    fn test_heading_tiers_all_rare_keeps_most_common() {
        let mut h = FontHistogram::default();
        h.start_page();
        h.add("Serif", 10.0, false, 1000, 0.0);
        h.add("Sans", 30.0, false, 10, 0.0);
        h.add("Sans", 18.0, false, 20, 0.0);
        assert_eq!(h.heading_tiers(10.0), vec![18.0]);
    }

    #[test]
    fn test_heading_tiers_excludes_near_body() {
        let mut h = FontHistogram::default();
        h.start_page();
        h.add("Serif", 10.0, false, 1000, 0.0);
        h.add("Serif", 10.5, false, 500, 0.0);
        assert!(h.heading_tiers(10.0).is_empty());
    }

    #[test]
    fn test_body_font_prefers_non_mono() {
        let mut h = FontHistogram::default();
        h.start_page();
        h.add("Courier", 9.0, false, 5000, 0.0);
        h.add("Serif", 10.0, false, 1000, 0.0);
        assert_eq!(h.body_font(), Some(("Serif".to_string(), 10.0)));
        assert_eq!(h.code_size(10.0), 9.0);
    }

    #[test]
    fn test_body_font_all_mono_falls_back() {
        let mut h = FontHistogram::default();
        h.start_page();
        h.add("Courier", 9.0, false, 5000, 0.0);
        assert_eq!(h.body_font(), Some(("Courier".to_string(), 9.0)));
    }

    #[test]
    fn test_code_size_guess_without_mono() {
        let h = FontHistogram::default();
        assert_eq!(h.code_size(10.0), 8.5);
        assert_eq!(h.code_size(7.0), 6.0);
    }

    #[test]
    fn test_detect_margins_header_band() {
        // Running header at y=30 on every page, body text scattered.
        let tops: Vec<Vec<f32>> = (0..10)
            .map(|i| vec![30.0, 31.0, 200.0 + i as f32 * 10.0])
            .collect();
        let (top, bottom) = detect_margins(&tops, 800.0);
        assert_eq!(top, 50.0);
        assert_eq!(bottom, 50.0);

        let tops: Vec<Vec<f32>> = (0..10).map(|_| vec![62.0, 300.0]).collect();
        let (top, _) = detect_margins(&tops, 800.0);
        assert_eq!(top, 70.0);
    }

    #[test]
    fn test_detect_margins_footer_band_capped() {
        let tops: Vec<Vec<f32>> = (0..4).map(|_| vec![300.0, 690.0, 760.0]).collect();
        let (_, bottom) = detect_margins(&tops, 800.0);
        // 690 -> 800 - 690 + 5 = 115, capped at 90.
        assert_eq!(bottom, 90.0);
    }

    #[test]
    fn test_detect_margins_rare_band_ignored() {
        let mut tops: Vec<Vec<f32>> = (0..10).map(|_| vec![300.0]).collect();
        tops[0].push(70.0);
        assert_eq!(detect_margins(&tops, 800.0), (50.0, 50.0));
    }

    #[test]
    fn test_detect_margins_empty() {
        assert_eq!(detect_margins(&[], 800.0), (50.0, 50.0));
    }

    #[test]
    fn test_build_profile_detects_thresholds() {
        let dump = RunDump {
            pages: (0..12).map(typical_page).collect(),
        };
        let outcome = ProfileBuilder::new(&dump).build("python");
        assert!(!outcome.is_fallback());
        let p = outcome.profile();
        assert_eq!(p.body_size(), 10.0);
        assert_eq!(p.code_size(), 8.5);
        assert_eq!((p.h1_min(), p.h2_min(), p.h3_min()), (20.0, 14.5, 11.5));
        assert_eq!(p.name(), "auto");
        assert_eq!(p.language(), "python");
    }

    #[test]
    fn test_build_profile_learns_code_fonts() {
        let pages = (0..6)
            .map(|i| {
                page(vec![
                    make_run(&"a".repeat(400), "Minion", 10.0, false, 200.0),
                    make_run(&"x".repeat(100), "Inconsolata-Regular", 8.5, false, 300.0),
                    make_run(&"y".repeat(50), "FiraCode-Bold", 8.5, true, 320.0 + i as f32),
                ])
            })
            .collect();
        let outcome = ProfileBuilder::new(RunDump { pages }).build("python");
        let p = outcome.profile();

        let fonts = &p.config().monospace_fonts;
        assert!(fonts.contains(&"Inconsolata-Regular".to_string()));
        assert!(fonts.contains(&"FiraCode-Bold".to_string()));
        assert!(fonts.contains(&"Courier".to_string()));
        assert!(p.is_monospace("Inconsolata-Regular"));
        assert!(p.is_monospace("FiraCode-Bold"));
        assert!(!p.is_monospace("Minion"));
    }

    #[test]
    fn test_histogram_monospace_fonts() {
        let mut h = FontHistogram::default();
        h.start_page();
        h.add("Serif", 10.0, false, 1000, 0.0);
        h.add("Menlo", 9.0, false, 100, 0.0);
        h.add("Menlo", 8.0, true, 100, 0.0);
        h.add("Consolas", 9.0, false, 100, 0.0);
        assert_eq!(h.monospace_fonts(), vec!["Consolas".to_string(), "Menlo".to_string()]);
    }

    #[test]
    fn test_build_profile_no_text_is_fallback() {
        let dump = RunDump {
            pages: vec![page(Vec::new()), page(vec![make_run("   ", "Serif", 10.0, false, 100.0)])],
        };
        let outcome = ProfileBuilder::new(dump).build("cpp");
        match &outcome {
            ProfileOutcome::Fallback { profile, reason } => {
                assert_eq!(*reason, FallbackReason::NoText);
                assert_eq!(profile.body_size(), 10.0);
                assert_eq!(profile.language(), "cpp");
            }
            ProfileOutcome::Detected(_) => panic!("expected fallback"),
        }
    }

    #[test]
    fn test_build_profile_empty_document() {
        let outcome = ProfileBuilder::new(RunDump::default()).build("python");
        assert!(outcome.is_fallback());
        assert_eq!(outcome.into_profile().body_size(), 10.0);
    }

    #[test]
    fn test_build_profile_read_failure_is_fallback() {
        let outcome = ProfileBuilder::new(BrokenSource).build("python");
        match outcome {
            ProfileOutcome::Fallback {
                reason: FallbackReason::Failed(msg),
                profile,
            } => {
                assert!(msg.contains("damaged xref table"));
                assert_eq!(profile.body_size(), 10.0);
            }
            other => panic!("expected failure fallback, got {:?}", other),
        }
    }

    #[test]
    fn test_skip_pages() {
        let mut pages: Vec<DumpPage> = (0..60).map(typical_page).collect();
        pages[1] = page(vec![make_run("Copyright 2013", "Minion", 10.0, false, 200.0)]);
        pages[3] = page(vec![make_run("Table of Contents", "Minion", 10.0, false, 200.0)]);
        pages[55] = page(vec![make_run("Index", "Minion", 10.0, false, 200.0)]);
        pages[58] = page(vec![make_run("Colophon", "Minion", 10.0, false, 200.0)]);
        let dump = RunDump { pages };
        let builder = ProfileBuilder::new(&dump);
        // Front skip is capped at max(2, 60 / 15) = 4.
        assert_eq!(builder.detect_skip_pages(60).unwrap(), (4, 5));
    }

    #[test]
    fn test_skip_pages_front_cap() {
        let mut pages: Vec<DumpPage> = (0..30).map(typical_page).collect();
        pages[10] = page(vec![make_run("Preface", "Minion", 10.0, false, 200.0)]);
        let dump = RunDump { pages };
        let builder = ProfileBuilder::new(&dump);
        assert_eq!(builder.detect_skip_pages(30).unwrap().0, 2);
    }
}
