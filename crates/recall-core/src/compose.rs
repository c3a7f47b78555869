use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::source::{Note, NoteRead, NoteSource};
use crate::tokenizer::{char_prefix, query_keywords, split_paragraphs, split_sentences};

pub const PINNED_HEADER: &str = "=== SELECTED NOTES ===";
pub const RELEVANT_HEADER: &str = "=== RELEVANT NOTES ===";
pub const METADATA_HEADER: &str = "=== VAULT CONTEXT ===";

/// Marker appended wherever text is cut mid-paragraph.
pub const ELLIPSIS: &str = "...";
const ELLIPSIS_CHARS: usize = 3;

const SECTION_SEPARATOR: &str = "\n\n";
const ENTRY_SEPARATOR: &str = "\n\n";
const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Minimum leftover room before a partial paragraph is worth emitting.
const PARTIAL_PARAGRAPH_MIN_ROOM: usize = 100;

/// Title keyword hits outweigh body hits.
const TITLE_MATCH_WEIGHT: usize = 3;
const BODY_MATCH_WEIGHT: usize = 1;

/// Character budget with cumulative tier ceilings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextBudget {
    /// Hard ceiling on the assembled context, in characters.
    pub total_chars: usize,
    /// Pinned notes may fill up to this share of the total.
    pub pinned_ratio: f64,
    /// Pinned + relevant notes may fill up to this share.
    pub relevant_ratio: f64,
    /// Everything including metadata may fill up to this share.
    pub metadata_ratio: f64,
    /// Per-note cap for pinned notes.
    pub pinned_doc_cap: usize,
    /// Per-note cap for relevant-note excerpts.
    pub excerpt_cap: usize,
    /// How many relevant notes to consider.
    pub max_relevant: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            total_chars: 8000,
            pinned_ratio: 0.60,
            relevant_ratio: 0.80,
            metadata_ratio: 0.95,
            pinned_doc_cap: 1500,
            excerpt_cap: 500,
            max_relevant: 3,
        }
    }
}

impl ContextBudget {
    pub fn with_total(total_chars: usize) -> Self {
        Self {
            total_chars,
            ..Self::default()
        }
    }

    fn ceiling(&self, ratio: f64) -> usize {
        let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
        ((self.total_chars as f64 * ratio).floor() as usize).min(self.total_chars)
    }

    pub fn pinned_ceiling(&self) -> usize {
        self.ceiling(self.pinned_ratio)
    }

    pub fn relevant_ceiling(&self) -> usize {
        self.ceiling(self.relevant_ratio)
    }

    pub fn metadata_ceiling(&self) -> usize {
        self.ceiling(self.metadata_ratio)
    }
}

/// What went into an assembled context.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextMetrics {
    pub pinned: usize,
    pub relevant: usize,
    pub metadata: bool,
    /// Unreadable notes skipped across all tiers.
    pub skipped: usize,
    pub chars_used: usize,
    pub budget: usize,
}

/// Result of context assembly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextResult {
    pub context: String,
    pub metrics: ContextMetrics,
    /// Ids of notes that contributed text, pinned first.
    pub included_ids: Vec<String>,
}

/// Running output with a character count, so budget checks never rescan.
struct ContextWriter {
    out: String,
    chars: usize,
}

impl ContextWriter {
    fn new() -> Self {
        Self {
            out: String::new(),
            chars: 0,
        }
    }

    /// Characters consumed if a section with `body_chars` were appended now.
    fn cost_of_section(&self, header: &str, body_chars: usize) -> usize {
        let separator = if self.chars == 0 { 0 } else { SECTION_SEPARATOR.len() };
        self.chars + separator + header.chars().count() + 1 + body_chars
    }

    fn push_section(&mut self, header: &str, entries: &[String]) {
        if entries.is_empty() {
            return;
        }
        if !self.out.is_empty() {
            self.out.push_str(SECTION_SEPARATOR);
        }
        self.out.push_str(header);
        self.out.push('\n');
        self.out.push_str(&entries.join(ENTRY_SEPARATOR));
        self.chars = self.out.chars().count();
    }
}

/// Tiered, budget-bounded context builder.
#[derive(Debug, Clone, Default)]
pub struct ContextAssembler {
    budget: ContextBudget,
}

impl ContextAssembler {
    pub fn new(budget: ContextBudget) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> &ContextBudget {
        &self.budget
    }

    /// Read pinned and candidate notes through `source`, then assemble.
    pub fn build_from_source(
        &self,
        query: &str,
        pinned_ids: &[String],
        candidate_ids: &[String],
        source: &dyn NoteSource,
    ) -> ContextResult {
        let pinned = source.read_many(pinned_ids);
        let candidates = source.read_many(candidate_ids);
        self.build(query, &pinned, &candidates)
    }

    /// Assemble context from already-resolved reads.
    ///
    /// Tier 1 holds pinned notes in caller order, smart-truncated. Tier 2
    /// holds keyword-ranked excerpts from the remaining candidates. Tier 3
    /// holds aggregate vault statistics. Each tier is bounded by its
    /// cumulative ceiling, so the output never exceeds `total_chars`.
    pub fn build(&self, query: &str, pinned: &[NoteRead], candidates: &[NoteRead]) -> ContextResult {
        let mut writer = ContextWriter::new();
        let mut metrics = ContextMetrics {
            budget: self.budget.total_chars,
            ..ContextMetrics::default()
        };
        let mut included_ids = Vec::new();

        let pinned_notes = readable(pinned, "pinned", &mut metrics);
        let candidate_notes = readable(candidates, "candidate", &mut metrics);

        // Tier 1: pinned
        let ceiling = self.budget.pinned_ceiling();
        let mut entries: Vec<String> = Vec::new();
        let mut body_chars = 0usize;
        let mut seen_pinned: HashSet<&str> = HashSet::new();
        for note in &pinned_notes {
            if !seen_pinned.insert(note.id.as_str()) {
                continue;
            }
            let separator = if entries.is_empty() { 0 } else { ENTRY_SEPARATOR.len() };
            let label = entry_label(note);
            let fixed = writer.cost_of_section(PINNED_HEADER, body_chars + separator)
                + label.chars().count()
                + ELLIPSIS_CHARS;
            if fixed >= ceiling {
                break;
            }
            let cap = self.budget.pinned_doc_cap.min(ceiling - fixed);
            let entry = format!("{label}{}", smart_truncate(&note.body, cap));
            body_chars += separator + entry.chars().count();
            entries.push(entry);
            included_ids.push(note.id.clone());
        }
        metrics.pinned = entries.len();
        writer.push_section(PINNED_HEADER, &entries);
        tracing::debug!(notes = metrics.pinned, chars = writer.chars, ceiling, "pinned tier");

        // Tier 2: relevant
        let ceiling = self.budget.relevant_ceiling();
        let keywords = query_keywords(query);
        let pinned_ids: HashSet<&str> = pinned_notes.iter().map(|n| n.id.as_str()).collect();
        let mut entries: Vec<String> = Vec::new();
        let mut body_chars = 0usize;
        for note in rank_by_keywords(&candidate_notes, &keywords, &pinned_ids)
            .into_iter()
            .take(self.budget.max_relevant)
        {
            let separator = if entries.is_empty() { 0 } else { ENTRY_SEPARATOR.len() };
            let excerpt = extract_relevant_excerpt(&note.body, &keywords, self.budget.excerpt_cap);
            let entry = format!("{}{excerpt}", entry_label(note));
            let entry_chars = entry.chars().count();
            if writer.cost_of_section(RELEVANT_HEADER, body_chars + separator + entry_chars) > ceiling {
                break;
            }
            body_chars += separator + entry_chars;
            entries.push(entry);
            included_ids.push(note.id.clone());
        }
        metrics.relevant = entries.len();
        writer.push_section(RELEVANT_HEADER, &entries);
        tracing::debug!(notes = metrics.relevant, chars = writer.chars, ceiling, "relevant tier");

        // Tier 3: metadata
        let ceiling = self.budget.metadata_ceiling();
        if writer.chars < ceiling
            && let Some(stats) = vault_stats(&pinned_notes, &candidate_notes)
            && writer.cost_of_section(METADATA_HEADER, stats.chars().count()) <= ceiling
        {
            writer.push_section(METADATA_HEADER, &[stats]);
            metrics.metadata = true;
        }

        metrics.chars_used = writer.chars;
        ContextResult {
            context: writer.out,
            metrics,
            included_ids,
        }
    }
}

/// Assemble context under `total_budget_chars` with default tier settings.
pub fn build_context(
    query: &str,
    pinned: &[NoteRead],
    candidates: &[NoteRead],
    total_budget_chars: usize,
) -> String {
    ContextAssembler::new(ContextBudget::with_total(total_budget_chars))
        .build(query, pinned, candidates)
        .context
}

fn readable<'a>(reads: &'a [NoteRead], tier: &str, metrics: &mut ContextMetrics) -> Vec<&'a Note> {
    let mut notes = Vec::with_capacity(reads.len());
    for read in reads {
        match read {
            Ok(note) => notes.push(note),
            Err(e) => {
                tracing::warn!("skipping {tier} note: {e}");
                metrics.skipped += 1;
            }
        }
    }
    notes
}

fn entry_label(note: &Note) -> String {
    format!("## {}\n", note.title)
}

/// `3 × title hits + 1 × body hits` over the query keywords.
pub fn keyword_score(note: &Note, keywords: &[String]) -> usize {
    let title = note.title.to_lowercase();
    let body = note.body.to_lowercase();
    keywords
        .iter()
        .map(|kw| {
            let mut score = 0;
            if title.contains(kw.as_str()) {
                score += TITLE_MATCH_WEIGHT;
            }
            if body.contains(kw.as_str()) {
                score += BODY_MATCH_WEIGHT;
            }
            score
        })
        .sum()
}

/// Candidates with a positive keyword score, best first, excluding pinned ids
/// and duplicate ids. Ties keep input order.
fn rank_by_keywords<'a>(
    candidates: &[&'a Note],
    keywords: &[String],
    exclude: &HashSet<&str>,
) -> Vec<&'a Note> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut scored: Vec<(usize, &Note)> = candidates
        .iter()
        .filter(|n| !exclude.contains(n.id.as_str()) && seen.insert(n.id.as_str()))
        .map(|n| (keyword_score(n, keywords), *n))
        .filter(|(score, _)| *score > 0)
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, n)| n).collect()
}

fn vault_stats(pinned: &[&Note], candidates: &[&Note]) -> Option<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut notes = 0usize;
    let mut words = 0usize;
    let mut last_modified = 0u64;
    for note in pinned.iter().chain(candidates) {
        if seen.insert(note.id.as_str()) {
            notes += 1;
            words += note.word_count();
            last_modified = last_modified.max(note.modified);
        }
    }
    if notes == 0 {
        return None;
    }
    let average = (words as f64 / notes as f64).round() as usize;
    let mut stats =
        format!("Total notes: {notes}\nTotal words: {words}\nAverage words per note: {average}");
    // 0 means the source does not track modification times
    if last_modified > 0 {
        stats.push_str(&format!("\nLast modified: {last_modified}"));
    }
    Some(stats)
}

/// Truncate text to about `cap` characters on paragraph boundaries.
///
/// Whole paragraphs are kept while they fit. If the first paragraph alone is
/// longer than `cap`, the result is its first `cap` characters plus
/// [`ELLIPSIS`]. Otherwise, when more than 100 characters of room remain, the
/// next paragraph is cut to fill that room and marked with [`ELLIPSIS`].
/// The result is at most `cap + 3` characters.
pub fn smart_truncate(text: &str, cap: usize) -> String {
    if text.chars().count() <= cap {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0usize;
    for paragraph in split_paragraphs(text) {
        let separator = if out.is_empty() { 0 } else { PARAGRAPH_SEPARATOR.len() };
        let len = paragraph.chars().count();

        if used + separator + len <= cap {
            if separator > 0 {
                out.push_str(PARAGRAPH_SEPARATOR);
            }
            out.push_str(paragraph);
            used += separator + len;
            continue;
        }

        if out.is_empty() {
            return format!("{}{ELLIPSIS}", char_prefix(paragraph, cap));
        }

        let room = cap.saturating_sub(used + separator);
        if room > PARTIAL_PARAGRAPH_MIN_ROOM {
            out.push_str(PARAGRAPH_SEPARATOR);
            out.push_str(char_prefix(paragraph, room));
            out.push_str(ELLIPSIS);
        }
        break;
    }
    out
}

/// Pick the sentences of `text` that mention the most keywords.
///
/// Sentences are ranked by keyword hits (ties in text order) and joined while
/// they fit in `cap` characters. Falls back to a plain prefix of the text
/// when no sentence mentions a keyword.
pub fn extract_relevant_excerpt(text: &str, keywords: &[String], cap: usize) -> String {
    let mut scored: Vec<(usize, &str)> = split_sentences(text)
        .into_iter()
        .map(|sentence| {
            let lowered = sentence.to_lowercase();
            let hits = keywords
                .iter()
                .filter(|kw| lowered.contains(kw.as_str()))
                .count();
            (hits, sentence)
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let mut out = String::new();
    let mut used = 0usize;
    for (hits, sentence) in scored {
        if hits == 0 {
            break;
        }
        let separator = if out.is_empty() { 0 } else { 1 };
        let len = sentence.chars().count();
        if used + separator + len > cap {
            break;
        }
        if separator > 0 {
            out.push(' ');
        }
        out.push_str(sentence);
        used += separator + len;
    }

    if out.is_empty() {
        return char_prefix(text.trim(), cap).to_string();
    }
    out
}
