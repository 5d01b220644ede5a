use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

const PASSAGE_MARKER: &str = ":: ";
pub const FALLBACK_BUCKET: &str = "99_Uncategorized";

/// One topic bucket with the title keywords that route passages into it.
/// Rule order is priority order: a title matching several rules goes to
/// the first one listed.
#[derive(Debug, Clone, Deserialize)]
pub struct SplitRule {
    pub bucket: String,
    pub keywords: Vec<String>,
}

/// Built-in topic table for the Aztec story source.
pub fn default_rules() -> Vec<SplitRule> {
    let table: &[(&str, &[&str])] = &[
        ("00_Setup", &["StoryTitle", "StoryData", "Story Stylesheet", "Story JavaScript"]),
        ("01_Aguilar", &["Aguilar"]),
        ("02_Cortes", &["Cortes"]),
        ("03_Moctezuma", &["Moctezuma"]),
        ("04_Aztec", &["Aztec", "Mexica"]),
        ("05_Spanish", &["Spaniards", "Spanish"]),
        ("06_Tlaxcalan", &["Tlaxcalan"]),
        ("07_Marina", &["Marina"]),
        ("08_Acts", &["Act "]),
        ("09_Library", &["Library"]),
        ("10_Control", &["Control:"]),
        ("11_Dashboard", &["Dashboard"]),
        ("12_Test", &["Test"]),
        ("13_Cholula", &["Cholula"]),
        ("14_Tenochtitlan", &["Tenochtitlan", "Tenochtitlán"]),
        ("15_Veracruz", &["Veracruz"]),
        ("16_Riot", &["Riot"]),
    ];
    table
        .iter()
        .map(|(bucket, keywords)| SplitRule {
            bucket: bucket.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        })
        .collect()
}

/// Load rules from a JSON array of `{ "bucket": ..., "keywords": [...] }`.
/// An array (not a map) so the priority order is explicit in the file.
pub fn load_rules(path: &Path) -> Result<Vec<SplitRule>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read rules file: {}", path.display()))?;
    let rules: Vec<SplitRule> = serde_json::from_str(&text)
        .with_context(|| format!("invalid rules file: {}", path.display()))?;
    Ok(rules)
}

/// Split a document at `:: ` delimiter lines. Returns the preamble (any
/// non-blank content before the first delimiter) and the passages, each
/// with its marker restored.
pub fn split_passages(content: &str) -> (Option<String>, Vec<String>) {
    let mut parts = content.split("\n:: ");
    let first = parts.next().unwrap_or("");

    let mut passages: Vec<String> = Vec::new();
    let preamble = if first.starts_with(PASSAGE_MARKER) {
        // Document opens directly with a passage.
        passages.push(first.to_string());
        None
    } else if first.trim().is_empty() {
        None
    } else {
        Some(first.to_string())
    };

    for part in parts {
        passages.push(format!("{PASSAGE_MARKER}{part}"));
    }

    (preamble, passages)
}

/// Title line of a passage, with the `:: ` marker stripped.
pub fn passage_title(passage: &str) -> &str {
    let first_line = passage.lines().next().unwrap_or("");
    first_line.strip_prefix(PASSAGE_MARKER).unwrap_or(first_line)
}

/// First rule whose keywords match the title, case-insensitively.
pub fn classify<'r>(title: &str, rules: &'r [SplitRule]) -> &'r str {
    let title = title.to_lowercase();
    rules
        .iter()
        .find(|rule| {
            rule.keywords
                .iter()
                .any(|kw| title.contains(&kw.to_lowercase()))
        })
        .map(|rule| rule.bucket.as_str())
        .unwrap_or(FALLBACK_BUCKET)
}

/// Split `content` into buckets, preserving rule order across buckets and
/// encounter order within each. Empty buckets are dropped.
pub fn split_into_buckets(content: &str, rules: &[SplitRule]) -> Vec<(String, Vec<String>)> {
    let (preamble, passages) = split_passages(content);

    let mut buckets: Vec<(String, Vec<String>)> = rules
        .iter()
        .map(|rule| (rule.bucket.clone(), Vec::new()))
        .collect();
    buckets.push((FALLBACK_BUCKET.to_string(), Vec::new()));

    if let Some(preamble) = preamble {
        push_to(&mut buckets, FALLBACK_BUCKET, preamble);
    }
    for passage in passages {
        let bucket = classify(passage_title(&passage), rules).to_string();
        push_to(&mut buckets, &bucket, passage);
    }

    buckets.retain(|(_, list)| !list.is_empty());
    buckets
}

fn push_to(buckets: &mut [(String, Vec<String>)], bucket: &str, passage: String) {
    if let Some((_, list)) = buckets.iter_mut().find(|(name, _)| name == bucket) {
        list.push(passage);
    }
}

/// Write one `<bucket>.twee` per non-empty bucket, passages separated by
/// a blank line. Returns (filename, passage count) pairs for reporting.
pub fn write_buckets(
    out_dir: &Path,
    buckets: &[(String, Vec<String>)],
) -> Result<Vec<(String, usize)>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory: {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(buckets.len());
    for (bucket, passages) in buckets {
        let filename = format!("{bucket}.twee");
        let path = out_dir.join(&filename);
        let mut text = passages.join("\n\n");
        text.push('\n');
        fs::write(&path, text)
            .with_context(|| format!("failed to write: {}", path.display()))?;
        written.push((filename, passages.len()));
    }
    Ok(written)
}

// ── Tests ──
