//! Pattern-based answer structuring, the no-provider fallback path.
//!
//! Given retrieved passages, each answer field is derived independently by a
//! fixed battery of matchers over the concatenated passage text: regex
//! families for steps, timings, and mantras, and a keyword vocabulary for
//! materials. This is best-effort text mining, not parsing — there is no
//! deduplication across families and no verification that, say, an extracted
//! step really belongs to the queried rite. The output is informational, not
//! authoritative.
//!
//! The whole module is a pure function of its inputs: the same passages always
//! produce the same answer.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::retrieval::ScoredPassage;

/// Ritual items looked up verbatim (case-insensitive) in the retrieved text.
const MATERIAL_KEYWORDS: [&str; 18] = [
    "incense",
    "flowers",
    "coconut",
    "banana",
    "ghee",
    "kumkum",
    "chandan",
    "kalash",
    "diya",
    "camphor",
    "sweets",
    "fruits",
    "rice",
    "water",
    "mango leaves",
    "tulsi",
    "betel leaves",
    "betel nuts",
];

/// Topics covered by the known corpus, named in the not-found answer.
const KNOWN_TOPICS: [&str; 5] = [
    "Sai Divya Pooja",
    "Siva Puranam",
    "Lakshmi Puja",
    "Chandi",
    "Durga Puja",
];

/// Generic external-product reference attached to every material hit.
const PRODUCT_REFERENCE: &str = "https://www.amazon.in";

const MAX_STEPS_PER_FAMILY: usize = 5;
const SUMMARY_EXCERPT_CHARS: usize = 300;
const SNIPPET_CHARS: usize = 200;
const SOURCE_LIMIT: usize = 3;

static STEP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile([
        r"\d+\.\s*[^.]*\.",
        r"(?i)step\s*\d+[^.]*\.",
        r"(?i)first[^.]*\.",
        r"(?i)second[^.]*\.",
        r"(?i)third[^.]*\.",
        r"(?i)then[^.]*\.",
        r"(?i)next[^.]*\.",
        r"(?i)after[^.]*\.",
    ])
});

static TIMING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile([
        r"(?i)morning[^.]*\.",
        r"(?i)evening[^.]*\.",
        r"(?i)sunrise[^.]*\.",
        r"(?i)sunset[^.]*\.",
        r"(?i)brahma muhurta[^.]*\.",
        r"(?i)amavasya[^.]*\.",
        r"(?i)purnima[^.]*\.",
    ])
});

static MANTRA_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile([
        r"ॐ[^।]*।",
        r"(?i)om[^.]*\.",
        r"(?i)namah[^.]*\.",
        r"(?i)swaha[^.]*\.",
    ])
});

fn compile<const N: usize>(patterns: [&str; N]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|pattern| Regex::new(pattern).expect("heuristic pattern is valid"))
        .collect()
}

/// One extracted procedure step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepInstruction {
    pub title: String,
    pub instruction: String,
}

/// One recognized ritual material with a generic product reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MaterialItem {
    pub name: String,
    pub product_match: String,
}

/// A cited passage: which book, where in it, and a short excerpt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SourceRef {
    pub book: String,
    pub seq_index: usize,
    pub snippet: String,
}

/// Heuristic-path output. Fields are derived independently and are not
/// guaranteed to be mutually consistent.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StructuredAnswer {
    pub summary: String,
    pub steps: Vec<StepInstruction>,
    pub materials: Vec<MaterialItem>,
    pub timings: Vec<String>,
    pub mantras: Vec<String>,
    pub sources: Vec<SourceRef>,
    pub notes: String,
}

/// Derive a [`StructuredAnswer`] from retrieved passages.
///
/// With no passages, returns a canned not-found answer naming the known
/// corpus topics.
pub fn structure_answer(query: &str, results: &[ScoredPassage]) -> StructuredAnswer {
    if results.is_empty() {
        return not_found_answer(query);
    }

    let all_content = results
        .iter()
        .map(|result| result.passage.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let lowered = all_content.to_lowercase();

    let mut steps = Vec::new();
    for pattern in STEP_PATTERNS.iter() {
        for found in pattern
            .find_iter(&all_content)
            .take(MAX_STEPS_PER_FAMILY)
        {
            steps.push(StepInstruction {
                title: format!("Step {}", steps.len() + 1),
                instruction: found.as_str().trim().to_string(),
            });
        }
    }

    let materials = MATERIAL_KEYWORDS
        .iter()
        .filter(|keyword| lowered.contains(&keyword.to_lowercase()))
        .map(|keyword| MaterialItem {
            name: title_case(keyword),
            product_match: PRODUCT_REFERENCE.to_string(),
        })
        .collect();

    let timings = collect_matches(&TIMING_PATTERNS, &all_content);
    let mantras = collect_matches(&MANTRA_PATTERNS, &all_content);

    let sources = results
        .iter()
        .take(SOURCE_LIMIT)
        .map(|result| SourceRef {
            book: result.passage.book.clone(),
            seq_index: result.passage.seq_index,
            snippet: ellipsized(&result.passage.content, SNIPPET_CHARS),
        })
        .collect();

    let mut cited_books: Vec<&str> = Vec::new();
    for result in results {
        let book = result.passage.book.as_str();
        if !cited_books.contains(&book) {
            cited_books.push(book);
        }
    }

    StructuredAnswer {
        summary: format!(
            "Information about {query} based on authentic texts: {}",
            ellipsized(&all_content, SUMMARY_EXCERPT_CHARS)
        ),
        steps,
        materials,
        timings,
        mantras,
        sources,
        notes: format!(
            "This information is extracted from authentic texts: {}. \
             Please consult with learned priests for proper guidance.",
            cited_books.join(", ")
        ),
    }
}

fn not_found_answer(query: &str) -> StructuredAnswer {
    StructuredAnswer {
        summary: format!("Information about {query} was not found in the available books."),
        steps: Vec::new(),
        materials: Vec::new(),
        timings: Vec::new(),
        mantras: Vec::new(),
        sources: Vec::new(),
        notes: format!(
            "Please check the spelling or try a different query. \
             The available books contain information about {}.",
            KNOWN_TOPICS.join(", ")
        ),
    }
}

fn collect_matches(patterns: &[Regex], text: &str) -> Vec<String> {
    patterns
        .iter()
        .flat_map(|pattern| pattern.find_iter(text))
        .map(|found| found.as_str().trim().to_string())
        .collect()
}

fn ellipsized(text: &str, max_chars: usize) -> String {
    let mut excerpt: String = text.chars().take(max_chars).collect();
    excerpt.push_str("...");
    excerpt
}

fn title_case(keyword: &str) -> String {
    keyword
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::PassageRecord;

    fn scored(book: &str, seq: usize, content: &str, relevance: f32) -> ScoredPassage {
        ScoredPassage {
            passage: PassageRecord::new(format!("{book}_{seq}"), book, seq, content),
            relevance,
        }
    }

    #[test]
    fn empty_results_yield_canned_answer() {
        let answer = structure_answer("ganesh puja", &[]);
        assert!(answer.summary.contains("was not found"));
        assert!(answer.steps.is_empty());
        assert!(answer.notes.contains("Lakshmi Puja"));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let results = vec![
            scored("durga.pdf", 0, "1. Light the diya at sunrise. Then offer flowers.", 0.9),
            scored("durga.pdf", 4, "Om namah shivaya. Offer coconut and rice in the morning.", 0.8),
        ];
        let first = structure_answer("durga puja", &results);
        let second = structure_answer("durga puja", &results);
        assert_eq!(first, second);
    }

    #[test]
    fn materials_match_case_insensitively() {
        let results = vec![scored("a.pdf", 0, "Keep GHEE and Kumkum ready.", 0.5)];
        let answer = structure_answer("puja", &results);
        let names: Vec<&str> = answer.materials.iter().map(|m| m.name.as_str()).collect();
        assert!(names.contains(&"Ghee"));
        assert!(names.contains(&"Kumkum"));
        for material in &answer.materials {
            assert_eq!(material.product_match, "https://www.amazon.in");
        }
    }

    #[test]
    fn step_families_cap_at_five_each() {
        let text = (1..=9)
            .map(|i| format!("{i}. Do thing number {i}."))
            .collect::<Vec<_>>()
            .join(" ");
        let results = vec![scored("a.pdf", 0, &text, 0.5)];
        let answer = structure_answer("puja", &results);
        // Only the numbered-list family matches this text.
        assert_eq!(answer.steps.len(), 5);
        assert_eq!(answer.steps[0].title, "Step 1");
        assert_eq!(answer.steps[4].title, "Step 5");
    }

    #[test]
    fn devanagari_mantras_are_found() {
        let results = vec![scored("siva.pdf", 2, "Recite ॐ नमः शिवाय। before the offering.", 0.5)];
        let answer = structure_answer("siva puja", &results);
        assert!(answer.mantras.iter().any(|m| m.starts_with('ॐ')));
    }

    #[test]
    fn sources_take_top_three_with_bounded_snippets() {
        let long = "word ".repeat(100);
        let results: Vec<ScoredPassage> = (0..5)
            .map(|i| scored("book.pdf", i, &long, 1.0 - i as f32 * 0.1))
            .collect();
        let answer = structure_answer("puja", &results);
        assert_eq!(answer.sources.len(), 3);
        for source in &answer.sources {
            assert!(source.snippet.chars().count() <= 203);
            assert!(source.snippet.ends_with("..."));
        }
        assert_eq!(answer.sources[0].seq_index, 0);
    }

    #[test]
    fn timing_cues_are_collected_verbatim() {
        let results = vec![scored(
            "a.pdf",
            0,
            "Perform this on purnima evening. Begin at sunrise for best results.",
            0.5,
        )];
        let answer = structure_answer("puja", &results);
        assert!(answer.timings.iter().any(|t| t.contains("purnima")));
        assert!(answer.timings.iter().any(|t| t.contains("sunrise")));
    }
}
