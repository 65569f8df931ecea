use crate::text::char_len;
use crate::types::OutlineSection;

/// Sentence-terminal punctuation recognized by the splitter.
const TERMINALS: [char; 6] = ['.', '!', '?', '。', '？', '！'];

/// Lexical indicators for heading candidates, matched as a
/// case-insensitive prefix.
const HEADING_INDICATORS: [&str; 10] = [
    "what is",
    "what are",
    "what",
    "definition",
    "process",
    "example",
    "application",
    "summary",
    "key points",
    "conclusion",
];

const MAX_SECTIONS: usize = 8;
const MAX_BULLETS: usize = 8;
const FALLBACK_PARAGRAPHS: usize = 6;
const FALLBACK_BULLETS: usize = 6;

/// Split text into trimmed, non-empty sentences. A sentence ends at
/// terminal punctuation followed by whitespace, or at a newline.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            flush(&mut sentences, &mut current);
            continue;
        }
        current.push(c);
        if TERMINALS.contains(&c) && chars.peek().is_some_and(|n| n.is_whitespace()) {
            flush(&mut sentences, &mut current);
        }
    }
    flush(&mut sentences, &mut current);
    sentences
}

fn flush(sentences: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

/// Heading heuristic: short sentences that look interrogative,
/// definitional, or summary-like. Plain declaratives ending in a full
/// stop never qualify through the short-sentence clause alone.
pub fn is_heading(sentence: &str) -> bool {
    if char_len(sentence) >= 100 {
        return false;
    }
    let lower = sentence.to_lowercase();
    HEADING_INDICATORS.iter().any(|kw| lower.starts_with(kw))
        || sentence.contains('?')
        || sentence.ends_with(':')
        || (char_len(sentence) < 60
            && sentence.split_whitespace().count() < 12
            && !sentence.ends_with('.'))
}

/// Split on blank-line boundaries into trimmed, non-empty paragraphs.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            push_paragraph(&mut paragraphs, &mut current);
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }
    push_paragraph(&mut paragraphs, &mut current);
    paragraphs
}

fn push_paragraph(paragraphs: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        paragraphs.push(trimmed.to_string());
    }
    current.clear();
}

/// Derive an ordered outline from a flat transcript.
///
/// Pure and deterministic: identical input yields byte-identical
/// sections, which the position projector depends on. A heading
/// candidate opens a new section; other sentences accumulate as
/// bullets (capped per section). When fewer than two sections result,
/// the sentence walk is discarded for a paragraph-based outline.
pub fn synthesize(transcript: &str) -> Vec<OutlineSection> {
    let sentences = split_sentences(transcript);
    if sentences.is_empty() {
        return Vec::new();
    }

    let mut outline: Vec<OutlineSection> = Vec::new();
    let mut current: Option<OutlineSection> = None;

    for sentence in &sentences {
        if is_heading(sentence) {
            if let Some(section) = current.take() {
                outline.push(section);
            }
            current = Some(OutlineSection {
                heading: sentence.clone(),
                bullets: Vec::new(),
            });
        } else if let Some(section) = current.as_mut() {
            if section.bullets.len() < MAX_BULLETS {
                section.bullets.push(sentence.clone());
            }
        } else {
            // The first sentence opens a section even when it is not
            // a heading candidate.
            current = Some(OutlineSection {
                heading: sentence.clone(),
                bullets: Vec::new(),
            });
        }
    }
    if let Some(section) = current.take() {
        outline.push(section);
    }

    if outline.len() < 2 {
        let paragraphs = split_paragraphs(transcript);
        if !paragraphs.is_empty() {
            outline.clear();
            for para in paragraphs.iter().take(FALLBACK_PARAGRAPHS) {
                let mut sents = split_sentences(para);
                if sents.is_empty() {
                    continue;
                }
                let heading = sents.remove(0);
                sents.truncate(FALLBACK_BULLETS);
                outline.push(OutlineSection {
                    heading,
                    bullets: sents,
                });
            }
        }
    }

    outline.truncate(MAX_SECTIONS);
    outline
}

/// Serialize sections into the canonical flattened outline string:
/// `heading + "\n" + bullets.join("\n")` per section, sections joined
/// by a blank line. Outline highlights are anchored to this string
/// and nothing else.
pub fn flatten_outline(sections: &[OutlineSection]) -> String {
    sections
        .iter()
        .map(|s| {
            if s.bullets.is_empty() {
                s.heading.clone()
            } else {
                format!("{}\n{}", s.heading, s.bullets.join("\n"))
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
