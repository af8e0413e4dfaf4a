//! Locating a complete HTML document inside arbitrary model output.
//!
//! Model replies arrive as free text: sometimes a clean document, sometimes a
//! markdown-fenced block, sometimes prose-wrapped or truncated fragments. The
//! extractor runs an ordered cascade of strategies; the first one that matches
//! wins and reports a confidence score plus any synthesis it had to perform
//! (missing doctype, missing `<html>` wrapper, reconstruction from fragments).
//!
//! Every strategy is a named pure function returning `Option<StrategyHit>`,
//! so each can be unit-tested and reordered independently. No strategy does
//! I/O and nothing here is random: extraction is a pure function of the input
//! text. A miss across all strategies is a soft failure — empty `html`,
//! confidence `0.0` — never a panic or an error.

use lazy_static::lazy_static;
use regex::Regex;

/// Minimum size for the largest-tag-block fallback to consider a block.
const MIN_BLOCK_LEN: usize = 500;

lazy_static! {
    static ref RE_FENCED_HTML: Regex =
        Regex::new(r"(?s)```html[ \t]*\r?\n?(.*?)```").unwrap();
    static ref RE_FENCED_ANY: Regex =
        Regex::new(r"(?s)```[a-zA-Z0-9+_-]*[ \t]*\r?\n(.*?)```").unwrap();
    static ref RE_DOCTYPE: Regex = Regex::new(r"(?i)<!doctype\s+html[^>]*>").unwrap();
    static ref RE_HTML_OPEN: Regex = Regex::new(r"(?i)<html[^>]*>").unwrap();
    static ref RE_HTML_CLOSE: Regex = Regex::new(r"(?i)</html\s*>").unwrap();
    static ref RE_HEAD_OPEN: Regex = Regex::new(r"(?i)<head[^>]*>").unwrap();
    static ref RE_BODY_OPEN: Regex = Regex::new(r"(?i)<body[^>]*>").unwrap();
    static ref RE_HEAD_BLOCK: Regex = Regex::new(r"(?is)<head[^>]*>.*?</head>").unwrap();
    static ref RE_BODY_BLOCK: Regex = Regex::new(r"(?is)<body[^>]*>.*?</body>").unwrap();
    static ref RE_SCRIPT_BLOCK: Regex = Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap();
    static ref RE_STYLE_BLOCK: Regex = Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap();
    static ref RE_DOC_LEAD_LINE: Regex = Regex::new(r"(?i)^\s*<(?:!doctype|html|head)").unwrap();
    static ref RE_PROSE_LEAD: Regex = Regex::new(
        r"(?i)^(?:sure|certainly|of course|great|here(?:'s| is)|this is|below is|i(?:'ve| have))\b"
    )
    .unwrap();
    static ref RE_ANY_TAG: Regex = Regex::new(r"<[a-zA-Z/][^>]*>").unwrap();
}

/// Outcome of a successful extraction attempt.
#[derive(Clone, Debug)]
pub struct ExtractionResult {
    /// The extracted document; empty when no strategy matched.
    pub html: String,
    /// How trustworthy the match is, in `[0, 1]`.
    pub confidence: f32,
    /// Heuristics applied along the way (synthesized tags, reconstruction).
    pub warnings: Vec<String>,
}

impl ExtractionResult {
    /// True when no strategy matched; callers must check before using `html`.
    pub fn is_empty(&self) -> bool {
        self.html.is_empty()
    }
}

/// A single strategy's successful match.
#[derive(Clone, Debug)]
pub struct StrategyHit {
    pub html: String,
    pub confidence: f32,
    pub warnings: Vec<String>,
}

impl StrategyHit {
    fn clean(html: String, confidence: f32) -> Self {
        StrategyHit {
            html,
            confidence,
            warnings: Vec::new(),
        }
    }
}

/// Byte offset just past the *last* `</html>` in `text`, if any.
fn last_html_close_end(text: &str) -> Option<usize> {
    RE_HTML_CLOSE.find_iter(text).last().map(|m| m.end())
}

/// Prepend a doctype and/or `<html>` wrapper when absent, recording one
/// warning per synthesized piece. Assumes a closing `</html>` already exists
/// or is appended here alongside the wrapper.
fn ensure_document_shell(fragment: &str, warnings: &mut Vec<String>) -> String {
    let mut html = fragment.trim().to_string();

    if !RE_HTML_OPEN.is_match(&html) {
        let close = if RE_HTML_CLOSE.is_match(&html) {
            ""
        } else {
            "\n</html>"
        };
        html = format!("<html>\n{}{}", html, close);
        warnings.push("synthesized missing <html> wrapper".to_string());
    } else if !RE_HTML_CLOSE.is_match(&html) {
        html.push_str("\n</html>");
        warnings.push("synthesized missing </html>".to_string());
    }

    if !RE_DOCTYPE.is_match(&html) {
        html = format!("<!DOCTYPE html>\n{}", html);
        warnings.push("synthesized missing doctype".to_string());
    }

    html
}

// ---------------------------------------------------------------------------
// Strategies, in cascade order
// ---------------------------------------------------------------------------

/// Strategy 1: markdown fenced block explicitly tagged `html`.
pub fn fenced_html_block(content: &str) -> Option<StrategyHit> {
    let captures = RE_FENCED_HTML.captures(content)?;
    let inner = captures.get(1)?.as_str().trim();
    if inner.is_empty() {
        return None;
    }
    Some(StrategyHit::clean(inner.to_string(), 0.95))
}

/// Strategy 2: any fenced block whose content is itself a document (doctype,
/// or a balanced `<html>...</html>` pair).
pub fn fenced_any_block(content: &str) -> Option<StrategyHit> {
    for captures in RE_FENCED_ANY.captures_iter(content) {
        let inner = captures.get(1)?.as_str().trim();
        if inner.is_empty() {
            continue;
        }
        let has_doctype = RE_DOCTYPE.is_match(inner);
        let has_pair = RE_HTML_OPEN.is_match(inner) && RE_HTML_CLOSE.is_match(inner);
        if has_doctype || has_pair {
            return Some(StrategyHit::clean(inner.to_string(), 0.90));
        }
    }
    None
}

/// Strategy 3: raw text containing a doctype followed eventually by a closing
/// `</html>`. The most reliable signal of all, hence the top confidence.
pub fn doctype_to_close(content: &str) -> Option<StrategyHit> {
    let start = RE_DOCTYPE.find(content)?.start();
    let end = last_html_close_end(content)?;
    if end <= start {
        return None;
    }
    Some(StrategyHit::clean(content[start..end].to_string(), 0.98))
}

/// Strategy 4: a raw `<html>...</html>` pair without a doctype; the doctype
/// is synthesized.
pub fn html_pair_without_doctype(content: &str) -> Option<StrategyHit> {
    let start = RE_HTML_OPEN.find(content)?.start();
    let end = last_html_close_end(content)?;
    if end <= start {
        return None;
    }
    Some(StrategyHit {
        html: format!("<!DOCTYPE html>\n{}", &content[start..end]),
        confidence: 0.85,
        warnings: vec!["synthesized missing doctype".to_string()],
    })
}

/// Strategy 5: an HTML-ish fragment — starts with a tag, carries head/body
/// markers and a closing `</html>`, but may lack the doctype and/or `<html>`
/// wrapper.
pub fn htmlish_fragment(content: &str) -> Option<StrategyHit> {
    let trimmed = content.trim();
    if !trimmed.starts_with('<') {
        return None;
    }
    if !RE_HEAD_OPEN.is_match(trimmed) && !RE_BODY_OPEN.is_match(trimmed) {
        return None;
    }
    let end = last_html_close_end(trimmed)?;
    let fragment = &trimmed[..end];

    let mut warnings = Vec::new();
    let html = ensure_document_shell(fragment, &mut warnings);
    Some(StrategyHit {
        html,
        confidence: 0.80,
        warnings,
    })
}

/// Strategy 6: line-scan fallback — slice from the first document-opening
/// line to the last line containing `</html>`.
pub fn line_scan(content: &str) -> Option<StrategyHit> {
    let lines: Vec<&str> = content.lines().collect();
    let first = lines.iter().position(|line| RE_DOC_LEAD_LINE.is_match(line))?;
    let last = lines
        .iter()
        .rposition(|line| RE_HTML_CLOSE.is_match(line))?;
    if last < first {
        return None;
    }
    Some(StrategyHit::clean(lines[first..=last].join("\n"), 0.75))
}

/// Strategy 7: strip markdown headings and leading explanation sentences,
/// then retry the doctype / html-pair match on the cleaned text.
pub fn stripped_explanation(content: &str) -> Option<StrategyHit> {
    let mut kept: Vec<&str> = Vec::new();
    let mut in_preamble = true;
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            continue;
        }
        if in_preamble {
            if trimmed.is_empty() || RE_PROSE_LEAD.is_match(trimmed) {
                continue;
            }
            in_preamble = false;
        }
        kept.push(line);
    }
    let cleaned = kept.join("\n");
    if cleaned == content {
        return None;
    }

    if let Some(start) = RE_DOCTYPE.find(&cleaned).map(|m| m.start()) {
        if let Some(end) = last_html_close_end(&cleaned) {
            if end > start {
                return Some(StrategyHit::clean(cleaned[start..end].to_string(), 0.70));
            }
        }
    }
    let start = RE_HTML_OPEN.find(&cleaned)?.start();
    let end = last_html_close_end(&cleaned)?;
    if end <= start {
        return None;
    }
    Some(StrategyHit {
        html: format!("<!DOCTYPE html>\n{}", &cleaned[start..end]),
        confidence: 0.70,
        warnings: vec!["synthesized missing doctype".to_string()],
    })
}

/// Marker pairs some models invent when asked for "just the code".
const CUSTOM_MARKERS: &[(&str, &str)] = &[
    ("<start-html>", "</end-html>"),
    ("<START_HTML>", "<END_HTML>"),
    ("[HTML]", "[/HTML]"),
    ("---HTML---", "---END HTML---"),
];

/// Strategy 8: bespoke marker wrappers around the document.
pub fn custom_markers(content: &str) -> Option<StrategyHit> {
    for (open, close) in CUSTOM_MARKERS {
        let start = match content.find(open) {
            Some(pos) => pos + open.len(),
            None => continue,
        };
        let end = match content[start..].find(close) {
            Some(pos) => start + pos,
            None => continue,
        };
        let inner = content[start..end].trim();
        if inner.is_empty() {
            continue;
        }
        let mut warnings = Vec::new();
        let html = ensure_document_shell(inner, &mut warnings);
        return Some(StrategyHit {
            html,
            confidence: 0.65,
            warnings,
        });
    }
    None
}

/// Strategy 9: the largest contiguous tag-containing block (blank-line
/// separated) over the minimum length threshold, wrapped into a document.
pub fn largest_tag_block(content: &str) -> Option<StrategyHit> {
    let best = content
        .split("\n\n")
        .filter(|block| block.len() >= MIN_BLOCK_LEN)
        .filter(|block| RE_ANY_TAG.is_match(block))
        .max_by_key(|block| block.len())?;

    let mut warnings = vec!["extracted largest tag-containing block".to_string()];
    let html = ensure_document_shell(best, &mut warnings);
    Some(StrategyHit {
        html,
        confidence: 0.60,
        warnings,
    })
}

/// Strategy 10: last-resort reconstruction — splice whatever `<head>`,
/// `<body>`, `<script>`, and `<style>` fragments exist into a fresh skeleton.
pub fn reconstruct_from_fragments(content: &str) -> Option<StrategyHit> {
    let has_any = RE_SCRIPT_BLOCK.is_match(content)
        || RE_STYLE_BLOCK.is_match(content)
        || RE_BODY_OPEN.is_match(content);
    if !has_any {
        return None;
    }

    let head_inner = RE_HEAD_BLOCK.find(content).map(|m| m.as_str().to_string());
    let body_inner = RE_BODY_BLOCK.find(content).map(|m| m.as_str().to_string());

    let mut head_section = String::new();
    match head_inner {
        Some(head) => head_section.push_str(&head),
        None => {
            head_section.push_str("<head>\n<meta charset=\"utf-8\">\n<title>Creation</title>\n");
            for style in RE_STYLE_BLOCK.find_iter(content) {
                head_section.push_str(style.as_str());
                head_section.push('\n');
            }
            head_section.push_str("</head>");
        }
    }

    let mut body_section = String::new();
    match body_inner {
        Some(body) => body_section.push_str(&body),
        None => {
            body_section.push_str("<body>\n");
            for script in RE_SCRIPT_BLOCK.find_iter(content) {
                body_section.push_str(script.as_str());
                body_section.push('\n');
            }
            body_section.push_str("</body>");
        }
    }

    Some(StrategyHit {
        html: format!(
            "<!DOCTYPE html>\n<html>\n{}\n{}\n</html>",
            head_section, body_section
        ),
        confidence: 0.50,
        warnings: vec!["document reconstructed from loose fragments".to_string()],
    })
}

/// Extract the most plausible complete HTML document from arbitrary text.
///
/// Strategies are mutually exclusive by priority: the cascade runs in order
/// and the first hit returns immediately. When nothing matches the result is
/// a soft failure (`html` empty, confidence `0.0`) — never an error.
pub fn extract(content: &str) -> ExtractionResult {
    let strategies: &[fn(&str) -> Option<StrategyHit>] = &[
        fenced_html_block,
        fenced_any_block,
        doctype_to_close,
        html_pair_without_doctype,
        htmlish_fragment,
        line_scan,
        stripped_explanation,
        custom_markers,
        largest_tag_block,
        reconstruct_from_fragments,
    ];

    for strategy in strategies {
        if let Some(hit) = strategy(content) {
            log::debug!(
                "playforge::extract(...): matched with confidence {:.2}, {} warning(s)",
                hit.confidence,
                hit.warnings.len()
            );
            return ExtractionResult {
                html: hit.html,
                confidence: hit.confidence,
                warnings: hit.warnings,
            };
        }
    }

    ExtractionResult {
        html: String::new(),
        confidence: 0.0,
        warnings: vec!["extraction failed: no HTML content found".to_string()],
    }
}
