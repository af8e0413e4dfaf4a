//! Heuristic validation of generated creations.
//!
//! Two related checks share this module, both pure and regex-based (no DOM):
//!
//! * [`score_structure`] — a quality score starting at 100 with fixed
//!   penalties per missing structural expectation; documents scoring 60 or
//!   higher count as valid. The retry loop uses this score to keep the best
//!   candidate across attempts.
//! * [`check_playability`] — a pass/fail checklist with hard errors (things
//!   that make the creation unrunnable) and soft warnings (things a good
//!   creation usually has). The hard errors are fed back verbatim into retry
//!   prompts.
//!
//! [`validate`] runs both and merges them into a single [`ValidationReport`];
//! callers that only want one gate can call the named check directly.
//! [`check_card_game`] layers card-specific vocabulary warnings on top of the
//! generic checklist.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref RE_DOCTYPE: Regex = Regex::new(r"(?i)<!doctype\s+html[^>]*>").unwrap();
    static ref RE_HTML_OPEN: Regex = Regex::new(r"(?i)<html[^>]*>").unwrap();
    static ref RE_HTML_CLOSE: Regex = Regex::new(r"(?i)</html\s*>").unwrap();
    static ref RE_HEAD_OPEN: Regex = Regex::new(r"(?i)<head[^>]*>").unwrap();
    static ref RE_BODY_OPEN: Regex = Regex::new(r"(?i)<body[^>]*>").unwrap();
    static ref RE_SCRIPT_OPEN: Regex = Regex::new(r"(?i)<script[^>]*>").unwrap();
    static ref RE_STYLE: Regex = Regex::new(r#"(?i)<style[^>]*>|style\s*="#).unwrap();
    static ref RE_INTERACTIVE: Regex =
        Regex::new(r"(?i)<canvas|<button|addEventListener|onclick\s*=").unwrap();
    static ref RE_GAME_LOOP: Regex =
        Regex::new(r"requestAnimationFrame|setInterval|setTimeout").unwrap();
    static ref RE_STATE: Regex =
        Regex::new(r"(?i)\b(gamestate|state|score|lives|level|board|player)\b").unwrap();
    static ref RE_INIT_FN: Regex = Regex::new(
        r"(?i)function\s+(start|init|setup|main)\b|\b(start|init|setup|main)\s*=\s*(\(|function)|\b(start|init|setup|main)\s*\(\s*\)"
    )
    .unwrap();
    static ref RE_PLACEHOLDER: Regex =
        Regex::new(r"(?i)\bTODO\b|\bFIXME\b|placeholder|your code here").unwrap();
    static ref RE_CARD_VOCAB: Regex = Regex::new(r"(?i)\b(card|deck|hand|suit)s?\b").unwrap();
    static ref RE_CARD_ACTIONS: Regex =
        Regex::new(r"(?i)\b(play|draw|discard|deal|shuffle)\b").unwrap();
}

/// Score threshold at or above which a document counts as structurally valid.
const VALID_SCORE_THRESHOLD: u8 = 60;

/// Result of the penalty-based structural quality score.
#[derive(Clone, Debug)]
pub struct StructureScore {
    pub is_valid: bool,
    /// 0–100, higher is better.
    pub score: u8,
    /// One entry per penalty applied.
    pub issues: Vec<String>,
}

/// Result of the pass/fail playability checklist.
#[derive(Clone, Debug)]
pub struct PlayabilityCheck {
    pub is_valid: bool,
    /// Hard problems: the creation will not run as-is.
    pub errors: Vec<String>,
    /// Soft problems: surfaced to the caller and into retry prompts but do
    /// not fail the check.
    pub warnings: Vec<String>,
}

/// Unified validation record combining the quality score and the checklist.
#[derive(Clone, Debug)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub score: u8,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Score structural quality: start at 100 and subtract a fixed penalty per
/// missing expectation. `is_valid` iff the final score is at least 60.
pub fn score_structure(html: &str) -> StructureScore {
    let mut score: i32 = 100;
    let mut issues = Vec::new();

    let mut penalize = |amount: i32, issue: &str, issues: &mut Vec<String>| {
        score -= amount;
        issues.push(issue.to_string());
    };

    if !RE_DOCTYPE.is_match(html) {
        penalize(5, "missing doctype declaration", &mut issues);
    }
    if !RE_HTML_OPEN.is_match(html) {
        penalize(10, "missing <html> tag", &mut issues);
    }
    if !RE_HTML_CLOSE.is_match(html) {
        penalize(10, "missing closing </html> tag", &mut issues);
    }
    if !RE_HEAD_OPEN.is_match(html) && !RE_STYLE.is_match(html) {
        penalize(5, "missing <head> section and styles", &mut issues);
    }
    if !RE_BODY_OPEN.is_match(html) {
        penalize(10, "missing <body> tag", &mut issues);
    }
    if !RE_SCRIPT_OPEN.is_match(html) {
        penalize(15, "missing <script> tag", &mut issues);
    }
    if html.len() < 200 {
        penalize(20, "document suspiciously short (under 200 characters)", &mut issues);
    }
    if RE_HTML_OPEN.find_iter(html).count() != RE_HTML_CLOSE.find_iter(html).count() {
        penalize(10, "unbalanced <html> open/close tags", &mut issues);
    }
    if !RE_INTERACTIVE.is_match(html) {
        penalize(
            10,
            "no interactive elements (canvas, button, or event handlers)",
            &mut issues,
        );
    }

    let score = score.clamp(0, 100) as u8;
    StructureScore {
        is_valid: score >= VALID_SCORE_THRESHOLD,
        score,
        issues,
    }
}

/// Run the playability checklist: hard errors make `is_valid` false, soft
/// warnings never do.
pub fn check_playability(html: &str) -> PlayabilityCheck {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !RE_DOCTYPE.is_match(html) && !RE_HTML_OPEN.is_match(html) {
        errors.push("missing doctype and <html> tag".to_string());
    }
    if !RE_BODY_OPEN.is_match(html) {
        errors.push("missing <body> section".to_string());
    }
    if !RE_SCRIPT_OPEN.is_match(html) {
        errors.push("missing JavaScript: no <script> tag found".to_string());
    }
    if RE_HTML_OPEN.is_match(html) && !RE_HTML_CLOSE.is_match(html) {
        errors.push("unterminated <html> tag".to_string());
    }

    if !RE_HEAD_OPEN.is_match(html) {
        warnings.push("missing <head> section".to_string());
    }
    if !RE_STYLE.is_match(html) {
        warnings.push("no styling found (<style> tag or inline styles)".to_string());
    }
    if !RE_GAME_LOOP.is_match(html) {
        warnings.push(
            "no game loop construct found (requestAnimationFrame or setInterval)".to_string(),
        );
    }
    if !RE_STATE.is_match(html) {
        warnings.push("no state-management identifiers found".to_string());
    }
    if !RE_INIT_FN.is_match(html) {
        warnings.push("no start/init function found".to_string());
    }
    if RE_PLACEHOLDER.is_match(html) {
        warnings.push("leftover TODO/FIXME/placeholder markers".to_string());
    }
    if html.len() < 500 {
        warnings.push("code is very short (under 500 characters)".to_string());
    }

    PlayabilityCheck {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Card-game variant: the generic checklist plus vocabulary checks for card
/// nouns and play/draw/discard interactions, surfaced as extra warnings.
pub fn check_card_game(html: &str) -> PlayabilityCheck {
    let mut check = check_playability(html);
    if !RE_CARD_VOCAB.is_match(html) {
        check
            .warnings
            .push("no card/deck/hand vocabulary found".to_string());
    }
    if !RE_CARD_ACTIONS.is_match(html) {
        check
            .warnings
            .push("no play/draw/discard interactions found".to_string());
    }
    check
}

/// Run both checks and merge them into one [`ValidationReport`].
///
/// `is_valid` requires both gates to pass; `errors` come from the checklist,
/// `warnings` combine the checklist's soft findings with the score's penalty
/// issues (minus those already reported as errors).
pub fn validate(html: &str) -> ValidationReport {
    let structure = score_structure(html);
    let playability = check_playability(html);

    let mut warnings = playability.warnings;
    for issue in structure.issues {
        if !playability.errors.contains(&issue) && !warnings.contains(&issue) {
            warnings.push(issue);
        }
    }

    ValidationReport {
        is_valid: structure.is_valid && playability.is_valid,
        score: structure.score,
        errors: playability.errors,
        warnings,
    }
}
