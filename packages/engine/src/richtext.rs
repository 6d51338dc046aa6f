//! Rich-text normalization for lawyer-authored clauses
//!
//! Manually drafted clauses arrive as a constrained HTML-like markup
//! (paragraphs, line breaks, bold/italic/underline emphasis, lists) from
//! the form's rich-text editor. Templates consume them in one of two
//! shapes:
//! - **plain with breaks** — block elements and explicit breaks become
//!   newlines, lists lose their bullets;
//! - **styled runs** — text nodes become runs carrying the emphasis
//!   state accumulated from ancestor tags.
//!
//! The markup is normalized to XML (void tags closed, entities
//! substituted) and parsed with `roxmltree`. A parse failure must never
//! crash a generation that is otherwise fine: the fallback extracts the
//! plain text and emits it as a single unformatted run.

use crate::config;
use crate::types::StyledRun;
use regex::Regex;
use std::sync::OnceLock;

/// Output shape requested by the template slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeMode {
    PlainWithBreaks,
    StyledRuns,
}

/// Normalized clause text.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedText {
    Plain(String),
    Runs(Vec<StyledRun>),
}

impl NormalizedText {
    /// True when nothing renderable was produced.
    pub fn is_empty(&self) -> bool {
        match self {
            NormalizedText::Plain(s) => s.is_empty(),
            NormalizedText::Runs(runs) => runs.is_empty(),
        }
    }
}

/// Emphasis state inherited from ancestor tags.
#[derive(Debug, Clone, Copy, Default)]
struct Emphasis {
    bold: bool,
    italic: bool,
    underline: bool,
}

impl Emphasis {
    fn with_tag(self, tag: &str) -> Self {
        Self {
            bold: self.bold || matches!(tag, "b" | "strong"),
            italic: self.italic || matches!(tag, "i" | "em"),
            underline: self.underline || tag == "u",
        }
    }
}

/// Normalize clause markup into the requested shape.
///
/// Never fails: unparseable or oversized markup falls back to its plain
/// extracted text.
pub fn normalize(markup: &str, mode: NormalizeMode) -> NormalizedText {
    if markup.trim().is_empty() {
        return match mode {
            NormalizeMode::PlainWithBreaks => NormalizedText::Plain(String::new()),
            NormalizeMode::StyledRuns => NormalizedText::Runs(Vec::new()),
        };
    }

    if markup.len() > config::MAX_MARKUP_SIZE {
        tracing::warn!(
            size = markup.len(),
            "Markup exceeds size limit, extracting plain text"
        );
        return fallback(markup, mode);
    }

    let wrapped = format!("<root>{}</root>", to_xml(markup));
    let doc = match roxmltree::Document::parse(&wrapped) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::warn!(error = %err, "Markup failed to parse, extracting plain text");
            return fallback(markup, mode);
        }
    };

    match mode {
        NormalizeMode::PlainWithBreaks => {
            let mut text = String::new();
            collect_plain(doc.root_element(), &mut text);
            NormalizedText::Plain(collapse_blank_lines(&text))
        }
        NormalizeMode::StyledRuns => {
            let mut runs = Vec::new();
            collect_runs(doc.root_element(), Emphasis::default(), &mut runs);
            NormalizedText::Runs(runs)
        }
    }
}

/// Walk children accumulating styled runs.
fn collect_runs(node: roxmltree::Node, emphasis: Emphasis, runs: &mut Vec<StyledRun>) {
    for child in node.children() {
        if child.is_text() {
            let text = child.text().unwrap_or_default();
            if !text.trim().is_empty() {
                runs.push(StyledRun::styled(
                    text,
                    emphasis.bold,
                    emphasis.italic,
                    emphasis.underline,
                ));
            }
            continue;
        }
        if !child.is_element() {
            continue;
        }

        let tag = child.tag_name().name().to_lowercase();
        let inherited = emphasis.with_tag(&tag);
        match tag.as_str() {
            "br" => runs.push(StyledRun::plain("\n")),
            "p" | "div" => {
                collect_runs(child, inherited, runs);
                runs.push(StyledRun::plain("\n"));
            }
            "li" => {
                runs.push(StyledRun::styled(
                    "• ",
                    inherited.bold,
                    inherited.italic,
                    inherited.underline,
                ));
                collect_runs(child, inherited, runs);
                runs.push(StyledRun::plain("\n"));
            }
            // ul/ol and any unrecognized tag: traverse transparently
            _ => collect_runs(child, inherited, runs),
        }
    }
}

/// Walk children accumulating plain text with line breaks.
fn collect_plain(node: roxmltree::Node, out: &mut String) {
    for child in node.children() {
        if child.is_text() {
            let text = child.text().unwrap_or_default();
            if !text.trim().is_empty() {
                out.push_str(text);
            }
            continue;
        }
        if !child.is_element() {
            continue;
        }

        match child.tag_name().name().to_lowercase().as_str() {
            "br" => out.push('\n'),
            "p" | "div" | "li" => {
                collect_plain(child, out);
                out.push('\n');
            }
            _ => collect_plain(child, out),
        }
    }
}

/// Compile a hard-coded pattern, memoized for the process lifetime.
#[allow(clippy::expect_used)]
fn cached_regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("hard-coded pattern compiles"))
}

/// Collapse runs of blank lines down to a single blank line.
fn collapse_blank_lines(text: &str) -> String {
    static BLANKS: OnceLock<Regex> = OnceLock::new();
    cached_regex(&BLANKS, r"\n{3,}")
        .replace_all(text, "\n\n")
        .into_owned()
}

/// Named entities the editor emits. XML predefined ones are left alone.
const ENTITIES: [(&str, &str); 18] = [
    ("nbsp", " "),
    ("aacute", "á"),
    ("eacute", "é"),
    ("iacute", "í"),
    ("oacute", "ó"),
    ("uacute", "ú"),
    ("Aacute", "Á"),
    ("Eacute", "É"),
    ("Iacute", "Í"),
    ("Oacute", "Ó"),
    ("Uacute", "Ú"),
    ("ntilde", "ñ"),
    ("Ntilde", "Ñ"),
    ("uuml", "ü"),
    ("iquest", "¿"),
    ("iexcl", "¡"),
    ("ordm", "º"),
    ("ordf", "ª"),
];

/// Normalize editor markup into well-formed XML: substitute named
/// entities, escape bare ampersands and close void tags.
fn to_xml(markup: &str) -> String {
    static AMP: OnceLock<Regex> = OnceLock::new();
    static VOID: OnceLock<Regex> = OnceLock::new();

    let amp = cached_regex(&AMP, r"&[a-zA-Z]+;|&#x[0-9a-fA-F]+;|&#[0-9]+;|&");
    let escaped = amp.replace_all(markup, |caps: &regex::Captures| {
        let token = &caps[0];
        if token == "&" {
            return "&amp;".to_string();
        }
        if token.starts_with("&#") {
            return token.to_string();
        }
        let name = &token[1..token.len() - 1];
        if matches!(name, "amp" | "lt" | "gt" | "quot" | "apos") {
            return token.to_string();
        }
        match ENTITIES.iter().find(|(entity, _)| *entity == name) {
            Some((_, replacement)) => replacement.to_string(),
            // Unknown entity: render it literally rather than fail the parse
            None => format!("&amp;{name};"),
        }
    });

    cached_regex(&VOID, r"(?i)<(br|hr)\s*/?>")
        .replace_all(&escaped, "<$1/>")
        .into_owned()
}

/// Tag-stripping fallback for markup the parser rejects.
fn fallback(markup: &str, mode: NormalizeMode) -> NormalizedText {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    let mut text = cached_regex(&TAGS, r"<[^>]*>")
        .replace_all(markup, "")
        .into_owned();
    for (entity, replacement) in ENTITIES {
        text = text.replace(&format!("&{entity};"), replacement);
    }
    let text = text
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .trim()
        .to_string();

    match mode {
        NormalizeMode::PlainWithBreaks => NormalizedText::Plain(text),
        NormalizeMode::StyledRuns => {
            if text.is_empty() {
                NormalizedText::Runs(Vec::new())
            } else {
                NormalizedText::Runs(vec![StyledRun::plain(text)])
            }
        }
    }
}
