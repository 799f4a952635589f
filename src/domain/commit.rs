//! Conventional commit classification.
//!
//! A physical commit message is reduced to zero or more logical
//! [`ConventionalCommit`] records. Parsing is a small line-oriented state
//! machine (header, body, footers); anything that does not start with a
//! conventional header is skipped rather than reported as an error.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Opens the block a squash-merged generation pull request carries.
pub const COMMIT_OVERRIDE_BEGIN: &str = "BEGIN_COMMIT_OVERRIDE";
/// Closes the commit-override block.
pub const COMMIT_OVERRIDE_END: &str = "END_COMMIT_OVERRIDE";
/// Opens one embedded logical commit.
pub const NESTED_COMMIT_BEGIN: &str = "BEGIN_NESTED_COMMIT";
/// Closes one embedded logical commit.
pub const NESTED_COMMIT_END: &str = "END_NESTED_COMMIT";

/// Footer naming the libraries a commit applies to, comma-separated.
pub const LIBRARY_IDS_FOOTER: &str = "Library-IDs";
/// Footer carrying the upstream revision a commit originates from.
pub const SOURCE_REVISION_FOOTER: &str = "PiperOrigin-RevId";

/// Commit types understood by version scoring and note rendering.
pub const KNOWN_TYPES: [&str; 11] = [
    "feat", "fix", "perf", "revert", "docs", "style", "chore", "refactor", "test", "build", "ci",
];

static HEADER_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?P<type>[A-Za-z]+)(?:\((?P<scope>[^()]*)\))?(?P<breaking>!)?:\s+(?P<description>\S.*)$")
        .ok()
});

static FOOTER_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?P<key>BREAKING CHANGE|BREAKING-CHANGE|[A-Za-z][A-Za-z0-9-]*)(?:: | #)(?P<value>.*)$")
        .ok()
});

/// A physical commit as read from version control
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    /// The full commit hash
    pub hash: String,
    /// The full commit message
    pub message: String,
    /// The commit author
    pub author: String,
    /// Commit timestamp
    pub when: DateTime<Utc>,
}

/// One `Key: value` trailer line (continuation lines are folded into `value`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    pub key: String,
    pub value: String,
}

/// One logical change unit
#[derive(Debug, Clone, PartialEq)]
pub struct ConventionalCommit {
    pub r#type: String,
    pub scope: Option<String>,
    pub description: String,
    pub body: String,
    pub footers: Vec<Footer>,
    pub is_breaking: bool,
    pub is_nested: bool,
    pub library_id: String,
    pub commit_hash: String,
    pub when: DateTime<Utc>,
}

impl ConventionalCommit {
    /// First footer value for `key`, matched case-insensitively
    pub fn footer(&self, key: &str) -> Option<&str> {
        self.footers
            .iter()
            .find(|f| f.key.eq_ignore_ascii_case(key))
            .map(|f| f.value.as_str())
    }

    /// Library identifiers listed in the `Library-IDs` footer, if any
    pub fn attributed_libraries(&self) -> Vec<String> {
        self.footer(LIBRARY_IDS_FOOTER)
            .map(split_library_ids)
            .unwrap_or_default()
    }

    /// Whether this record applies to `library_id`.
    ///
    /// An attribution footer overrides the record's own library.
    pub fn applies_to(&self, library_id: &str) -> bool {
        let attributed = self.attributed_libraries();
        if attributed.is_empty() {
            self.library_id == library_id
        } else {
            attributed.iter().any(|id| id == library_id)
        }
    }

    /// True for the eleven recognized commit types
    pub fn is_known_type(&self) -> bool {
        KNOWN_TYPES.contains(&self.r#type.as_str())
    }

    /// First seven characters of the commit hash
    pub fn short_hash(&self) -> &str {
        short_hash(&self.commit_hash)
    }
}

/// First seven characters of `hash`, or all of it when shorter
pub fn short_hash(hash: &str) -> &str {
    match hash.char_indices().nth(7) {
        Some((idx, _)) => &hash[..idx],
        None => hash,
    }
}

/// Library identifiers a physical commit message attributes itself to.
///
/// Used to bypass path ownership before classification.
pub fn attributed_libraries(message: &str) -> Vec<String> {
    let mut ids = Vec::new();
    for text in logical_messages(message).0 {
        if let Some(parsed) = parse_logical(&text) {
            for footer in parsed.footers {
                if footer.key.eq_ignore_ascii_case(LIBRARY_IDS_FOOTER) {
                    for id in split_library_ids(&footer.value) {
                        if !ids.contains(&id) {
                            ids.push(id);
                        }
                    }
                }
            }
        }
    }
    ids
}

fn split_library_ids(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Library named by a leading `[id]` tag in a nested description.
///
/// Generation bodies write every nested header as `<type>: [<id>] <text>`.
pub fn tagged_library(description: &str) -> Option<&str> {
    let rest = description.strip_prefix('[')?;
    let (id, tail) = rest.split_once(']')?;
    let valid = !id.is_empty() && !id.chars().any(|c| c.is_whitespace() || c == '[');
    (valid && (tail.is_empty() || tail.starts_with(' '))).then_some(id)
}

/// Classify a physical commit into logical conventional commits.
///
/// `library_id` is the library the caller is collecting commits for. Each
/// record's `library_id` is resolved in order:
/// 1. a `Library-IDs` footer: the caller's library when listed, else the first entry
/// 2. for nested records, the `[id]` tag leading the description
/// 3. the caller's library
pub fn classify(commit: &CommitInfo, library_id: &str) -> Vec<ConventionalCommit> {
    let (texts, is_nested) = logical_messages(&commit.message);

    texts
        .iter()
        .filter_map(|text| parse_logical(text))
        .map(|parsed| {
            let attributed = parsed
                .footers
                .iter()
                .find(|f| f.key.eq_ignore_ascii_case(LIBRARY_IDS_FOOTER))
                .map(|f| split_library_ids(&f.value))
                .unwrap_or_default();
            let tagged = is_nested
                .then(|| tagged_library(&parsed.description))
                .flatten();
            let record_library = match (attributed.first(), tagged) {
                (Some(first), _) if !attributed.iter().any(|id| id == library_id) => first.clone(),
                (None, Some(tag)) => tag.to_string(),
                _ => library_id.to_string(),
            };

            ConventionalCommit {
                r#type: parsed.r#type,
                scope: parsed.scope,
                description: parsed.description,
                body: parsed.body,
                footers: parsed.footers,
                is_breaking: parsed.is_breaking,
                is_nested,
                library_id: record_library,
                commit_hash: commit.hash.clone(),
                when: commit.when,
            }
        })
        .collect()
}

/// Split a physical message into logical message texts.
///
/// Returns the texts and whether they came from nested blocks.
fn logical_messages(message: &str) -> (Vec<String>, bool) {
    let lines: Vec<&str> = message.lines().map(|l| l.trim_end()).collect();

    let scoped: &[&str] = match lines.iter().position(|l| l.trim() == COMMIT_OVERRIDE_BEGIN) {
        Some(begin) => {
            let rest = &lines[begin + 1..];
            match rest.iter().position(|l| l.trim() == COMMIT_OVERRIDE_END) {
                Some(end) => &rest[..end],
                None => rest,
            }
        }
        None => &lines[..],
    };

    let mut blocks = Vec::new();
    let mut current: Option<Vec<&str>> = None;
    for line in scoped {
        match line.trim() {
            NESTED_COMMIT_BEGIN => current = Some(Vec::new()),
            NESTED_COMMIT_END => {
                if let Some(block) = current.take() {
                    blocks.push(block.join("\n"));
                }
            }
            _ => {
                if let Some(block) = current.as_mut() {
                    block.push(line);
                }
            }
        }
    }
    // An unterminated block still counts.
    if let Some(block) = current.take() {
        blocks.push(block.join("\n"));
    }

    if blocks.is_empty() {
        (vec![scoped.join("\n")], false)
    } else {
        (blocks, true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Header,
    Body,
    Footers,
}

#[derive(Debug, PartialEq)]
struct ParsedMessage {
    r#type: String,
    scope: Option<String>,
    description: String,
    body: String,
    footers: Vec<Footer>,
    is_breaking: bool,
}

fn is_footer_line(line: &str) -> bool {
    FOOTER_RE.as_ref().is_some_and(|re| re.is_match(line))
}

/// Parse one logical message; `None` when the header is not conventional
fn parse_logical(text: &str) -> Option<ParsedMessage> {
    let header_re = HEADER_RE.as_ref()?;

    let mut state = ParseState::Header;
    let mut parsed: Option<ParsedMessage> = None;
    let mut body: Vec<&str> = Vec::new();
    let mut trailer: Vec<&str> = Vec::new();
    let mut paragraph_start = true;

    for line in text.lines() {
        let blank = line.trim().is_empty();
        match state {
            ParseState::Header => {
                if blank {
                    continue;
                }
                let captures = header_re.captures(line.trim())?;
                parsed = Some(ParsedMessage {
                    r#type: captures["type"].to_lowercase(),
                    scope: captures
                        .name("scope")
                        .map(|m| m.as_str().trim().to_string())
                        .filter(|s| !s.is_empty()),
                    description: captures["description"].trim().to_string(),
                    body: String::new(),
                    footers: Vec::new(),
                    is_breaking: captures.name("breaking").is_some(),
                });
                state = ParseState::Body;
                paragraph_start = true;
            }
            ParseState::Body => {
                if blank {
                    body.push(line);
                    paragraph_start = true;
                    continue;
                }
                if paragraph_start && is_footer_line(line) {
                    state = ParseState::Footers;
                    trailer.push(line);
                } else {
                    body.push(line);
                }
                paragraph_start = false;
            }
            ParseState::Footers => {
                if blank {
                    trailer.push(line);
                    paragraph_start = true;
                    continue;
                }
                if paragraph_start && !is_footer_line(line) {
                    // What looked like a trailer was body text after all.
                    body.append(&mut trailer);
                    body.push(line);
                    state = ParseState::Body;
                } else {
                    trailer.push(line);
                }
                paragraph_start = false;
            }
        }
    }

    let mut parsed = parsed?;
    parsed.body = body.join("\n").trim().to_string();
    parsed.footers = parse_footers(&trailer);
    if parsed
        .footers
        .iter()
        .any(|f| f.key == "BREAKING CHANGE" || f.key == "BREAKING-CHANGE")
    {
        parsed.is_breaking = true;
    }
    Some(parsed)
}

fn parse_footers(lines: &[&str]) -> Vec<Footer> {
    let mut footers: Vec<Footer> = Vec::new();
    for line in lines.iter().filter(|l| !l.trim().is_empty()) {
        let captures = FOOTER_RE.as_ref().and_then(|re| re.captures(line));
        match (captures, footers.last_mut()) {
            (Some(c), _) => footers.push(Footer {
                key: c["key"].to_string(),
                value: c["value"].trim().to_string(),
            }),
            (None, Some(last)) => {
                last.value.push('\n');
                last.value.push_str(line.trim());
            }
            (None, None) => {}
        }
    }
    footers
}
