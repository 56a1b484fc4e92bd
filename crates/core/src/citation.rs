//! Page citations found in model answers.
//!
//! The model is instructed to cite pages as `[Page N]`. [`CitationSet::extract`]
//! finds every such marker with a single left-to-right state-machine pass over
//! the bytes of the answer, so the cost is linear in the input no matter what
//! the model produced.
//!
//! The marker is pure ASCII, and no byte of a multi-byte UTF-8 sequence is
//! ASCII, so scanning bytes never matches inside a character.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

const MARKER_PREFIX: &[u8] = b"[Page ";
const MARKER_SUFFIX: u8 = b']';

/// Scanner state.
#[derive(Debug, Clone, Copy)]
enum State {
    /// Not inside a candidate marker.
    Idle,
    /// Matched this many bytes of `[Page `.
    Prefix(usize),
    /// Matched the whole prefix, at least one digit is required next.
    AwaitDigit,
    /// Inside the digit run. `None` once the value no longer fits a `u32`.
    Digits(Option<u32>),
}

impl State {
    /// Transition from `Idle` on `byte`.
    ///
    /// `[` only occurs at the start of the prefix, so a failed partial match
    /// can always restart here with the byte that broke it.
    fn start(byte: u8) -> Self {
        if byte == MARKER_PREFIX[0] {
            State::Prefix(1)
        } else {
            State::Idle
        }
    }
}

/// Deduplicated, ascending page numbers cited by one answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CitationSet(Vec<u32>);

impl CitationSet {
    /// Extract all `[Page N]` markers from `text`.
    ///
    /// Leading zeros are accepted (`[Page 03]` is page 3). Zero and pages
    /// past the end of the document are kept; use [`CitationSet::within`]
    /// when the page count is known. Digit runs too long for a `u32` are
    /// not page numbers and are skipped.
    pub fn extract(text: &str) -> Self {
        let mut pages = BTreeSet::new();
        let mut state = State::Idle;

        for &byte in text.as_bytes() {
            state = match state {
                State::Idle => State::start(byte),
                State::Prefix(matched) if byte == MARKER_PREFIX[matched] => {
                    if matched + 1 == MARKER_PREFIX.len() {
                        State::AwaitDigit
                    } else {
                        State::Prefix(matched + 1)
                    }
                }
                State::Prefix(_) => State::start(byte),
                State::AwaitDigit if byte.is_ascii_digit() => {
                    State::Digits(Some(u32::from(byte - b'0')))
                }
                State::AwaitDigit => State::start(byte),
                State::Digits(value) if byte.is_ascii_digit() => {
                    State::Digits(push_digit(value, byte))
                }
                State::Digits(value) if byte == MARKER_SUFFIX => {
                    if let Some(page) = value {
                        pages.insert(page);
                    }
                    State::Idle
                }
                State::Digits(_) => State::start(byte),
            };
        }

        Self(pages.into_iter().collect())
    }

    /// Keep only pages in `1..=page_count`.
    pub fn within(self, page_count: u32) -> Self {
        Self(
            self.0
                .into_iter()
                .filter(|page| (1..=page_count).contains(page))
                .collect(),
        )
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u32> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, page: u32) -> bool {
        self.0.binary_search(&page).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

/// Renders the set back as marker text, e.g. `[Page 2] [Page 5]`.
impl fmt::Display for CitationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, page) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "[Page {page}]")?;
        }
        Ok(())
    }
}

fn push_digit(value: Option<u32>, byte: u8) -> Option<u32> {
    value?.checked_mul(10)?.checked_add(u32::from(byte - b'0'))
}
