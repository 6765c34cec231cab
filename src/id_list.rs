//! Parsing of configured id lists.
//!
//! Id lists are entered as free text: comma separated, newline separated, or
//! a mix of both. Parsing is permissive and never fails; anything that does not
//! yield a positive integer is dropped.

use indexmap::IndexSet;
use std::fmt;

/// Ordered, deduplicated set of positive ids.
///
/// Insertion order is kept for display and traces; membership checks do not
/// depend on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdSet {
    ids: IndexSet<i64>,
}

impl IdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw configuration value into an id set.
    ///
    /// # Example
    ///
    /// ```
    /// use order_filter::IdSet;
    ///
    /// let ids = IdSet::parse("3,1\n2,1");
    /// assert_eq!(ids.to_vec(), vec![3, 1, 2]);
    /// ```
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.replace("\r\n", ",").replace(['\r', '\n'], ",");

        normalized
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(leading_int)
            .collect()
    }

    /// Insert an id. Non-positive ids and duplicates are ignored.
    ///
    /// Returns `true` if the id was added.
    pub fn insert(&mut self, id: i64) -> bool {
        id > 0 && self.ids.insert(id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.ids.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<i64> {
        self.iter().collect()
    }
}

impl FromIterator<i64> for IdSet {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let mut set = IdSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl fmt::Display for IdSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for id in &self.ids {
            if !first {
                write!(f, ",")?;
            }
            first = false;
            write!(f, "{}", id)?;
        }
        Ok(())
    }
}

/// Parse the leading integer of a string, the way loose string-to-int casts do.
///
/// Leading whitespace is skipped, an optional sign is honored, then as many
/// decimal digits as possible are consumed. No digits yields `0`. Values that
/// do not fit saturate at the `i64` bounds.
pub fn leading_int(raw: &str) -> i64 {
    let s = raw.trim_start_matches([' ', '\t', '\n', '\r', '\x0b', '\x0c']);
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for byte in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(byte - b'0');
        value = match value.checked_mul(10).and_then(|v| v.checked_add(digit)) {
            Some(v) => v,
            None => return if negative { i64::MIN } else { i64::MAX },
        };
    }

    if negative {
        -value
    } else {
        value
    }
}
