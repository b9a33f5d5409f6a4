//! Version label comparison.
//!
//! Labels are controlled by upstream template authors and are not guaranteed
//! to be semantic versions, so every comparison here is total and infallible.
//! Only range expressions can fail to parse (see [`range`]).

mod range;

use std::cmp::Ordering;

pub use range::{Constraint, Operator, VersionRange};

use crate::error::Result;

fn tokens(label: &str) -> impl Iterator<Item = &str> {
    label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
}

fn is_numeric(token: &str) -> bool {
    token.bytes().all(|b| b.is_ascii_digit())
}

/// Compares two digit-only tokens as integers of any length.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_tokens(a: &str, b: &str) -> Ordering {
    match (is_numeric(a), is_numeric(b)) {
        (true, true) => compare_numeric(a, b),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(b),
    }
}

/// Compares two version labels token by token.
///
/// Tokens are the alphanumeric runs between separators. A label that runs
/// out of tokens first sorts below the other one.
pub fn compare(a: &str, b: &str) -> Ordering {
    let mut left = tokens(a);
    let mut right = tokens(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => match compare_tokens(l, r) {
                Ordering::Equal => {}
                ord => return ord,
            },
        }
    }
}

pub fn greater_than(a: &str, b: &str) -> bool {
    compare(a, b) == Ordering::Greater
}

/// Reports whether `value` lies within `[min, max]`. An empty bound is
/// unbounded on that side.
pub fn between(min: &str, value: &str, max: &str) -> bool {
    if !min.is_empty() && compare(value, min) == Ordering::Less {
        return false;
    }
    if !max.is_empty() && compare(value, max) == Ordering::Greater {
        return false;
    }
    true
}

/// Evaluates `value` against a constraint expression such as
/// `">=1.2.0 <2.0.0"`.
pub fn satisfies_range(value: &str, expr: &str) -> Result<bool> {
    Ok(VersionRange::parse(expr)?.matches(value))
}
