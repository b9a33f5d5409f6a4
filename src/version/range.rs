use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};

use super::compare;

const OPERATOR_CHARS: &[char] = &['<', '>', '=', '!', '~', '^'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    GreaterOrEqual,
    LessOrEqual,
    Greater,
    Less,
    Equal,
}

impl Operator {
    fn parse(s: &str) -> Option<Self> {
        match s {
            ">=" => Some(Self::GreaterOrEqual),
            "<=" => Some(Self::LessOrEqual),
            ">" => Some(Self::Greater),
            "<" => Some(Self::Less),
            "=" | "==" => Some(Self::Equal),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::Less => "<",
            Self::Equal => "=",
        }
    }

    fn accepts(self, ord: Ordering) -> bool {
        match self {
            Self::GreaterOrEqual => ord != Ordering::Less,
            Self::LessOrEqual => ord != Ordering::Greater,
            Self::Greater => ord == Ordering::Greater,
            Self::Less => ord == Ordering::Less,
            Self::Equal => ord == Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub operator: Operator,
    pub version: String,
}

impl Constraint {
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        self.operator.accepts(compare(value, &self.version))
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator.as_str(), self.version)
    }
}

/// A conjunction of constraints, e.g. `">=1.0.0, <2.0.0"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    constraints: Vec<Constraint>,
}

impl VersionRange {
    /// Parses clauses separated by commas and/or whitespace. Every clause
    /// needs an operator and an operand; the operand may follow the
    /// operator after whitespace.
    pub fn parse(expr: &str) -> Result<Self> {
        let mut words = expr
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|w| !w.is_empty());
        let mut constraints = Vec::new();

        while let Some(word) = words.next() {
            let op_len = word
                .find(|c: char| !OPERATOR_CHARS.contains(&c))
                .unwrap_or(word.len());
            if op_len == 0 {
                return Err(Error::Parse(format!(
                    "missing operator before '{word}' in range '{expr}'"
                )));
            }

            let (op, operand) = word.split_at(op_len);
            let operator = Operator::parse(op).ok_or_else(|| {
                Error::Parse(format!("unknown operator '{op}' in range '{expr}'"))
            })?;

            let version = if operand.is_empty() {
                match words.next() {
                    Some(next) if !next.starts_with(OPERATOR_CHARS) => next,
                    _ => {
                        return Err(Error::Parse(format!(
                            "operator '{op}' is missing a version in range '{expr}'"
                        )));
                    }
                }
            } else {
                operand
            };

            constraints.push(Constraint {
                operator,
                version: version.to_string(),
            });
        }

        if constraints.is_empty() {
            return Err(Error::Parse("empty version range".to_string()));
        }

        Ok(Self { constraints })
    }

    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        self.constraints.iter().all(|c| c.matches(value))
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clauses: Vec<String> = self.constraints.iter().map(ToString::to_string).collect();
        f.write_str(&clauses.join(" "))
    }
}
