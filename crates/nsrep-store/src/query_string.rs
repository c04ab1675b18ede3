//! A small query-string grammar for the in-memory search store.
//!
//! ```text
//! query   := clause (sep clause)*
//! sep     := whitespace | "and" | "AND" | "&&"
//! clause  := field ":" value | value
//! value   := '"' chars '"' | chars ["*"]
//! ```
//!
//! A backslash escapes the next character, so `item.id:Table\/T1\/*` is a
//! prefix match on `Table/T1/`. A bare `*` matches every document. Field
//! clauses must all match; bare terms are matched case-insensitively
//! against every text value and contribute to the score.

use std::collections::BTreeMap;

use nsrep_types::{StoreError, StoreResult};

/// How a clause value is compared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pattern {
    Exact(String),
    Prefix(String),
}

impl Pattern {
    fn matches(&self, candidate: &str) -> bool {
        match self {
            Self::Exact(v) => candidate == v,
            Self::Prefix(p) => candidate.starts_with(p.as_str()),
        }
    }

    fn matches_text(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        match self {
            Self::Exact(v) => text.contains(&v.to_lowercase()),
            Self::Prefix(p) => {
                let p = p.to_lowercase();
                text.split_whitespace().any(|word| word.starts_with(&p))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Clause {
    MatchAll,
    Field { field: String, pattern: Pattern },
    Term(Pattern),
}

/// A parsed query string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    pub clauses: Vec<Clause>,
}

/// Indexed values of one document: field name -> values.
pub type Fields = BTreeMap<String, Vec<String>>;

impl ParsedQuery {
    /// Match a document, returning its score, or `None` if it fails a
    /// field clause or matches no term of a terms-only query.
    pub fn score(&self, fields: &Fields) -> Option<f64> {
        let mut terms = 0usize;
        let mut matched_terms = 0usize;
        for clause in &self.clauses {
            match clause {
                Clause::MatchAll => {}
                Clause::Field { field, pattern } => {
                    let hit = fields
                        .get(field)
                        .is_some_and(|values| values.iter().any(|v| pattern.matches(v)));
                    if !hit {
                        return None;
                    }
                }
                Clause::Term(pattern) => {
                    terms += 1;
                    if fields.values().flatten().any(|v| pattern.matches_text(v)) {
                        matched_terms += 1;
                    }
                }
            }
        }
        let only_terms = terms > 0
            && self
                .clauses
                .iter()
                .all(|c| matches!(c, Clause::Term(_)));
        if only_terms && matched_terms == 0 {
            return None;
        }
        Some(1.0 + matched_terms as f64)
    }
}

/// Parse a raw (escaped) query string.
pub fn parse(raw: &str) -> StoreResult<ParsedQuery> {
    let mut clauses = Vec::new();
    for token in tokenize(raw)? {
        if !token.quoted && matches!(token.text.as_str(), "and" | "AND" | "&&") {
            continue;
        }
        clauses.push(clause(token)?);
    }
    if clauses.is_empty() {
        clauses.push(Clause::MatchAll);
    }
    Ok(ParsedQuery { clauses })
}

/// Quote a literal so it survives tokenizing unchanged.
pub fn quote(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len() + 2);
    out.push('"');
    for c in literal.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// A token with its unescaped text. `field_end` marks the first unescaped
/// colon, `wildcard` an unescaped trailing `*`.
#[derive(Debug, Default)]
struct Token {
    text: String,
    field_end: Option<usize>,
    wildcard: bool,
    quoted: bool,
}

fn tokenize(raw: &str) -> StoreResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut current: Option<Token> = None;
    let mut in_quotes = false;
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c.is_whitespace() && !in_quotes {
            tokens.extend(current.take());
            continue;
        }
        let token = current.get_or_insert_with(Token::default);
        if token.wildcard {
            return Err(invalid(raw, "'*' is only allowed at the end of a value"));
        }
        match c {
            '\\' => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| invalid(raw, "dangling escape"))?;
                token.text.push(escaped);
            }
            '"' => {
                in_quotes = !in_quotes;
                token.quoted = true;
            }
            ':' if !in_quotes && token.field_end.is_none() => {
                token.field_end = Some(token.text.len());
            }
            '*' if !in_quotes => token.wildcard = true,
            other => token.text.push(other),
        }
    }
    if in_quotes {
        return Err(invalid(raw, "unterminated quote"));
    }
    tokens.extend(current);
    Ok(tokens)
}

fn clause(token: Token) -> StoreResult<Clause> {
    let (field, value) = match token.field_end {
        Some(end) => (Some(&token.text[..end]), &token.text[end..]),
        None => (None, token.text.as_str()),
    };
    let pattern = if token.wildcard {
        Pattern::Prefix(value.to_string())
    } else {
        Pattern::Exact(value.to_string())
    };
    match field {
        Some("") => Err(invalid(&token.text, "empty field name")),
        Some(field) => Ok(Clause::Field {
            field: field.to_string(),
            pattern,
        }),
        None if token.wildcard && value.is_empty() => Ok(Clause::MatchAll),
        None => Ok(Clause::Term(pattern)),
    }
}

fn invalid(raw: &str, reason: &str) -> StoreError {
    StoreError::Internal(format!("invalid query string {raw:?}: {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsrep_types::escape_query;

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        let mut f = Fields::new();
        for (k, v) in pairs {
            f.entry(k.to_string()).or_default().push(v.to_string());
        }
        f
    }

    #[test]
    fn escaped_prefix_query() {
        let parsed = parse(&escape_query("item.id:Organization/O1/*")).unwrap();
        assert_eq!(
            parsed.clauses,
            vec![Clause::Field {
                field: "item.id".into(),
                pattern: Pattern::Prefix("Organization/O1/".into()),
            }]
        );
    }

    #[test]
    fn conjunction_of_fields() {
        let parsed = parse("item.idlength:4 and item.type:Table AND item.name:T1").unwrap();
        assert_eq!(parsed.clauses.len(), 3);
        let doc = fields(&[
            ("item.idlength", "4"),
            ("item.type", "Table"),
            ("item.name", "T1"),
        ]);
        assert_eq!(parsed.score(&doc), Some(1.0));
        let other = fields(&[
            ("item.idlength", "4"),
            ("item.type", "Table"),
            ("item.name", "T2"),
        ]);
        assert_eq!(parsed.score(&other), None);
    }

    #[test]
    fn prefix_needs_the_separator() {
        let parsed = parse(r"item.id:Table\/T1\/*").unwrap();
        assert!(parsed.score(&fields(&[("item.id", "Table/T1/Column/C1")])).is_some());
        assert!(parsed.score(&fields(&[("item.id", "Table/T1")])).is_none());
        assert!(parsed.score(&fields(&[("item.id", "Table/T10/Column/C1")])).is_none());
    }

    #[test]
    fn quoted_values_keep_spaces() {
        let parsed = parse(&format!("item.name:{}", quote(r#"My "big" table"#))).unwrap();
        assert_eq!(
            parsed.clauses,
            vec![Clause::Field {
                field: "item.name".into(),
                pattern: Pattern::Exact(r#"My "big" table"#.into()),
            }]
        );
    }

    #[test]
    fn bare_terms_score_matches() {
        let parsed = parse("sales quarterly").unwrap();
        let doc = fields(&[("item.name", "Sales"), ("description", "Quarterly figures")]);
        assert_eq!(parsed.score(&doc), Some(3.0));
        let partial = fields(&[("item.name", "sales")]);
        assert_eq!(parsed.score(&partial), Some(2.0));
        assert_eq!(parsed.score(&fields(&[("item.name", "hr")])), None);
    }

    #[test]
    fn match_all() {
        assert_eq!(parse("").unwrap().clauses, vec![Clause::MatchAll]);
        assert_eq!(parse("*").unwrap().clauses, vec![Clause::MatchAll]);
        assert_eq!(parse("*").unwrap().score(&Fields::new()), Some(1.0));
    }

    #[test]
    fn malformed_queries() {
        assert!(parse(":x").is_err());
        assert!(parse("a\\").is_err());
        assert!(parse("item.name:\"open").is_err());
        assert!(parse("a*b").is_err());
    }
}
