//! Selection documents, a small subset of GraphQL query syntax.
//!
//! ```text
//! document  := ["query" [name]] selection_set
//! selection_set := "{" selection* "}"
//! selection := field ["(" argument ("," argument)* ")"] [selection_set]
//! argument  := name ":" string
//! ```
//!
//! Field names may contain dots, so `item.name` can be selected directly.
//! Commas between selections are ignored, as are `#` comments.

use std::collections::BTreeMap;

use crate::error::{SchemaError, SchemaResult};

/// One requested field and its nested selections.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub name: String,
    pub arguments: BTreeMap<String, String>,
    pub selections: Vec<Selection>,
}

impl Selection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Parse a document into its top-level selections.
pub fn parse_document(source: &str) -> SchemaResult<Vec<Selection>> {
    let mut parser = Parser { source, pos: 0 };
    parser.skip_ignored();
    if parser.peek_name().as_deref() == Some("query") {
        parser.name()?;
        parser.skip_ignored();
        if parser.peek() != Some('{') {
            parser.name()?;
        }
    }
    let selections = parser.selection_set()?;
    parser.skip_ignored();
    if parser.pos < source.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(selections)
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> SchemaError {
        SchemaError::Parse {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn skip_ignored(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                '#' => {
                    while !matches!(self.bump(), None | Some('\n')) {}
                }
                c if c.is_whitespace() || c == ',' => {
                    self.bump();
                }
                _ => break,
            }
        }
    }

    fn expect(&mut self, wanted: char) -> SchemaResult<()> {
        self.skip_ignored();
        match self.peek() {
            Some(c) if c == wanted => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{wanted}', found '{c}'"))),
            None => Err(self.error(format!("expected '{wanted}', found end of input"))),
        }
    }

    fn peek_name(&self) -> Option<String> {
        let rest = &self.source[self.pos..];
        let end = rest
            .find(|c: char| !is_name_char(c))
            .unwrap_or(rest.len());
        (end > 0).then(|| rest[..end].to_string())
    }

    fn name(&mut self) -> SchemaResult<String> {
        self.skip_ignored();
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return Err(self.error("expected a name")),
        }
        let name = self.peek_name().unwrap_or_default();
        self.pos += name.len();
        Ok(name)
    }

    fn string(&mut self) -> SchemaResult<String> {
        self.expect('"')?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn selection_set(&mut self) -> SchemaResult<Vec<Selection>> {
        self.expect('{')?;
        let mut selections = Vec::new();
        loop {
            self.skip_ignored();
            match self.peek() {
                Some('}') => {
                    self.bump();
                    break;
                }
                None => return Err(self.error("unclosed selection set")),
                Some(_) => selections.push(self.selection()?),
            }
        }
        if selections.is_empty() {
            return Err(self.error("empty selection set"));
        }
        Ok(selections)
    }

    fn selection(&mut self) -> SchemaResult<Selection> {
        let mut selection = Selection::new(self.name()?);
        self.skip_ignored();
        if self.peek() == Some('(') {
            self.bump();
            loop {
                self.skip_ignored();
                if self.peek() == Some(')') {
                    self.bump();
                    break;
                }
                let argument = self.name()?;
                self.expect(':')?;
                let value = self.string()?;
                if selection.arguments.insert(argument.clone(), value).is_some() {
                    return Err(self.error(format!("duplicate argument {argument}")));
                }
            }
            self.skip_ignored();
        }
        if self.peek() == Some('{') {
            selection.selections = self.selection_set()?;
        }
        Ok(selection)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_document() {
        let doc = parse_document(
            r#"query Teams {
                Organization(name: "Acme") {
                    item.name, size
                    Team { item.name }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(doc.len(), 1);
        let org = &doc[0];
        assert_eq!(org.name, "Organization");
        assert_eq!(org.arguments["name"], "Acme");
        let names: Vec<&str> = org.selections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["item.name", "size", "Team"]);
        assert_eq!(org.selections[2].selections, vec![Selection::new("item.name")]);
    }

    #[test]
    fn bare_selection_set_and_comments() {
        let doc = parse_document("{ # everything\n Application Organization }").unwrap();
        assert_eq!(
            doc,
            vec![Selection::new("Application"), Selection::new("Organization")]
        );
    }

    #[test]
    fn escaped_argument() {
        let doc = parse_document(r#"{ Team(name: "say \"hi\"") }"#).unwrap();
        assert_eq!(doc[0].arguments["name"], r#"say "hi""#);
    }

    #[test]
    fn errors_carry_offsets() {
        let err = parse_document("{ Team(name: 3) }").unwrap_err();
        assert_eq!(err.code(), "PARSE");
        assert_eq!(
            err,
            SchemaError::Parse {
                offset: 13,
                message: "expected '\"', found '3'".into()
            }
        );
    }

    #[test]
    fn malformed_documents() {
        for bad in [
            "",
            "{",
            "{ }",
            "{ Team } }",
            "{ Team(name: \"x\", name: \"y\") }",
            "{ Team(name: \"x) }",
            "{ 9lives }",
        ] {
            assert!(parse_document(bad).is_err(), "{bad:?} should not parse");
        }
    }
}
