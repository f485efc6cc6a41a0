//! Cursor-based predicate parser.

use tracing::trace;

use super::{Atom, Clause, Predicate, PredicateError};
use crate::core::version::VersionConstraint;

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_value_char(c: char) -> bool {
    is_name_char(c) || matches!(c, '.' | ',' | ':')
}

pub(super) struct Parser<'q> {
    query: &'q str,
    pos: usize,
    atoms: Vec<Atom>,
    clauses: Vec<Clause>,
}

impl<'q> Parser<'q> {
    pub(super) fn new(query: &'q str) -> Self {
        Parser {
            query,
            pos: 0,
            atoms: Vec::new(),
            clauses: Vec::new(),
        }
    }

    pub(super) fn parse(mut self) -> Result<Predicate, PredicateError> {
        loop {
            self.skip_whitespace();
            let Some(c) = self.peek() else { break };
            let start = self.pos;

            match c {
                '^' => {
                    self.bump();
                    let name = self.take_while(is_name_char);
                    if name.is_empty() {
                        return Err(self.error(start, 1, "`^` needs a dependency name"));
                    }
                    self.clauses.push(Clause {
                        dependency: name.to_string(),
                        atoms: Vec::new(),
                    });
                }
                '+' | '~' => {
                    self.bump();
                    let name = self.take_while(is_name_char);
                    if name.is_empty() {
                        return Err(self.error(start, 1, format!("expected a variant name after `{}`", c)));
                    }
                    let atom = if c == '+' {
                        Atom::Enabled(name.to_string())
                    } else {
                        Atom::Disabled(name.to_string())
                    };
                    self.push(atom);
                }
                '%' => {
                    self.bump();
                    let name = self.take_while(is_name_char);
                    if name.is_empty() {
                        return Err(self.error(start, 1, "expected a compiler name after `%`"));
                    }
                    let versions = if self.peek() == Some('@') {
                        let at = self.pos;
                        self.bump();
                        Some(self.versions(at)?)
                    } else {
                        None
                    };
                    self.push(Atom::Compiler {
                        name: name.to_string(),
                        versions,
                    });
                }
                '@' => {
                    self.bump();
                    let versions = self.versions(start)?;
                    self.push(Atom::Version(versions));
                }
                c if is_name_char(c) => {
                    let name = self.take_while(is_name_char);
                    if self.peek() == Some('=') {
                        self.bump();
                        let atom = self.assignment(start, name)?;
                        self.push(atom);
                    } else if self.atoms.is_empty() && self.clauses.is_empty() {
                        self.push(Atom::Package(name.to_string()));
                    } else {
                        return Err(self.error(
                            start,
                            name.len(),
                            format!("bare name `{}` must come first", name),
                        ));
                    }
                }
                other => {
                    return Err(self.error(start, other.len_utf8(), format!("unexpected character `{}`", other)));
                }
            }
        }

        let predicate = Predicate {
            atoms: self.atoms,
            clauses: self.clauses,
        };
        trace!(query = self.query, parsed = %predicate, "parsed predicate");
        Ok(predicate)
    }

    /// The value part of `name=value`; the cursor is just past the `=`.
    fn assignment(&mut self, start: usize, name: &str) -> Result<Atom, PredicateError> {
        let value_start = self.pos;
        let value = self.take_while(is_value_char);
        if self.peek() == Some('=') {
            return Err(self.error(self.pos, 1, "duplicated `=`"));
        }
        if value.is_empty() {
            return Err(self.error(start, value_start - start, format!("expected a value after `{}=`", name)));
        }

        let values: Vec<String> = value.split(',').map(str::to_string).collect();
        if values.iter().any(String::is_empty) {
            return Err(self.error(value_start, value.len(), "empty value in list"));
        }

        let architecture: Option<fn(String) -> Atom> = match name {
            "target" => Some(Atom::Target),
            "platform" => Some(Atom::Platform),
            "os" => Some(Atom::Os),
            _ => None,
        };
        if let Some(atom) = architecture {
            return match values.as_slice() {
                [one] => Ok(atom(one.clone())),
                _ => Err(self.error(value_start, value.len(), format!("`{}` takes a single name", name))),
            };
        }

        Ok(Atom::Variant {
            name: name.to_string(),
            values,
        })
    }

    /// A version range list; `at` is the offset of the `@`.
    fn versions(&mut self, at: usize) -> Result<VersionConstraint, PredicateError> {
        let text = self.take_while(is_value_char);
        if text.is_empty() {
            return Err(self.error(at, 1, "expected a version range after `@`"));
        }
        VersionConstraint::parse(text).map_err(|e| self.error(at + 1, text.len(), e.to_string()))
    }

    fn push(&mut self, atom: Atom) {
        match self.clauses.last_mut() {
            Some(clause) => clause.atoms.push(atom),
            None => self.atoms.push(atom),
        }
    }

    fn peek(&self) -> Option<char> {
        self.query[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'q str {
        let query = self.query;
        let rest = &query[self.pos..];
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn error(&self, start: usize, len: usize, reason: impl Into<String>) -> PredicateError {
        PredicateError::malformed(self.query, start, len, reason)
    }
}
