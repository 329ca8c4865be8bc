//! A small structural reader for Scheme source.
//!
//! The reader only needs to be faithful enough to find where a top-level
//! form ends and to expose its shape; numbers, booleans, characters, and
//! keywords are all kept as opaque atoms.

use std::fmt;

use serde::Serialize;

/// A datum read from Scheme source.
///
/// Reader abbreviations (`'x`, `` `x ``, `,x`, `#~x`, ...) are expanded to
/// two-element lists headed by their long name, as a Scheme reader would.
///
/// # Examples
///
/// ```
/// use committer_sexp::reader::{Reader, Sexp};
///
/// let mut reader = Reader::new("(list 'a \"b\")");
/// let datum = reader.read().unwrap().unwrap();
/// assert_eq!(datum.to_string(), "(list 'a \"b\")");
/// assert_eq!(datum.head(), Some("list"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Sexp {
    /// Symbols and every other atom (numbers, booleans, characters, keywords).
    Symbol(String),
    /// A string literal, unescaped.
    Str(String),
    /// A parenthesized list.
    List(Vec<Sexp>),
    /// A `#(...)` vector.
    Vector(Vec<Sexp>),
}

impl Sexp {
    /// The symbol at the head of a list, if any.
    pub fn head(&self) -> Option<&str> {
        match self {
            Sexp::List(items) => match items.first() {
                Some(Sexp::Symbol(s)) => Some(s),
                _ => None,
            },
            _ => None,
        }
    }

    /// The atom text of a symbol.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Sexp::Symbol(s) => Some(s),
            _ => None,
        }
    }
}

const ABBREVIATIONS: &[(&str, &str)] = &[
    ("quote", "'"),
    ("quasiquote", "`"),
    ("unquote", ","),
    ("unquote-splicing", ",@"),
    ("gexp", "#~"),
    ("ungexp", "#$"),
    ("ungexp-splicing", "#$@"),
    ("ungexp-native", "#+"),
    ("ungexp-native-splicing", "#+@"),
    ("syntax", "#'"),
    ("quasisyntax", "#`"),
    ("unsyntax", "#,"),
    ("unsyntax-splicing", "#,@"),
];

fn abbreviation(name: &str) -> Option<&'static str> {
    ABBREVIATIONS
        .iter()
        .find(|(long, _)| *long == name)
        .map(|(_, short)| *short)
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Symbol(s) => write!(f, "{s}"),
            Sexp::Str(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
            Sexp::List(items) => {
                if let [Sexp::Symbol(name), inner] = items.as_slice() {
                    if let Some(short) = abbreviation(name) {
                        return write!(f, "{short}{inner}");
                    }
                }
                write_seq(f, "(", items)
            }
            Sexp::Vector(items) => write_seq(f, "#(", items),
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &[Sexp]) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(")")
}

/// A failure to read a datum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ReadError {
    /// 1-based line where the problem was detected.
    pub line: usize,
    /// What went wrong.
    pub message: String,
}

/// Incremental reader over Scheme source text that tracks line numbers.
pub struct Reader<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Reader<'a> {
    /// Start reading at the beginning of `src`.
    pub fn new(src: &'a str) -> Self {
        Self::at(src, 0, 1)
    }

    /// Start reading at byte offset `pos`, which lies on 1-based `line`.
    pub fn at(src: &'a str, pos: usize, line: usize) -> Self {
        Self { src, pos, line }
    }

    /// The line the reader is currently on.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Read the next datum, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] for unbalanced parentheses, unterminated
    /// strings or block comments, and dangling reader prefixes.
    ///
    /// # Examples
    ///
    /// ```
    /// use committer_sexp::reader::Reader;
    ///
    /// let mut reader = Reader::new("; comment\n(a\n b)\n");
    /// assert!(reader.read().unwrap().is_some());
    /// assert_eq!(reader.line(), 3);
    /// assert!(reader.read().unwrap().is_none());
    /// ```
    pub fn read(&mut self) -> Result<Option<Sexp>, ReadError> {
        self.skip_atmosphere()?;
        if self.peek().is_none() {
            return Ok(None);
        }
        self.read_datum().map(Some)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.src[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> ReadError {
        ReadError {
            line: self.line,
            message: message.into(),
        }
    }

    fn skip_atmosphere(&mut self) -> Result<(), ReadError> {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some(';'), _) => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('#'), Some('|')) => self.skip_block_comment()?,
                (Some('#'), Some(';')) => {
                    self.bump();
                    self.bump();
                    self.skip_atmosphere()?;
                    if self.peek().is_none() {
                        return Err(self.error("datum comment at end of input"));
                    }
                    self.read_datum()?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), ReadError> {
        let start = self.line;
        self.bump();
        self.bump();
        let mut depth = 1;
        while depth > 0 {
            match self.bump() {
                Some('|') if self.peek() == Some('#') => {
                    self.bump();
                    depth -= 1;
                }
                Some('#') if self.peek() == Some('|') => {
                    self.bump();
                    depth += 1;
                }
                Some(_) => {}
                None => {
                    return Err(ReadError {
                        line: start,
                        message: "unterminated block comment".into(),
                    })
                }
            }
        }
        Ok(())
    }

    fn read_datum(&mut self) -> Result<Sexp, ReadError> {
        let Some(c) = self.peek() else {
            return Err(self.error("unexpected end of input"));
        };
        match c {
            '(' | '[' => {
                self.bump();
                let close = if c == '(' { ')' } else { ']' };
                self.read_seq(close).map(Sexp::List)
            }
            ')' | ']' => Err(self.error(format!("unexpected `{c}`"))),
            '"' => self.read_string(),
            '\'' => self.read_abbreviation(1, "quote"),
            '`' => self.read_abbreviation(1, "quasiquote"),
            ',' if self.peek_second() == Some('@') => {
                self.read_abbreviation(2, "unquote-splicing")
            }
            ',' => self.read_abbreviation(1, "unquote"),
            '#' => self.read_hash(),
            _ => Ok(Sexp::Symbol(self.read_atom())),
        }
    }

    fn read_seq(&mut self, close: char) -> Result<Vec<Sexp>, ReadError> {
        let start = self.line;
        let mut items = Vec::new();
        loop {
            self.skip_atmosphere()?;
            match self.peek() {
                None => {
                    return Err(ReadError {
                        line: start,
                        message: "unterminated list".into(),
                    })
                }
                Some(c) if c == close => {
                    self.bump();
                    return Ok(items);
                }
                Some(')') | Some(']') => {
                    return Err(self.error(format!("mismatched closing bracket, expected `{close}`")))
                }
                Some(_) => items.push(self.read_datum()?),
            }
        }
    }

    fn read_string(&mut self) -> Result<Sexp, ReadError> {
        let start = self.line;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(Sexp::Str(out)),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    // Line continuation.
                    Some('\n') => {}
                    Some(other) => out.push(other),
                    None => break,
                },
                Some(c) => out.push(c),
                None => break,
            }
        }
        Err(ReadError {
            line: start,
            message: "unterminated string".into(),
        })
    }

    fn read_abbreviation(&mut self, width: usize, name: &str) -> Result<Sexp, ReadError> {
        for _ in 0..width {
            self.bump();
        }
        self.skip_atmosphere()?;
        if self.peek().is_none() {
            return Err(self.error(format!("nothing follows `{name}` prefix")));
        }
        let inner = self.read_datum()?;
        Ok(Sexp::List(vec![Sexp::Symbol(name.into()), inner]))
    }

    fn read_hash(&mut self) -> Result<Sexp, ReadError> {
        let rest = &self.src[self.pos..];
        let prefixes: &[(&str, &str)] = &[
            ("#$@", "ungexp-splicing"),
            ("#+@", "ungexp-native-splicing"),
            ("#,@", "unsyntax-splicing"),
            ("#~", "gexp"),
            ("#$", "ungexp"),
            ("#+", "ungexp-native"),
            ("#'", "syntax"),
            ("#`", "quasisyntax"),
            ("#,", "unsyntax"),
        ];
        if let Some((prefix, name)) = prefixes.iter().find(|(p, _)| rest.starts_with(p)) {
            return self.read_abbreviation(prefix.len(), name);
        }
        if rest.starts_with("#(") {
            self.bump();
            self.bump();
            return self.read_seq(')').map(Sexp::Vector);
        }
        if rest.starts_with("#\\") {
            let mut atom = String::new();
            for _ in 0..2 {
                atom.extend(self.bump());
            }
            match self.bump() {
                Some(c) => atom.push(c),
                None => return Err(self.error("incomplete character literal")),
            }
            atom.push_str(&self.read_atom());
            return Ok(Sexp::Symbol(atom));
        }
        Ok(Sexp::Symbol(self.read_atom()))
    }

    fn read_atom(&mut self) -> String {
        let mut atom = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '"' | ';') {
                break;
            }
            atom.push(c);
            self.bump();
        }
        atom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_one(src: &str) -> Sexp {
        Reader::new(src).read().unwrap().unwrap()
    }

    fn sym(s: &str) -> Sexp {
        Sexp::Symbol(s.into())
    }

    #[test]
    fn reads_nested_lists() {
        let datum = read_one("(define-public foo (package (name \"foo\")))");
        assert_eq!(datum.head(), Some("define-public"));
        let Sexp::List(items) = &datum else {
            panic!("expected list");
        };
        assert_eq!(items[1], sym("foo"));
        assert_eq!(
            items[2],
            Sexp::List(vec![
                sym("package"),
                Sexp::List(vec![sym("name"), Sexp::Str("foo".into())])
            ])
        );
    }

    #[test]
    fn parens_inside_strings_and_comments_are_ignored() {
        let src = "(a \"(not a list\" ; )\n b #| ) |# c)";
        let mut reader = Reader::new(src);
        let datum = reader.read().unwrap().unwrap();
        assert_eq!(
            datum,
            Sexp::List(vec![sym("a"), Sexp::Str("(not a list".into()), sym("b"), sym("c")])
        );
        assert_eq!(reader.line(), 2);
    }

    #[test]
    fn character_literals_may_be_delimiters() {
        let datum = read_one("(memv c '(#\\( #\\) #\\space))");
        assert_eq!(datum.to_string(), "(memv c '(#\\( #\\) #\\space))");
    }

    #[test]
    fn string_escapes_are_decoded() {
        assert_eq!(read_one(r#""a\"b\\c\nd""#), Sexp::Str("a\"b\\c\nd".into()));
    }

    #[test]
    fn quote_forms_expand_and_print_back() {
        let datum = read_one("`((\"perl\" ,perl) (\"zlib\" ,@zlibs))");
        assert_eq!(datum.head(), Some("quasiquote"));
        assert_eq!(datum.to_string(), "`((\"perl\" ,perl) (\"zlib\" ,@zlibs))");
    }

    #[test]
    fn gexp_prefixes_are_understood() {
        let datum = read_one("#~(list #$output #$@flags #+cmake)");
        assert_eq!(datum.head(), Some("gexp"));
        assert_eq!(datum.to_string(), "#~(list #$output #$@flags #+cmake)");
    }

    #[test]
    fn datum_comment_skips_next_form() {
        let datum = read_one("(a #;(ignored\n form) b)");
        assert_eq!(datum, Sexp::List(vec![sym("a"), sym("b")]));
    }

    #[test]
    fn nested_block_comments() {
        let datum = read_one("#| outer #| inner |# still |# (x)");
        assert_eq!(datum, Sexp::List(vec![sym("x")]));
    }

    #[test]
    fn vectors_and_brackets() {
        assert_eq!(read_one("#(1 2)"), Sexp::Vector(vec![sym("1"), sym("2")]));
        assert_eq!(read_one("[a b]"), Sexp::List(vec![sym("a"), sym("b")]));
    }

    #[test]
    fn unterminated_list_reports_opening_line() {
        let err = Reader::new("\n\n(define x\n  (y)\n").read().unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("unterminated list"));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = Reader::new("(a \"b)").read().unwrap_err();
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn stray_closer_is_an_error() {
        let err = Reader::new(")").read().unwrap_err();
        assert!(err.message.contains("unexpected"));
        let err = Reader::new("(a]").read().unwrap_err();
        assert!(err.message.contains("mismatched"));
    }

    #[test]
    fn end_of_input_yields_none() {
        let mut reader = Reader::new("  ; only a comment\n");
        assert_eq!(reader.read().unwrap(), None);
    }

    #[test]
    fn reader_at_offset_tracks_lines() {
        let src = "(a)\n(b\n c)\n";
        let mut reader = Reader::at(src, 4, 2);
        assert_eq!(reader.read().unwrap().unwrap().head(), Some("b"));
        assert_eq!(reader.line(), 3);
    }
}
