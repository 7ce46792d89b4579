//! S-expression parsing for KiCad files that keeps track of where every node
//! came from in the source text.
//!
//! The parsed tree is read-only. Edits are expressed as a [`PatchSet`] of byte
//! span replacements and streamed over the original source, so everything
//! outside a patched span (whitespace, comments, number spelling) survives
//! unchanged.

pub mod board;

use thiserror::Error;

/// Byte span in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `offset`, used for insertions.
    pub fn at(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Slice `source` with this span.
    pub fn slice<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start..self.end]
    }
}

/// The kind of S-expression value
#[derive(Debug, Clone, PartialEq)]
pub enum SexprKind {
    /// Unquoted identifier
    Symbol(String),
    /// Quoted text, unescaped
    String(String),
    Int(i64),
    F64(f64),
    List(Vec<Sexpr>),
}

/// An S-expression value with its source span
#[derive(Debug, Clone)]
pub struct Sexpr {
    pub kind: SexprKind,
    pub span: Span,
}

impl PartialEq for Sexpr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Sexpr {
    pub fn new(kind: SexprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn as_sym(&self) -> Option<&str> {
        match &self.kind {
            SexprKind::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            SexprKind::String(s) => Some(s),
            _ => None,
        }
    }

    /// Symbol or string text. KiCad 5 boards leave some values unquoted.
    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            SexprKind::Symbol(s) | SexprKind::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.kind {
            SexprKind::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.kind {
            SexprKind::F64(f) => Some(f),
            _ => None,
        }
    }

    /// Coerce a number atom into f64.
    ///
    /// KiCad writes whole coordinates without a decimal point, so `12` and
    /// `12.5` both show up in the same list.
    pub fn as_number(&self) -> Option<f64> {
        self.as_float().or_else(|| self.as_int().map(|v| v as f64))
    }

    pub fn as_list(&self) -> Option<&[Sexpr]> {
        match &self.kind {
            SexprKind::List(items) => Some(items),
            _ => None,
        }
    }

    /// Leading symbol of a list: `footprint` for `(footprint ...)`.
    pub fn tag(&self) -> Option<&str> {
        self.as_list()?.first()?.as_sym()
    }

    /// Find a direct child list `(name ...)`.
    pub fn find_list(&self, name: &str) -> Option<&Sexpr> {
        self.as_list()?
            .iter()
            .find(|item| item.tag() == Some(name))
    }
}

/// Errors that can occur during parsing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("expected '{expected}', found '{found}' at byte {offset}")]
    UnexpectedChar {
        found: char,
        expected: char,
        offset: usize,
    },
    #[error("list opened at byte {start} is never closed")]
    UnclosedList { start: usize },
    #[error("string starting at byte {start} is never terminated")]
    UnterminatedString { start: usize },
    #[error("empty atom at byte {offset}")]
    EmptyAtom { offset: usize },
}

/// Byte-oriented parser. Only ASCII bytes are ever delimiters, so slicing at
/// them always lands on UTF-8 character boundaries.
struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_trivia(&mut self) {
        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                b';' => {
                    while let Some(b) = self.peek() {
                        self.pos += 1;
                        if b == b'\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn parse_node(&mut self) -> Result<Sexpr, ParseError> {
        self.skip_trivia();
        match self.peek() {
            None => Err(ParseError::UnexpectedEof),
            Some(b'(') => self.parse_list(),
            Some(b')') => Err(ParseError::UnexpectedChar {
                found: ')',
                expected: '(',
                offset: self.pos,
            }),
            Some(b'"') => self.parse_string(),
            Some(_) => self.parse_atom(),
        }
    }

    fn parse_list(&mut self) -> Result<Sexpr, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => return Err(ParseError::UnclosedList { start }),
                Some(b')') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => items.push(self.parse_node()?),
            }
        }
        Ok(Sexpr::new(SexprKind::List(items), Span::new(start, self.pos)))
    }

    fn parse_string(&mut self) -> Result<Sexpr, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut value: Vec<u8> = Vec::new();
        loop {
            let Some(b) = self.peek() else {
                return Err(ParseError::UnterminatedString { start });
            };
            self.pos += 1;
            match b {
                b'"' => break,
                b'\\' => {
                    let Some(escaped) = self.peek() else {
                        return Err(ParseError::UnterminatedString { start });
                    };
                    self.pos += 1;
                    value.push(match escaped {
                        b'n' => b'\n',
                        b'r' => b'\r',
                        b't' => b'\t',
                        other => other,
                    });
                }
                other => value.push(other),
            }
        }
        let value = String::from_utf8_lossy(&value).into_owned();
        Ok(Sexpr::new(SexprKind::String(value), Span::new(start, self.pos)))
    }

    fn parse_atom(&mut self) -> Result<Sexpr, ParseError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'(' | b')' | b'"') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(ParseError::EmptyAtom { offset: start });
        }
        let text = &self.input[start..self.pos];
        let span = Span::new(start, self.pos);
        Ok(Sexpr::new(classify_atom(text), span))
    }
}

fn classify_atom(text: &str) -> SexprKind {
    let numeric_lead = text
        .bytes()
        .next()
        .is_some_and(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.'));
    if numeric_lead {
        if let Ok(n) = text.parse::<i64>() {
            return SexprKind::Int(n);
        }
        if let Ok(f) = text.parse::<f64>() {
            return SexprKind::F64(f);
        }
    }
    SexprKind::Symbol(text.to_string())
}

/// Parse the first S-expression in `input`. Trailing text is ignored.
pub fn parse(input: &str) -> Result<Sexpr, ParseError> {
    log::trace!("Parsing S-expression from {} bytes of input", input.len());
    let result = Parser::new(input).parse_node();
    if let Err(e) = &result {
        log::trace!("Failed to parse S-expression: {e}");
    }
    result
}

#[derive(Debug, Clone, PartialEq)]
struct Patch {
    span: Span,
    new_text: String,
}

/// Span replacements applied over the original source in one forward pass.
///
/// Patches must not overlap. A zero-width span inserts text.
#[derive(Debug, Default, Clone)]
pub struct PatchSet {
    patches: Vec<Patch>,
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_raw(&mut self, span: Span, new_text: impl Into<String>) {
        self.patches.push(Patch {
            span,
            new_text: new_text.into(),
        });
    }

    pub fn insert(&mut self, offset: usize, text: impl Into<String>) {
        self.replace_raw(Span::at(offset), text);
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// Untouched source chunks interleaved with replacement text, in order.
    fn chunks<'a>(&'a self, source: &'a str) -> Vec<&'a [u8]> {
        let mut sorted: Vec<&Patch> = self.patches.iter().collect();
        sorted.sort_by_key(|p| (p.span.start, p.span.end));

        debug_assert!(
            sorted
                .windows(2)
                .all(|w| w[0].span.end <= w[1].span.start)
                && sorted.iter().all(|p| p.span.end <= source.len()),
            "patches overlap or run past the end of the source"
        );

        let bytes = source.as_bytes();
        let mut chunks = Vec::with_capacity(sorted.len() * 2 + 1);
        let mut cursor = 0;
        for patch in sorted {
            chunks.push(&bytes[cursor..patch.span.start]);
            chunks.push(patch.new_text.as_bytes());
            cursor = patch.span.end;
        }
        chunks.push(&bytes[cursor..]);
        chunks
    }

    pub fn write_to<W: std::io::Write>(&self, source: &str, mut writer: W) -> std::io::Result<()> {
        for chunk in self.chunks(source) {
            writer.write_all(chunk)?;
        }
        Ok(())
    }

    /// Patched copy of `source`.
    pub fn apply(&self, source: &str) -> String {
        let out = self.chunks(source).concat();
        String::from_utf8_lossy(&out).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_atoms() {
        assert_eq!(parse("hello").unwrap().kind, SexprKind::Symbol("hello".into()));
        assert_eq!(parse("123").unwrap().kind, SexprKind::Int(123));
        assert_eq!(parse("-13").unwrap().kind, SexprKind::Int(-13));
        assert_eq!(parse("3.15").unwrap().kind, SexprKind::F64(3.15));
        assert_eq!(parse("F.Cu").unwrap().kind, SexprKind::Symbol("F.Cu".into()));
        assert_eq!(parse("inf").unwrap().kind, SexprKind::Symbol("inf".into()));
    }

    #[test]
    fn test_parse_string_escapes() {
        assert_eq!(
            parse(r#""with\"quotes\"""#).unwrap().kind,
            SexprKind::String("with\"quotes\"".into())
        );
        assert_eq!(
            parse(r#""line\nbreak""#).unwrap().kind,
            SexprKind::String("line\nbreak".into())
        );
    }

    #[test]
    fn test_parse_nested_with_comments() {
        let input = "; header\n(kicad_pcb ; inline\n  (version 20240108) (generator \"pcbnew\"))";
        let root = parse(input).unwrap();
        assert_eq!(root.tag(), Some("kicad_pcb"));
        let version = root.find_list("version").unwrap();
        assert_eq!(version.as_list().unwrap()[1].as_int(), Some(20240108));
        assert_eq!(
            root.find_list("generator").unwrap().as_list().unwrap()[1].as_str(),
            Some("pcbnew")
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse(""), Err(ParseError::UnexpectedEof));
        assert_eq!(parse("(a (b)"), Err(ParseError::UnclosedList { start: 0 }));
        assert_eq!(
            parse("(a \"open)"),
            Err(ParseError::UnterminatedString { start: 3 })
        );
        assert!(matches!(
            parse(")"),
            Err(ParseError::UnexpectedChar { found: ')', .. })
        ));
    }

    #[test]
    fn test_spans_are_byte_offsets() {
        let input = r#"(property "Value" "MountingHole_3.2mm" (at 0 4.2 0))"#;
        let root = parse(input).unwrap();
        let items = root.as_list().unwrap();
        assert_eq!(root.span, Span::new(0, input.len()));
        assert_eq!(items[2].span.slice(input), "\"MountingHole_3.2mm\"");
        assert_eq!(items[3].span.slice(input), "(at 0 4.2 0)");
    }

    #[test]
    fn test_utf8_spans() {
        let input = "(fp_text value \"Bohrung ⌀3.2\" (at 1 2))";
        let root = parse(input).unwrap();
        let items = root.as_list().unwrap();
        assert_eq!(items[2].as_str(), Some("Bohrung ⌀3.2"));
        assert_eq!(items[3].span.slice(input), "(at 1 2)");
    }

    #[test]
    fn test_patch_preserves_surroundings() {
        let input = "(kicad_pcb\n\t(footprint \"H\"\n\t\t(at 1 2 90)\n\t)\n)";
        let root = parse(input).unwrap();
        let at = root.find_list("footprint").unwrap().find_list("at").unwrap();

        let mut patches = PatchSet::new();
        patches.replace_raw(at.span, "(at 77 58 90)");
        assert_eq!(
            patches.apply(input),
            "(kicad_pcb\n\t(footprint \"H\"\n\t\t(at 77 58 90)\n\t)\n)"
        );
    }

    #[test]
    fn test_patch_insert_and_order() {
        let input = "(a b c)";
        let mut patches = PatchSet::new();
        patches.replace_raw(Span::new(5, 6), "z");
        patches.insert(2, "x ");
        assert_eq!(patches.len(), 2);
        assert_eq!(patches.apply(input), "(a x b z)");
    }

    #[test]
    fn test_empty_patch_set_is_identity() {
        let input = "(kicad_pcb (version 1))";
        assert_eq!(PatchSet::new().apply(input), input);
    }

    #[test]
    fn test_write_to_matches_apply() {
        let input = "(kicad_pcb (footprint \"H\" (at 1 2)))";
        let mut patches = PatchSet::new();
        patches.replace_raw(Span::new(26, 34), "(at 77 58)");
        patches.insert(input.len() - 1, " ");

        let mut streamed = Vec::new();
        patches.write_to(input, &mut streamed).unwrap();
        let applied = patches.apply(input);
        assert_eq!(applied, "(kicad_pcb (footprint \"H\" (at 77 58)) )");
        assert_eq!(String::from_utf8(streamed).unwrap(), applied);
    }
}
