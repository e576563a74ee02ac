/// Regex parser: converts a pattern string into an AST.
use crate::ast::*;
use crate::config::DEFAULT_NEST_LIMIT;
use crate::error::{SyntaxError, SyntaxErrorKind};

type ParseResult<T> = Result<T, SyntaxError>;

/// Parse a pattern string into an [`Ast`].
pub fn parse(pattern: &str) -> ParseResult<Ast> {
    Parser::new(pattern).parse()
}

pub struct Parser {
    chars: Vec<char>,
    pos: usize,
    group_names: Vec<Option<String>>,
    /// Groups currently open around `pos`.
    depth: u32,
    nest_limit: u32,
}

/// One endpoint of a class item, before ranges are assembled.
enum ClassAtom {
    Char(char),
    Shorthand(ShorthandKind),
}

impl Parser {
    pub fn new(pattern: &str) -> Self {
        Parser {
            chars: pattern.chars().collect(),
            pos: 0,
            group_names: vec![None],
            depth: 0,
            nest_limit: DEFAULT_NEST_LIMIT,
        }
    }

    /// Set the deepest group nesting accepted before failing with
    /// [`SyntaxErrorKind::NestLimitExceeded`].
    pub fn nest_limit(mut self, limit: u32) -> Self {
        self.nest_limit = limit;
        self
    }

    /// Parse the full pattern.
    pub fn parse(mut self) -> ParseResult<Ast> {
        let root = self.parse_alternation()?;
        if self.pos < self.chars.len() {
            // Only a stray ')' stops the top-level alternation early.
            return Err(self.error_here(SyntaxErrorKind::UnbalancedGroup));
        }
        Ok(Ast {
            root,
            group_names: self.group_names,
        })
    }

    fn error_here(&self, kind: SyntaxErrorKind) -> SyntaxError {
        SyntaxError::new(self.pos, kind)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Parse alternation: `a|b|c`
    fn parse_alternation(&mut self) -> ParseResult<AstNode> {
        let mut branches = vec![self.parse_concat()?];
        while self.eat('|') {
            branches.push(self.parse_concat()?);
        }
        Ok(match branches.len() {
            1 => branches.remove(0),
            _ => AstNode::Alternation(branches),
        })
    }

    /// Parse concatenation: `abc`
    fn parse_concat(&mut self) -> ParseResult<AstNode> {
        let mut nodes = Vec::new();
        while let Some(ch) = self.peek() {
            if ch == ')' || ch == '|' {
                break;
            }
            nodes.push(self.parse_quantified()?);
        }
        Ok(match nodes.len() {
            1 => nodes.remove(0),
            _ => AstNode::Concat(nodes),
        })
    }

    /// Parse an atom possibly followed by a quantifier.
    fn parse_quantified(&mut self) -> ParseResult<AstNode> {
        let node = self.parse_atom()?;
        let start = self.pos;
        let Some((min, max)) = self.parse_quantifier()? else {
            return Ok(node);
        };
        if matches!(node, AstNode::Anchor(_)) {
            return Err(SyntaxError::new(start, SyntaxErrorKind::DanglingQuantifier));
        }
        let greedy = !self.eat('?');

        // A second quantifier has nothing to bind to.
        let next = self.pos;
        if self.parse_quantifier()?.is_some() {
            return Err(SyntaxError::new(next, SyntaxErrorKind::DanglingQuantifier));
        }

        Ok(AstNode::Repetition {
            node: Box::new(node),
            min,
            max,
            greedy,
        })
    }

    /// Parse `*`, `+`, `?` or a brace quantifier, returning its bounds.
    ///
    /// Leaves the position untouched when no quantifier follows.
    fn parse_quantifier(&mut self) -> ParseResult<Option<(u32, Option<u32>)>> {
        let bounds = match self.peek() {
            Some('*') => (0, None),
            Some('+') => (1, None),
            Some('?') => (0, Some(1)),
            Some('{') => return self.parse_brace_quantifier(),
            _ => return Ok(None),
        };
        self.advance();
        Ok(Some(bounds))
    }

    /// Parse `{n}`, `{n,}`, `{n,m}` or `{,m}`.
    ///
    /// A brace that does not form a quantifier is a literal, so the
    /// position is restored and `None` returned.
    fn parse_brace_quantifier(&mut self) -> ParseResult<Option<(u32, Option<u32>)>> {
        let save_pos = self.pos;
        self.advance(); // consume '{'

        let min = self.parse_number()?;
        let bounds = if self.eat(',') {
            let max = self.parse_number()?;
            if min.is_none() && max.is_none() {
                None
            } else {
                Some((min.unwrap_or(0), max))
            }
        } else {
            min.map(|n| (n, Some(n)))
        };

        match bounds {
            Some((min, max)) if self.eat('}') => {
                if max.is_some_and(|max| min > max) {
                    return Err(SyntaxError::new(save_pos, SyntaxErrorKind::BadQuantifierBounds));
                }
                Ok(Some((min, max)))
            }
            _ => {
                self.pos = save_pos;
                Ok(None)
            }
        }
    }

    fn parse_number(&mut self) -> ParseResult<Option<u32>> {
        let start = self.pos;
        while self.peek().is_some_and(|ch| ch.is_ascii_digit()) {
            self.advance();
        }
        if self.pos == start {
            return Ok(None);
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits
            .parse::<u32>()
            .map(Some)
            .map_err(|_| SyntaxError::new(start, SyntaxErrorKind::BadQuantifierBounds))
    }

    /// Parse a single atom (literal, class, group, anchor, etc.)
    fn parse_atom(&mut self) -> ParseResult<AstNode> {
        match self.peek() {
            None => Err(self.error_here(SyntaxErrorKind::DanglingQuantifier)),
            Some('(') => self.parse_group(),
            Some('[') => self.parse_char_class(),
            Some('*' | '+' | '?') => Err(self.error_here(SyntaxErrorKind::DanglingQuantifier)),
            Some('{') => {
                let start = self.pos;
                if self.parse_brace_quantifier()?.is_some() {
                    return Err(SyntaxError::new(start, SyntaxErrorKind::DanglingQuantifier));
                }
                self.advance();
                Ok(AstNode::Literal('{'))
            }
            Some('.') => {
                self.advance();
                Ok(AstNode::Dot)
            }
            Some('^') => {
                self.advance();
                Ok(AstNode::Anchor(AnchorKind::Start))
            }
            Some('$') => {
                self.advance();
                Ok(AstNode::Anchor(AnchorKind::End))
            }
            Some('\\') => self.parse_escape(),
            Some(ch) => {
                self.advance();
                Ok(AstNode::Literal(ch))
            }
        }
    }

    /// Parse an escape sequence outside a character class.
    fn parse_escape(&mut self) -> ParseResult<AstNode> {
        let start = self.pos;
        self.advance(); // consume '\\'
        let node = match self.advance() {
            Some('d') => AstNode::ShorthandClass(ShorthandKind::Digit),
            Some('D') => AstNode::ShorthandClass(ShorthandKind::NonDigit),
            Some('w') => AstNode::ShorthandClass(ShorthandKind::Word),
            Some('W') => AstNode::ShorthandClass(ShorthandKind::NonWord),
            Some('s') => AstNode::ShorthandClass(ShorthandKind::Space),
            Some('S') => AstNode::ShorthandClass(ShorthandKind::NonSpace),
            Some('b') => AstNode::Anchor(AnchorKind::WordBoundary),
            Some('B') => AstNode::Anchor(AnchorKind::NonWordBoundary),
            Some('A') => AstNode::Anchor(AnchorKind::TextStart),
            Some('z' | 'Z') => AstNode::Anchor(AnchorKind::TextEnd),
            Some(ch) => AstNode::Literal(self.escaped_char(ch, start)?),
            None => return Err(SyntaxError::new(start, SyntaxErrorKind::BadEscape)),
        };
        Ok(node)
    }

    /// Resolve the character of an escape that denotes a single character.
    ///
    /// `ch` has already been consumed; `start` is the offset of the backslash.
    fn escaped_char(&mut self, ch: char, start: usize) -> ParseResult<char> {
        match ch {
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            't' => Ok('\t'),
            'f' => Ok('\u{c}'),
            'v' => Ok('\u{b}'),
            '0' => Ok('\0'),
            'x' => self.parse_hex_escape(start),
            // Backreferences and unknown letter escapes.
            _ if ch.is_alphanumeric() => Err(SyntaxError::new(start, SyntaxErrorKind::BadEscape)),
            _ => Ok(ch),
        }
    }

    /// Parse the digits of `\xHH` or `\x{H...}`.
    fn parse_hex_escape(&mut self, start: usize) -> ParseResult<char> {
        let bad_escape = SyntaxError::new(start, SyntaxErrorKind::BadEscape);
        let digits: String = if self.eat('{') {
            let mut digits = String::new();
            loop {
                match self.advance() {
                    Some('}') => break,
                    Some(ch) if ch.is_ascii_hexdigit() && digits.len() < 6 => digits.push(ch),
                    _ => return Err(bad_escape),
                }
            }
            digits
        } else {
            let mut digits = String::new();
            for _ in 0..2 {
                match self.advance() {
                    Some(ch) if ch.is_ascii_hexdigit() => digits.push(ch),
                    _ => return Err(bad_escape),
                }
            }
            digits
        };
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or(bad_escape)
    }

    /// Parse a group: `(...)`, `(?:...)`, `(?P<name>...)`, `(?<name>...)`.
    fn parse_group(&mut self) -> ParseResult<AstNode> {
        let open = self.pos;
        self.advance(); // consume '('
        if self.depth >= self.nest_limit {
            let kind = SyntaxErrorKind::NestLimitExceeded(self.nest_limit);
            return Err(SyntaxError::new(open, kind));
        }
        self.depth += 1;

        let (index, name) = if self.eat('?') {
            match self.advance() {
                Some(':') => (None, None),
                Some('P') if self.peek() == Some('<') => {
                    self.advance();
                    self.parse_named_group_header(open)?
                }
                Some('<') if !matches!(self.peek(), Some('=' | '!')) => {
                    self.parse_named_group_header(open)?
                }
                _ => return Err(SyntaxError::new(open, SyntaxErrorKind::BadGroup)),
            }
        } else {
            let index = self.group_names.len();
            self.group_names.push(None);
            (Some(index), None)
        };

        let node = self.parse_alternation()?;
        if !self.eat(')') {
            return Err(SyntaxError::new(open, SyntaxErrorKind::UnbalancedGroup));
        }
        self.depth -= 1;
        Ok(AstNode::Group {
            node: Box::new(node),
            index,
            name,
        })
    }

    /// Parse `name>` after `(?P<` or `(?<` and register the group.
    fn parse_named_group_header(&mut self, open: usize) -> ParseResult<(Option<usize>, Option<String>)> {
        let name_start = self.pos;
        let mut name = String::new();
        loop {
            match self.advance() {
                Some('>') => break,
                Some(ch) if ch == '_' || ch.is_alphanumeric() => name.push(ch),
                _ => return Err(SyntaxError::new(open, SyntaxErrorKind::BadGroup)),
            }
        }
        if name.is_empty() || name.starts_with(|ch: char| ch.is_numeric()) {
            return Err(SyntaxError::new(name_start, SyntaxErrorKind::BadGroup));
        }
        if self.group_names.iter().flatten().any(|existing| *existing == name) {
            return Err(SyntaxError::new(
                name_start,
                SyntaxErrorKind::DuplicateGroupName(name),
            ));
        }
        let index = self.group_names.len();
        self.group_names.push(Some(name.clone()));
        Ok((Some(index), Some(name)))
    }

    /// Parse a character class: `[abc]`, `[a-z]`, `[^abc]`.
    fn parse_char_class(&mut self) -> ParseResult<AstNode> {
        let open = self.pos;
        self.advance(); // consume '['
        let negated = self.eat('^');

        let mut items = Vec::new();
        // Allow ']' as first character in class
        if self.eat(']') {
            items.push(ClassItem::Literal(']'));
        }

        loop {
            match self.peek() {
                None => return Err(SyntaxError::new(open, SyntaxErrorKind::UnterminatedClass)),
                Some(']') => break,
                Some(_) => {}
            }
            let item_start = self.pos;
            let first = self.parse_class_atom(open)?;

            // A '-' right before ']' is a literal.
            let is_range = self.peek() == Some('-') && !matches!(self.peek_at(1), Some(']') | None);
            if !is_range {
                items.push(match first {
                    ClassAtom::Char(ch) => ClassItem::Literal(ch),
                    ClassAtom::Shorthand(kind) => ClassItem::Shorthand(kind),
                });
                continue;
            }
            self.advance(); // consume '-'
            let last = self.parse_class_atom(open)?;
            match (first, last) {
                (ClassAtom::Char(lo), ClassAtom::Char(hi)) if lo <= hi => {
                    items.push(ClassItem::Range(lo, hi));
                }
                _ => return Err(SyntaxError::new(item_start, SyntaxErrorKind::BadClassRange)),
            }
        }
        self.advance(); // consume ']'
        Ok(AstNode::CharClass { items, negated })
    }

    fn parse_class_atom(&mut self, open: usize) -> ParseResult<ClassAtom> {
        let start = self.pos;
        match self.advance() {
            None => Err(SyntaxError::new(open, SyntaxErrorKind::UnterminatedClass)),
            Some('\\') => {
                let atom = match self.advance() {
                    None => return Err(SyntaxError::new(open, SyntaxErrorKind::UnterminatedClass)),
                    Some('d') => ClassAtom::Shorthand(ShorthandKind::Digit),
                    Some('D') => ClassAtom::Shorthand(ShorthandKind::NonDigit),
                    Some('w') => ClassAtom::Shorthand(ShorthandKind::Word),
                    Some('W') => ClassAtom::Shorthand(ShorthandKind::NonWord),
                    Some('s') => ClassAtom::Shorthand(ShorthandKind::Space),
                    Some('S') => ClassAtom::Shorthand(ShorthandKind::NonSpace),
                    // Backspace, as in most engines.
                    Some('b') => ClassAtom::Char('\u{8}'),
                    Some(ch) => ClassAtom::Char(self.escaped_char(ch, start)?),
                };
                Ok(atom)
            }
            Some(ch) => Ok(ClassAtom::Char(ch)),
        }
    }
}
