use crate::diagnostic::Violation;
use crate::span::{Span, Spanned};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lexeme {
    LBracket,
    RBracket,
    Plus,
    PlusPlus,
    Eq,
    EqEq,
    EqEqEq,
    Eof,
}

impl Lexeme {
    pub fn description(&self) -> &'static str {
        match self {
            Lexeme::LBracket => "'['",
            Lexeme::RBracket => "']'",
            Lexeme::Plus => "'+'",
            Lexeme::PlusPlus => "'++'",
            Lexeme::Eq => "'='",
            Lexeme::EqEq => "'=='",
            Lexeme::EqEqEq => "'==='",
            Lexeme::Eof => "end of input",
        }
    }
}

/// Tokenizer for fragment text. Longest match wins, so `+++` is `++ +`
/// and `===` is the strict comparison the model rejects later.
pub struct Lexer<'src> {
    text: &'src str,
    source: &'src [u8],
    pos: usize,
    diagnostics: Vec<Violation>,
    /// Runs of unexpected characters after the first one.
    extra_runs: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            text: source,
            source: source.as_bytes(),
            pos: 0,
            diagnostics: Vec::new(),
            extra_runs: 0,
        }
    }

    pub fn tokenize(mut self) -> (Vec<Spanned<Lexeme>>, Vec<Violation>) {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.node == Lexeme::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        if self.extra_runs > 0 {
            if let Some(first) = self.diagnostics.pop() {
                self.diagnostics.push(first.with_note(format!(
                    "{} more run(s) of unexpected characters follow",
                    self.extra_runs
                )));
            }
        }
        (tokens, self.diagnostics)
    }

    fn next_token(&mut self) -> Spanned<Lexeme> {
        loop {
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }

            if self.pos >= self.source.len() {
                return self.make_token(Lexeme::Eof, self.pos, self.pos);
            }

            let start = self.pos;
            let ch = self.source[self.pos];
            self.pos += 1;

            let token = match ch {
                b'[' => Lexeme::LBracket,
                b']' => Lexeme::RBracket,
                b'+' => {
                    if self.peek() == Some(b'+') {
                        self.pos += 1;
                        Lexeme::PlusPlus
                    } else {
                        Lexeme::Plus
                    }
                }
                b'=' => {
                    if self.peek() == Some(b'=') {
                        self.pos += 1;
                        if self.peek() == Some(b'=') {
                            self.pos += 1;
                            Lexeme::EqEqEq
                        } else {
                            Lexeme::EqEq
                        }
                    } else {
                        Lexeme::Eq
                    }
                }
                _ => {
                    self.skip_unexpected(start);
                    continue;
                }
            };

            return self.make_token(token, start, self.pos);
        }
    }

    /// Consume a run of characters outside the alphabet starting at `start`.
    /// Only the first run gets a diagnostic; later ones are counted.
    fn skip_unexpected(&mut self, start: usize) {
        // glyphs and whitespace are ASCII, so the run ends on a char boundary
        while let Some(b) = self.peek() {
            if is_glyph(b) || b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
        if !self.diagnostics.is_empty() {
            self.extra_runs += 1;
            return;
        }
        let run = &self.text[start..self.pos];
        let first = run.chars().next().unwrap_or_default();
        self.diagnostics.push(
            Violation::evaluation(format!("unexpected character '{}'", first))
                .at(self.text, Span::new(start as u32, self.pos as u32))
                .with_help("fragment text only uses '[', ']', '+' and '='".to_string()),
        );
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn make_token(&self, token: Lexeme, start: usize, end: usize) -> Spanned<Lexeme> {
        Spanned::new(token, Span::new(start as u32, end as u32))
    }
}

fn is_glyph(b: u8) -> bool {
    matches!(b, b'[' | b']' | b'+' | b'=')
}
