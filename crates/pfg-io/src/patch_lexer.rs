//! Patch description lexer.
//!
//! Splits a patch file into whitespace-separated [`Token`]s. A colon ends a
//! label, so `X:1.0` and `X: 1.0` lex the same way.

use pfg_core::{PfgError, Result};

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Text followed by a colon, e.g. `HEADING` in `HEADING X:`. Stored without the colon.
    Label(String),
    /// Any other run of non-whitespace characters.
    Word(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based source line.
    pub line: usize,
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (n, line) in input.lines().enumerate() {
        for mut chunk in line.split_whitespace() {
            // a chunk may hold several glued labels and a value: `S:4`
            while let Some(colon) = chunk.find(':') {
                let label = &chunk[..colon];
                if !label.is_empty() {
                    tokens.push(Token {
                        kind: TokenKind::Label(label.to_string()),
                        line: n + 1,
                    });
                }
                chunk = &chunk[colon + 1..];
            }
            if !chunk.is_empty() {
                tokens.push(Token {
                    kind: TokenKind::Word(chunk.to_string()),
                    line: n + 1,
                });
            }
        }
    }
    tokens
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// Sequential reader over a token list.
pub struct TokenCursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenCursor {
    pub fn new(input: &str) -> Self {
        Self {
            tokens: tokenize(input),
            pos: 0,
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Line of the next token, or of the last one at end of input.
    pub fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |t| t.line)
    }

    fn advance(&mut self, what: &str) -> Result<&Token> {
        let tok = self
            .tokens
            .get(self.pos)
            .ok_or_else(|| PfgError::UnexpectedEof(format!("expected {what}")))?;
        self.pos += 1;
        Ok(tok)
    }

    pub fn word(&mut self, what: &str) -> Result<String> {
        match self.advance(what)? {
            Token {
                kind: TokenKind::Word(w),
                ..
            } => Ok(w.clone()),
            Token {
                kind: TokenKind::Label(l),
                line,
            } => Err(PfgError::parse(*line, format!("expected {what}, got label '{l}:'"))),
        }
    }

    pub fn expect_word(&mut self, keyword: &str) -> Result<()> {
        let line = self.line();
        let w = self.word(keyword)?;
        if w.eq_ignore_ascii_case(keyword) {
            Ok(())
        } else {
            Err(PfgError::parse(line, format!("expected '{keyword}', got '{w}'")))
        }
    }

    pub fn expect_label(&mut self, label: &str) -> Result<()> {
        match self.advance(label)? {
            Token {
                kind: TokenKind::Label(l),
                ..
            } if l.eq_ignore_ascii_case(label) => Ok(()),
            Token { kind, line } => Err(PfgError::parse(*line, format!("expected '{label}:', got {kind:?}"))),
        }
    }

    /// True when the next token is the word `keyword`.
    pub fn at_word(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token { kind: TokenKind::Word(w), .. }) if w.eq_ignore_ascii_case(keyword))
    }

    pub fn number(&mut self) -> Result<f64> {
        let line = self.line();
        let w = self.word("a number")?;
        w.parse::<f64>()
            .map_err(|_| PfgError::parse(line, format!("invalid number '{w}'")))
    }

    pub fn integer(&mut self) -> Result<i64> {
        let line = self.line();
        let w = self.word("an integer")?;
        w.parse::<i64>()
            .map_err(|_| PfgError::parse(line, format!("invalid integer '{w}'")))
    }

    /// `X: <f> Y: <f> Z: <f>`
    pub fn labelled_xyz(&mut self) -> Result<[f64; 3]> {
        self.expect_label("X")?;
        let x = self.number()?;
        self.expect_label("Y")?;
        let y = self.number()?;
        self.expect_label("Z")?;
        let z = self.number()?;
        Ok([x, y, z])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
