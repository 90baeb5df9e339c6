//! Directive block reader for NGINX-style configuration text.
//!
//! Produces a typed tree of blocks and directives. Only the syntax is
//! understood: directive names carry no meaning here.

use thiserror::Error;

/// Error raised while reading configuration text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    /// 1-based line where the problem was detected.
    pub line: usize,
    pub message: String,
}

impl ParseError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// A simple `name arg1 arg2;` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub args: Vec<String>,
}

/// A `name args { ... }` block.
///
/// The top of a file is represented as an unnamed block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub name: String,
    pub args: Vec<String>,
    pub directives: Vec<Directive>,
    pub blocks: Vec<Block>,
}

impl Block {
    /// Arguments of the first directive called `name`, in source order.
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.directives
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.args.as_slice())
    }

    /// Nested blocks called `name`, in source order.
    pub fn blocks_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks.iter().filter(move |b| b.name == name)
    }

    /// The last nested block called `name`.
    pub fn last_block(&self, name: &str) -> Option<&Block> {
        self.blocks.iter().rev().find(|b| b.name == name)
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Word(String),
    Semicolon,
    Open,
    Close,
}

/// Parse configuration text into its top-level block.
pub fn parse(text: &str) -> Result<Block, ParseError> {
    let tokens = tokenize(text)?;
    let mut pos = 0;
    let (directives, blocks) = parse_body(&tokens, &mut pos, None)?;
    Ok(Block {
        directives,
        blocks,
        ..Block::default()
    })
}

/// Reads the statements of one block. `opened_at` is the line of the `{`
/// for nested blocks and `None` at top level.
fn parse_body(
    tokens: &[(Token, usize)],
    pos: &mut usize,
    opened_at: Option<usize>,
) -> Result<(Vec<Directive>, Vec<Block>), ParseError> {
    let mut directives = Vec::new();
    let mut blocks = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    let mut pending_line = 0;

    while let Some((token, line)) = tokens.get(*pos) {
        *pos += 1;
        match token {
            Token::Word(word) => {
                if pending.is_empty() {
                    pending_line = *line;
                }
                pending.push(word.clone());
            }
            Token::Semicolon => {
                let mut words = std::mem::take(&mut pending).into_iter();
                let name = words
                    .next()
                    .ok_or_else(|| ParseError::new(*line, "unexpected ';'"))?;
                directives.push(Directive {
                    name,
                    args: words.collect(),
                });
            }
            Token::Open => {
                let mut words = std::mem::take(&mut pending).into_iter();
                let name = words
                    .next()
                    .ok_or_else(|| ParseError::new(*line, "block without a name"))?;
                let args = words.collect();
                let (inner_directives, inner_blocks) = parse_body(tokens, pos, Some(*line))?;
                blocks.push(Block {
                    name,
                    args,
                    directives: inner_directives,
                    blocks: inner_blocks,
                });
            }
            Token::Close => {
                if opened_at.is_none() {
                    return Err(ParseError::new(*line, "unexpected '}'"));
                }
                if !pending.is_empty() {
                    return Err(ParseError::new(
                        pending_line,
                        format!("directive '{}' is missing ';'", pending[0]),
                    ));
                }
                return Ok((directives, blocks));
            }
        }
    }

    if let Some(line) = opened_at {
        return Err(ParseError::new(line, "block is never closed"));
    }
    if !pending.is_empty() {
        return Err(ParseError::new(
            pending_line,
            format!("directive '{}' is missing ';'", pending[0]),
        ));
    }
    Ok((directives, blocks))
}

fn tokenize(text: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    while let Some(c) = chars.next() {
        match c {
            '\n' => line += 1,
            c if c.is_whitespace() => {}
            '#' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            ';' => tokens.push((Token::Semicolon, line)),
            '{' => tokens.push((Token::Open, line)),
            '}' => tokens.push((Token::Close, line)),
            quote @ ('"' | '\'') => {
                let start = line;
                let mut word = String::new();
                let mut closed = false;
                while let Some(ch) = chars.next() {
                    match ch {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                if escaped == '\n' {
                                    line += 1;
                                }
                                word.push(escaped);
                            }
                        }
                        ch if ch == quote => {
                            closed = true;
                            break;
                        }
                        other => {
                            if other == '\n' {
                                line += 1;
                            }
                            word.push(other);
                        }
                    }
                }
                if !closed {
                    return Err(ParseError::new(start, "unterminated quoted string"));
                }
                tokens.push((Token::Word(word), start));
            }
            _ => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || matches!(next, ';' | '{' | '}' | '#') {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                tokens.push((Token::Word(word), line));
            }
        }
    }

    Ok(tokens)
}
