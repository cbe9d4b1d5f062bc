//! logos-based parser for textual paths such as `child.items[0]["font-size"]`.
//!
//! Grammar:
//!
//! ```text
//! path    := ( segment ( '.' ident | bracket )* )?
//! segment := ident | bracket
//! bracket := '[' ( index | string ) ']'
//! ```

use std::str::FromStr;

use logos::Logos;

use super::key::{Key, Path};

/// Errors from path parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("unexpected token at offset {offset}: {found:?}")]
    UnexpectedToken { offset: usize, found: String },
    #[error("unexpected end of path: {0}")]
    UnexpectedEof(String),
}

/// Path token produced by the lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r]+")]
enum Token {
    /// Member name: `color`, `$theme`, `_private`.
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Ident,

    /// Decimal index inside brackets.
    #[regex(r"[0-9]+")]
    Index,

    /// Double-quoted member name, with backslash escapes.
    #[regex(r#""([^"\\]|\\.)*""#)]
    StringLiteral,

    /// Single-quoted member name, with backslash escapes.
    #[regex(r"'([^'\\]|\\.)*'")]
    StringLiteralSingle,

    #[token(".")]
    Dot,

    #[token("[")]
    BracketOpen,

    #[token("]")]
    BracketClose,
}

#[derive(Clone, Copy)]
struct Lexeme<'a> {
    token: Token,
    text: &'a str,
    offset: usize,
}

struct Parser<'a> {
    lexemes: Vec<Lexeme<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self, PathError> {
        let mut lexemes = Vec::new();
        for (result, span) in Token::lexer(input).spanned() {
            let text = &input[span.clone()];
            match result {
                Ok(token) => lexemes.push(Lexeme {
                    token,
                    text,
                    offset: span.start,
                }),
                Err(()) => {
                    return Err(PathError::UnexpectedToken {
                        offset: span.start,
                        found: text.to_string(),
                    })
                }
            }
        }
        Ok(Self { lexemes, pos: 0 })
    }

    fn next(&mut self) -> Option<Lexeme<'a>> {
        let lexeme = *self.lexemes.get(self.pos)?;
        self.pos += 1;
        Some(lexeme)
    }

    fn unexpected(lexeme: &Lexeme<'_>) -> PathError {
        PathError::UnexpectedToken {
            offset: lexeme.offset,
            found: lexeme.text.to_string(),
        }
    }

    fn parse(mut self) -> Result<Path, PathError> {
        let mut keys = Vec::new();
        let mut expect_segment = true;

        while let Some(lexeme) = self.next() {
            match lexeme.token {
                Token::Ident if keys.is_empty() => {
                    keys.push(Key::name(lexeme.text));
                    expect_segment = false;
                }
                Token::BracketOpen => {
                    keys.push(self.bracket()?);
                    expect_segment = false;
                }
                Token::Dot if !expect_segment => {
                    let Some(name) = self.next() else {
                        return Err(PathError::UnexpectedEof("expected a name after '.'".into()));
                    };
                    if name.token != Token::Ident {
                        return Err(Self::unexpected(&name));
                    }
                    keys.push(Key::name(name.text));
                }
                _ => return Err(Self::unexpected(&lexeme)),
            }
        }

        Ok(Path::from(keys))
    }

    /// Parse the remainder of a `[ ... ]` segment; the `[` is consumed.
    fn bracket(&mut self) -> Result<Key, PathError> {
        let Some(inner) = self.next() else {
            return Err(PathError::UnexpectedEof("expected an index or string after '['".into()));
        };
        let key = match inner.token {
            Token::Index => inner
                .text
                .parse::<usize>()
                .map(Key::Index)
                .map_err(|_| Self::unexpected(&inner))?,
            Token::StringLiteral | Token::StringLiteralSingle => {
                let body = &inner.text[1..inner.text.len() - 1];
                Key::name(unescape(body).ok_or_else(|| Self::unexpected(&inner))?)
            }
            _ => return Err(Self::unexpected(&inner)),
        };
        match self.next() {
            Some(close) if close.token == Token::BracketClose => Ok(key),
            Some(other) => Err(Self::unexpected(&other)),
            None => Err(PathError::UnexpectedEof("expected ']'".into())),
        }
    }
}

/// Resolve the escapes `Display` produces for quoted names: `\\`, `\"`,
/// `\'`, `\n`, `\r`, `\t`, `\0` and `\u{..}`.
fn unescape(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next()? {
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '0' => '\0',
            'u' => {
                if chars.next()? != '{' {
                    return None;
                }
                let mut hex = String::new();
                loop {
                    match chars.next()? {
                        '}' => break,
                        digit => hex.push(digit),
                    }
                }
                char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?
            }
            _ => return None,
        };
        out.push(escaped);
    }
    Some(out)
}

/// Parse a textual path. The empty string is the root path.
pub fn parse_path(input: &str) -> Result<Path, PathError> {
    Parser::new(input)?.parse()
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_path(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_is_root() {
        assert_eq!(parse_path("").unwrap(), Path::root());
        assert_eq!(parse_path("   ").unwrap(), Path::root());
    }

    #[test]
    fn dotted_names() {
        let path = parse_path("button.hover.color").unwrap();
        assert_eq!(path, Path::from(["button", "hover", "color"]));
    }

    #[test]
    fn indices_and_quoted_names() {
        let path = parse_path("rules[2][\"font-size\"]").unwrap();
        assert_eq!(
            path.keys(),
            &[Key::name("rules"), Key::Index(2), Key::name("font-size")]
        );
        let single = parse_path("['a b'].c").unwrap();
        assert_eq!(single, Path::from(["a b", "c"]));
    }

    #[test]
    fn leading_bracket() {
        let path = parse_path("[0].x").unwrap();
        assert_eq!(path.keys(), &[Key::Index(0), Key::name("x")]);
    }

    #[test]
    fn display_round_trips_through_parse() {
        let text = "theme.palette[3][\"z-index\"].value";
        assert_eq!(parse_path(text).unwrap().to_string(), text);
    }

    #[test]
    fn escaped_names_round_trip() {
        let path = Path::from(["say \"hi\"", "back\\slash", "tab\there", "it's"]);
        let text = path.to_string();
        assert_eq!(parse_path(&text).unwrap(), path);
        assert_eq!(parse_path(r"['a\'b']").unwrap(), Path::from(["a'b"]));
        assert_eq!(parse_path(r#"["\u{e9}"]"#).unwrap(), Path::from(["\u{e9}"]));
    }

    #[test]
    fn unknown_escape_is_rejected() {
        assert!(matches!(
            parse_path(r#"["\q"]"#),
            Err(PathError::UnexpectedToken { offset: 1, .. })
        ));
    }

    #[test]
    fn trailing_dot_is_eof() {
        assert!(matches!(parse_path("a."), Err(PathError::UnexpectedEof(_))));
    }

    #[test]
    fn unclosed_bracket_is_eof() {
        assert!(matches!(parse_path("a[1"), Err(PathError::UnexpectedEof(_))));
    }

    #[test]
    fn double_dot_is_rejected() {
        assert_eq!(
            parse_path("a..b"),
            Err(PathError::UnexpectedToken {
                offset: 2,
                found: ".".into()
            })
        );
    }

    #[test]
    fn adjacent_names_are_rejected() {
        assert!(matches!(
            parse_path("a b"),
            Err(PathError::UnexpectedToken { offset: 2, .. })
        ));
    }

    #[test]
    fn bad_character_is_rejected() {
        assert!(matches!(
            parse_path("a.#b"),
            Err(PathError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn from_str_impl() {
        let path: Path = "a[1]".parse().unwrap();
        assert_eq!(path.len(), 2);
    }
}
