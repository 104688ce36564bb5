//! Literal-only reader for initializer source text.
//!
//! Accepts numbers, quoted strings, substitution-free template literals, `true`/`false`/`null`
//! and array literals of those, optionally wrapped in `<T>x`, `x as T`, `x satisfies T` or
//! parentheses. Everything else (identifiers, calls, object literals, operators) is refused.
//! Nothing is evaluated.

use serde_json::Value;

use super::number_value;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected `{found}` at offset {offset}")]
    Unexpected { found: char, offset: usize },
    #[error("{0} is not a literal")]
    NotLiteral(String),
    #[error("invalid number `{0}`")]
    Number(String),
}

/// Reads one literal expression. Trailing input other than a type assertion is an error.
pub fn parse_literal(src: &str) -> Result<Value, ExprError> {
    let mut p = Parser { src, chars: src.char_indices().collect(), pos: 0, took_assertion: false };
    let value = p.expression()?;
    p.skip_ws();
    match p.peek() {
        None => Ok(value),
        Some(c) => Err(ExprError::Unexpected { found: c, offset: p.offset() }),
    }
}

/// How an initializer's outermost expression looks once assertions are peeled off.
#[derive(Debug, Clone, PartialEq)]
pub enum InitializerShape {
    /// Was wrapped in `as`/`<T>`/`satisfies`.
    Asserted(Value),
    Plain(Value),
}

impl InitializerShape {
    pub fn into_value(self) -> Value {
        match self {
            Self::Asserted(v) | Self::Plain(v) => v,
        }
    }
}

/// Like [`parse_literal`], but reports whether a type assertion was stripped.
pub fn parse_initializer(src: &str) -> Result<InitializerShape, ExprError> {
    let mut p = Parser { src, chars: src.char_indices().collect(), pos: 0, took_assertion: false };
    p.skip_ws();
    let prefixed = p.peek() == Some('<');
    let value = p.expression()?;
    let suffixed = p.took_assertion;
    p.skip_ws();
    if let Some(c) = p.peek() {
        return Err(ExprError::Unexpected { found: c, offset: p.offset() });
    }
    Ok(match prefixed || suffixed {
        true => InitializerShape::Asserted(value),
        false => InitializerShape::Plain(value),
    })
}

struct Parser<'s> {
    src: &'s str,
    chars: Vec<(usize, char)>,
    pos: usize,
    took_assertion: bool,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.src.len(), |(o, _)| *o)
    }

    /// `c` was just consumed and is not allowed there.
    fn unexpected(&self, c: char) -> ExprError {
        ExprError::Unexpected { found: c, offset: self.offset() - c.len_utf8() }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn expect(&mut self, want: char) -> Result<(), ExprError> {
        match self.bump() {
            Some(c) if c == want => Ok(()),
            Some(c) => Err(self.unexpected(c)),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn word(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        out
    }

    fn expression(&mut self) -> Result<Value, ExprError> {
        self.skip_ws();
        // <T>x
        if self.peek() == Some('<') {
            self.skip_balanced('<', '>')?;
            return self.expression();
        }
        let value = self.unary()?;
        // x as T / x satisfies T
        loop {
            self.skip_ws();
            let save = self.pos;
            let word = self.word();
            if (word == "as" || word == "satisfies")
                && self.peek().is_some_and(char::is_whitespace)
            {
                self.skip_type()?;
                self.took_assertion = true;
            } else {
                self.pos = save;
                return Ok(value);
            }
        }
    }

    fn unary(&mut self) -> Result<Value, ExprError> {
        self.skip_ws();
        match self.peek() {
            Some('-') => {
                self.pos += 1;
                match self.number()? {
                    Value::Number(n) => Ok(number_value(-n.as_f64().unwrap_or(0.0))),
                    other => Ok(other),
                }
            }
            Some('+') => {
                self.pos += 1;
                self.number()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Value, ExprError> {
        self.skip_ws();
        match self.peek() {
            None => Err(ExprError::UnexpectedEnd),
            Some('"') | Some('\'') => self.string().map(Value::String),
            Some('`') => self.template().map(Value::String),
            Some('[') => self.array(),
            Some('(') => {
                self.pos += 1;
                let value = self.expression()?;
                self.skip_ws();
                self.expect(')')?;
                Ok(value)
            }
            Some('{') => Err(ExprError::NotLiteral("object literal".into())),
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {
                let word = self.word();
                match word.as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" => Ok(Value::Null),
                    _ => Err(ExprError::NotLiteral(format!("`{word}`"))),
                }
            }
            Some(c) => Err(ExprError::Unexpected { found: c, offset: self.offset() }),
        }
    }

    fn number(&mut self) -> Result<Value, ExprError> {
        self.skip_ws();
        let mut text = String::new();
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '-' || c == '+')
                && matches!(text.chars().last(), Some('e' | 'E'))
                && !text.starts_with("0x");
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || exponent_sign {
                text.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        let clean = text.replace('_', "");
        let lower = clean.to_ascii_lowercase();
        let parsed = if let Some(hex) = lower.strip_prefix("0x") {
            i64::from_str_radix(hex, 16).ok().map(|n| n as f64)
        } else if let Some(bin) = lower.strip_prefix("0b") {
            i64::from_str_radix(bin, 2).ok().map(|n| n as f64)
        } else if let Some(oct) = lower.strip_prefix("0o") {
            i64::from_str_radix(oct, 8).ok().map(|n| n as f64)
        } else {
            clean.parse::<f64>().ok()
        };
        match parsed {
            Some(n) if n.is_finite() => Ok(number_value(n)),
            _ => Err(ExprError::Number(text)),
        }
    }

    fn string(&mut self) -> Result<String, ExprError> {
        let quote = self.bump().ok_or(ExprError::UnexpectedEnd)?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(ExprError::UnexpectedEnd),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => out.push(self.escape()?),
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char, ExprError> {
        let c = self.bump().ok_or(ExprError::UnexpectedEnd)?;
        Ok(match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            '0' => '\0',
            'x' => self.hex_char(2)?,
            'u' => {
                if self.peek() == Some('{') {
                    self.pos += 1;
                    let mut hex = String::new();
                    while let Some(h) = self.bump() {
                        if h == '}' {
                            break;
                        }
                        hex.push(h);
                    }
                    u32::from_str_radix(&hex, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| ExprError::NotLiteral(format!("escape `\\u{{{hex}}}`")))?
                } else {
                    self.hex_char(4)?
                }
            }
            other => other,
        })
    }

    fn hex_char(&mut self, digits: usize) -> Result<char, ExprError> {
        let mut hex = String::new();
        for _ in 0..digits {
            hex.push(self.bump().ok_or(ExprError::UnexpectedEnd)?);
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| ExprError::NotLiteral(format!("escape `{hex}`")))
    }

    /// Raw text between backticks.
    fn template(&mut self) -> Result<String, ExprError> {
        self.expect('`')?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(ExprError::UnexpectedEnd),
                Some('`') => return Ok(out),
                Some('$') if self.peek() == Some('{') => {
                    return Err(ExprError::NotLiteral("template with substitutions".into()));
                }
                Some('\\') => {
                    out.push('\\');
                    if let Some(c) = self.bump() {
                        out.push(c);
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn array(&mut self) -> Result<Value, ExprError> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(']') => {
                    self.pos += 1;
                    return Ok(Value::Array(items));
                }
                Some(',') => return Err(ExprError::NotLiteral("array with holes".into())),
                Some('.') if self.src[self.offset()..].starts_with("...") => {
                    return Err(ExprError::NotLiteral("spread element".into()));
                }
                _ => {}
            }
            items.push(self.expression()?);
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some(']') => return Ok(Value::Array(items)),
                Some(c) => return Err(self.unexpected(c)),
                None => return Err(ExprError::UnexpectedEnd),
            }
        }
    }

    fn skip_balanced(&mut self, open: char, close: char) -> Result<(), ExprError> {
        let mut depth = 0usize;
        loop {
            match self.bump() {
                None => return Err(ExprError::UnexpectedEnd),
                Some(c) if c == open => depth += 1,
                Some(c) if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some(_) => {}
            }
        }
    }

    /// Skips a type after `as`; stops at a top-level `,`, `)` or `]`.
    fn skip_type(&mut self) -> Result<(), ExprError> {
        let mut depth = 0i32;
        self.skip_ws();
        if self.peek().is_none() {
            return Err(ExprError::UnexpectedEnd);
        }
        while let Some(c) = self.peek() {
            match c {
                '<' | '(' | '[' | '{' => depth += 1,
                '>' | '}' => depth -= 1,
                ')' | ']' if depth == 0 => return Ok(()),
                ')' | ']' => depth -= 1,
                ',' if depth == 0 => return Ok(()),
                _ => {}
            }
            self.pos += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("42", json!(42))]
    #[case("-1.5", json!(-1.5))]
    #[case("1_000", json!(1000))]
    #[case("0xff", json!(255))]
    #[case("'single'", json!("single"))]
    #[case(r#""dq \"esc\" A""#, json!("dq \"esc\" A"))]
    #[case("`raw text`", json!("raw text"))]
    #[case("true", json!(true))]
    #[case("null", json!(null))]
    #[case("[1, 'a', [false],]", json!([1, "a", [false]]))]
    #[case("<any>'cast'", json!("cast"))]
    #[case("('x' as const)", json!("x"))]
    #[case("[1, 2] as number[]", json!([1, 2]))]
    fn accepts_literals(#[case] src: &str, #[case] expected: Value) {
        assert_eq!(parse_literal(src), Ok(expected));
    }

    #[rstest]
    #[case("foo")]
    #[case("{ a: 1 }")]
    #[case("new Date()")]
    #[case("`a ${b}`")]
    #[case("1 + 2")]
    #[case("[...xs]")]
    #[case("'unterminated")]
    fn refuses_non_literals(#[case] src: &str) {
        assert!(parse_literal(src).is_err(), "{src} should be refused");
    }

    #[test]
    fn reports_type_assertions() {
        assert_eq!(parse_initializer("'a' as any"), Ok(InitializerShape::Asserted(json!("a"))));
        assert_eq!(parse_initializer("<any>true"), Ok(InitializerShape::Asserted(json!(true))));
        assert_eq!(parse_initializer("'a'"), Ok(InitializerShape::Plain(json!("a"))));
    }
}
