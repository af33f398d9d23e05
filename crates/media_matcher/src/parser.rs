use std::fmt;

use cssparser::{ParseError, ParseErrorKind, Parser, ParserInput, SourcePosition, Token};
use shared::error::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeModifier {
    Min,
    Max,
}

/// Value on the right of the colon in `(feature: value)`.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaValue {
    Ident(String),
    Number(f64),
    Dimension { value: f64, unit: String },
    /// `a/b` with non-negative integer parts.
    Ratio { numerator: f64, denominator: f64 },
    /// Anything else, kept as written.
    Other(String),
}

impl MediaValue {
    /// Text form used by keyword features such as `orientation`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MediaValue::Ident(text) | MediaValue::Other(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for MediaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaValue::Ident(text) | MediaValue::Other(text) => f.write_str(text),
            MediaValue::Number(value) => write!(f, "{value}"),
            MediaValue::Dimension { value, unit } => write!(f, "{value}{unit}"),
            MediaValue::Ratio {
                numerator,
                denominator,
            } => write!(f, "{numerator}/{denominator}"),
        }
    }
}

/// A single `(feature: value)` test.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaExpression {
    pub modifier: Option<RangeModifier>,
    /// Lower-cased feature name without the `min-`/`max-` prefix.
    pub feature: String,
    pub value: Option<MediaValue>,
}

/// One comma-separated entry of a media query list.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaQuery {
    /// Set by a leading `not`.
    pub inverse: bool,
    /// Lower-cased media type; `all` when the query starts with an expression.
    pub media_type: String,
    pub expressions: Vec<MediaExpression>,
}

impl MediaQuery {
    fn all() -> Self {
        Self {
            inverse: false,
            media_type: "all".to_string(),
            expressions: Vec::new(),
        }
    }
}

type QueryParseError<'i> = ParseError<'i, QueryError>;

pub fn parse_query_list(query: &str) -> Result<Vec<MediaQuery>, QueryError> {
    let mut input = ParserInput::new(query);
    let mut parser = Parser::new(&mut input);
    parser
        .parse_comma_separated(parse_query)
        .map_err(|err| match err.kind {
            ParseErrorKind::Custom(err) => err,
            ParseErrorKind::Basic(_) => QueryError::InvalidExpression(query.trim().to_string()),
        })
}

/// `[only|not] <type> [and] <expression> ...` or `<expression> ...`.
///
/// Tokens between parenthesised groups are ignored, so `and` needs no
/// special handling.
fn parse_query<'i>(input: &mut Parser<'i, '_>) -> Result<MediaQuery, QueryParseError<'i>> {
    let start = input.position();
    let head = match input.next() {
        Ok(token) => token.clone(),
        Err(_) => return Ok(MediaQuery::all()),
    };

    let mut query = MediaQuery::all();
    match head {
        Token::Ident(word) => {
            let is_modifier =
                word.eq_ignore_ascii_case("only") || word.eq_ignore_ascii_case("not");
            let media_type = if is_modifier {
                let after_modifier = input.state();
                match input.next().ok().cloned() {
                    Some(Token::Ident(media_type)) => {
                        query.inverse = word.eq_ignore_ascii_case("not");
                        media_type
                    }
                    _ => {
                        input.reset(&after_modifier);
                        word
                    }
                }
            } else {
                word
            };
            query.media_type = media_type.to_ascii_lowercase();
        }
        Token::ParenthesisBlock => {
            query
                .expressions
                .push(input.parse_nested_block(parse_expression)?);
        }
        _ => {
            while input.next().is_ok() {}
            let raw = input.slice_from(start).trim().to_string();
            return Err(input.new_custom_error(QueryError::InvalidExpression(raw)));
        }
    }

    loop {
        let token = match input.next() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        if let Token::ParenthesisBlock = token {
            query
                .expressions
                .push(input.parse_nested_block(parse_expression)?);
        }
    }

    Ok(query)
}

/// Contents of one parenthesised group: `feature` or `feature: value`.
fn parse_expression<'i>(
    input: &mut Parser<'i, '_>,
) -> Result<MediaExpression, QueryParseError<'i>> {
    let start = input.position();

    let name = match input.next().ok().cloned() {
        Some(Token::Ident(name)) => name.to_ascii_lowercase(),
        _ => return Err(invalid_expression(input, start)),
    };

    let value = if input.is_exhausted() {
        None
    } else {
        if input.expect_colon().is_err() {
            return Err(invalid_expression(input, start));
        }
        Some(parse_value(input, start)?)
    };

    let (modifier, feature) = match (name.strip_prefix("min-"), name.strip_prefix("max-")) {
        (Some(rest), _) if !rest.is_empty() => (Some(RangeModifier::Min), rest.to_string()),
        (_, Some(rest)) if !rest.is_empty() => (Some(RangeModifier::Max), rest.to_string()),
        _ => (None, name),
    };

    Ok(MediaExpression {
        modifier,
        feature,
        value,
    })
}

/// Reads the rest of the group as one value. Whitespace is only allowed
/// around it, so `16 / 9` is rejected while `16/9` is a ratio.
fn parse_value<'i>(
    input: &mut Parser<'i, '_>,
    expression_start: SourcePosition,
) -> Result<MediaValue, QueryParseError<'i>> {
    input.skip_whitespace();
    let value_start = input.position();

    let mut tokens: Vec<(Token<'i>, &'i str)> = Vec::new();
    let mut pending_whitespace = false;
    loop {
        let before = input.position();
        let token = match input.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        if let Token::WhiteSpace(_) = token {
            pending_whitespace = !tokens.is_empty();
            continue;
        }
        if pending_whitespace {
            return Err(invalid_expression(input, expression_start));
        }
        tokens.push((token, input.slice_from(before)));
    }

    let value = match tokens.as_slice() {
        [] => return Err(invalid_expression(input, expression_start)),
        [(Token::Ident(ident), _)] => MediaValue::Ident(ident.to_string()),
        [(Token::Number { value, .. }, raw)] => MediaValue::Number(precise(raw, 0, *value)),
        [(Token::Dimension { value, unit, .. }, raw)] => MediaValue::Dimension {
            value: precise(raw, unit.len(), *value),
            unit: unit.to_string(),
        },
        [(Token::Number {
            has_sign: false,
            int_value: Some(numerator),
            ..
        }, _), (Token::Delim('/'), _), (Token::Number {
            has_sign: false,
            int_value: Some(denominator),
            ..
        }, _)] => MediaValue::Ratio {
            numerator: f64::from(*numerator),
            denominator: f64::from(*denominator),
        },
        _ => MediaValue::Other(input.slice_from(value_start).trim().to_string()),
    };
    Ok(value)
}

/// Re-reads the numeric part of a token from its source text so decimal
/// values keep full precision; falls back to the tokenizer's value.
fn precise(raw: &str, unit_len: usize, fallback: f32) -> f64 {
    raw.len()
        .checked_sub(unit_len)
        .and_then(|end| raw.get(..end))
        .and_then(|number| number.parse().ok())
        .unwrap_or(f64::from(fallback))
}

fn invalid_expression<'i>(
    input: &mut Parser<'i, '_>,
    start: SourcePosition,
) -> QueryParseError<'i> {
    while input.next_including_whitespace_and_comments().is_ok() {}
    let raw = format!("({})", input.slice_from(start).trim());
    input.new_custom_error(QueryError::InvalidExpression(raw))
}

#[cfg(test)]
#[path = "tests/parser_tests.rs"]
mod tests;
