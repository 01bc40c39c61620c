// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! nom grammar for the exchange file envelope and entity instances.
//!
//! The grammar produces a raw syntax tree: references are still `#n` labels
//! and typed values still carry their type keyword as text. Resolution into
//! model values happens in the reader once every instance is known.
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_until, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace1, one_of, satisfy},
    combinator::{all_consuming, cut, map, map_res, opt, recognize, value},
    error::{context, convert_error, VerboseError},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::error::StepError;

type Res<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

/// One parameter of a record, before reference resolution.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Param {
    Unset,
    Derived,
    Integer(i64),
    Real(f64),
    Text(String),
    Enum(String),
    Binary(String),
    Ref(u64),
    List(Vec<Param>),
    Typed(String, Box<Param>),
}

/// A `KEYWORD(params);` header record.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HeaderRecord {
    pub keyword: String,
    pub params: Vec<Param>,
}

/// A `#n=KEYWORD(params);` instance with the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Instance {
    pub line: usize,
    pub label: u64,
    pub keyword: String,
    pub params: Vec<Param>,
}

#[derive(Debug, Default)]
pub(crate) struct Exchange {
    pub header: Vec<HeaderRecord>,
    pub instances: Vec<Instance>,
}

/// Parses a whole exchange file.
pub(crate) fn parse_exchange(text: &str) -> Result<Exchange, StepError> {
    match all_consuming(|i| exchange(i, text))(text) {
        Ok((_, exchange)) => Ok(exchange),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            let line = e
                .errors
                .first()
                .map_or(1, |(rest, _)| line_of(text, rest));
            Err(StepError::Syntax {
                line,
                message: convert_error(text, e),
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(StepError::Syntax {
            line: text.lines().count().max(1),
            message: "incomplete input".into(),
        }),
    }
}

fn line_of(text: &str, rest: &str) -> usize {
    let offset = text.len().saturating_sub(rest.len());
    text.get(..offset)
        .map_or(1, |consumed| consumed.matches('\n').count() + 1)
}

/// Whitespace and `/* ... */` comments.
fn ws(input: &str) -> Res<'_, ()> {
    value(
        (),
        many0(alt((
            value((), multispace1),
            value((), tuple((tag("/*"), take_until("*/"), tag("*/")))),
        ))),
    )(input)
}

fn token<'a>(t: &'static str) -> impl FnMut(&'a str) -> Res<'a, &'a str> {
    terminated(tag(t), ws)
}

fn exchange<'a>(input: &'a str, text: &'a str) -> Res<'a, Exchange> {
    let (input, _) = ws(input)?;
    let (input, _) = context("file start", token("ISO-10303-21;"))(input)?;
    let (input, _) = context("header section", token("HEADER;"))(input)?;
    let (input, header) = many0(header_record)(input)?;
    let (input, _) = context("header end", token("ENDSEC;"))(input)?;
    let (input, _) = context("data section", token("DATA;"))(input)?;
    let (input, instances) = many0(|i| instance(i, text))(input)?;
    let (input, _) = context("data end", token("ENDSEC;"))(input)?;
    let (input, _) = context("file end", token("END-ISO-10303-21;"))(input)?;
    Ok((input, Exchange { header, instances }))
}

fn keyword(input: &str) -> Res<'_, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic()),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
    ))(input)
}

fn header_record(input: &str) -> Res<'_, HeaderRecord> {
    let (input, name) = terminated(keyword, ws)(input)?;
    let (input, params) = terminated(param_list, ws)(input)?;
    let (input, _) = context("';' after header record", cut(token(";")))(input)?;
    Ok((
        input,
        HeaderRecord {
            keyword: name.to_owned(),
            params,
        },
    ))
}

fn instance<'a>(input: &'a str, text: &'a str) -> Res<'a, Instance> {
    let line = line_of(text, input);
    let (input, label) = terminated(preceded(char('#'), label_digits), ws)(input)?;
    let (input, _) = context("'=' after instance label", cut(token("=")))(input)?;
    let (input, name) = context("entity type", cut(terminated(keyword, ws)))(input)?;
    let (input, params) = context("parameter list", cut(terminated(param_list, ws)))(input)?;
    let (input, _) = context("';' after instance", cut(token(";")))(input)?;
    Ok((
        input,
        Instance {
            line,
            label,
            keyword: name.to_ascii_uppercase(),
            params,
        },
    ))
}

fn label_digits(input: &str) -> Res<'_, u64> {
    map_res(digit1, str::parse::<u64>)(input)
}

fn param_list(input: &str) -> Res<'_, Vec<Param>> {
    delimited(
        terminated(char('('), ws),
        separated_list0(terminated(char(','), ws), terminated(param, ws)),
        context("closing parenthesis", cut(char(')'))),
    )(input)
}

fn param(input: &str) -> Res<'_, Param> {
    alt((
        value(Param::Unset, char('$')),
        value(Param::Derived, char('*')),
        map(preceded(char('#'), label_digits), Param::Ref),
        map(string_literal, Param::Text),
        map(enumeration, Param::Enum),
        map(binary, Param::Binary),
        number,
        map(param_list, Param::List),
        typed,
    ))(input)
}

fn typed(input: &str) -> Res<'_, Param> {
    let (input, name) = terminated(keyword, ws)(input)?;
    let (input, inner) = delimited(
        terminated(char('('), ws),
        terminated(param, ws),
        context("closing parenthesis of typed value", cut(char(')'))),
    )(input)?;
    Ok((input, Param::Typed(name.to_ascii_uppercase(), Box::new(inner))))
}

fn string_literal(input: &str) -> Res<'_, String> {
    let (input, _) = char('\'')(input)?;
    let (input, parts) = many0(alt((
        value("'", tag("''")),
        value("\\", tag("\\\\")),
        is_not("'\\"),
        tag("\\"),
    )))(input)?;
    let (input, _) = context("closing quote", cut(char('\'')))(input)?;
    Ok((input, parts.concat()))
}

fn enumeration(input: &str) -> Res<'_, String> {
    map(
        delimited(
            char('.'),
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            char('.'),
        ),
        |item: &str| item.to_ascii_uppercase(),
    )(input)
}

fn binary(input: &str) -> Res<'_, String> {
    map(
        delimited(
            char('"'),
            take_while(|c: char| c.is_ascii_hexdigit()),
            char('"'),
        ),
        str::to_owned,
    )(input)
}

fn number(input: &str) -> Res<'_, Param> {
    let exponent = tuple((one_of("eE"), opt(one_of("+-")), digit1));
    let (rest, literal) = recognize(tuple((
        opt(one_of("+-")),
        digit1,
        opt(tuple((char('.'), digit0, opt(exponent)))),
    )))(input)?;
    let parsed = if literal.contains('.') {
        literal.parse::<f64>().map(Param::Real).ok()
    } else {
        literal.parse::<i64>().map(Param::Integer).ok()
    };
    match parsed {
        Some(param) => Ok((rest, param)),
        None => Err(nom::Err::Failure(VerboseError {
            errors: vec![(
                input,
                nom::error::VerboseErrorKind::Context("numeric literal out of range"),
            )],
        })),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    fn params(text: &str) -> Vec<Param> {
        param_list(text).unwrap().1
    }

    #[test]
    fn parses_scalars_and_markers() {
        assert_eq!(
            params("($,*,12,-3.5,1.E-05,'it''s',.T.,\"0F\",#7)"),
            vec![
                Param::Unset,
                Param::Derived,
                Param::Integer(12),
                Param::Real(-3.5),
                Param::Real(1.0e-5),
                Param::Text("it's".into()),
                Param::Enum("T".into()),
                Param::Binary("0F".into()),
                Param::Ref(7),
            ]
        );
    }

    #[test]
    fn parses_nested_lists_and_typed_values() {
        assert_eq!(
            params("((#1, #2), IFCLABEL('x'), ())"),
            vec![
                Param::List(vec![Param::Ref(1), Param::Ref(2)]),
                Param::Typed("IFCLABEL".into(), Box::new(Param::Text("x".into()))),
                Param::List(Vec::new()),
            ]
        );
    }

    #[test]
    fn exchange_reports_line_of_syntax_error() {
        let text = "ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n#1=IFCWALL('a';\nENDSEC;\nEND-ISO-10303-21;\n";
        match parse_exchange(text) {
            Err(StepError::Syntax { line, .. }) => assert_eq!(line, 5),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn instances_record_their_start_line() {
        let text = "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('TEST'));\nENDSEC;\nDATA;\n/* c */\n#10=NODE('a',$);\n#11=NODE('b',#10);\nENDSEC;\nEND-ISO-10303-21;\n";
        let exchange = parse_exchange(text).unwrap();
        assert_eq!(exchange.header.len(), 1);
        let lines: Vec<_> = exchange.instances.iter().map(|i| (i.label, i.line)).collect();
        assert_eq!(lines, vec![(10, 7), (11, 8)]);
    }
}
