//! Text front door for modes, facts and examples.
//!
//! Two line grammars are accepted:
//!
//! - facts and examples: `[weight::]name(arg1,arg2,...).`
//! - modes: `name(<sym>type,<sym>type,...)[.]` with `<sym>` one of `+ - ` #`
//!
//! Whitespace around tokens is tolerated. Failures carry the offending line
//! and the byte offset where parsing stopped.

use nom::{
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{anychar, char as nomchar, multispace0},
    combinator::{all_consuming, opt},
    error::ParseError,
    multi::separated_list1,
    number::complete::double,
    sequence::{delimited, pair, terminated, tuple},
    IResult,
};

use crate::error::{GrammarError, GrammarResult};
use crate::term::Fact;

use super::{Mode, ModeArg, ModeSymbol};

type In<'a> = &'a str;

fn ws<'a, F, O, E>(inner: F) -> impl FnMut(In<'a>) -> IResult<In<'a>, O, E>
where
    E: ParseError<In<'a>>,
    F: FnMut(In<'a>) -> IResult<In<'a>, O, E>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn identifier(s: In) -> IResult<In, In> {
    take_while1(is_ident_char)(s)
}

fn weight(s: In) -> IResult<In, f64> {
    terminated(ws(double), tag("::"))(s)
}

/// Arguments may be empty here; emptiness is reported with its position.
fn fact_arguments(s: In) -> IResult<In, Vec<In>> {
    delimited(
        nomchar('('),
        separated_list1(nomchar(','), ws(take_while(is_ident_char))),
        nomchar(')'),
    )(s)
}

type RawFact<'a> = (Option<f64>, In<'a>, Vec<In<'a>>);

fn fact<'a>(s: In<'a>) -> IResult<In<'a>, RawFact<'a>> {
    let (rest, (weight, name, args, _)) = tuple((
        opt(weight),
        ws(identifier),
        fact_arguments,
        ws(nomchar('.')),
    ))(s)?;
    Ok((rest, (weight, name, args)))
}

fn mode_argument(s: In) -> IResult<In, (char, In)> {
    ws(pair(anychar, identifier))(s)
}

fn mode(s: In) -> IResult<In, (In, Vec<(char, In)>)> {
    let (rest, (name, args, _)) = tuple((
        ws(identifier),
        delimited(
            nomchar('('),
            separated_list1(nomchar(','), mode_argument),
            nomchar(')'),
        ),
        opt(ws(nomchar('.'))),
    ))(s)?;
    Ok((rest, (name, args)))
}

/// Byte offset into `line` where a nom error stopped.
fn failure_offset(line: &str, err: nom::Err<nom::error::Error<In>>) -> usize {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => line.len() - e.input.len(),
        nom::Err::Incomplete(_) => line.len(),
    }
}

/// Parse one fact or example line.
pub fn parse_fact(line: &str) -> GrammarResult<Fact> {
    let line = line.trim();
    let (_, (weight, name, args)) =
        all_consuming(fact)(line).map_err(|e| GrammarError::MalformedFact {
            line: line.to_string(),
            offset: failure_offset(line, e),
        })?;

    if let Some(position) = args.iter().position(|a| a.is_empty()) {
        return Err(GrammarError::EmptyArgument {
            line: line.to_string(),
            position,
        });
    }

    let weight = weight.unwrap_or(1.0);
    if !weight.is_finite() {
        return Err(GrammarError::InvalidWeight {
            line: line.to_string(),
            weight: weight.to_string(),
        });
    }

    let arguments = args.into_iter().map(str::to_string).collect();
    Ok(Fact::new(name, arguments).with_weight(weight))
}

/// Parse fact lines, skipping blank ones.
pub fn parse_facts<I, S>(lines: I) -> GrammarResult<Vec<Fact>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter(|l| !l.as_ref().trim().is_empty())
        .map(|l| parse_fact(l.as_ref()))
        .collect()
}

/// Parse one mode declaration.
pub fn parse_mode(line: &str) -> GrammarResult<Mode> {
    let line = line.trim();
    let (_, (name, args)) =
        all_consuming(mode)(line).map_err(|e| GrammarError::MalformedMode {
            line: line.to_string(),
            offset: failure_offset(line, e),
        })?;

    let arguments = args
        .into_iter()
        .map(|(symbol, type_name)| {
            ModeSymbol::from_char(symbol)
                .map(|symbol| ModeArg::new(symbol, type_name))
                .ok_or_else(|| GrammarError::UnknownModeSymbol {
                    line: line.to_string(),
                    symbol,
                })
        })
        .collect::<GrammarResult<Vec<_>>>()?;

    Ok(Mode::new(name, arguments))
}

/// Parse mode lines, skipping blank ones.
pub fn parse_modes<I, S>(lines: I) -> GrammarResult<Vec<Mode>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter(|l| !l.as_ref().trim().is_empty())
        .map(|l| parse_mode(l.as_ref()))
        .collect()
}
