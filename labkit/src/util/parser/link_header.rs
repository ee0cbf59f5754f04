use crate::util::pagination::{LinkHeader, LinkHeaderType};
use nom::branch::alt;
use nom::bytes::complete::{take_until, take_while1};
use nom::character::complete::{char, multispace0};
use nom::combinator::{all_consuming, map_res};
use nom::multi::{many0, separated_list1};
use nom::sequence::{delimited, preceded, separated_pair};
use nom::IResult;
use reqwest::Url;
use std::str::FromStr;

/// Parses a Link HTTP Header
/// Link headers look like this:
///     <https://gitlab.com/api/v4/projects/1/repository/tree?page=2&per_page=100>; rel="next",
///     <https://gitlab.com/api/v4/projects/1/repository/tree?page=1&per_page=100>; rel="first"
pub(crate) fn link_header(s: &str) -> Result<Vec<LinkHeader>, String> {
    match all_consuming(separated_list1(ws(char(',')), parse_link))(s) {
        Ok((_, links)) => Ok(links),
        Err(_) => Err(format!("could not parse link-header: {}", s)),
    }
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Parses an encapsulated <url> in a link-header
fn parse_url(input: &str) -> IResult<&str, Url> {
    map_res(
        ws(delimited(char('<'), take_until(">"), char('>'))),
        |raw: &str| Url::parse(raw.trim()),
    )(input)
}

/// Parses a single link-header argument, quoted or bare.
fn parse_argument(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(
        ws(take_while1(|c: char| c.is_alphanumeric() || c == '-' || c == '_')),
        char('='),
        ws(alt((
            delimited(char('"'), take_until("\""), char('"')),
            take_while1(|c: char| c != ';' && c != ',' && !c.is_whitespace()),
        ))),
    )(input)
}

/// Parses one `<url>; key="value"; ...` entry.
fn parse_link(input: &str) -> IResult<&str, LinkHeader> {
    let (rest, url) = parse_url(input)?;
    let (rest, args) = many0(preceded(ws(char(';')), parse_argument))(rest)?;

    let rel = get_arg(&args, "rel")
        .map(LinkHeaderType::from)
        .unwrap_or(LinkHeaderType::Unknown);

    Ok((
        rest,
        LinkHeader {
            page: get_param(&url, "page"),
            rel,
            url,
        },
    ))
}

fn get_param<T: FromStr>(url: &Url, key: &str) -> Option<T> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .and_then(|(_, val)| val.parse().ok())
}

fn get_arg<'a>(args: &[(&str, &'a str)], key: &str) -> Option<&'a str> {
    args.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, val)| *val)
}
