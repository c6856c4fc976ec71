/// parse document with structure like " title1 key1: value1, value2 key2: value2 title2 key3:value3, value4" which has titles and
/// pairs key-vector of values. Values without quotes end at a comma, whitespace or semicolon; a value in double quotes
/// may contain anything but a double quote, so formulas with spaces are written as "x^2 + 1".
/// Lines starting with //, #, % or ; are comments.
///
/// ```text
/// quadrature
///   function: "sin(x) / x"
///   a: 1
///   b: 2
///   method: simpson, trapezoid
/// ```
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{alpha1, alphanumeric1, char, multispace0, space0},
    combinator::{map, map_res, recognize},
    multi::{many0, many1, separated_list0},
    sequence::{delimited, pair, separated_pair, terminated},
};
use std::collections::HashMap;
use std::fmt::Display;

pub type DocumentMap = HashMap<String, SectionMap>;
pub type SectionMap = HashMap<String, Option<Vec<Value>>>;
/// enum to represent different value types:
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Float(f64),
    Integer(i64),
    Boolean(bool),
}

impl Value {
    pub fn as_string(&self) -> Option<&String> {
        if let Value::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// numeric value; integers are widened to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        if let Value::Boolean(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    // Try to convert to string representation
    pub fn to_string_value(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Float(f) => f.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Boolean(b) => b.to_string(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Float(val) => write!(f, "{}", val),
            Value::Integer(val) => write!(f, "{}", val),
            Value::Boolean(val) => write!(f, "{}", val),
        }
    }
}

fn parse_word(input: &str) -> IResult<&str, String> {
    let parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));
    map(parser, String::from).parse(input)
}

/// Parses a title (word characters without spaces)
fn parse_title(input: &str) -> IResult<&str, String> {
    let (input, result) = parse_word(input)?;
    // Ignore trailing whitespace and newline characters
    Ok((input.trim(), result))
}

/// Parses a key (word characters without spaces)
fn parse_key(input: &str) -> IResult<&str, String> {
    parse_word(input)
}

/// "..." - always a string, never converted to a number
fn parse_quoted(input: &str) -> IResult<&str, Value> {
    map(delimited(char('"'), take_while(|c: char| c != '"'), char('"')), |s: &str| {
        Value::String(s.to_string())
    })
    .parse(input)
}

fn parse_bare(input: &str) -> IResult<&str, Value> {
    // Parse a single value - excluding commas, whitespace, newlines, and semicolons
    let value_parser = take_while1(|c: char| !matches!(c, ',' | ' ' | '\t' | '\r' | '\n' | ';' | '"'));
    let mut value_parser = map_res(value_parser, |s: &str| -> Result<Value, String> {
        // Try parsing as different types in order
        if let Ok(val) = s.parse::<i64>() {
            Ok(Value::Integer(val))
        } else if let Ok(val) = s.parse::<f64>() {
            Ok(Value::Float(val))
        } else if let Ok(val) = s.parse::<bool>() {
            Ok(Value::Boolean(val))
        } else {
            Ok(Value::String(s.to_string()))
        }
    });
    value_parser.parse(input)
}

fn parse_value(input: &str) -> IResult<&str, Value> {
    alt((parse_quoted, parse_bare)).parse(input)
}

fn parse_value_list(input: &str) -> IResult<&str, Vec<Value>> {
    let (input, _) = space0(input)?;
    // values are separated by commas with optional spaces on both sides
    let separator_coma = delimited(space0, tag(","), space0);
    separated_list0(separator_coma, parse_value).parse(input)
}

/// Parses a key-value pair where value is a list
fn parse_key_value_pair(input: &str) -> IResult<&str, (String, Vec<Value>)> {
    let colon_separator = delimited(space0, tag(":"), space0);
    let mut parser = separated_pair(parse_key, colon_separator, parse_value_list);
    let (input, result) = parser.parse(input)?;
    Ok((input.trim(), result))
}

/// Parses a section with a title and multiple key-value pairs
fn parse_section(input: &str) -> IResult<&str, (String, HashMap<String, Vec<Value>>)> {
    let (input, _) = space0(input)?;
    let (input, title) = parse_title(input)?;
    let (input, _) = multispace0(input)?;
    let mut parser = many1(terminated(parse_key_value_pair, space0));
    let (input, pairs) = parser.parse(input)?;

    let mut section_map = HashMap::new();
    for (key, values) in pairs {
        section_map.insert(key, values);
    }
    Ok((input, (title, section_map)))
}

/// Filters out comment lines (starting with //, #, %, or ;)
pub fn filter_comments(input: &str) -> String {
    input
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("//")
                && !trimmed.starts_with('#')
                && !trimmed.starts_with('%')
                && !trimmed.starts_with(';')
                && !trimmed.is_empty()
        })
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Parses the entire document into a HashMap
pub fn parse_document(input: &str) -> IResult<&str, DocumentMap> {
    let mut parser = many1(delimited(space0, parse_section, multispace0));
    let (input, sections) = parser.parse(input)?;

    let mut result = HashMap::new();
    for (title, section_map) in sections.into_iter() {
        let title_map = section_map
            .into_iter()
            .map(|(key, values)| (key, Some(values)))
            .collect();
        result.insert(title, title_map);
    }
    Ok((input, result))
}

/// Parses a document (comments allowed) that must be consumed entirely.
/// With a template, every title and key of the template is present in the result,
/// keys missing from the document map to None.
pub fn parse_document_as(input: &str, template: Option<&DocumentMap>) -> Result<DocumentMap, String> {
    let filtered = filter_comments(input);
    let (remaining, mut parsed) = match parse_document(filtered.trim_start()) {
        Ok(ok) => ok,
        Err(e) => return Err(format!("Parsing error: {:?}", e)),
    };
    if !remaining.trim().is_empty() {
        return Err(format!(
            "Failed to parse entire document. Remaining: '{}'",
            remaining
        ));
    }
    if let Some(template) = template {
        for (title, keys_map) in template {
            let section_map = parsed.entry(title.clone()).or_default();
            for key in keys_map.keys() {
                section_map.entry(key.clone()).or_insert(None);
            }
        }
    }
    Ok(parsed)
}

/////////////////////////////TESTS////////////////////////////////////////////////////
