//! Parameter substitution into SQL templates.
//!
//! Placeholders use brace syntax: `{0:s}`, `{1:d}`, `{name:s}`, `{}` for
//! automatic numbering and `{{` / `}}` for literal braces. Values are rendered
//! as SQL literals before substitution.
//!
//! Known limitation: string literals drop backslashes instead of doubling
//! them, and carriage returns become newlines. `'a\b'` is sent as `'ab'`.
//! Callers that need a literal backslash cannot express it through
//! parameters.

use crate::error::{Error, Result};
use crate::types::{Params, SqlValue};

#[derive(Debug, Clone, PartialEq)]
enum FieldRef {
    Index(usize),
    Name(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Numbering {
    Unset,
    Automatic,
    Manual,
}

#[derive(Debug)]
struct Placeholder<'a> {
    text: &'a str,
    field: FieldRef,
    spec: &'a str,
}

/// Substitute `params` into `template`.
pub fn format_query(template: &str, params: &Params) -> Result<String> {
    let mut out = String::with_capacity(template.len() + 16);
    let mut numbering = Numbering::Unset;
    let mut next_auto = 0;
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('}') {
            return Err(Error::Programming(format!(
                "single '}}' encountered in query at offset {}",
                template.len() - tail.len()
            )));
        } else {
            let end = tail.find('}').ok_or_else(|| {
                Error::Programming(format!(
                    "unmatched '{{' in query at offset {}",
                    template.len() - tail.len()
                ))
            })?;
            let inner = &tail[1..end];
            if inner.contains('{') {
                return Err(Error::Programming(format!(
                    "nested placeholder in query: {{{}}}",
                    inner
                )));
            }
            let placeholder = parse_placeholder(&tail[..=end], inner, &mut numbering, &mut next_auto)?;
            let value = lookup(params, &placeholder.field)?;
            out.push_str(&render(&placeholder, value)?);
            rest = &tail[end + 1..];
        }
    }
    out.push_str(rest);
    Ok(out)
}

fn parse_placeholder<'a>(
    text: &'a str,
    inner: &'a str,
    numbering: &mut Numbering,
    next_auto: &mut usize,
) -> Result<Placeholder<'a>> {
    let (name, spec) = match inner.split_once(':') {
        Some((name, spec)) => (name, spec),
        None => (inner, ""),
    };

    let field = if name.is_empty() {
        if *numbering == Numbering::Manual {
            return Err(Error::Programming(
                "cannot switch from manual field numbering to automatic".into(),
            ));
        }
        *numbering = Numbering::Automatic;
        *next_auto += 1;
        FieldRef::Index(*next_auto - 1)
    } else if name.bytes().all(|b| b.is_ascii_digit()) {
        if *numbering == Numbering::Automatic {
            return Err(Error::Programming(
                "cannot switch from automatic field numbering to manual".into(),
            ));
        }
        *numbering = Numbering::Manual;
        let index = name.parse().map_err(|_| {
            Error::Programming(format!("placeholder index too large: {}", text))
        })?;
        FieldRef::Index(index)
    } else {
        FieldRef::Name(name.to_string())
    };

    Ok(Placeholder { text, field, spec })
}

fn lookup<'p>(params: &'p Params, field: &FieldRef) -> Result<&'p SqlValue> {
    match field {
        FieldRef::Index(index) => {
            params
                .positional()
                .get(*index)
                .ok_or(Error::MissingPositional {
                    index: *index,
                    supplied: params.positional().len(),
                })
        }
        FieldRef::Name(name) => params
            .named()
            .get(name)
            .ok_or_else(|| Error::MissingNamed(name.clone())),
    }
}

fn render(placeholder: &Placeholder<'_>, value: &SqlValue) -> Result<String> {
    if let SqlValue::Null = value {
        return Ok("null".to_string());
    }
    match placeholder.spec {
        "" | "s" => literal(placeholder, value),
        "d" => match value {
            SqlValue::Int(_) | SqlValue::Float(_) => literal(placeholder, value),
            other => Err(type_error(
                placeholder,
                format!("format specifier 'd' requires a number, got {:?}", other),
            )),
        },
        spec => Err(type_error(
            placeholder,
            format!("unsupported format specifier {:?}", spec),
        )),
    }
}

fn literal(placeholder: &Placeholder<'_>, value: &SqlValue) -> Result<String> {
    let rendered = match value {
        SqlValue::Null => "null".to_string(),
        SqlValue::Bool(b) => b.to_string(),
        SqlValue::Int(i) => i.to_string(),
        SqlValue::Float(f) => format!("{:?}", f),
        SqlValue::Text(s) => escape_string(s),
        SqlValue::Date(d) => format!("DATE '{}'", d.format("%Y-%m-%d")),
        SqlValue::Timestamp(ts) => {
            format!("TIMESTAMP '{}'", ts.format("%Y-%m-%d %H:%M:%S%.3f"))
        }
        SqlValue::List(items) => {
            if items.is_empty() {
                return Err(type_error(placeholder, "empty list".to_string()));
            }
            let rendered = items
                .iter()
                .map(|item| literal(placeholder, item))
                .collect::<Result<Vec<_>>>()?;
            format!("({})", rendered.join(", "))
        }
    };
    Ok(rendered)
}

/// Quote a string literal: backslashes are dropped, `\r` becomes `\n` and
/// single quotes are doubled.
pub fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => {}
            '\r' => out.push('\n'),
            '\'' => out.push_str("''"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn type_error(placeholder: &Placeholder<'_>, reason: String) -> Error {
    Error::ParameterType {
        placeholder: placeholder.text.to_string(),
        reason,
    }
}
