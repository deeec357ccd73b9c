//! Indent-preserving text templates.
//!
//! Placeholders are written `${name}`. A scalar is spliced in as is. A line
//! sequence is joined with newlines and every line after the first is
//! prefixed with the column where the placeholder starts, so a nested block
//! keeps the indentation of the surrounding code. Blank lines stay empty.
//! At column 0 the lines are joined untouched.

use indexmap::IndexMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template references unknown placeholder '{name}'")]
    UnknownPlaceholder { name: String },

    #[error("unterminated placeholder starting at byte {offset}")]
    Unterminated { offset: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nugget {
    Scalar(String),
    Lines(Vec<String>),
}

impl From<String> for Nugget {
    fn from(value: String) -> Self {
        Nugget::Scalar(value)
    }
}

impl From<&str> for Nugget {
    fn from(value: &str) -> Self {
        Nugget::Scalar(value.to_string())
    }
}

impl From<Vec<String>> for Nugget {
    fn from(lines: Vec<String>) -> Self {
        Nugget::Lines(lines)
    }
}

/// Values available to a template.
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: IndexMap<String, Nugget>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Nugget>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Nugget>) -> &mut Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Nugget> {
        self.values.get(name)
    }
}

pub fn format(template: &str, context: &Context) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut consumed = 0;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or(TemplateError::Unterminated {
            offset: consumed + start,
        })?;
        let name = after[..end].trim();

        match context.get(name) {
            Some(Nugget::Scalar(value)) => out.push_str(value),
            Some(Nugget::Lines(lines)) => {
                let column = out
                    .rsplit('\n')
                    .next()
                    .map_or(0, |line| line.chars().count());
                out.push_str(&indent_lines(lines, column));
            }
            None => {
                return Err(TemplateError::UnknownPlaceholder {
                    name: name.to_string(),
                });
            }
        }

        let skipped = start + 2 + end + 1;
        consumed += skipped;
        rest = &rest[skipped..];
    }
    out.push_str(rest);

    Ok(out)
}

fn indent_lines(lines: &[String], column: usize) -> String {
    if column == 0 {
        return lines.join("\n");
    }
    let pad = " ".repeat(column);
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 || line.trim().is_empty() {
                line.trim_end().to_string()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Left-align a table: every column but the last is padded to its widest
/// cell, cells are separated by one space.
pub fn tabulate(rows: &[Vec<String>]) -> Vec<String> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            rows.iter()
                .filter_map(|row| row.get(c))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    rows.iter()
        .map(|row| {
            let last = row.len().saturating_sub(1);
            row.iter()
                .enumerate()
                .map(|(c, cell)| {
                    if c == last {
                        cell.clone()
                    } else {
                        format!("{:<width$}", cell, width = widths[c])
                    }
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}
