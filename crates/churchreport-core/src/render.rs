//! Mustache-style templating for flat OpenDocument files.
//!
//! Supported tags:
//! - `{{name}}` value, XML-escaped
//! - `{{&name}}` value, unescaped
//! - `{{#name}}..{{/name}}` repeat per array item, or render once for a
//!   truthy value with that value as the innermost scope
//! - `{{^name}}..{{/name}}` render once when the value is falsy
//!
//! Names may be dotted (`person.firstName`) and `.` is the current item.
//! Lookups search the scopes from the innermost outward. Falsy values are
//! `null`, `false`, `""` and `[]`; missing names render as empty.

use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Tag syntax: `{{`, optional sigil, name, `}}`
const TAG_PATTERN: &str = r"\{\{\s*([#^/&]?)\s*([A-Za-z0-9_.\-]+)\s*\}\}";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Section '{0}' is never closed")]
    UnclosedSection(String),

    #[error("Found {{{{/{found}}}}} while section '{expected}' is open")]
    MismatchedClose { expected: String, found: String },

    #[error("Found {{{{/{0}}}}} without an open section")]
    UnopenedClose(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Var { name: String, escape: bool },
    Section { name: String, inverted: bool, children: Vec<Node> },
}

/// A parsed template, renderable any number of times.
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self> {
        let tag = Regex::new(TAG_PATTERN)?;

        // Each open section keeps its name and the nodes collected so far
        let mut stack: Vec<(String, bool, Vec<Node>)> = Vec::new();
        let mut root: Vec<Node> = Vec::new();
        let mut last_end = 0;

        for caps in tag.captures_iter(source) {
            let (Some(whole), Some(sigil), Some(name)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            let current = stack.last_mut().map(|(_, _, nodes)| nodes).unwrap_or(&mut root);

            if whole.start() > last_end {
                current.push(Node::Text(source[last_end..whole.start()].to_string()));
            }
            last_end = whole.end();

            let name = name.as_str().to_string();
            match sigil.as_str() {
                "#" => stack.push((name, false, Vec::new())),
                "^" => stack.push((name, true, Vec::new())),
                "/" => {
                    let (open, inverted, children) = stack
                        .pop()
                        .ok_or_else(|| TemplateError::UnopenedClose(name.clone()))?;
                    if open != name {
                        return Err(TemplateError::MismatchedClose {
                            expected: open,
                            found: name,
                        }
                        .into());
                    }
                    let section = Node::Section {
                        name,
                        inverted,
                        children,
                    };
                    stack.last_mut().map(|(_, _, nodes)| nodes).unwrap_or(&mut root).push(section);
                }
                "&" => current.push(Node::Var { name, escape: false }),
                _ => current.push(Node::Var { name, escape: true }),
            }
        }

        if let Some((open, _, _)) = stack.pop() {
            return Err(TemplateError::UnclosedSection(open).into());
        }
        if last_end < source.len() {
            root.push(Node::Text(source[last_end..].to_string()));
        }

        Ok(Self { nodes: root })
    }

    pub fn render<T: Serialize + ?Sized>(&self, context: &T) -> Result<String> {
        let context = serde_json::to_value(context).context("Failed to serialize template context")?;
        let mut out = String::new();
        render_nodes(&self.nodes, &mut vec![&context], &mut out);
        Ok(out)
    }
}

/// Parse and render in one go.
pub fn render_str<T: Serialize + ?Sized>(source: &str, context: &T) -> Result<String> {
    Template::parse(source)?.render(context)
}

/// Render the template file at `template` into `output`.
pub fn render_file<T: Serialize + ?Sized>(template: &Path, output: &Path, context: &T) -> Result<()> {
    let source = std::fs::read_to_string(template)
        .with_context(|| format!("Failed to read template {}", template.display()))?;
    let rendered = Template::parse(&source)
        .with_context(|| format!("Invalid template {}", template.display()))?
        .render(context)?;
    std::fs::write(output, rendered)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    debug!(template = %template.display(), output = %output.display(), "Rendered template");
    Ok(())
}

fn render_nodes<'a>(nodes: &[Node], scopes: &mut Vec<&'a Value>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var { name, escape } => {
                let text = lookup(scopes, name).map(display).unwrap_or_default();
                if *escape {
                    out.push_str(&escape_xml(&text));
                } else {
                    out.push_str(&text);
                }
            }
            Node::Section {
                name,
                inverted,
                children,
            } => {
                let value = lookup(scopes, name);
                let truthy = value.is_some_and(is_truthy);

                if *inverted {
                    if !truthy {
                        render_nodes(children, scopes, out);
                    }
                    continue;
                }

                match value {
                    Some(Value::Array(items)) => {
                        for item in items {
                            scopes.push(item);
                            render_nodes(children, scopes, out);
                            scopes.pop();
                        }
                    }
                    Some(v) if truthy => {
                        scopes.push(v);
                        render_nodes(children, scopes, out);
                        scopes.pop();
                    }
                    _ => {}
                }
            }
        }
    }
}

fn lookup<'a>(scopes: &[&'a Value], name: &str) -> Option<&'a Value> {
    if name == "." {
        return scopes.last().copied();
    }

    let mut parts = name.split('.');
    let head = parts.next()?;
    let mut value = scopes.iter().rev().find_map(|scope| scope.get(head))?;
    for part in parts {
        value = value.get(part)?;
    }
    Some(value)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Number(_) | Value::Object(_) => true,
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
