//! A small `{{ ... }}` template language.
//!
//! - `{{ name }}` prints a value; plain text is HTML-escaped, [`Value::Html`]
//!   is printed verbatim
//! - `{{#if name}} ... {{else}} ... {{/if}}`
//! - `{{#each name}} ... {{/each}}`, with `{{ . }}` for the current item
//! - `{{! comment }}`
//!
//! Names resolve against the helper table first, then the data.

use std::collections::BTreeMap;
use std::mem;

use crate::errors::WikiError;
use crate::utils::escape_html;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A value a template can print, test or iterate
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    /// Already-escaped markup
    Html(String),
    Bool(bool),
    List(Vec<Value>),
}

impl Value {
    fn truthy(&self) -> bool {
        match self {
            Value::Text(s) | Value::Html(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::List(items) => !items.is_empty(),
        }
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Value::Text(s) => out.push_str(&escape_html(s)),
            Value::Html(s) => out.push_str(s),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::List(items) => {
                for item in items {
                    item.write_to(out);
                }
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items.into_iter().map(Value::Text).collect())
    }
}

/// Named values handed to a template
#[derive(Debug, Clone, Default)]
pub struct Data(BTreeMap<String, Value>);

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

type Helper<'a> = Box<dyn Fn() -> Value + 'a>;

/// Helper functions callable by name from a template
#[derive(Default)]
pub struct FuncMap<'a> {
    funcs: BTreeMap<&'static str, Helper<'a>>,
}

impl<'a> FuncMap<'a> {
    pub fn new() -> Self {
        Self { funcs: BTreeMap::new() }
    }

    pub fn with(mut self, name: &'static str, f: impl Fn() -> Value + 'a) -> Self {
        self.funcs.insert(name, Box::new(f));
        self
    }

    fn call(&self, name: &str) -> Option<Value> {
        self.funcs.get(name).map(|f| f())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Expr(String),
    If { cond: String, then: Vec<Node>, otherwise: Vec<Node> },
    Each { list: String, body: Vec<Node> },
}

#[derive(Debug)]
enum Block {
    If(String),
    Each(String),
}

#[derive(Debug)]
struct OpenBlock {
    block: Block,
    nodes: Vec<Node>,
    then: Option<Vec<Node>>,
}

/// A parsed template
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(name: &str, source: &str) -> Result<Self, WikiError> {
        let mut root = Vec::new();
        let mut stack: Vec<OpenBlock> = Vec::new();
        let mut rest = source;

        while let Some(start) = rest.find(OPEN) {
            if start > 0 {
                current(&mut stack, &mut root).push(Node::Text(rest[..start].to_string()));
            }
            let after = &rest[start + OPEN.len()..];
            let end = after
                .find(CLOSE)
                .ok_or_else(|| WikiError::template(name, "unclosed `{{`"))?;
            let tag = after[..end].trim();
            rest = &after[end + CLOSE.len()..];

            if tag.starts_with('!') {
                continue;
            } else if let Some(cond) = tag.strip_prefix("#if ") {
                let block = Block::If(ident(name, cond)?);
                stack.push(OpenBlock { block, nodes: Vec::new(), then: None });
            } else if let Some(list) = tag.strip_prefix("#each ") {
                let block = Block::Each(ident(name, list)?);
                stack.push(OpenBlock { block, nodes: Vec::new(), then: None });
            } else if tag == "else" {
                match stack.last_mut() {
                    Some(open) if matches!(open.block, Block::If(_)) && open.then.is_none() => {
                        open.then = Some(mem::take(&mut open.nodes));
                    }
                    _ => return Err(WikiError::template(name, "`else` outside of `#if`")),
                }
            } else if tag == "/if" || tag == "/each" {
                let open = stack
                    .pop()
                    .ok_or_else(|| WikiError::template(name, format!("unexpected `{}`", tag)))?;
                let node = match (open.block, tag) {
                    (Block::If(cond), "/if") => match open.then {
                        Some(then) => Node::If { cond, then, otherwise: open.nodes },
                        None => Node::If { cond, then: open.nodes, otherwise: Vec::new() },
                    },
                    (Block::Each(list), "/each") => Node::Each { list, body: open.nodes },
                    _ => return Err(WikiError::template(name, format!("mismatched `{}`", tag))),
                };
                current(&mut stack, &mut root).push(node);
            } else {
                let expr = ident(name, tag)?;
                current(&mut stack, &mut root).push(Node::Expr(expr));
            }
        }

        if !rest.is_empty() {
            current(&mut stack, &mut root).push(Node::Text(rest.to_string()));
        }
        if let Some(open) = stack.last() {
            let what = match &open.block {
                Block::If(c) => format!("#if {}", c),
                Block::Each(l) => format!("#each {}", l),
            };
            return Err(WikiError::template(name, format!("unclosed `{}`", what)));
        }

        Ok(Self { name: name.to_string(), nodes: root })
    }

    pub fn execute(&self, funcs: &FuncMap<'_>, data: &Data) -> Result<String, WikiError> {
        let mut out = String::new();
        let scope = Scope { template: &self.name, funcs, data, dot: None };
        scope.exec(&self.nodes, &mut out)?;
        Ok(out)
    }
}

fn current<'s>(stack: &'s mut [OpenBlock], root: &'s mut Vec<Node>) -> &'s mut Vec<Node> {
    match stack.last_mut() {
        Some(open) => &mut open.nodes,
        None => root,
    }
}

fn ident(template: &str, raw: &str) -> Result<String, WikiError> {
    let raw = raw.trim();
    let valid = raw == "."
        || (!raw.is_empty() && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    if valid {
        Ok(raw.to_string())
    } else {
        Err(WikiError::template(template, format!("bad expression `{}`", raw)))
    }
}

struct Scope<'t> {
    template: &'t str,
    funcs: &'t FuncMap<'t>,
    data: &'t Data,
    dot: Option<&'t Value>,
}

impl<'t> Scope<'t> {
    fn lookup(&self, name: &str) -> Result<Value, WikiError> {
        if name == "." {
            return self
                .dot
                .cloned()
                .ok_or_else(|| WikiError::template(self.template, "`.` used outside of `#each`"));
        }
        if let Some(value) = self.funcs.call(name) {
            return Ok(value);
        }
        self.data
            .get(name)
            .cloned()
            .ok_or_else(|| WikiError::template(self.template, format!("undefined name `{}`", name)))
    }

    fn exec(&self, nodes: &[Node], out: &mut String) -> Result<(), WikiError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Expr(name) => self.lookup(name)?.write_to(out),
                Node::If { cond, then, otherwise } => {
                    let branch = if self.lookup(cond)?.truthy() { then } else { otherwise };
                    self.exec(branch, out)?;
                }
                Node::Each { list, body } => match self.lookup(list)? {
                    Value::List(items) => {
                        for item in &items {
                            let inner = Scope {
                                template: self.template,
                                funcs: self.funcs,
                                data: self.data,
                                dot: Some(item),
                            };
                            inner.exec(body, out)?;
                        }
                    }
                    _ => {
                        let detail = format!("`{}` is not a list", list);
                        return Err(WikiError::template(self.template, detail));
                    }
                },
            }
        }
        Ok(())
    }
}
