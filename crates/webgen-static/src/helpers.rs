//! Helper functions callable from every template.
//!
//! Helpers share one signature, [`HelperFn`], and are validated when they
//! are registered rather than when a template calls them.

use std::collections::BTreeMap;
use std::path::PathBuf;

use minijinja::value::{Rest, Value};
use minijinja::{Environment, Error, ErrorKind};

/// Signature shared by all template helpers.
pub type HelperFn = fn(&[Value]) -> Result<Value, Error>;

/// Errors raised while registering helpers.
#[derive(Debug, thiserror::Error)]
pub enum HelperError {
    #[error("helper name {0:?} is not a valid identifier")]
    InvalidName(String),

    #[error("helper {0:?} is already registered")]
    Duplicate(String),
}

/// A named set of helpers.
#[derive(Debug, Clone, Default)]
pub struct HelperSet {
    helpers: BTreeMap<String, HelperFn>,
}

impl HelperSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The helpers every site gets: `section` and `path_join`.
    pub fn builtin() -> Self {
        let mut helpers = BTreeMap::new();
        helpers.insert("section".to_string(), section as HelperFn);
        helpers.insert("path_join".to_string(), path_join as HelperFn);
        Self { helpers }
    }

    /// Add a helper. Names must be identifiers and unique within the set.
    pub fn register(&mut self, name: &str, helper: HelperFn) -> Result<(), HelperError> {
        if !is_identifier(name) {
            return Err(HelperError::InvalidName(name.to_string()));
        }
        if self.helpers.contains_key(name) {
            return Err(HelperError::Duplicate(name.to_string()));
        }
        self.helpers.insert(name.to_string(), helper);
        Ok(())
    }

    /// Whether a helper with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    /// Helper names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.helpers.keys().map(String::as_str)
    }

    /// Make every helper callable from templates in `env`.
    pub(crate) fn install(&self, env: &mut Environment<'static>) {
        for (name, helper) in &self.helpers {
            let helper = *helper;
            env.add_function(name.clone(), move |args: Rest<Value>| helper(&args.0));
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn string_arg<'a>(helper: &str, args: &'a [Value], index: usize) -> Result<&'a str, Error> {
    args.get(index).and_then(Value::as_str).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("{helper} expects a string as argument {}", index + 1),
        )
    })
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// `section(title[, id])`: a linkable section heading.
pub fn section(args: &[Value]) -> Result<Value, Error> {
    if args.len() > 2 {
        return Err(Error::new(
            ErrorKind::TooManyArguments,
            "section takes a title and an optional id",
        ));
    }

    let title = string_arg("section", args, 0)?;
    let id = match args.get(1) {
        Some(_) => string_arg("section", args, 1)?.to_string(),
        None => webgen_mdx::slugify(title),
    };

    let id = escape_html(&id);
    Ok(Value::from_safe_string(format!(
        "<h2 id=\"{id}\"><a href=\"#{id}\">{}</a></h2>",
        escape_html(title)
    )))
}

/// `path_join(seg, ...)`: join segments with the platform's path rules.
pub fn path_join(args: &[Value]) -> Result<Value, Error> {
    let path = (0..args.len())
        .map(|i| string_arg("path_join", args, i))
        .collect::<Result<PathBuf, Error>>()?;

    Ok(Value::from(path.to_string_lossy().into_owned()))
}
