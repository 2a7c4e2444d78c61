//! Function declarations: the metadata a prompt is rendered from.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

use crate::error::ConfigurationError;

/// The three return types an LLM-backed function can declare.
///
/// The kind alone decides whether the request is streamed and which decoder
/// runs on the completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReturnKind {
    /// `String`: the whole completion, trimmed.
    Text,
    /// `bool`: the completion parsed as a yes/no answer.
    Boolean,
    /// `CompletionStream`: completion chunks as they arrive.
    Stream,
}

impl ReturnKind {
    pub const fn is_streaming(self) -> bool {
        matches!(self, ReturnKind::Stream)
    }

    /// Rust type name shown in signatures and error messages.
    pub const fn type_name(self) -> &'static str {
        match self {
            ReturnKind::Text => "String",
            ReturnKind::Boolean => "bool",
            ReturnKind::Stream => "CompletionStream",
        }
    }
}

impl fmt::Display for ReturnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for ReturnKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.as_str() {
            "String" | "str" | "&str" | "&'staticstr" => Ok(ReturnKind::Text),
            "bool" => Ok(ReturnKind::Boolean),
            "CompletionStream" => Ok(ReturnKind::Stream),
            _ => Err(()),
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    /// Declared type as written by the author, e.g. `&str` or `Vec<u32>`.
    pub ty: String,
    /// Used when a call leaves the parameter unbound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Immutable description of an LLM-backed function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDeclaration {
    name: String,
    doc: String,
    parameters: Vec<Parameter>,
    returns: ReturnKind,
}

impl FunctionDeclaration {
    /// Validate the raw pieces of a declaration.
    ///
    /// `doc` is dedented and trimmed; `returns` is the declared return type as
    /// text and must name one of the supported [`ReturnKind`]s.
    pub fn new(
        name: impl Into<String>,
        doc: &str,
        parameters: Vec<Parameter>,
        returns: &str,
    ) -> Result<Self, ConfigurationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigurationError::EmptyName);
        }

        let doc = dedent(doc);
        if doc.is_empty() {
            return Err(ConfigurationError::MissingDocstring { name });
        }

        let returns = returns.parse::<ReturnKind>().map_err(|()| {
            ConfigurationError::UnsupportedReturnType {
                name: name.clone(),
                found: returns.trim().to_owned(),
            }
        })?;

        for (i, param) in parameters.iter().enumerate() {
            if parameters[..i].iter().any(|p| p.name == param.name) {
                return Err(ConfigurationError::DuplicateParameter {
                    function: name,
                    parameter: param.name.clone(),
                });
            }
        }

        Ok(Self {
            name,
            doc,
            parameters,
            returns,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn returns(&self) -> ReturnKind {
        self.returns
    }

    /// `name(a: T, b: U) -> R`
    pub fn signature(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({}) -> {}", self.name, params, self.returns)
    }
}

/// Strip the indentation shared by all non-blank lines, then trim.
fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    text.lines()
        .map(|l| {
            if l.trim().is_empty() {
                ""
            } else {
                l.get(indent..).unwrap_or_else(|| l.trim_start())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
}
