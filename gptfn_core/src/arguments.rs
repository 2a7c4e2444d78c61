//! Call-time arguments and their binding to declared parameters.

use serde::Serialize;
use serde_json::Value;

use crate::declaration::{FunctionDeclaration, Parameter};
use crate::error::ArgumentError;

/// Values passed to one invocation, positionally and/or by name.
///
/// Values are serialized to JSON as soon as they are added, so the prompt
/// never depends on the caller's types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional value.
    pub fn push<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, ArgumentError> {
        Ok(self.push_value(serde_json::to_value(value)?))
    }

    /// Bind a value to a parameter by name.
    pub fn bind<T: Serialize + ?Sized>(
        self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<Self, ArgumentError> {
        Ok(self.bind_value(name, serde_json::to_value(value)?))
    }

    pub fn push_value(mut self, value: Value) -> Self {
        self.positional.push(value);
        self
    }

    pub fn bind_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.keyword.push((name.into(), value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }
}

/// Arguments resolved against a declaration, in parameter order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArguments<'a> {
    values: Vec<(&'a Parameter, Value)>,
}

impl<'a> BoundArguments<'a> {
    pub fn iter(&self) -> impl Iterator<Item = (&'a Parameter, &Value)> + '_ {
        self.values.iter().map(|(p, v)| (*p, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Resolve `arguments` the way a call would: positional values fill the
/// leading parameters, keywords fill by name, defaults fill the rest.
pub fn bind<'a>(
    declaration: &'a FunctionDeclaration,
    arguments: &Arguments,
) -> Result<BoundArguments<'a>, ArgumentError> {
    let params = declaration.parameters();

    if arguments.positional.len() > params.len() {
        return Err(ArgumentError::TooMany {
            expected: params.len(),
            found: arguments.positional.len(),
        });
    }

    let mut slots: Vec<Option<Value>> = vec![None; params.len()];
    for (slot, value) in slots.iter_mut().zip(&arguments.positional) {
        *slot = Some(value.clone());
    }

    for (name, value) in &arguments.keyword {
        let idx = params
            .iter()
            .position(|p| &p.name == name)
            .ok_or_else(|| ArgumentError::Unexpected { name: name.clone() })?;
        if slots[idx].is_some() {
            return Err(ArgumentError::Duplicate { name: name.clone() });
        }
        slots[idx] = Some(value.clone());
    }

    let values = params
        .iter()
        .zip(slots)
        .map(|(param, slot)| match slot.or_else(|| param.default.clone()) {
            Some(value) => Ok((param, value)),
            None => Err(ArgumentError::Missing {
                name: param.name.clone(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BoundArguments { values })
}
