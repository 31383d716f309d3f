//! Imperative commands and their schemas.

use crate::value::Value;
use core::fmt;
use std::collections::HashMap;
use thiserror::Error;

/// Identifies a command.
///
/// Integer ids are a legacy alias; they resolve through the same command table as names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommandId {
    Name(String),
    Legacy(i32),
}

impl From<&str> for CommandId {
    fn from(name: &str) -> Self {
        CommandId::Name(name.to_owned())
    }
}

impl From<String> for CommandId {
    fn from(name: String) -> Self {
        CommandId::Name(name)
    }
}

impl From<i32> for CommandId {
    fn from(id: i32) -> Self {
        CommandId::Legacy(id)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CommandId::Name(name) => write!(f, "{:?}", name),
            CommandId::Legacy(id) => write!(f, "#{}", id),
        }
    }
}

/// The kind of value a command argument must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    Number,
    Boolean,
    String,
    Array,
    Map,
    /// Anything, including null.
    Any,
}

impl ArgKind {
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (ArgKind::Any, _) => true,
            (ArgKind::Number, Value::Number(_)) => true,
            (ArgKind::Boolean, Value::Bool(_)) => true,
            (ArgKind::String, Value::String(_)) => true,
            (ArgKind::Array, Value::Array(_)) => true,
            (ArgKind::Map, Value::Object(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ArgKind::Number => "number",
            ArgKind::Boolean => "boolean",
            ArgKind::String => "string",
            ArgKind::Array => "array",
            ArgKind::Map => "map",
            ArgKind::Any => "any",
        };
        f.write_str(name)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}

/// Why a set of arguments doesn’t fit a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentMismatch {
    #[error("expected {expected} arguments, got {actual}")]
    Arity { expected: usize, actual: usize },
    #[error("argument {index} should be {expected}, got {actual}")]
    Kind {
        index: usize,
        expected: ArgKind,
        actual: &'static str,
    },
}

/// The schema of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    name: String,
    legacy_id: Option<i32>,
    args: Vec<ArgKind>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> CommandSpec {
        CommandSpec {
            name: name.into(),
            legacy_id: None,
            args: Vec::new(),
        }
    }

    /// Also accept this command under a legacy integer id.
    pub fn legacy_id(mut self, id: i32) -> CommandSpec {
        self.legacy_id = Some(id);
        self
    }

    pub fn args(mut self, kinds: impl IntoIterator<Item = ArgKind>) -> CommandSpec {
        self.args.extend(kinds);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn legacy(&self) -> Option<i32> {
        self.legacy_id
    }

    pub fn arg_kinds(&self) -> &[ArgKind] {
        &self.args
    }

    /// Checks arity, then each argument’s kind.
    pub fn validate(&self, args: &[Value]) -> Result<(), ArgumentMismatch> {
        if args.len() != self.args.len() {
            return Err(ArgumentMismatch::Arity {
                expected: self.args.len(),
                actual: args.len(),
            });
        }
        for (index, (kind, value)) in self.args.iter().zip(args).enumerate() {
            if !kind.accepts(value) {
                return Err(ArgumentMismatch::Kind {
                    index,
                    expected: *kind,
                    actual: kind_of(value),
                });
            }
        }
        Ok(())
    }
}

/// All commands a view manager’s views understand.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    commands: HashMap<String, CommandSpec>,
    legacy: HashMap<i32, String>,
}

impl CommandTable {
    pub fn new() -> CommandTable {
        CommandTable::default()
    }

    pub fn with(mut self, spec: CommandSpec) -> CommandTable {
        self.insert(spec);
        self
    }

    /// Adds a command, replacing any command with the same name.
    pub fn insert(&mut self, spec: CommandSpec) {
        if let Some(previous) = self.commands.get(&spec.name).and_then(|s| s.legacy_id) {
            self.legacy.remove(&previous);
        }
        if let Some(id) = spec.legacy_id {
            self.legacy.insert(id, spec.name.clone());
        }
        self.commands.insert(spec.name.clone(), spec);
    }

    pub fn resolve(&self, id: &CommandId) -> Option<&CommandSpec> {
        match id {
            CommandId::Name(name) => self.commands.get(name),
            CommandId::Legacy(id) => self.legacy.get(id).and_then(|name| self.commands.get(name)),
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scroll_table() -> CommandTable {
        CommandTable::new()
            .with(
                CommandSpec::new("scrollTo")
                    .legacy_id(1)
                    .args([ArgKind::Number, ArgKind::Number, ArgKind::Boolean]),
            )
            .with(CommandSpec::new("flashScrollIndicators"))
    }

    #[test]
    fn legacy_ids_resolve_to_named_commands() {
        let table = scroll_table();
        let by_id = table.resolve(&CommandId::from(1)).map(CommandSpec::name);
        assert_eq!(by_id, Some("scrollTo"));
        assert!(table.resolve(&CommandId::from(2)).is_none());
        assert!(table.resolve(&"zoomTo".into()).is_none());
    }

    #[test]
    fn replacing_a_command_drops_its_old_legacy_id() {
        let mut table = scroll_table();
        table.insert(CommandSpec::new("scrollTo").legacy_id(7));
        assert!(table.resolve(&CommandId::Legacy(1)).is_none());
        assert!(table.resolve(&CommandId::Legacy(7)).is_some());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn validation_reports_the_first_problem() {
        let table = scroll_table();
        let spec = table.resolve(&"scrollTo".into()).unwrap();

        assert_eq!(spec.validate(&[json!(0), json!(100), json!(true)]), Ok(()));
        assert_eq!(
            spec.validate(&[json!(0), json!(100)]),
            Err(ArgumentMismatch::Arity {
                expected: 3,
                actual: 2
            })
        );
        assert_eq!(
            spec.validate(&[json!(0), json!("100"), json!(true)]),
            Err(ArgumentMismatch::Kind {
                index: 1,
                expected: ArgKind::Number,
                actual: "string"
            })
        );
    }

    #[test]
    fn any_accepts_null() {
        assert!(ArgKind::Any.accepts(&Value::Null));
        assert!(!ArgKind::Map.accepts(&Value::Null));
    }
}
