//! Resolution state shared across a compilation.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::value::type_name;

/// Carries everything resolution needs between passes: the include root,
/// the variable store behind `${name}` references, and the active target
/// kind once a target has been selected.
#[derive(Debug, Clone)]
pub struct Context {
    root: PathBuf,
    kind: Option<String>,
    variables: Map<String, Value>,
    warn_duplicate_definitions: bool,
    include_stack: Vec<PathBuf>,
}

impl Context {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            kind: None,
            variables: Map::new(),
            warn_duplicate_definitions: false,
            include_stack: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, duplicate_definitions: bool) -> Self {
        self.warn_duplicate_definitions = duplicate_definitions;
        self
    }

    /// Derive the context for a target phase. Variables defined during
    /// the general phase stay visible.
    pub fn with_kind(&self, kind: impl Into<String>) -> Self {
        Self {
            root: self.root.clone(),
            kind: Some(kind.into()),
            variables: self.variables.clone(),
            warn_duplicate_definitions: self.warn_duplicate_definitions,
            include_stack: Vec::new(),
        }
    }

    /// Directory relative include paths resolve against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Active target kind, `None` during the general phase.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn warns_duplicate_definitions(&self) -> bool {
        self.warn_duplicate_definitions
    }

    /// Bind a variable. The last definition wins; redefinitions warn when
    /// the duplicate-definition warning class is enabled.
    pub fn define(&mut self, name: &str, value: Value) {
        if self.warn_duplicate_definitions {
            if let Some(previous) = self.variables.get(name) {
                log_warn!(
                    "redefinition of '{}', previous value was {} and new value is {}",
                    name,
                    previous,
                    value
                );
            }
        }
        self.variables.insert(name.to_string(), value);
    }

    /// Look up a dotted reference like `images.qcow2.size`. Components
    /// traverse mappings by key and sequences by integer index.
    pub fn variable(&self, name: &str) -> Result<&Value> {
        let mut components = name.split('.');
        let head = components.next().unwrap_or(name);
        let mut current = self
            .variables
            .get(head)
            .ok_or_else(|| Error::undefined_variable(name))?;

        for component in components {
            current = match current {
                Value::Object(entries) => entries.get(component).ok_or_else(|| {
                    Error::variable_path(name, component, format!("no such key '{}'", component))
                })?,
                Value::Array(items) => {
                    let index: usize = component.parse().map_err(|_| {
                        Error::variable_path(
                            name,
                            component,
                            format!("cannot index a sequence with '{}'", component),
                        )
                    })?;
                    items.get(index).ok_or_else(|| {
                        Error::variable_path(
                            name,
                            component,
                            format!(
                                "index {} is out of range for a sequence of length {}",
                                index,
                                items.len()
                            ),
                        )
                    })?
                }
                other => {
                    return Err(Error::variable_path(
                        name,
                        component,
                        format!("cannot index into {}", type_name(other)),
                    ));
                }
            };
        }

        Ok(current)
    }

    /// Track an entered include for cycle detection.
    pub fn enter_include(&mut self, path: &Path) -> Result<()> {
        if self.include_stack.iter().any(|entry| entry == path) {
            let mut chain: Vec<String> = self
                .include_stack
                .iter()
                .map(|entry| entry.display().to_string())
                .collect();
            chain.push(path.display().to_string());
            return Err(Error::include_cycle(path.display().to_string(), chain));
        }
        self.include_stack.push(path.to_path_buf());
        Ok(())
    }

    pub fn leave_include(&mut self) {
        self.include_stack.pop();
    }
}
