use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ParseFileUnreadable,
    ParseInvalidYaml,
    ParseNotAMapping,
    ParseVersionMissing,

    ValidationInvalidArgument,

    TransformUnknownDirective,
    TransformDirectiveType,
    TransformDirectiveArgument,
    TransformUndefinedVariable,
    TransformVariablePath,
    TransformIncludeCycle,

    TargetNone,
    TargetAmbiguous,
    TargetNotFound,
    TargetUnknownKind,

    ExternalNotFound,
    ExternalFailed,
    ExternalProtocol,

    InternalIoError,
    InternalJsonError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ParseFileUnreadable => "parse.file_unreadable",
            ErrorCode::ParseInvalidYaml => "parse.invalid_yaml",
            ErrorCode::ParseNotAMapping => "parse.not_a_mapping",
            ErrorCode::ParseVersionMissing => "parse.version_missing",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::TransformUnknownDirective => "transform.unknown_directive",
            ErrorCode::TransformDirectiveType => "transform.directive_type",
            ErrorCode::TransformDirectiveArgument => "transform.directive_argument",
            ErrorCode::TransformUndefinedVariable => "transform.undefined_variable",
            ErrorCode::TransformVariablePath => "transform.variable_path",
            ErrorCode::TransformIncludeCycle => "transform.include_cycle",

            ErrorCode::TargetNone => "target.none",
            ErrorCode::TargetAmbiguous => "target.ambiguous",
            ErrorCode::TargetNotFound => "target.not_found",
            ErrorCode::TargetUnknownKind => "target.unknown_kind",

            ErrorCode::ExternalNotFound => "external.not_found",
            ErrorCode::ExternalFailed => "external.failed",
            ErrorCode::ExternalProtocol => "external.protocol",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDetails {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDetails {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludeCycleDetails {
    pub path: String,
    pub chain: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSelectionDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<String>,
    pub available: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalNotFoundDetails {
    pub helper: String,
    pub searched: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalFailedDetails {
    pub helper: String,
    pub exit_code: i32,
    pub stderr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn details_value<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }

    pub fn parse_file_unreadable(path: impl Into<String>, error: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::ParseFileUnreadable,
            format!("cannot read omnifest '{}'", path),
            details_value(FileDetails {
                path,
                error: Some(error.into()),
            }),
        )
    }

    pub fn parse_invalid_yaml(path: impl Into<String>, error: impl Into<String>) -> Self {
        let path = path.into();
        let error = error.into();
        Self::new(
            ErrorCode::ParseInvalidYaml,
            format!("invalid YAML in '{}': {}", path, error),
            details_value(FileDetails {
                path,
                error: Some(error),
            }),
        )
    }

    pub fn parse_not_a_mapping(path: impl Into<String>, found: &str) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::ParseNotAMapping,
            format!("omnifest '{}' must be a mapping at the top level, found {}", path, found),
            details_value(FileDetails { path, error: None }),
        )
    }

    pub fn parse_version_missing(path: impl Into<String>, marker: &str) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::ParseVersionMissing,
            format!("omnifest '{}' must contain '{}'", path, marker),
            details_value(FileDetails { path, error: None }),
        )
    }

    pub fn validation_invalid_argument(field: impl Into<String>, problem: impl Into<String>) -> Self {
        let field = field.into();
        let problem = problem.into();
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            problem.clone(),
            details_value(DirectiveDetails {
                key: field,
                problem: Some(problem),
            }),
        )
    }

    pub fn unknown_directive(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(
            ErrorCode::TransformUnknownDirective,
            format!("unknown directive '{}'", key),
            details_value(DirectiveDetails { key, problem: None }),
        )
    }

    pub fn directive_type(key: impl Into<String>, problem: impl Into<String>) -> Self {
        let key = key.into();
        let problem = problem.into();
        Self::new(
            ErrorCode::TransformDirectiveType,
            problem.clone(),
            details_value(DirectiveDetails {
                key,
                problem: Some(problem),
            }),
        )
    }

    pub fn directive_argument(key: impl Into<String>, problem: impl Into<String>) -> Self {
        let key = key.into();
        let problem = problem.into();
        Self::new(
            ErrorCode::TransformDirectiveArgument,
            problem.clone(),
            details_value(DirectiveDetails {
                key,
                problem: Some(problem),
            }),
        )
    }

    pub fn undefined_variable(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            ErrorCode::TransformUndefinedVariable,
            format!("undefined variable '{}'", name),
            details_value(VariableDetails {
                name,
                component: None,
            }),
        )
    }

    pub fn variable_path(name: impl Into<String>, component: impl Into<String>, problem: impl Into<String>) -> Self {
        let name = name.into();
        let component = component.into();
        Self::new(
            ErrorCode::TransformVariablePath,
            format!("cannot resolve '{}': {}", name, problem.into()),
            details_value(VariableDetails {
                name,
                component: Some(component),
            }),
        )
    }

    pub fn include_cycle(path: impl Into<String>, chain: Vec<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::TransformIncludeCycle,
            format!("include cycle at '{}': {}", path, chain.join(" -> ")),
            details_value(IncludeCycleDetails { path, chain }),
        )
    }

    pub fn target_none(path: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::TargetNone,
            format!("omnifest '{}' does not contain any targets", path.into()),
            details_value(TargetSelectionDetails {
                requested: None,
                available: Vec::new(),
            }),
        )
    }

    pub fn target_ambiguous(available: Vec<String>) -> Self {
        Self::new(
            ErrorCode::TargetAmbiguous,
            format!(
                "omnifest contains multiple targets, select one with '-t': {}",
                available.join(", ")
            ),
            details_value(TargetSelectionDetails {
                requested: None,
                available,
            }),
        )
    }

    pub fn target_not_found(requested: impl Into<String>, available: Vec<String>) -> Self {
        let requested = requested.into();
        Self::new(
            ErrorCode::TargetNotFound,
            format!(
                "omnifest does not contain target '{}', available: {}",
                requested,
                available.join(", ")
            ),
            details_value(TargetSelectionDetails {
                requested: Some(requested),
                available,
            }),
        )
    }

    pub fn target_unknown_kind(kind: impl Into<String>, known: Vec<String>) -> Self {
        let kind = kind.into();
        Self::new(
            ErrorCode::TargetUnknownKind,
            format!("unknown target kind '{}', known kinds: {}", kind, known.join(", ")),
            details_value(TargetSelectionDetails {
                requested: Some(kind),
                available: known,
            }),
        )
    }

    pub fn external_not_found(helper: impl Into<String>, searched: Vec<String>) -> Self {
        let helper = helper.into();
        Self::new(
            ErrorCode::ExternalNotFound,
            format!(
                "external helper '{}' not found in: {}",
                helper,
                searched.join(", ")
            ),
            details_value(ExternalNotFoundDetails { helper, searched }),
        )
    }

    pub fn external_failed(helper: impl Into<String>, exit_code: i32, stderr: impl Into<String>) -> Self {
        let helper = helper.into();
        let stderr = stderr.into();
        Self::new(
            ErrorCode::ExternalFailed,
            format!("external helper '{}' failed with exit code {}: {}", helper, exit_code, stderr),
            details_value(ExternalFailedDetails {
                helper,
                exit_code,
                stderr,
            }),
        )
    }

    pub fn external_protocol(helper: impl Into<String>, problem: impl Into<String>) -> Self {
        let helper = helper.into();
        let problem = problem.into();
        Self::new(
            ErrorCode::ExternalProtocol,
            format!("external helper '{}' replied with garbage: {}", helper, problem),
            details_value(DirectiveDetails {
                key: helper,
                problem: Some(problem),
            }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            details_value(InternalIoErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            details_value(InternalIoErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }
}
