//! Loading pipeline definitions from configuration files
//!
//! Definitions support `${parameter_name}` template parameters which are
//! substituted at load time; a load fails if any parameter is left without a
//! value. After parsing, the definition's task plan is built once to reject
//! invalid lineage at load time rather than at run time.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use miette::{Diagnostic, NamedSource, SourceOffset, SourceSpan};
use regex::Regex;

use crate::plan::{PlanError, TaskPlan};
use crate::PipelineDefinition;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum TemplateError {
    #[error("Pipeline definition not found: '{file_path}'")]
    #[diagnostic(
        code(medallion::template::file_not_found),
        help("Check that the file path is correct and the file exists")
    )]
    NotFound {
        #[source]
        source: std::io::Error,
        file_path: String,
    },

    #[error("Unsupported definition format: '{0}'")]
    #[diagnostic(
        code(medallion::template::unknown_format),
        help(
            "Supported formats are YAML (feature 'yaml', default), JSON (feature 'json') \
             and TOML (feature 'toml'); rebuild with the matching feature flag if needed"
        )
    )]
    UnknownFormat(TemplateFormat),

    #[error("Missing template parameters: {0:?}")]
    #[diagnostic(
        code(medallion::template::missing_params),
        help("Provide the missing parameters with -p, e.g. `medallion run -f pipeline.yml -p run_date=2024-07-07`")
    )]
    MissingParams(HashSet<String>),

    #[cfg(feature = "yaml")]
    #[error("YAML parsing error")]
    #[diagnostic(code(medallion::template::yaml_parse_error))]
    ParseYaml {
        #[source_code]
        source_code: Arc<NamedSource<String>>,
        #[label("{}", error)]
        span: SourceSpan,
        #[source]
        error: serde_yml::Error,
    },

    #[cfg(feature = "json")]
    #[error("JSON parsing error")]
    #[diagnostic(code(medallion::template::json_parse_error))]
    ParseJson {
        #[source_code]
        source_code: Arc<NamedSource<String>>,
        #[label("{}", error)]
        span: SourceSpan,
        #[source]
        error: serde_json::Error,
    },

    #[cfg(feature = "toml")]
    #[error("TOML parsing error")]
    #[diagnostic(code(medallion::template::toml_parse_error))]
    ParseToml {
        #[source_code]
        source_code: Arc<NamedSource<String>>,
        #[label("{}", error)]
        span: SourceSpan,
        #[source]
        error: toml::de::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Lineage(#[from] PlanError),
}

/// Serialization format of a pipeline definition file.
#[derive(Debug, Clone)]
pub enum TemplateFormat {
    /// YAML format (.yml, .yaml)
    Yaml,
    /// JSON format (.json)
    Json,
    /// TOML format (.toml)
    Toml,
    /// Unknown or unsupported format
    Unknown(String),
}

impl std::fmt::Display for TemplateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateFormat::Yaml => write!(f, "yaml"),
            TemplateFormat::Json => write!(f, "json"),
            TemplateFormat::Toml => write!(f, "toml"),
            TemplateFormat::Unknown(format) => write!(f, "{format}"),
        }
    }
}

/// Infer the definition format from a file extension.
pub fn format_from_path<P: AsRef<Path>>(path: P) -> TemplateFormat {
    match path.as_ref().extension().and_then(|ext| ext.to_str()) {
        Some("yml") | Some("yaml") => TemplateFormat::Yaml,
        Some("json") => TemplateFormat::Json,
        Some("toml") => TemplateFormat::Toml,
        ext => TemplateFormat::Unknown(ext.unwrap_or("unknown_ext").to_string()),
    }
}

/// Loader for templated pipeline definitions.
///
/// Template parameters use the `${parameter_name}` syntax where the name may
/// contain letters, numbers and underscores. Substitution happens on the raw
/// file contents before parsing, so parameters can stand in for any scalar
/// in the definition (dates, bucket names, retry counts).
pub trait TemplateLoader: Sized {
    /// Load a definition from a file, substituting the given parameters.
    fn from_file<P: AsRef<Path>>(
        path: P,
        format: TemplateFormat,
        params: HashMap<String, String>,
    ) -> Result<Self, TemplateError>;

    /// Load a definition from a string, substituting the given parameters.
    fn from_str<T: AsRef<str>>(
        value: T,
        format: TemplateFormat,
        params: HashMap<String, String>,
    ) -> Result<Self, TemplateError>;

    /// Replace all `${name}` occurrences with the corresponding parameter
    /// value, erroring on parameters that remain unsubstituted.
    fn substitute_params(
        raw: &str,
        params: HashMap<String, String>,
    ) -> Result<String, TemplateError> {
        static PARAM_REGEX: OnceLock<Regex> = OnceLock::new();

        let mut definition = raw.to_string();
        for (name, value) in params {
            definition = definition.replace(&format!("${{{name}}}"), &value);
        }

        let missing = PARAM_REGEX
            .get_or_init(|| Regex::new(r"\$\{([a-zA-Z0-9_]+)\}").expect("invalid regex"))
            .captures_iter(&definition)
            .map(|capture| capture[1].to_string())
            .collect::<HashSet<String>>();

        if !missing.is_empty() {
            return Err(TemplateError::MissingParams(missing));
        }

        Ok(definition)
    }
}

impl TemplateLoader for PipelineDefinition {
    fn from_file<P: AsRef<Path>>(
        path: P,
        format: TemplateFormat,
        params: HashMap<String, String>,
    ) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| TemplateError::NotFound {
            source,
            file_path: path.display().to_string(),
        })?;

        Self::from_str(contents, format, params)
    }

    fn from_str<T: AsRef<str>>(
        value: T,
        format: TemplateFormat,
        params: HashMap<String, String>,
    ) -> Result<Self, TemplateError> {
        let definition = Self::substitute_params(value.as_ref(), params)?;

        let parsed = match format {
            TemplateFormat::Yaml => parse_yaml(&definition)?,
            TemplateFormat::Json => parse_json(&definition)?,
            TemplateFormat::Toml => parse_toml(&definition)?,
            fmt @ TemplateFormat::Unknown(_) => return Err(TemplateError::UnknownFormat(fmt)),
        };

        // Reject invalid lineage at load time
        TaskPlan::build(&parsed)?;

        Ok(parsed)
    }
}

#[cfg(feature = "yaml")]
fn parse_yaml(definition: &str) -> Result<PipelineDefinition, TemplateError> {
    serde_yml::from_str(definition).map_err(|error| {
        let offset = error
            .location()
            .map(|location| SourceOffset::from_location(definition, location.line(), location.column()))
            .unwrap_or_else(|| SourceOffset::from(0));

        TemplateError::ParseYaml {
            source_code: Arc::new(NamedSource::new("pipeline.yaml", definition.to_string())),
            span: SourceSpan::new(offset, 1),
            error,
        }
    })
}

#[cfg(not(feature = "yaml"))]
fn parse_yaml(_definition: &str) -> Result<PipelineDefinition, TemplateError> {
    Err(TemplateError::UnknownFormat(TemplateFormat::Yaml))
}

#[cfg(feature = "json")]
fn parse_json(definition: &str) -> Result<PipelineDefinition, TemplateError> {
    serde_json::from_str(definition).map_err(|error| {
        let offset = SourceOffset::from_location(definition, error.line(), error.column());

        TemplateError::ParseJson {
            source_code: Arc::new(NamedSource::new("pipeline.json", definition.to_string())),
            span: SourceSpan::new(offset, 1),
            error,
        }
    })
}

#[cfg(not(feature = "json"))]
fn parse_json(_definition: &str) -> Result<PipelineDefinition, TemplateError> {
    Err(TemplateError::UnknownFormat(TemplateFormat::Json))
}

#[cfg(feature = "toml")]
fn parse_toml(definition: &str) -> Result<PipelineDefinition, TemplateError> {
    toml::from_str(definition).map_err(|error| {
        let offset = error
            .span()
            .map(|span| SourceOffset::from(span.start))
            .unwrap_or_else(|| SourceOffset::from(0));

        TemplateError::ParseToml {
            source_code: Arc::new(NamedSource::new("pipeline.toml", definition.to_string())),
            span: SourceSpan::new(offset, 1),
            error,
        }
    })
}

#[cfg(not(feature = "toml"))]
fn parse_toml(_definition: &str) -> Result<PipelineDefinition, TemplateError> {
    Err(TemplateError::UnknownFormat(TemplateFormat::Toml))
}

#[cfg(all(test, feature = "yaml"))]
mod tests {
    use super::*;
    use crate::model::{FailureMode, Layer};

    const DEFINITION: &str = r#"
name: daily_refresh
start_date: 2024-07-07
tags: [dbt, daily]
profile:
  name: analytics
stages:
  - layer: bronze
  - layer: silver
  - layer: gold
  - layer: datamart
"#;

    #[test]
    fn loads_definition_with_defaults() {
        let definition =
            PipelineDefinition::from_str(DEFINITION, TemplateFormat::Yaml, HashMap::new()).unwrap();

        assert_eq!(definition.name, "daily_refresh");
        assert_eq!(definition.schedule, None);
        assert_eq!(definition.stages.len(), 4);
        assert_eq!(definition.defaults.retries, 2);
        assert_eq!(definition.on_failure, FailureMode::Propagate);
    }

    #[test]
    fn substitutes_parameters() {
        let templated = DEFINITION.replace("2024-07-07", "${run_date}");
        let params = HashMap::from([("run_date".to_string(), "2024-08-01".to_string())]);

        let definition =
            PipelineDefinition::from_str(&templated, TemplateFormat::Yaml, params).unwrap();

        assert_eq!(definition.start_date.to_string(), "2024-08-01");
    }

    #[test]
    fn missing_parameters_are_listed() {
        let templated = DEFINITION.replace("analytics", "${profile_name}");

        let result = PipelineDefinition::from_str(&templated, TemplateFormat::Yaml, HashMap::new());

        match result {
            Err(TemplateError::MissingParams(missing)) => {
                assert!(missing.contains("profile_name"));
            }
            other => panic!("expected MissingParams, got {other:?}"),
        }
    }

    #[test]
    fn invalid_lineage_fails_at_load_time() {
        let reordered = r#"
name: daily_refresh
start_date: 2024-07-07
profile:
  name: analytics
stages:
  - layer: gold
  - layer: bronze
"#;

        let result = PipelineDefinition::from_str(reordered, TemplateFormat::Yaml, HashMap::new());

        assert!(matches!(
            result,
            Err(TemplateError::Lineage(PlanError::OutOfOrder {
                found: Layer::Bronze,
                previous: Layer::Gold,
            }))
        ));
    }

    #[test]
    fn syntax_errors_carry_spans() {
        let broken = "name: [unclosed";

        match PipelineDefinition::from_str(broken, TemplateFormat::Yaml, HashMap::new()) {
            Err(TemplateError::ParseYaml { source_code, .. }) => {
                assert!(source_code.inner().contains("unclosed"));
            }
            other => panic!("expected ParseYaml, got {other:?}"),
        }
    }

    #[test]
    fn loads_definition_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.yml");
        std::fs::write(&path, DEFINITION).unwrap();

        let definition =
            PipelineDefinition::from_file(&path, format_from_path(&path), HashMap::new()).unwrap();

        assert_eq!(definition.name, "daily_refresh");
    }

    #[test]
    fn missing_file_is_reported_with_its_path() {
        let result = PipelineDefinition::from_file(
            "/nonexistent/pipeline.yml",
            TemplateFormat::Yaml,
            HashMap::new(),
        );

        match result {
            Err(TemplateError::NotFound { file_path, .. }) => {
                assert_eq!(file_path, "/nonexistent/pipeline.yml");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn format_inference_from_extension() {
        assert!(matches!(
            format_from_path("pipeline.yml"),
            TemplateFormat::Yaml
        ));
        assert!(matches!(
            format_from_path("pipeline.json"),
            TemplateFormat::Json
        ));
        assert!(matches!(
            format_from_path("pipeline.parquet"),
            TemplateFormat::Unknown(_)
        ));
    }
}
