//! Schema template handling.
//!
//! A schema is an arbitrary JSON object whose keys the generated profile is
//! expected to mirror. It is embedded into the system prompt as text and
//! never validated against the model's response.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde_json::Value;

use crate::profile::generator::ProfileError;

/// Default on-disk location of the profile schema template, relative to the
/// process working directory.
pub const DEFAULT_SCHEMA_PATH: &str = "schemas/core.json";

/// Environment variable overriding [`DEFAULT_SCHEMA_PATH`].
pub const SCHEMA_PATH_ENV: &str = "PROFILE_SCHEMA_PATH";

static DEFAULT_SCHEMA: OnceLock<Value> = OnceLock::new();

fn default_schema_path() -> PathBuf {
    std::env::var(SCHEMA_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SCHEMA_PATH))
}

/// Return the default schema template, loading it on first use.
///
/// The service entrypoint calls this during startup so an unreadable
/// template aborts initialization instead of failing the first request.
pub fn default_schema() -> Result<&'static Value, ProfileError> {
    if let Some(schema) = DEFAULT_SCHEMA.get() {
        return Ok(schema);
    }
    let schema = load_schema_file(&default_schema_path())?;
    Ok(DEFAULT_SCHEMA.get_or_init(|| schema))
}

/// Read and validate a schema template from disk.
pub fn load_schema_file(path: &Path) -> Result<Value, ProfileError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ProfileError::SchemaIo {
        path: path.to_path_buf(),
        source,
    })?;
    parse_schema(&raw)
}

/// Parse schema text, enforcing a JSON object at the top level.
pub fn parse_schema(raw: &str) -> Result<Value, ProfileError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|err| ProfileError::InvalidSchema(format!("schema is not valid JSON: {err}")))?;
    ensure_object(&value)?;
    Ok(value)
}

/// A schema must be a JSON object at the top level; arrays and scalars
/// cannot describe the shape of a profile document.
pub fn ensure_object(schema: &Value) -> Result<(), ProfileError> {
    if schema.is_object() {
        Ok(())
    } else {
        Err(ProfileError::InvalidSchema(
            "schema JSON must be an object at the top level".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn object_schema_is_accepted() {
        let schema = parse_schema(r#"{"job_title": "", "skills": []}"#).unwrap();
        assert!(schema.is_object());
    }

    #[test]
    fn array_schema_is_rejected() {
        let err = parse_schema(r#"[1, 2, 3]"#).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidSchema(_)));
    }

    #[test]
    fn scalar_schema_is_rejected() {
        let err = parse_schema(r#""just a string""#).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidSchema(_)));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = parse_schema("{not json").unwrap_err();
        assert!(matches!(err, ProfileError::InvalidSchema(_)));
    }

    #[test]
    fn schema_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"job_title": "", "department": ""}}"#).unwrap();
        let schema = load_schema_file(file.path()).unwrap();
        assert_eq!(schema["department"], "");
    }

    #[test]
    fn missing_schema_file_reports_the_path() {
        let err = load_schema_file(Path::new("does/not/exist.json")).unwrap_err();
        match err {
            ProfileError::SchemaIo { path, .. } => {
                assert_eq!(path, PathBuf::from("does/not/exist.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bundled_default_schema_is_a_valid_object() {
        let schema = load_schema_file(Path::new(DEFAULT_SCHEMA_PATH)).unwrap();
        assert!(schema.is_object());
        assert!(schema.get("job_title").is_some());
    }
}
