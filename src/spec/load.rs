use super::error::RouteSpecError;
use super::types::{Route, RouteSpec};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// One route entry in a route file.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteDef {
    /// HTTP method, case-insensitive
    pub method: String,
    /// Canonical pattern
    pub path: String,
}

/// On-disk route table shape shared by the TOML, YAML and JSON formats.
///
/// ```toml
/// name = "parse"
///
/// [[routes]]
/// method = "GET"
/// path = "/1/users/:objectId"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RouteFile {
    /// Table name; defaults to the file stem
    #[serde(default)]
    pub name: Option<String>,
    /// Routes in registration order
    pub routes: Vec<RouteDef>,
}

/// Serialization format of a route or config file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// `.toml`
    Toml,
    /// `.yaml` or `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl FileFormat {
    /// Detect the format from a path extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "toml" => Some(FileFormat::Toml),
            "yaml" | "yml" => Some(FileFormat::Yaml),
            "json" => Some(FileFormat::Json),
            _ => None,
        }
    }
}

/// Parse a route table from already loaded content.
///
/// `origin` is only used in error messages; `default_name` names tables that
/// do not carry a `name` field.
///
/// # Errors
///
/// [`RouteSpecError::Parse`] when the content does not deserialize, or any
/// validation error from [`Route::parse`] and [`RouteSpec::new`].
pub fn route_spec_from_str(
    content: &str,
    format: FileFormat,
    origin: &Path,
    default_name: &str,
) -> Result<RouteSpec, RouteSpecError> {
    let parse_err = |message: String| RouteSpecError::Parse {
        path: origin.to_path_buf(),
        message,
    };

    let file: RouteFile = match format {
        FileFormat::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string()))?,
        FileFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|e| parse_err(e.to_string()))?
        }
        FileFormat::Json => {
            serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?
        }
    };

    let routes = file
        .routes
        .iter()
        .map(|def| Route::parse(&def.method, &def.path))
        .collect::<Result<Vec<_>, _>>()?;

    let name = file.name.unwrap_or_else(|| default_name.to_string());
    RouteSpec::new(name, routes)
}

/// Load a route table from a `.toml`, `.yaml`/`.yml` or `.json` file.
///
/// # Errors
///
/// [`RouteSpecError::UnsupportedFormat`] for other extensions,
/// [`RouteSpecError::Io`] when the file cannot be read, and the errors of
/// [`route_spec_from_str`].
pub fn load_route_spec(path: impl AsRef<Path>) -> Result<RouteSpec, RouteSpecError> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path).ok_or_else(|| {
        RouteSpecError::UnsupportedFormat {
            path: path.to_path_buf(),
        }
    })?;

    let content = std::fs::read_to_string(path).map_err(|e| RouteSpecError::Io {
        path: PathBuf::from(path),
        message: e.to_string(),
    })?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("routes");
    let spec = route_spec_from_str(&content, format, path, stem)?;

    info!(
        path = %path.display(),
        name = %spec.name(),
        routes_count = spec.len(),
        "Route table loaded"
    );
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            FileFormat::from_path(Path::new("a.TOML")),
            Some(FileFormat::Toml)
        );
        assert_eq!(
            FileFormat::from_path(Path::new("a.yml")),
            Some(FileFormat::Yaml)
        );
        assert_eq!(
            FileFormat::from_path(Path::new("a.json")),
            Some(FileFormat::Json)
        );
        assert_eq!(FileFormat::from_path(Path::new("a.txt")), None);
    }

    #[test]
    fn test_route_spec_from_yaml_uses_default_name() {
        let yaml = "\
routes:
  - { method: get, path: /1/users }
  - { method: POST, path: /1/users }
";
        let spec =
            route_spec_from_str(yaml, FileFormat::Yaml, Path::new("x.yaml"), "fallback")
                .unwrap();
        assert_eq!(spec.name(), "fallback");
        assert_eq!(spec.len(), 2);
        assert_eq!(spec.routes()[0].method, http::Method::GET);
    }

    #[test]
    fn test_route_spec_from_json_reports_bad_pattern() {
        let json = r#"{"name":"bad","routes":[{"method":"GET","path":"no-slash"}]}"#;
        let err = route_spec_from_str(json, FileFormat::Json, Path::new("x.json"), "x")
            .unwrap_err();
        assert!(matches!(err, RouteSpecError::InvalidPattern { .. }));
    }
}
