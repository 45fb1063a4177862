use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `.yaml`/`.yml` files are YAML; everything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }
}

/// Read a JSON or YAML file and deserialise into a typed struct.
pub fn read_document<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    parse_document(&contents, DocumentFormat::from_path(&canonical))
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e).into())
}

/// Read a JSON or YAML file as a generic serde_json::Value.
pub fn read_value(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    read_document(path)
}

pub fn parse_document<T: DeserializeOwned>(
    contents: &str,
    format: DocumentFormat,
) -> Result<T, Box<dyn std::error::Error>> {
    Ok(match format {
        DocumentFormat::Json => serde_json::from_str(contents)?,
        DocumentFormat::Yaml => serde_yaml::from_str(contents)?,
    })
}

/// Resolve the path against the working directory and check it is a file.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("sheet.YAML")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("sheet.yml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("sheet.json")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("sheet")), DocumentFormat::Json);
    }

    #[test]
    fn test_yaml_and_json_agree() {
        let yaml: Value = parse_document("fico: 745\nprepay_structure: \"5/4/3/2/1\"\n", DocumentFormat::Yaml).unwrap();
        let json: Value =
            parse_document(r#"{"fico": 745, "prepay_structure": "5/4/3/2/1"}"#, DocumentFormat::Json)
                .unwrap();
        assert_eq!(yaml, json);
    }

    #[test]
    fn test_missing_file() {
        let err = read_value("definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
