pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Deserialise the `--input` file when given, otherwise a piped stdin
/// document. `Ok(None)` means neither was supplied.
pub fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(file::read_document(path)?));
    }
    match stdin::read_stdin()? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}
