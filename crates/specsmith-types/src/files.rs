use serde::{Deserialize, Serialize};
use serde_json::json;

/// A single generated file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    /// Relative path, e.g. `app/main.py`
    pub path: String,
    /// Complete content of the file
    pub content: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Ordered list of files extracted from one code blob
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageResult {
    pub files: Vec<GeneratedFile>,
}

/// Failure to turn model output into a [`PackageResult`]
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("no JSON object found in model output")]
    NoJsonObject,
    #[error("output does not match the file list schema: {0}")]
    Schema(#[from] serde_json::Error),
}

impl PackageResult {
    /// JSON schema the packager asks the model to follow
    pub fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "files": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "path": {
                                "type": "string",
                                "description": "Path to the filename, e.g., 'app/main.py'"
                            },
                            "content": {
                                "type": "string",
                                "description": "Complete content of the file"
                            }
                        },
                        "required": ["path", "content"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["files"],
            "additionalProperties": false,
            "$schema": "http://json-schema.org/draft-07/schema#"
        })
    }

    /// Parse model output into a file list.
    ///
    /// Models in JSON mode sometimes still wrap the object in prose or code
    /// fences, so the outermost `{...}` span is what gets parsed.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let start = text.find('{');
        let end = text.rfind('}');

        match (start, end) {
            (Some(start), Some(end)) if start < end => {
                Ok(serde_json::from_str(&text[start..=end])?)
            }
            _ => Err(ParseError::NoJsonObject),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Terminal result of a code agent run.
///
/// The normal path ends with the packager's file list. When the review
/// ceiling is hit the run stops early with the last code blob as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AgentOutput {
    Packaged(PackageResult),
    Unpackaged(String),
}

impl AgentOutput {
    pub fn files(&self) -> Option<&[GeneratedFile]> {
        match self {
            AgentOutput::Packaged(result) => Some(&result.files),
            AgentOutput::Unpackaged(_) => None,
        }
    }

    pub fn raw_code(&self) -> Option<&str> {
        match self {
            AgentOutput::Packaged(_) => None,
            AgentOutput::Unpackaged(code) => Some(code),
        }
    }

    pub fn is_packaged(&self) -> bool {
        matches!(self, AgentOutput::Packaged(_))
    }
}
