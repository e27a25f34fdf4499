use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

const ZSTD_LEVEL: i32 = 3;

/// How a value is rendered to text before (optional) encryption.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMode {
    /// Compact JSON.
    #[default]
    None,
    /// Indented, human-readable JSON.
    Pretty,
    /// zstd-compressed JSON re-expressed as base64 text.
    Binary,
}

impl CompressionMode {
    pub const ALL: [CompressionMode; 3] = [Self::None, Self::Pretty, Self::Binary];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pretty => "pretty",
            Self::Binary => "binary",
        }
    }

    /// Render a JSON value to text.
    pub(crate) fn encode(&self, value: &serde_json::Value) -> CodecResult<String> {
        match self {
            Self::None => {
                serde_json::to_string(value).map_err(|e| CodecError::Encode(e.to_string()))
            }
            Self::Pretty => {
                serde_json::to_string_pretty(value).map_err(|e| CodecError::Encode(e.to_string()))
            }
            Self::Binary => {
                let json = serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))?;
                let compressed = zstd::encode_all(Cursor::new(json), ZSTD_LEVEL)
                    .map_err(|e| CodecError::CompressionFailed(e.to_string()))?;
                Ok(base64::engine::general_purpose::STANDARD.encode(compressed))
            }
        }
    }

    /// Parse text produced by [`CompressionMode::encode`].
    pub(crate) fn decode(&self, text: &str) -> CodecResult<serde_json::Value> {
        match self {
            Self::None | Self::Pretty => {
                serde_json::from_str(text).map_err(|e| CodecError::Decode(e.to_string()))
            }
            Self::Binary => {
                let compressed = base64::engine::general_purpose::STANDARD
                    .decode(text.trim())
                    .map_err(|e| CodecError::Decode(format!("invalid base64: {e}")))?;
                let json = zstd::decode_all(Cursor::new(compressed))
                    .map_err(|e| CodecError::DecompressionFailed(e.to_string()))?;
                serde_json::from_slice(&json).map_err(|e| CodecError::Decode(e.to_string()))
            }
        }
    }
}

impl fmt::Display for CompressionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionMode {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "pretty" => Ok(Self::Pretty),
            "binary" => Ok(Self::Binary),
            other => Err(CodecError::UnknownMode(other.to_string())),
        }
    }
}
