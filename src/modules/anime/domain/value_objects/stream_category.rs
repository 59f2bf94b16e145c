use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shared::errors::AppError;

/// Audio track flavour of a stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamCategory {
    #[default]
    Sub,
    Dub,
}

impl StreamCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamCategory::Sub => "sub",
            StreamCategory::Dub => "dub",
        }
    }
}

impl fmt::Display for StreamCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sub" => Ok(StreamCategory::Sub),
            "dub" => Ok(StreamCategory::Dub),
            other => Err(AppError::ValidationError(format!(
                "Category must be 'sub' or 'dub', got '{}'",
                other
            ))),
        }
    }
}
