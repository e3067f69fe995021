// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Instrumentation granularity, ordered from coarsest to finest.
///
/// Serializes as `MODEL_TRACE`, ... and deserializes through [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum TraceLevel {
    #[serde(rename = "APPLICATION_TRACE")]
    Application,
    #[serde(rename = "MODEL_TRACE")]
    Model,
    #[serde(rename = "FRAMEWORK_TRACE")]
    Framework,
    #[serde(rename = "SYSTEM_LIBRARY_TRACE")]
    SystemLibrary,
}

impl TraceLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TraceLevel::Application => "APPLICATION_TRACE",
            TraceLevel::Model => "MODEL_TRACE",
            TraceLevel::Framework => "FRAMEWORK_TRACE",
            TraceLevel::SystemLibrary => "SYSTEM_LIBRARY_TRACE",
        }
    }
}

impl fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTraceLevel(pub String);

impl fmt::Display for UnknownTraceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown trace level `{}`", self.0)
    }
}

impl std::error::Error for UnknownTraceLevel {}

impl FromStr for TraceLevel {
    type Err = UnknownTraceLevel;

    /// Accepts `MODEL_TRACE`, `model_trace`, `Model`, ... `LIBRARY_TRACE` is the legacy name of
    /// the system library level.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let normalized = normalized.strip_suffix("_trace").unwrap_or(&normalized);
        match normalized {
            "application" => Ok(TraceLevel::Application),
            "model" => Ok(TraceLevel::Model),
            "framework" => Ok(TraceLevel::Framework),
            "system_library" | "library" => Ok(TraceLevel::SystemLibrary),
            _ => Err(UnknownTraceLevel(s.to_owned())),
        }
    }
}

impl TryFrom<String> for TraceLevel {
    type Error = UnknownTraceLevel;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
