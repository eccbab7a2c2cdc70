use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Execution metadata reported by the remote tool alongside a success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeMeta {
    /// Version of the tool implementation that produced the result.
    #[serde(default, alias = "tool_version", skip_serializing_if = "Option::is_none")]
    pub tool_version: Option<String>,
    /// Wall-clock time the tool spent, in milliseconds. May be fractional.
    #[serde(default, alias = "elapsed_ms", skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<f64>,
    /// Operating mode the sidecar ran the tool in (e.g. "live", "dry_run").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Any other keys the sidecar attached, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OutcomeMeta {
    /// Build meta from whatever the sidecar sent, never failing.
    ///
    /// Known keys with the expected type fill the typed fields; everything
    /// else, including known keys with an unexpected type, lands in `extra`.
    /// A non-object value is kept under `extra["value"]`. `null` yields `None`.
    pub fn from_value_lossy(value: Value) -> Option<Self> {
        let map = match value {
            Value::Null => return None,
            Value::Object(map) => map,
            other => {
                let mut extra = Map::new();
                extra.insert("value".to_string(), other);
                return Some(Self {
                    extra,
                    ..Default::default()
                });
            }
        };

        let mut meta = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "toolVersion" | "tool_version" if meta.tool_version.is_none() && value.is_string() => {
                    meta.tool_version = value.as_str().map(str::to_string);
                }
                "elapsedMs" | "elapsed_ms" if meta.elapsed_ms.is_none() && value.is_number() => {
                    meta.elapsed_ms = value.as_f64();
                }
                "mode" if meta.mode.is_none() && value.is_string() => {
                    meta.mode = value.as_str().map(str::to_string);
                }
                _ => {
                    meta.extra.insert(key, value);
                }
            }
        }
        Some(meta)
    }
}

/// The structured result of a single tool invocation.
///
/// Exactly one payload shape exists per outcome: a success carries data,
/// a failure carries an error code and message.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success {
        data: Value,
        meta: Option<OutcomeMeta>,
    },
    Failure {
        error_code: String,
        error_message: String,
        retryable: Option<bool>,
    },
}

impl ToolOutcome {
    pub fn success(data: Value) -> Self {
        Self::Success { data, meta: None }
    }

    pub fn success_with_meta(data: Value, meta: Option<OutcomeMeta>) -> Self {
        Self::Success { data, meta }
    }

    pub fn failure(error_code: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self::Failure {
            error_code: error_code.into(),
            error_message: error_message.into(),
            retryable: None,
        }
    }

    /// Attach a retryable hint. No-op on success outcomes.
    pub fn with_retryable(mut self, value: Option<bool>) -> Self {
        if let Self::Failure { retryable, .. } = &mut self {
            *retryable = value;
        }
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    pub fn meta(&self) -> Option<&OutcomeMeta> {
        match self {
            Self::Success { meta, .. } => meta.as_ref(),
            Self::Failure { .. } => None,
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Failure { error_code, .. } => Some(error_code),
            Self::Success { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failure { error_message, .. } => Some(error_message),
            Self::Success { .. } => None,
        }
    }

    pub fn retryable(&self) -> Option<bool> {
        match self {
            Self::Failure { retryable, .. } => *retryable,
            Self::Success { .. } => None,
        }
    }
}

/// Flat wire shape: `{success, data?, meta?, errorCode?, errorMessage?, retryable?}`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeWire<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<&'a OutcomeMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retryable: Option<bool>,
}

impl Serialize for ToolOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = OutcomeWire {
            success: self.is_success(),
            data: self.data(),
            meta: self.meta(),
            error_code: self.error_code(),
            error_message: self.error_message(),
            retryable: self.retryable(),
        };
        wire.serialize(serializer)
    }
}
