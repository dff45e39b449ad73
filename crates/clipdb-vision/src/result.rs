use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Why an extraction produced no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The provider call itself failed (network, status, download).
    Provider,
    NoJson,
    MalformedJson,
    SchemaMismatch,
    /// The provider reported the uploaded video as failed.
    ProcessingFailed,
    Timeout,
    ScratchIo,
}

impl FailureKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Provider => "provider",
            FailureKind::NoJson => "no_json",
            FailureKind::MalformedJson => "malformed_json",
            FailureKind::SchemaMismatch => "schema_mismatch",
            FailureKind::ProcessingFailed => "processing_failed",
            FailureKind::Timeout => "timeout",
            FailureKind::ScratchIo => "scratch_io",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionFailure {
    pub kind: FailureKind,
    pub reason: String,
    /// Model text, kept for diagnosis when the failure happened after a
    /// response was received.
    pub raw_response: Option<String>,
}

/// Outcome of one extraction call.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    Success(Map<String, Value>),
    Failure(ExtractionFailure),
}

impl ExtractionResult {
    pub(crate) fn failure(kind: FailureKind, reason: impl Into<String>) -> Self {
        ExtractionResult::Failure(ExtractionFailure {
            kind,
            reason: reason.into(),
            raw_response: None,
        })
    }

    pub(crate) fn failure_with_raw(
        kind: FailureKind,
        reason: impl Into<String>,
        raw: &str,
    ) -> Self {
        ExtractionResult::Failure(ExtractionFailure {
            kind,
            reason: reason.into(),
            raw_response: Some(raw.to_string()),
        })
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionResult::Success(_))
    }

    #[must_use]
    pub fn payload(&self) -> Option<&Map<String, Value>> {
        match self {
            ExtractionResult::Success(payload) => Some(payload),
            ExtractionResult::Failure(_) => None,
        }
    }

    #[must_use]
    pub fn as_failure(&self) -> Option<&ExtractionFailure> {
        match self {
            ExtractionResult::Success(_) => None,
            ExtractionResult::Failure(failure) => Some(failure),
        }
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExtractionResult::Success(payload) => {
                let mut map = serializer.serialize_map(Some(payload.len() + 1))?;
                map.serialize_entry("success", &true)?;
                for (key, value) in payload {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            ExtractionResult::Failure(failure) => {
                let len = if failure.raw_response.is_some() { 4 } else { 3 };
                let mut map = serializer.serialize_map(Some(len))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", &failure.reason)?;
                map.serialize_entry("error_kind", &failure.kind)?;
                if let Some(raw) = &failure.raw_response {
                    map.serialize_entry("raw_response", raw)?;
                }
                map.end()
            }
        }
    }
}
