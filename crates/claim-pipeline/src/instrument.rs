//! Stage instrumentation.
//!
//! Every stage the orchestrator invokes goes through [`Instrumentation::run`]
//! (or [`Instrumentation::run_sync`]). On success the wrapped value is
//! returned untouched. On failure, including a panic, the stage is logged
//! with its elapsed time and the error is converted into a [`StageError`]
//! carrying the stage name, function identifier, a sanitized parameter
//! snapshot, and a condensed cause chain.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use claim_config::InstrumentationConfig;
use futures::FutureExt;
use serde_json::Value;
use thiserror::Error;

use crate::context;
use crate::error::StageError;

/// Parameter-name fragments that are always redacted. Matched against
/// names normalised by [`normalize_key`].
const SENSITIVE_KEYS: [&str; 4] = ["password", "token", "secret", "api_key"];

/// Parameter-name fragment whose value is replaced by a size marker.
const BINARY_KEY: &str = "image_data";

const REDACTED: &str = "<redacted>";

/// Sanitized parameter snapshot.
pub type Params = BTreeMap<String, Value>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// One discrete step of a `check` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    CacheLookup,
    ClaimExtraction,
    ClaimVerification,
    ResponseGeneration,
    CacheStorage,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CacheLookup => "Cache Lookup",
            Self::ClaimExtraction => "Claim Extraction",
            Self::ClaimVerification => "Claim Verification",
            Self::ResponseGeneration => "Response Generation",
            Self::CacheStorage => "Cache Storage",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Param
// ---------------------------------------------------------------------------

/// A borrowed view of one stage argument, prior to sanitization.
#[derive(Debug, Clone)]
pub enum Param<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    List(Vec<Param<'a>>),
    Map(Vec<(&'a str, Param<'a>)>),
}

impl Param<'_> {
    /// Payload size used for `image_data` markers.
    fn byte_len(&self) -> usize {
        match self {
            Self::Text(s) => s.len(),
            Self::Bytes(b) => b.len(),
            Self::List(items) => items.iter().map(Param::byte_len).sum(),
            Self::Map(entries) => entries.iter().map(|(_, p)| p.byte_len()).sum(),
            Self::Int(_) | Self::Float(_) | Self::Bool(_) | Self::Null => 0,
        }
    }
}

impl<'a> From<&'a str> for Param<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a String> for Param<'a> {
    fn from(value: &'a String) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a [u8]> for Param<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self::Bytes(value)
    }
}

impl From<bool> for Param<'_> {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<usize> for Param<'_> {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Param<'_> {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl<'a, T: Into<Param<'a>>> From<Option<T>> for Param<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Instrumentation
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
#[error("stage panicked: {0}")]
struct Panicked(String);

/// Wraps stage calls with timing, logging, and error-context capture.
#[derive(Debug, Clone)]
pub struct Instrumentation {
    call_chain_depth: usize,
    sensitive_keys: Vec<String>,
}

impl Default for Instrumentation {
    fn default() -> Self {
        Self::new(&InstrumentationConfig::default())
    }
}

impl Instrumentation {
    #[must_use]
    pub fn new(config: &InstrumentationConfig) -> Self {
        let sensitive_keys = SENSITIVE_KEYS
            .iter()
            .map(|key| (*key).to_string())
            .chain(
                config
                    .extra_sensitive_keys
                    .iter()
                    .map(|key| normalize_key(key)),
            )
            .collect();
        Self {
            call_chain_depth: config.call_chain_depth.max(1),
            sensitive_keys,
        }
    }

    /// Sanitize named stage arguments into an owned snapshot.
    ///
    /// Byte payloads become `<bytes: N>`, anything keyed `image_data` (or
    /// `image-data`) becomes a size marker whatever its shape, and sensitive
    /// keys are redacted.
    /// Nested lists and maps are sanitized recursively.
    #[must_use]
    pub fn snapshot(&self, params: &[(&str, Param<'_>)]) -> Params {
        params
            .iter()
            .map(|(name, param)| ((*name).to_string(), self.sanitize(Some(name), param)))
            .collect()
    }

    fn sanitize(&self, key: Option<&str>, param: &Param<'_>) -> Value {
        if let Some(key) = key {
            let key = normalize_key(key);
            if key.contains(BINARY_KEY) {
                return Value::String(format!("<bytes: {}>", param.byte_len()));
            }
            if self.sensitive_keys.iter().any(|s| key.contains(s.as_str())) {
                return Value::String(REDACTED.to_string());
            }
        }

        match param {
            Param::Text(s) => Value::String((*s).to_string()),
            Param::Bytes(b) => Value::String(format!("<bytes: {}>", b.len())),
            Param::Int(i) => Value::from(*i),
            Param::Float(f) => Value::from(*f),
            Param::Bool(b) => Value::Bool(*b),
            Param::Null => Value::Null,
            Param::List(items) => {
                Value::Array(items.iter().map(|p| self.sanitize(None, p)).collect())
            }
            Param::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, p)| ((*k).to_string(), self.sanitize(Some(k), p)))
                    .collect(),
            ),
        }
    }

    /// Run an async stage.
    ///
    /// # Errors
    ///
    /// Returns [`StageError`] if `fut` resolves to an error or panics.
    pub async fn run<T, E, F>(
        &self,
        stage: Stage,
        function: &'static str,
        params: Params,
        fut: F,
    ) -> Result<T, StageError>
    where
        F: Future<Output = Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        tracing::info!(stage = %stage, function, "stage started");
        let started = Instant::now();
        let outcome = AssertUnwindSafe(fut).catch_unwind().await;
        self.finish(stage, function, params, started, outcome)
    }

    /// Run a synchronous stage.
    ///
    /// # Errors
    ///
    /// Returns [`StageError`] if `f` returns an error or panics.
    pub fn run_sync<T, E, F>(
        &self,
        stage: Stage,
        function: &'static str,
        params: Params,
        f: F,
    ) -> Result<T, StageError>
    where
        F: FnOnce() -> Result<T, E>,
        E: std::error::Error + Send + Sync + 'static,
    {
        tracing::info!(stage = %stage, function, "stage started");
        let started = Instant::now();
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(f));
        self.finish(stage, function, params, started, outcome)
    }

    fn finish<T, E>(
        &self,
        stage: Stage,
        function: &'static str,
        params: Params,
        started: Instant,
        outcome: std::thread::Result<Result<T, E>>,
    ) -> Result<T, StageError>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let (error_type, source): (String, BoxError) = match outcome {
            Ok(Ok(value)) => {
                tracing::info!(stage = %stage, function, elapsed_ms, "stage completed");
                return Ok(value);
            }
            Ok(Err(error)) => {
                let source: BoxError = Box::new(error);
                (short_type_name::<E>().to_string(), source)
            }
            Err(payload) => {
                let source: BoxError = Box::new(Panicked(panic_message(&*payload)));
                ("panic".to_string(), source)
            }
        };

        let message = source.to_string();
        let call_chain = self.call_chain(function, &*source);
        tracing::error!(
            stage = %stage,
            function,
            elapsed_ms,
            error_type = %error_type,
            error = %message,
            "stage failed"
        );

        Err(StageError {
            stage,
            function,
            params,
            error_type,
            message,
            call_chain,
            request_id: context::current_request_id(),
            source,
        })
    }

    /// The wrapped function followed by the error's causes, keeping the
    /// deepest ones when the chain exceeds the configured depth.
    fn call_chain(&self, function: &str, error: &(dyn std::error::Error + 'static)) -> Vec<String> {
        let mut chain = vec![function.to_string()];
        let mut cause = error.source();
        while let Some(err) = cause {
            chain.push(err.to_string());
            cause = err.source();
        }
        if chain.len() > self.call_chain_depth {
            let excess = chain.len() - self.call_chain_depth;
            chain.drain(1..=excess);
        }
        chain
    }
}

/// Lowercase, with `-` folded to `_` so header-style names match too.
fn normalize_key(key: &str) -> String {
    key.to_ascii_lowercase().replace('-', "_")
}

/// Last path segment of a type name, without generic arguments.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Best-effort message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
