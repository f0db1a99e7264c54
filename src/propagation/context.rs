//! Trace identifiers and the immutable trace context value.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// 128-bit trace identifier shared by every span of one trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TraceId(u128);

impl TraceId {
    /// The all-zero (invalid) trace id.
    pub const INVALID: TraceId = TraceId(0);

    pub const fn from_u128(value: u128) -> Self {
        Self(value)
    }

    pub const fn to_u128(self) -> u128 {
        self.0
    }

    /// Parse exactly 32 lower-case hex characters.
    pub fn from_hex(hex: &str) -> Option<Self> {
        parse_lower_hex(hex, 32).map(Self)
    }

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// 64-bit span identifier, unique per hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SpanId(u64);

impl SpanId {
    /// The all-zero (invalid) span id.
    pub const INVALID: SpanId = SpanId(0);

    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub const fn to_u64(self) -> u64 {
        self.0
    }

    /// Parse exactly 16 lower-case hex characters.
    pub fn from_hex(hex: &str) -> Option<Self> {
        parse_lower_hex(hex, 16).map(|v| Self(v as u64))
    }

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

// Ids go over the wire and into exported batches as hex strings.
impl Serialize for TraceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for SpanId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TraceId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        TraceId::from_hex(&hex).ok_or_else(|| serde::de::Error::custom("invalid trace id"))
    }
}

impl<'de> Deserialize<'de> for SpanId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        SpanId::from_hex(&hex).ok_or_else(|| serde::de::Error::custom("invalid span id"))
    }
}

/// Trace flags. Only the sampled bit is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TraceFlags(u8);

impl TraceFlags {
    pub const NOT_SAMPLED: TraceFlags = TraceFlags(0x00);
    pub const SAMPLED: TraceFlags = TraceFlags(0x01);

    /// Build flags from a raw byte, clearing every bit except `sampled`.
    pub const fn new(raw: u8) -> Self {
        Self(raw & Self::SAMPLED.0)
    }

    pub const fn is_sampled(&self) -> bool {
        self.0 & Self::SAMPLED.0 == Self::SAMPLED.0
    }

    pub const fn to_u8(self) -> u8 {
        self.0
    }
}

/// Opaque vendor state carried in the `tracestate` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TraceState(String);

impl TraceState {
    pub fn new(header: impl Into<String>) -> Self {
        Self(header.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Immutable identity of one span within one trace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub trace_flags: TraceFlags,
    #[serde(default, skip_serializing_if = "TraceState::is_empty")]
    pub trace_state: TraceState,
}

impl TraceContext {
    pub fn new(trace_id: TraceId, span_id: SpanId, trace_flags: TraceFlags, trace_state: TraceState) -> Self {
        Self {
            trace_id,
            span_id,
            trace_flags,
            trace_state,
        }
    }

    /// A context is valid iff neither id is all-zero.
    pub fn is_valid(&self) -> bool {
        self.trace_id.is_valid() && self.span_id.is_valid()
    }

    pub fn is_sampled(&self) -> bool {
        self.trace_flags.is_sampled()
    }

    /// Same trace, same flags and state, different span.
    pub fn with_span_id(&self, span_id: SpanId) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id,
            trace_flags: self.trace_flags,
            trace_state: self.trace_state.clone(),
        }
    }
}

fn parse_lower_hex(hex: &str, len: usize) -> Option<u128> {
    if hex.len() != len || !hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return None;
    }
    u128::from_str_radix(hex, 16).ok()
}
