//! Lookup configuration
//!
//! Default mengikuti perilaku klien NSS asli: nama maksimal 255 byte,
//! byte sisa setelah record diabaikan.

use std::env;

/// Maximum length of a name or protocol string, terminator excluded.
pub const DEFAULT_MAX_NAME_LEN: usize = 255;

/// Upper bound for [`LookupConfig::max_name_len`]; request buffers are sized from it.
pub const MAX_NAME_LEN_CEILING: usize = 4096;

/// Env override for [`LookupConfig::max_name_len`].
pub const ENV_MAX_NAME_LEN: &str = "NSS_SVC_MAX_NAME_LEN";
/// Env override for [`LookupConfig::strict_trailing`].
pub const ENV_STRICT_TRAILING: &str = "NSS_SVC_STRICT_TRAILING";

/// Limits and policies shared by the encoder, decoder and client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupConfig {
    /// Longest accepted name/protocol (bytes, terminator excluded)
    pub max_name_len: usize,
    /// Reject responses with bytes left over after the record
    pub strict_trailing: bool,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            max_name_len: DEFAULT_MAX_NAME_LEN,
            strict_trailing: false,
        }
    }
}

impl LookupConfig {
    /// Nilai di atas [`MAX_NAME_LEN_CEILING`] dipotong ke ceiling.
    pub fn with_max_name_len(mut self, max_name_len: usize) -> Self {
        self.max_name_len = max_name_len.min(MAX_NAME_LEN_CEILING);
        self
    }

    /// Same config with `max_name_len` capped at [`MAX_NAME_LEN_CEILING`].
    #[inline(always)]
    pub fn clamped(self) -> Self {
        self.with_max_name_len(self.max_name_len)
    }

    pub fn with_strict_trailing(mut self, strict: bool) -> Self {
        self.strict_trailing = strict;
        self
    }

    /// Default config dengan override dari environment.
    ///
    /// Nilai yang tidak bisa di-parse diabaikan (tetap default).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_MAX_NAME_LEN) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 && n <= MAX_NAME_LEN_CEILING => config.max_name_len = n,
                _ => tracing::warn!(value = %raw, "ignoring invalid {}", ENV_MAX_NAME_LEN),
            }
        }

        if let Some(raw) = lookup(ENV_STRICT_TRAILING) {
            match raw.trim() {
                "1" | "true" | "yes" => config.strict_trailing = true,
                "0" | "false" | "no" => config.strict_trailing = false,
                _ => tracing::warn!(value = %raw, "ignoring invalid {}", ENV_STRICT_TRAILING),
            }
        }

        config
    }
}
