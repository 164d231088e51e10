//! Per-command execution context
//!
//! One [`CommandContext`] exists per top-level command resolution or
//! evaluation; it is never shared across concurrently executing commands.
//! It tracks how deterministic the command has turned out to be, owns the
//! lazily created random source, and caches compiled format objects.

use crate::error::{Error, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use lru::LruCache;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Capacity of each per-context format cache.
const FORMAT_CACHE_SIZE: usize = 32;

/// How reproducible a command's evaluation is.
///
/// The order is significant: lower variants are less deterministic, and a
/// context's level only ever moves downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Determinism {
    Nondeterministic,
    CommandDeterministic,
    SessionDeterministic,
    UserDeterministic,
    Deterministic,
}

/// Context state for one command resolution/evaluation.
pub struct CommandContext {
    determinism: Determinism,
    random: Option<StdRng>,
    decimal_formats: Mutex<Option<LruCache<String, Arc<DecimalFormat>>>>,
    date_formats: Mutex<Option<LruCache<String, Arc<DateFormat>>>>,
}

impl CommandContext {
    pub fn new() -> Self {
        Self {
            determinism: Determinism::Deterministic,
            random: None,
            decimal_formats: Mutex::new(None),
            date_formats: Mutex::new(None),
        }
    }

    pub fn determinism_level(&self) -> Determinism {
        self.determinism
    }

    /// Lower the determinism level. A level at or above the current one is
    /// ignored; the level never rises over the life of the context.
    pub fn set_determinism_level(&mut self, level: Determinism) {
        if level < self.determinism {
            self.determinism = level;
        }
    }

    /// Draw the next random value, seeding the source on first use.
    pub fn next_random(&mut self) -> f64 {
        self.random
            .get_or_insert_with(StdRng::from_entropy)
            .r#gen::<f64>()
    }

    /// Reseed the random source deterministically, then draw.
    pub fn next_random_seeded(&mut self, seed: u64) -> f64 {
        let rng = self.random.insert(StdRng::seed_from_u64(seed));
        rng.r#gen::<f64>()
    }

    /// Get or compile the decimal format for `pattern`.
    ///
    /// With a context the compiled object is cached per distinct pattern;
    /// without one the pattern is compiled uncached, so code paths that have
    /// no context remain correct, just slower.
    pub fn decimal_format(
        context: Option<&CommandContext>,
        pattern: &str,
    ) -> Result<Arc<DecimalFormat>> {
        match context {
            Some(ctx) => {
                let mut guard = ctx.decimal_formats.lock();
                let cache = guard.get_or_insert_with(new_format_cache);
                if let Some(format) = cache.get(pattern) {
                    return Ok(format.clone());
                }
                let format = Arc::new(DecimalFormat::compile(pattern)?);
                cache.put(pattern.to_string(), format.clone());
                Ok(format)
            }
            None => Ok(Arc::new(DecimalFormat::compile(pattern)?)),
        }
    }

    /// Get or compile the date/time format for `pattern`. Same caching
    /// contract as [`CommandContext::decimal_format`].
    pub fn date_format(context: Option<&CommandContext>, pattern: &str) -> Result<Arc<DateFormat>> {
        match context {
            Some(ctx) => {
                let mut guard = ctx.date_formats.lock();
                let cache = guard.get_or_insert_with(new_format_cache);
                if let Some(format) = cache.get(pattern) {
                    return Ok(format.clone());
                }
                let format = Arc::new(DateFormat::compile(pattern)?);
                cache.put(pattern.to_string(), format.clone());
                Ok(format)
            }
            None => Ok(Arc::new(DateFormat::compile(pattern)?)),
        }
    }
}

impl Default for CommandContext {
    fn default() -> Self {
        Self::new()
    }
}

fn new_format_cache<V>() -> LruCache<String, V> {
    LruCache::new(NonZeroUsize::new(FORMAT_CACHE_SIZE).expect("cache size is nonzero"))
}

/// A compiled `#,##0.00`-style decimal format pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalFormat {
    pattern: String,
    grouping: bool,
    min_integer_digits: usize,
    min_fraction_digits: usize,
    max_fraction_digits: usize,
}

impl DecimalFormat {
    /// Compile a pattern. Supported symbols: `#` (optional digit), `0`
    /// (required digit), `,` (grouping, integer part only) and a single `.`
    /// separating integer from fraction digits.
    pub fn compile(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::InvalidFormat(pattern.to_string()));
        }
        let mut parts = pattern.splitn(2, '.');
        let integer = parts.next().unwrap_or("");
        let fraction = parts.next();

        let mut grouping = false;
        let mut min_integer_digits = 0;
        for ch in integer.chars() {
            match ch {
                '#' => {}
                '0' => min_integer_digits += 1,
                ',' => grouping = true,
                _ => return Err(Error::InvalidFormat(pattern.to_string())),
            }
        }

        let mut min_fraction_digits = 0;
        let mut max_fraction_digits = 0;
        if let Some(fraction) = fraction {
            let mut optional_seen = false;
            for ch in fraction.chars() {
                match ch {
                    '0' if !optional_seen => {
                        min_fraction_digits += 1;
                        max_fraction_digits += 1;
                    }
                    '#' => {
                        optional_seen = true;
                        max_fraction_digits += 1;
                    }
                    _ => return Err(Error::InvalidFormat(pattern.to_string())),
                }
            }
        }

        Ok(Self {
            pattern: pattern.to_string(),
            grouping,
            min_integer_digits,
            min_fraction_digits,
            max_fraction_digits,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Format a decimal value per the compiled pattern.
    pub fn format(&self, value: &Decimal) -> String {
        let rounded = value.round_dp(self.max_fraction_digits as u32);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let text = rounded.abs().to_string();
        let mut parts = text.splitn(2, '.');
        let mut integer = parts.next().unwrap_or("0").to_string();
        let mut fraction = parts.next().unwrap_or("").to_string();

        while integer.len() < self.min_integer_digits {
            integer.insert(0, '0');
        }
        while fraction.len() < self.min_fraction_digits {
            fraction.push('0');
        }
        fraction.truncate(self.max_fraction_digits);

        if self.grouping {
            integer = group_thousands(&integer);
        }

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(&integer);
        if !fraction.is_empty() {
            out.push('.');
            out.push_str(&fraction);
        }
        out
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let chars: Vec<char> = digits.chars().collect();
    for (i, ch) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*ch);
    }
    out
}

/// A validated strftime date/time format pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    pattern: String,
}

impl DateFormat {
    /// Compile (validate) a strftime pattern once, up front.
    pub fn compile(pattern: &str) -> Result<Self> {
        let invalid = StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error));
        if invalid {
            return Err(Error::InvalidFormat(pattern.to_string()));
        }
        Ok(Self {
            pattern: pattern.to_string(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn format_timestamp(&self, value: &NaiveDateTime) -> String {
        value.format(&self.pattern).to_string()
    }

    pub fn format_date(&self, value: &NaiveDate) -> String {
        value.format(&self.pattern).to_string()
    }

    pub fn format_time(&self, value: &NaiveTime) -> String {
        value.format(&self.pattern).to_string()
    }
}
