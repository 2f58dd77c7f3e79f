//! Strategies for primitive value spaces.

use std::rc::Rc;

use rand::{Rng, RngCore};

use crate::descriptor::Descriptor;
use crate::error::ProduceError;
use crate::shrink;
use crate::strategy::{
    FlagSet, Simplifications, Strategy, collection_length, distinct, flags,
};
use crate::value::Value;

fn none<'a>() -> Simplifications<'a> {
    Box::new(std::iter::empty())
}

fn ints(candidates: impl Iterator<Item = i128> + 'static) -> impl Iterator<Item = Value> {
    candidates.filter_map(|c| i64::try_from(c).ok()).map(Value::Int)
}

/// `2^exponent - 1` for an exponent clamped to `[0, cap]`
fn magnitude_bound(exponent: f64, cap: f64) -> i64 {
    let exponent = exponent.clamp(0.0, cap).floor();
    (2f64.powf(exponent) as i64).saturating_sub(1)
}

/// Strategy for boolean values
#[derive(Debug, Clone)]
pub struct BoolStrategy {
    descriptor: Descriptor,
}

impl BoolStrategy {
    pub fn new() -> Self {
        Self {
            descriptor: Descriptor::Bool,
        }
    }
}

impl Default for BoolStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for BoolStrategy {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn produce(
        &self,
        rng: &mut dyn RngCore,
        _size: f64,
        _active: &FlagSet,
    ) -> Result<Value, ProduceError> {
        Ok(Value::Bool(rng.r#gen()))
    }

    fn could_have_produced(&self, value: &Value) -> bool {
        matches!(value, Value::Bool(_))
    }

    fn complexity(&self, value: &Value) -> f64 {
        match value {
            Value::Bool(true) => 1.0,
            _ => 0.0,
        }
    }

    fn simplify<'a>(&'a self, value: &Value) -> Simplifications<'a> {
        match value {
            Value::Bool(true) => Box::new(std::iter::once(Value::Bool(false))),
            _ => none(),
        }
    }
}

/// Strategy for 64-bit signed integers
///
/// Magnitudes grow as `2^size`. The `int.small` flag caps the exponent at 2,
/// `int.non_negative` suppresses the random sign.
#[derive(Debug, Clone)]
pub struct IntStrategy {
    descriptor: Descriptor,
}

impl IntStrategy {
    pub fn new() -> Self {
        Self {
            descriptor: Descriptor::Int,
        }
    }
}

impl Default for IntStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for IntStrategy {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn produce(
        &self,
        rng: &mut dyn RngCore,
        size: f64,
        active: &FlagSet,
    ) -> Result<Value, ProduceError> {
        let cap = if active.contains(&flags::INT_SMALL) { 2.0 } else { 62.0 };
        let magnitude = rng.gen_range(0..=magnitude_bound(size, cap));
        let negative = !active.contains(&flags::INT_NON_NEGATIVE) && rng.r#gen::<bool>();
        Ok(Value::Int(if negative { -magnitude } else { magnitude }))
    }

    fn flags(&self) -> FlagSet {
        [flags::INT_NON_NEGATIVE, flags::INT_SMALL].into_iter().collect()
    }

    fn could_have_produced(&self, value: &Value) -> bool {
        matches!(value, Value::Int(_))
    }

    fn complexity(&self, value: &Value) -> f64 {
        match value {
            Value::Int(x) => {
                let sign = if *x < 0 { 0.5 } else { 0.0 };
                shrink::magnitude(*x as f64) + sign
            }
            _ => 0.0,
        }
    }

    fn simplify<'a>(&'a self, value: &Value) -> Simplifications<'a> {
        let x = match value {
            Value::Int(x) if *x != 0 => *x,
            _ => return none(),
        };
        let flipped = if x < 0 { x.checked_neg() } else { None };
        let candidates = std::iter::once(Value::Int(0))
            .chain(flipped.map(Value::Int))
            .chain(ints(shrink::approach(x as i128, 0).skip(1)));
        distinct(value, candidates)
    }
}

/// Strategy for integers in an inclusive range
///
/// Values cluster around the target (zero clamped into the range) and
/// spread out as the size grows.
#[derive(Debug, Clone)]
pub struct IntRangeStrategy {
    descriptor: Descriptor,
    low: i64,
    high: i64,
}

impl IntRangeStrategy {
    pub fn new(low: i64, high: i64) -> Self {
        Self {
            descriptor: Descriptor::int_range(low, high),
            low,
            high,
        }
    }

    fn is_empty(&self) -> bool {
        self.low > self.high
    }

    /// The simplest value of the range
    pub fn target(&self) -> i64 {
        if self.low > 0 {
            self.low
        } else if self.high < 0 {
            self.high
        } else {
            0
        }
    }
}

impl Strategy for IntRangeStrategy {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn produce(
        &self,
        rng: &mut dyn RngCore,
        size: f64,
        _active: &FlagSet,
    ) -> Result<Value, ProduceError> {
        if self.is_empty() {
            return Err(ProduceError::exhausted(
                &self.descriptor,
                format!("empty range {}..={}", self.low, self.high),
            ));
        }
        let target = self.target() as i128;
        let reach = magnitude_bound(size, 62.0) as i128;
        let low = (target - reach).max(self.low as i128);
        let high = (target + reach).min(self.high as i128);
        let drawn = rng.gen_range(low..=high);
        Ok(Value::Int(i64::try_from(drawn).unwrap_or(self.target())))
    }

    fn could_have_produced(&self, value: &Value) -> bool {
        match value {
            Value::Int(x) => self.low <= *x && *x <= self.high,
            _ => false,
        }
    }

    fn complexity(&self, value: &Value) -> f64 {
        match value {
            Value::Int(x) => {
                let distance = *x as i128 - self.target() as i128;
                shrink::magnitude(distance as f64)
            }
            _ => 0.0,
        }
    }

    fn simplify<'a>(&'a self, value: &Value) -> Simplifications<'a> {
        match value {
            Value::Int(x) => distinct(
                value,
                ints(shrink::approach(*x as i128, self.target() as i128)),
            ),
            _ => none(),
        }
    }
}

/// Strategy for 64-bit floats
///
/// Produces `u * 2^e` with `u` in `[0, 1)` and `e` up to the size. Never
/// produces NaN or infinities but accepts and simplifies them.
#[derive(Debug, Clone)]
pub struct FloatStrategy {
    descriptor: Descriptor,
}

impl FloatStrategy {
    pub fn new() -> Self {
        Self {
            descriptor: Descriptor::Float,
        }
    }
}

impl Default for FloatStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for FloatStrategy {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn produce(
        &self,
        rng: &mut dyn RngCore,
        size: f64,
        active: &FlagSet,
    ) -> Result<Value, ProduceError> {
        let max_exponent = size.clamp(0.0, 1000.0).floor() as i32;
        let exponent = rng.gen_range(0..=max_exponent);
        let mut value = rng.r#gen::<f64>() * 2f64.powi(exponent);
        if active.contains(&flags::FLOAT_INTEGRAL) {
            value = value.trunc();
        }
        if !active.contains(&flags::FLOAT_NON_NEGATIVE) && rng.r#gen::<bool>() {
            value = -value;
        }
        Ok(Value::Float(value))
    }

    fn flags(&self) -> FlagSet {
        [flags::FLOAT_NON_NEGATIVE, flags::FLOAT_INTEGRAL]
            .into_iter()
            .collect()
    }

    fn could_have_produced(&self, value: &Value) -> bool {
        matches!(value, Value::Float(_))
    }

    fn complexity(&self, value: &Value) -> f64 {
        match value {
            Value::Float(x) => shrink::float_complexity(*x),
            _ => 0.0,
        }
    }

    fn simplify<'a>(&'a self, value: &Value) -> Simplifications<'a> {
        match value {
            Value::Float(x) => distinct(
                value,
                shrink::float_candidates(*x).into_iter().map(Value::Float),
            ),
            _ => none(),
        }
    }
}

/// Simplicity rank of a character: lowercase letters first, then by code point
fn char_rank(c: char) -> u32 {
    if c.is_ascii_lowercase() {
        c as u32 - 'a' as u32
    } else {
        26 + c as u32
    }
}

/// Replacements for a character, simplest first
fn char_candidates(c: char) -> Vec<char> {
    if c == 'a' {
        return Vec::new();
    }
    let mut candidates = vec!['a'];
    if c.is_ascii_lowercase() {
        let halfway = (b'a' + (c as u8 - b'a') / 2) as char;
        if halfway != 'a' {
            candidates.push(halfway);
        }
    }
    candidates
}

/// Strategy for strings
///
/// Length is geometric with mean `size`. Characters are printable ASCII, or
/// lowercase letters only under `text.lowercase`.
#[derive(Debug, Clone)]
pub struct TextStrategy {
    descriptor: Descriptor,
}

impl TextStrategy {
    pub fn new() -> Self {
        Self {
            descriptor: Descriptor::Text,
        }
    }
}

impl Default for TextStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for TextStrategy {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn produce(
        &self,
        rng: &mut dyn RngCore,
        size: f64,
        active: &FlagSet,
    ) -> Result<Value, ProduceError> {
        let len = collection_length(rng, size, active.contains(&flags::TEXT_ALLOW_EMPTY));
        let lowercase = active.contains(&flags::TEXT_LOWERCASE);
        let text: String = (0..len)
            .map(|_| {
                if lowercase {
                    rng.gen_range(b'a'..=b'z') as char
                } else {
                    rng.gen_range(0x20u8..=0x7e) as char
                }
            })
            .collect();
        Ok(Value::Text(text))
    }

    fn flags(&self) -> FlagSet {
        [flags::TEXT_ALLOW_EMPTY, flags::TEXT_LOWERCASE]
            .into_iter()
            .collect()
    }

    fn could_have_produced(&self, value: &Value) -> bool {
        matches!(value, Value::Text(_))
    }

    fn complexity(&self, value: &Value) -> f64 {
        match value {
            Value::Text(s) => s
                .chars()
                .map(|c| 1.0 + shrink::magnitude(char_rank(c) as f64))
                .sum(),
            _ => 0.0,
        }
    }

    fn simplify<'a>(&'a self, value: &Value) -> Simplifications<'a> {
        let chars: Rc<Vec<char>> = match value {
            Value::Text(s) if !s.is_empty() => Rc::new(s.chars().collect()),
            _ => return none(),
        };
        let structural = shrink::deletions(Rc::clone(&chars))
            .map(|shrunk| Value::Text(shrunk.into_iter().collect()));
        let replacements = (0..chars.len()).flat_map(move |idx| {
            let chars = Rc::clone(&chars);
            char_candidates(chars[idx]).into_iter().map(move |c| {
                let mut replaced = chars.to_vec();
                replaced[idx] = c;
                Value::Text(replaced.into_iter().collect())
            })
        });
        distinct(value, structural.chain(replacements))
    }
}

/// Strategy that always produces one fixed value
#[derive(Debug, Clone)]
pub struct JustStrategy {
    descriptor: Descriptor,
    value: Value,
}

impl JustStrategy {
    pub fn new(value: Value) -> Self {
        Self {
            descriptor: Descriptor::Just(value.clone()),
            value,
        }
    }
}

impl Strategy for JustStrategy {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn produce(
        &self,
        _rng: &mut dyn RngCore,
        _size: f64,
        _active: &FlagSet,
    ) -> Result<Value, ProduceError> {
        Ok(self.value.clone())
    }

    fn could_have_produced(&self, value: &Value) -> bool {
        *value == self.value
    }

    fn complexity(&self, _value: &Value) -> f64 {
        0.0
    }

    fn simplify<'a>(&'a self, _value: &Value) -> Simplifications<'a> {
        none()
    }
}
