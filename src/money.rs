//! Exact-precision monetary values in BRL format
//!
//! Amounts are held as a signed number of cents. Parsing from and rendering
//! to the locale format (`1.234,56`) are the only places where decimal text
//! is interpreted; every comparison and sum works on the integer value.

use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};

use crate::types::{ReconError, ReconResult};

/// Whether money flows into or out of the register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Regular entry (deposit, receipt)
    #[default]
    Incoming,
    /// "Saída" entry, carried as a negative value
    Outgoing,
}

impl Direction {
    /// Direction implied by the sign of a value
    pub fn of(value: Money) -> Self {
        if value.is_negative() {
            Direction::Outgoing
        } else {
            Direction::Incoming
        }
    }

    /// Give `value` the sign that matches this direction
    pub fn apply(&self, value: Money) -> Money {
        match self {
            Direction::Incoming => value.abs(),
            Direction::Outgoing => -value.abs(),
        }
    }
}

/// Monetary amount in cents
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest magnitude accepted from parsing, conversion and the entry store
    /// (R$ 10 trilhões). Sums of many such values still fit in an `i64`.
    pub const MAX_CENTS: i64 = 1_000_000_000_000_000;

    /// Build from a number of cents
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Build from a number of cents, rejecting magnitudes above [`Money::MAX_CENTS`]
    pub fn try_from_cents(cents: i64) -> ReconResult<Self> {
        let value = Money(cents);
        if value.is_within_limits() {
            Ok(value)
        } else {
            Err(ReconError::Validation(format!(
                "amount out of range: {} cents",
                cents
            )))
        }
    }

    /// Build from whole reais and cents; cents above 99 carry into reais,
    /// e.g. `Money::new(1, 150)` is R$2,50
    pub fn new(reais: i64, cents: u32) -> ReconResult<Self> {
        let magnitude = reais
            .checked_abs()
            .and_then(|r| r.checked_mul(100))
            .and_then(|r| r.checked_add(i64::from(cents)))
            .ok_or_else(|| {
                ReconError::Validation(format!("amount out of range: {} reais", reais))
            })?;
        Self::try_from_cents(if reais < 0 { -magnitude } else { magnitude })
    }

    pub const fn cents(&self) -> i64 {
        self.0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn abs(&self) -> Money {
        Money(self.0.saturating_abs())
    }

    pub const fn is_within_limits(&self) -> bool {
        self.0 >= -Self::MAX_CENTS && self.0 <= Self::MAX_CENTS
    }

    /// Absolute difference in cents
    pub fn abs_diff(&self, other: Money) -> u64 {
        self.0.abs_diff(other.0)
    }

    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// True when `self` and `other` differ by at most `tolerance_cents`
    pub fn approx_eq(&self, other: Money, tolerance_cents: u64) -> bool {
        self.abs_diff(other) <= tolerance_cents
    }

    /// Parse a non-negative amount such as `150,75`, `1.234,56` or `1 234.5`
    pub fn parse(text: &str) -> ReconResult<Money> {
        let value = Self::parse_signed(text)?;
        if value.is_negative() {
            return Err(ReconError::Parse(format!(
                "negative amount not allowed here: '{}'",
                text.trim()
            )));
        }
        Ok(value)
    }

    /// Parse an amount that may carry a leading minus sign (outgoing entries)
    pub fn parse_signed(text: &str) -> ReconResult<Money> {
        let trimmed = text.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };
        let body = body.strip_prefix("R$").unwrap_or(body).trim_start();

        if body.is_empty() {
            return Err(ReconError::Parse(format!("empty amount: '{}'", text)));
        }

        let (integer, fraction) = split_decimal(body)
            .ok_or_else(|| ReconError::Parse(format!("malformed amount: '{}'", trimmed)))?;

        if fraction.len() > 2 {
            return Err(ReconError::Parse(format!(
                "more than 2 fractional digits: '{}'",
                trimmed
            )));
        }

        let whole = parse_grouped(integer)
            .ok_or_else(|| ReconError::Parse(format!("malformed amount: '{}'", trimmed)))?;

        let mut frac_cents: i64 = 0;
        for (i, c) in fraction.chars().enumerate() {
            let digit = c
                .to_digit(10)
                .ok_or_else(|| ReconError::Parse(format!("malformed amount: '{}'", trimmed)))?;
            frac_cents += i64::from(digit) * if i == 0 { 10 } else { 1 };
        }

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac_cents))
            .filter(|c| *c <= Self::MAX_CENTS)
            .ok_or_else(|| ReconError::Parse(format!("amount out of range: '{}'", trimmed)))?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Render as `1.234,56` (always two fractional digits, `-` for negatives)
    pub fn format(&self) -> String {
        let abs = self.0.unsigned_abs();
        let whole = (abs / 100).to_string();
        let frac = abs % 100;

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, c) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        let sign = if self.is_negative() { "-" } else { "" };
        format!("{}{},{:02}", sign, grouped, frac)
    }

    /// Exact decimal representation (scale 2)
    pub fn to_decimal(&self) -> BigDecimal {
        BigDecimal::new(self.0.into(), 2)
    }

    /// Convert from a decimal, rejecting sub-cent precision
    pub fn from_decimal(value: &BigDecimal) -> ReconResult<Money> {
        if value.with_scale(2) != *value {
            return Err(ReconError::Parse(format!(
                "more than 2 fractional digits: {}",
                value
            )));
        }
        (value.clone() * BigDecimal::from(100))
            .to_i64()
            .map(Money)
            .filter(Money::is_within_limits)
            .ok_or_else(|| ReconError::Parse(format!("amount out of range: {}", value)))
    }
}

/// Split into integer digits (with separators) and fractional digits.
fn split_decimal(body: &str) -> Option<(&str, &str)> {
    if body.matches(',').count() > 1 {
        return None;
    }
    if let Some((integer, fraction)) = body.split_once(',') {
        if fraction.is_empty() || fraction.contains(['.', ' ', '\u{a0}']) {
            return None;
        }
        return Some((integer, fraction));
    }

    // No comma: a lone dot followed by one or two digits is a decimal point
    if body.matches('.').count() == 1 {
        if let Some((integer, fraction)) = body.split_once('.') {
            if fraction.is_empty() {
                return None;
            }
            if fraction.len() != 3 || integer.contains([' ', '\u{a0}']) {
                return Some((integer, fraction));
            }
        }
    }
    Some((body, ""))
}

/// Parse integer digits with optional `.`/space thousands grouping.
fn parse_grouped(integer: &str) -> Option<i64> {
    if integer.is_empty() {
        return None;
    }
    let groups: Vec<&str> = integer.split(['.', ' ', '\u{a0}']).collect();
    if groups.len() > 1 {
        let first = groups[0];
        if first.is_empty() || first.len() > 3 || groups[1..].iter().any(|g| g.len() != 3) {
            return None;
        }
    }

    let mut value: i64 = 0;
    for c in groups.concat().chars() {
        let digit = c.to_digit(10)?;
        value = value.checked_mul(10)?.checked_add(i64::from(digit))?;
    }
    Some(value)
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R$ {}", self.format())
    }
}

impl std::str::FromStr for Money {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse_signed(s)
    }
}

// Operators saturate; totals over stored entries go through `checked_add`.
impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}
