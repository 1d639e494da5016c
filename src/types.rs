//! Core data types shared by the volatility, advisor and level-generation code

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for candle data
#[derive(Debug, Error)]
pub enum CandleValidationError {
    #[error("high ({high}) must be >= low ({low})")]
    HighLessThanLow { high: f64, low: f64 },

    #[error("close ({close}) must be between low ({low}) and high ({high})")]
    CloseOutOfRange { close: f64, low: f64, high: f64 },

    #[error("prices must be positive: open={open}, high={high}, low={low}, close={close}")]
    NonPositivePrice {
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },
}

/// OHLC candlestick as supplied by the market-data provider.
///
/// Volume is carried when the source has it but no calculation reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    /// Create a new candle with validation
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    ) -> Result<Self, CandleValidationError> {
        let candle = Self::new_unchecked(timestamp, open, high, low, close);
        candle.validate()?;
        Ok(candle)
    }

    /// Create a candle without validation (for trusted sources or test fixtures)
    pub fn new_unchecked(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: 0.0,
        }
    }

    /// Validate the candle data
    pub fn validate(&self) -> Result<(), CandleValidationError> {
        if self.open <= 0.0 || self.high <= 0.0 || self.low <= 0.0 || self.close <= 0.0 {
            return Err(CandleValidationError::NonPositivePrice {
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }

        if self.high < self.low {
            return Err(CandleValidationError::HighLessThanLow {
                high: self.high,
                low: self.low,
            });
        }

        if self.close < self.low || self.close > self.high {
            return Err(CandleValidationError::CloseOutOfRange {
                close: self.close,
                low: self.low,
                high: self.high,
            });
        }

        Ok(())
    }

    /// Check if the candle is valid without returning detailed error
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Direction of a grid strike controller.
///
/// Serialized as the integer the deployment API expects (`1` = LONG, `2` = SHORT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Side {
    #[default]
    Long,
    Short,
}

impl Side {
    pub const fn wire_value(self) -> u8 {
        match self {
            Side::Long => 1,
            Side::Short => 2,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Side::Long => "LONG",
            Side::Short => "SHORT",
        }
    }
}

impl TryFrom<u8> for Side {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Side::Long),
            2 => Ok(Side::Short),
            other => Err(format!("invalid side {other}: expected 1 (LONG) or 2 (SHORT)")),
        }
    }
}

impl From<Side> for u8 {
    fn from(side: Side) -> Self {
        side.wire_value()
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LONG" | "1" => Ok(Side::Long),
            "SHORT" | "2" => Ok(Side::Short),
            other => Err(format!("unknown side: {other}")),
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Order type tag attached to opening and take-profit orders.
///
/// Grid configs carry the integer (`1/2/3`), PMM configs the upper-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OrderType {
    Market,
    Limit,
    LimitMaker,
}

impl OrderType {
    pub const fn wire_value(self) -> u8 {
        match self {
            OrderType::Market => 1,
            OrderType::Limit => 2,
            OrderType::LimitMaker => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::LimitMaker => "LIMIT_MAKER",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "MARKET" => Some(OrderType::Market),
            "LIMIT" => Some(OrderType::Limit),
            "LIMIT_MAKER" => Some(OrderType::LimitMaker),
            _ => None,
        }
    }
}

impl TryFrom<u8> for OrderType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(OrderType::Market),
            2 => Ok(OrderType::Limit),
            3 => Ok(OrderType::LimitMaker),
            other => Err(format!("invalid order type {other}: expected 1, 2 or 3")),
        }
    }
}

impl From<OrderType> for u8 {
    fn from(order_type: OrderType) -> Self {
        order_type.wire_value()
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Serde adapter for order types carried by name (`"LIMIT_MAKER"`).
pub mod order_type_name {
    use super::OrderType;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &OrderType, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.name())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OrderType, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        OrderType::from_name(&s).ok_or_else(|| D::Error::custom(format!("unknown order type: {s}")))
    }
}

// ============================================================================
// Money Type - Fixed-point arithmetic for prices, amounts and fractions
// ============================================================================

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Fixed-point decimal used for every price, amount, spread and percentage
/// that flows into a config or a level set.
///
/// Quantization (ceil/floor to an increment) and level interpolation run on
/// the inner `Decimal`. On the wire it is a JSON number.
///
/// # Example
/// ```
/// use controller_advisor::Money;
/// let price = Money::from_f64(100.50);
/// let qty = Money::from_f64(2.0);
/// let total = price * qty;
/// assert_eq!(total.to_f64(), 201.0);
/// ```
#[derive(Debug, Clone, Copy, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    pub const ONE: Money = Money(Decimal::ONE);
    pub const ONE_HUNDRED: Money = Money(Decimal::ONE_HUNDRED);

    pub const fn from_decimal(value: Decimal) -> Self {
        Money(value)
    }

    /// Create from f64. NaN and infinities collapse to zero.
    pub fn from_f64(value: f64) -> Self {
        Money(Decimal::try_from(value).unwrap_or_else(|_| {
            if value.is_nan() || value.is_infinite() {
                Decimal::ZERO
            } else {
                Decimal::from_f64_retain(value).unwrap_or(Decimal::ZERO)
            }
        }))
    }

    pub fn to_f64(self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    pub fn from_i64(value: i64) -> Self {
        Money(Decimal::from(value))
    }

    pub fn from_usize(value: usize) -> Self {
        Money(Decimal::from(value))
    }

    /// Whole part as a count; negative values map to zero and values past
    /// `usize::MAX` saturate.
    pub fn to_usize(self) -> usize {
        match self.0.trunc().to_usize() {
            Some(count) => count,
            None if self.0.is_sign_positive() => usize::MAX,
            None => 0,
        }
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn floor(self) -> Self {
        Money(self.0.floor())
    }

    pub fn ceil(self) -> Self {
        Money(self.0.ceil())
    }

    /// Round to specified decimal places (banker's rounding)
    pub fn round_dp(self, dp: u32) -> Self {
        Money(self.0.round_dp(dp))
    }

    /// Fraction expressed in percent (`0.025` -> `2.5`)
    pub fn to_percent(self) -> Self {
        Money(self.0 * Decimal::ONE_HUNDRED)
    }

    /// Drop trailing zeros from the scale, `1.2000` -> `1.2`
    pub fn normalize(self) -> Self {
        Money(self.0.normalize())
    }

    pub fn inner(self) -> Decimal {
        self.0
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::ZERO
    }
}

// Forward the formatter so `{:.2}` works the same as for Decimal
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Decimal::from_str_exact(s)
            .or_else(|_| Decimal::from_scientific(s))
            .map(Money)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Money {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl std::hash::Hash for Money {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Mul for Money {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        Money(self.0 * rhs.0)
    }
}

/// Division by zero yields zero; callers that can see a zero divisor check
/// `is_positive()` first.
impl Div for Money {
    type Output = Self;
    fn div(self, rhs: Self) -> Self::Output {
        if rhs.0.is_zero() {
            Money::ZERO
        } else {
            Money(self.0 / rhs.0)
        }
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl From<f64> for Money {
    fn from(value: f64) -> Self {
        Money::from_f64(value)
    }
}

impl From<Money> for f64 {
    fn from(value: Money) -> Self {
        value.to_f64()
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Money::from_i64(value)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money(value)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, x| acc + x)
    }
}

impl<'a> std::iter::Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, x| acc + *x)
    }
}

#[cfg(test)]
mod money_tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_precision() {
        let a = Money::from_f64(0.1);
        let b = Money::from_f64(0.2);
        let c = Money::from_f64(0.3);
        assert_eq!(a + b, c, "Money should handle 0.1 + 0.2 = 0.3 correctly");
    }

    #[test]
    fn test_money_floor_ceil() {
        let m = Money::from_decimal(dec!(2.5));
        assert_eq!(m.floor(), Money::from_i64(2));
        assert_eq!(m.ceil(), Money::from_i64(3));
        assert_eq!(m.to_usize(), 2);
        assert_eq!(Money::from_i64(-3).to_usize(), 0);
    }

    #[test]
    fn test_money_to_usize_saturates() {
        assert_eq!(Money::from_decimal(Decimal::MAX).to_usize(), usize::MAX);
        assert_eq!(Money::from_decimal(Decimal::MIN).to_usize(), 0);
        assert_eq!(Money::from_decimal(dec!(7.9)).to_usize(), 7);
    }

    #[test]
    fn test_money_div_by_zero() {
        assert_eq!(Money::from_f64(100.0) / Money::ZERO, Money::ZERO);
    }

    #[test]
    fn test_money_display_respects_precision() {
        let m = Money::from_decimal(dec!(16.666666));
        assert_eq!(format!("{:.2}", m), "16.67");
    }

    #[test]
    fn test_money_parse() {
        assert_eq!("0.0002".parse::<Money>().unwrap(), Money::from_decimal(dec!(0.0002)));
        assert_eq!(" 1e-3 ".parse::<Money>().unwrap(), Money::from_decimal(dec!(0.001)));
        assert!("abc".parse::<Money>().is_err());
    }

    #[test]
    fn test_money_serde_as_number() {
        let json = serde_json::to_string(&Money::from_decimal(dec!(98.5))).unwrap();
        assert_eq!(json, "98.5");
        let parsed: Money = serde_json::from_str("0.0001").unwrap();
        assert_eq!(parsed, Money::from_decimal(dec!(0.0001)));
    }

    #[test]
    fn test_side_wire_values() {
        assert_eq!(serde_json::to_string(&Side::Short).unwrap(), "2");
        let side: Side = serde_json::from_str("1").unwrap();
        assert_eq!(side, Side::Long);
        assert!(serde_json::from_str::<Side>("3").is_err());
    }

    #[test]
    fn test_order_type_wire_values() {
        assert_eq!(serde_json::to_string(&OrderType::LimitMaker).unwrap(), "3");
        assert_eq!(OrderType::from_name("limit_maker"), Some(OrderType::LimitMaker));
        assert_eq!(OrderType::from_name("stop"), None);
    }

    #[test]
    fn test_candle_validation() {
        let ts = Utc::now();
        assert!(Candle::new(ts, 100.0, 101.0, 99.0, 100.5).is_ok());
        assert!(matches!(
            Candle::new(ts, 100.0, 99.0, 101.0, 100.0),
            Err(CandleValidationError::HighLessThanLow { .. })
        ));
        assert!(!Candle::new_unchecked(ts, 0.0, 1.0, 1.0, 1.0).is_valid());
    }
}
