//! Exchange rate snapshot types

use crate::core::error::ConversionError;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// Number of fractional digits rates are rendered with.
pub const RATE_PRECISION: u32 = 6;

/// Renders a decimal with exactly [`RATE_PRECISION`] fractional digits.
pub fn format_fixed(value: Decimal) -> String {
    let rounded =
        value.round_dp_with_strategy(RATE_PRECISION, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.prec$}", rounded, prec = RATE_PRECISION as usize)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum RateType {
    Buy,
    Middle,
    Sell,
}

impl Display for RateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RateType::Buy => "buy",
                RateType::Middle => "middle",
                RateType::Sell => "sell",
            }
        )
    }
}

impl FromStr for RateType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buy" => Ok(RateType::Buy),
            "middle" => Ok(RateType::Middle),
            "sell" => Ok(RateType::Sell),
            _ => Err(ConversionError::InvalidRateType(s.to_string())),
        }
    }
}

/// Buy, middle and sell rates of one currency, per single unit.
///
/// Values are passed through as quoted; no ordering between them is assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    pub buy: Decimal,
    pub middle: Decimal,
    pub sell: Decimal,
}

impl Rate {
    pub fn get(&self, rate_type: RateType) -> Decimal {
        match rate_type {
            RateType::Buy => self.buy,
            RateType::Middle => self.middle,
            RateType::Sell => self.sell,
        }
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Rate", 3)?;
        state.serialize_field("buy", &format_fixed(self.buy))?;
        state.serialize_field("middle", &format_fixed(self.middle))?;
        state.serialize_field("sell", &format_fixed(self.sell))?;
        state.end()
    }
}

/// Exchange rates for a date of application.
///
/// A snapshot is never modified once built. The rate updater shares it
/// behind an `Arc` and replaces it wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Exchange {
    pub date: NaiveDate,
    pub rates: BTreeMap<String, Rate>,
}

impl Exchange {
    pub fn new(date: NaiveDate, rates: BTreeMap<String, Rate>) -> Self {
        Self { date, rates }
    }

    pub fn rate(&self, currency: &str) -> Option<&Rate> {
        self.rates.get(currency)
    }

    /// Converts `value` units of `currency` into kuna using the selected rate.
    pub fn convert(
        &self,
        value: Decimal,
        currency: &str,
        rate_type: RateType,
    ) -> Result<Decimal, ConversionError> {
        let rate = self
            .rates
            .get(&currency.to_uppercase())
            .ok_or_else(|| ConversionError::UnknownCurrency(currency.to_string()))?;
        value
            .checked_mul(rate.get(rate_type))
            .ok_or_else(|| ConversionError::Overflow {
                value,
                currency: currency.to_string(),
            })
    }
}
