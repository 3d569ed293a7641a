//! Money and Limit types
//!
//! Domain primitives for monetary values and credit limits.
//! Money arithmetic is only defined within a single currency; mixing
//! currencies is reported as an error instead of silently converting.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors that can occur when building or combining money values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: Currency, right: Currency },

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Invalid money format: {0}")]
    ParseError(String),
}

/// Three-letter uppercase currency code (e.g. `USD`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 3 && s.chars().all(|c| c.is_ascii_uppercase()) {
            Ok(Self(s.to_string()))
        } else {
            Err(MoneyError::InvalidCurrency(s.to_string()))
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Currency::from_str(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A decimal amount tagged with its currency.
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use card_consistency::domain::{Currency, Money};
///
/// let usd: Currency = "USD".parse().unwrap();
/// let a = Money::new(Decimal::new(100, 0), usd.clone());
/// let b = Money::new(Decimal::new(40, 0), usd);
/// assert_eq!(a.try_sub(&b).unwrap().amount(), Decimal::new(60, 0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    pub fn try_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.same_currency(other)?;
        Ok(Money::new(self.amount + other.amount, self.currency.clone()))
    }

    pub fn try_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.same_currency(other)?;
        Ok(Money::new(self.amount - other.amount, self.currency.clone()))
    }

    pub fn is_less_than(&self, other: &Money) -> Result<bool, MoneyError> {
        self.same_currency(other)?;
        Ok(self.amount < other.amount)
    }

    fn same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                left: self.currency.clone(),
                right: other.currency.clone(),
            })
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// Parses `"<amount> <CUR>"`, e.g. `"100.50 USD"`.
impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (amount, currency) = s
            .trim()
            .split_once(' ')
            .ok_or_else(|| MoneyError::ParseError(s.to_string()))?;
        let amount = Decimal::from_str(amount.trim())
            .map_err(|e| MoneyError::ParseError(e.to_string()))?;
        Ok(Money::new(amount, currency.trim().parse()?))
    }
}

/// Credit limit with the part of it currently in use.
///
/// # Invariants
/// - `used` is never negative: topping up beyond the debt clamps to zero
/// - `max` and `used` share one currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    max: Money,
    used: Money,
}

impl Limit {
    /// A fresh limit with nothing used.
    pub fn initial(max: Money) -> Self {
        let used = Money::zero(max.currency().clone());
        Self { max, used }
    }

    /// A limit that starts with debt carried over from an earlier cycle.
    pub fn with_debt(max: Money, used: Money) -> Result<Self, MoneyError> {
        max.same_currency(&used)?;
        let used = if used.is_negative() {
            Money::zero(max.currency().clone())
        } else {
            used
        };
        Ok(Self { max, used })
    }

    pub fn max(&self) -> &Money {
        &self.max
    }

    pub fn used(&self) -> &Money {
        &self.used
    }

    pub fn currency(&self) -> &Currency {
        self.max.currency()
    }

    /// `max - used`
    pub fn available(&self) -> Money {
        Money::new(self.max.amount - self.used.amount, self.max.currency.clone())
    }

    /// Debit `amount` against this limit.
    pub fn use_amount(&self, amount: &Money) -> Result<Limit, MoneyError> {
        Ok(Self {
            max: self.max.clone(),
            used: self.used.try_add(amount)?,
        })
    }

    /// Credit `amount` back, flooring `used` at zero.
    pub fn top_up(&self, amount: &Money) -> Result<Limit, MoneyError> {
        let used = self.used.try_sub(amount)?;
        let used = if used.is_negative() {
            Money::zero(self.currency().clone())
        } else {
            used
        };
        Ok(Self {
            max: self.max.clone(),
            used,
        })
    }
}
