//! Evaluation context.

use bigdecimal::RoundingMode;
use chrono_tz::Tz;

use core::num::NonZeroU64;

use crate::{arith::DecimalArithmetic, error::ConfigError};

/// Settings influencing evaluation: decimal precision and rounding, and the time zone
/// used by date-time functions.
///
/// The context is immutable during an evaluation; an [`Expression`](crate::Expression)
/// captures the engine context when compiled, which can be overridden per evaluation.
///
/// # Examples
///
/// ```
/// # use core::num::NonZeroU64;
/// use formula_eval::EvaluationContext;
///
/// let context = EvaluationContext::default()
///     .with_precision(NonZeroU64::new(10).unwrap())
///     .with_zone_id("Europe/Berlin")?;
/// assert_eq!(context.arithmetic().precision().get(), 10);
/// assert_eq!(context.zone().name(), "Europe/Berlin");
///
/// let err = EvaluationContext::default().with_zone_id("Mars/Olympus").unwrap_err();
/// assert_eq!(err.to_string(), "Unknown time zone 'Mars/Olympus'");
/// # Ok::<_, formula_eval::ConfigError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationContext {
    arithmetic: DecimalArithmetic,
    zone: Tz,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self {
            arithmetic: DecimalArithmetic::default(),
            zone: Tz::UTC,
        }
    }
}

impl EvaluationContext {
    /// Returns the arithmetic used for numbers.
    pub fn arithmetic(&self) -> &DecimalArithmetic {
        &self.arithmetic
    }

    /// Returns the time zone.
    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Sets the number of significant digits kept in arithmetic results.
    #[must_use]
    pub fn with_precision(mut self, precision: NonZeroU64) -> Self {
        self.arithmetic = DecimalArithmetic::new(precision, self.arithmetic.rounding());
        self
    }

    /// Sets the rounding mode for arithmetic results.
    #[must_use]
    pub fn with_rounding(mut self, rounding: RoundingMode) -> Self {
        self.arithmetic = DecimalArithmetic::new(self.arithmetic.precision(), rounding);
        self
    }

    /// Sets the time zone.
    #[must_use]
    pub fn with_zone(mut self, zone: Tz) -> Self {
        self.zone = zone;
        self
    }

    /// Sets the time zone by its IANA ID, such as `Europe/Berlin`.
    ///
    /// # Errors
    ///
    /// Returns an error if the zone ID is unknown.
    pub fn with_zone_id(self, zone_id: &str) -> Result<Self, ConfigError> {
        let zone = zone_id
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownZone(zone_id.to_owned()))?;
        Ok(self.with_zone(zone))
    }
}
