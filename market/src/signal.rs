use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// Change (in percent) beyond which an asset leaves the neutral band.
pub const DEFAULT_SIGNAL_THRESHOLD: f64 = 2.0;

/// Trading recommendation derived from the 24h change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    /// Dropped harder than the threshold.
    BuyTheDip,
    /// Rallied harder than the threshold.
    TakeProfit,
    Neutral,
}

impl Signal {
    /// Presentation color paired with the signal.
    pub const fn color(self) -> &'static str {
        match self {
            Signal::BuyTheDip => "#16c784",
            Signal::TakeProfit => "#ea3943",
            Signal::Neutral => "#8a919e",
        }
    }
}

/// Symmetric threshold policy: `change < -t` buys the dip, `change > t` takes
/// profit, anything else (including a missing change) is neutral.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SignalPolicy {
    threshold: f64,
}

impl SignalPolicy {
    pub fn new(threshold: f64) -> Result<Self, PolicyError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(PolicyError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn classify(&self, change_24h: Option<f64>) -> Signal {
        match change_24h {
            Some(c) if c.is_finite() && c < -self.threshold => Signal::BuyTheDip,
            Some(c) if c.is_finite() && c > self.threshold => Signal::TakeProfit,
            _ => Signal::Neutral,
        }
    }
}

impl Default for SignalPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIGNAL_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_strict() {
        let p = SignalPolicy::default();

        assert_eq!(p.classify(Some(-2.0)), Signal::Neutral);
        assert_eq!(p.classify(Some(2.0)), Signal::Neutral);
        assert_eq!(p.classify(Some(-2.01)), Signal::BuyTheDip);
        assert_eq!(p.classify(Some(2.01)), Signal::TakeProfit);
    }

    #[test]
    fn missing_or_nan_change_is_neutral() {
        let p = SignalPolicy::default();

        assert_eq!(p.classify(None), Signal::Neutral);
        assert_eq!(p.classify(Some(f64::NAN)), Signal::Neutral);
        assert_eq!(p.classify(Some(f64::NEG_INFINITY)), Signal::Neutral);
    }

    #[test]
    fn custom_threshold_widens_neutral_band() {
        let p = SignalPolicy::new(2.5).unwrap();

        assert_eq!(p.classify(Some(-2.4)), Signal::Neutral);
        assert_eq!(p.classify(Some(-2.6)), Signal::BuyTheDip);
        assert_eq!(p.classify(Some(2.6)), Signal::TakeProfit);
    }

    #[test]
    fn rejects_negative_or_non_finite_threshold() {
        assert!(matches!(
            SignalPolicy::new(-1.0),
            Err(PolicyError::InvalidThreshold(_))
        ));
        assert!(SignalPolicy::new(f64::NAN).is_err());
        assert!(SignalPolicy::new(f64::INFINITY).is_err());
    }

    #[test]
    fn each_signal_has_a_distinct_color() {
        let colors = [
            Signal::BuyTheDip.color(),
            Signal::TakeProfit.color(),
            Signal::Neutral.color(),
        ];
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert_ne!(colors[0], colors[2]);
    }

    #[test]
    fn serializes_in_screaming_snake_case() {
        let json = serde_json::to_string(&Signal::BuyTheDip).unwrap();
        assert_eq!(json, "\"BUY_THE_DIP\"");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn classification_is_mirror_symmetric(change in -100.0f64..100.0, t in 0.0f64..10.0) {
            let p = SignalPolicy::new(t).unwrap();

            let mirrored = match p.classify(Some(change)) {
                Signal::BuyTheDip => Signal::TakeProfit,
                Signal::TakeProfit => Signal::BuyTheDip,
                Signal::Neutral => Signal::Neutral,
            };
            prop_assert_eq!(p.classify(Some(-change)), mirrored);
        }

        #[test]
        fn inside_the_band_is_neutral(t in 0.0f64..10.0, frac in -1.0f64..=1.0) {
            let p = SignalPolicy::new(t).unwrap();
            prop_assert_eq!(p.classify(Some(t * frac)), Signal::Neutral);
        }
    }
}
