/// Quote currency stripped from pair-style tickers by default.
pub const DEFAULT_QUOTE_SUFFIX: &str = "USDT";

/// Separators that may sit between base and quote (`BTC-USDT`, `BTC/USDT`).
const PAIR_SEPARATORS: [char; 4] = ['/', '-', '_', ':'];

/// Turns upstream tickers into the short uppercase form readers see.
///
/// `normalize` is idempotent: feeding its output back in returns it unchanged.
/// A symbol made only of the quote currency (e.g. `USDT`) is kept as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolNormalizer {
    quote_suffix: Option<String>,
}

impl SymbolNormalizer {
    /// An empty or blank suffix disables stripping.
    pub fn new(quote_suffix: &str) -> Self {
        let suffix = quote_suffix.trim().to_uppercase();
        Self {
            quote_suffix: (!suffix.is_empty()).then_some(suffix),
        }
    }

    pub fn quote_suffix(&self) -> Option<&str> {
        self.quote_suffix.as_deref()
    }

    pub fn normalize(&self, raw: &str) -> String {
        let mut symbol = raw.trim().to_uppercase();

        let Some(suffix) = self.quote_suffix.as_deref() else {
            return symbol;
        };

        // Repeat so that `BTCUSDTUSDT` lands where `BTCUSDT` does.
        while let Some(base) = symbol.strip_suffix(suffix) {
            let base =
                base.trim_end_matches(|c: char| c.is_whitespace() || PAIR_SEPARATORS.contains(&c));
            if base.is_empty() {
                break;
            }
            symbol = base.to_string();
        }

        symbol
    }
}

impl Default for SymbolNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTE_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_configured_suffix() {
        let n = SymbolNormalizer::default();
        assert_eq!(n.normalize("BTCUSDT"), "BTC");
        assert_eq!(n.normalize("btcusdt"), "BTC");
        assert_eq!(n.normalize(" eth-usdt "), "ETH");
        assert_eq!(n.normalize("SOL/USDT"), "SOL");
    }

    #[test]
    fn plain_symbol_is_untouched() {
        let n = SymbolNormalizer::default();
        assert_eq!(n.normalize("BTC"), "BTC");
        assert_eq!(n.normalize(&n.normalize("BTC")), "BTC");
    }

    #[test]
    fn bare_quote_currency_is_kept() {
        let n = SymbolNormalizer::default();
        assert_eq!(n.normalize("usdt"), "USDT");
        assert_eq!(n.normalize("USDTUSDT"), "USDT");
    }

    #[test]
    fn empty_suffix_disables_stripping() {
        let n = SymbolNormalizer::new("  ");
        assert_eq!(n.quote_suffix(), None);
        assert_eq!(n.normalize("btcusdt"), "BTCUSDT");
    }

    #[test]
    fn non_ascii_tickers_are_uppercased() {
        let n = SymbolNormalizer::default();
        assert_eq!(n.normalize("ñusdt"), "Ñ");
        assert_eq!(n.normalize("éth/usdt"), "ÉTH");
        assert_eq!(SymbolNormalizer::new("ñ").normalize("btcÑ"), "BTC");
    }

    #[test]
    fn suffix_is_matched_case_insensitively() {
        let n = SymbolNormalizer::new("usdc");
        assert_eq!(n.normalize("ethUSDC"), "ETH");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]
        #[test]
        fn normalize_is_idempotent(raw in "[ a-zA-Z0-9/_:-]{0,16}", suffix in "[a-zA-Z]{0,5}") {
            let n = SymbolNormalizer::new(&suffix);

            let once = n.normalize(&raw);
            let twice = n.normalize(&once);

            prop_assert_eq!(once, twice, "raw={:?} suffix={:?}", raw, suffix);
        }

        #[test]
        fn normalized_symbol_is_uppercase(raw in "[a-zà-öø-þ0-9]{1,8}(usdt)?") {
            let out = SymbolNormalizer::default().normalize(&raw);
            prop_assert_eq!(out.clone(), out.to_uppercase());
            prop_assert!(!out.is_empty());
        }
    }
}
