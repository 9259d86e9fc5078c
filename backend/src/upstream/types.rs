use market::RawAssetRecord;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One entry of CoinGecko's `/coins/markets` response.
///
/// Fields are decoded leniently: a null, missing, or oddly typed value becomes
/// `None` instead of failing the whole array.
#[derive(Debug, Deserialize)]
pub struct CoinMarket {
    #[serde(default, deserialize_with = "lenient_string")]
    pub symbol: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub current_price: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_change_percentage_24h: Option<f64>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub image: Option<String>,
}

impl From<CoinMarket> for RawAssetRecord {
    fn from(m: CoinMarket) -> Self {
        RawAssetRecord {
            symbol: m.symbol.unwrap_or_default(),
            name: m.name,
            price: m.current_price,
            change_24h: m.price_change_percentage_24h,
            icon: m.image,
        }
    }
}

fn lenient_f64<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_market_entry() {
        let body = r#"[{
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "image": "https://assets.test/btc.png",
            "current_price": 64123.5,
            "market_cap": 1260000000000,
            "price_change_percentage_24h": -2.71
        }]"#;

        let parsed: Vec<CoinMarket> = serde_json::from_str(body).unwrap();
        let raw = RawAssetRecord::from(parsed.into_iter().next().unwrap());

        assert_eq!(raw.symbol, "btc");
        assert_eq!(raw.name.as_deref(), Some("Bitcoin"));
        assert_eq!(raw.price, Some(64123.5));
        assert_eq!(raw.change_24h, Some(-2.71));
        assert_eq!(raw.icon.as_deref(), Some("https://assets.test/btc.png"));
    }

    #[test]
    fn odd_fields_do_not_fail_the_array() {
        let body = r#"[
            {"symbol": "eth", "current_price": "3100.25", "price_change_percentage_24h": null},
            {"symbol": null, "current_price": 1.0, "price_change_percentage_24h": "n/a"},
            {"symbol": "sol", "current_price": 140.0, "image": 42}
        ]"#;

        let parsed: Vec<CoinMarket> = serde_json::from_str(body).unwrap();

        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].current_price, Some(3100.25));
        assert_eq!(parsed[0].price_change_percentage_24h, None);
        assert_eq!(parsed[1].symbol, None);
        assert_eq!(parsed[1].price_change_percentage_24h, None);
        assert_eq!(parsed[2].image, None);
    }
}
