/// Normalizes a symbol to an uppercase USDT perpetual pair.
#[must_use]
pub fn normalize_symbol(symbol: &str) -> String {
    let upper = symbol.to_uppercase();
    if upper.ends_with("USDT") {
        upper
    } else {
        format!("{upper}USDT")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_usdt_suffix() {
        assert_eq!(normalize_symbol("btc"), "BTCUSDT");
    }

    #[test]
    fn keeps_existing_suffix() {
        assert_eq!(normalize_symbol("ETHUSDT"), "ETHUSDT");
        assert_eq!(normalize_symbol("ethusdt"), "ETHUSDT");
    }
}
