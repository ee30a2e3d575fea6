//! Display formatting for tool output.

/// `15000000` -> `"$15,000,000"`
pub fn usd(amount: u64) -> String {
    format!("${}", group_thousands(amount))
}

/// `15762500.4` -> `"$15,762,500"`
pub fn usd_rounded(amount: f64) -> String {
    usd(amount.round().max(0.0) as u64)
}

/// `100.0` -> `"$100.00"`
pub fn usd_cents(amount: f64) -> String {
    let cents = (amount * 100.0).round().max(0.0) as u64;
    format!("${}.{:02}", group_thousands(cents / 100), cents % 100)
}

/// `(25.0, 0)` -> `"25%"`, `(23.81, 1)` -> `"23.8%"`
pub fn percent(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}%")
}

/// `2.0` -> `"2.0x"`
pub fn ratio(value: f64) -> String {
    format!("{value:.1}x")
}

pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(15_000_000), "15,000,000");
    }

    #[test]
    fn formats_money_and_rates() {
        assert_eq!(usd(2_500_000), "$2,500,000");
        assert_eq!(usd_rounded(15_750_000.4), "$15,750,000");
        assert_eq!(usd_cents(83.333), "$83.33");
        assert_eq!(percent(25.0, 0), "25%");
        assert_eq!(percent(23.809, 1), "23.8%");
        assert_eq!(ratio(2.0), "2.0x");
    }
}
