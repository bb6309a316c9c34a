use chrono::NaiveDate;

/// Currency prefix for money amounts.
const CURRENCY: &str = "S/";

/// Format a phone number for display
/// Mobile numbers (9 digits) become `987 654 321`, Lima landlines
/// (`01` + 7 digits) become `(01) 444-5566`.
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        9 if digits.starts_with('9') => format!(
            "{} {} {}",
            &digits[0..3],
            &digits[3..6],
            &digits[6..9]
        ),
        9 if digits.starts_with("01") => format!("(01) {}-{}", &digits[2..5], &digits[5..9]),
        11 if digits.starts_with("51") => format_phone(&digits[2..]),
        _ => phone.to_string(), // Return original if can't format
    }
}

/// Truncate a string to a maximum number of characters, adding "..." if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None or blank
pub fn format_optional(value: Option<&str>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Format an amount in cents as `S/ 1,234.50`.
pub fn format_money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let units = (abs / 100).to_string();
    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, c) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}{} {}.{:02}", sign, CURRENCY, grouped, abs % 100)
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// `dd/mm/yyyy`, or "-" when missing.
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Case-insensitive substring match for search filters
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Case-insensitive ordering for sorting names
pub fn cmp_ignore_case(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("987654321"), "987 654 321");
        assert_eq!(format_phone("+51 987 654 321"), "987 654 321");
        assert_eq!(format_phone("014445566"), "(01) 444-5566");
        assert_eq!(format_phone("123"), "123"); // Too short, return as-is
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hola", 10), "Hola");
        assert_eq!(truncate("Campamento de verano", 10), "Campame...");
        assert_eq!(truncate("Año", 3), "Año");
        assert_eq!(truncate("Niñez", 2), "Ni");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0), "S/ 0.00");
        assert_eq!(format_money(5997), "S/ 59.97");
        assert_eq!(format_money(123_456_789), "S/ 1,234,567.89");
        assert_eq!(format_money(-15_000), "-S/ 150.00");
    }

    #[test]
    fn test_format_optional_and_date() {
        assert_eq!(format_optional(Some("  "), "-"), "-");
        assert_eq!(format_optional(Some("Lima"), "-"), "Lima");
        assert_eq!(format_date(NaiveDate::from_ymd_opt(2024, 1, 9)), "09/01/2024");
        assert_eq!(format_date(None), "-");
    }

    #[test]
    fn test_search_helpers() {
        assert!(contains_ignore_case("Rojas Díaz", "rojas"));
        assert_eq!(cmp_ignore_case("ana", "Beto"), std::cmp::Ordering::Less);
    }
}
