//! Display formatting for answers and reports.
//!
//! Numbers follow the conventions the storefront operators are used to:
//! currency as `R$ 1,234.56`, percentages and day counts with one decimal,
//! review scores with two, dates as `dd/mm/YYYY`.

use chrono::{Datelike, NaiveDate, Weekday};

/// Portuguese month names, index 0 = janeiro.
pub const MONTH_NAMES: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Group an unsigned integer with comma thousands separators.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format a monetary amount as `R$ 1,234.56`.
pub fn currency(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let cents = (value.abs() * 100.0).round() as u64;
    format!("{}R$ {}.{:02}", sign, thousands(cents / 100), cents % 100)
}

/// Format a ratio as a percentage with one decimal, e.g. `7.5%`.
pub fn percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Format a percentage delta with an explicit sign, e.g. `+12.3%`.
pub fn signed_percent(value: f64) -> String {
    format!("{:+.1}%", value)
}

/// Format a day count with one decimal, e.g. `12.3 dias`.
pub fn days(value: f64) -> String {
    format!("{:.1} dias", value)
}

/// Format a review score with two decimals.
pub fn score(value: f64) -> String {
    format!("{:.2}", value)
}

/// Format a date as `dd/mm/YYYY`.
pub fn date_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Format a date as `dd/mm/yy` (compact form used in summary headers).
pub fn date_br_short(date: NaiveDate) -> String {
    date.format("%d/%m/%y").to_string()
}

/// Portuguese display name for a weekday.
pub fn weekday_pt(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Segunda-feira",
        Weekday::Tue => "Terça-feira",
        Weekday::Wed => "Quarta-feira",
        Weekday::Thu => "Quinta-feira",
        Weekday::Fri => "Sexta-feira",
        Weekday::Sat => "Sábado",
        Weekday::Sun => "Domingo",
    }
}

/// Portuguese month name for a 1-based month number.
pub fn month_name_pt(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)? as usize).copied()
}

/// `YYYY-MM` key for a date, the grouping key for monthly series.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Turn a raw category slug into a display name:
/// `bed_bath_table` becomes `Bed Bath Table`.
pub fn category_display(raw: &str) -> String {
    raw.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_groups_from_the_right() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(5), "5");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(98765), "98,765");
        assert_eq!(thousands(1234567), "1,234,567");
    }

    #[test]
    fn currency_uses_two_decimals_and_separators() {
        assert_eq!(currency(0.0), "R$ 0.00");
        assert_eq!(currency(154.1), "R$ 154.10");
        assert_eq!(currency(1234.56), "R$ 1,234.56");
        assert_eq!(currency(115264.912), "R$ 115,264.91");
        assert_eq!(currency(-42.5), "-R$ 42.50");
    }

    #[test]
    fn percent_variants() {
        assert_eq!(percent(7.54), "7.5%");
        assert_eq!(signed_percent(12.34), "+12.3%");
        assert_eq!(signed_percent(-3.06), "-3.1%");
        assert_eq!(signed_percent(0.0), "+0.0%");
    }

    #[test]
    fn day_and_score_formats() {
        assert_eq!(days(12.31), "12.3 dias");
        assert_eq!(score(4.1), "4.10");
    }

    #[test]
    fn date_formats() {
        let d = NaiveDate::from_ymd_opt(2018, 5, 1).unwrap();
        assert_eq!(date_br(d), "01/05/2018");
        assert_eq!(date_br_short(d), "01/05/18");
        assert_eq!(month_key(d), "2018-05");
    }

    #[test]
    fn weekday_and_month_names() {
        assert_eq!(weekday_pt(Weekday::Mon), "Segunda-feira");
        assert_eq!(weekday_pt(Weekday::Sun), "Domingo");
        assert_eq!(month_name_pt(1), Some("janeiro"));
        assert_eq!(month_name_pt(12), Some("dezembro"));
        assert_eq!(month_name_pt(0), None);
        assert_eq!(month_name_pt(13), None);
    }

    #[test]
    fn category_display_title_cases_slugs() {
        assert_eq!(category_display("bed_bath_table"), "Bed Bath Table");
        assert_eq!(category_display("health_beauty"), "Health Beauty");
        assert_eq!(category_display("toys"), "Toys");
        assert_eq!(category_display("PC_gamer"), "Pc Gamer");
    }
}
