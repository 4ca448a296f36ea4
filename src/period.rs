use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Unparseable period labels map here, so they always sort before real dates.
pub const EPOCH_FALLBACK: (i32, u32, u32) = (1900, 1, 1);

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(19|20)\d{2}").unwrap());

pub fn epoch_fallback_date() -> NaiveDate {
    let (y, m, d) = EPOCH_FALLBACK;
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn year_end(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 12, 31)
}

/// Parse a period column label ('2021-12-31', 'FY2023', '2021', ...) into a
/// date used purely for chronological ordering. Falls back to 1900-01-01.
pub fn parse_period_label(label: &str) -> NaiveDate {
    let trimmed = label.trim();

    if let (Some(prefix), Some(rest)) = (trimmed.get(..2), trimmed.get(2..)) {
        if prefix.eq_ignore_ascii_case("fy") && !rest.is_empty() {
            if let Ok(year) = rest.trim().parse::<i32>() {
                if let Some(date) = year_end(year) {
                    return date;
                }
            }
        }
    }

    for pattern in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, pattern) {
            return date;
        }
    }

    // "YYYY-MM" resolves to the first day of that month
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d") {
        return date;
    }

    if let Ok(year) = trimmed.parse::<i32>() {
        if let Some(date) = year_end(year) {
            return date;
        }
    }

    // Last resort: any plausible 4-digit year embedded in the label
    if let Some(m) = YEAR_RE.find(trimmed) {
        if let Ok(year) = m.as_str().parse::<i32>() {
            if let Some(date) = year_end(year) {
                return date;
            }
        }
    }

    log::debug!(
        "parse_period_label: could not parse '{}' -> fallback=1900-01-01",
        label
    );
    epoch_fallback_date()
}

/// Total order over period labels: parsed date first, original label as the
/// tie-break so sorting is stable and deterministic.
pub fn period_sort_key(label: &str) -> (NaiveDate, String) {
    (parse_period_label(label), label.to_string())
}

/// Sort period labels chronologically in place.
pub fn sort_periods(labels: &mut [String]) {
    labels.sort_by_key(|l| period_sort_key(l));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fy_label() {
        assert_eq!(
            parse_period_label("FY2023"),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        );
        assert_eq!(
            parse_period_label("fy2019"),
            NaiveDate::from_ymd_opt(2019, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_exact_date_patterns() {
        assert_eq!(
            parse_period_label("2021-12-31"),
            NaiveDate::from_ymd_opt(2021, 12, 31).unwrap()
        );
        assert_eq!(
            parse_period_label("2021/06/30"),
            NaiveDate::from_ymd_opt(2021, 6, 30).unwrap()
        );
        assert_eq!(
            parse_period_label("2021-06"),
            NaiveDate::from_ymd_opt(2021, 6, 1).unwrap()
        );
        assert_eq!(
            parse_period_label("2021"),
            NaiveDate::from_ymd_opt(2021, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_loose_year_extraction() {
        assert_eq!(
            parse_period_label("Q3 2022 (restated)"),
            NaiveDate::from_ymd_opt(2022, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_fallback_sorts_first() {
        let fallback = parse_period_label("NotADate");
        assert_eq!(fallback, epoch_fallback_date());
        assert!(fallback < parse_period_label("1999"));
        assert!(fallback < parse_period_label("FY2023"));
    }

    #[test]
    fn test_sort_periods_chronological() {
        let mut labels = vec![
            "FY2023".to_string(),
            "2021-12-31".to_string(),
            "NotADate".to_string(),
            "2022-Q2".to_string(),
        ];
        sort_periods(&mut labels);
        assert_eq!(labels[0], "NotADate");
        assert_eq!(labels[1], "2021-12-31");
        assert_eq!(labels[2], "2022-Q2");
        assert_eq!(labels[3], "FY2023");
    }

    #[test]
    fn test_tie_break_is_label_order() {
        let mut labels = vec!["FY2022".to_string(), "2022".to_string()];
        sort_periods(&mut labels);
        assert_eq!(labels, vec!["2022".to_string(), "FY2022".to_string()]);
    }
}
