//! Media dimension and duration normalization.

/// Durations above this are taken to be milliseconds.
pub const MAX_DURATION_SECONDS: i64 = 600;

/// Reduce width and height to a "W:H" ratio. Empty when either side is zero.
pub fn aspect_ratio(width: Option<i64>, height: Option<i64>) -> String {
    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => {
            let d = gcd(w, h);
            format!("{}:{}", w / d, h / d)
        }
        _ => String::new(),
    }
}

fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Duration in seconds; values above 600 are treated as milliseconds.
pub fn normalize_duration(raw: Option<i64>) -> Option<i64> {
    raw.filter(|d| *d >= 0).map(|d| {
        if d > MAX_DURATION_SECONDS {
            d / 1000
        } else {
            d
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio() {
        assert_eq!(aspect_ratio(Some(1920), Some(1080)), "16:9");
        assert_eq!(aspect_ratio(Some(1080), Some(1920)), "9:16");
        assert_eq!(aspect_ratio(Some(720), Some(720)), "1:1");
        assert_eq!(aspect_ratio(Some(0), Some(1080)), "");
        assert_eq!(aspect_ratio(Some(1920), Some(0)), "");
        assert_eq!(aspect_ratio(None, Some(1080)), "");
    }

    #[test]
    fn test_normalize_duration() {
        assert_eq!(normalize_duration(Some(15)), Some(15));
        assert_eq!(normalize_duration(Some(600)), Some(600));
        assert_eq!(normalize_duration(Some(15000)), Some(15));
        assert_eq!(normalize_duration(Some(601)), Some(0));
        assert_eq!(normalize_duration(Some(-3)), None);
        assert_eq!(normalize_duration(None), None);
    }
}
