//! Number rendering shared by previews, prompts and answers.

/// Renders a number for answers: integral values without decimals, others
/// with two; both with `,` thousands separators.
pub fn fmt_number(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    let integral = n.fract() == 0.0 && n.abs() < 1e15;
    let raw = if integral {
        format!("{n:.0}")
    } else {
        format!("{n:.2}")
    };

    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_integers_and_fractions() {
        assert_eq!(fmt_number(150.0), "150");
        assert_eq!(fmt_number(1234567.0), "1,234,567");
        assert_eq!(fmt_number(-1234.5), "-1,234.50");
        assert_eq!(fmt_number(1.236), "1.24");
    }
}
