//! Numeric classification and text form.

/// Modulus of the integer test applied to every number before it is written.
pub const INT_MODULUS: f64 = 2_147_483_648.0;

/// Returns true when `v` is written with the integer tags (`z` / `i`).
///
/// This is the legacy ecosystem's integer test, `ceil(v) == v % 2^31`, and not
/// a plain "is whole" check: `2^31` and `-2^31` fail it and go out as floats.
pub fn is_wire_int(v: f64) -> bool {
    v.ceil() == v % INT_MODULUS
}

/// Formats a finite float the way the receiving ecosystem's `Number#toString`
/// does: shortest round-trip digits, plain decimal notation while the decimal
/// exponent lies in `[-7, 21)`, exponential notation (`1e+21`, `1.5e-7`)
/// otherwise.
pub fn format_float(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }

    // `{:e}` yields the shortest digits that round-trip, as `d.ddde<exp>`.
    let sci = format!("{:e}", v.abs());
    let (mantissa, exp) = match sci.split_once('e') {
        Some(parts) => parts,
        None => (sci.as_str(), "0"),
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let n = exp + 1;

    let mut out = String::with_capacity(digits.len() + 8);
    if v < 0.0 {
        out.push('-');
    }

    if k <= n && n <= 21 {
        out.push_str(&digits);
        out.extend(std::iter::repeat_n('0', (n - k) as usize));
    } else if 0 < n && n <= 21 {
        let (int_part, frac_part) = digits.split_at(n as usize);
        out.push_str(int_part);
        out.push('.');
        out.push_str(frac_part);
    } else if -6 < n && n <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat_n('0', (-n) as usize));
        out.push_str(&digits);
    } else {
        let (lead, rest) = digits.split_at(1);
        out.push_str(lead);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        out.push('e');
        out.push(if n - 1 >= 0 { '+' } else { '-' });
        out.push_str(&(n - 1).abs().to_string());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_test_follows_modulus_rule() {
        assert!(is_wire_int(0.0));
        assert!(is_wire_int(-0.0));
        assert!(is_wire_int(-5.0));
        assert!(is_wire_int(2_147_483_647.0));
        assert!(is_wire_int(-2_147_483_647.0));

        assert!(!is_wire_int(2_147_483_648.0));
        assert!(!is_wire_int(-2_147_483_648.0));
        assert!(!is_wire_int(4_294_967_296.0));
        assert!(!is_wire_int(1.5));
        assert!(!is_wire_int(-0.5));
        assert!(!is_wire_int(f64::NAN));
        assert!(!is_wire_int(f64::INFINITY));
        assert!(!is_wire_int(f64::NEG_INFINITY));
    }

    #[test]
    fn plain_decimal_forms() {
        assert_eq!(format_float(1.5), "1.5");
        assert_eq!(format_float(-0.25), "-0.25");
        assert_eq!(format_float(0.1), "0.1");
        assert_eq!(format_float(123.456), "123.456");
        assert_eq!(format_float(2_147_483_648.0), "2147483648");
        assert_eq!(format_float(1_700_000_000_000.0), "1700000000000");
        assert_eq!(format_float(0.000001), "0.000001");
    }

    #[test]
    fn exponential_forms() {
        assert_eq!(format_float(1e21), "1e+21");
        assert_eq!(format_float(1.5e-7), "1.5e-7");
        assert_eq!(format_float(-2.5e30), "-2.5e+30");
        assert_eq!(format_float(1e-7), "1e-7");
        assert_eq!(format_float(f64::MAX), "1.7976931348623157e+308");
    }

    #[test]
    fn zero_has_no_sign() {
        assert_eq!(format_float(0.0), "0");
        assert_eq!(format_float(-0.0), "0");
    }

    #[test]
    fn formatted_text_round_trips() {
        for v in [0.1, 1.0 / 3.0, 6.02214076e23, 5e-324, 9007199254740993.0] {
            let text = format_float(v);
            assert_eq!(text.parse::<f64>().unwrap(), v, "{text}");
        }
    }
}
