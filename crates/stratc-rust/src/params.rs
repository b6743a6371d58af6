//! Parameter literal rendering, shared by the module and test generators
//! so a parameter can never carry two different types across artifacts.

use stratc_core::meta::ParamValue;

/// Returns the Rust `(type, literal)` pair for one parameter constant.
pub fn param_to_rust(value: &ParamValue) -> (String, String) {
    match value {
        ParamValue::Decimal(d) => ("Decimal".to_string(), format!("dec!({d})")),
        ParamValue::Bool(b) => ("bool".to_string(), b.to_string()),
        ParamValue::Int(i) => ("i64".to_string(), i.to_string()),
        ParamValue::Float(f) => ("f64".to_string(), float_literal(*f)),
        ParamValue::Str(s) => ("&str".to_string(), format!("\"{s}\"")),
        ParamValue::List(items) => list_param(items),
    }
}

/// Slice parameters take their element type from the first entry, like the
/// decorator does at runtime. An empty list defaults to a string slice.
fn list_param(items: &[ParamValue]) -> (String, String) {
    let Some(first) = items.first() else {
        return ("&[&str]".to_string(), "&[]".to_string());
    };
    let (element_type, rendered): (&str, Vec<String>) = match first {
        ParamValue::Decimal(_) => (
            "&[Decimal]",
            items
                .iter()
                .map(|item| format!("dec!({})", plain_literal(item)))
                .collect(),
        ),
        ParamValue::Int(_) => ("&[i64]", items.iter().map(plain_literal).collect()),
        ParamValue::Float(_) => ("&[f64]", items.iter().map(plain_literal).collect()),
        _ => (
            "&[&str]",
            items
                .iter()
                .map(|item| format!("\"{}\"", plain_literal(item)))
                .collect(),
        ),
    };
    (
        element_type.to_string(),
        format!("&[{}]", rendered.join(", ")),
    )
}

/// Bare numeric text, used inside `dec!(...)` and fixture tuples.
pub fn plain_literal(value: &ParamValue) -> String {
    match value {
        ParamValue::Decimal(d) => d.to_string(),
        ParamValue::Bool(b) => b.to_string(),
        ParamValue::Int(i) => i.to_string(),
        ParamValue::Float(f) => float_literal(*f),
        ParamValue::Str(s) => s.clone(),
        ParamValue::List(_) => String::new(),
    }
}

/// Whole floats print as `24` in Rust's default formatting, which is an
/// integer literal. Re-attach the fractional point.
pub fn float_literal(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') || text.contains('e') || text.contains("inf") || text.contains("NaN") {
        text
    } else {
        format!("{text}.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    #[test]
    fn test_decimal_keeps_written_scale() {
        let value = ParamValue::Decimal(Decimal::from_str_exact("0.20").unwrap());
        assert_eq!(
            param_to_rust(&value),
            ("Decimal".to_string(), "dec!(0.20)".to_string())
        );
    }

    #[test]
    fn test_whole_float_gets_a_point() {
        assert_eq!(float_literal(24.0), "24.0");
        assert_eq!(float_literal(0.001), "0.001");
        assert_eq!(
            param_to_rust(&ParamValue::Float(48.0)),
            ("f64".to_string(), "48.0".to_string())
        );
    }

    #[test]
    fn test_scalar_params() {
        assert_eq!(
            param_to_rust(&ParamValue::Int(10)),
            ("i64".to_string(), "10".to_string())
        );
        assert_eq!(
            param_to_rust(&ParamValue::Bool(true)),
            ("bool".to_string(), "true".to_string())
        );
        assert_eq!(
            param_to_rust(&ParamValue::Str("123456".to_string())),
            ("&str".to_string(), "\"123456\"".to_string())
        );
    }

    #[test]
    fn test_list_params() {
        assert_eq!(
            param_to_rust(&ParamValue::List(vec![])),
            ("&[&str]".to_string(), "&[]".to_string())
        );
        assert_eq!(
            param_to_rust(&ParamValue::List(vec![
                ParamValue::Str("a".to_string()),
                ParamValue::Str("b".to_string()),
            ])),
            ("&[&str]".to_string(), "&[\"a\", \"b\"]".to_string())
        );
        assert_eq!(
            param_to_rust(&ParamValue::List(vec![
                ParamValue::Decimal(Decimal::from_str_exact("0.1").unwrap()),
                ParamValue::Decimal(Decimal::from_str_exact("0.2").unwrap()),
            ])),
            (
                "&[Decimal]".to_string(),
                "&[dec!(0.1), dec!(0.2)]".to_string()
            )
        );
    }
}
