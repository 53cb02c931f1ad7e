// Behavior of the Number abstraction: promotion, comparison, formatting.

use tinybasic::number::Number;

#[test]
fn integer_arithmetic_keeps_the_integer_tag() {
    assert!((Number::Int(2) + Number::Int(3)).is_integral());
    assert!((Number::Int(2) - Number::Int(3)).is_integral());
    assert!((Number::Int(2) * Number::Int(3)).is_integral());
    assert_eq!(Number::Int(2) + Number::Int(3), Number::Int(5));
}

#[test]
fn mixed_arithmetic_demotes_to_float() {
    assert!(!(Number::Int(2) + Number::Float(0.5)).is_integral());
    assert!(!(Number::Float(1.0) * Number::Int(3)).is_integral());
}

#[test]
fn unary_minus_preserves_the_tag() {
    assert!((-Number::Int(5)).is_integral());
    assert!(!(-Number::Float(5.0)).is_integral());
    assert_eq!(-Number::Int(5), Number::Int(-5));
}

#[test]
fn division_is_integral_only_when_exact() {
    let exact = Number::Int(6).divide(Number::Int(3)).unwrap();
    assert!(exact.is_integral());
    assert_eq!(exact, Number::Int(2));

    let inexact = Number::Int(1).divide(Number::Int(2)).unwrap();
    assert!(!inexact.is_integral());
    assert_eq!(inexact, Number::Float(0.5));
}

#[test]
fn division_by_zero_fails() {
    assert!(Number::Int(1).divide(Number::Int(0)).is_err());
    assert!(Number::Float(1.0).divide(Number::Float(0.0)).is_err());
}

#[test]
fn division_by_a_float_with_zero_integer_part_fails() {
    // The divisor check looks at the truncated value, so 0.5 counts as zero.
    assert!(Number::Int(1).divide(Number::Float(0.5)).is_err());
}

#[test]
fn modulo_requires_integers() {
    assert_eq!(
        Number::Int(7).modulo(Number::Int(3)).unwrap(),
        Number::Int(1)
    );
    assert!(Number::Float(7.0).modulo(Number::Int(3)).is_err());
    assert!(Number::Int(7).modulo(Number::Float(3.0)).is_err());
    assert!(Number::Int(7).modulo(Number::Int(0)).is_err());
}

#[test]
fn integer_equality_is_exact() {
    assert_eq!(Number::Int(3), Number::Int(3));
    assert_ne!(Number::Int(3), Number::Int(4));
}

#[test]
fn float_equality_uses_an_epsilon() {
    assert_eq!(Number::Int(3), Number::Float(3.0));
    assert_eq!(Number::Float(1.0), Number::Float(1.0 + f64::EPSILON / 4.0));
    assert_ne!(Number::Float(1.0), Number::Float(1.1));
}

#[test]
fn ordering_covers_both_tags() {
    assert!(Number::Int(1) < Number::Int(2));
    assert!(Number::Float(1.5) < Number::Int(2));
    assert!(Number::Int(2) >= Number::Float(2.0));
    assert!(Number::Int(3) > Number::Float(2.5));
}

#[test]
fn truthiness_follows_magnitude() {
    assert!(Number::Int(1).is_true());
    assert!(Number::Int(-1).is_true());
    assert!(!Number::Int(0).is_true());
    assert!(Number::Float(0.1).is_true());
    assert!(!Number::Float(0.0).is_true());
    // Below the epsilon threshold counts as false.
    assert!(!Number::Float(1e-20).is_true());
}

#[test]
fn integers_format_without_a_decimal_point() {
    assert_eq!(Number::Int(3).to_string(), "3");
    assert_eq!(Number::Int(-17).to_string(), "-17");
}

#[test]
fn floats_format_with_a_decimal_point() {
    assert_eq!(Number::Float(3.0).to_string(), "3.0");
    assert_eq!(Number::Float(0.5).to_string(), "0.5");
    assert_eq!(Number::Float(-2.25).to_string(), "-2.25");
}

#[test]
fn formatted_numbers_parse_back_to_equal_values() {
    for value in [
        Number::Int(0),
        Number::Int(42),
        Number::Int(-7),
        Number::Float(0.5),
        Number::Float(3.0),
        Number::Float(-123.375),
    ] {
        let text = value.to_string();
        let reparsed = if text.contains('.') {
            Number::Float(text.parse().unwrap())
        } else {
            Number::Int(text.parse().unwrap())
        };
        assert_eq!(value, reparsed, "{} did not round-trip", text);
    }
}
