use crate::{
    error::InternalError,
    format::{
        FORMAT_RULES, FormatOutput, FormatRule, OptionFormatter, OptionKey, ValueLabelMap,
        format_option, label_of,
    },
    value::{Date, Record, Value, ValueEnum},
};

fn status_map() -> ValueLabelMap {
    [(1, "Active"), (0, "Inactive")].into_iter().collect()
}

#[test]
fn rule_order_is_frozen() {
    assert_eq!(
        FORMAT_RULES,
        [
            FormatRule::Callback,
            FormatRule::Temporal,
            FormatRule::Tagged,
            FormatRule::Mapped,
            FormatRule::Boolean,
            FormatRule::Identity,
        ]
    );
}

#[test]
fn boolean_without_map_or_formatter() {
    let entry = format_option(&Value::Bool(true), None, None).expect("format");

    assert_eq!(entry.key, OptionKey::Int(1));
    assert_eq!(entry.label, Value::from("True"));
}

#[test]
fn map_labels_plain_scalars() {
    let map = status_map();
    let entry = format_option(&Value::Int(1), Some(&map), None).expect("format");

    assert_eq!(entry.key, OptionKey::Int(1));
    assert_eq!(entry.label, Value::from("Active"));
}

#[test]
fn map_beats_boolean_normalization() {
    let map = status_map();
    let entry = format_option(&Value::Bool(false), Some(&map), None).expect("format");

    assert_eq!(entry.label, Value::from("Inactive"));
}

#[test]
fn map_never_matches_composites() {
    let map: ValueLabelMap = [(r#"{"id":1}"#, "One")].into_iter().collect();
    let record = Value::Record(Record::new().with("id", 1));

    let entry = format_option(&record, Some(&map), None).expect("format");

    assert_eq!(entry.label, record);
}

#[test]
fn temporal_values_key_iso_and_label_display() {
    let date = Date::new_checked(2024, 3, 5).expect("date");
    let entry = format_option(&Value::Date(date), None, None).expect("format");

    assert_eq!(entry.key, OptionKey::Text("2024-03-05".into()));
    assert_eq!(entry.label, Value::from("05/03/2024"));
}

#[test]
fn tagged_values_use_tag_and_display_label() {
    let value = Value::Enum(ValueEnum::new("pending", "Pending review"));
    let map: ValueLabelMap = [("pending", "ignored")].into_iter().collect();

    let entry = format_option(&value, Some(&map), None).expect("format");

    assert_eq!(entry.key, OptionKey::Text("pending".into()));
    assert_eq!(entry.label, Value::from("Pending review"));
}

#[test]
fn formatter_beats_every_builtin_rule() {
    let formatter = OptionFormatter::from_fn(|value| match value {
        Value::Bool(b) => Some(FormatOutput::pair(u64::from(*b), "custom")),
        _ => None,
    });
    let map = status_map();

    let entry = format_option(&Value::Bool(true), Some(&map), Some(&formatter)).expect("format");

    assert_eq!(entry.key, OptionKey::Int(1));
    assert_eq!(entry.label, Value::from("custom"));
}

#[test]
fn formatter_scalar_is_key_and_label() {
    let formatter = OptionFormatter::from_fn(|value| {
        Some(FormatOutput::from(value.text_projection().to_uppercase()))
    });

    let entry = format_option(&Value::from("red"), None, Some(&formatter)).expect("format");

    assert_eq!(entry.key, OptionKey::Text("RED".into()));
    assert_eq!(entry.label, Value::from("RED"));
}

#[test]
fn formatter_null_defers_to_builtin_rules() {
    let formatter = OptionFormatter::from_fn(|_| Some(FormatOutput::Scalar(Value::Null)));

    let entry = format_option(&Value::Bool(false), None, Some(&formatter)).expect("format");

    assert_eq!(entry.label, Value::from("False"));
}

#[test]
fn formatter_errors_propagate() {
    let formatter = OptionFormatter::new(|_| Err(InternalError::callback("boom")));

    let err = format_option(&Value::Int(1), None, Some(&formatter)).expect_err("must fail");

    assert_eq!(err.message, "boom");
}

#[test]
fn identity_fallback_keeps_raw_value() {
    let entry = format_option(&Value::from("blue"), None, None).expect("format");

    assert_eq!(entry.key, OptionKey::Text("blue".into()));
    assert_eq!(entry.label, Value::from("blue"));
}

#[test]
fn label_of_stringifies_booleans_and_composites() {
    let formatter = OptionFormatter::from_fn(|value| match value {
        Value::Int(_) => Some(FormatOutput::pair(value.clone(), true)),
        Value::Text(_) => Some(FormatOutput::pair(
            value.clone(),
            Record::new().with("name", "Ada"),
        )),
        _ => None,
    });

    assert_eq!(
        label_of(&Value::Int(3), None, Some(&formatter)).expect("label"),
        "1"
    );
    assert_eq!(
        label_of(&Value::from("x"), None, Some(&formatter)).expect("label"),
        r#"{"name":"Ada"}"#
    );
    assert_eq!(
        label_of(&Value::from("2024-03-05"), None, None).expect("label"),
        "2024-03-05"
    );
}
