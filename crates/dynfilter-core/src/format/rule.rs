use crate::{
    error::InternalError,
    format::{FormatOutput, OptionEntry, OptionFormatter, OptionKey, ValueLabelMap},
    value::Value,
};

///
/// FormatRule
///
/// One step of the option formatting chain. Rules are evaluated in
/// `FORMAT_RULES` order and the first rule producing an entry wins.
///
/// The order is a public contract: callback beats temporal beats tagged
/// beats label map beats boolean beats identity.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FormatRule {
    Callback,
    Temporal,
    Tagged,
    Mapped,
    Boolean,
    Identity,
}

pub const FORMAT_RULES: [FormatRule; 6] = [
    FormatRule::Callback,
    FormatRule::Temporal,
    FormatRule::Tagged,
    FormatRule::Mapped,
    FormatRule::Boolean,
    FormatRule::Identity,
];

impl FormatRule {
    /// Apply this rule; `Ok(None)` hands the value to the next rule.
    pub fn apply(
        self,
        value: &Value,
        map: Option<&ValueLabelMap>,
        formatter: Option<&OptionFormatter>,
    ) -> Result<Option<OptionEntry>, InternalError> {
        let entry = match self {
            Self::Callback => {
                let Some(formatter) = formatter else {
                    return Ok(None);
                };
                match formatter.call(value)? {
                    None | Some(FormatOutput::Scalar(Value::Null)) => None,
                    Some(FormatOutput::Scalar(scalar)) => Some(OptionEntry {
                        key: OptionKey::from_value(&scalar),
                        label: scalar,
                    }),
                    Some(FormatOutput::Pair { key, label }) => Some(OptionEntry {
                        key: OptionKey::from_value(&key),
                        label,
                    }),
                }
            }
            Self::Temporal => {
                let date = match value {
                    Value::Date(date) => *date,
                    Value::Timestamp(ts) => ts.date(),
                    _ => return Ok(None),
                };
                Some(OptionEntry {
                    key: OptionKey::Text(date.to_iso()),
                    label: Value::Text(date.to_display()),
                })
            }
            Self::Tagged => match value {
                Value::Enum(e) => Some(OptionEntry {
                    key: OptionKey::from_value(&e.tag),
                    label: Value::Text(e.label.clone()),
                }),
                _ => None,
            },
            Self::Mapped => {
                let Some(map) = map else {
                    return Ok(None);
                };
                if !value.is_scalar() {
                    return Ok(None);
                }
                let key = OptionKey::from_value(value);
                map.get(&key).map(|label| OptionEntry {
                    key,
                    label: Value::Text(label.to_string()),
                })
            }
            Self::Boolean => match value {
                Value::Bool(b) => Some(OptionEntry {
                    key: OptionKey::Int(i64::from(*b)),
                    label: Value::Text(String::from(if *b { "True" } else { "False" })),
                }),
                _ => None,
            },
            Self::Identity => Some(OptionEntry {
                key: OptionKey::from_value(value),
                label: value.clone(),
            }),
        };

        Ok(entry)
    }
}
