use crate::{
    filter::{FilterShape, FilterSpec, SelectionArity},
    query::{Predicate, Queryable},
    value::{Date, Value},
};

impl<Q: Queryable> FilterSpec<Q> {
    /// Predicate for a submitted form value, or `None` when the input is
    /// absent or malformed and the filter should not apply.
    #[must_use]
    pub fn predicate_for(&self, input: &Value) -> Option<Predicate> {
        let column = self.predicate_column();
        let predicate = match self.arity() {
            SelectionArity::Single => single_predicate(column, input)?,
            SelectionArity::Multiple => multiple_predicate(column, input)?,
        };

        Some(match self.shape() {
            FilterShape::Column { .. } => predicate,
            FilterShape::Relationship { relation, .. } => Predicate::exists(relation, predicate),
        })
    }

    /// Narrow `query` by the submitted value; unchanged when no predicate
    /// applies.
    #[must_use]
    pub fn apply_to(&self, query: Q, input: &Value) -> Q {
        match self.predicate_for(input) {
            Some(predicate) => query.filter(predicate),
            None => query,
        }
    }
}

fn single_predicate(column: &str, input: &Value) -> Option<Predicate> {
    if input.is_blank() || matches!(input, Value::List(_)) {
        return None;
    }

    match date_input(input) {
        DateInput::Date(date) => Some(Predicate::date_eq(column, date)),
        DateInput::Malformed => None,
        DateInput::NotDate => Some(Predicate::eq(column, input.clone())),
    }
}

fn multiple_predicate(column: &str, input: &Value) -> Option<Predicate> {
    let Value::List(items) = input else {
        return None;
    };
    let values: Vec<Value> = items.iter().filter(|v| !v.is_blank()).cloned().collect();
    let first = values.first()?;

    if matches!(date_input(first), DateInput::NotDate) {
        return Some(Predicate::in_list(column, values));
    }

    let dates: Vec<Predicate> = values
        .iter()
        .filter_map(|value| match date_input(value) {
            DateInput::Date(date) => Some(Predicate::date_eq(column, date)),
            _ => None,
        })
        .collect();

    (!dates.is_empty()).then_some(Predicate::Or(dates))
}

enum DateInput {
    Date(Date),
    Malformed,
    NotDate,
}

// Dates arrive as `Value::Date` or as `YYYY-MM-DD` text from form inputs.
fn date_input(value: &Value) -> DateInput {
    match value {
        Value::Date(date) => DateInput::Date(*date),
        Value::Text(text) if is_date_shaped(text) => {
            Date::parse(text).map_or(DateInput::Malformed, DateInput::Date)
        }
        _ => DateInput::NotDate,
    }
}

fn is_date_shaped(text: &str) -> bool {
    let bytes = text.as_bytes();

    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

///
/// TESTS
///
