// src/literal.rs
//! Literal values of literal types and enum members.

pub mod expr;

use std::cmp::Ordering;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::definition::Definition;
use crate::graph::{EnumMember, TypeKind};
use expr::{InitializerShape, parse_initializer};

/// A primitive constant: what literal types, enum members and `enum` arrays hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl Literal {
    /// JSON-Schema `type` keyword for this value.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Boolean(_) => "boolean",
            Literal::Number(_) => "number",
            Literal::String(_) => "string",
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Boolean(b) => Value::Bool(*b),
            Literal::Number(n) => number_value(*n),
            Literal::String(s) => Value::String(s.clone()),
        }
    }

    /// Scalars only; arrays and objects are not literals.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Literal::Null),
            Value::Bool(b) => Some(Literal::Boolean(*b)),
            Value::Number(n) => n.as_f64().map(Literal::Number),
            Value::String(s) => Some(Literal::String(s.clone())),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Literal::Null => 0,
            Literal::Boolean(_) => 1,
            Literal::Number(_) => 2,
            Literal::String(_) => 3,
        }
    }

    /// Total order: null < booleans < numbers < strings; natural order within a kind.
    pub fn native_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Literal::Boolean(a), Literal::Boolean(b)) => a.cmp(b),
            (Literal::Number(a), Literal::Number(b)) => OrderedFloat(*a).cmp(&OrderedFloat(*b)),
            (Literal::String(a), Literal::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Whole numbers are emitted as JSON integers.
pub fn number_value(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

/// Underlying primitive of a literal type; `None` for every other kind.
///
/// Enum-literal labels that read as numbers become numbers.
pub fn extract_literal(kind: &TypeKind) -> Option<Literal> {
    match kind {
        TypeKind::StringLiteral { value } => Some(Literal::String(value.clone())),
        TypeKind::NumberLiteral { value } => Some(Literal::Number(*value)),
        TypeKind::BooleanLiteral { value } => Some(Literal::Boolean(*value)),
        TypeKind::EnumLiteral { value } => Some(match value.trim().parse::<f64>() {
            Ok(n) if !value.trim().is_empty() && n.is_finite() => Literal::Number(n),
            _ => Literal::String(value.clone()),
        }),
        _ => None,
    }
}

pub fn sort_literals(values: &mut [Literal]) {
    values.sort_by(Literal::native_cmp);
}

/// Fills `type` and a sorted `enum` from enum members.
///
/// Members without a constant value are read from their initializer; shapes that are not
/// literals are logged and skipped.
pub fn enum_definition(full_name: &str, members: &[EnumMember], def: &mut Definition) {
    let mut values: Vec<Literal> = Vec::new();
    let mut kinds: Vec<&'static str> = Vec::new();

    for member in members {
        let value = match (&member.value, &member.initializer) {
            (Some(constant), _) => Some(constant.clone()),
            (None, Some(initializer)) => {
                member_from_initializer(full_name, &member.name, initializer)
            }
            (None, None) => None,
        };
        if let Some(value) = value {
            if !kinds.contains(&value.kind_name()) {
                kinds.push(value.kind_name());
            }
            values.push(value);
        }
    }

    match kinds.as_slice() {
        [] => {}
        [one] => {
            def.insert("type".into(), Value::from(*one));
        }
        many => {
            def.insert("type".into(), Value::from(many.to_vec()));
        }
    }
    if !values.is_empty() {
        sort_literals(&mut values);
        def.insert("enum".into(), Value::Array(values.iter().map(Literal::to_value).collect()));
    }
}

fn member_from_initializer(full_name: &str, member: &str, initializer: &str) -> Option<Literal> {
    let parsed = parse_initializer(initializer);
    let literal = match &parsed {
        // CASE = 'label' as any
        Ok(InitializerShape::Asserted(Value::String(s))) => Some(Literal::String(s.clone())),
        Ok(InitializerShape::Asserted(Value::Bool(b))) => Some(Literal::Boolean(*b)),
        Ok(InitializerShape::Plain(v)) => Literal::from_value(v),
        _ => None,
    };
    if literal.is_none() {
        tracing::warn!(
            enum_member = %format!("{full_name}.{member}"),
            initializer,
            "initializer is an expression; member left out of the enum"
        );
    }
    literal
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn member(name: &str, value: Option<Literal>, initializer: Option<&str>) -> EnumMember {
        EnumMember { name: name.into(), value, initializer: initializer.map(str::to_owned) }
    }

    #[test]
    fn string_enum_is_typed_and_sorted() {
        let mut def = Definition::new();
        let members = [
            member("B", Some(Literal::String("b".into())), None),
            member("A", Some(Literal::String("a".into())), None),
        ];
        enum_definition("Letter", &members, &mut def);
        assert_eq!(Value::from(def), json!({ "type": "string", "enum": ["a", "b"] }));
    }

    #[test]
    fn mixed_enum_lists_kinds_in_first_seen_order() {
        let mut def = Definition::new();
        let members = [
            member("Ten", Some(Literal::Number(10.0)), None),
            member("Two", Some(Literal::Number(2.0)), None),
            member("Label", None, Some("'label' as any")),
            member("Flag", None, Some("true as any")),
            member("Nothing", None, Some("null")),
            member("Raw", None, Some("`tpl`")),
            member("Computed", None, Some("compute()")),
        ];
        enum_definition("Mixed", &members, &mut def);
        assert_eq!(
            Value::from(def),
            json!({
                "type": ["number", "string", "boolean", "null"],
                "enum": [null, true, 2, 10, "label", "tpl"]
            })
        );
    }

    #[rstest]
    #[case(TypeKind::StringLiteral { value: "x".into() }, Some(Literal::String("x".into())))]
    #[case(TypeKind::NumberLiteral { value: 1.5 }, Some(Literal::Number(1.5)))]
    #[case(TypeKind::BooleanLiteral { value: false }, Some(Literal::Boolean(false)))]
    #[case(TypeKind::EnumLiteral { value: "3".into() }, Some(Literal::Number(3.0)))]
    #[case(TypeKind::EnumLiteral { value: "Red".into() }, Some(Literal::String("Red".into())))]
    #[case(TypeKind::String, None)]
    fn extracts_literal_values(#[case] kind: TypeKind, #[case] expected: Option<Literal>) {
        assert_eq!(extract_literal(&kind), expected);
    }

    #[test]
    fn native_order_is_total_across_kinds() {
        let mut values = vec![
            Literal::String("b".into()),
            Literal::Number(10.0),
            Literal::Boolean(true),
            Literal::Number(-1.0),
            Literal::Null,
            Literal::String("a".into()),
            Literal::Boolean(false),
        ];
        sort_literals(&mut values);
        let out: Vec<Value> = values.iter().map(Literal::to_value).collect();
        assert_eq!(Value::Array(out), json!([null, false, true, -1, 10, "a", "b"]));
    }
}
