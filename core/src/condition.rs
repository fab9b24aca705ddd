//! Row conditions, pushed down into SQL or checked against single cells.

use crate::{
    error::{QueryError, QueryResult},
    value::Value,
};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn sql(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare { field: String, op: CmpOp, value: Value },
    /// Set membership. An empty list places no restriction on the field.
    In { field: String, values: Vec<Value> },
}

impl Condition {
    pub fn compare(field: &str, op: CmpOp, value: impl Into<Value>) -> Self {
        Self::Compare { field: field.to_string(), op, value: value.into() }
    }

    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::compare(field, CmpOp::Eq, value)
    }

    pub fn is_in(field: &str, values: Vec<Value>) -> Self {
        Self::In { field: field.to_string(), values }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::Compare { field, .. } | Self::In { field, .. } => field,
        }
    }

    /// Whether a cell satisfies the condition, with SQL semantics: a Null
    /// cell never satisfies a comparison.
    pub fn holds(&self, cell: &Value) -> bool {
        match self {
            Self::In { values, .. } if values.is_empty() => true,
            _ if cell.is_null() => false,
            Self::In { values, .. } => values.iter().any(|v| v.total_cmp(cell) == Ordering::Equal),
            Self::Compare { op, value, .. } => {
                let ord = cell.total_cmp(value);
                match op {
                    CmpOp::Eq => ord == Ordering::Equal,
                    CmpOp::Ne => ord != Ordering::Equal,
                    CmpOp::Lt => ord == Ordering::Less,
                    CmpOp::Le => ord != Ordering::Greater,
                    CmpOp::Gt => ord == Ordering::Greater,
                    CmpOp::Ge => ord != Ordering::Less,
                }
            }
        }
    }

    /// Parse `Field<op>value`, e.g. `Time>=12` or `Commodity==uox`.
    /// The value is read as an integer, then a real, then text.
    pub fn parse(expr: &str) -> QueryResult<Self> {
        // two-character operators first so `>=` is not read as `>`
        const OPS: [(&str, CmpOp); 7] = [
            ("==", CmpOp::Eq),
            ("!=", CmpOp::Ne),
            ("<=", CmpOp::Le),
            (">=", CmpOp::Ge),
            ("<", CmpOp::Lt),
            (">", CmpOp::Gt),
            ("=", CmpOp::Eq),
        ];
        let invalid = || QueryError::InvalidIdentifier { ident: expr.to_string() };
        let (pos, token, op) = OPS
            .iter()
            .filter_map(|(token, op)| expr.find(token).map(|pos| (pos, *token, *op)))
            .min_by_key(|(pos, token, _)| (*pos, usize::MAX - token.len()))
            .ok_or_else(invalid)?;
        let field = expr[..pos].trim();
        let raw = expr[pos + token.len()..].trim().trim_matches(|c| c == '"' || c == '\'');
        if field.is_empty() || raw.is_empty() {
            return Err(invalid());
        }
        let value = if let Ok(i) = raw.parse::<i64>() {
            Value::Integer(i)
        } else if let Ok(f) = raw.parse::<f64>() {
            Value::Real(f)
        } else {
            Value::Text(raw.to_string())
        };
        Ok(Self::compare(field, op, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_operators_and_values() {
        assert_eq!(
            Condition::parse("Time>=12").unwrap(),
            Condition::compare("Time", CmpOp::Ge, 12i64)
        );
        assert_eq!(
            Condition::parse("Commodity == uox").unwrap(),
            Condition::eq("Commodity", "uox")
        );
        assert_eq!(
            Condition::parse("Quantity<0.5").unwrap(),
            Condition::compare("Quantity", CmpOp::Lt, 0.5)
        );
        assert_eq!(
            Condition::parse("Prototype!='Reactor'").unwrap(),
            Condition::compare("Prototype", CmpOp::Ne, "Reactor")
        );
    }

    #[test]
    fn conditions_hold_on_cells_like_sql() {
        let late = Condition::parse("Time>=3").unwrap();
        assert!(late.holds(&Value::Integer(3)));
        assert!(late.holds(&Value::Real(3.5)));
        assert!(!late.holds(&Value::Integer(2)));
        assert!(!late.holds(&Value::Null));
        assert!(Condition::compare("Commodity", CmpOp::Ne, "uox").holds(&"mox".into()));
        assert!(Condition::is_in("NucId", Vec::new()).holds(&Value::Null));
        assert!(Condition::is_in("NucId", vec![1.into(), 2.into()]).holds(&Value::Integer(2)));
    }

    #[test]
    fn rejects_expressions_without_operator() {
        assert!(Condition::parse("Time").is_err());
        assert!(Condition::parse("==3").is_err());
    }
}
