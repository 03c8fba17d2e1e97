//! Business rule validation.
//!
//! Rules arrive as loose [`RuleDefinition`] records (the configuration
//! format) and are compiled into typed [`BusinessRule`] variants before
//! evaluation. Compilation and evaluation failures are kept per rule: a
//! broken rule turns into an error marker and the remaining rules still run.
//!
//! # Supported Rule Types
//!
//! - `range` - Numeric values must lie within `[min, max]`
//! - `not_null` - The column must contain no null values
//!
//! # Null Handling
//!
//! - `range` skips null values
//! - `not_null` counts every null as a violation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::table::{Column, ColumnType, TableView};

use super::models::RuleOutcome;

/// Errors that keep a rule from being evaluated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    #[error("rule definition is missing a column")]
    MissingColumn,
    #[error("rule definition is missing a type")]
    MissingType,
    #[error("unknown rule type '{0}'")]
    UnknownType(String),
    #[error("range bounds must be finite numbers")]
    NonFiniteBound,
    #[error("range minimum {min} is greater than maximum {max}")]
    InvertedBounds { min: f64, max: f64 },
    #[error("column '{column}' has type {column_type}, range rules need a numeric column")]
    TypeMismatch {
        column: String,
        column_type: ColumnType,
    },
}

/// Rule definition as written in configuration.
///
/// Every field is optional so that a malformed entry still deserializes and
/// can be reported as an error marker for that rule alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl RuleDefinition {
    /// Range rule definition.
    pub fn range(column: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            column: Some(column.into()),
            rule_type: Some("range".to_string()),
            min,
            max,
        }
    }

    /// Not-null rule definition.
    pub fn not_null(column: impl Into<String>) -> Self {
        Self {
            column: Some(column.into()),
            rule_type: Some("not_null".to_string()),
            min: None,
            max: None,
        }
    }

    /// Compiles the definition into a typed rule.
    pub fn compile(&self) -> Result<BusinessRule, RuleError> {
        let column = self
            .column
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or(RuleError::MissingColumn)?
            .to_string();

        match self.rule_type.as_deref() {
            None => Err(RuleError::MissingType),
            Some("range") => {
                if self.min.is_some_and(|v| !v.is_finite())
                    || self.max.is_some_and(|v| !v.is_finite())
                {
                    return Err(RuleError::NonFiniteBound);
                }
                if let (Some(min), Some(max)) = (self.min, self.max)
                    && min > max
                {
                    return Err(RuleError::InvertedBounds { min, max });
                }
                Ok(BusinessRule::Range {
                    column,
                    min: self.min,
                    max: self.max,
                })
            }
            Some("not_null") => Ok(BusinessRule::NotNull { column }),
            Some(other) => Err(RuleError::UnknownType(other.to_string())),
        }
    }
}

/// The default rule set: rates within [0, 100] and no missing close prices.
pub fn default_rule_definitions() -> BTreeMap<String, RuleDefinition> {
    let mut rules = BTreeMap::new();
    rules.insert(
        "rate_positive".to_string(),
        RuleDefinition::range("value", Some(0.0), Some(100.0)),
    );
    rules.insert(
        "price_not_null".to_string(),
        RuleDefinition::not_null("close"),
    );
    rules
}

/// A validated business rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusinessRule {
    /// Values must lie within `[min, max]`; only enforced when both bounds are set
    Range {
        column: String,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    /// Values must not be null
    NotNull { column: String },
}

impl BusinessRule {
    /// Column the rule applies to.
    pub fn column(&self) -> &str {
        match self {
            BusinessRule::Range { column, .. } | BusinessRule::NotNull { column } => column,
        }
    }

    /// Evaluates the rule against a column of a table with `row_count` rows.
    fn evaluate(&self, column: &Column, row_count: usize) -> Result<RuleOutcome, RuleError> {
        match self {
            BusinessRule::Range { min, max, .. } => {
                let Some(values) = column.numeric_values() else {
                    return Err(RuleError::TypeMismatch {
                        column: column.name().to_string(),
                        column_type: column.column_type(),
                    });
                };

                let count = match (min, max) {
                    (Some(min), Some(max)) => values
                        .iter()
                        .flatten()
                        .filter(|v| **v < *min || **v > *max)
                        .count() as u64,
                    _ => 0,
                };
                Ok(RuleOutcome::RangeViolation {
                    count,
                    percentage: percentage_of(count, row_count),
                })
            }
            BusinessRule::NotNull { .. } => {
                let count = column.null_count() as u64;
                Ok(RuleOutcome::NullViolation {
                    count,
                    percentage: percentage_of(count, row_count),
                })
            }
        }
    }
}

fn percentage_of(count: u64, row_count: usize) -> f64 {
    if row_count == 0 {
        0.0
    } else {
        count as f64 / row_count as f64 * 100.0
    }
}

/// A compiled rule together with the column its definition names.
///
/// The column is kept even when compilation fails, so that a broken rule on
/// a column the table lacks is skipped like any other rule.
#[derive(Debug, Clone, PartialEq)]
struct CompiledRule {
    column: Option<String>,
    rule: Result<BusinessRule, RuleError>,
}

/// A named set of compiled rules, including the ones that failed to compile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: BTreeMap<String, CompiledRule>,
}

impl RuleSet {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles every definition, keeping failures as per-rule errors.
    pub fn compile(definitions: &BTreeMap<String, RuleDefinition>) -> Self {
        let rules = definitions
            .iter()
            .map(|(name, definition)| {
                let rule = definition.compile();
                if let Err(e) = &rule {
                    tracing::warn!("Business rule '{}' is invalid: {}", name, e);
                }
                let column = definition
                    .column
                    .clone()
                    .filter(|c| !c.trim().is_empty());
                (name.clone(), CompiledRule { column, rule })
            })
            .collect();
        Self { rules }
    }

    /// The default rule set.
    pub fn default_rules() -> Self {
        Self::compile(&default_rule_definitions())
    }

    /// Builder method to add an already validated rule.
    pub fn with_rule(mut self, name: impl Into<String>, rule: BusinessRule) -> Self {
        let column = Some(rule.column().to_string());
        self.rules.insert(
            name.into(),
            CompiledRule {
                column,
                rule: Ok(rule),
            },
        );
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Compiled rule or compile error by name.
    pub fn get(&self, name: &str) -> Option<&Result<BusinessRule, RuleError>> {
        self.rules.get(name).map(|compiled| &compiled.rule)
    }

    /// Evaluates every rule against a table.
    ///
    /// Rules whose column is absent from the table are skipped and produce no
    /// entry, whether or not they compiled. Rules that fail to compile or
    /// evaluate produce an error marker, as does a definition without a
    /// column.
    pub fn evaluate(&self, table: &TableView) -> BTreeMap<String, RuleOutcome> {
        let mut outcomes = BTreeMap::new();

        for (name, compiled) in &self.rules {
            let column = match compiled.column.as_deref() {
                Some(column_name) => match table.column(column_name) {
                    Some(column) => Some(column),
                    None => {
                        tracing::debug!(
                            "Business rule '{}' skipped: column '{}' not present",
                            name,
                            column_name
                        );
                        continue;
                    }
                },
                None => None,
            };

            let (rule, column) = match (&compiled.rule, column) {
                (Ok(rule), Some(column)) => (rule, column),
                (Err(e), _) => {
                    outcomes.insert(name.clone(), RuleOutcome::error(e));
                    continue;
                }
                // A compiled rule always names its column
                (Ok(_), None) => {
                    outcomes.insert(name.clone(), RuleOutcome::error(&RuleError::MissingColumn));
                    continue;
                }
            };

            let outcome = rule
                .evaluate(column, table.row_count())
                .unwrap_or_else(|e| {
                    tracing::warn!("Business rule '{}' could not be evaluated: {}", name, e);
                    RuleOutcome::error(&e)
                });
            outcomes.insert(name.clone(), outcome);
        }

        outcomes
    }
}
