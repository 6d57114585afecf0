// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Query expressions for key queries over indexed events.
//!
//! Callers build chain-agnostic [`Expression<Primitive>`] trees. Event
//! bindings remap them into [`Expression<LogPrimitive>`] trees the log indexer
//! understands, resolving named fields to topic or data-word positions.

mod log;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use alloy_primitives::B256;

pub use log::{HashedValueComparator, LogPrimitive};

use crate::types::ConfidenceLevel;

/// Boolean tree over primitives `P`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Expression<P> {
    /// A single condition
    Primitive(P),
    /// All children must hold
    And(Vec<Expression<P>>),
    /// At least one child must hold
    Or(Vec<Expression<P>>),
}

impl<P> Expression<P> {
    /// Map every primitive, keeping the tree shape.
    pub fn try_map<Q, E>(
        self,
        f: &mut impl FnMut(P) -> Result<Q, E>,
    ) -> Result<Expression<Q>, E> {
        Ok(match self {
            Expression::Primitive(p) => Expression::Primitive(f(p)?),
            Expression::And(children) => Expression::And(
                children
                    .into_iter()
                    .map(|c| c.try_map(f))
                    .collect::<Result<_, _>>()?,
            ),
            Expression::Or(children) => Expression::Or(
                children
                    .into_iter()
                    .map(|c| c.try_map(f))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// Evaluate the tree with `test` deciding each primitive.
    pub fn evaluate(&self, test: &impl Fn(&P) -> bool) -> bool {
        match self {
            Expression::Primitive(p) => test(p),
            Expression::And(children) => children.iter().all(|c| c.evaluate(test)),
            Expression::Or(children) => children.iter().any(|c| c.evaluate(test)),
        }
    }
}

impl<P> From<P> for Expression<P> {
    fn from(primitive: P) -> Self {
        Expression::Primitive(primitive)
    }
}

/// Comparison applied by a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonOperator {
    /// `==`
    Eq,
    /// `!=`
    Neq,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Gte,
    /// `<=`
    Lte,
}

impl ComparisonOperator {
    /// Apply the operator to two ordered values.
    pub fn compare<T: PartialOrd>(self, left: &T, right: &T) -> bool {
        match self {
            ComparisonOperator::Eq => left == right,
            ComparisonOperator::Neq => left != right,
            ComparisonOperator::Gt => left > right,
            ComparisonOperator::Lt => left < right,
            ComparisonOperator::Gte => left >= right,
            ComparisonOperator::Lte => left <= right,
        }
    }
}

/// A native value compared against a named event field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueComparator {
    /// Native value, shaped like the field
    pub value: Value,
    /// Comparison
    pub operator: ComparisonOperator,
}

/// Chain-agnostic primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Primitive {
    /// Compare a named event field (a generic topic or data-word name)
    Comparator {
        /// Generic field name
        name: String,
        /// All comparators must hold
        value_comparators: Vec<ValueComparator>,
    },
    /// Compare the block number
    Block {
        /// Block number
        block: u64,
        /// Comparison
        operator: ComparisonOperator,
    },
    /// Require a finality level
    Confidence(ConfidenceLevel),
    /// Compare the block timestamp (seconds)
    Timestamp {
        /// Unix seconds
        timestamp: u64,
        /// Comparison
        operator: ComparisonOperator,
    },
    /// Match a transaction hash
    TxHash(B256),
}

impl Primitive {
    /// Equality comparator on a named field.
    pub fn field_eq(name: impl Into<String>, value: Value) -> Self {
        Primitive::Comparator {
            name: name.into(),
            value_comparators: vec![ValueComparator {
                value,
                operator: ComparisonOperator::Eq,
            }],
        }
    }
}

/// A key query: the event read name plus extra conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFilter {
    /// Event read name
    pub key: String,
    /// Conditions, all of which must hold
    pub expressions: Vec<Expression<Primitive>>,
}

impl KeyFilter {
    /// Filter with no extra conditions.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            expressions: Vec::new(),
        }
    }

    /// Add a condition.
    pub fn with_expression(mut self, expression: impl Into<Expression<Primitive>>) -> Self {
        self.expressions.push(expression.into());
        self
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Oldest first
    #[default]
    Asc,
    /// Newest first
    Desc,
}

/// Sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    /// By block number
    Block(SortDirection),
    /// By block timestamp
    Timestamp(SortDirection),
    /// By `(block, log index)`
    Sequence(SortDirection),
}

/// Page size, cursor and ordering of a key query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitAndSort {
    /// Sort keys, applied in order
    pub sort_by: Vec<SortBy>,
    /// Maximum number of results, `0` for no limit
    pub count: u64,
    /// Resume after this cursor
    pub cursor: Option<String>,
}

impl LimitAndSort {
    /// Newest-first by sequence, at most `count` results.
    pub fn latest(count: u64) -> Self {
        Self {
            sort_by: vec![SortBy::Sequence(SortDirection::Desc)],
            count,
            cursor: None,
        }
    }
}
