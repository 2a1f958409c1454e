use super::{INSTANCES, ORGS, TableDef, USERS};
use crate::condition::Condition;
use crate::error::{DbError, DbResult};
use std::collections::HashMap;

type ColumnPairs = Vec<(&'static str, &'static str)>;

/// Which table pairs can be joined, and on which columns.
///
/// Registration validates column names against both tables, so a bad
/// mapping fails at startup. Looking up an unregistered pair returns `None`.
#[derive(Debug, Clone, Default)]
pub struct JoinRegistry {
    joins: HashMap<(&'static str, &'static str), ColumnPairs>,
}

impl JoinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instances, orgs and users.
    pub fn standard() -> DbResult<Self> {
        let mut registry = Self::new();
        registry
            .register(&INSTANCES, &ORGS, &[("id", "instance_id")])?
            .register(
                &ORGS,
                &USERS,
                &[("instance_id", "instance_id"), ("id", "org_id")],
            )?;
        Ok(registry)
    }

    /// Record that `left.l = right.r` for every `(l, r)` in `pairs`. The
    /// reverse direction is recorded too.
    pub fn register(
        &mut self,
        left: &TableDef,
        right: &TableDef,
        pairs: &[(&'static str, &'static str)],
    ) -> DbResult<&mut Self> {
        let invalid = |reason: String| DbError::InvalidJoin {
            left: left.name.to_string(),
            right: right.name.to_string(),
            reason,
        };
        if pairs.is_empty() {
            return Err(invalid("no columns to join on".to_string()));
        }
        for &(l, r) in pairs {
            if !left.has_column(l) {
                return Err(invalid(format!("{} has no column {l}", left.name)));
            }
            if !right.has_column(r) {
                return Err(invalid(format!("{} has no column {r}", right.name)));
            }
        }
        self.joins.insert((left.name, right.name), pairs.to_vec());
        self.joins.insert(
            (right.name, left.name),
            pairs.iter().map(|&(l, r)| (r, l)).collect(),
        );
        Ok(self)
    }

    /// Column pairs `(left column, right column)` for joining `left` to `right`.
    pub fn possible_joins(
        &self,
        left: &TableDef,
        right: &TableDef,
    ) -> Option<&[(&'static str, &'static str)]> {
        self.joins
            .get(&(left.name, right.name))
            .map(Vec::as_slice)
    }

    /// The ON condition for joining `left` to `right`, qualified with each
    /// table's qualifier.
    pub fn on(&self, left: &TableDef, right: &TableDef) -> Option<Condition> {
        let pairs = self.possible_joins(left, right)?;
        Some(Condition::and(pairs.iter().map(|&(l, r)| {
            Condition::columns_equal(left.column(l), right.column(r))
        })))
    }
}
