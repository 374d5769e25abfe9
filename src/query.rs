//! Server-side filter query builder

/// Logic used to join a clause onto the query.
///
/// The server only receives `or`-joined clauses from this client, so that is
/// the only operator offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOperator {
    Or,
}

#[derive(Debug, Clone)]
struct Clause {
    logic: LogicOperator,
    key: String,
    value: String,
}

/// Accumulates `key:value` clauses and renders them as a filter string,
/// e.g. `timeframe:current timeframe:preroll`.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    clauses: Vec<Clause>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, logic: LogicOperator, key: &str, value: &str) -> &mut Self {
        self.clauses.push(Clause {
            logic,
            key: key.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn build(&self) -> String {
        self.clauses
            .iter()
            .map(|clause| match clause.logic {
                LogicOperator::Or => format!("{}:{}", clause.key, clause.value),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
