//! Table query builder
//!
//! A `Query` names a table and carries the projection, filters, ordering and
//! limit of a request against the platform's table API. It is plain data:
//! `PlatformClient` turns it into an HTTP request, tests inspect the encoded
//! pairs directly.

use chrono::{DateTime, SecondsFormat, Utc};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    fn as_str(self) -> &'static str {
        match self {
            Order::Ascending => "asc",
            Order::Descending => "desc",
        }
    }
}

/// A request against one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: String,
    select: String,
    filters: Vec<(String, String)>,
    order: Vec<String>,
    limit: Option<usize>,
}

impl Query {
    /// Start a query on `table` selecting every column
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            select: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Replace the projection, e.g. `"*, visitor:visitors(*)"`
    pub fn select(mut self, columns: &str) -> Self {
        self.select = columns.split_whitespace().collect::<String>();
        self
    }

    pub fn eq(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "eq", value.to_string())
    }

    pub fn neq(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "neq", value.to_string())
    }

    pub fn gt(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "gt", value.to_string())
    }

    pub fn gte(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "gte", value.to_string())
    }

    pub fn lt(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "lt", value.to_string())
    }

    pub fn lte(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "lte", value.to_string())
    }

    /// Case-insensitive pattern match (`*` is the wildcard)
    pub fn ilike(self, column: &str, pattern: &str) -> Self {
        self.filter(column, "ilike", pattern.to_string())
    }

    pub fn is_null(self, column: &str) -> Self {
        self.filter(column, "is", "null".to_string())
    }

    /// Membership test against a list of values
    pub fn in_list<I, S>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list = values
            .into_iter()
            .map(|v| quote_list_value(v.as_ref()))
            .collect::<Vec<_>>()
            .join(",");
        self.filter(column, "in", format!("({})", list))
    }

    /// Raw disjunction, e.g. `"approved_at.is.null,approved_at.gte.2024-01-01"`
    pub fn or(mut self, expression: &str) -> Self {
        self.filters
            .push(("or".to_string(), format!("({})", expression)));
        self
    }

    pub fn order(mut self, column: &str, order: Order) -> Self {
        self.order.push(format!("{}.{}", column, order.as_str()));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn current_limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn columns(&self) -> &str {
        &self.select
    }

    /// Query-string pairs for a read
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.select.clone())];
        pairs.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            pairs.push(("order".to_string(), self.order.join(",")));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }

    /// Query-string pairs for a write: filters only
    pub fn filter_pairs(&self) -> Vec<(String, String)> {
        self.filters.clone()
    }

    fn filter(mut self, column: &str, op: &str, value: String) -> Self {
        self.filters
            .push((column.to_string(), format!("{}.{}", op, value)));
        self
    }
}

/// Format a timestamp the way filters expect it (UTC, millisecond precision)
pub fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Total row count from a `Content-Range` header (`0-24/3573`, `*/0`)
pub fn parse_content_range(header: &str) -> Option<u64> {
    let (_, total) = header.trim().rsplit_once('/')?;
    total.parse().ok()
}

fn quote_list_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| matches!(c, ',' | '(' | ')' | '"' | '\\' | ':') || c.is_whitespace());

    if needs_quotes {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
