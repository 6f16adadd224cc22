//! Query builder for table reads, updates and deletes.
//!
//! Produces PostgREST query parameters: `select=...`, one parameter per
//! column filter (`city_id=eq.3`), `order=name.asc`, `limit`, `offset`.

/// Sort direction for [`Query::order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

/// A table query. Values are encoded by the client when the URL is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    select: Option<String>,
    filters: Vec<(String, String)>,
    order: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns to return (defaults to `*`).
    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    fn filter(mut self, column: &str, op: &str, value: impl std::fmt::Display) -> Self {
        self.filters
            .push((column.to_string(), format!("{op}.{value}")));
        self
    }

    pub fn eq(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filter(column, "eq", value)
    }

    pub fn neq(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filter(column, "neq", value)
    }

    pub fn gt(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filter(column, "gt", value)
    }

    pub fn gte(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filter(column, "gte", value)
    }

    pub fn lt(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filter(column, "lt", value)
    }

    pub fn lte(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filter(column, "lte", value)
    }

    /// Case-insensitive pattern match; `*` is the wildcard.
    pub fn ilike(self, column: &str, pattern: &str) -> Self {
        self.filter(column, "ilike", pattern)
    }

    /// `column IN (values)`. Values containing reserved characters are quoted.
    pub fn in_list<S: AsRef<str>>(self, column: &str, values: &[S]) -> Self {
        let list = values
            .iter()
            .map(|v| quote_list_value(v.as_ref()))
            .collect::<Vec<_>>()
            .join(",");
        self.filter(column, "in", format!("({list})"))
    }

    pub fn is_null(self, column: &str) -> Self {
        self.filter(column, "is", "null")
    }

    /// Rows where any of `columns` equals `value`:
    /// `or=(client_id.eq.u1,provider_id.eq.u1)`.
    pub fn any_eq(mut self, columns: &[&str], value: impl std::fmt::Display) -> Self {
        let value = quote_list_value(&value.to_string());
        let alternatives = columns
            .iter()
            .map(|c| format!("{c}.eq.{value}"))
            .collect::<Vec<_>>()
            .join(",");
        self.filters.push(("or".to_string(), format!("({alternatives})")));
        self
    }

    /// Add a sort key. Multiple calls sort by each key in turn.
    pub fn order(mut self, column: &str, direction: Order) -> Self {
        self.order.push(format!("{column}.{}", direction.as_str()));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Whether the query narrows rows at all. Updates and deletes refuse
    /// unfiltered queries.
    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Parameters for a read (`GET`).
    pub fn read_params(&self) -> Vec<(String, String)> {
        let mut params = vec![(
            "select".to_string(),
            self.select.clone().unwrap_or_else(|| "*".to_string()),
        )];
        params.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            params.push(("order".to_string(), self.order.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset".to_string(), offset.to_string()));
        }
        params
    }

    /// Parameters for a write (`PATCH`/`DELETE`): filters only, plus the
    /// column list of the returned representation when one was selected.
    pub fn write_params(&self) -> Vec<(String, String)> {
        let mut params = self.filters.clone();
        if let Some(select) = &self.select {
            params.push(("select".to_string(), select.clone()));
        }
        params
    }
}

fn quote_list_value(value: &str) -> String {
    if value.chars().any(|c| matches!(c, ',' | '(' | ')' | '"' | '\\' | ' ')) {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}
