//! Typed document queries.
//!
//! A [`FindQuery`] is backend neutral: each store compiles the selector into
//! its own form (Mango JSON for CouchDB, SQL for SQLite). Field names are
//! dotted paths into the JSON document, e.g. `stats.memberCount`.

use serde_json::Value;

/// Regex matching the needle literally, ignoring case.
pub fn case_insensitive(needle: &str) -> String {
    format!("(?i){}", regex::escape(needle))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Field equals the value exactly.
    Eq { field: String, value: Value },
    /// String field contains the needle, ignoring case.
    Contains { field: String, needle: String },
    /// At least one element of an array field contains the needle, ignoring case.
    AnyContains { field: String, needle: String },
    /// Field is strictly greater than the value.
    Gt { field: String, value: Value },
    /// At least one of the clauses holds.
    Or(Vec<Clause>),
}

impl Clause {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Clause::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Clause::Contains {
            field: field.into(),
            needle: needle.into(),
        }
    }

    pub fn any_contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Clause::AnyContains {
            field: field.into(),
            needle: needle.into(),
        }
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Clause::Gt {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn or(clauses: Vec<Clause>) -> Self {
        Clause::Or(clauses)
    }
}

/// Clauses that must all hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    clauses: Vec<Clause>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    pub selector: Selector,
    pub sort: Vec<SortField>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    /// Fields to keep in the returned documents, everything when unset.
    pub fields: Option<Vec<String>>,
}

impl FindQuery {
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            ..Self::default()
        }
    }

    pub fn sort(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.sort.push(SortField {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = Some(fields.iter().map(|field| field.to_string()).collect());
        self
    }
}

/// Keeps only the listed top level fields of a document.
pub fn project(document: Value, fields: &[String]) -> Value {
    match document {
        Value::Object(mut map) => {
            map.retain(|key, _| fields.iter().any(|field| field == key));
            Value::Object(map)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_builder_collects_clauses_in_order() {
        let query = FindQuery::new(
            Selector::new()
                .and(Clause::eq("type", "classroom"))
                .and(Clause::gt("stats.studentCount", 0)),
        )
        .sort("stats.studentCount", Direction::Desc)
        .limit(5);

        assert_eq!(query.selector.clauses().len(), 2);
        assert_eq!(query.selector.clauses()[0], Clause::eq("type", "classroom"));
        assert_eq!(query.sort[0].direction.as_str(), "desc");
        assert_eq!(query.skip, None);
        assert_eq!(query.limit, Some(5));
    }

    #[test]
    fn test_project_keeps_listed_fields() {
        let document = json!({ "_id": "a", "category": "math", "name": "Algebra" });
        let projected = project(document, &["category".to_string()]);

        assert_eq!(projected, json!({ "category": "math" }));
    }
}
