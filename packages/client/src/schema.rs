//! Schema metadata the client serializes into create/delete requests.

use serde_json::json;

use crate::query::{BatchQuery, RawQuery};

pub const DEFAULT_COLUMN_LABEL: &str = "profileID";
pub const DEFAULT_ROW_LABEL: &str = "id";

/// A database (index) on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Database {
    name: String,
    column_label: String,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_label: DEFAULT_COLUMN_LABEL.to_string(),
        }
    }

    pub fn with_column_label(mut self, label: impl Into<String>) -> Self {
        self.column_label = label.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_label(&self) -> &str {
        &self.column_label
    }

    /// A frame belonging to this database.
    pub fn frame(&self, name: impl Into<String>) -> Frame {
        Frame {
            database: self.clone(),
            name: name.into(),
            row_label: DEFAULT_ROW_LABEL.to_string(),
        }
    }

    /// Wrap PQL text so it can be sent against this database.
    pub fn raw_query(&self, pql: impl Into<String>) -> RawQuery {
        RawQuery::new(self.name.clone(), pql)
    }

    /// Start an empty batch bound to this database.
    pub fn batch_query(&self) -> BatchQuery {
        BatchQuery::new(self.name.clone())
    }

    pub(crate) fn request_body(&self) -> String {
        json!({
            "db": self.name,
            "options": {"columnLabel": self.column_label},
        })
        .to_string()
    }
}

/// A frame inside a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    database: Database,
    name: String,
    row_label: String,
}

impl Frame {
    pub fn with_row_label(mut self, label: impl Into<String>) -> Self {
        self.row_label = label.into();
        self
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_label(&self) -> &str {
        &self.row_label
    }

    pub(crate) fn request_body(&self) -> String {
        json!({
            "db": self.database.name,
            "frame": self.name,
            "options": {"rowLabel": self.row_label},
        })
        .to_string()
    }
}
