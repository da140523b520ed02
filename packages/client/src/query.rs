//! The query contract handed to the client.
//!
//! The client never looks inside the PQL text. Anything that can name its
//! target database and render itself as PQL can be sent.

use crate::error::{Error, Result};

pub trait PqlQuery {
    /// Name of the database the query runs against.
    fn database_name(&self) -> &str;

    /// The PQL text sent as the request body.
    fn serialize(&self) -> String;
}

impl<Q: PqlQuery + ?Sized> PqlQuery for &Q {
    fn database_name(&self) -> &str {
        (**self).database_name()
    }

    fn serialize(&self) -> String {
        (**self).serialize()
    }
}

/// PQL text bound to a database, sent verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawQuery {
    database: String,
    pql: String,
}

impl RawQuery {
    pub fn new(database: impl Into<String>, pql: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            pql: pql.into(),
        }
    }
}

impl PqlQuery for RawQuery {
    fn database_name(&self) -> &str {
        &self.database
    }

    fn serialize(&self) -> String {
        self.pql.clone()
    }
}

/// Several queries against one database, sent as a single request.
///
/// The server answers with one result per member, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchQuery {
    database: String,
    queries: Vec<String>,
}

impl BatchQuery {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            queries: Vec::new(),
        }
    }

    /// Append a query. Fails if it targets a different database.
    pub fn with(mut self, query: impl PqlQuery) -> Result<Self> {
        if query.database_name() != self.database {
            return Err(Error::DatabaseMismatch {
                expected: self.database,
                actual: query.database_name().to_string(),
            });
        }
        self.queries.push(query.serialize());
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

impl PqlQuery for BatchQuery {
    fn database_name(&self) -> &str {
        &self.database
    }

    fn serialize(&self) -> String {
        self.queries.concat()
    }
}
