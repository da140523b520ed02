//! # pilosa-cli
//!
//! Command-line front end for `pilosa-client`.
//!
//! ## Usage
//!
//! ```bash
//! # Run a query against the default host (:10101)
//! pilosa query repository 'Count(Bitmap(id=5, frame="stargazer"))'
//!
//! # Spread requests over two hosts and ask for profiles
//! pilosa --host db1:10101 --host db2:10101 query repository 'Bitmap(id=5, frame="stargazer")' --profiles
//!
//! # Schema management
//! pilosa ensure-db repository --column-label repo_id
//! pilosa ensure-frame repository stargazer --row-label stargazer_id
//! pilosa delete-db repository
//! ```

use clap::{Parser, Subcommand};

use pilosa_client::{Address, Client, ClientBuilder, Database, Ensured, Frame};

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Client(#[from] pilosa_client::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// pilosa - talk to a Pilosa cluster
#[derive(Parser, Debug)]
#[command(name = "pilosa")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Server address, e.g. `:10101` or `http://db1:10101`; repeat for a cluster
    #[arg(long = "host", value_name = "ADDRESS")]
    pub hosts: Vec<Address>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run PQL against a database and print the decoded response
    Query {
        database: String,
        pql: String,
        /// Include column profiles in the response
        #[arg(long)]
        profiles: bool,
    },
    /// Create a database
    CreateDb {
        database: String,
        #[arg(long)]
        column_label: Option<String>,
    },
    /// Create a database unless it exists
    EnsureDb {
        database: String,
        #[arg(long)]
        column_label: Option<String>,
    },
    /// Delete a database
    DeleteDb { database: String },
    /// Create a frame
    CreateFrame {
        database: String,
        frame: String,
        #[arg(long)]
        row_label: Option<String>,
    },
    /// Create a frame unless it exists
    EnsureFrame {
        database: String,
        frame: String,
        #[arg(long)]
        row_label: Option<String>,
    },
    /// Delete a frame
    DeleteFrame { database: String, frame: String },
}

impl Args {
    /// Build a client for the configured hosts.
    pub fn client(&self) -> Result<Client, CliError> {
        let mut builder = ClientBuilder::new();
        for host in &self.hosts {
            builder = builder.host(host.clone());
        }
        if let Some(seconds) = self.timeout {
            builder = builder.timeout(std::time::Duration::from_secs(seconds));
        }
        Ok(builder.build()?)
    }
}

fn database(name: &str, column_label: &Option<String>) -> Database {
    let database = Database::new(name);
    match column_label {
        Some(label) => database.with_column_label(label.as_str()),
        None => database,
    }
}

fn frame(database: &str, name: &str, row_label: &Option<String>) -> Frame {
    let frame = Database::new(database).frame(name);
    match row_label {
        Some(label) => frame.with_row_label(label.as_str()),
        None => frame,
    }
}

fn describe(ensured: Ensured, what: &str) -> String {
    match ensured {
        Ensured::Created => format!("created {}", what),
        Ensured::AlreadyExisted => format!("{} already exists", what),
    }
}

/// Run one command; returns what should be printed on stdout.
pub fn execute(command: &Command, client: &Client) -> Result<String, CliError> {
    let output = match command {
        Command::Query {
            database,
            pql,
            profiles,
        } => {
            let query = Database::new(database.as_str()).raw_query(pql.as_str());
            let response = if *profiles {
                client.query_with_profiles(&query)?
            } else {
                client.query(&query)?
            };
            serde_json::to_string_pretty(&response)?
        }
        Command::CreateDb {
            database: name,
            column_label,
        } => {
            client.create_database(&database(name, column_label))?;
            format!("created database {}", name)
        }
        Command::EnsureDb {
            database: name,
            column_label,
        } => {
            let ensured = client.ensure_database(&database(name, column_label))?;
            describe(ensured, &format!("database {}", name))
        }
        Command::DeleteDb { database: name } => {
            client.delete_database(&Database::new(name.as_str()))?;
            format!("deleted database {}", name)
        }
        Command::CreateFrame {
            database,
            frame: name,
            row_label,
        } => {
            client.create_frame(&frame(database, name, row_label))?;
            format!("created frame {}/{}", database, name)
        }
        Command::EnsureFrame {
            database,
            frame: name,
            row_label,
        } => {
            let ensured = client.ensure_frame(&frame(database, name, row_label))?;
            describe(ensured, &format!("frame {}/{}", database, name))
        }
        Command::DeleteFrame {
            database,
            frame: name,
        } => {
            client.delete_frame(&frame(database, name, &None))?;
            format!("deleted frame {}/{}", database, name)
        }
    };
    Ok(output)
}
