//! # pilosa-client
//!
//! Blocking HTTP client for the Pilosa bitmap index server.
//!
//! ## Pieces
//!
//! - [`Address`]: a server location, parsed from forms like `:10101` or
//!   `http+tls://10.0.0.1:9999`.
//! - [`Cluster`]: round-robin pool of addresses. Hosts that fail at the
//!   transport level are dropped from it.
//! - [`Client`]: schema management (`create_*`, `delete_*`, `ensure_*`) and
//!   query execution against the pool.
//! - [`PqlQuery`]: anything that can name its database and render PQL.
//! - [`QueryResponse`]: decoded results, tagged by the JSON shape the server
//!   returned.
//!
//! ## Example
//!
//! ```ignore
//! use pilosa_client::{Client, Cluster, Address, Database};
//!
//! let cluster = Cluster::with_hosts([
//!     Address::parse("db1:10101")?,
//!     Address::parse("db2:10101")?,
//! ]);
//! let client = Client::new(cluster)?;
//!
//! let db = Database::new("repository");
//! client.ensure_database(&db)?;
//! client.ensure_frame(&db.frame("stargazer"))?;
//!
//! let response = client.query(&db.raw_query("Count(Bitmap(id=5, frame=\"stargazer\"))"))?;
//! if let Some(result) = response.result() {
//!     println!("{}", result.count());
//! }
//! ```

pub mod address;
pub mod client;
pub mod cluster;
pub mod error;
pub mod executor;
pub mod observer;
pub mod query;
pub mod response;
pub mod schema;
pub mod types;

pub use address::Address;
pub use client::{Client, ClientBuilder, Ensured};
pub use cluster::Cluster;
pub use error::{Error, ResourceKind, Result};
pub use executor::{ExecuteError, HttpExecutor, ReqwestExecutor};
pub use observer::{ClientObserver, NoopObserver, TracingObserver};
pub use query::{BatchQuery, PqlQuery, RawQuery};
pub use response::{
    AttributeValue, Attributes, BitmapResult, CountResultItem, ProfileItem, QueryResponse,
    QueryResult,
};
pub use schema::{Database, Frame};
pub use types::{HttpRequest, HttpResponse, Method};
