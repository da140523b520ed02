use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::address::Address;
use crate::cluster::Cluster;
use crate::error::{Error, ResourceKind, Result};
use crate::executor::{ExecuteError, HttpExecutor, ReqwestExecutor};
use crate::observer::{ClientObserver, TracingObserver};
use crate::query::PqlQuery;
use crate::response::QueryResponse;
use crate::schema::{Database, Frame};
use crate::types::{HttpRequest, HttpResponse, Method};

pub const ACCEPT: &str = "application/vnd.pilosa.json.v1";
pub const CONTENT_TYPE: &str = "application/vnd.pilosa.pql.v1";
pub const USER_AGENT: &str = concat!("pilosa-driver/", env!("CARGO_PKG_VERSION"));

const DATABASE_EXISTS: &str = "database already exists\n";
const FRAME_EXISTS: &str = "frame already exists\n";

/// Outcome of an `ensure_*` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ensured {
    Created,
    AlreadyExisted,
}

/// Blocking client for a Pilosa cluster.
///
/// Every request takes the next host from the cluster's rotation. A host
/// that cannot be reached is removed from the cluster and the
/// error is returned; the call is not retried, but the next call goes to a
/// different host. Removed hosts come back only through [`Client::add_host`].
///
/// The cluster is locked once per pool operation, never across a round trip,
/// so a `Client` can be shared between threads.
///
/// # Example
///
/// ```ignore
/// use pilosa_client::{Client, Database, PqlQuery};
///
/// let client = Client::with_address("http://localhost:10101")?;
/// let db = Database::new("repository");
/// client.ensure_database(&db)?;
/// client.ensure_frame(&db.frame("stargazer"))?;
///
/// let response = client.query(&db.raw_query("TopN(frame=\"stargazer\", n=5)"))?;
/// for item in response.result().map(|r| r.count_items()).unwrap_or_default() {
///     println!("{}: {}", item.id, item.count);
/// }
/// ```
pub struct Client {
    cluster: Mutex<Cluster>,
    executor: Box<dyn HttpExecutor>,
    observer: Arc<dyn ClientObserver>,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Client over the given cluster. An empty cluster gets the default address.
    pub fn new(cluster: Cluster) -> Result<Self> {
        ClientBuilder::new().cluster(cluster).build()
    }

    /// Client over a single host given in textual form, e.g. `:10101`.
    pub fn with_address(address: &str) -> Result<Self> {
        ClientBuilder::new().host(Address::parse(address)?).build()
    }

    /// Client for `http://localhost:10101`.
    pub fn localhost() -> Result<Self> {
        ClientBuilder::new().build()
    }

    /// Run a query and decode the response.
    pub fn query<Q: PqlQuery + ?Sized>(&self, query: &Q) -> Result<QueryResponse> {
        self.run_query(query, false)
    }

    /// Run a query and also return the profiles of the columns involved.
    pub fn query_with_profiles<Q: PqlQuery + ?Sized>(&self, query: &Q) -> Result<QueryResponse> {
        self.run_query(query, true)
    }

    pub fn create_database(&self, database: &Database) -> Result<()> {
        self.schema_request(Method::POST, "/db", database.request_body())
    }

    pub fn delete_database(&self, database: &Database) -> Result<()> {
        self.schema_request(Method::DELETE, "/db", database.request_body())
    }

    pub fn create_frame(&self, frame: &Frame) -> Result<()> {
        self.schema_request(Method::POST, "/frame", frame.request_body())
    }

    pub fn delete_frame(&self, frame: &Frame) -> Result<()> {
        self.schema_request(Method::DELETE, "/frame", frame.request_body())
    }

    /// Create the database unless it already exists.
    pub fn ensure_database(&self, database: &Database) -> Result<Ensured> {
        ensured(self.create_database(database), ResourceKind::Database)
    }

    /// Create the frame unless it already exists.
    pub fn ensure_frame(&self, frame: &Frame) -> Result<Ensured> {
        ensured(self.create_frame(frame), ResourceKind::Frame)
    }

    /// Put a host (back) into rotation.
    pub fn add_host(&self, address: Address) {
        self.cluster().add_host(address);
    }

    pub fn remove_host(&self, address: &Address) -> Result<()> {
        self.cluster().remove_host(address)
    }

    /// Snapshot of the hosts currently in rotation.
    pub fn hosts(&self) -> Vec<Address> {
        self.cluster().hosts().to_vec()
    }

    fn cluster(&self) -> MutexGuard<'_, Cluster> {
        self.cluster.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_query<Q: PqlQuery + ?Sized>(&self, query: &Q, profiles: bool) -> Result<QueryResponse> {
        let mut params = vec![("db", query.database_name())];
        if profiles {
            params.push(("profiles", "true"));
        }

        let response = self.http_request(Method::POST, "/query", &params, query.serialize())?;

        // the server reports query failures as JSON on any status
        match serde_json::from_str::<Value>(&response.body) {
            Ok(value) => QueryResponse::from_value(value),
            Err(err) if response.is_success() => Err(err.into()),
            Err(_) => Err(Error::Server {
                status: response.status,
                body: response.body,
            }),
        }
    }

    fn schema_request(&self, method: Method, path: &str, body: String) -> Result<()> {
        let response = self.http_request(method, path, &[], body)?;
        if response.is_success() {
            return Ok(());
        }

        match conflict_kind(&response.body) {
            Some(kind) => Err(Error::AlreadyExists { kind }),
            None => Err(Error::Server {
                status: response.status,
                body: response.body,
            }),
        }
    }

    /// Send one request to the next host in rotation.
    fn http_request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: String,
    ) -> Result<HttpResponse> {
        let host = self.cluster().next_host()?;

        let mut url = Url::parse(&host.normalize())?;
        url.set_path(path);
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }

        let request = HttpRequest::new(method, url.as_str())
            .with_header("Accept", ACCEPT)
            .with_header("Content-Type", CONTENT_TYPE)
            .with_header("User-Agent", USER_AGENT)
            .with_body(body);

        self.observer
            .request_sent(&host, method, &url[url::Position::BeforePath..]);

        match self.executor.execute(&request) {
            Ok(response) => {
                self.observer.response_received(&host, response.status);
                Ok(response)
            }
            Err(ExecuteError::Unreachable(message)) => {
                self.evict(&host, &message);
                Err(Error::ServiceUnavailable { host, message })
            }
            Err(ExecuteError::Request(err)) => Err(Error::Http(err)),
        }
    }

    /// Drop the host that just failed from the rotation.
    fn evict(&self, host: &Address, reason: &str) {
        let removed = self.cluster().remove_host(host);
        match removed {
            Ok(()) => self.observer.host_removed(host, reason),
            Err(_) => self.observer.host_already_removed(host),
        }
    }
}

/// Conflict bodies are matched verbatim, trailing newline included.
fn conflict_kind(body: &str) -> Option<ResourceKind> {
    match body {
        DATABASE_EXISTS => Some(ResourceKind::Database),
        FRAME_EXISTS => Some(ResourceKind::Frame),
        _ => None,
    }
}

fn ensured(result: Result<()>, kind: ResourceKind) -> Result<Ensured> {
    match result {
        Ok(()) => Ok(Ensured::Created),
        Err(err) if err.is_already_exists(kind) => Ok(Ensured::AlreadyExisted),
        Err(err) => Err(err),
    }
}

/// Configures a [`Client`].
pub struct ClientBuilder {
    cluster: Cluster,
    executor: Option<Box<dyn HttpExecutor>>,
    observer: Arc<dyn ClientObserver>,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            cluster: Cluster::new(),
            executor: None,
            observer: Arc::new(TracingObserver),
            timeout: None,
        }
    }

    /// Replace the hosts with `cluster`.
    pub fn cluster(mut self, cluster: Cluster) -> Self {
        self.cluster = cluster;
        self
    }

    /// Append a host to the rotation.
    pub fn host(mut self, address: Address) -> Self {
        self.cluster.add_host(address);
        self
    }

    /// Send requests through `executor` instead of reqwest.
    pub fn executor(mut self, executor: impl HttpExecutor + 'static) -> Self {
        self.executor = Some(Box::new(executor));
        self
    }

    pub fn observer(mut self, observer: Arc<dyn ClientObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Request timeout for the default executor. Ignored with a custom executor.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Client> {
        let mut cluster = self.cluster;
        if cluster.is_empty() {
            cluster.add_host(Address::default());
        }

        let executor = match self.executor {
            Some(executor) => executor,
            None => match self.timeout {
                Some(timeout) => Box::new(ReqwestExecutor::with_timeout(timeout)?),
                None => Box::new(ReqwestExecutor::new()?),
            },
        };

        Ok(Client {
            cluster: Mutex::new(cluster),
            executor,
            observer: self.observer,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::mock::MockExecutor;
    use crate::observer::recording::RecordingObserver;
    use crate::observer::NoopObserver;
    use crate::response::QueryResult;
    use serde_json::json;

    fn host(name: &str) -> Address {
        Address::new("http", name, 10101)
    }

    fn client(executor: &MockExecutor, hosts: &[&str]) -> Client {
        Client::builder()
            .cluster(Cluster::with_hosts(hosts.iter().map(|name| host(name))))
            .executor(executor.clone())
            .observer(Arc::new(NoopObserver))
            .build()
            .unwrap()
    }

    fn ok_query() -> MockExecutor {
        MockExecutor::new().with_response(
            "/query",
            MockExecutor::success_response(json!({"results": [1]})),
        )
    }

    #[test]
    fn query_posts_pql_with_headers() {
        let executor = ok_query();
        let client = client(&executor, &["a"]);
        let db = Database::new("sample");

        let response = client.query(&db.raw_query("Count(Bitmap(id=1, frame=\"f\"))")).unwrap();
        assert_eq!(response.result(), Some(&QueryResult::Count(1)));

        let request = &executor.recorded_requests()[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url, "http://a:10101/query?db=sample");
        assert_eq!(request.body.as_deref(), Some("Count(Bitmap(id=1, frame=\"f\"))"));
        assert_eq!(request.headers["Accept"], ACCEPT);
        assert_eq!(request.headers["Content-Type"], CONTENT_TYPE);
        assert!(request.headers["User-Agent"].starts_with("pilosa-driver/"));
    }

    #[test]
    fn query_with_profiles_sets_flag() {
        let executor = ok_query();
        let client = client(&executor, &["a"]);

        client
            .query_with_profiles(&Database::new("sample").raw_query("Bitmap(id=1)"))
            .unwrap();

        assert_eq!(
            executor.recorded_requests()[0].url,
            "http://a:10101/query?db=sample&profiles=true"
        );
    }

    #[test]
    fn scheme_suffix_is_stripped_from_request_url() {
        let executor = ok_query();
        let client = Client::builder()
            .host(Address::new("http+tls", "a", 9999))
            .executor(executor.clone())
            .observer(Arc::new(NoopObserver))
            .build()
            .unwrap();

        client.query(&Database::new("d").raw_query("Count()")).unwrap();
        assert_eq!(executor.recorded_requests()[0].url, "http://a:9999/query?db=d");
    }

    #[test]
    fn requests_rotate_across_hosts() {
        let executor = ok_query();
        let client = client(&executor, &["a", "b", "c"]);
        let query = Database::new("d").raw_query("Count()");

        for _ in 0..4 {
            client.query(&query).unwrap();
        }

        assert_eq!(
            executor.recorded_authorities(),
            vec!["a:10101", "b:10101", "c:10101", "a:10101"]
        );
    }

    #[test]
    fn transport_failure_removes_the_failed_host() {
        let executor = ok_query().unreachable("b:10101");
        let client = client(&executor, &["a", "b", "c"]);
        let query = Database::new("d").raw_query("Count()");

        client.query(&query).unwrap();
        let err = client.query(&query).unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable { ref host, .. } if *host == self::host("b")));

        // "a" served the first request and must stay in rotation
        assert_eq!(client.hosts(), vec![host("a"), host("c")]);

        for _ in 0..4 {
            client.query(&query).unwrap();
        }
        let authorities = executor.recorded_authorities();
        assert_eq!(authorities.iter().filter(|a| *a == "b:10101").count(), 1);
    }

    #[test]
    fn failing_every_host_exhausts_the_cluster() {
        let executor = MockExecutor::new().unreachable("a:10101");
        let client = client(&executor, &["a"]);
        let query = Database::new("d").raw_query("Count()");

        assert!(matches!(
            client.query(&query),
            Err(Error::ServiceUnavailable { .. })
        ));
        assert!(matches!(client.query(&query), Err(Error::NoAvailableHost)));

        client.add_host(host("a"));
        assert_eq!(client.hosts(), vec![host("a")]);
    }

    #[test]
    fn request_errors_keep_the_host_in_rotation() {
        let observer = Arc::new(RecordingObserver::default());
        let executor = ok_query().malformed("a:10101");
        let client = Client::builder()
            .cluster(Cluster::with_hosts([host("a"), host("b")]))
            .executor(executor.clone())
            .observer(observer.clone())
            .build()
            .unwrap();
        let query = Database::new("d").raw_query("Count()");

        let err = client.query(&query).unwrap_err();
        assert!(matches!(err, Error::Http(ref e) if e.is_builder()), "{:?}", err);
        assert_eq!(client.hosts(), vec![host("a"), host("b")]);
        assert!(!observer.events().iter().any(|event| event.starts_with("removed")));

        client.query(&query).unwrap();
        assert!(client.query(&query).is_err());
        assert_eq!(
            executor.recorded_authorities(),
            vec!["a:10101", "b:10101", "a:10101"]
        );
    }

    #[test]
    fn host_removed_elsewhere_still_reports_unavailable() {
        let observer = Arc::new(RecordingObserver::default());
        let executor = MockExecutor::new().unreachable("a:10101");
        let client = Client::builder()
            .host(host("a"))
            .executor(executor)
            .observer(observer.clone())
            .build()
            .unwrap();

        // a concurrent caller removing "a" between selection and failure
        // is simulated by evicting directly
        client.evict(&host("b"), "gone");
        assert_eq!(observer.events(), vec!["missing http://b:10101"]);

        assert!(matches!(
            client.query(&Database::new("d").raw_query("Count()")),
            Err(Error::ServiceUnavailable { .. })
        ));
        assert_eq!(
            observer.events()[1..].to_vec(),
            vec!["send POST http://a:10101/query?db=d", "removed http://a:10101"]
        );
    }

    #[test]
    fn query_error_key_wins_over_status() {
        for status in [200, 400, 500] {
            let executor = MockExecutor::new().with_response(
                "/query",
                MockExecutor::text_response(status, r#"{"error":"parse error at col_id"}"#),
            );
            let client = client(&executor, &["a"]);
            let err = client
                .query(&Database::new("d").raw_query("SetBit(id=5, col_id:=10)"))
                .unwrap_err();
            assert!(
                matches!(err, Error::Query { ref message } if message == "parse error at col_id"),
                "status {}: {:?}",
                status,
                err
            );
        }
    }

    #[test]
    fn query_non_json_failure_is_server_error() {
        let executor = MockExecutor::new()
            .with_response("/query", MockExecutor::text_response(500, "internal error\n"));
        let client = client(&executor, &["a"]);

        let err = client.query(&Database::new("d").raw_query("Count()")).unwrap_err();
        assert!(matches!(
            err,
            Error::Server { status: 500, ref body } if body == "internal error\n"
        ));
    }

    #[test]
    fn query_json_results_decode_on_failure_status() {
        let executor = MockExecutor::new()
            .with_response("/query", MockExecutor::text_response(500, r#"{"results":[1]}"#));
        let client = client(&executor, &["a"]);

        let response = client.query(&Database::new("d").raw_query("Count()")).unwrap();
        assert_eq!(response.results, vec![QueryResult::Count(1)]);
    }

    #[test]
    fn query_garbage_on_success_is_json_error() {
        let executor = MockExecutor::new()
            .with_response("/query", MockExecutor::text_response(200, "<html>"));
        let client = client(&executor, &["a"]);

        assert!(matches!(
            client.query(&Database::new("d").raw_query("Count()")),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn create_database_sends_options() {
        let executor = MockExecutor::new()
            .with_default_response(MockExecutor::text_response(200, ""));
        let client = client(&executor, &["a"]);
        let db = Database::new("sample").with_column_label("user");

        client.create_database(&db).unwrap();
        client.delete_database(&db).unwrap();

        let requests = executor.recorded_requests();
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[1].method, Method::DELETE);
        for request in &requests {
            assert_eq!(request.url, "http://a:10101/db");
            let body: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
            assert_eq!(body, json!({"db": "sample", "options": {"columnLabel": "user"}}));
        }
    }

    #[test]
    fn create_frame_sends_options() {
        let executor = MockExecutor::new()
            .with_default_response(MockExecutor::text_response(200, ""));
        let client = client(&executor, &["a"]);
        let frame = Database::new("sample").frame("collab").with_row_label("project");

        client.create_frame(&frame).unwrap();
        client.delete_frame(&frame).unwrap();

        let requests = executor.recorded_requests();
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[1].method, Method::DELETE);
        assert_eq!(requests[1].url, "http://a:10101/frame");
        let body: Value = serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({"db": "sample", "frame": "collab", "options": {"rowLabel": "project"}})
        );
    }

    #[test]
    fn conflicts_map_to_already_exists() {
        let executor = MockExecutor::new()
            .with_response("/db", MockExecutor::text_response(409, DATABASE_EXISTS))
            .with_response("/frame", MockExecutor::text_response(409, FRAME_EXISTS));
        let client = client(&executor, &["a"]);
        let db = Database::new("sample");

        assert!(matches!(
            client.create_database(&db),
            Err(Error::AlreadyExists { kind: ResourceKind::Database })
        ));
        assert!(matches!(
            client.create_frame(&db.frame("f")),
            Err(Error::AlreadyExists { kind: ResourceKind::Frame })
        ));
    }

    #[test]
    fn conflict_text_must_match_exactly() {
        let executor = MockExecutor::new()
            .with_response("/db", MockExecutor::text_response(409, "database already exists"));
        let client = client(&executor, &["a"]);

        assert!(matches!(
            client.create_database(&Database::new("sample")),
            Err(Error::Server { status: 409, .. })
        ));
    }

    #[test]
    fn ensure_absorbs_matching_conflict_only() {
        let executor = MockExecutor::new()
            .with_response("/db", MockExecutor::text_response(409, DATABASE_EXISTS))
            .with_response("/frame", MockExecutor::text_response(409, DATABASE_EXISTS));
        let client = client(&executor, &["a"]);
        let db = Database::new("sample");

        assert_eq!(client.ensure_database(&db).unwrap(), Ensured::AlreadyExisted);
        assert!(matches!(
            client.ensure_frame(&db.frame("f")),
            Err(Error::AlreadyExists { kind: ResourceKind::Database })
        ));
    }

    #[test]
    fn ensure_reports_creation_and_propagates_failures() {
        let executor = MockExecutor::new()
            .with_response("/db", MockExecutor::text_response(200, ""))
            .with_response("/frame", MockExecutor::text_response(404, "database not found\n"));
        let client = client(&executor, &["a"]);
        let db = Database::new("sample");

        assert_eq!(client.ensure_database(&db).unwrap(), Ensured::Created);
        assert!(matches!(
            client.ensure_frame(&db.frame("f")),
            Err(Error::Server { status: 404, .. })
        ));
    }

    #[test]
    fn observer_sees_requests_and_responses() {
        let observer = Arc::new(RecordingObserver::default());
        let client = Client::builder()
            .host(host("a"))
            .executor(ok_query())
            .observer(observer.clone())
            .build()
            .unwrap();

        client.query(&Database::new("d").raw_query("Count()")).unwrap();
        assert_eq!(
            observer.events(),
            vec!["send POST http://a:10101/query?db=d", "recv http://a:10101 200"]
        );
    }

    #[test]
    fn builder_defaults_to_localhost() {
        let client = Client::builder().executor(ok_query()).build().unwrap();
        assert_eq!(client.hosts(), vec![Address::default()]);
    }

    #[test]
    fn pool_management_through_client() {
        let client = client(&ok_query(), &["a"]);
        client.add_host(host("b"));
        client.remove_host(&host("a")).unwrap();
        assert_eq!(client.hosts(), vec![host("b")]);
        assert!(matches!(
            client.remove_host(&host("a")),
            Err(Error::HostNotFound { .. })
        ));
    }

    #[test]
    fn client_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Client>();
    }
}
