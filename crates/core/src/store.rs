//! Paginated remote collection.
//!
//! [`ListStore`] caches the last fetched page of one entity type together with its
//! pagination metadata and a loading flag. There is one store per entity type, constructed
//! explicitly and shared by `Arc`; nothing here is a process-wide singleton.
//!
//! ## Fetch algorithm
//! 1. mark the store as loading
//! 2. send the request for the chosen [`ListQuery`]
//! 3. on status 200, replace items and pagination wholesale with the decoded page
//! 4. on anything else, leave items and pagination untouched
//! 5. clear the loading mark whatever happened (an RAII guard, so this also holds if the
//!    future is dropped mid-flight)
//! 6. return the envelope
//!
//! ## Ordering
//! Every fetch is tagged with a sequence number. A response is applied only if its fetch is
//! still the most recently *issued* one; responses to superseded fetches are discarded
//! (their callers still receive the envelope). The displayed list therefore always reflects
//! the latest query, however the responses interleave.
//!
//! ## Mutations
//! - `create` prepends the new record and bumps `total_items`, then trims the list back to
//!   the page size of the last fetch
//! - `update` swaps the matching record in place
//! - `enable`, `disable` and entity status transitions return the envelope and never touch
//!   the cached list; views call [`ListStore::refresh`] when they want it reconciled

use crate::client::{fill_path, ApiClient};
use crate::constants::DEFAULT_PAGE_SIZE;
use crate::envelope::{Envelope, Reply};
use crate::page::{Page, PageRequest};
use crate::query::{DateRange, ListQuery};
use crate::transport::{ApiRequest, HttpMethod};
use clinic_types::RecordId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

/// Status codes a fetch accepts as success.
const FETCH_OK: &[u16] = &[200];
/// Status codes a create accepts as success.
const CREATE_OK: &[u16] = &[200, 201];
/// Status codes an update accepts as success.
const UPDATE_OK: &[u16] = &[200];
/// Returned when an entity has no endpoint for the requested operation.
const UNSUPPORTED_STATUS: u16 = 405;

/// Closed lifecycle status enum of an entity.
pub trait LifecycleStatus: Copy + Eq + Ord + std::fmt::Debug + Send + Sync + 'static {
    /// Every status, in lifecycle order.
    const ALL: &'static [Self];

    /// Wire name, e.g. `SCHEDULED`.
    fn as_wire(self) -> &'static str;

    /// Parse a wire name, ignoring case.
    fn parse_wire(raw: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_wire().eq_ignore_ascii_case(raw.trim()))
    }
}

/// Decode an optional wire enum, treating values outside `parse`'s vocabulary as absent.
///
/// Status vocabularies drift between server releases; an unknown value must not fail the
/// whole record (and with it the whole page).
pub(crate) fn lenient_wire<'de, D, T>(
    deserializer: D,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => {
            let parsed = parse(&text);
            if parsed.is_none() {
                tracing::debug!(value = %text, "unrecognised wire value ignored");
            }
            parsed
        }
        Some(other) => {
            tracing::debug!(value = %other, "non-string wire value ignored");
            None
        }
    })
}

/// `deserialize_with` target for `Option<S>` status fields.
pub(crate) fn lenient_status<'de, D, S>(deserializer: D) -> Result<Option<S>, D::Error>
where
    D: Deserializer<'de>,
    S: LifecycleStatus,
{
    lenient_wire(deserializer, S::parse_wire)
}

/// Method plus path template of one endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Route {
    pub method: HttpMethod,
    pub template: &'static str,
}

impl Route {
    pub const fn new(method: HttpMethod, template: &'static str) -> Self {
        Self { method, template }
    }

    pub fn request(&self, id: &RecordId) -> ApiRequest {
        ApiRequest::new(self.method, fill_path(self.template, id.as_str()))
    }
}

/// Endpoint table of one entity type.
///
/// `None` means the server offers no such operation for this entity.
#[derive(Clone, Copy, Debug)]
pub struct Endpoints {
    /// Plural name used in logs and messages.
    pub name: &'static str,
    pub list: &'static str,
    pub active: Option<&'static str>,
    pub by_status: Option<&'static str>,
    pub range: Option<&'static str>,
    pub search: Option<&'static str>,
    /// Query parameter carrying the search text (`name` or `query`).
    pub search_param: &'static str,
    pub count: Option<&'static str>,
    pub create: Route,
    pub update: Route,
    pub enable: Option<Route>,
    pub disable: Option<Route>,
}

/// An entity type the clinic API manages.
pub trait Resource: DeserializeOwned + Clone + std::fmt::Debug + Send + Sync + 'static {
    type Status: LifecycleStatus;
    /// Body sent to create and update endpoints.
    type Payload: Serialize + DeserializeOwned + Send + Sync;

    const ENDPOINTS: Endpoints;

    fn id(&self) -> &RecordId;
    fn is_active(&self) -> bool;
    fn status(&self) -> Option<Self::Status>;
    /// One-line human label.
    fn label(&self) -> String;
}

/// Cached list state as seen by a view.
#[derive(Clone, Debug)]
pub struct ListState<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    /// Page size of the last applied fetch; 0 before the first one.
    pub page_size: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub loading: bool,
    in_flight: usize,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current_page: 0,
            page_size: 0,
            total_pages: 0,
            total_items: 0,
            loading: false,
            in_flight: 0,
        }
    }
}

/// Marks the store as loading for as long as it lives.
struct LoadingGuard<'a, T> {
    state: &'a watch::Sender<ListState<T>>,
}

impl<'a, T> LoadingGuard<'a, T> {
    fn new(state: &'a watch::Sender<ListState<T>>) -> Self {
        state.send_modify(|s| {
            s.in_flight += 1;
            s.loading = true;
        });
        Self { state }
    }
}

impl<T> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) {
        self.state.send_modify(|s| {
            s.in_flight = s.in_flight.saturating_sub(1);
            s.loading = s.in_flight > 0;
        });
    }
}

pub struct ListStore<R: Resource> {
    client: ApiClient,
    state: watch::Sender<ListState<R>>,
    issued: AtomicU64,
    last_query: Mutex<Option<(ListQuery<R::Status>, PageRequest)>>,
    default_page_size: u32,
}

impl<R: Resource> ListStore<R> {
    pub fn new(client: ApiClient) -> Self {
        let (state, _) = watch::channel(ListState::default());
        Self {
            client,
            state,
            issued: AtomicU64::new(0),
            last_query: Mutex::new(None),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Page size used by [`ListStore::refresh`] before any fetch has set one.
    ///
    /// A size of 0 is ignored.
    pub fn with_page_size(mut self, size: u32) -> Self {
        if size > 0 {
            self.default_page_size = size;
        }
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn endpoints(&self) -> &'static Endpoints {
        &R::ENDPOINTS
    }

    pub fn snapshot(&self) -> ListState<R> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState<R>> {
        self.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Cached record with the given id, if it is on the current page.
    pub fn find(&self, id: &RecordId) -> Option<R> {
        self.state
            .borrow()
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    /// Fetch one page of records selected by `query`.
    pub async fn fetch(&self, query: ListQuery<R::Status>, page: PageRequest) -> Envelope<Page<R>> {
        let endpoints = &R::ENDPOINTS;
        let Some(request) = self.list_request(&query, page) else {
            return self.client.reject(
                UNSUPPORTED_STATUS,
                format!("{} do not support {}", endpoints.name, query.kind()),
            );
        };

        *self
            .last_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some((query, page));
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let _loading = LoadingGuard::new(&self.state);

        let envelope: Envelope<Page<R>> = self.client.send_decoded(request).await;

        if !envelope.has_status(FETCH_OK) {
            return envelope;
        }
        let Some(fetched) = envelope.data.as_ref() else {
            return envelope;
        };

        if self.issued.load(Ordering::SeqCst) != seq {
            tracing::debug!(
                resource = endpoints.name,
                seq,
                "discarding response to superseded fetch"
            );
            return envelope;
        }

        self.state.send_modify(|s| {
            s.items = fetched.content.clone();
            s.current_page = page.page;
            s.page_size = page.size;
            s.total_pages = fetched.total_pages;
            s.total_items = fetched.total_elements;
        });

        envelope
    }

    pub async fn fetch_all(&self, page: PageRequest) -> Envelope<Page<R>> {
        self.fetch(ListQuery::All, page).await
    }

    pub async fn fetch_active(&self, page: PageRequest) -> Envelope<Page<R>> {
        self.fetch(ListQuery::Active, page).await
    }

    pub async fn fetch_by_status(&self, status: R::Status, page: PageRequest) -> Envelope<Page<R>> {
        self.fetch(ListQuery::ByStatus(status), page).await
    }

    pub async fn fetch_by_range(&self, range: DateRange, page: PageRequest) -> Envelope<Page<R>> {
        self.fetch(ListQuery::Range(range), page).await
    }

    /// Search, or list everything when `text` is blank.
    pub async fn search(&self, text: &str, page: PageRequest) -> Envelope<Page<R>> {
        self.fetch(ListQuery::from_search_input(text), page).await
    }

    /// Re-issue the last fetch. Lists everything on the first page if nothing was fetched yet.
    pub async fn refresh(&self) -> Envelope<Page<R>> {
        let last = self
            .last_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let (query, page) =
            last.unwrap_or((ListQuery::All, PageRequest::first(self.default_page_size)));
        self.fetch(query, page).await
    }

    /// Create a record and prepend it to the cached page.
    pub async fn create(&self, payload: &R::Payload) -> Envelope<R> {
        let route = R::ENDPOINTS.create;
        let body = match serde_json::to_value(payload) {
            Ok(body) => body,
            Err(e) => return self.client.reject(400, format!("Invalid payload: {e}")),
        };

        let request = ApiRequest::new(route.method, route.template).json(body);
        let _loading = LoadingGuard::new(&self.state);
        let envelope: Envelope<R> = self.client.send_decoded(request).await;

        if envelope.has_status(CREATE_OK) {
            if let Some(created) = envelope.data.as_ref() {
                self.state.send_modify(|s| {
                    s.items.insert(0, created.clone());
                    s.total_items += 1;
                    if s.page_size > 0 {
                        s.items.truncate(s.page_size as usize);
                    }
                });
            }
        }

        envelope
    }

    /// Update a record and replace its cached copy, if it is on the current page.
    pub async fn update(&self, id: &RecordId, payload: &R::Payload) -> Envelope<R> {
        let body = match serde_json::to_value(payload) {
            Ok(body) => body,
            Err(e) => return self.client.reject(400, format!("Invalid payload: {e}")),
        };

        let request = R::ENDPOINTS.update.request(id).json(body);
        let _loading = LoadingGuard::new(&self.state);
        let envelope: Envelope<R> = self.client.send_decoded(request).await;

        if envelope.has_status(UPDATE_OK) {
            if let Some(updated) = envelope.data.as_ref() {
                self.state.send_modify(|s| {
                    if let Some(slot) = s.items.iter_mut().find(|item| item.id() == id) {
                        *slot = updated.clone();
                    }
                });
            }
        }

        envelope
    }

    pub async fn enable(&self, id: &RecordId) -> Reply {
        self.toggle(R::ENDPOINTS.enable, "enable", id).await
    }

    pub async fn disable(&self, id: &RecordId) -> Reply {
        self.toggle(R::ENDPOINTS.disable, "disable", id).await
    }

    /// Count records, optionally narrowed by status and date range.
    ///
    /// Never touches the cached list.
    pub async fn count(&self, status: Option<R::Status>, range: &DateRange) -> Envelope<u64> {
        let endpoints = &R::ENDPOINTS;
        let Some(path) = endpoints.count else {
            return self.client.reject(
                UNSUPPORTED_STATUS,
                format!("{} do not support counting", endpoints.name),
            );
        };

        let mut request = ApiRequest::get(path).params(range.query_pairs());
        if let Some(status) = status {
            request = request.param("status", status.as_wire());
        }

        self.client.send_decoded(request).await
    }

    /// Fire a transition at `route` for `id`. The cached list is left alone.
    pub(crate) async fn action(
        &self,
        route: Route,
        id: &RecordId,
        body: Option<serde_json::Value>,
    ) -> Reply {
        let mut request = route.request(id);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.client.send(request).await
    }

    async fn toggle(&self, route: Option<Route>, verb: &str, id: &RecordId) -> Reply {
        match route {
            Some(route) => self.action(route, id, None).await,
            None => self.client.reject(
                UNSUPPORTED_STATUS,
                format!("{} cannot be {verb}d", R::ENDPOINTS.name),
            ),
        }
    }

    fn list_request(&self, query: &ListQuery<R::Status>, page: PageRequest) -> Option<ApiRequest> {
        let endpoints = &R::ENDPOINTS;
        let request = match query {
            ListQuery::All => ApiRequest::get(endpoints.list),
            ListQuery::Active => ApiRequest::get(endpoints.active?),
            ListQuery::ByStatus(status) => {
                ApiRequest::get(endpoints.by_status?).param("status", status.as_wire())
            }
            ListQuery::Range(range) => {
                ApiRequest::get(endpoints.range?).params(range.query_pairs())
            }
            ListQuery::Search(text) => {
                ApiRequest::get(endpoints.search?).param(endpoints.search_param, text.as_str())
            }
        };
        Some(request.params(page.query_pairs()))
    }
}
