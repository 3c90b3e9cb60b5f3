//! Explorer session state.
//!
//! A [`Session`] owns everything the explorer knows about the current
//! service and layer. Front ends send it [`Command`]s; a command may yield an
//! [`Effect`] (a network call) whose [`Response`] is fed back through
//! [`Session::apply`]. Every effect carries a ticket, and responses whose
//! ticket is no longer pending are dropped, so a slow response can never
//! overwrite a newer selection.

use crate::core::client::ServiceClient;
use crate::core::models::{
    FeatureCollection, FieldDescriptor, LayerDetail, QueryOptions, ServiceDescriptor,
    clamp_record_count, parse_finite,
};
use crate::core::url::{layer_url, strip_query};
use crate::error::{RequestError, where_clause_hint};

/// Service loaded when nothing else is configured.
pub const DEFAULT_SERVICE_URL: &str =
    "https://sampleserver6.arcgisonline.com/arcgis/rest/services/Census/MapServer";

/// Severity of the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

/// The one-line status shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub message: String,
}

impl Status {
    fn info(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            message: message.into(),
        }
    }

    fn success(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            message: message.into(),
        }
    }
}

/// User intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace the service URL input without loading it.
    EditServiceUrl(String),
    LoadService {
        url: String,
    },
    SelectLayer {
        id: i64,
        name: Option<String>,
    },
    SetFieldFilter(String),
    SetPreviewWhere(String),
    SetPreviewRecordCount(String),
    PreviewRecords,
    ShowLayerUrl,
    Clear,
}

/// A network call requested by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchService {
        ticket: u64,
        url: String,
    },
    FetchLayer {
        ticket: u64,
        service_url: String,
        layer_id: i64,
        name: String,
    },
    FetchPreview {
        ticket: u64,
        service_url: String,
        layer_id: i64,
        options: QueryOptions,
    },
}

/// Outcome of an [`Effect`].
#[derive(Debug, Clone)]
pub enum Response {
    ServiceLoaded {
        ticket: u64,
        url: String,
        result: Result<ServiceDescriptor, RequestError>,
    },
    LayerLoaded {
        ticket: u64,
        layer_id: i64,
        name: String,
        result: Result<LayerDetail, RequestError>,
    },
    PreviewLoaded {
        ticket: u64,
        result: Result<FeatureCollection, RequestError>,
    },
}

impl Effect {
    /// Perform the network call.
    pub async fn run(self, client: &ServiceClient) -> Response {
        match self {
            Self::FetchService { ticket, url } => {
                let result = client.fetch_service(&url).await;
                Response::ServiceLoaded {
                    ticket,
                    url,
                    result,
                }
            }
            Self::FetchLayer {
                ticket,
                service_url,
                layer_id,
                name,
            } => {
                let result = client.fetch_layer(&service_url, layer_id).await;
                Response::LayerLoaded {
                    ticket,
                    layer_id,
                    name,
                    result,
                }
            }
            Self::FetchPreview {
                ticket,
                service_url,
                layer_id,
                options,
            } => {
                let result = client
                    .fetch_layer_preview(&service_url, layer_id, &options)
                    .await;
                Response::PreviewLoaded { ticket, result }
            }
        }
    }
}

/// Pending tickets, one slot per kind of request.
#[derive(Debug, Clone, Copy, Default)]
struct InFlight {
    service: Option<u64>,
    layer: Option<u64>,
    preview: Option<u64>,
}

/// Explorer state for one service at a time.
#[derive(Debug, Clone)]
pub struct Session {
    default_service_url: String,
    preview_defaults: QueryOptions,

    service_url_input: String,
    service_url: Option<String>,
    service: Option<ServiceDescriptor>,

    selected_layer: Option<i64>,
    selected_label: Option<String>,
    layer: Option<LayerDetail>,
    layer_url: Option<String>,

    field_filter: String,
    preview_where: String,
    preview_record_count: u32,
    preview: Option<FeatureCollection>,

    status: Option<Status>,
    in_flight: InFlight,
    next_ticket: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_URL, QueryOptions::default())
    }
}

impl Session {
    /// Create a session whose URL input starts at `default_service_url`.
    ///
    /// `preview_defaults` are restored whenever a layer is selected.
    #[must_use]
    pub fn new(default_service_url: &str, preview_defaults: QueryOptions) -> Self {
        Self {
            default_service_url: default_service_url.to_string(),
            service_url_input: default_service_url.to_string(),
            service_url: None,
            service: None,
            selected_layer: None,
            selected_label: None,
            layer: None,
            layer_url: None,
            field_filter: String::new(),
            preview_where: preview_defaults.where_clause().to_string(),
            preview_record_count: preview_defaults.record_count(),
            preview: None,
            status: None,
            in_flight: InFlight::default(),
            next_ticket: 0,
            preview_defaults,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn service_url_input(&self) -> &str {
        &self.service_url_input
    }

    /// URL of the loaded service, query stripped.
    #[must_use]
    pub fn service_url(&self) -> Option<&str> {
        self.service_url.as_deref()
    }

    #[must_use]
    pub const fn service(&self) -> Option<&ServiceDescriptor> {
        self.service.as_ref()
    }

    #[must_use]
    pub const fn selected_layer(&self) -> Option<i64> {
        self.selected_layer
    }

    #[must_use]
    pub fn selected_label(&self) -> Option<&str> {
        self.selected_label.as_deref()
    }

    #[must_use]
    pub const fn layer(&self) -> Option<&LayerDetail> {
        self.layer.as_ref()
    }

    #[must_use]
    pub fn layer_url(&self) -> Option<&str> {
        self.layer_url.as_deref()
    }

    #[must_use]
    pub fn field_filter(&self) -> &str {
        &self.field_filter
    }

    #[must_use]
    pub fn preview_where(&self) -> &str {
        &self.preview_where
    }

    #[must_use]
    pub const fn preview_record_count(&self) -> u32 {
        self.preview_record_count
    }

    #[must_use]
    pub const fn preview(&self) -> Option<&FeatureCollection> {
        self.preview.as_ref()
    }

    #[must_use]
    pub const fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    /// Whether a service load is awaiting its response.
    #[must_use]
    pub const fn is_loading_service(&self) -> bool {
        self.in_flight.service.is_some()
    }

    /// Whether any request is awaiting its response.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.in_flight.service.is_some()
            || self.in_flight.layer.is_some()
            || self.in_flight.preview.is_some()
    }

    /// Fields of the loaded layer matching the current filter.
    #[must_use]
    pub fn filtered_fields(&self) -> Vec<&FieldDescriptor> {
        self.layer
            .as_ref()
            .map_or_else(Vec::new, |layer| layer.filter_fields(&self.field_filter))
    }

    /// Options the next preview would be sent with.
    #[must_use]
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::new(&self.preview_where, f64::from(self.preview_record_count))
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    fn ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    fn reset_preview_controls(&mut self) {
        self.field_filter.clear();
        self.preview_where = self.preview_defaults.where_clause().to_string();
        self.preview_record_count = self.preview_defaults.record_count();
        self.preview = None;
    }

    fn reset_selection(&mut self) {
        self.service_url = None;
        self.service = None;
        self.selected_layer = None;
        self.selected_label = None;
        self.layer = None;
        self.layer_url = None;
        self.reset_preview_controls();
        self.in_flight = InFlight::default();
    }

    /// Apply a command, returning the network call it needs, if any.
    pub fn handle(&mut self, command: Command) -> Option<Effect> {
        tracing::trace!(?command, "Handling command");
        match command {
            Command::EditServiceUrl(url) => {
                self.service_url_input = url;
                None
            }
            Command::LoadService { url } => self.load_service(url),
            Command::SelectLayer { id, name } => self.select_layer(id, name),
            Command::SetFieldFilter(text) => {
                if self.layer.is_some() {
                    self.field_filter = text;
                }
                None
            }
            Command::SetPreviewWhere(text) => {
                if self.layer.is_some() {
                    self.preview_where = text;
                }
                None
            }
            Command::SetPreviewRecordCount(text) => {
                if self.layer.is_some()
                    && let Some(count) = parse_finite(&text)
                {
                    self.preview_record_count = clamp_record_count(count);
                }
                None
            }
            Command::PreviewRecords => self.preview_records(),
            Command::ShowLayerUrl => {
                self.status = Some(match &self.layer_url {
                    Some(url) => Status::success(format!("Layer URL: {url}")),
                    None => Status::error("No layer URL available to copy."),
                });
                None
            }
            Command::Clear => {
                if self.is_loading_service() {
                    tracing::debug!("Clear ignored while a service load is in flight");
                    return None;
                }
                self.reset_selection();
                self.service_url_input.clone_from(&self.default_service_url);
                self.status = None;
                None
            }
        }
    }

    fn load_service(&mut self, url: String) -> Option<Effect> {
        let trimmed = url.trim().to_string();
        self.service_url_input = url;
        if trimmed.is_empty() {
            self.status = Some(Status::error("Please paste a Feature Service URL first."));
            return None;
        }

        self.reset_selection();
        self.status = Some(Status::info("Loading service metadata..."));
        let ticket = self.ticket();
        self.in_flight.service = Some(ticket);
        Some(Effect::FetchService {
            ticket,
            url: trimmed,
        })
    }

    fn select_layer(&mut self, id: i64, name: Option<String>) -> Option<Effect> {
        let service_url = self.service_url.clone()?;

        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Layer {id}"));

        self.selected_layer = Some(id);
        self.selected_label = Some(name.clone());
        self.layer = None;
        self.layer_url = None;
        self.reset_preview_controls();
        self.in_flight.preview = None;
        self.status = Some(Status::info(format!("Loading details for {name}...")));

        let ticket = self.ticket();
        self.in_flight.layer = Some(ticket);
        Some(Effect::FetchLayer {
            ticket,
            service_url,
            layer_id: id,
            name,
        })
    }

    fn preview_records(&mut self) -> Option<Effect> {
        let (Some(service_url), Some(layer_id)) = (self.service_url.clone(), self.selected_layer)
        else {
            self.status = Some(Status::error("Select a layer before previewing records."));
            return None;
        };

        self.status = Some(Status::info("Loading preview records..."));
        let ticket = self.ticket();
        self.in_flight.preview = Some(ticket);
        Some(Effect::FetchPreview {
            ticket,
            service_url,
            layer_id,
            options: self.query_options(),
        })
    }

    // -------------------------------------------------------------------------
    // Responses
    // -------------------------------------------------------------------------

    /// Apply a response. Returns `false` when it was stale and dropped.
    pub fn apply(&mut self, response: Response) -> bool {
        match response {
            Response::ServiceLoaded {
                ticket,
                url,
                result,
            } => {
                if self.in_flight.service != Some(ticket) {
                    tracing::debug!(ticket, "Dropping stale service response");
                    return false;
                }
                self.in_flight.service = None;
                match result {
                    Ok(service) => {
                        tracing::info!(
                            url = %url,
                            layers = service.layers.len(),
                            tables = service.tables.len(),
                            "Service loaded"
                        );
                        self.service_url = Some(strip_query(&url));
                        self.service = Some(service);
                        self.status = Some(Status::success("Service loaded successfully."));
                    }
                    Err(e) => {
                        self.service_url = None;
                        self.service = None;
                        self.status = Some(Status::error(e.to_string()));
                    }
                }
            }
            Response::LayerLoaded {
                ticket,
                layer_id,
                name,
                result,
            } => {
                if self.in_flight.layer != Some(ticket) || self.selected_layer != Some(layer_id) {
                    tracing::debug!(ticket, layer_id, "Dropping stale layer response");
                    return false;
                }
                self.in_flight.layer = None;
                match result {
                    Ok(layer) => {
                        let service_url = self.service_url.as_deref().unwrap_or_default();
                        self.layer_url = Some(layer_url(service_url, layer_id));
                        self.layer = Some(layer);
                        self.reset_preview_controls();
                        self.status = Some(Status::success(format!("Loaded details for {name}.")));
                    }
                    Err(e) => {
                        self.status = Some(Status::error(e.to_string()));
                    }
                }
            }
            Response::PreviewLoaded { ticket, result } => {
                if self.in_flight.preview != Some(ticket) {
                    tracing::debug!(ticket, "Dropping stale preview response");
                    return false;
                }
                self.in_flight.preview = None;
                match result {
                    Ok(collection) => {
                        self.preview = Some(collection);
                        self.status = Some(Status::success("Preview records loaded."));
                    }
                    Err(e) => {
                        self.preview = None;
                        let message = e.to_string();
                        let hint = where_clause_hint(&message).unwrap_or_default();
                        self.status = Some(Status::error(format!("{message}{hint}")));
                    }
                }
            }
        }
        true
    }

    /// Handle a command and, if it needs the network, run and apply it.
    pub async fn dispatch(&mut self, client: &ServiceClient, command: Command) {
        if let Some(effect) = self.handle(command) {
            let response = effect.run(client).await;
            self.apply(response);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{FieldDescriptor, LayerSummary};

    fn census() -> ServiceDescriptor {
        ServiceDescriptor {
            map_name: Some("Census".to_string()),
            layers: vec![LayerSummary {
                id: 3,
                name: "states".to_string(),
            }],
            ..ServiceDescriptor::default()
        }
    }

    fn states() -> LayerDetail {
        LayerDetail {
            id: Some(3),
            name: Some("states".to_string()),
            fields: vec![
                FieldDescriptor {
                    name: "STATE_NAME".to_string(),
                    alias: "State".to_string(),
                    field_type: "esriFieldTypeString".to_string(),
                },
                FieldDescriptor {
                    name: "POP2000".to_string(),
                    alias: "Population".to_string(),
                    field_type: "esriFieldTypeInteger".to_string(),
                },
            ],
            ..LayerDetail::default()
        }
    }

    fn loaded_service() -> Session {
        let mut session = Session::default();
        let Some(Effect::FetchService { ticket, url }) = session.handle(Command::LoadService {
            url: "https://x/MapServer/?f=json".to_string(),
        }) else {
            panic!("expected service fetch");
        };
        assert!(session.apply(Response::ServiceLoaded {
            ticket,
            url,
            result: Ok(census()),
        }));
        session
    }

    fn loaded_layer() -> Session {
        let mut session = loaded_service();
        let Some(Effect::FetchLayer {
            ticket,
            layer_id,
            name,
            ..
        }) = session.handle(Command::SelectLayer {
            id: 3,
            name: Some("states".to_string()),
        })
        else {
            panic!("expected layer fetch");
        };
        assert!(session.apply(Response::LayerLoaded {
            ticket,
            layer_id,
            name,
            result: Ok(states()),
        }));
        session
    }

    #[test]
    fn blank_url_is_rejected() {
        let mut session = Session::default();
        assert!(session.handle(Command::LoadService { url: "  ".to_string() }).is_none());
        let status = session.status().unwrap();
        assert_eq!(status.level, StatusLevel::Error);
        assert_eq!(status.message, "Please paste a Feature Service URL first.");
    }

    #[test]
    fn service_load_strips_query() {
        let session = loaded_service();
        assert_eq!(session.service_url(), Some("https://x/MapServer"));
        assert_eq!(session.status().unwrap().message, "Service loaded successfully.");
        assert!(!session.is_loading_service());
    }

    #[test]
    fn service_failure_clears_service() {
        let mut session = Session::default();
        let Some(Effect::FetchService { ticket, url }) = session.handle(Command::LoadService {
            url: "https://x/MapServer".to_string(),
        }) else {
            panic!("expected service fetch");
        };
        assert_eq!(session.status().unwrap().message, "Loading service metadata...");
        session.apply(Response::ServiceLoaded {
            ticket,
            url,
            result: Err(RequestError::Http {
                status: 404,
                status_text: "Not Found".to_string(),
            }),
        });
        assert!(session.service().is_none());
        assert_eq!(session.status().unwrap().message, "HTTP 404 Not Found");
    }

    #[test]
    fn select_layer_requires_service() {
        let mut session = Session::default();
        assert!(
            session
                .handle(Command::SelectLayer { id: 1, name: None })
                .is_none()
        );
        assert!(session.selected_layer().is_none());
    }

    #[test]
    fn select_layer_defaults_name() {
        let mut session = loaded_service();
        let effect = session.handle(Command::SelectLayer {
            id: 7,
            name: Some(" ".to_string()),
        });
        assert!(matches!(effect, Some(Effect::FetchLayer { ref name, .. }) if name == "Layer 7"));
        assert_eq!(session.status().unwrap().message, "Loading details for Layer 7...");
    }

    #[test]
    fn layer_load_sets_url_and_status() {
        let session = loaded_layer();
        assert_eq!(session.layer_url(), Some("https://x/MapServer/3"));
        assert_eq!(session.status().unwrap().message, "Loaded details for states.");
        assert_eq!(session.preview_where(), "1=1");
        assert_eq!(session.preview_record_count(), 5);
    }

    #[test]
    fn stale_layer_response_is_dropped() {
        let mut session = loaded_service();
        let Some(Effect::FetchLayer { ticket: first, .. }) =
            session.handle(Command::SelectLayer { id: 3, name: None })
        else {
            panic!("expected layer fetch");
        };
        let _ = session.handle(Command::SelectLayer { id: 4, name: None });

        let applied = session.apply(Response::LayerLoaded {
            ticket: first,
            layer_id: 3,
            name: "Layer 3".to_string(),
            result: Ok(states()),
        });
        assert!(!applied);
        assert!(session.layer().is_none());
        assert_eq!(session.selected_layer(), Some(4));
    }

    #[test]
    fn edits_ignored_without_layer() {
        let mut session = loaded_service();
        session.handle(Command::SetFieldFilter("pop".to_string()));
        session.handle(Command::SetPreviewWhere("x".to_string()));
        session.handle(Command::SetPreviewRecordCount("50".to_string()));
        assert_eq!(session.field_filter(), "");
        assert_eq!(session.preview_where(), "1=1");
        assert_eq!(session.preview_record_count(), 5);
    }

    #[test]
    fn field_filter_narrows_fields() {
        let mut session = loaded_layer();
        session.handle(Command::SetFieldFilter("  POPUL".to_string()));
        let fields = session.filtered_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "POP2000");
    }

    #[test]
    fn record_count_text_is_clamped_or_kept() {
        let mut session = loaded_layer();
        session.handle(Command::SetPreviewRecordCount("250".to_string()));
        assert_eq!(session.preview_record_count(), 100);
        session.handle(Command::SetPreviewRecordCount("abc".to_string()));
        assert_eq!(session.preview_record_count(), 100);
        session.handle(Command::SetPreviewRecordCount("2.9".to_string()));
        assert_eq!(session.preview_record_count(), 2);
        session.handle(Command::SetPreviewRecordCount("-4".to_string()));
        assert_eq!(session.preview_record_count(), 1);
    }

    #[test]
    fn preview_requires_layer() {
        let mut session = loaded_service();
        assert!(session.handle(Command::PreviewRecords).is_none());
        assert_eq!(
            session.status().unwrap().message,
            "Select a layer before previewing records."
        );
    }

    #[test]
    fn preview_effect_carries_current_options() {
        let mut session = loaded_layer();
        session.handle(Command::SetPreviewWhere("  ".to_string()));
        session.handle(Command::SetPreviewRecordCount("12".to_string()));
        let Some(Effect::FetchPreview { options, layer_id, .. }) =
            session.handle(Command::PreviewRecords)
        else {
            panic!("expected preview fetch");
        };
        assert_eq!(layer_id, 3);
        assert_eq!(options.where_clause(), "1=1");
        assert_eq!(options.record_count(), 12);
        assert_eq!(session.status().unwrap().message, "Loading preview records...");
    }

    #[test]
    fn preview_failure_adds_where_hint() {
        let mut session = loaded_layer();
        let Some(Effect::FetchPreview { ticket, .. }) = session.handle(Command::PreviewRecords)
        else {
            panic!("expected preview fetch");
        };
        session.apply(Response::PreviewLoaded {
            ticket,
            result: Err(RequestError::Api {
                message: "Invalid field".to_string(),
                code: Some("400".to_string()),
                details: Vec::new(),
            }),
        });
        assert_eq!(
            session.status().unwrap().message,
            "Invalid field (code 400). Check your WHERE clause syntax (field names, quotes, and operators)."
        );
    }

    #[test]
    fn preview_timeout_has_no_hint() {
        let mut session = loaded_layer();
        let Some(Effect::FetchPreview { ticket, .. }) = session.handle(Command::PreviewRecords)
        else {
            panic!("expected preview fetch");
        };
        session.apply(Response::PreviewLoaded {
            ticket,
            result: Err(RequestError::Timeout { timeout_ms: 15_000 }),
        });
        assert_eq!(session.status().unwrap().message, "Request timed out after 15000 ms");
    }

    #[test]
    fn show_layer_url() {
        let mut session = Session::default();
        session.handle(Command::ShowLayerUrl);
        assert_eq!(
            session.status().unwrap().message,
            "No layer URL available to copy."
        );

        let mut session = loaded_layer();
        session.handle(Command::ShowLayerUrl);
        let status = session.status().unwrap();
        assert_eq!(status.level, StatusLevel::Success);
        assert_eq!(status.message, "Layer URL: https://x/MapServer/3");
    }

    #[test]
    fn clear_ignored_while_loading() {
        let mut session = Session::default();
        session.handle(Command::LoadService {
            url: "https://other/MapServer".to_string(),
        });
        session.handle(Command::Clear);
        assert!(session.is_loading_service());
        assert_eq!(session.service_url_input(), "https://other/MapServer");
    }

    #[test]
    fn clear_resets_everything() {
        let mut session = loaded_layer();
        session.handle(Command::EditServiceUrl("https://other".to_string()));
        session.handle(Command::Clear);
        assert!(session.service().is_none());
        assert!(session.layer().is_none());
        assert!(session.status().is_none());
        assert_eq!(session.service_url_input(), DEFAULT_SERVICE_URL);
    }

    #[test]
    fn new_service_load_drops_pending_preview() {
        let mut session = loaded_layer();
        let Some(Effect::FetchPreview { ticket, .. }) = session.handle(Command::PreviewRecords)
        else {
            panic!("expected preview fetch");
        };
        session.handle(Command::LoadService {
            url: "https://x/MapServer".to_string(),
        });
        assert!(!session.apply(Response::PreviewLoaded {
            ticket,
            result: Ok(FeatureCollection::default()),
        }));
        assert!(session.preview().is_none());
    }
}
