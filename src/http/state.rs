use std::sync::Arc;

use url::Url;

use crate::client::TracedClient;
use crate::config::ServiceKind;
use crate::instruments::ServiceInstruments;
use crate::store::RecordStore;
use crate::trace::Tracer;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub kind: ServiceKind,
    pub service_name: Arc<str>,
    pub tracer: Tracer,
    pub instruments: Arc<ServiceInstruments>,
    pub store: Arc<dyn RecordStore>,
    pub client: TracedClient,
    /// Post service `/posts/by-user` endpoint; set for the user service.
    pub posts_by_user_url: Option<Url>,
}
