//! Wire shape of an exported telemetry batch.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::instruments::MetricSample;
use crate::trace::SpanData;

/// Identity of the process producing telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "service.name")]
    pub service_name: String,
    #[serde(rename = "service.version")]
    pub service_version: String,
    #[serde(rename = "service.instance.id")]
    pub instance_id: Uuid,
}

impl Resource {
    /// A resource with a fresh instance id.
    pub fn new(service_name: impl Into<String>, service_version: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: service_version.into(),
            instance_id: Uuid::new_v4(),
        }
    }
}

/// One delivery to a sink: ended spans and metric samples.
#[derive(Debug, Clone, Serialize)]
pub struct ExportBatch {
    pub resource: Resource,
    pub spans: Vec<SpanData>,
    pub samples: Vec<MetricSample>,
}

impl ExportBatch {
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty() && self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.spans.len() + self.samples.len()
    }
}
