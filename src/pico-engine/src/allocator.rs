//! Free local ports and geo rule datasets, both provided by the engine.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::abi::{EngineAbi, EngineCall};
use crate::error::BoundaryError;
use crate::framing::{self, ResponseEncoding};

/// Sentinel for "no port could be allocated".
pub const NO_PORT: u16 = 0;

/// Sentinel descriptor for a geo dataset the engine could not load.
pub const EMPTY_GEO_DESCRIPTOR: &str = "{}";

/// Snapshot of ports that were free when the engine probed them.
///
/// No lease is held; the ports should be written into a config and the
/// engine started promptly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortReservation {
    requested: u32,
    ports: Vec<u16>,
}

impl PortReservation {
    fn empty(requested: u32) -> Self {
        Self {
            requested,
            ports: Vec::new(),
        }
    }

    /// Number of ports asked for.
    pub fn requested(&self) -> u32 {
        self.requested
    }

    /// The allocated ports; at most [`Self::requested`] of them.
    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    /// First port, or [`NO_PORT`].
    pub fn first(&self) -> u16 {
        self.ports.first().copied().unwrap_or(NO_PORT)
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Whether every requested port was allocated.
    pub fn is_complete(&self) -> bool {
        self.ports.len() == self.requested as usize
    }
}

#[derive(Debug, Deserialize)]
struct FreePortsResponse {
    ports: Vec<u16>,
}

/// Kind of routing dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GeoDataKind {
    /// IP range rules (`geoip.dat`).
    IpRules,
    /// Domain rules (`geosite.dat`).
    SiteRules,
    /// Any other engine-defined kind, passed through verbatim.
    Custom(String),
}

impl GeoDataKind {
    /// The `type` value sent to the engine.
    pub fn as_wire(&self) -> &str {
        match self {
            GeoDataKind::IpRules => "geoip",
            GeoDataKind::SiteRules => "geosite",
            GeoDataKind::Custom(kind) => kind,
        }
    }
}

impl fmt::Display for GeoDataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoDataKind::IpRules => write!(f, "ip-rules"),
            GeoDataKind::SiteRules => write!(f, "site-rules"),
            GeoDataKind::Custom(kind) => write!(f, "{}", kind),
        }
    }
}

impl From<&str> for GeoDataKind {
    fn from(kind: &str) -> Self {
        match kind.to_lowercase().as_str() {
            "ip-rules" | "ip" | "geoip" => GeoDataKind::IpRules,
            "site-rules" | "site" | "geosite" => GeoDataKind::SiteRules,
            _ => GeoDataKind::Custom(kind.to_string()),
        }
    }
}

impl From<String> for GeoDataKind {
    fn from(kind: String) -> Self {
        GeoDataKind::from(kind.as_str())
    }
}

impl Serialize for GeoDataKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GeoDataKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(String::deserialize(deserializer)?.into())
    }
}

/// A dataset file the engine should load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoDataRequest {
    pub path: PathBuf,
    pub kind: GeoDataKind,
}

impl GeoDataRequest {
    pub fn new(path: impl Into<PathBuf>, kind: impl Into<GeoDataKind>) -> Self {
        Self {
            path: path.into(),
            kind: kind.into(),
        }
    }

    /// The JSON document handed to the engine.
    pub fn to_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Wire<'a> {
            path: Cow<'a, str>,
            #[serde(rename = "type")]
            kind: &'a str,
        }

        serde_json::to_string(&Wire {
            path: self.path.to_string_lossy(),
            kind: self.kind.as_wire(),
        })
    }
}

/// Allocates local resources through the engine.
#[derive(Clone)]
pub struct ResourceAllocator {
    engine: Arc<dyn EngineAbi>,
    geo_encoding: ResponseEncoding,
}

impl ResourceAllocator {
    /// Create an allocator expecting plain-text geo responses.
    pub fn new(engine: Arc<dyn EngineAbi>) -> Self {
        Self {
            engine,
            geo_encoding: ResponseEncoding::Plain,
        }
    }

    /// Override the geo response encoding of the engine build.
    pub fn with_geo_encoding(mut self, encoding: ResponseEncoding) -> Self {
        self.geo_encoding = encoding;
        self
    }

    pub fn geo_encoding(&self) -> ResponseEncoding {
        self.geo_encoding
    }

    /// Reserve up to `count` free ports.
    ///
    /// An absent or malformed engine answer yields an empty reservation.
    pub fn allocate_free_ports(&self, count: u32) -> PortReservation {
        if count == 0 {
            return PortReservation::empty(0);
        }

        match self.probe_ports(count) {
            Ok(ports) => {
                debug!(requested = count, allocated = ports.len(), "Allocated free ports");
                PortReservation {
                    requested: count,
                    ports,
                }
            }
            Err(e) => {
                warn!(call = %EngineCall::FreePorts, requested = count, error = %e, "Port allocation failed");
                PortReservation::empty(count)
            }
        }
    }

    /// Reserve a single port. Returns [`NO_PORT`] on failure.
    pub fn allocate_free_port(&self) -> u16 {
        self.allocate_free_ports(1).first()
    }

    fn probe_ports(&self, count: u32) -> Result<Vec<u16>, BoundaryError> {
        let raw = framing::decode_response(self.engine.free_ports(count), ResponseEncoding::Plain)?;
        let response: FreePortsResponse = serde_json::from_str(&raw)?;

        let mut seen = HashSet::new();
        let mut ports: Vec<u16> = response
            .ports
            .into_iter()
            .filter(|&port| port != NO_PORT && seen.insert(port))
            .collect();
        ports.truncate(count as usize);

        if ports.is_empty() {
            return Err(BoundaryError::EmptyPortList);
        }
        Ok(ports)
    }

    /// Ask the engine to load a dataset. Returns its descriptor, or `"{}"` on failure.
    pub fn load_geo_data(&self, path: impl AsRef<Path>, kind: impl Into<GeoDataKind>) -> String {
        self.load(&GeoDataRequest::new(path.as_ref(), kind))
    }

    /// Request form of [`Self::load_geo_data`].
    pub fn load(&self, request: &GeoDataRequest) -> String {
        let result = request
            .to_json()
            .map_err(BoundaryError::from)
            .and_then(|json| {
                let framed = framing::encode_request(json);
                framing::decode_response(self.engine.read_geo_files(&framed), self.geo_encoding)
            });

        match result {
            Ok(descriptor) => {
                debug!(path = %request.path.display(), kind = %request.kind, "Loaded geo data");
                descriptor
            }
            Err(e) => {
                warn!(
                    call = %EngineCall::ReadGeoFiles,
                    path = %request.path.display(),
                    kind = %request.kind,
                    error = %e,
                    "Geo data load failed"
                );
                EMPTY_GEO_DESCRIPTOR.to_string()
            }
        }
    }
}

impl fmt::Debug for ResourceAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceAllocator")
            .field("geo_encoding", &self.geo_encoding)
            .finish_non_exhaustive()
    }
}
