//! Server model and lifecycle vocabulary.

use chrono::{DateTime, NaiveDateTime, Utc};
use roast_id::{FlavorId, ImageId, ServerId};
use roast_net::Addresses;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ComputeError;

// =============================================================================
// Status Labels
// =============================================================================

/// Server status label as reported by the compute API.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServerStatus {
    Active,
    Build,
    Paused,
    Suspended,
    Shutoff,
    Reboot,
    HardReboot,
    Resize,
    VerifyResize,
    Rescue,
    Error,
    Deleted,
    /// A label outside the known set, kept verbatim.
    Unknown(String),
}

impl ServerStatus {
    /// The wire label.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "ACTIVE",
            Self::Build => "BUILD",
            Self::Paused => "PAUSED",
            Self::Suspended => "SUSPENDED",
            Self::Shutoff => "SHUTOFF",
            Self::Reboot => "REBOOT",
            Self::HardReboot => "HARD_REBOOT",
            Self::Resize => "RESIZE",
            Self::VerifyResize => "VERIFY_RESIZE",
            Self::Rescue => "RESCUE",
            Self::Error => "ERROR",
            Self::Deleted => "DELETED",
            Self::Unknown(label) => label,
        }
    }

    /// Parse a wire label. Matching is case-insensitive.
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_uppercase().as_str() {
            "ACTIVE" => Self::Active,
            "BUILD" => Self::Build,
            "PAUSED" => Self::Paused,
            "SUSPENDED" => Self::Suspended,
            "SHUTOFF" => Self::Shutoff,
            "REBOOT" => Self::Reboot,
            "HARD_REBOOT" => Self::HardReboot,
            "RESIZE" => Self::Resize,
            "VERIFY_RESIZE" => Self::VerifyResize,
            "RESCUE" => Self::Rescue,
            "ERROR" => Self::Error,
            "DELETED" => Self::Deleted,
            _ => Self::Unknown(label.to_string()),
        }
    }
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ServerStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

impl Serialize for ServerStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ServerStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// Reboot flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RebootType {
    Soft,
    Hard,
}

impl std::fmt::Display for RebootType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Soft => write!(f, "SOFT"),
            Self::Hard => write!(f, "HARD"),
        }
    }
}

/// A server action posted to `/servers/{id}/action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerAction {
    Pause,
    Unpause,
    Suspend,
    Resume,
    Reboot(RebootType),
}

impl ServerAction {
    /// Action name as used in the request body.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Unpause => "unpause",
            Self::Suspend => "suspend",
            Self::Resume => "resume",
            Self::Reboot(_) => "reboot",
        }
    }

    /// Request body for the action.
    pub fn body(&self) -> serde_json::Value {
        match self {
            Self::Reboot(kind) => serde_json::json!({ "reboot": { "type": kind } }),
            other => serde_json::json!({ other.name(): null }),
        }
    }
}

impl std::fmt::Display for ServerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reboot(kind) => write!(f, "reboot({kind})"),
            other => f.write_str(other.name()),
        }
    }
}

// =============================================================================
// Server
// =============================================================================

/// Reference to an image or flavor embedded in a server document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef<I> {
    pub id: I,
}

/// A server as returned by `GET /servers/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub id: ServerId,

    #[serde(default)]
    pub name: String,

    pub status: ServerStatus,

    #[serde(default)]
    pub tenant_id: Option<String>,

    #[serde(default)]
    pub image: Option<ResourceRef<ImageId>>,

    #[serde(default)]
    pub flavor: Option<ResourceRef<FlavorId>>,

    #[serde(default)]
    pub addresses: Addresses,

    #[serde(default, deserialize_with = "deserialize_api_time")]
    pub created: Option<DateTime<Utc>>,

    #[serde(
        default,
        rename = "OS-SRV-USG:launched_at",
        deserialize_with = "deserialize_api_time"
    )]
    pub launched_at: Option<DateTime<Utc>>,

    /// Only present in the create response.
    #[serde(default, rename = "adminPass", skip_serializing_if = "Option::is_none")]
    pub admin_pass: Option<String>,
}

impl Server {
    pub fn flavor_id(&self) -> Option<&FlavorId> {
        self.flavor.as_ref().map(|f| &f.id)
    }

    pub fn image_id(&self) -> Option<&ImageId> {
        self.image.as_ref().map(|i| &i.id)
    }
}

/// Body of `POST /servers`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateServerRequest {
    pub name: String,

    #[serde(rename = "imageRef")]
    pub image_ref: ImageId,

    #[serde(rename = "flavorRef")]
    pub flavor_ref: FlavorId,
}

/// The create response: the new server's ID and admin password.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedServer {
    pub id: ServerId,

    #[serde(default, rename = "adminPass")]
    pub admin_pass: Option<String>,

    /// Status code of the create call.
    #[serde(skip)]
    pub status: u16,
}

/// Status code and request ID of an action call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub status: u16,
    pub request_id: Option<String>,
}

impl ActionResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            request_id: None,
        }
    }

    /// Fail unless the call returned `expected`.
    pub fn expect_status(self, expected: u16) -> Result<Self, ComputeError> {
        if self.status == expected {
            Ok(self)
        } else {
            Err(ComputeError::UnexpectedStatusCode {
                expected,
                actual: self.status,
            })
        }
    }
}

// =============================================================================
// Timestamps
// =============================================================================

/// Parse an API timestamp.
///
/// The API mixes RFC 3339 (`2013-11-08T21:17:02Z`) with naive UTC timestamps
/// carrying microseconds (`2013-11-08T21:17:02.000000`).
pub fn parse_api_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_api_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => parse_api_time(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}"))),
    }
}
