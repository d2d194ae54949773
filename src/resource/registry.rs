//! Resource Registry - Load resource class definitions from JSON
//!
//! Each [`ResourceClass`] names one hop of a descriptor. How that hop turns
//! into a URL and whether it yields an addressable handle or plain data is
//! looked up here, from the definitions embedded at compile time.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[include_str!("../resources/crossbar.json")];

/// Resource classes of the Crossbar hierarchy.
///
/// Resource names are CamelCase; the lowercase keys end a chain with plain
/// data rather than a persistable resource. Names are case-significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum ResourceClass {
    About,
    Account,
    Accounts,
    AddChild,
    Parent,
    #[serde(rename = "children")]
    Children,
    #[serde(rename = "siblings")]
    Siblings,
    #[serde(rename = "descendants")]
    Descendants,
    #[serde(rename = "credits")]
    Credits,
    User,
    Users,
    Device,
    Devices,
    #[serde(rename = "status")]
    Status,
    Callflow,
    Callflows,
    TemporalRule,
    TemporalRules,
    Menu,
    Menus,
    Directory,
    Directories,
    Media,
    Medias,
    VMBox,
    VMBoxes,
    Message,
    Messages,
    Conference,
    Conferences,
    #[serde(rename = "details")]
    Details,
    #[serde(rename = "action")]
    Action,
    Queue,
    Queues,
    Roster,
    Agent,
    Agents,
    #[serde(rename = "stats")]
    Stats,
    PhoneNumber,
    PhoneNumbers,
    Connectivity,
    Connectivities,
    Resources,
    Cdrs,
    Webhook,
    Webhooks,
    Events,
    #[serde(rename = "available")]
    Available,
    Fax,
    Faxes,
    #[serde(rename = "outgoing")]
    Outgoing,
    Raw,
}

impl ResourceClass {
    pub const ALL: &'static [ResourceClass] = &[
        Self::About,
        Self::Account,
        Self::Accounts,
        Self::AddChild,
        Self::Parent,
        Self::Children,
        Self::Siblings,
        Self::Descendants,
        Self::Credits,
        Self::User,
        Self::Users,
        Self::Device,
        Self::Devices,
        Self::Status,
        Self::Callflow,
        Self::Callflows,
        Self::TemporalRule,
        Self::TemporalRules,
        Self::Menu,
        Self::Menus,
        Self::Directory,
        Self::Directories,
        Self::Media,
        Self::Medias,
        Self::VMBox,
        Self::VMBoxes,
        Self::Message,
        Self::Messages,
        Self::Conference,
        Self::Conferences,
        Self::Details,
        Self::Action,
        Self::Queue,
        Self::Queues,
        Self::Roster,
        Self::Agent,
        Self::Agents,
        Self::Stats,
        Self::PhoneNumber,
        Self::PhoneNumbers,
        Self::Connectivity,
        Self::Connectivities,
        Self::Resources,
        Self::Cdrs,
        Self::Webhook,
        Self::Webhooks,
        Self::Events,
        Self::Available,
        Self::Fax,
        Self::Faxes,
        Self::Outgoing,
        Self::Raw,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::About => "About",
            Self::Account => "Account",
            Self::Accounts => "Accounts",
            Self::AddChild => "AddChild",
            Self::Parent => "Parent",
            Self::Children => "children",
            Self::Siblings => "siblings",
            Self::Descendants => "descendants",
            Self::Credits => "credits",
            Self::User => "User",
            Self::Users => "Users",
            Self::Device => "Device",
            Self::Devices => "Devices",
            Self::Status => "status",
            Self::Callflow => "Callflow",
            Self::Callflows => "Callflows",
            Self::TemporalRule => "TemporalRule",
            Self::TemporalRules => "TemporalRules",
            Self::Menu => "Menu",
            Self::Menus => "Menus",
            Self::Directory => "Directory",
            Self::Directories => "Directories",
            Self::Media => "Media",
            Self::Medias => "Medias",
            Self::VMBox => "VMBox",
            Self::VMBoxes => "VMBoxes",
            Self::Message => "Message",
            Self::Messages => "Messages",
            Self::Conference => "Conference",
            Self::Conferences => "Conferences",
            Self::Details => "details",
            Self::Action => "action",
            Self::Queue => "Queue",
            Self::Queues => "Queues",
            Self::Roster => "Roster",
            Self::Agent => "Agent",
            Self::Agents => "Agents",
            Self::Stats => "stats",
            Self::PhoneNumber => "PhoneNumber",
            Self::PhoneNumbers => "PhoneNumbers",
            Self::Connectivity => "Connectivity",
            Self::Connectivities => "Connectivities",
            Self::Resources => "Resources",
            Self::Cdrs => "Cdrs",
            Self::Webhook => "Webhook",
            Self::Webhooks => "Webhooks",
            Self::Events => "Events",
            Self::Available => "available",
            Self::Fax => "Fax",
            Self::Faxes => "Faxes",
            Self::Outgoing => "outgoing",
            Self::Raw => "Raw",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| format!("Unknown resource class: {}", s))
    }
}

/// How a class turns its parent link into the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessorKind {
    /// Addressable single record, optionally by id
    Entity,
    /// List endpoint; filters and args become query parameters
    Collection,
    /// Terminal GET returning plain data; args[0] becomes the query
    Fetch,
    /// Addressable endpoint persisted with a fixed verb; args[0] preloads the body
    Action,
    /// Terminal GET whose args are appended as path segments
    Path,
    /// Undecoded content of the parent record, downloaded or uploaded as bytes
    Raw,
}

/// Class definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ClassDef {
    pub class: ResourceClass,
    /// URL segment appended to the parent location (may be empty)
    pub segment: String,
    pub kind: AccessorKind,
    /// Attaches to the API root rather than to a parent resource
    #[serde(default)]
    pub root: bool,
    /// Names an account; an omitted id defaults to the current account
    #[serde(default)]
    pub account: bool,
    /// Fixed verb for actions
    #[serde(default)]
    pub method: Option<String>,
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    classes: Vec<ClassDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<HashMap<ResourceClass, ClassDef>> = OnceLock::new();

/// Get the class registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static HashMap<ResourceClass, ClassDef> {
    REGISTRY.get_or_init(|| {
        let mut classes = HashMap::new();

        for content in RESOURCE_FILES {
            let partial: RegistryFile = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            classes.extend(partial.classes.into_iter().map(|def| (def.class, def)));
        }

        classes
    })
}

/// Get a class definition
pub fn class_def(class: ResourceClass) -> Option<&'static ClassDef> {
    get_registry().get(&class)
}

/// Whether an omitted id on this class defaults to the current account
pub fn is_account_class(class: ResourceClass) -> bool {
    class_def(class).map(|def| def.account).unwrap_or(false)
}
