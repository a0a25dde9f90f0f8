use std::borrow::Cow;

use serde_json::json;

use super::fields::{Fields, into_fields};

/// How one object type is addressed through the API.
///
/// Only `method_prefix` and `identify_field` are mandatory; the id field
/// defaults to `<method_prefix>id` and its plural to `<id_field>s`.
#[derive(Debug, Clone, Copy)]
pub struct ResourceDescriptor {
    pub method_prefix: &'static str,
    /// Natural key used for lookups, e.g. `host` or `name`.
    pub identify_field: &'static str,
    id_field: Option<&'static str>,
    ids_field: Option<&'static str>,
    /// Extra fields that narrow a natural-key lookup (items are unique per host).
    pub scope_fields: &'static [&'static str],
    defaults: Option<fn() -> Fields>,
}

impl ResourceDescriptor {
    #[must_use]
    pub const fn new(method_prefix: &'static str, identify_field: &'static str) -> Self {
        Self {
            method_prefix,
            identify_field,
            id_field: None,
            ids_field: None,
            scope_fields: &[],
            defaults: None,
        }
    }

    #[must_use]
    pub const fn with_id_field(mut self, field: &'static str) -> Self {
        self.id_field = Some(field);
        self
    }

    #[must_use]
    pub const fn with_ids_field(mut self, field: &'static str) -> Self {
        self.ids_field = Some(field);
        self
    }

    #[must_use]
    pub const fn with_scope(mut self, fields: &'static [&'static str]) -> Self {
        self.scope_fields = fields;
        self
    }

    #[must_use]
    pub const fn with_defaults(mut self, defaults: fn() -> Fields) -> Self {
        self.defaults = Some(defaults);
        self
    }

    #[must_use]
    pub fn id_field(&self) -> Cow<'static, str> {
        self.id_field.map_or_else(
            || Cow::Owned(format!("{}id", self.method_prefix)),
            Cow::Borrowed,
        )
    }

    /// Key under which create/update/delete report the affected ids.
    #[must_use]
    pub fn ids_field(&self) -> Cow<'static, str> {
        self.ids_field
            .map_or_else(|| Cow::Owned(format!("{}s", self.id_field())), Cow::Borrowed)
    }

    #[must_use]
    pub fn default_fields(&self) -> Fields {
        self.defaults.map(|build| build()).unwrap_or_default()
    }

    #[must_use]
    pub fn method(&self, action: &str) -> String {
        format!("{}.{action}", self.method_prefix)
    }

    /// Look up a built-in descriptor by its collection name (`hosts`, `items`, ...).
    #[must_use]
    pub fn by_name(name: &str) -> Option<Self> {
        KNOWN
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, descriptor)| *descriptor)
    }
}

pub const ACTIONS: ResourceDescriptor = ResourceDescriptor::new("action", "name");
pub const HOSTGROUPS: ResourceDescriptor =
    ResourceDescriptor::new("hostgroup", "name").with_id_field("groupid");
pub const HOSTS: ResourceDescriptor =
    ResourceDescriptor::new("host", "host").with_defaults(host_defaults);
pub const ITEMS: ResourceDescriptor = ResourceDescriptor::new("item", "name")
    .with_scope(&["hostid"])
    .with_defaults(item_defaults);
pub const MAINTENANCE: ResourceDescriptor = ResourceDescriptor::new("maintenance", "name");
pub const MEDIATYPES: ResourceDescriptor = ResourceDescriptor::new("mediatype", "name");
pub const PROBLEMS: ResourceDescriptor =
    ResourceDescriptor::new("problem", "name").with_ids_field("problemids");
pub const PROXIES: ResourceDescriptor = ResourceDescriptor::new("proxy", "host");
pub const TEMPLATES: ResourceDescriptor = ResourceDescriptor::new("template", "host");
pub const TRIGGERS: ResourceDescriptor =
    ResourceDescriptor::new("trigger", "description").with_scope(&["hostid"]);
pub const USERGROUPS: ResourceDescriptor =
    ResourceDescriptor::new("usergroup", "name").with_id_field("usrgrpid");
pub const USERS: ResourceDescriptor = ResourceDescriptor::new("user", "username");

const KNOWN: [(&str, ResourceDescriptor); 12] = [
    ("actions", ACTIONS),
    ("hostgroups", HOSTGROUPS),
    ("hosts", HOSTS),
    ("items", ITEMS),
    ("maintenance", MAINTENANCE),
    ("mediatypes", MEDIATYPES),
    ("problems", PROBLEMS),
    ("proxies", PROXIES),
    ("templates", TEMPLATES),
    ("triggers", TRIGGERS),
    ("usergroups", USERGROUPS),
    ("users", USERS),
];

fn host_defaults() -> Fields {
    into_fields(json!({
        "status": 0,
        "inventory_mode": 1,
        "groups": [],
    }))
    .unwrap_or_default()
}

fn item_defaults() -> Fields {
    into_fields(json!({
        "delay": "60",
        "history": "3600",
        "trends": "86400",
        "status": 0,
        "type": 7,
        "value_type": 3,
        "units": "",
    }))
    .unwrap_or_default()
}
