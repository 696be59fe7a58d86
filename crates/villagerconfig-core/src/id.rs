use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace assumed when an identifier omits one.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// A namespaced identifier such as `minecraft:emerald`. Cheap to compare.
///
/// Construction normalizes the input: a leading `#` is dropped and a missing
/// namespace becomes `minecraft`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ResourceLocation(String);

impl ResourceLocation {
    pub fn new(raw: &str) -> Self {
        let raw = raw.trim().trim_start_matches('#');
        if raw.contains(':') {
            Self(raw.to_string())
        } else {
            Self(format!("{DEFAULT_NAMESPACE}:{raw}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn namespace(&self) -> &str {
        self.0.split_once(':').map(|(ns, _)| ns).unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn path(&self) -> &str {
        self.0.split_once(':').map(|(_, path)| path).unwrap_or(&self.0)
    }

    /// Compare against a possibly un-namespaced identifier.
    pub fn is(&self, other: &str) -> bool {
        *self == Self::new(other)
    }
}

impl From<String> for ResourceLocation {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for ResourceLocation {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<ResourceLocation> for String {
    fn from(id: ResourceLocation) -> Self {
        id.0
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One value inside a tag definition: a concrete element or a nested tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TagMember {
    Element(ResourceLocation),
    Tag(ResourceLocation),
}

impl TagMember {
    pub fn parse(raw: &str) -> Self {
        if raw.trim_start().starts_with('#') {
            TagMember::Tag(ResourceLocation::new(raw))
        } else {
            TagMember::Element(ResourceLocation::new(raw))
        }
    }
}

impl From<String> for TagMember {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<&str> for TagMember {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<TagMember> for String {
    fn from(member: TagMember) -> Self {
        match member {
            TagMember::Element(id) => id.into(),
            TagMember::Tag(id) => format!("#{id}"),
        }
    }
}

/// A reference to a set of registry entries: either `#tag` or an explicit
/// list. A single plain string is a one-element list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawHolderSet")]
pub enum HolderSet {
    Tag(ResourceLocation),
    List(Vec<ResourceLocation>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawHolderSet {
    Single(String),
    List(Vec<String>),
}

impl From<RawHolderSet> for HolderSet {
    fn from(raw: RawHolderSet) -> Self {
        match raw {
            RawHolderSet::Single(s) => match TagMember::parse(&s) {
                TagMember::Tag(id) => HolderSet::Tag(id),
                TagMember::Element(id) => HolderSet::List(vec![id]),
            },
            RawHolderSet::List(items) => {
                HolderSet::List(items.iter().map(|s| ResourceLocation::new(s)).collect())
            }
        }
    }
}
