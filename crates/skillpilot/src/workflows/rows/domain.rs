use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Every entity the admin list screens show and delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Student,
    Course,
    Module,
    Skill,
    Employer,
    User,
    Opportunity,
}

impl EntityKind {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Student,
            Self::Course,
            Self::Module,
            Self::Skill,
            Self::Employer,
            Self::User,
            Self::Opportunity,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Course => "course",
            Self::Module => "module",
            Self::Skill => "skill",
            Self::Employer => "employer",
            Self::User => "user",
            Self::Opportunity => "opportunity",
        }
    }

    /// Label with its first letter upper-cased, for sentence starts.
    pub fn title(self) -> String {
        let mut chars = self.label().chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Server-side identity of a rendered row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Where the portal expects the `DELETE` for this entity. The screens grew their routes
    /// independently, so some carry the id in the path and others in the query.
    pub fn delete_route(&self) -> DeleteRoute {
        let id = self.id.clone();
        match self.kind {
            EntityKind::Student => DeleteRoute::path(&["students", "delete_student"], id),
            EntityKind::Course => DeleteRoute::path(&["courses", "delete_course"], id),
            EntityKind::Module => DeleteRoute::query(&["course_modules", "delete"], "uuid", id),
            EntityKind::Skill => DeleteRoute::query(&["skills", "delete"], "skill_id", id),
            EntityKind::Employer => {
                DeleteRoute::query(&["employers", "delete_employer"], "employer_id", id)
            }
            EntityKind::User => DeleteRoute::query(&["users", "delete"], "uuid", id),
            EntityKind::Opportunity => DeleteRoute::query(
                &["opportunities", "employer_delete_opportunity"],
                "opportunity_id",
                id,
            ),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Path segments stay unescaped here; the HTTP client encodes each one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRoute {
    pub segments: Vec<String>,
    pub query: Option<(&'static str, String)>,
}

impl DeleteRoute {
    fn path(base: &[&str], id: String) -> Self {
        let mut segments: Vec<String> = base.iter().map(|part| part.to_string()).collect();
        segments.push(id);
        Self {
            segments,
            query: None,
        }
    }

    fn query(base: &[&str], key: &'static str, id: String) -> Self {
        Self {
            segments: base.iter().map(|part| part.to_string()).collect(),
            query: Some((key, id)),
        }
    }

    /// Segments joined with `/`, as written in a route table.
    pub fn joined(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// One rendered list entry bound to its server-side entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRow {
    pub entity: EntityRef,
    pub columns: BTreeMap<String, String>,
}

impl EntityRow {
    pub fn new<K, V>(entity: EntityRef, columns: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entity,
            columns: columns
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Name used in confirmation prompts; falls back to the id.
    pub fn display_name(&self) -> &str {
        ["name", "title", "module_name", "course_name"]
            .iter()
            .find_map(|key| self.columns.get(*key))
            .map(String::as_str)
            .unwrap_or(&self.entity.id)
    }
}
