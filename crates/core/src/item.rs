//! Item - the unit of data flowing from inputs to outputs
//!
//! An item is either a multi-field record (grouping key, value kind, action,
//! title, content) or a single named blob (title + content, no action).
//! Items are cheap to clone: content is reference-counted.

use std::fmt;

use bytes::Bytes;

/// Kind of value carried by an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A dashboard document
    Dashboard,
    /// A datasource document
    Datasource,
}

impl ValueKind {
    /// Display name, also used to build output paths
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Datasource => "Datasource",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an output should do with an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Produce a named artifact within a group
    Create,
    /// Finalize a group; no further items for it follow
    Finish,
}

impl Action {
    /// Lowercase name for logs
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Finish => "finish",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit produced by one input invocation and delivered to every output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Grouping key shared by every item of one logical production
    pub group: String,
    /// Kind of value
    pub kind: Option<ValueKind>,
    /// Action tag; `None` for single blobs
    pub action: Option<Action>,
    /// Artifact title (blob name for single blobs)
    pub title: String,
    /// Raw content
    pub content: Bytes,
}

impl Item {
    /// A `Create` record
    pub fn create(
        group: impl Into<String>,
        kind: ValueKind,
        title: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            group: group.into(),
            kind: Some(kind),
            action: Some(Action::Create),
            title: title.into(),
            content: content.into(),
        }
    }

    /// A `Finish` record for `group`
    pub fn finish(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            kind: None,
            action: Some(Action::Finish),
            title: String::new(),
            content: Bytes::new(),
        }
    }

    /// A single named blob
    pub fn blob(name: impl Into<String>, kind: Option<ValueKind>, content: impl Into<Bytes>) -> Self {
        Self {
            group: String::new(),
            kind,
            action: None,
            title: name.into(),
            content: content.into(),
        }
    }

    /// Whether the item carries every field its shape requires
    ///
    /// - `Create`: group, kind, title and non-empty content
    /// - `Finish`: group
    /// - blob: title and non-empty content
    pub fn is_deliverable(&self) -> bool {
        match self.action {
            Some(Action::Create) => {
                !self.group.is_empty()
                    && self.kind.is_some()
                    && !self.title.is_empty()
                    && !self.content.is_empty()
            }
            Some(Action::Finish) => !self.group.is_empty(),
            None => !self.title.is_empty() && !self.content.is_empty(),
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            Some(action) => write!(f, "{} {}", action, self.group)?,
            None => f.write_str("blob")?,
        }
        if let Some(kind) = self.kind {
            write!(f, " {}", kind)?;
        }
        if !self.title.is_empty() {
            write!(f, " {:?}", self.title)?;
        }
        write!(f, " ({} bytes)", self.content.len())
    }
}
