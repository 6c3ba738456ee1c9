use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::error::ValidationError;

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(ContentId);
typed_id!(UserId);

pub const MAX_PROGRESS: u8 = 100;

// --- Category ---

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Career,
    Health,
    Travel,
    Creativity,
    Relationships,
    #[default]
    Personal,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::Career,
        Self::Health,
        Self::Travel,
        Self::Creativity,
        Self::Relationships,
        Self::Personal,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Career => "career",
            Self::Health => "health",
            Self::Travel => "travel",
            Self::Creativity => "creativity",
            Self::Relationships => "relationships",
            Self::Personal => "personal",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Career => "Career",
            Self::Health => "Health & Wellness",
            Self::Travel => "Travel & Adventure",
            Self::Creativity => "Creativity",
            Self::Relationships => "Relationships",
            Self::Personal => "Personal Growth",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration order is grid order.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Theory,
    Wish,
    Image,
    Video,
}

impl ContentKind {
    pub const ALL: [ContentKind; 4] = [Self::Theory, Self::Wish, Self::Image, Self::Video];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Theory => "theory",
            Self::Wish => "wish",
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a record stands relative to the remote store.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Never sent: fallback mode or demo data.
    #[default]
    Local,
    /// Insert in flight; the record still carries its client id.
    Inserting,
    /// Update or delete in flight.
    Pending,
    Confirmed,
    Failed,
}

impl SyncStatus {
    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        matches!(self, Self::Inserting | Self::Pending)
    }
}

/// Shared surface of the four record types.
pub trait Content: Clone + fmt::Debug {
    const KIND: ContentKind;

    fn id(&self) -> &ContentId;
    fn set_id(&mut self, id: ContentId);
    fn category(&self) -> Category;
}

macro_rules! impl_content {
    ($ty:ty, $kind:expr) => {
        impl Content for $ty {
            const KIND: ContentKind = $kind;

            fn id(&self) -> &ContentId {
                &self.id
            }
            fn set_id(&mut self, id: ContentId) {
                self.id = id;
            }
            fn category(&self) -> Category {
                self.category
            }
        }
    };
}

// --- Records ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Theory {
    pub id: ContentId,
    pub title: String,
    pub content: String,
    pub author: Option<String>,
    pub category: Category,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Wish {
    pub id: ContentId,
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    completed: bool,
    progress: Option<u8>,
    /// Progress held before the last toggle to completed. Never persisted.
    #[serde(skip)]
    resume_progress: Option<Option<u8>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct VisionImage {
    pub id: ContentId,
    pub src: String,
    pub alt: String,
    pub category: Category,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct VisionVideo {
    pub id: ContentId,
    pub url: String,
    pub title: String,
    pub category: Category,
    pub thumbnail: Option<String>,
}

impl_content!(Theory, ContentKind::Theory);
impl_content!(Wish, ContentKind::Wish);
impl_content!(VisionImage, ContentKind::Image);
impl_content!(VisionVideo, ContentKind::Video);

impl Wish {
    /// Builds a wish whose completion agrees with its progress.
    ///
    /// Stored rows may disagree (`completed` without progress 100); a
    /// completed flag wins and lifts progress to 100.
    pub fn new(
        id: ContentId,
        title: impl Into<String>,
        description: Option<String>,
        category: Category,
        completed: bool,
        progress: Option<u8>,
    ) -> Self {
        let progress = progress.map(|p| p.min(MAX_PROGRESS));
        let completed = completed || progress == Some(MAX_PROGRESS);
        Self {
            id,
            title: title.into(),
            description,
            category,
            completed,
            progress: if completed { Some(MAX_PROGRESS) } else { progress },
            resume_progress: None,
        }
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn progress(&self) -> Option<u8> {
        self.progress
    }

    /// Sets progress; completion follows `progress == 100`.
    pub fn set_progress(&mut self, progress: u8) {
        let progress = progress.min(MAX_PROGRESS);
        self.progress = Some(progress);
        self.completed = progress == MAX_PROGRESS;
        self.resume_progress = None;
    }

    /// Flips completion. Completing lifts progress to 100 and remembers the
    /// previous value; un-completing restores it (or 0 when unknown).
    pub fn toggle_completion(&mut self) {
        if self.completed {
            self.completed = false;
            self.progress = match self.resume_progress.take() {
                Some(previous) => previous,
                None => Some(0),
            };
        } else {
            self.resume_progress = Some(self.progress);
            self.completed = true;
            self.progress = Some(MAX_PROGRESS);
        }
    }

    /// Applies a validated edit; the only other path that touches completion.
    pub fn apply_edit(&mut self, edit: WishFields) {
        self.title = edit.title;
        self.description = edit.description;
        self.category = edit.category;
        self.set_progress(edit.progress);
    }
}

// --- Drafts: unvalidated form input from the shell ---

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TheoryDraft {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Category,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct WishDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub progress: u8,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageDraft {
    pub src: String,
    pub alt: String,
    #[serde(default)]
    pub category: Category,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct VideoDraft {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Validated wish form fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WishFields {
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    pub progress: u8,
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(trimmed.to_string())
}

/// Trimmed; blank becomes absent.
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn web_link(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = required(field, value)?;
    let parsed = Url::parse(&value).map_err(|e| ValidationError::InvalidLink {
        field,
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(value),
        other => Err(ValidationError::InvalidLink {
            field,
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// Image sources may be inline `data:image/...` URIs from a file upload.
fn image_source(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.starts_with("data:") {
        if trimmed.starts_with("data:image/") && trimmed.contains(',') {
            return Ok(trimmed.to_string());
        }
        return Err(ValidationError::InvalidLink {
            field: "src",
            reason: "inline data must be an image".to_string(),
        });
    }
    web_link("src", value)
}

impl TheoryDraft {
    pub fn into_theory(self, id: ContentId) -> Result<Theory, ValidationError> {
        Ok(Theory {
            id,
            title: required("title", &self.title)?,
            content: required("content", &self.content)?,
            author: optional(self.author.as_deref()),
            category: self.category,
        })
    }
}

impl WishDraft {
    pub fn validate(self) -> Result<WishFields, ValidationError> {
        if self.progress > MAX_PROGRESS {
            return Err(ValidationError::ProgressOutOfRange(self.progress));
        }
        Ok(WishFields {
            title: required("title", &self.title)?,
            description: optional(self.description.as_deref()),
            category: self.category,
            progress: self.progress,
        })
    }

    pub fn into_wish(self, id: ContentId) -> Result<Wish, ValidationError> {
        let fields = self.validate()?;
        let mut wish = Wish::new(id, fields.title.clone(), None, fields.category, false, Some(0));
        wish.apply_edit(fields);
        Ok(wish)
    }
}

impl ImageDraft {
    pub fn into_image(self, id: ContentId) -> Result<VisionImage, ValidationError> {
        Ok(VisionImage {
            id,
            src: image_source(&self.src)?,
            alt: required("alt", &self.alt)?,
            category: self.category,
        })
    }
}

impl VideoDraft {
    pub fn into_video(self, id: ContentId) -> Result<VisionVideo, ValidationError> {
        let thumbnail = match optional(self.thumbnail.as_deref()) {
            Some(t) => Some(web_link("thumbnail", &t)?),
            None => None,
        };
        Ok(VisionVideo {
            id,
            url: web_link("url", &self.url)?,
            title: required("title", &self.title)?,
            category: self.category,
            thumbnail,
        })
    }
}
