//! Remote store adapter: backend rows, row ⇄ model mapping and the
//! per-table list / insert / update / delete calls.
//!
//! Rows use the backend's nullable columns (`Option<T>`, serialized as
//! `null`). Mapping into the model turns `null` and blank strings into
//! absent fields; mapping out turns absent fields back into `null`.

use crux_http::{Http, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::auth::Session;
use crate::capabilities::http::{authorize, HEADER_PREFER, RETURN_MINIMAL, RETURN_REPRESENTATION};
use crate::capabilities::Endpoints;
use crate::config::BackendConfig;
use crate::error::{AppError, ErrorKind};
use crate::event::{Event, Secret};
use crate::model::{
    optional, Category, Content, ContentId, ContentKind, Theory, UserId, VisionImage,
    VisionVideo, Wish, MAX_PROGRESS,
};

pub const THEORIES_TABLE: &str = "vision_theories";
pub const WISHES_TABLE: &str = "vision_wishes";
pub const IMAGES_TABLE: &str = "vision_images";
pub const VIDEOS_TABLE: &str = "vision_videos";

#[must_use]
pub const fn table_for(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Theory => THEORIES_TABLE,
        ContentKind::Wish => WISHES_TABLE,
        ContentKind::Image => IMAGES_TABLE,
        ContentKind::Video => VIDEOS_TABLE,
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MutationOp {
    Update,
    Delete,
}

// --- Rows as stored ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TheoryRow {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    pub category: Category,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WishRow {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: Category,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub progress: Option<i32>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ImageRow {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub src: String,
    pub alt: String,
    pub category: Category,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct VideoRow {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub url: String,
    pub title: String,
    pub category: Category,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

// --- Insert payloads (server assigns id and created_at) ---

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct NewTheoryRow {
    pub user_id: String,
    #[serde(flatten)]
    pub fields: TheoryPatch,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct NewWishRow {
    pub user_id: String,
    #[serde(flatten)]
    pub fields: WishPatch,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct NewImageRow {
    pub user_id: String,
    #[serde(flatten)]
    pub fields: ImagePatch,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct NewVideoRow {
    pub user_id: String,
    #[serde(flatten)]
    pub fields: VideoPatch,
}

// --- Editable columns ---

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct TheoryPatch {
    pub title: String,
    pub content: String,
    pub author: Option<String>,
    pub category: Category,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct WishPatch {
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    pub completed: bool,
    pub progress: Option<u8>,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct ImagePatch {
    pub src: String,
    pub alt: String,
    pub category: Category,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct VideoPatch {
    pub url: String,
    pub title: String,
    pub category: Category,
    pub thumbnail: Option<String>,
}

/// A model type backed by one table.
pub trait RemoteRecord: Content + Sized + 'static {
    const TABLE: &'static str;

    type Row: DeserializeOwned + Clone + std::fmt::Debug + Send + 'static;
    type NewRow: Serialize;
    type Patch: Serialize;

    fn from_row(row: Self::Row) -> Self;
    fn new_row(&self, owner: &UserId) -> Self::NewRow;
    fn patch(&self) -> Self::Patch;

    fn loaded(generation: u64, result: crux_http::Result<Response<Vec<Self::Row>>>) -> Event;
    fn inserted(local_id: ContentId, result: crux_http::Result<Response<Vec<Self::Row>>>) -> Event;
}

impl RemoteRecord for Theory {
    const TABLE: &'static str = THEORIES_TABLE;

    type Row = TheoryRow;
    type NewRow = NewTheoryRow;
    type Patch = TheoryPatch;

    fn from_row(row: TheoryRow) -> Self {
        Theory {
            id: ContentId::new(row.id),
            title: row.title,
            content: row.content,
            author: optional(row.author.as_deref()),
            category: row.category,
        }
    }

    fn new_row(&self, owner: &UserId) -> NewTheoryRow {
        NewTheoryRow {
            user_id: owner.as_str().to_string(),
            fields: self.patch(),
        }
    }

    fn patch(&self) -> TheoryPatch {
        TheoryPatch {
            title: self.title.clone(),
            content: self.content.clone(),
            author: self.author.clone(),
            category: self.category,
        }
    }

    fn loaded(generation: u64, result: crux_http::Result<Response<Vec<TheoryRow>>>) -> Event {
        Event::TheoriesLoaded {
            generation,
            result: Box::new(result),
        }
    }

    fn inserted(local_id: ContentId, result: crux_http::Result<Response<Vec<TheoryRow>>>) -> Event {
        Event::TheoryInserted {
            local_id,
            result: Box::new(result),
        }
    }
}

impl RemoteRecord for Wish {
    const TABLE: &'static str = WISHES_TABLE;

    type Row = WishRow;
    type NewRow = NewWishRow;
    type Patch = WishPatch;

    fn from_row(row: WishRow) -> Self {
        let progress = row
            .progress
            .map(|p| u8::try_from(p.clamp(0, i32::from(MAX_PROGRESS))).unwrap_or(0));
        Wish::new(
            ContentId::new(row.id),
            row.title,
            optional(row.description.as_deref()),
            row.category,
            row.completed,
            progress,
        )
    }

    fn new_row(&self, owner: &UserId) -> NewWishRow {
        NewWishRow {
            user_id: owner.as_str().to_string(),
            fields: self.patch(),
        }
    }

    fn patch(&self) -> WishPatch {
        WishPatch {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category,
            completed: self.completed(),
            progress: self.progress(),
        }
    }

    fn loaded(generation: u64, result: crux_http::Result<Response<Vec<WishRow>>>) -> Event {
        Event::WishesLoaded {
            generation,
            result: Box::new(result),
        }
    }

    fn inserted(local_id: ContentId, result: crux_http::Result<Response<Vec<WishRow>>>) -> Event {
        Event::WishInserted {
            local_id,
            result: Box::new(result),
        }
    }
}

impl RemoteRecord for VisionImage {
    const TABLE: &'static str = IMAGES_TABLE;

    type Row = ImageRow;
    type NewRow = NewImageRow;
    type Patch = ImagePatch;

    fn from_row(row: ImageRow) -> Self {
        VisionImage {
            id: ContentId::new(row.id),
            src: row.src,
            alt: row.alt,
            category: row.category,
        }
    }

    fn new_row(&self, owner: &UserId) -> NewImageRow {
        NewImageRow {
            user_id: owner.as_str().to_string(),
            fields: self.patch(),
        }
    }

    fn patch(&self) -> ImagePatch {
        ImagePatch {
            src: self.src.clone(),
            alt: self.alt.clone(),
            category: self.category,
        }
    }

    fn loaded(generation: u64, result: crux_http::Result<Response<Vec<ImageRow>>>) -> Event {
        Event::ImagesLoaded {
            generation,
            result: Box::new(result),
        }
    }

    fn inserted(local_id: ContentId, result: crux_http::Result<Response<Vec<ImageRow>>>) -> Event {
        Event::ImageInserted {
            local_id,
            result: Box::new(result),
        }
    }
}

impl RemoteRecord for VisionVideo {
    const TABLE: &'static str = VIDEOS_TABLE;

    type Row = VideoRow;
    type NewRow = NewVideoRow;
    type Patch = VideoPatch;

    fn from_row(row: VideoRow) -> Self {
        VisionVideo {
            id: ContentId::new(row.id),
            url: row.url,
            title: row.title,
            category: row.category,
            thumbnail: optional(row.thumbnail.as_deref()),
        }
    }

    fn new_row(&self, owner: &UserId) -> NewVideoRow {
        NewVideoRow {
            user_id: owner.as_str().to_string(),
            fields: self.patch(),
        }
    }

    fn patch(&self) -> VideoPatch {
        VideoPatch {
            url: self.url.clone(),
            title: self.title.clone(),
            category: self.category,
            thumbnail: self.thumbnail.clone(),
        }
    }

    fn loaded(generation: u64, result: crux_http::Result<Response<Vec<VideoRow>>>) -> Event {
        Event::VideosLoaded {
            generation,
            result: Box::new(result),
        }
    }

    fn inserted(local_id: ContentId, result: crux_http::Result<Response<Vec<VideoRow>>>) -> Event {
        Event::VideoInserted {
            local_id,
            result: Box::new(result),
        }
    }
}

/// The configured backend. Present only in remote mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteStore {
    endpoints: Endpoints,
    anon_key: Secret,
}

impl RemoteStore {
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            endpoints: Endpoints::new(config.url()),
            anon_key: config.anon_key().clone(),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn anon_key(&self) -> &Secret {
        &self.anon_key
    }

    pub fn list<T: RemoteRecord>(&self, http: &Http<Event>, session: &Session, generation: u64) {
        debug!(table = T::TABLE, generation, "listing rows");
        let url = self.endpoints.list(T::TABLE, &session.user_id);
        authorize(http.get(url), &self.anon_key, Some(&session.access_token))
            .expect_json::<Vec<T::Row>>()
            .send(move |result| T::loaded(generation, result));
    }

    pub fn insert<T: RemoteRecord>(
        &self,
        http: &Http<Event>,
        session: &Session,
        item: &T,
    ) -> Result<(), AppError> {
        debug!(table = T::TABLE, id = %item.id(), "inserting row");
        let local_id = item.id().clone();
        let url = self.endpoints.table(T::TABLE);
        authorize(http.post(url), &self.anon_key, Some(&session.access_token))
            .header(HEADER_PREFER, RETURN_REPRESENTATION)
            .body_json(&item.new_row(&session.user_id))
            .map_err(|e| serialization_error(T::TABLE, &e))?
            .expect_json::<Vec<T::Row>>()
            .send(move |result| T::inserted(local_id, result));
        Ok(())
    }

    pub fn update<T: RemoteRecord>(
        &self,
        http: &Http<Event>,
        session: &Session,
        item: &T,
    ) -> Result<(), AppError> {
        debug!(table = T::TABLE, id = %item.id(), "updating row");
        let id = item.id().clone();
        let url = self.endpoints.row(T::TABLE, &id);
        authorize(http.patch(url), &self.anon_key, Some(&session.access_token))
            .header(HEADER_PREFER, RETURN_MINIMAL)
            .body_json(&item.patch())
            .map_err(|e| serialization_error(T::TABLE, &e))?
            .send(move |result| Event::MutationSettled {
                kind: T::KIND,
                id,
                op: MutationOp::Update,
                result: Box::new(result),
            });
        Ok(())
    }

    pub fn delete(&self, http: &Http<Event>, session: &Session, kind: ContentKind, id: &ContentId) {
        let table = table_for(kind);
        debug!(table, id = %id, "deleting row");
        let id = id.clone();
        let url = self.endpoints.row(table, &id);
        authorize(http.delete(url), &self.anon_key, Some(&session.access_token))
            .header(HEADER_PREFER, RETURN_MINIMAL)
            .send(move |result| Event::MutationSettled {
                kind,
                id,
                op: MutationOp::Delete,
                result: Box::new(result),
            });
    }
}

fn serialization_error(table: &str, e: &crux_http::Error) -> AppError {
    AppError::new(ErrorKind::Serialization, "Could not encode the record")
        .with_internal(e.to_string())
        .with_context("table", table)
}

/// First row of an insert response, mapped into the model.
pub fn confirmed_row<T: RemoteRecord>(mut response: Response<Vec<T::Row>>) -> Option<T> {
    response
        .take_body()
        .and_then(|rows| rows.into_iter().next())
        .map(T::from_row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tables_match_kinds() {
        assert_eq!(table_for(ContentKind::Theory), Theory::TABLE);
        assert_eq!(table_for(ContentKind::Wish), Wish::TABLE);
        assert_eq!(table_for(ContentKind::Image), VisionImage::TABLE);
        assert_eq!(table_for(ContentKind::Video), VisionVideo::TABLE);
    }

    #[test]
    fn null_optionals_map_to_absent() {
        let row: TheoryRow = serde_json::from_value(json!({
            "id": "7f1c",
            "user_id": "u1",
            "title": "Stillness",
            "content": "Be still",
            "author": null,
            "category": "personal",
            "created_at": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        let theory = Theory::from_row(row);
        assert_eq!(theory.author, None);
        assert_eq!(theory.id.as_str(), "7f1c");
    }

    #[test]
    fn missing_and_blank_optionals_map_to_absent() {
        let row: VideoRow = serde_json::from_value(json!({
            "id": "v1",
            "url": "https://www.youtube.com/embed/x",
            "title": "Flow",
            "category": "creativity",
            "thumbnail": ""
        }))
        .unwrap();
        assert_eq!(VisionVideo::from_row(row).thumbnail, None);
    }

    #[test]
    fn absent_optionals_serialize_as_null() {
        let theory = Theory {
            id: ContentId::new("local"),
            title: "t".into(),
            content: "c".into(),
            author: None,
            category: Category::Career,
        };
        let value = serde_json::to_value(theory.new_row(&UserId::new("u1"))).unwrap();
        assert_eq!(
            value,
            json!({
                "user_id": "u1",
                "title": "t",
                "content": "c",
                "author": null,
                "category": "career"
            })
        );
    }

    #[test]
    fn insert_payload_never_carries_client_id() {
        let wish = Wish::new(ContentId::new("1700000000000"), "w", None, Category::Health, false, Some(10));
        let value = serde_json::to_value(wish.new_row(&UserId::new("u1"))).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["progress"], json!(10));
        assert_eq!(value["completed"], json!(false));
    }

    #[test]
    fn wish_rows_are_clamped_and_reconciled() {
        let row: WishRow = serde_json::from_value(json!({
            "id": "w1",
            "title": "Learn piano",
            "category": "creativity",
            "completed": false,
            "progress": 140
        }))
        .unwrap();
        let wish = Wish::from_row(row);
        assert_eq!(wish.progress(), Some(100));
        assert!(wish.completed());

        let row: WishRow = serde_json::from_value(json!({
            "id": "w2",
            "title": "Save",
            "category": "career",
            "progress": -5
        }))
        .unwrap();
        assert_eq!(Wish::from_row(row).progress(), Some(0));
    }

    #[test]
    fn unknown_category_fails_decoding() {
        let row = serde_json::from_value::<ImageRow>(json!({
            "id": "i1",
            "src": "https://x.example.com/a.jpg",
            "alt": "a",
            "category": "finance"
        }));
        assert!(row.is_err());
    }

    #[test]
    fn patch_contains_only_editable_columns() {
        let image = VisionImage {
            id: ContentId::new("i1"),
            src: "https://x.example.com/a.jpg".into(),
            alt: "Sunrise".into(),
            category: Category::Travel,
        };
        let value = serde_json::to_value(image.patch()).unwrap();
        assert_eq!(
            value,
            json!({"src": "https://x.example.com/a.jpg", "alt": "Sunrise", "category": "travel"})
        );
    }
}
