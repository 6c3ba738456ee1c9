use std::collections::BTreeMap;

use tracing::{debug, info, instrument, warn};

use crate::auth::{self, Session, SIGN_UP_NOTICE};
use crate::cache::{Board, Entry, PendingLoad, Stored};
use crate::capabilities::{Capabilities, KvKey};
use crate::config::{BackendConfig, Environment};
use crate::demo;
use crate::error::{AppError, ErrorKind, ValidationError};
use crate::event::{Event, KvOutcome, Secret};
use crate::focus::{FocusKey, FocusSequence};
use crate::get_current_time_ms;
use crate::grid::CategoryFilter;
use crate::model::{ContentId, ContentKind, SyncStatus, Theory, VisionImage, VisionVideo, Wish};
use crate::remote::{confirmed_row, MutationOp, RemoteRecord, RemoteStore};
use crate::view::{self, AuthView, Route, ViewModel};

pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// Work held back until a record's insert confirms and it has a server id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Deferred {
    Update,
    Delete,
}

#[derive(Debug, Default)]
pub struct Model {
    pub started: bool,
    /// `None` in fallback mode.
    pub remote: Option<RemoteStore>,
    pub session: Option<Session>,
    pub route: Route,
    pub restoring: bool,
    pub board: Board,
    pub filter: CategoryFilter,
    pub focus: Option<FocusSequence>,
    pub load: Option<PendingLoad>,
    pub load_generation: u64,
    pub load_error: bool,
    pub deferred: BTreeMap<(ContentKind, ContentId), Deferred>,
    /// PATCH requests sent and not yet settled, per record.
    pub updates_in_flight: BTreeMap<(ContentKind, ContentId), u32>,
    pub auth: AuthView,
}

impl Model {
    /// Backend and signed-in user, when both are present.
    pub fn connection(&self) -> Option<(&RemoteStore, &Session)> {
        self.remote.as_ref().zip(self.session.as_ref())
    }

    fn clear_account(&mut self) {
        self.session = None;
        self.board = Board::default();
        self.filter = CategoryFilter::default();
        self.focus = None;
        self.load = None;
        self.load_error = false;
        self.deferred.clear();
        self.updates_in_flight.clear();
    }

    fn update_sent(&mut self, kind: ContentKind, id: &ContentId) {
        *self.updates_in_flight.entry((kind, id.clone())).or_default() += 1;
    }

    /// Returns how many updates for the record are still outstanding.
    fn update_settled(&mut self, kind: ContentKind, id: &ContentId) -> u32 {
        let key = (kind, id.clone());
        let remaining = self
            .updates_in_flight
            .get(&key)
            .map_or(0, |n| n.saturating_sub(1));
        if remaining == 0 {
            self.updates_in_flight.remove(&key);
        } else {
            self.updates_in_flight.insert(key, remaining);
        }
        remaining
    }
}

#[derive(Default)]
pub struct App;

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(event = event.name(), "update");
        self.handle(event, model, caps);
        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        view::build(model)
    }
}

impl App {
    fn handle(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        match event {
            Event::Start { env } => self.start(&env, model, caps),
            Event::ReloadRequested => {
                if model.connection().is_some() {
                    self.begin_load(model, caps);
                } else {
                    debug!("reload ignored without a signed-in backend");
                }
            }
            Event::LoadErrorDismissed => model.load_error = false,

            Event::SignInRequested { email, password } => {
                self.sign_in(&email, &password, model, caps);
            }
            Event::SignUpRequested {
                email,
                password,
                confirm,
            } => self.sign_up(&email, &password, &confirm, model, caps),
            Event::SignOutRequested => self.sign_out(model, caps),

            Event::CategorySelected { filter } => model.filter = filter,

            Event::TheoryAdded(draft) => self.add::<Theory>(model, caps, |id| draft.into_theory(id)),
            Event::WishAdded(draft) => self.add::<Wish>(model, caps, |id| draft.into_wish(id)),
            Event::ImageAdded(draft) => {
                self.add::<VisionImage>(model, caps, |id| draft.into_image(id));
            }
            Event::VideoAdded(draft) => {
                self.add::<VisionVideo>(model, caps, |id| draft.into_video(id));
            }

            Event::TheoryEdited { id, draft } => {
                self.edit::<Theory>(model, caps, &id, |current| draft.into_theory(current.id));
            }
            Event::WishEdited { id, draft } => {
                self.edit::<Wish>(model, caps, &id, |mut current| {
                    current.apply_edit(draft.validate()?);
                    Ok(current)
                });
            }
            Event::ImageEdited { id, draft } => {
                self.edit::<VisionImage>(model, caps, &id, |current| draft.into_image(current.id));
            }
            Event::VideoEdited { id, draft } => {
                self.edit::<VisionVideo>(model, caps, &id, |current| draft.into_video(current.id));
            }
            Event::ContentDeleted { kind, id } => self.delete(kind, id, model, caps),
            Event::WishToggled { id } => self.toggle_wish(&id, model, caps),

            Event::FocusOpened => self.shuffle_focus(model),
            Event::FocusClosed => model.focus = None,
            Event::FocusNext => {
                if let Some(focus) = model.focus.as_mut() {
                    focus.next();
                }
            }
            Event::FocusPrevious => {
                if let Some(focus) = model.focus.as_mut() {
                    focus.previous();
                }
            }
            Event::FocusShuffled => {
                if model.focus.is_some() {
                    self.shuffle_focus(model);
                }
            }
            Event::FocusKeyPressed { key } => {
                let Some(focus) = model.focus.as_mut() else {
                    return;
                };
                match FocusKey::parse(&key) {
                    Some(FocusKey::Next) => focus.next(),
                    Some(FocusKey::Previous) => focus.previous(),
                    Some(FocusKey::Close) => model.focus = None,
                    None => {}
                }
            }

            Event::SessionRestored(result) => self.session_restored(result, model, caps),
            Event::SessionStored(result) => match result {
                Ok(_) => debug!("session storage updated"),
                Err(e) => warn!(error = ?e, "session storage failed"),
            },
            Event::SignedIn(result) => self.signed_in(*result, model, caps),
            Event::SignedUp(result) => {
                model.auth.busy = false;
                match *result {
                    Ok(_) => {
                        info!("account created");
                        model.auth.error = None;
                        model.auth.notice = Some(SIGN_UP_NOTICE.to_string());
                    }
                    Err(e) => {
                        let error = AppError::from_http(&e);
                        warn!(code = error.code(), "sign-up failed");
                        model.auth.error = Some(error.message);
                    }
                }
            }
            Event::SignedOut(result) => match *result {
                Ok(_) => debug!("session revoked"),
                Err(e) => warn!(error = %e, "session revoke failed"),
            },

            Event::TheoriesLoaded { generation, result } => {
                self.on_loaded::<Theory>(generation, *result, model, caps);
            }
            Event::WishesLoaded { generation, result } => {
                self.on_loaded::<Wish>(generation, *result, model, caps);
            }
            Event::ImagesLoaded { generation, result } => {
                self.on_loaded::<VisionImage>(generation, *result, model, caps);
            }
            Event::VideosLoaded { generation, result } => {
                self.on_loaded::<VisionVideo>(generation, *result, model, caps);
            }

            Event::TheoryInserted { local_id, result } => {
                self.on_inserted::<Theory>(local_id, *result, model, caps);
            }
            Event::WishInserted { local_id, result } => {
                self.on_inserted::<Wish>(local_id, *result, model, caps);
            }
            Event::ImageInserted { local_id, result } => {
                self.on_inserted::<VisionImage>(local_id, *result, model, caps);
            }
            Event::VideoInserted { local_id, result } => {
                self.on_inserted::<VisionVideo>(local_id, *result, model, caps);
            }

            Event::MutationSettled {
                kind,
                id,
                op,
                result,
            } => {
                let outstanding = match op {
                    MutationOp::Update => model.update_settled(kind, &id),
                    MutationOp::Delete => 0,
                };
                match *result {
                    Ok(_) => {
                        debug!(%kind, %id, ?op, outstanding, "mutation confirmed");
                        if op == MutationOp::Update && outstanding == 0 {
                            model.board.mark(kind, &id, SyncStatus::Confirmed);
                        }
                    }
                    Err(e) => {
                        let error = AppError::from_http(&e);
                        warn!(
                            %kind,
                            %id,
                            ?op,
                            code = error.code(),
                            retryable = error.is_retryable(),
                            error = %error,
                            "mutation failed"
                        );
                        if op == MutationOp::Update {
                            model.board.mark(kind, &id, SyncStatus::Failed);
                        }
                    }
                }
            }
        }
    }

    // --- Lifecycle ---

    fn start(&self, env: &Environment, model: &mut Model, caps: &Capabilities) {
        if model.started {
            warn!("start received twice; ignoring");
            return;
        }
        model.started = true;

        match BackendConfig::from_env(env) {
            Ok(Some(config)) => {
                info!(host = config.url().host_str().unwrap_or_default(), "remote store configured");
                model.remote = Some(RemoteStore::new(&config));
                model.restoring = true;
                caps.kv.get(KvKey::SESSION.raw(), Event::SessionRestored);
            }
            Ok(None) => {
                info!("no backend configured; running in fallback mode");
                Self::enter_fallback(model);
            }
            Err(e) => {
                warn!(error = %e, "backend configuration rejected; running in fallback mode");
                Self::enter_fallback(model);
            }
        }
    }

    fn enter_fallback(model: &mut Model) {
        model.remote = None;
        model.board = demo::board();
        model.route = Route::Board;
    }

    fn session_restored(&self, result: KvOutcome, model: &mut Model, caps: &Capabilities) {
        model.restoring = false;
        match result {
            Ok(Some(bytes)) => match auth::decode_session(&bytes) {
                Ok(session) => {
                    info!("session restored");
                    model.session = Some(session);
                    model.route = Route::Board;
                    self.begin_load(model, caps);
                }
                Err(e) => {
                    warn!(error = %e, "discarding unreadable session");
                    caps.kv.delete(KvKey::SESSION.raw(), Event::SessionStored);
                    model.route = Route::Auth;
                }
            },
            Ok(None) => model.route = Route::Auth,
            Err(e) => {
                warn!(error = ?e, "session lookup failed");
                model.route = Route::Auth;
            }
        }
    }

    // --- Auth ---

    fn sign_in(&self, email: &str, password: &Secret, model: &mut Model, caps: &Capabilities) {
        let Some(store) = &model.remote else {
            debug!("sign-in ignored in fallback mode");
            return;
        };
        if let Err(e) = auth::validate_sign_in(email, password) {
            model.auth.error = Some(e.to_string());
            return;
        }
        model.auth = AuthView {
            busy: true,
            ..AuthView::default()
        };
        if let Err(e) = auth::sign_in(store, &caps.http, email, password) {
            model.auth.busy = false;
            model.auth.error = Some(e.message);
        }
    }

    fn sign_up(
        &self,
        email: &str,
        password: &Secret,
        confirm: &Secret,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        let Some(store) = &model.remote else {
            debug!("sign-up ignored in fallback mode");
            return;
        };
        if let Err(e) = auth::validate_sign_up(email, password, confirm) {
            model.auth.error = Some(e.to_string());
            model.auth.notice = None;
            return;
        }
        model.auth = AuthView {
            busy: true,
            ..AuthView::default()
        };
        if let Err(e) = auth::sign_up(store, &caps.http, email, password) {
            model.auth.busy = false;
            model.auth.error = Some(e.message);
        }
    }

    fn signed_in(
        &self,
        result: crux_http::Result<crux_http::Response<auth::TokenResponse>>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        model.auth.busy = false;
        let token = match result {
            Ok(mut response) => response.take_body(),
            Err(e) => {
                let error = AppError::from_http(&e);
                warn!(code = error.code(), "sign-in failed");
                model.auth.error = Some(error.message);
                return;
            }
        };
        let Some(token) = token else {
            warn!("sign-in response had no body");
            model.auth.error = Some("Unexpected response from server".to_string());
            return;
        };

        let session = Session::from(token);
        info!(user = %session.user_id, "signed in");
        match auth::encode_session(&session) {
            Ok(bytes) => caps.kv.set(KvKey::SESSION.raw(), bytes, Event::SessionStored),
            Err(e) => warn!(error = %e, "session not persisted"),
        }
        model.clear_account();
        model.session = Some(session);
        model.auth = AuthView::default();
        model.route = Route::Board;
        self.begin_load(model, caps);
    }

    fn sign_out(&self, model: &mut Model, caps: &Capabilities) {
        let Some(store) = &model.remote else {
            debug!("sign-out ignored in fallback mode");
            return;
        };
        if let Some(session) = model.session.take() {
            auth::sign_out(store, &caps.http, &session);
        }
        caps.kv.delete(KvKey::SESSION.raw(), Event::SessionStored);
        model.clear_account();
        model.auth = AuthView::default();
        model.route = Route::Auth;
        info!("signed out");
    }

    fn expire_session(model: &mut Model, caps: &Capabilities) {
        warn!("access token rejected; signing out");
        caps.kv.delete(KvKey::SESSION.raw(), Event::SessionStored);
        model.clear_account();
        model.auth = AuthView {
            error: Some(SESSION_EXPIRED_MESSAGE.to_string()),
            ..AuthView::default()
        };
        model.route = Route::Auth;
    }

    // --- Load ---

    #[instrument(skip_all)]
    fn begin_load(&self, model: &mut Model, caps: &Capabilities) {
        if model.connection().is_none() {
            return;
        }
        model.load_generation += 1;
        let generation = model.load_generation;
        model.load = Some(PendingLoad::new(generation));
        model.load_error = false;

        if let Some((store, session)) = model.connection() {
            store.list::<Theory>(&caps.http, session, generation);
            store.list::<Wish>(&caps.http, session, generation);
            store.list::<VisionImage>(&caps.http, session, generation);
            store.list::<VisionVideo>(&caps.http, session, generation);
        }
        info!(generation, "loading board");
    }

    #[instrument(skip(self, result, model, caps), fields(table = T::TABLE))]
    fn on_loaded<T: RemoteRecord + Stored>(
        &self,
        generation: u64,
        result: crux_http::Result<crux_http::Response<Vec<T::Row>>>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        if model.load.as_ref().map(|l| l.generation) != Some(generation) {
            debug!("discarding stale load response");
            return;
        }

        match result {
            Ok(mut response) => {
                let items: Vec<T> = response
                    .take_body()
                    .unwrap_or_default()
                    .into_iter()
                    .map(T::from_row)
                    .collect();
                debug!(count = items.len(), "rows loaded");
                if let Some(load) = model.load.as_mut() {
                    *T::pending(load) = Some(items);
                }
                Self::finish_load(model);
            }
            Err(e) => {
                let error = AppError::from_http(&e);
                warn!(code = error.code(), error = %error, "load failed; aborting");
                model.load = None;
                model.load_error = true;
                if error.kind == ErrorKind::Authentication {
                    Self::expire_session(model, caps);
                }
            }
        }
    }

    fn finish_load(model: &mut Model) {
        if !model.load.as_ref().is_some_and(PendingLoad::is_complete) {
            return;
        }
        let Some(loaded) = model.load.take().and_then(PendingLoad::into_board) else {
            return;
        };

        let mut board = if loaded.is_empty() {
            info!("remote board is empty; showing demo content");
            demo::board()
        } else {
            info!(count = loaded.len(), "board loaded");
            loaded
        };
        carry_unsaved::<Theory>(&model.board, &mut board);
        carry_unsaved::<Wish>(&model.board, &mut board);
        carry_unsaved::<VisionImage>(&model.board, &mut board);
        carry_unsaved::<VisionVideo>(&model.board, &mut board);
        model.board = board;

        if let Some(focus) = model.focus.as_mut() {
            let board = &model.board;
            focus.retain(|item| board.contains(item.kind, &item.id));
        }
    }

    // --- Mutations ---

    #[instrument(skip_all, fields(kind = %T::KIND))]
    fn add<T: RemoteRecord + Stored>(
        &self,
        model: &mut Model,
        caps: &Capabilities,
        build: impl FnOnce(ContentId) -> Result<T, ValidationError>,
    ) {
        let id = model
            .board
            .collection::<T>()
            .next_local_id(get_current_time_ms());
        let item = match build(id) {
            Ok(item) => item,
            Err(e) => {
                debug!(error = %e, "ignoring invalid draft");
                return;
            }
        };

        let online = model.connection().is_some();
        model.board.collection_mut::<T>().add_local(Entry {
            item: item.clone(),
            sync: if online {
                SyncStatus::Inserting
            } else {
                SyncStatus::Local
            },
            persisted: false,
        });
        debug!(id = %item.id(), online, "record added");

        let sent = model
            .connection()
            .map(|(store, session)| store.insert(&caps.http, session, &item));
        if let Some(Err(e)) = sent {
            warn!(error = %e, "insert not sent");
            model
                .board
                .collection_mut::<T>()
                .mark(item.id(), SyncStatus::Failed);
        }
    }

    #[instrument(skip(self, result, model, caps), fields(kind = %T::KIND))]
    fn on_inserted<T: RemoteRecord + Stored>(
        &self,
        local_id: ContentId,
        result: crux_http::Result<crux_http::Response<Vec<T::Row>>>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        let deferred = model.deferred.remove(&(T::KIND, local_id.clone()));

        let confirmed = match result {
            Ok(response) => confirmed_row::<T>(response),
            Err(e) => {
                let error = AppError::from_http(&e);
                warn!(
                    code = error.code(),
                    retryable = error.is_retryable(),
                    error = %error,
                    "insert failed"
                );
                model
                    .board
                    .collection_mut::<T>()
                    .mark(&local_id, SyncStatus::Failed);
                return;
            }
        };
        let Some(confirmed) = confirmed else {
            warn!("insert response carried no row");
            model
                .board
                .collection_mut::<T>()
                .mark(&local_id, SyncStatus::Failed);
            return;
        };

        let server_id = confirmed.id().clone();
        info!(server_id = %server_id, ?deferred, "insert confirmed");

        match deferred {
            Some(Deferred::Delete) => {
                if let Some((store, session)) = model.connection() {
                    store.delete(&caps.http, session, T::KIND, &server_id);
                }
            }
            Some(Deferred::Update) => {
                let Some(mut local) = model
                    .board
                    .collection::<T>()
                    .get(&local_id)
                    .map(|e| e.item.clone())
                else {
                    return;
                };
                local.set_id(server_id.clone());
                model
                    .board
                    .collection_mut::<T>()
                    .confirm_insert(&local_id, local.clone());
                self.push_update(&local, model, caps);
            }
            None => {
                if !model
                    .board
                    .collection_mut::<T>()
                    .confirm_insert(&local_id, confirmed)
                {
                    debug!("confirmed record is no longer on the board");
                }
            }
        }

        if let Some(focus) = model.focus.as_mut() {
            focus.rename(T::KIND, &local_id, &server_id);
        }
    }

    fn edit<T: RemoteRecord + Stored>(
        &self,
        model: &mut Model,
        caps: &Capabilities,
        id: &ContentId,
        build: impl FnOnce(T) -> Result<T, ValidationError>,
    ) {
        let Some(current) = model.board.collection::<T>().get(id) else {
            debug!(kind = %T::KIND, %id, "edit for unknown record");
            return;
        };
        let state = (current.sync, current.persisted);
        let item = match build(current.item.clone()) {
            Ok(item) => item,
            Err(e) => {
                debug!(kind = %T::KIND, %id, error = %e, "ignoring invalid edit");
                return;
            }
        };
        model.board.collection_mut::<T>().replace_by_id(item.clone());
        self.sync_edit(&item, state, model, caps);
    }

    fn toggle_wish(&self, id: &ContentId, model: &mut Model, caps: &Capabilities) {
        let Some(state) = model.board.state(ContentKind::Wish, id) else {
            debug!(%id, "toggle for unknown wish");
            return;
        };
        let Some(wish) = model.board.toggle_wish_completion(id).cloned() else {
            return;
        };
        debug!(%id, completed = wish.completed(), "wish toggled");
        self.sync_edit(&wish, state, model, caps);
    }

    /// Sends an edit now, defers it behind an in-flight insert, or keeps it
    /// local for records the server has never seen.
    fn sync_edit<T: RemoteRecord + Stored>(
        &self,
        item: &T,
        (sync, persisted): (SyncStatus, bool),
        model: &mut Model,
        caps: &Capabilities,
    ) {
        if persisted {
            self.push_update(item, model, caps);
        } else if sync == SyncStatus::Inserting {
            debug!(kind = %T::KIND, id = %item.id(), "deferring edit until insert confirms");
            model
                .deferred
                .insert((T::KIND, item.id().clone()), Deferred::Update);
        }
    }

    #[instrument(skip_all, fields(kind = %T::KIND, id = %item.id()))]
    fn push_update<T: RemoteRecord + Stored>(&self, item: &T, model: &mut Model, caps: &Capabilities) {
        let sent = model
            .connection()
            .map(|(store, session)| store.update(&caps.http, session, item));
        let status = match sent {
            Some(Ok(())) => {
                model.update_sent(T::KIND, item.id());
                SyncStatus::Pending
            }
            Some(Err(e)) => {
                warn!(error = %e, "update not sent");
                SyncStatus::Failed
            }
            None => return,
        };
        model.board.collection_mut::<T>().mark(item.id(), status);
    }

    fn delete(&self, kind: ContentKind, id: ContentId, model: &mut Model, caps: &Capabilities) {
        let Some((sync, persisted)) = model.board.state(kind, &id) else {
            debug!(%kind, %id, "delete for unknown record");
            return;
        };
        model.board.remove(kind, &id);
        model.updates_in_flight.remove(&(kind, id.clone()));
        if let Some(focus) = model.focus.as_mut() {
            focus.remove(kind, &id);
        }

        if persisted {
            if let Some((store, session)) = model.connection() {
                store.delete(&caps.http, session, kind, &id);
            }
        } else if sync == SyncStatus::Inserting {
            debug!(%kind, %id, "deferring delete until insert confirms");
            model.deferred.insert((kind, id), Deferred::Delete);
        }
    }

    fn shuffle_focus(&self, model: &mut Model) {
        let sequence = FocusSequence::shuffled(&model.board, &mut rand::thread_rng());
        debug!(len = sequence.len(), "focus sequence shuffled");
        model.focus = Some(sequence);
    }
}

/// Keeps what the server has not accepted yet across a board reload:
/// records whose insert is in flight or failed, and the local copy of
/// persisted records with an unconfirmed edit.
fn carry_unsaved<T: Stored>(from: &Board, to: &mut Board) {
    let mut unsaved = Vec::new();
    for entry in from.collection::<T>().entries() {
        match (entry.persisted, entry.sync) {
            (false, SyncStatus::Inserting | SyncStatus::Failed) => {
                if !to.collection::<T>().contains(entry.item.id()) {
                    unsaved.push(entry.clone());
                }
            }
            (true, SyncStatus::Pending | SyncStatus::Failed) => {
                if !to.collection_mut::<T>().restore(entry.clone()) {
                    debug!(kind = %T::KIND, id = %entry.item.id(), "edited record is gone from the server");
                }
            }
            _ => {}
        }
    }
    for entry in unsaved.into_iter().rev() {
        to.collection_mut::<T>().add_local(entry);
    }
}
