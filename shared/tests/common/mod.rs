#![allow(dead_code)]

use crux_core::testing::{AppTester, Update};
use crux_core::Request;
use crux_http::protocol::{HttpRequest, HttpResponse, HttpResult};
use crux_kv::value::Value;
use crux_kv::{KeyValueOperation, KeyValueResponse, KeyValueResult};
use serde_json::{json, Value as Json};
use vision_shared::config::Environment;
use vision_shared::{App, Effect, Event, Model, Secret};

pub type Tester = AppTester<App, Effect>;

pub const BASE: &str = "https://demo.supabase.co";

pub fn remote_env() -> Environment {
    Environment::new()
        .with("VITE_SUPABASE_URL", BASE)
        .with("VITE_SUPABASE_PUBLISHABLE_KEY", "anon-key")
}

/// Feeds every event an update produced back into the app, collecting the
/// effects along the way.
pub fn settle(app: &Tester, model: &mut Model, update: Update<Effect, Event>) -> Vec<Effect> {
    let mut effects = update.effects;
    let mut queue = update.events;
    while !queue.is_empty() {
        let event = queue.remove(0);
        let next = app.update(event, model);
        effects.extend(next.effects);
        queue.extend(next.events);
    }
    effects
}

pub fn send(app: &Tester, model: &mut Model, event: Event) -> Vec<Effect> {
    let update = app.update(event, model);
    settle(app, model, update)
}

pub fn http_requests(effects: Vec<Effect>) -> Vec<Request<HttpRequest>> {
    effects
        .into_iter()
        .filter_map(|e| match e {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect()
}

pub fn kv_requests(effects: Vec<Effect>) -> Vec<Request<KeyValueOperation>> {
    effects
        .into_iter()
        .filter_map(|e| match e {
            Effect::KeyValue(request) => Some(request),
            _ => None,
        })
        .collect()
}

pub fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

pub fn body_json(request: &HttpRequest) -> Json {
    serde_json::from_slice(&request.body).unwrap_or(Json::Null)
}

pub fn respond(
    app: &Tester,
    model: &mut Model,
    request: &mut Request<HttpRequest>,
    status: u16,
    body: Json,
) -> Vec<Effect> {
    let response = HttpResponse::status(status).json(body).build();
    let update = app
        .resolve(request, HttpResult::Ok(response))
        .expect("http request resolves");
    settle(app, model, update)
}

pub fn resolve_kv(
    app: &Tester,
    model: &mut Model,
    request: &mut Request<KeyValueOperation>,
    stored: Option<Vec<u8>>,
) -> Vec<Effect> {
    let value = stored.map_or(Value::None, Value::from);
    let result = KeyValueResult::Ok {
        response: KeyValueResponse::Get { value },
    };
    let update = app.resolve(request, result).expect("kv request resolves");
    settle(app, model, update)
}

pub fn table_of(request: &HttpRequest) -> &str {
    ["vision_theories", "vision_wishes", "vision_images", "vision_videos"]
        .into_iter()
        .find(|t| request.url.contains(t))
        .unwrap_or("")
}

pub fn token_body() -> Json {
    json!({
        "access_token": "user-token",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh",
        "user": {"id": "user-1", "email": "me@example.com"}
    })
}

/// Starts in remote mode with no stored session; the app lands on the auth
/// route.
pub fn start_signed_out(app: &Tester, model: &mut Model) {
    let effects = send(app, model, Event::Start { env: remote_env() });
    let mut kv = kv_requests(effects);
    assert_eq!(kv.len(), 1);
    resolve_kv(app, model, &mut kv[0], None);
}

/// Signs in and returns the four list requests of the initial load.
pub fn sign_in(app: &Tester, model: &mut Model) -> Vec<Request<HttpRequest>> {
    let effects = send(
        app,
        model,
        Event::SignInRequested {
            email: "me@example.com".into(),
            password: Secret::new("hunter22"),
        },
    );
    let mut grant = http_requests(effects);
    assert_eq!(grant.len(), 1);
    http_requests(respond(app, model, &mut grant[0], 200, token_body()))
}

/// Answers every list request, using `rows` for the named table and `[]`
/// for the rest.
pub fn answer_lists(
    app: &Tester,
    model: &mut Model,
    requests: Vec<Request<HttpRequest>>,
    rows: &[(&str, Json)],
) -> Vec<Effect> {
    let mut effects = Vec::new();
    for mut request in requests {
        let table = table_of(&request.operation).to_string();
        let body = rows
            .iter()
            .find(|(t, _)| *t == table)
            .map_or_else(|| json!([]), |(_, b)| b.clone());
        effects.extend(respond(app, model, &mut request, 200, body));
    }
    effects
}

/// Remote mode, signed in, with the given rows loaded.
pub fn loaded(app: &Tester, model: &mut Model, rows: &[(&str, Json)]) {
    start_signed_out(app, model);
    let lists = sign_in(app, model);
    assert_eq!(lists.len(), 4);
    answer_lists(app, model, lists, rows);
}
