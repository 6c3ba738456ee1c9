pub mod http;
pub mod kv;

pub use self::http::Endpoints;
pub use self::kv::{KeyNamespace, KvError, KvKey};

// Crux's built-in Render covers view updates; no custom render capability.
pub use crux_core::render::Render;
pub use crux_http::Http;
pub use crux_kv::KeyValue;

use crate::app::App;
use crate::event::Event;

// Field types must be spelled `Capability<Event>`: the derive names effect
// variants after them.
#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub kv: KeyValue<Event>,
    pub render: Render<Event>,
}
