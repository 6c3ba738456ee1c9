//! Addressing and authorizing requests to the hosted backend.
//!
//! Tables are served by PostgREST under `rest/v1/` and accounts by GoTrue
//! under `auth/v1/`. Filters are encoded as query pairs (`user_id=eq.<id>`).

use crux_http::RequestBuilder;
use url::Url;

use crate::event::Secret;
use crate::model::{ContentId, UserId};

pub const REST_PATH: &str = "rest/v1/";
pub const AUTH_PATH: &str = "auth/v1/";

pub const HEADER_API_KEY: &str = "apikey";
pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_PREFER: &str = "Prefer";
pub const RETURN_REPRESENTATION: &str = "return=representation";
pub const RETURN_MINIMAL: &str = "return=minimal";

pub const ORDER_NEWEST_FIRST: &str = "created_at.desc";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    #[must_use]
    pub fn new(base: &Url) -> Self {
        let mut base = base.clone();
        base.set_query(None);
        base.set_fragment(None);
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { base }
    }

    fn join(&self, prefix: &str, path: &str) -> Url {
        let mut url = self.base.clone();
        let joined = format!("{}{prefix}{}", self.base.path(), path.trim_start_matches('/'));
        url.set_path(&joined);
        url
    }

    #[must_use]
    pub fn table(&self, table: &str) -> Url {
        self.join(REST_PATH, table)
    }

    /// All rows owned by `user`, newest first.
    #[must_use]
    pub fn list(&self, table: &str, user: &UserId) -> Url {
        let mut url = self.table(table);
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("user_id", &format!("eq.{}", user.as_str()))
            .append_pair("order", ORDER_NEWEST_FIRST);
        url
    }

    #[must_use]
    pub fn row(&self, table: &str, id: &ContentId) -> Url {
        let mut url = self.table(table);
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{}", id.as_str()));
        url
    }

    #[must_use]
    pub fn password_grant(&self) -> Url {
        let mut url = self.join(AUTH_PATH, "token");
        url.query_pairs_mut().append_pair("grant_type", "password");
        url
    }

    #[must_use]
    pub fn sign_up(&self) -> Url {
        self.join(AUTH_PATH, "signup")
    }

    #[must_use]
    pub fn sign_out(&self) -> Url {
        self.join(AUTH_PATH, "logout")
    }
}

/// Adds the project key and bearer token every backend call needs. Without a
/// user token the anon key doubles as the bearer.
pub fn authorize<Ev, T>(
    builder: RequestBuilder<Ev, T>,
    anon_key: &Secret,
    access_token: Option<&Secret>,
) -> RequestBuilder<Ev, T>
where
    Ev: 'static,
    T: 'static,
{
    let bearer = access_token.unwrap_or(anon_key);
    builder
        .header(HEADER_API_KEY, anon_key.expose())
        .header(HEADER_AUTHORIZATION, format!("Bearer {}", bearer.expose()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints(base: &str) -> Endpoints {
        Endpoints::new(&Url::parse(base).unwrap())
    }

    #[test]
    fn list_url_filters_by_owner_and_orders_newest_first() {
        let url = endpoints("https://abc.supabase.co").list("vision_wishes", &UserId::new("u-1"));
        assert_eq!(url.path(), "/rest/v1/vision_wishes");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("select".to_string(), "*".to_string()),
                ("user_id".to_string(), "eq.u-1".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
    }

    #[test]
    fn row_url_encodes_id() {
        let url = endpoints("https://abc.supabase.co").row("vision_images", &ContentId::new("a b&c"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("id".to_string(), "eq.a b&c".to_string())]);
        assert!(!url.as_str().contains("a b&c"));
    }

    #[test]
    fn base_path_is_preserved() {
        let e = endpoints("https://proxy.example.com/supabase?x=1");
        assert_eq!(e.table("vision_theories").path(), "/supabase/rest/v1/vision_theories");
        assert_eq!(e.sign_up().path(), "/supabase/auth/v1/signup");
        assert_eq!(e.table("t").query(), None);
    }

    #[test]
    fn password_grant_url() {
        let url = endpoints("https://abc.supabase.co/").password_grant();
        assert_eq!(url.as_str(), "https://abc.supabase.co/auth/v1/token?grant_type=password");
    }

    #[test]
    fn sign_out_url() {
        assert_eq!(
            endpoints("https://abc.supabase.co").sign_out().as_str(),
            "https://abc.supabase.co/auth/v1/logout"
        );
    }
}
