/**
 * Blog Routes
 * Blog posts, the only collection with a single-document route
 */
use axum::{routing::get, Router};
use chrono::Local;
use serde_json::Value;

use super::resource::{self, Resource};
use crate::{db::Fields, state::AppState};

pub struct Blogs;

impl Resource for Blogs {
    const COLLECTION: &'static str = "blogs";
    const LABEL: &'static str = "Blog";
    const UPDATE_FIELDS: &'static [&'static str] = &["blog_name", "blog_image", "blog_description"];

    /// Stamp the publication date, overriding any client-sent value.
    fn prepare_insert(document: &mut Fields) {
        document.insert(
            "time_published".to_string(),
            Value::String(publication_date()),
        );
    }
}

/// Today's date on the server's local calendar, as `YYYY-MM-DD`.
pub fn publication_date() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

pub fn routes(state: &AppState) -> Router<AppState> {
    resource::routes::<Blogs>(state).route("/blogs/{id}", get(resource::get_one::<Blogs>))
}
