use serde_json::Value;

use super::resource::Resource;

pub struct Projects;

impl Resource for Projects {
    const COLLECTION: &'static str = "projects";
    const LABEL: &'static str = "Project";
    const UPDATE_FIELDS: &'static [&'static str] = &[
        "project_name",
        "project_image",
        "project_description",
        "features",
        "github_link",
        "deploy_link",
    ];

    // Only updates drop empty features; inserts store the list as sent.
    fn normalize_update(field: &str, value: Value) -> Value {
        match (field, value) {
            ("features", Value::Array(features)) => Value::Array(
                features
                    .into_iter()
                    .filter(|feature| feature.as_str() != Some(""))
                    .collect(),
            ),
            (_, value) => value,
        }
    }
}
