use super::resource::Resource;

pub struct Skills;

impl Resource for Skills {
    const COLLECTION: &'static str = "skills";
    const LABEL: &'static str = "Skill";
    const UPDATE_FIELDS: &'static [&'static str] = &["title", "imageUrl"];
}
