static DEFAULT_TITLE: &str = "Audio";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    pub src: String,
    pub title: String,
}

impl Track {
    pub fn new(src: impl Into<String>, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            src: src.into(),
            title: if title.is_empty() {
                DEFAULT_TITLE.to_owned()
            } else {
                title
            },
        }
    }
}
