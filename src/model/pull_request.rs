use crate::utils::time::{display_time, to_display_timezone};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestRecord {
    pub author: String,
    pub title: String,
    pub repository: String,
    pub source_branch: String,
    pub destination_branch: String,
    #[serde(serialize_with = "serialize_display_time")]
    pub created_on: DateTime<FixedOffset>,
    pub url: String,
}

// New
impl PullRequestRecord {
    pub fn new(
        author: impl ToString,
        title: impl ToString,
        repository: impl ToString,
        source_branch: impl ToString,
        destination_branch: impl ToString,
        created_on: DateTime<Utc>,
        url: impl ToString,
    ) -> Self {
        Self {
            author: author.to_string(),
            title: title.to_string(),
            repository: repository.to_string(),
            source_branch: source_branch.to_string(),
            destination_branch: destination_branch.to_string(),
            created_on: to_display_timezone(&created_on),
            url: url.to_string(),
        }
    }

    pub fn created_on_display(&self) -> String {
        display_time(&self.created_on)
    }

    /// Author names compare without case or spaces: "Jane Doe" == "janedoe".
    pub fn authored_by_any(&self, authors: &[String]) -> bool {
        authors.is_empty() || authors.contains(&normalize_author(&self.author))
    }
}

pub fn normalize_author(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "")
}

/// Splits a comma separated author filter into normalized names.
pub fn parse_author_filter(authors: Option<&str>) -> Vec<String> {
    authors
        .unwrap_or_default()
        .split(',')
        .map(normalize_author)
        .filter(|name| !name.is_empty())
        .collect()
}

fn serialize_display_time<S: Serializer>(
    datetime: &DateTime<FixedOffset>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&display_time(datetime))
}
