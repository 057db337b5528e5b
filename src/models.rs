use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of posts the API returns for a full page.
pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub owner_username: String,
    #[serde(default)]
    pub slug: String,
    // Comments come back with a null title
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tabcoins: i64,
    #[serde(default)]
    pub children_deep_count: u64,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl Post {
    pub fn title_text(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    /// Public page of this post on the site.
    pub fn web_url(&self, site_url: &str) -> String {
        format!(
            "{}/{}/{}",
            site_url.trim_end_matches('/'),
            urlencoding::encode(&self.owner_username),
            urlencoding::encode(&self.slug)
        )
    }

    pub fn published_label(&self) -> String {
        self.published_at
            .map(|at| at.format("%d/%m/%Y").to_string())
            .unwrap_or_default()
    }
}

/// One page of the listing, tagged with the index used to request it.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub index: u32,
    pub posts: Vec<Post>,
}

impl Page {
    pub fn new(index: u32, posts: Vec<Post>) -> Self {
        Self { index, posts }
    }

    /// A page shorter than [`PAGE_SIZE`] is the last one.
    pub fn is_full(&self) -> bool {
        self.posts.len() == PAGE_SIZE
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub tabcoins: i64,
    #[serde(default)]
    pub tabcash: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TabcoinsUpdate {
    #[serde(default)]
    pub tabcoins: i64,
}

/// Server-side ranking used for the listing. Each strategy is its own
/// pagination sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    #[default]
    Relevant,
    New,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Relevant, Strategy::New];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Relevant => "relevant",
            Strategy::New => "new",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Relevant => "Relevant",
            Strategy::New => "Newest",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevant" => Ok(Strategy::Relevant),
            "new" => Ok(Strategy::New),
            other => Err(format!("unknown strategy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostFilter {
    #[default]
    All,
    Pitch,
    Question,
}

impl PostFilter {
    pub const ALL: [PostFilter; 3] = [PostFilter::All, PostFilter::Pitch, PostFilter::Question];

    /// Title tags that select a post. `[PITh]` is kept because existing
    /// posts were tagged with it.
    pub fn tags(&self) -> &'static [&'static str] {
        match self {
            PostFilter::All => &[],
            PostFilter::Pitch => &["[PITCH]", "[PIT]", "[PITh]"],
            PostFilter::Question => &["[DÚVIDA]", "[DUVIDA]", "[AJUDA]"],
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        if *self == PostFilter::All {
            return true;
        }
        let title = post.title_text().to_lowercase();
        self.tags()
            .iter()
            .any(|tag| title.contains(&tag.to_lowercase()))
    }

    pub fn label(&self) -> &'static str {
        match self {
            PostFilter::All => "All",
            PostFilter::Pitch => "Pitch",
            PostFilter::Question => "Question",
        }
    }
}

/// Posts shown per feed row, always within 1..=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSize(usize);

impl GroupSize {
    pub const MIN: usize = 1;
    pub const MAX: usize = 3;

    pub fn new(size: usize) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&size).then_some(Self(size))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for GroupSize {
    fn default() -> Self {
        Self(2)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayGroup {
    Posts(Vec<Post>),
    Interstitial,
}

#[cfg(test)]
pub(crate) fn sample_post(id: &str, title: &str) -> Post {
    Post {
        id: id.to_string(),
        owner_username: "autor".to_string(),
        slug: format!("post-{}", id),
        title: Some(title.to_string()),
        body: Some(format!("Body of {}", id)),
        published_at: None,
        tabcoins: 1,
        children_deep_count: 0,
        parent_id: None,
        source_url: None,
    }
}

#[cfg(test)]
pub(crate) fn sample_posts(prefix: &str, count: usize) -> Vec<Post> {
    (0..count)
        .map(|i| sample_post(&format!("{}-{}", prefix, i), &format!("Post {}", i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_deserializes_from_api_json() {
        let json = serde_json::json!({
            "id": "abc",
            "owner_id": "u1",
            "parent_id": null,
            "slug": "minha-startup",
            "title": "[PITCH] Minha startup",
            "body": "Texto",
            "status": "published",
            "source_url": null,
            "created_at": "2024-01-02T10:00:00.000Z",
            "updated_at": "2024-01-02T10:00:00.000Z",
            "published_at": "2024-01-02T10:00:00.000Z",
            "deleted_at": null,
            "owner_username": "ana",
            "tabcoins": 12,
            "children_deep_count": 3
        });

        let post: Post = serde_json::from_value(json).unwrap();
        assert_eq!(post.owner_username, "ana");
        assert_eq!(post.tabcoins, 12);
        assert_eq!(post.children_deep_count, 3);
        assert_eq!(post.published_label(), "02/01/2024");
        assert_eq!(
            post.web_url("https://www.tabnews.com.br/"),
            "https://www.tabnews.com.br/ana/minha-startup"
        );
    }

    #[test]
    fn comment_without_title_matches_nothing_but_all() {
        let mut comment = sample_post("c1", "");
        comment.title = None;
        assert!(PostFilter::All.matches(&comment));
        assert!(!PostFilter::Pitch.matches(&comment));
        assert!(!PostFilter::Question.matches(&comment));
    }

    #[test]
    fn filters_match_tags_case_insensitively() {
        let pitch = sample_post("1", "[PITCH] Minha startup");
        assert!(PostFilter::Pitch.matches(&pitch));
        assert!(!PostFilter::Question.matches(&pitch));

        let help = sample_post("2", "Preciso de [AJUDA]");
        assert!(PostFilter::Question.matches(&help));
        assert!(!PostFilter::Pitch.matches(&help));

        assert!(PostFilter::Pitch.matches(&sample_post("3", "[pith] typo tag")));
        assert!(PostFilter::Question.matches(&sample_post("4", "[dúvida] rust ou go?")));
        assert!(PostFilter::Question.matches(&sample_post("5", "[Duvida] sem acento")));
    }

    #[test]
    fn group_size_is_bounded() {
        assert_eq!(GroupSize::default().get(), 2);
        assert!(GroupSize::new(0).is_none());
        assert!(GroupSize::new(4).is_none());
        assert_eq!(GroupSize::new(3).map(|s| s.get()), Some(3));
    }

    #[test]
    fn strategy_round_trips_through_its_name() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.as_str().parse::<Strategy>(), Ok(strategy));
        }
        assert!("hot".parse::<Strategy>().is_err());
    }
}
