//! Typed site articles: announcements, news, guides and science pieces.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discriminator sent as the `type` query parameter of `/articles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArticleKind {
    #[serde(rename = "tongzhi")]
    Announcement,
    #[serde(rename = "xinwen")]
    News,
    #[serde(rename = "zhinan")]
    Guide,
    #[serde(rename = "kepu")]
    Science,
}

impl ArticleKind {
    pub const ALL: [ArticleKind; 4] = [
        ArticleKind::Announcement,
        ArticleKind::News,
        ArticleKind::Guide,
        ArticleKind::Science,
    ];

    /// Wire value of the discriminator.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleKind::Announcement => "tongzhi",
            ArticleKind::News => "xinwen",
            ArticleKind::Guide => "zhinan",
            ArticleKind::Science => "kepu",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ArticleKind::Announcement => "Announcements",
            ArticleKind::News => "News",
            ArticleKind::Guide => "Service Guides",
            ArticleKind::Science => "Health Science",
        }
    }
}

impl fmt::Display for ArticleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleKind {
    type Err = String;

    /// Accepts the wire value or the English name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tongzhi" | "announcement" | "announcements" => Ok(ArticleKind::Announcement),
            "xinwen" | "news" => Ok(ArticleKind::News),
            "zhinan" | "guide" | "guides" => Ok(ArticleKind::Guide),
            "kepu" | "science" => Ok(ArticleKind::Science),
            other => Err(format!("Unknown article type: {}", other)),
        }
    }
}

/// An article entry. Most entries link out to the campus site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub pic: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Fields accepted when creating or updating an article.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// One page of `/articles?size=&index=&type=`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticlePage {
    #[serde(default, alias = "article_list", alias = "list")]
    pub articles: Vec<Article>,
    #[serde(default, alias = "count")]
    pub total: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!("kepu".parse::<ArticleKind>().unwrap(), ArticleKind::Science);
        assert_eq!("News".parse::<ArticleKind>().unwrap(), ArticleKind::News);
        assert_eq!(" guides ".parse::<ArticleKind>().unwrap(), ArticleKind::Guide);
        assert!("blog".parse::<ArticleKind>().is_err());
    }

    #[test]
    fn test_kind_wire_value_matches_serde() {
        for kind in ArticleKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_article_page_aliases() {
        let json = r#"{"article_list":[{"id":2,"title":"Campus nucleic acid testing notice","url":"https://hq.qd.sdu.edu.cn/info/1014/2034.htm"}],"count":2}"#;
        let page: ArticlePage = serde_json::from_str(json).unwrap();
        assert_eq!(page.articles.len(), 1);
        assert_eq!(page.total, Some(2));
        assert!(page.articles[0].pic.is_none());
    }
}
