//! Blog posts read from markdown files with YAML front matter.
//!
//! Posts live in `<content_dir>/blog/*.md`. The file stem is the slug. Each
//! file starts with a `---` delimited YAML block holding `title`,
//! `description`, `date` and optionally `tags` and `draft`. Drafts are
//! dropped at load time.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0} has no front matter block")]
    MissingFrontMatter(PathBuf),

    #[error("Invalid front matter in {path}: {source}")]
    FrontMatter {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Deserialize)]
struct FrontMatter {
    title: String,
    description: String,
    date: NaiveDate,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    draft: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlogPost {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub tags: Vec<String>,
    /// Markdown after the front matter.
    pub body: String,
}

/// Published posts, newest first.
#[derive(Debug, Clone)]
pub struct ContentStore {
    posts: Vec<BlogPost>,
    loaded_at: DateTime<Utc>,
}

impl ContentStore {
    /// Loads every published post. A missing `blog` directory gives an empty
    /// store; a malformed post is logged and skipped.
    pub fn load(content_dir: &Path) -> Result<Self, ContentError> {
        let blog_dir = content_dir.join("blog");
        if !blog_dir.is_dir() {
            debug!("No blog directory at {}", blog_dir.display());
            return Ok(Self::from_posts(Vec::new()));
        }

        let entries = std::fs::read_dir(&blog_dir).map_err(|source| ContentError::Io {
            path: blog_dir.clone(),
            source,
        })?;

        let mut posts = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| ContentError::Io {
                    path: blog_dir.clone(),
                    source,
                })?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }

            match read_post(&path) {
                Ok(Some(post)) => posts.push(post),
                Ok(None) => debug!("Skipping draft {}", path.display()),
                Err(e) => warn!("Skipping blog post: {}", e),
            }
        }

        Ok(Self::from_posts(posts))
    }

    pub fn from_posts(mut posts: Vec<BlogPost>) -> Self {
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
        info!("Loaded {} blog posts", posts.len());
        Self {
            posts,
            loaded_at: Utc::now(),
        }
    }

    /// When the posts were read.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Publication date of the newest post, as midnight UTC.
    pub fn newest_post_at(&self) -> Option<DateTime<Utc>> {
        self.posts
            .first()
            .and_then(|post| post.date.and_hms_opt(0, 0, 0))
            .map(|at| at.and_utc())
    }

    pub fn posts(&self) -> &[BlogPost] {
        &self.posts
    }

    pub fn post(&self, slug: &str) -> Option<&BlogPost> {
        self.posts.iter().find(|p| p.slug == slug)
    }
}

fn read_post(path: &Path) -> Result<Option<BlogPost>, ContentError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let slug = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    parse_post(&slug, &raw).map_err(|e| match e {
        ParseError::Missing => ContentError::MissingFrontMatter(path.to_path_buf()),
        ParseError::Yaml(source) => ContentError::FrontMatter {
            path: path.to_path_buf(),
            source,
        },
    })
}

enum ParseError {
    Missing,
    Yaml(serde_yaml::Error),
}

/// Splits front matter from the body. Returns `None` for drafts.
fn parse_post(slug: &str, raw: &str) -> Result<Option<BlogPost>, ParseError> {
    let rest = raw
        .trim_start_matches('\u{feff}')
        .strip_prefix("---")
        .ok_or(ParseError::Missing)?;
    let (yaml, body) = rest.split_once("\n---").ok_or(ParseError::Missing)?;
    let body = body.split_once('\n').map(|(_, b)| b).unwrap_or_default();

    let front: FrontMatter = serde_yaml::from_str(yaml).map_err(ParseError::Yaml)?;
    if front.draft {
        return Ok(None);
    }

    Ok(Some(BlogPost {
        slug: slug.to_string(),
        title: front.title,
        description: front.description,
        date: front.date,
        tags: front.tags,
        body: body.trim_start_matches(['\r', '\n']).to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST: &str = "---\ntitle: Preparing for your first session\ndescription: What to bring\ndate: 2024-03-01\ntags: [basics]\n---\n\n# Welcome\nBring your IC.\n";

    #[test]
    fn test_parse_post() {
        let post = parse_post("first-session", POST).ok().flatten().unwrap();
        assert_eq!(post.title, "Preparing for your first session");
        assert_eq!(post.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(post.tags, vec!["basics".to_string()]);
        assert_eq!(post.body, "# Welcome\nBring your IC.\n");
    }

    #[test]
    fn test_load_hides_drafts_and_sorts_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let blog = dir.path().join("blog");
        std::fs::create_dir_all(&blog).unwrap();
        std::fs::write(blog.join("first-session.md"), POST).unwrap();
        std::fs::write(
            blog.join("diet-tips.md"),
            "---\ntitle: Diet tips\ndescription: Eating well\ndate: 2024-05-10\n---\nLess salt.\n",
        )
        .unwrap();
        std::fs::write(
            blog.join("upcoming.md"),
            "---\ntitle: Upcoming\ndescription: Soon\ndate: 2024-06-01\ndraft: true\n---\nTBD\n",
        )
        .unwrap();
        std::fs::write(blog.join("broken.md"), "no front matter here").unwrap();
        std::fs::write(blog.join("notes.txt"), "ignored").unwrap();

        let store = ContentStore::load(dir.path()).unwrap();
        let slugs: Vec<&str> = store.posts().iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["diet-tips", "first-session"]);
        assert!(store.post("upcoming").is_none());
        assert_eq!(
            store.newest_post_at().unwrap().to_rfc3339(),
            "2024-05-10T00:00:00+00:00"
        );
    }

    #[test]
    fn test_missing_blog_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::load(dir.path()).unwrap();
        assert!(store.posts().is_empty());
        assert!(store.newest_post_at().is_none());
    }
}
