//! In-memory content store
//!
//! The store owns exactly one immutable [`Snapshot`] at a time. Readers
//! clone the `Arc` under a read lock and do all sorting and filtering on
//! their private handle; a refresh builds a fresh snapshot off to the side
//! and swaps the reference under the write lock. Neither critical section
//! depends on the number of posts.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::content::Post;

/// Below this many posts a search runs on the calling thread
const PARALLEL_SEARCH_THRESHOLD: usize = 256;

/// An immutable set of published posts keyed by slug
#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    posts: HashMap<String, Arc<Post>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a post, replacing and returning any post with the same slug
    pub fn insert(&mut self, post: Post) -> Option<Arc<Post>> {
        self.posts.insert(post.slug.clone(), Arc::new(post))
    }

    pub fn get(&self, slug: &str) -> Option<&Arc<Post>> {
        self.posts.get(slug)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Posts in no particular order
    pub fn posts(&self) -> impl Iterator<Item = &Arc<Post>> {
        self.posts.values()
    }
}

impl FromIterator<Post> for Snapshot {
    /// Later posts win slug collisions
    fn from_iter<I: IntoIterator<Item = Post>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for post in iter {
            snapshot.insert(post);
        }
        snapshot
    }
}

/// Concurrency-safe holder of the live snapshot
#[derive(Debug, Default)]
pub struct ContentStore {
    current: RwLock<Arc<Snapshot>>,
}

impl ContentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// The live snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Atomically make `snapshot` the live snapshot, returning the previous one
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let next = Arc::new(snapshot);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// All posts, newest first
    pub fn all(&self) -> Vec<Arc<Post>> {
        let snapshot = self.snapshot();
        newest_first(snapshot.posts().cloned().collect())
    }

    /// Look up a post by slug
    pub fn get(&self, slug: &str) -> Option<Arc<Post>> {
        self.snapshot().get(slug).cloned()
    }

    /// Posts carrying exactly `tag`, newest first
    pub fn by_tag(&self, tag: &str) -> Vec<Arc<Post>> {
        let snapshot = self.snapshot();
        newest_first(snapshot.posts().filter(|p| p.has_tag(tag)).cloned().collect())
    }

    /// The `n` newest posts
    pub fn recent(&self, n: usize) -> Vec<Arc<Post>> {
        let mut posts = self.all();
        posts.truncate(n);
        posts
    }

    /// The `n` oldest posts, oldest first
    pub fn oldest(&self, n: usize) -> Vec<Arc<Post>> {
        let mut posts = self.all();
        posts.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.slug.cmp(&b.slug)));
        posts.truncate(n);
        posts
    }

    /// Posts containing every whitespace-separated term of `query`, newest first
    ///
    /// Matching is case-insensitive substring matching over title, summary,
    /// body and tags. A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<Arc<Post>> {
        let terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(String::from)
            .collect();
        if terms.is_empty() {
            return Vec::new();
        }

        let snapshot = self.snapshot();
        let posts: Vec<Arc<Post>> = snapshot.posts().cloned().collect();

        let matches = if posts.len() < PARALLEL_SEARCH_THRESHOLD {
            filter_matching(&posts, &terms)
        } else {
            parallel_filter_matching(&posts, &terms)
        };

        newest_first(matches)
    }

    /// Every tag with the number of posts carrying it, most used first
    pub fn tags(&self) -> Vec<(String, usize)> {
        let snapshot = self.snapshot();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for post in snapshot.posts() {
            for tag in &post.tags {
                *counts.entry(tag.as_str()).or_insert(0) += 1;
            }
        }

        let mut tags: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(tag, count)| (tag.to_string(), count))
            .collect();
        tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        tags
    }
}

/// Sort by date descending; slug breaks ties so output is stable
fn newest_first(mut posts: Vec<Arc<Post>>) -> Vec<Arc<Post>> {
    posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
    posts
}

fn filter_matching(posts: &[Arc<Post>], terms: &[String]) -> Vec<Arc<Post>> {
    posts
        .iter()
        .filter(|p| p.matches_all(terms))
        .cloned()
        .collect()
}

/// Fan matching out over scoped threads, one chunk per core, and concatenate
fn parallel_filter_matching(posts: &[Arc<Post>], terms: &[String]) -> Vec<Arc<Post>> {
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let chunk_size = posts.len().div_ceil(workers).max(1);

    std::thread::scope(|scope| {
        let handles: Vec<_> = posts
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || filter_matching(chunk, terms)))
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    })
}
