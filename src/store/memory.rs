use std::collections::BTreeMap;
use std::sync::RwLock;

use futures_util::future::{self, BoxFuture, FutureExt};

use crate::store::{Post, RecordStore, StoreError, User};

/// In-process record store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<BTreeMap<i64, User>>,
    posts: RwLock<BTreeMap<i64, Post>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with the demo data set: three users and their posts.
    pub fn seeded() -> Self {
        let store = Self::new();
        let users = [
            (1, "Alice Johnson", "alice@example.com", "2024-01-15T09:00:00Z"),
            (2, "Bob Smith", "bob@example.com", "2024-02-03T14:30:00Z"),
            (3, "Carol White", "carol@example.com", "2024-03-21T11:15:00Z"),
        ];
        for (id, name, email, created_at) in users {
            store.insert_user(User {
                id,
                name: name.to_string(),
                email: email.to_string(),
                created_at: created_at.to_string(),
            });
        }

        let posts = [
            (1, 1, "Getting started with tracing", "Spans, traces and context.", "2024-04-01T10:00:00Z"),
            (2, 1, "Exemplars in practice", "Linking metrics to traces.", "2024-05-12T16:45:00Z"),
            (3, 2, "Propagation across services", "The traceparent header.", "2024-04-20T08:20:00Z"),
            (4, 3, "Histogram buckets", "Choosing latency bounds.", "2024-06-02T13:05:00Z"),
        ];
        for (id, user_id, title, content, created_at) in posts {
            store.insert_post(Post {
                id,
                user_id,
                title: title.to_string(),
                content: content.to_string(),
                created_at: created_at.to_string(),
            });
        }
        store
    }

    pub fn insert_user(&self, user: User) {
        self.users.write().expect("user table poisoned").insert(user.id, user);
    }

    pub fn insert_post(&self, post: Post) {
        self.posts.write().expect("post table poisoned").insert(post.id, post);
    }
}

impl RecordStore for InMemoryStore {
    fn user_by_id(&self, id: i64) -> BoxFuture<'_, Result<Option<User>, StoreError>> {
        let user = self.users.read().expect("user table poisoned").get(&id).cloned();
        future::ready(Ok(user)).boxed()
    }

    fn post_by_id(&self, id: i64) -> BoxFuture<'_, Result<Option<Post>, StoreError>> {
        let post = self.posts.read().expect("post table poisoned").get(&id).cloned();
        future::ready(Ok(post)).boxed()
    }

    fn posts_by_user(&self, user_id: i64) -> BoxFuture<'_, Result<Vec<Post>, StoreError>> {
        let mut posts: Vec<Post> = self
            .posts
            .read()
            .expect("post table poisoned")
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        // RFC 3339 timestamps in UTC sort lexicographically.
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        future::ready(Ok(posts)).boxed()
    }
}
