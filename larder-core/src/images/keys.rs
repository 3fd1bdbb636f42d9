//! Object keys for recipe images.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Which image of a recipe a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    Main,
    /// 1-based position in the blog image list.
    Blog(usize),
}

impl ImageRole {
    fn label(self) -> String {
        match self {
            ImageRole::Main => "main".to_string(),
            ImageRole::Blog(n) => format!("blog-{}", n),
        }
    }
}

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Millisecond timestamp that strictly increases within the process, so two
/// keys minted in the same millisecond never collide.
pub fn next_timestamp() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, next, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// `recipes/<slug>-<role>-<timestamp>.png`
pub fn image_key(slug: &str, role: ImageRole, timestamp: i64) -> String {
    format!("recipes/{}-{}-{}.png", slug, role.label(), timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn formats_keys() {
        assert_eq!(
            image_key("chili-tofu", ImageRole::Main, 1700000000000),
            "recipes/chili-tofu-main-1700000000000.png"
        );
        assert_eq!(
            image_key("chili-tofu", ImageRole::Blog(2), 5),
            "recipes/chili-tofu-blog-2-5.png"
        );
    }

    #[test]
    fn timestamps_strictly_increase() {
        let stamps: Vec<i64> = (0..1000).map(|_| next_timestamp()).collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
        let unique: HashSet<_> = stamps.iter().collect();
        assert_eq!(unique.len(), stamps.len());
    }
}
