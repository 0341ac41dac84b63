//! Vocabulary Module
//!
//! Reference words and each learner's progress through them. A progress row
//! moves `new -> learned -> mastered` and is never deleted; the only write the
//! API exposes jumps straight to `mastered` and bumps `times_seen`.
//!
//! ```rust,ignore
//! let app = Router::new().merge(vocab::routes()).with_state(app_state);
//!
//! let lib = vocab::Vocab::new(db.connection());
//! let updated = lib.mark_mastered(user_word_id).await?;
//! ```

mod handler;
mod lib;
mod routes;

pub use lib::*;

pub use routes::routes;
