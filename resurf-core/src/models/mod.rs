pub mod save;

pub use save::{Intent, Save};
