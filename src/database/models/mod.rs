pub mod comment;
pub mod post;
pub mod user;

pub use comment::{Comment, NewComment};
pub use post::{NewPost, Post, PostChanges};
pub use user::{NewUser, PublicUser, User, UserChanges};
