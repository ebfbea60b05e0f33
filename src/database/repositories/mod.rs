// Postgres 仓储实现

pub mod category;
pub mod comment;
pub mod post;
pub mod token;
pub mod user;

pub use category::PgCategoryRepository;
pub use comment::PgCommentRepository;
pub use post::PgPostRepository;
pub use token::PgTokenRepository;
pub use user::PgUserRepository;
