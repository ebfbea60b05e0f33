// 领域模型
// 数据库行与对外展示结构共用这些类型

pub mod category;
pub mod comment;
pub mod post;
pub mod token;
pub mod user;

pub use category::{Category, NewCategory};
pub use comment::{Comment, CommentFilter, NewComment};
pub use post::{NewPost, Post, PostFilter, PostUpdate};
pub use token::VerificationToken;
pub use user::{NewUser, PublicUser, User, UserSummary, UserUpdate};

use serde::{Deserialize, Serialize};

/// 外部图床上的图片引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub url: String,
    /// 图床资源ID，占位图为 None
    pub public_id: Option<String>,
}

impl Image {
    pub fn placeholder(url: &str) -> Self {
        Self {
            url: url.to_string(),
            public_id: None,
        }
    }
}

/// 分页参数（页码从1开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(1),
            limit: limit
                .filter(|l| *l > 0)
                .unwrap_or(Self::DEFAULT_LIMIT)
                .min(Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit as u64)
    }
}

/// 一页数据及总数
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_caps() {
        assert_eq!(Page::new(None, None), Page { page: 1, limit: 10 });
        assert_eq!(Page::new(Some(0), Some(0)), Page { page: 1, limit: 10 });
        assert_eq!(Page::new(Some(3), Some(500)).limit, Page::MAX_LIMIT);
    }

    #[test]
    fn page_math() {
        let page = Page::new(Some(3), Some(10));
        assert_eq!(page.offset(), 20);
        assert_eq!(page.total_pages(0), 0);
        assert_eq!(page.total_pages(21), 3);
        assert_eq!(page.total_pages(30), 3);
    }
}
