// 对外返回的组合视图：实体 + 作者信息 + 相对时间

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppResult;
use crate::models::{Category, Comment, Post, PublicUser, UserSummary};
use crate::utils::relative_time;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timestamps {
    pub created_at_human: String,
    pub updated_at_human: String,
}

impl Timestamps {
    pub fn of(created_at: DateTime<Utc>, updated_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            created_at_human: relative_time(created_at, now),
            updated_at_human: relative_time(updated_at, now),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub user: Option<UserSummary>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

/// 文章详情，附带评论
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: PostView,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: Option<UserSummary>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    #[serde(flatten)]
    pub category: Category,
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub user: PublicUser,
    pub posts: Vec<PostView>,
}

/// 批量查询作者，避免逐条查询
pub(crate) async fn authors(
    state: &AppState,
    ids: impl IntoIterator<Item = Uuid>,
) -> AppResult<HashMap<Uuid, UserSummary>> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort();
    ids.dedup();

    let users = state.repos.users.find_many(&ids).await?;
    Ok(users.into_iter().map(|u| (u.id, u.summary())).collect())
}

pub(crate) async fn post_views(state: &AppState, posts: Vec<Post>) -> AppResult<Vec<PostView>> {
    let authors = authors(state, posts.iter().map(|p| p.user_id)).await?;
    let now = Utc::now();

    Ok(posts
        .into_iter()
        .map(|post| PostView {
            user: authors.get(&post.user_id).cloned(),
            timestamps: Timestamps::of(post.created_at, post.updated_at, now),
            post,
        })
        .collect())
}

pub(crate) async fn post_view(state: &AppState, post: Post) -> AppResult<PostView> {
    let mut views = post_views(state, vec![post]).await?;
    views
        .pop()
        .ok_or_else(|| crate::error::AppError::Internal("post view missing".into()))
}

pub(crate) async fn comment_views(
    state: &AppState,
    comments: Vec<Comment>,
) -> AppResult<Vec<CommentView>> {
    let authors = authors(state, comments.iter().map(|c| c.user_id)).await?;
    let now = Utc::now();

    Ok(comments
        .into_iter()
        .map(|comment| CommentView {
            user: authors.get(&comment.user_id).cloned(),
            timestamps: Timestamps::of(comment.created_at, comment.updated_at, now),
            comment,
        })
        .collect())
}

pub(crate) async fn comment_view(state: &AppState, comment: Comment) -> AppResult<CommentView> {
    let mut views = comment_views(state, vec![comment]).await?;
    views
        .pop()
        .ok_or_else(|| crate::error::AppError::Internal("comment view missing".into()))
}

pub(crate) async fn category_views(
    state: &AppState,
    categories: Vec<Category>,
) -> AppResult<Vec<CategoryView>> {
    let authors = authors(state, categories.iter().filter_map(|c| c.user_id)).await?;

    Ok(categories
        .into_iter()
        .map(|category| CategoryView {
            user: category.user_id.and_then(|id| authors.get(&id).cloned()),
            category,
        })
        .collect())
}
