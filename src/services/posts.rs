use uuid::Uuid;

use super::views::{comment_views, post_view, post_views};
use super::{PostDetail, PostView, discard_images};
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::Caller;
use crate::models::{Image, NewPost, Page, Paged, Post, PostFilter, PostUpdate};

/// 新文章的文本字段，已通过校验
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub description: String,
    pub category: String,
}

#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

async fn existing(state: &AppState, id: Uuid) -> AppResult<Post> {
    state
        .repos
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))
}

async fn upload(state: &AppState, bytes: Vec<u8>) -> AppResult<Image> {
    let uploaded = state.media.upload_image(bytes).await?;
    Ok(Image {
        url: uploaded.url,
        public_id: Some(uploaded.public_id),
    })
}

/// 先上传图片再写库，写库失败时删除刚上传的图片
pub async fn create(
    state: &AppState,
    caller: &Caller,
    draft: PostDraft,
    image: Vec<u8>,
) -> AppResult<PostView> {
    caller.require_active()?;
    let image = upload(state, image).await?;
    let public_id = image.public_id.clone();

    let created = state
        .repos
        .posts
        .create(NewPost {
            title: draft.title,
            description: draft.description,
            category: draft.category,
            image,
            user_id: caller.id,
        })
        .await;

    let post = match created {
        Ok(post) => post,
        Err(e) => {
            discard_images(&state.media, public_id.into_iter().collect()).await;
            return Err(e.into());
        }
    };

    tracing::info!("User {} created post {}", caller.id, post.id);
    post_view(state, post).await
}

pub async fn list(state: &AppState, filter: &PostFilter, page: Page) -> AppResult<Paged<PostView>> {
    let paged = state.repos.posts.list(filter, page).await?;
    Ok(Paged {
        items: post_views(state, paged.items).await?,
        total: paged.total,
    })
}

pub async fn get(state: &AppState, id: Uuid) -> AppResult<PostDetail> {
    let post = existing(state, id).await?;
    let comments = state.repos.comments.list_by_post(post.id).await?;

    Ok(PostDetail {
        post: post_view(state, post).await?,
        comments: comment_views(state, comments).await?,
    })
}

pub async fn count(state: &AppState) -> AppResult<u64> {
    Ok(state.repos.posts.count().await?)
}

/// 部分更新，新图片上传成功并写库后再删除旧图片
pub async fn update(
    state: &AppState,
    caller: &Caller,
    id: Uuid,
    changes: PostChanges,
    image: Option<Vec<u8>>,
) -> AppResult<PostView> {
    let post = existing(state, id).await?;
    caller.require_owner_or_admin(post.user_id)?;

    let mut update = PostUpdate {
        title: changes.title,
        description: changes.description,
        category: changes.category,
        image: None,
    };
    if let Some(bytes) = image {
        update.image = Some(upload(state, bytes).await?);
    }

    if update.is_empty() {
        return post_view(state, post).await;
    }

    let new_image_id = update.image.as_ref().and_then(|i| i.public_id.clone());
    let replaced = update.image.is_some();

    // 写库失败或文章已被删除时，丢弃刚上传的图片
    let updated = match state.repos.posts.update(id, update).await {
        Ok(Some(post)) => post,
        Ok(None) => {
            discard_images(&state.media, new_image_id.into_iter().collect()).await;
            return Err(AppError::not_found("Post"));
        }
        Err(e) => {
            discard_images(&state.media, new_image_id.into_iter().collect()).await;
            return Err(e.into());
        }
    };

    if replaced {
        if let Some(old) = post.image.public_id {
            discard_images(&state.media, vec![old]).await;
        }
    }

    post_view(state, updated).await
}

/// 删除文章及其评论，数据库提交后再清理图片
pub async fn delete(state: &AppState, caller: &Caller, id: Uuid) -> AppResult<Post> {
    let post = existing(state, id).await?;
    caller.require_owner_or_admin(post.user_id)?;

    let cascade = state
        .repos
        .posts
        .delete_cascade(id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;

    if let Some(public_id) = cascade.post.image.public_id.clone() {
        discard_images(&state.media, vec![public_id]).await;
    }

    tracing::info!(
        "User {} deleted post {} with {} comments",
        caller.id,
        id,
        cascade.comments_deleted
    );
    Ok(cascade.post)
}

pub async fn toggle_like(state: &AppState, caller: &Caller, id: Uuid) -> AppResult<PostView> {
    caller.require_active()?;
    let post = state
        .repos
        .posts
        .toggle_like(id, caller.id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;

    post_view(state, post).await
}
