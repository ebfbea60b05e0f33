use uuid::Uuid;

use super::CommentView;
use super::views::{comment_view, comment_views};
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::Caller;
use crate::models::{Comment, CommentFilter, NewComment, Page, Paged};

async fn existing(state: &AppState, id: Uuid) -> AppResult<Comment> {
    state
        .repos
        .comments
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment"))
}

pub async fn create(
    state: &AppState,
    caller: &Caller,
    post_id: Uuid,
    text: String,
) -> AppResult<CommentView> {
    caller.require_active()?;
    if state.repos.posts.find_by_id(post_id).await?.is_none() {
        return Err(AppError::not_found("Post"));
    }

    let comment = state
        .repos
        .comments
        .create(NewComment {
            post_id,
            user_id: caller.id,
            text,
        })
        .await?;

    comment_view(state, comment).await
}

pub async fn list(
    state: &AppState,
    caller: &Caller,
    filter: &CommentFilter,
    page: Page,
) -> AppResult<Paged<CommentView>> {
    caller.require_active()?;
    let paged = state.repos.comments.list(filter, page).await?;
    Ok(Paged {
        items: comment_views(state, paged.items).await?,
        total: paged.total,
    })
}

pub async fn get(state: &AppState, caller: &Caller, id: Uuid) -> AppResult<CommentView> {
    caller.require_active()?;
    let comment = existing(state, id).await?;
    comment_view(state, comment).await
}

pub async fn update(
    state: &AppState,
    caller: &Caller,
    id: Uuid,
    text: &str,
) -> AppResult<CommentView> {
    let comment = existing(state, id).await?;
    caller.require_owner_or_admin(comment.user_id)?;

    let updated = state
        .repos
        .comments
        .update_text(id, text)
        .await?
        .ok_or_else(|| AppError::not_found("Comment"))?;

    comment_view(state, updated).await
}

pub async fn delete(state: &AppState, caller: &Caller, id: Uuid) -> AppResult<()> {
    let comment = existing(state, id).await?;
    caller.require_owner_or_admin(comment.user_id)?;

    if !state.repos.comments.delete(id).await? {
        return Err(AppError::not_found("Comment"));
    }
    tracing::info!("User {} deleted comment {}", caller.id, id);
    Ok(())
}

pub async fn toggle_like(state: &AppState, caller: &Caller, id: Uuid) -> AppResult<CommentView> {
    caller.require_active()?;
    let comment = state
        .repos
        .comments
        .toggle_like(id, caller.id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment"))?;

    comment_view(state, comment).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Image, NewPost};
    use crate::services::test_support::{admin, caller, harness, verified_user};

    async fn seed_post(state: &AppState, user_id: Uuid) -> Uuid {
        state
            .repos
            .posts
            .create(NewPost {
                title: "Post title".into(),
                description: "Some description".into(),
                category: "Tech".into(),
                image: Image::placeholder("https://img.test/p.png"),
                user_id,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn comment_requires_existing_post() {
        let h = harness();
        let user = verified_user(&h.state, "reader@blog.io").await;

        let err = create(&h.state, &caller(&user), Uuid::new_v4(), "hi".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let post_id = seed_post(&h.state, user.id).await;
        let view = create(&h.state, &caller(&user), post_id, "hi".into())
            .await
            .unwrap();
        assert_eq!(view.comment.post_id, post_id);
        assert_eq!(view.user.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn list_filters_by_post() {
        let h = harness();
        let user = verified_user(&h.state, "reader@blog.io").await;
        let first = seed_post(&h.state, user.id).await;
        let second = seed_post(&h.state, user.id).await;

        for post_id in [first, first, second] {
            create(&h.state, &caller(&user), post_id, "hi".into())
                .await
                .unwrap();
        }

        let filter = CommentFilter {
            post_id: Some(first),
        };
        let page = list(&h.state, &caller(&user), &filter, Page::new(None, None))
            .await
            .unwrap();
        assert_eq!(page.total, 2);

        let all = list(
            &h.state,
            &caller(&user),
            &CommentFilter::default(),
            Page::new(None, None),
        )
        .await
        .unwrap();
        assert_eq!(all.total, 3);
    }

    #[tokio::test]
    async fn update_and_delete_are_owner_or_admin() {
        let h = harness();
        let author = verified_user(&h.state, "author@blog.io").await;
        let other = verified_user(&h.state, "other@blog.io").await;
        let post_id = seed_post(&h.state, author.id).await;
        let comment = create(&h.state, &caller(&author), post_id, "hi".into())
            .await
            .unwrap()
            .comment;

        let err = update(&h.state, &caller(&other), comment.id, "hacked")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let edited = update(&h.state, &caller(&author), comment.id, "edited")
            .await
            .unwrap();
        assert_eq!(edited.comment.text, "edited");

        assert!(delete(&h.state, &caller(&other), comment.id).await.is_err());
        delete(&h.state, &admin(&other), comment.id).await.unwrap();
        assert!(matches!(
            delete(&h.state, &admin(&other), comment.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn like_toggles() {
        let h = harness();
        let user = verified_user(&h.state, "reader@blog.io").await;
        let post_id = seed_post(&h.state, user.id).await;
        let comment = create(&h.state, &caller(&user), post_id, "hi".into())
            .await
            .unwrap()
            .comment;

        let liked = toggle_like(&h.state, &caller(&user), comment.id).await.unwrap();
        assert_eq!(liked.comment.likes, vec![user.id]);
        let unliked = toggle_like(&h.state, &caller(&user), comment.id).await.unwrap();
        assert!(unliked.comment.likes.is_empty());
    }
}
