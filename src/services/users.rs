use uuid::Uuid;

use super::views::post_views;
use super::{ProfileView, discard_images, normalize_email};
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::Caller;
use crate::models::{Image, Page, Paged, PublicUser, User, UserUpdate};

/// 管理员列表固定每页10条
pub const USERS_PER_PAGE: u32 = 10;

#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub password: Option<String>,
}

async fn existing(state: &AppState, id: Uuid) -> AppResult<User> {
    state
        .repos
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

async fn profile_of(state: &AppState, user: User) -> AppResult<ProfileView> {
    let posts = state.repos.posts.list_by_user(user.id).await?;
    Ok(ProfileView {
        user: user.sanitized(),
        posts: post_views(state, posts).await?,
    })
}

pub async fn list(state: &AppState, caller: &Caller, page: u32) -> AppResult<(Page, Paged<PublicUser>)> {
    caller.require_admin()?;
    let page = Page::new(Some(page), Some(USERS_PER_PAGE));
    let paged = state.repos.users.list_except(caller.id, page).await?;

    Ok((
        page,
        Paged {
            items: paged.items.iter().map(User::sanitized).collect(),
            total: paged.total,
        },
    ))
}

pub async fn count(state: &AppState, caller: &Caller) -> AppResult<u64> {
    caller.require_admin()?;
    Ok(state.repos.users.count().await?)
}

pub async fn my_profile(state: &AppState, caller: &Caller) -> AppResult<ProfileView> {
    caller.require_active()?;
    let user = existing(state, caller.id).await?;
    profile_of(state, user).await
}

pub async fn profile(state: &AppState, id: Uuid) -> AppResult<ProfileView> {
    let user = existing(state, id).await?;
    profile_of(state, user).await
}

/// 只允许修改用户名、简介和密码，角色与状态字段不可经此修改
pub async fn update_profile(
    state: &AppState,
    caller: &Caller,
    id: Uuid,
    changes: ProfileChanges,
) -> AppResult<PublicUser> {
    caller.require_owner_or_admin(id)?;
    existing(state, id).await?;

    let password_hash = match changes.password.as_deref() {
        Some(password) => Some(state.credentials().hash(password)?),
        None => None,
    };

    let user = state
        .repos
        .users
        .update(
            id,
            UserUpdate {
                username: changes.username,
                bio: changes.bio,
                password_hash,
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(user.sanitized())
}

/// 上传新头像，成功后删除旧的图床图片
pub async fn upload_profile_image(
    state: &AppState,
    caller: &Caller,
    bytes: Vec<u8>,
) -> AppResult<Image> {
    caller.require_active()?;
    let user = existing(state, caller.id).await?;

    let uploaded = state.media.upload_image(bytes).await?;
    let image = Image {
        url: uploaded.url,
        public_id: Some(uploaded.public_id),
    };

    if !state.repos.users.set_profile_image(user.id, &image).await? {
        discard_images(&state.media, image.public_id.into_iter().collect()).await;
        return Err(AppError::not_found("User"));
    }

    if let Some(old) = user.profile_image_id {
        discard_images(&state.media, vec![old]).await;
    }
    Ok(image)
}

/// 级联删除用户，图片清理最多 N+1 次（N 篇文章加头像）
pub async fn delete(state: &AppState, caller: &Caller, id: Uuid) -> AppResult<PublicUser> {
    caller.require_owner_or_admin(id)?;

    let cascade = state
        .repos
        .users
        .delete_cascade(id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let mut images = cascade.post_image_ids;
    if let Some(profile_image) = cascade.user.profile_image_id.clone() {
        images.push(profile_image);
    }
    let attempted = images.len();
    let deleted = discard_images(&state.media, images).await;

    tracing::info!(
        "User {} deleted account {}: {} posts, {} comments, {}/{} images",
        caller.id,
        id,
        cascade.posts_deleted,
        cascade.comments_deleted,
        deleted,
        attempted
    );
    Ok(cascade.user.sanitized())
}

/// 切换封禁状态，返回新的状态
pub async fn toggle_block(state: &AppState, caller: &Caller, id: Uuid) -> AppResult<bool> {
    caller.require_admin()?;
    let user = existing(state, id).await?;
    if user.id == caller.id {
        return Err(AppError::BadRequest("You can not block yourself".into()));
    }

    let blocked = !user.is_blocked;
    state.repos.users.set_blocked(user.id, blocked).await?;
    tracing::info!("Admin {} set blocked={} on user {}", caller.id, blocked, user.id);
    Ok(blocked)
}

pub async fn verify(state: &AppState, caller: &Caller, id: Uuid) -> AppResult<()> {
    caller.require_admin()?;
    let user = existing(state, id).await?;
    if user.is_account_verified {
        return Err(AppError::AlreadyVerified);
    }

    state.repos.users.set_verified(user.id).await?;
    Ok(())
}

/// 将配置中列出的邮箱提升为管理员，返回实际提升的数量
pub async fn promote_admins(state: &AppState, emails: &[String]) -> AppResult<usize> {
    let mut promoted = 0;
    for email in emails {
        let Some(user) = state.repos.users.find_by_email(&normalize_email(email)).await? else {
            tracing::warn!("Admin account {} is not registered yet", email);
            continue;
        };
        if !user.is_admin && state.repos.users.set_admin(user.id, true).await? {
            tracing::info!("Promoted {} to admin", user.email);
            promoted += 1;
        }
    }
    Ok(promoted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewComment, NewPost};
    use crate::services::test_support::{admin, caller, harness, verified_user};

    async fn seed_post(state: &AppState, user_id: Uuid, public_id: &str) -> Uuid {
        state
            .repos
            .posts
            .create(NewPost {
                title: "Post title".into(),
                description: "Some description".into(),
                category: "Tech".into(),
                image: Image {
                    url: format!("https://img.test/{public_id}.png"),
                    public_id: Some(public_id.into()),
                },
                user_id,
            })
            .await
            .unwrap()
            .id
    }

    async fn seed_comment(state: &AppState, post_id: Uuid, user_id: Uuid) -> Uuid {
        state
            .repos
            .comments
            .create(NewComment {
                post_id,
                user_id,
                text: "comment".into(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn delete_cascades_posts_comments_and_images() {
        let h = harness();
        let author = verified_user(&h.state, "author@blog.io").await;
        let reader = verified_user(&h.state, "reader@blog.io").await;

        // 作者：2篇文章和头像
        let a1 = seed_post(&h.state, author.id, "p1").await;
        let a2 = seed_post(&h.state, author.id, "p2").await;
        upload_profile_image(&h.state, &caller(&author), vec![7])
            .await
            .unwrap();
        let r1 = seed_post(&h.state, reader.id, "p3").await;

        seed_comment(&h.state, a1, reader.id).await;
        seed_comment(&h.state, a2, author.id).await;
        seed_comment(&h.state, r1, author.id).await;
        let kept = seed_comment(&h.state, r1, reader.id).await;

        delete(&h.state, &caller(&author), author.id).await.unwrap();

        let posts = &h.state.repos.posts;
        assert!(posts.find_by_id(a1).await.unwrap().is_none());
        assert!(posts.find_by_id(a2).await.unwrap().is_none());
        assert!(posts.find_by_id(r1).await.unwrap().is_some());

        let remaining = h.state.repos.comments.list_by_post(r1).await.unwrap();
        assert_eq!(remaining.iter().map(|c| c.id).collect::<Vec<_>>(), vec![kept]);

        let mut deleted = h.media.deleted();
        deleted.sort();
        assert_eq!(deleted, vec!["image-1", "p1", "p2"]);
        assert!(deleted.len() <= 2 + 1);

        let err = delete(&h.state, &admin(&reader), author.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_is_owner_or_admin_and_survives_media_failure() {
        let h = harness();
        let author = verified_user(&h.state, "author@blog.io").await;
        let other = verified_user(&h.state, "other@blog.io").await;
        seed_post(&h.state, author.id, "p1").await;

        let err = delete(&h.state, &caller(&other), author.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        h.media.fail_deletes(true);
        let removed = delete(&h.state, &admin(&other), author.id).await.unwrap();
        assert_eq!(removed.id, author.id);
        assert!(h.state.repos.users.find_by_id(author.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn profile_update_keeps_flags() {
        let h = harness();
        let user = verified_user(&h.state, "member@blog.io").await;

        let updated = update_profile(
            &h.state,
            &caller(&user),
            user.id,
            ProfileChanges {
                bio: Some("Writes about Rust".into()),
                password: Some("other9!pass".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.bio, "Writes about Rust");
        assert_eq!(updated.username, user.username);
        assert!(!updated.is_admin);

        assert!(
            h.state
                .credentials()
                .verify_credentials("member@blog.io", "other9!pass")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn profile_image_replaces_previous() {
        let h = harness();
        let user = verified_user(&h.state, "member@blog.io").await;

        let first = upload_profile_image(&h.state, &caller(&user), vec![1])
            .await
            .unwrap();
        let second = upload_profile_image(&h.state, &caller(&user), vec![2])
            .await
            .unwrap();

        assert_ne!(first.url, second.url);
        assert_eq!(h.media.deleted(), vec!["image-1".to_string()]);
        let profile = my_profile(&h.state, &caller(&user)).await.unwrap();
        assert_eq!(profile.user.profile_image, second);
    }

    #[tokio::test]
    async fn admin_block_and_verify() {
        let h = harness();
        let admin_user = verified_user(&h.state, "admin@blog.io").await;
        let member = h
            .state
            .credentials()
            .create("member", "member@blog.io", "secret1!")
            .await
            .unwrap();
        let admin = admin(&admin_user);

        assert!(toggle_block(&h.state, &admin, member.id).await.unwrap());
        assert!(!toggle_block(&h.state, &admin, member.id).await.unwrap());
        let err = toggle_block(&h.state, &admin, admin_user.id).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        verify(&h.state, &admin, member.id).await.unwrap();
        let err = verify(&h.state, &admin, member.id).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyVerified));

        let err = verify(&h.state, &caller(&admin_user), member.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn admin_listing_excludes_caller() {
        let h = harness();
        let admin_user = verified_user(&h.state, "admin@blog.io").await;
        for i in 0..11 {
            verified_user(&h.state, &format!("member{i}@blog.io")).await;
        }

        let (page, users) = list(&h.state, &admin(&admin_user), 2).await.unwrap();
        assert_eq!(users.total, 11);
        assert_eq!(users.items.len(), 1);
        assert_eq!(page.total_pages(users.total), 2);
        assert!(users.items.iter().all(|u| u.id != admin_user.id));
        assert_eq!(count(&h.state, &admin(&admin_user)).await.unwrap(), 12);
    }

    #[tokio::test]
    async fn configured_emails_become_admins() {
        let h = harness();
        let user = verified_user(&h.state, "owner@blog.io").await;

        let emails = vec![" Owner@Blog.io".to_string(), "ghost@blog.io".to_string()];
        assert_eq!(promote_admins(&h.state, &emails).await.unwrap(), 1);
        assert_eq!(promote_admins(&h.state, &emails).await.unwrap(), 0);

        let user = h.state.repos.users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(user.is_admin);
    }
}
