use serde::Deserialize;

use crate::database::manager::{DatabaseManager, DatabaseError};
use crate::database::models::BlogPost;

use super::{ListOptions, Page};

#[derive(Debug, Default)]
pub struct BlogService;

#[derive(Debug, Deserialize)]
pub struct NewBlogPost {
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub body: String,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct BlogPostUpdate {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub body: Option<String>,
}

impl BlogService {
    pub async fn list(&self, opts: &ListOptions) -> Result<Page<BlogPost>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;

        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM blog_posts")
            .fetch_one(&pool)
            .await?;

        let items = sqlx::query_as::<_, BlogPost>(
            "SELECT * FROM blog_posts ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(opts.limit())
        .bind(opts.offset())
        .fetch_all(&pool)
        .await?;

        Ok(Page {
            items,
            total: total.0,
        })
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let post = sqlx::query_as::<_, BlogPost>("SELECT * FROM blog_posts WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&pool)
            .await?;
        Ok(post)
    }

    pub async fn create(&self, new: NewBlogPost) -> Result<BlogPost, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let post = sqlx::query_as::<_, BlogPost>(
            r#"
            INSERT INTO blog_posts (slug, title, excerpt, body, published, published_at)
            VALUES ($1, $2, $3, $4, $5, CASE WHEN $5 THEN now() END)
            RETURNING *
            "#,
        )
        .bind(new.slug)
        .bind(new.title)
        .bind(new.excerpt)
        .bind(new.body)
        .bind(new.published)
        .fetch_one(&pool)
        .await?;
        Ok(post)
    }

    pub async fn update(
        &self,
        slug: &str,
        update: BlogPostUpdate,
    ) -> Result<Option<BlogPost>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let post = sqlx::query_as::<_, BlogPost>(
            r#"
            UPDATE blog_posts SET
                title = COALESCE($2, title),
                excerpt = COALESCE($3, excerpt),
                body = COALESCE($4, body),
                updated_at = now()
            WHERE slug = $1
            RETURNING *
            "#,
        )
        .bind(slug)
        .bind(update.title)
        .bind(update.excerpt)
        .bind(update.body)
        .fetch_optional(&pool)
        .await?;
        Ok(post)
    }

    /// Flip the published flag. First publish stamps published_at.
    pub async fn toggle_publish(&self, slug: &str) -> Result<Option<BlogPost>, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let post = sqlx::query_as::<_, BlogPost>(
            r#"
            UPDATE blog_posts SET
                published = NOT published,
                published_at = CASE WHEN NOT published THEN now() ELSE published_at END,
                updated_at = now()
            WHERE slug = $1
            RETURNING *
            "#,
        )
        .bind(slug)
        .fetch_optional(&pool)
        .await?;
        Ok(post)
    }

    pub async fn delete(&self, slug: &str) -> Result<bool, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        let result = sqlx::query("DELETE FROM blog_posts WHERE slug = $1")
            .bind(slug)
            .execute(&pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
