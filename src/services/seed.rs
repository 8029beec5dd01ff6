//! Startup data
//!
//! The store starts empty on every boot. This fills in the default
//! categories, the configured admin account and a welcome post.

use crate::config::Config;
use crate::models::{ArticleStatus, CreateArticleInput, Visibility};
use crate::services::token::AuthUser;
use crate::services::{ArticleService, CategoryService, UserService};

/// Categories created on a fresh start
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Web Security",
    "Network Security",
    "Malware Analysis",
    "Cryptography",
    "Threat Intelligence",
];

const WELCOME_TITLE: &str = "Welcome to the blog";

const WELCOME_BODY: &str = "This blog collects write-ups on vulnerabilities, \
incident response and defensive engineering. Posts are grouped by category \
and tagged by technique, so browse by topic or search for a CVE. \
Comments are moderated before they appear.";

/// Populate an empty store according to the configuration
pub async fn seed(
    config: &Config,
    users: &UserService,
    categories: &CategoryService,
    articles: &ArticleService,
) -> anyhow::Result<()> {
    if config.seed_demo_data {
        let created = categories.ensure_defaults(DEFAULT_CATEGORIES).await;
        tracing::info!(created, "Default categories ready");
    }

    let (Some(email), Some(password)) = (
        config.auth.admin_email.as_deref(),
        config.auth.admin_password.as_deref(),
    ) else {
        return Ok(());
    };

    let admin = users
        .ensure_admin(&config.auth.admin_name, email, password)
        .await?;

    if config.seed_demo_data {
        let author = AuthUser {
            id: admin.id,
            email: admin.email.clone(),
            role: admin.role,
        };
        let category_id = categories
            .list(Default::default())
            .await
            .into_iter()
            .find(|c| c.has_name("Web Security"))
            .map(|c| c.id);

        articles
            .create(
                &author,
                CreateArticleInput {
                    title: WELCOME_TITLE.to_string(),
                    content: WELCOME_BODY.to_string(),
                    tags: vec!["announcement".to_string(), "meta".to_string()],
                    category_id,
                    visibility: Some(Visibility::Public),
                    status: Some(ArticleStatus::Published),
                    ..Default::default()
                },
            )
            .await?;
    }
    Ok(())
}
