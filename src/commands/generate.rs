//! Generate the static first page

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::config::SiteConfig;
use crate::content::PostPage;
use crate::error::FetchError;
use crate::listing::Listing;
use crate::prismic::ContentSource;
use crate::templates::TemplateRenderer;
use crate::Blog;

/// Rendered page file name
pub const INDEX_FILE: &str = "index.html";

/// Props file written next to the page
pub const PROPS_FILE: &str = "posts.json";

/// Data captured at generation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticProps {
    pub posts_pagination: PostPage,
    /// Seconds until the page should be regenerated
    pub revalidate: u64,
}

/// Fetch the first page of posts for static generation
pub async fn initial_props<S: ContentSource>(
    source: &S,
    config: &SiteConfig,
) -> Result<StaticProps, FetchError> {
    let posts_pagination = source.fetch_first_page(config.prismic.page_size).await?;
    Ok(StaticProps {
        posts_pagination,
        revalidate: config.revalidate,
    })
}

/// Render the listing page for a set of props; "load more" runs in the browser
pub fn render_index(config: &SiteConfig, props: &StaticProps) -> String {
    let listing = Listing::new(props.posts_pagination.clone(), config.load_mode);
    TemplateRenderer::new(config).render_static_page(&listing)
}

/// Generate `index.html` and `posts.json` into the public directory.
///
/// A fetch failure aborts generation; nothing is written in that case.
pub async fn run<S: ContentSource>(blog: &Blog, source: &S) -> Result<()> {
    let start = std::time::Instant::now();

    let props = initial_props(source, &blog.config)
        .await
        .context("Failed to fetch the first page of posts")?;

    tracing::info!(
        "Loaded {} posts (more pages: {})",
        props.posts_pagination.results.len(),
        props.posts_pagination.next_page().is_some()
    );

    fs::create_dir_all(&blog.public_dir)?;

    let index_path = blog.public_dir.join(INDEX_FILE);
    fs::write(&index_path, render_index(&blog.config, &props))?;
    tracing::debug!("Wrote {:?}", index_path);

    let props_path = blog.public_dir.join(PROPS_FILE);
    fs::write(&props_path, serde_json::to_string_pretty(&props)?)?;
    tracing::debug!("Wrote {:?}", props_path);

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}
