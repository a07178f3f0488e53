//! List posts in the terminal

use anyhow::{Context, Result};

use crate::listing::Listing;
use crate::prismic::ContentSource;
use crate::templates::TemplateRenderer;
use crate::Blog;

/// Print the first page, then run `more` "load more" actions
pub async fn run<S: ContentSource>(blog: &Blog, source: &S, more: usize) -> Result<()> {
    let first = source
        .fetch_first_page(blog.config.prismic.page_size)
        .await
        .context("Failed to fetch the first page of posts")?;

    let mut listing = Listing::new(first, blog.config.load_mode);
    for _ in 0..more {
        if !listing.can_load_more() {
            break;
        }
        // Failures are logged by the listing
        if listing.load_more(source).await.is_err() {
            break;
        }
    }

    let renderer = TemplateRenderer::new(&blog.config);
    let posts: Vec<_> = listing.visible_posts().collect();
    println!("Posts ({}):", posts.len());
    for post in posts {
        println!(
            "  {} - {} by {} [{}]",
            renderer.display_date(post.publication_date.as_ref()),
            post.title,
            post.author,
            renderer.post_path(post).unwrap_or_default()
        );
    }

    if let Some(next) = listing.next_page() {
        println!("More posts: {}", next);
    }

    Ok(())
}
