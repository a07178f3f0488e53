//! Listing page templates
//!
//! Pages are assembled with `format!` from small fragments; every value
//! coming from the content API goes through [`html_escape`].

use chrono::{DateTime, FixedOffset};

use crate::config::SiteConfig;
use crate::content::Post;
use crate::helpers::{html_escape, meta_generator, post_url, time_tag, DateStyle};
use crate::listing::{Listing, LoadMode};

/// Shown instead of a date for posts never published
pub const MISSING_DATE: &str = "-";

/// Inline stylesheet of the listing page
const STYLE: &str = r#"
<style>
  body { margin: 0; background: #1a1d23; color: #f8f8f8; font-family: Inter, sans-serif; }
  header, main { max-width: 720px; margin: 0 auto; padding: 0 1rem; }
  header { padding-top: 5rem; }
  .post { margin-top: 3rem; }
  .post a { color: inherit; text-decoration: none; }
  .post h1 { font-size: 1.75rem; margin: 0; }
  .post p { color: #bbbbbb; margin: 0.5rem 0 1.5rem; }
  .info { display: flex; gap: 1.5rem; color: #d7d7d7; font-size: 0.875rem; }
  .load-more { display: inline-block; margin: 4rem 0; color: #ff57b2; font-weight: 600; }
  button.load-more { background: none; border: 0; padding: 0; font: inherit; cursor: pointer; }
  .notice { margin-top: 2rem; color: #ff7b7b; }
</style>
"#;

/// Client-side "load more" for statically hosted pages.
///
/// Fetches the cursor straight from the content API and renders the
/// returned documents the way [`TemplateRenderer::render_post`] does.
/// `replace` swaps the loaded posts and keeps the cursor; `append` adds
/// them and follows `next_page`.
const LOAD_MORE_SCRIPT: &str = r#"
<script>
(function() {
    var more = document.querySelector('.load-more[data-cursor]');
    var loaded = document.getElementById('loaded-posts');
    if (!more || !loaded) return;

    var cursor = more.getAttribute('data-cursor');
    var append = more.getAttribute('data-mode') === 'append';
    var route = more.getAttribute('data-route');
    var pattern = more.getAttribute('data-date-format');
    var timeZone = more.getAttribute('data-timezone');
    var lang = document.documentElement.lang;
    var loading = false;
    var tokens = {
        d: {day: 'numeric'}, dd: {day: '2-digit'},
        M: {month: 'numeric'}, MM: {month: '2-digit'},
        MMM: {month: 'short'}, MMMM: {month: 'long'},
        yy: {year: '2-digit'}, yyyy: {year: 'numeric'}
    };

    function esc(value) {
        var el = document.createElement('span');
        el.textContent = value == null ? '' : String(value);
        return el.innerHTML.replace(/"/g, '&quot;');
    }

    function formatDate(value) {
        if (!value) return '-';
        var date = new Date(value.replace(/([+-]\d\d)(\d\d)$/, '$1:$2'));
        return pattern.replace(/'([^']*)'|([a-zA-Z])\2*/g, function(run, quoted) {
            if (quoted !== undefined) return quoted || "'";
            var options = tokens[run];
            if (!options) return run;
            var format = Object.assign({timeZone: timeZone}, options);
            return new Intl.DateTimeFormat(lang, format).format(date).replace('.', '');
        });
    }

    function render(doc) {
        var data = doc.data || {};
        var heading = '<h1>' + esc(data.title) + '</h1>';
        var key = '';
        if (doc.uid) {
            key = ' data-uid="' + esc(doc.uid) + '"';
            heading = '<a href="' + esc(route + '/' + encodeURIComponent(doc.uid)) + '">' + heading + '</a>';
        }
        return '<article class="post"' + key + '>' + heading +
            '<p>' + esc(data.subtitle) + '</p>' +
            '<div class="info"><span class="date">' + esc(formatDate(doc.first_publication_date)) +
            '</span><span class="author">' + esc(data.author) + '</span></div></article>';
    }

    more.addEventListener('click', function() {
        if (loading || !cursor) return;
        loading = true;
        fetch(cursor)
            .then(function(response) {
                if (!response.ok) throw new Error('HTTP ' + response.status);
                return response.json();
            })
            .then(function(page) {
                var html = (page.results || []).map(render).join('');
                if (append) {
                    loaded.insertAdjacentHTML('beforeend', html);
                    cursor = page.next_page;
                    if (!cursor) more.remove();
                } else {
                    loaded.innerHTML = html;
                }
            })
            .catch(function(error) {
                console.warn('Could not load more posts:', error);
            })
            .then(function() { loading = false; });
    });
})();
</script>
</body>
"#;

/// Renders listings with the site's date style and routes
pub struct TemplateRenderer {
    config: SiteConfig,
    style: DateStyle,
}

impl TemplateRenderer {
    /// Create a renderer for a site
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            config: config.clone(),
            style: DateStyle::new(&config.language, &config.timezone),
        }
    }

    /// Render the full listing page.
    ///
    /// `load_more_href` is the target of the "load more" control, which is
    /// only emitted when the listing has a next page. `notice` is shown
    /// above the control, e.g. after a failed load.
    pub fn render_page(
        &self,
        listing: &Listing,
        load_more_href: &str,
        notice: Option<&str>,
    ) -> String {
        let control = format!(
            r#"<a class="load-more" href="{}">{}</a>"#,
            html_escape(load_more_href),
            html_escape(&self.config.load_more_label)
        );
        self.render(listing, &control, notice)
    }

    /// Render the listing page for static hosting.
    ///
    /// The "load more" control is a button carrying the cursor; the inline
    /// script fetches it from the browser and renders the returned posts
    /// into `#loaded-posts`.
    pub fn render_static_page(&self, listing: &Listing) -> String {
        let mode = match listing.mode() {
            LoadMode::Replace => "replace",
            LoadMode::Append => "append",
        };
        let control = format!(
            r#"<button type="button" class="load-more" data-cursor="{cursor}" data-mode="{mode}" data-route="{route}" data-date-format="{format}" data-timezone="{tz}">{label}</button>"#,
            cursor = html_escape(listing.next_page().unwrap_or_default()),
            mode = mode,
            route = html_escape(self.config.post_route.trim_end_matches('/')),
            format = html_escape(&self.config.date_format),
            tz = html_escape(self.style.timezone.name()),
            label = html_escape(&self.config.load_more_label),
        );

        let html = self.render(listing, &control, None);
        if listing.can_load_more() {
            html.replace("</body>", LOAD_MORE_SCRIPT)
        } else {
            html
        }
    }

    fn render(&self, listing: &Listing, control: &str, notice: Option<&str>) -> String {
        let title = html_escape(&self.config.title);
        let mut body = String::new();

        for post in listing.initial_posts() {
            body.push_str(&self.render_post(post));
        }
        body.push_str(r#"<div id="loaded-posts">"#);
        for post in listing.loaded_posts() {
            body.push_str(&self.render_post(post));
        }
        body.push_str("</div>\n");

        if let Some(notice) = notice {
            body.push_str(&format!(
                r#"<p class="notice" role="alert">{}</p>"#,
                html_escape(notice)
            ));
        }

        if listing.can_load_more() {
            body.push_str(control);
        }

        format!(
            r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
{generator}
<title>{title}</title>
{style}</head>
<body>
<header><a href="/">{title}</a></header>
<main>
{body}
</main>
</body>
</html>
"#,
            lang = html_escape(&self.config.language),
            generator = meta_generator(),
            title = title,
            style = STYLE,
            body = body,
        )
    }

    /// Render a single post summary
    pub fn render_post(&self, post: &Post) -> String {
        let heading = format!("<h1>{}</h1>", html_escape(&post.title));
        let (key, heading) = match post.uid.as_deref() {
            Some(uid) => (
                format!(r#" data-uid="{}""#, html_escape(uid)),
                format!(
                    r#"<a href="{}">{}</a>"#,
                    html_escape(&post_url(&self.config.post_route, uid)),
                    heading
                ),
            ),
            None => (String::new(), heading),
        };

        format!(
            r#"<article class="post"{key}>
  {heading}
  <p>{subtitle}</p>
  <div class="info">
    <span class="date">{date}</span>
    <span class="author">{author}</span>
  </div>
</article>
"#,
            key = key,
            heading = heading,
            subtitle = html_escape(&post.subtitle),
            date = self.render_date(post.publication_date.as_ref()),
            author = html_escape(&post.author),
        )
    }

    /// Formatted publication date, or [`MISSING_DATE`]
    pub fn render_date(&self, date: Option<&DateTime<FixedOffset>>) -> String {
        match date {
            Some(date) => time_tag(date, &html_escape(&self.display_date(Some(date)))),
            None => MISSING_DATE.to_string(),
        }
    }

    /// Formatted publication date as plain text
    pub fn display_date(&self, date: Option<&DateTime<FixedOffset>>) -> String {
        date.map(|d| self.style.format(d, &self.config.date_format))
            .unwrap_or_else(|| MISSING_DATE.to_string())
    }

    /// Detail route of a post, if it has a uid
    pub fn post_path(&self, post: &Post) -> Option<String> {
        post.uid
            .as_deref()
            .map(|uid| post_url(&self.config.post_route, uid))
    }
}
