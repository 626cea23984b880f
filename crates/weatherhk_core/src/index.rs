use async_trait::async_trait;
use weatherhk_config::FeedConfig;
use weatherhk_http::{Handler, RequestInfo, ResponseSink, responses};

const TITLE: &str = "Simple Hong Kong Weather API";

/// Landing page linking every configured feed.
pub struct IndexHandler {
    html: String,
}

impl IndexHandler {
    pub fn new<'a>(feeds: impl IntoIterator<Item = (&'a String, &'a FeedConfig)>) -> Self {
        let mut feeds: Vec<_> = feeds.into_iter().collect();
        feeds.sort_by(|a, b| a.1.path().cmp(b.1.path()));

        let mut html = format!("<html><h1>{TITLE}</h1><ul>");
        for (name, feed) in feeds {
            html.push_str(&format!(
                r#"<li><a href="{}">{}</a>"#,
                escape(feed.path()),
                escape(&display_name(name))
            ));
            if let Some(notice) = feed.notice() {
                html.push_str(&format!(" <small>{}</small>", escape(notice)));
            }
            html.push_str("</li>");
        }
        html.push_str("</ul></html>");

        Self { html }
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

#[async_trait]
impl Handler for IndexHandler {
    async fn serve(&self, _req: &RequestInfo, sink: &mut dyn ResponseSink) -> anyhow::Result<()> {
        responses::send_html(sink, &self.html)?;
        Ok(())
    }
}

/// `current_weather` -> `Current Weather`
fn display_name(name: &str) -> String {
    name.split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
