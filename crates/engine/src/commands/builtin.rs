use std::time::Duration;

use futures_util::future::{self, BoxFuture};
use futures_util::FutureExt;
use once_cell::sync::Lazy;
use plebchat_shared::CommandResult;
use rand::Rng;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::{CommandContext, CommandSpec};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_PAGE_CHARS: usize = 30_000;
const MAX_RANDOM: u64 = 1_000_000_000;
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0";

pub const SUMMARIZE_PROMPT: &str = "Summarize the following web page for the user. \
Lead with a one-sentence overview, then list the key points. Mention the source.";

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("static selector"));
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("static selector"));

/// Commands every graph with a command table carries.
pub fn shared() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new(
            "help",
            "Get a list of commands.",
            "Usage: /help [command]\nWithout arguments, shows a list of all available commands with brief descriptions.\nWith a command name, shows detailed help for that specific command.",
            help,
        ),
        CommandSpec::new("version", "Return the version of this graph.", "Usage: /version", version),
        CommandSpec::new("about", "Get information about the agent.", "Usage: /about", about),
        CommandSpec::new(
            "url",
            "Extract and display the main content from a website URL.",
            "Usage: /url [https://example.com]\nScrapes the content from the provided URL and displays it in the chat.\n\nThe URL must start with https:// for security reasons.",
            url,
        ),
        CommandSpec::new(
            "summarize",
            "Summarize a web page.",
            "Usage: /summarize [https://example.com]\nFetches the page like /url and asks the model for a summary.",
            summarize,
        ),
        CommandSpec::new(
            "random",
            "Generate a random number.",
            "Usage: /random [max]\nIf no maximum is provided, returns a random number between 1-100.\nIf maximum is provided, returns a random number between 1 and that maximum.",
            random,
        ),
    ]
}

fn help<'a>(ctx: &'a CommandContext<'a>, args: &'a [String]) -> BoxFuture<'a, CommandResult> {
    let text = match args.first() {
        Some(name) => ctx.table.help_for(name),
        None => ctx.table.help_listing(),
    };
    future::ready(CommandResult::direct(text)).boxed()
}

fn version<'a>(ctx: &'a CommandContext<'a>, _: &'a [String]) -> BoxFuture<'a, CommandResult> {
    let text = format!("`{}` v{}", ctx.table.graph(), env!("CARGO_PKG_VERSION"));
    future::ready(CommandResult::direct(text)).boxed()
}

fn about<'a>(ctx: &'a CommandContext<'a>, _: &'a [String]) -> BoxFuture<'a, CommandResult> {
    future::ready(CommandResult::direct(ctx.table.about())).boxed()
}

fn random<'a>(_: &'a CommandContext<'a>, args: &'a [String]) -> BoxFuture<'a, CommandResult> {
    future::ready(CommandResult::direct(random_reply(args.first().map(String::as_str)))).boxed()
}

fn random_reply(arg: Option<&str>) -> String {
    let max = match arg {
        None => 100,
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if n <= 0 => return "Please provide a positive maximum value.".to_string(),
            Ok(n) if n as u64 > MAX_RANDOM => {
                return "For performance reasons, please limit to 1 billion or less.".to_string();
            }
            Ok(n) => n as u64,
            Err(_) => {
                return "Invalid input. Usage: /random [max] - where max is a positive integer."
                    .to_string();
            }
        },
    };
    let n = rand::thread_rng().gen_range(1..=max);
    format!("Random number (1-{max}): {n}")
}

fn url<'a>(ctx: &'a CommandContext<'a>, args: &'a [String]) -> BoxFuture<'a, CommandResult> {
    async move {
        let text = match fetch_page(ctx.http, args.first().map(String::as_str), "url").await {
            Ok(page) | Err(page) => page,
        };
        CommandResult::direct(text)
    }
    .boxed()
}

fn summarize<'a>(ctx: &'a CommandContext<'a>, args: &'a [String]) -> BoxFuture<'a, CommandResult> {
    async move {
        match fetch_page(ctx.http, args.first().map(String::as_str), "summarize").await {
            Ok(page) => CommandResult::reinject(page, SUMMARIZE_PROMPT),
            Err(message) => CommandResult::direct(message),
        }
    }
    .boxed()
}

/// Normalize a user-supplied address to https. The error is user-facing.
fn normalize_url(raw: Option<&str>, command: &str) -> Result<String, String> {
    let example = format!("\n\n**Example:**\n```\n/{command} https://example.com\n```");
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return Err(format!("⚠️ Please provide a URL.{example}"));
    };
    if raw.starts_with("http://") {
        return Err(format!("⚠️ The URL must start with `https://`{example}"));
    }
    if raw.starts_with("https://") {
        Ok(raw.to_string())
    } else {
        Ok(format!("https://{raw}"))
    }
}

/// Fetch a page as markdown. Both arms are ready to show to the user.
async fn fetch_page(http: &Client, raw: Option<&str>, command: &str) -> Result<String, String> {
    let url = normalize_url(raw, command)?;
    debug!(%url, "fetching page");

    let response = http
        .get(&url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| {
            warn!(%url, error = %e, "page fetch failed");
            format!("⚠️ Error fetching the URL: {e}")
        })?;

    let html = response
        .text()
        .await
        .map_err(|e| format!("⚠️ Error processing the webpage content: {e}"))?;
    Ok(render_page(&url, &html))
}

fn render_page(url: &str, html: &str) -> String {
    let document = Html::parse_document(html);
    let title = document
        .select(&TITLE)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| url.to_string());

    let mut parts = Vec::new();
    if let Some(body) = document.select(&BODY).next() {
        collect_text(&body, &mut parts);
    }

    let page = format!("# {title}\n\n*Source: [{url}]({url})*\n\n---\n\n{}", parts.join("\n\n"));
    truncate(page)
}

fn collect_text(element: &ElementRef, parts: &mut Vec<String>) {
    if matches!(element.value().name(), "script" | "style" | "noscript" | "nav" | "footer") {
        return;
    }
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        } else if let Some(child) = ElementRef::wrap(child) {
            collect_text(&child, parts);
        }
    }
}

fn truncate(page: String) -> String {
    match page.char_indices().nth(MAX_PAGE_CHARS) {
        Some((cut, _)) => format!("{}\n\n... *Content truncated due to length* ...", &page[..cut]),
        None => page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_bounds() {
        assert!(random_reply(None).starts_with("Random number (1-100): "));
        assert_eq!(random_reply(Some("1")), "Random number (1-1): 1");
        assert_eq!(random_reply(Some("0")), "Please provide a positive maximum value.");
        assert!(random_reply(Some("1000000001")).contains("1 billion"));
        assert!(random_reply(Some("ten")).starts_with("Invalid input."));
    }

    #[test]
    fn url_normalization() {
        assert_eq!(normalize_url(Some("example.com"), "url").unwrap(), "https://example.com");
        assert_eq!(normalize_url(Some("https://a.io/x"), "url").unwrap(), "https://a.io/x");
        assert!(normalize_url(Some("http://a.io"), "url").unwrap_err().contains("`https://`"));
        assert!(normalize_url(None, "summarize").unwrap_err().contains("/summarize https://"));
    }

    #[test]
    fn page_rendering_skips_scripts() {
        let html = "<html><head><title> Hello </title></head><body><h1>Head</h1>\
            <script>var x = 1;</script><p>Para <b>bold</b></p></body></html>";
        let page = render_page("https://h.io", html);
        assert!(page.starts_with("# Hello\n\n*Source: [https://h.io](https://h.io)*\n\n---\n\n"));
        assert!(page.contains("Head"));
        assert!(page.contains("bold"));
        assert!(!page.contains("var x"));
    }

    #[test]
    fn long_pages_are_truncated_on_char_boundary() {
        let page = truncate("é".repeat(MAX_PAGE_CHARS + 5));
        assert!(page.ends_with("*Content truncated due to length* ..."));
        assert_eq!(page.chars().filter(|c| *c == 'é').count(), MAX_PAGE_CHARS);
    }
}
