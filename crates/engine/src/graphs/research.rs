use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use once_cell::sync::Lazy;
use plebchat_shared::{ChatMessage, CommandResult, GraphInfo};
use tracing::warn;

use super::{route_command, stream_reply, Graph, GraphContext, GraphInput};
use crate::commands::{builtin, CommandContext, CommandSpec, CommandTable};
use crate::events::{EventWriter, GraphError, Node};
use crate::search::{self, SearchHit};

const SEARCH_WEB: Node = Node::thought("search_web");
const GENERATE_ANSWER: Node = Node::answer("generate_answer");
const MAX_RESULTS: usize = 5;

const SYSTEM_PROMPT: &str = "You are a helpful research assistant that provides comprehensive answers based on web search results.

Your goal is to:
1. Analyze search results thoroughly
2. Provide accurate, well-structured responses
3. Include relevant citations to sources using the format [1], [2], etc.
4. Be objective and factual in your analysis

Always base your answers solely on the provided search results. If the search results don't contain enough information to answer the question, say so clearly.
";

const ABOUT: &str = "
I am a research assistant that can search the web for information.

I use SearXNG to perform web searches and provide comprehensive answers with citations.

Try `/help` for a list of commands.
";

static COMMANDS: Lazy<CommandTable> = Lazy::new(|| {
    let mut commands = builtin::shared();
    commands.push(CommandSpec::new(
        "search",
        "Perform a web search on a specific topic.",
        "Usage: /search [query]\nSearches the web for information on the specified query and returns relevant results.",
        search_command,
    ));
    CommandTable::new("research", ABOUT, commands)
});

fn search_command<'a>(ctx: &'a CommandContext<'a>, args: &'a [String]) -> BoxFuture<'a, CommandResult> {
    async move {
        let query = args.join(" ");
        if query.trim().is_empty() {
            return CommandResult::direct(
                "⚠️ Please provide a search query.\n\n**Example:**\n```\n/search latest AI developments\n```",
            );
        }
        match search::search(ctx.http, &ctx.config.searxng_url, &query, MAX_RESULTS, "search").await {
            Ok(hits) => CommandResult::direct(search::format_hits(&query, &hits)),
            Err(e) => CommandResult::direct(e.user_message()),
        }
    }
    .boxed()
}

fn grounded_prompt(question: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("Question: {question}\n\nNo search results are available.");
    }
    let sources: Vec<String> = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| format!("[{}] {}\nURL: {}\n{}", i + 1, hit.title, hit.url, hit.content))
        .collect();
    format!("Question: {question}\n\nSearch results:\n\n{}", sources.join("\n\n"))
}

/// Searches the web, then answers from the results with citations.
pub struct Research;

#[async_trait]
impl Graph for Research {
    fn info(&self) -> GraphInfo {
        GraphInfo { id: "research".to_string(), name: "🔍 Research".to_string() }
    }

    fn commands(&self) -> Option<&'static CommandTable> {
        Some(&*COMMANDS)
    }

    async fn execute(
        &self,
        input: GraphInput,
        ctx: GraphContext,
        writer: EventWriter,
    ) -> Result<(), GraphError> {
        if route_command(&input, &ctx, &writer, &COMMANDS, true).await? {
            return Ok(());
        }

        let question = input.latest_user_text().unwrap_or_default().to_string();

        writer.enter(&SEARCH_WEB).await?;
        let hits = match search::search(
            &ctx.http,
            &ctx.config.searxng_url,
            &question,
            MAX_RESULTS,
            SEARCH_WEB.id,
        )
        .await
        {
            Ok(hits) => {
                writer.token(&SEARCH_WEB, search::format_hits(&question, &hits)).await?;
                hits
            }
            Err(e) => {
                warn!(error = %e, "search failed, answering without results");
                writer
                    .token(&SEARCH_WEB, format!("{}\nAnswering without search results.\n", e.user_message()))
                    .await?;
                Vec::new()
            }
        };

        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(grounded_prompt(&question, &hits)),
        ];
        stream_reply(ctx.model.as_ref(), &GENERATE_ANSWER, messages, &writer).await?;
        Ok(())
    }
}
