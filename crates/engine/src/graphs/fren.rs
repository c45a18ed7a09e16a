use async_trait::async_trait;
use futures_util::future::{self, BoxFuture};
use futures_util::FutureExt;
use once_cell::sync::Lazy;
use plebchat_shared::{ChatMessage, CommandResult, GraphInfo};

use super::{route_command, stream_reply, Graph, GraphContext, GraphInput};
use crate::commands::{builtin, CommandContext, CommandSpec, CommandTable};
use crate::events::{EventWriter, GraphError, Node};

const OLLAMA: Node = Node::answer("ollama");

const PERSONA: &str = "You are Fren, a friendly and down-to-earth chat assistant. \
Answer plainly and helpfully. Use markdown when it makes the answer easier to read.";

const ABOUT: &str = "
I am a simple chat agent that anyone can use anonymously.

I aim to be a useful assistant, and there's more I can do with new features being added all the time!

Try `/help` for a list of commands.
";

const HI: &str = "👋 Hi there!

You must be the `pleb` I've heard so much about...

I'm `Ollama`.  I'm just a simple chatbot agent.

Type `/about` to learn more.

Type `/help` to see a list of commands.

Or, just start asking questions!  I'm here to help.
";

static COMMANDS: Lazy<CommandTable> = Lazy::new(|| {
    let mut commands = builtin::shared();
    commands.push(CommandSpec::new(
        "hi",
        "Tell the bot to say hello to you.",
        "Usage: /hi",
        hi,
    ));
    CommandTable::new("fren", ABOUT, commands)
});

fn hi<'a>(_: &'a CommandContext<'a>, _: &'a [String]) -> BoxFuture<'a, CommandResult> {
    future::ready(CommandResult::direct(HI)).boxed()
}

/// Plain chat with the configured model.
pub struct Fren;

#[async_trait]
impl Graph for Fren {
    fn info(&self) -> GraphInfo {
        GraphInfo { id: "fren".to_string(), name: "🐸 Fren".to_string() }
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
        if route_command(&input, &ctx, &writer, &COMMANDS, false).await? {
            return Ok(());
        }

        let mut messages = vec![ChatMessage::system(PERSONA)];
        messages.extend(input.conversation());
        stream_reply(ctx.model.as_ref(), &OLLAMA, messages, &writer).await?;
        Ok(())
    }
}
