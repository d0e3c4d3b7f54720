//! `quill` command line: chat with the writing assistant and manage chapters
//! and outlines from a terminal.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use quill::http::sse_response;
use quill::{
    ChapterPlanRequest, ChatEventStream, OutlineContentRequest, OutlineDraft, ProtocolMessage,
    QuillConfig, QuillRuntime, build_runtime, chapter_list_conversation,
    outline_content_conversation,
};
use tokio::io::{AsyncWriteExt, stdout};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Writing assistant that plans and edits novel chapters through tool calls.
#[derive(Parser, Debug)]
#[command(name = "quill", author, version, about)]
struct Args {
    /// Config file (defaults to ~/.quill/config.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one message to the assistant
    Ask {
        message: String,

        /// Print server-sent event frames as they arrive
        #[arg(long)]
        stream: bool,
    },

    /// Plan and create new chapters after the existing ones
    GenerateChapters {
        /// Number of chapters to add
        #[arg(short = 'n', long)]
        count: u32,

        /// Outline the new chapters should focus on
        #[arg(long)]
        outline: Option<i64>,

        /// Extra requirements for the planner
        #[arg(long)]
        prompt: Option<String>,

        #[arg(long)]
        stream: bool,
    },

    /// Stream new content for an outline
    OutlineContent {
        #[arg(long)]
        outline: i64,

        #[arg(long)]
        prompt: String,

        /// Existing content to revise
        #[arg(long)]
        old_content: Option<String>,
    },

    /// List chapters ordered by number
    Chapters,

    /// List outlines
    Outlines,

    /// Manage outlines
    #[command(subcommand)]
    Outline(OutlineCommand),
}

#[derive(Subcommand, Debug)]
enum OutlineCommand {
    /// Create an outline
    Add {
        #[arg(long)]
        name: String,

        /// Outline kind, e.g. character, location, plot
        #[arg(long = "type")]
        kind: String,

        #[arg(long, default_value = "")]
        prompt: String,

        #[arg(long, default_value = "")]
        content: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = QuillConfig::load(args.config.as_deref()).context("loading configuration")?;
    let runtime = build_runtime(&config).context("building runtime")?;

    match args.command {
        Command::Ask { message, stream } => {
            run(&runtime, vec![ProtocolMessage::user(message)], stream).await
        }
        Command::GenerateChapters {
            count,
            outline,
            prompt,
            stream,
        } => {
            let request = ChapterPlanRequest {
                count,
                outline_id: outline,
                prompt,
            };
            let messages = chapter_list_conversation(runtime.store.as_ref(), &request).await?;
            run(&runtime, messages, stream).await
        }
        Command::OutlineContent {
            outline,
            prompt,
            old_content,
        } => {
            let request = OutlineContentRequest {
                outline_id: Some(outline),
                prompt,
                old_content,
            };
            let messages = outline_content_conversation(runtime.store.as_ref(), &request).await?;
            print_stream(runtime.chat.stream_turn(messages)).await
        }
        Command::Chapters => {
            let previews: Vec<_> = runtime
                .store
                .all_chapters()
                .await?
                .iter()
                .map(|chapter| chapter.preview())
                .collect();
            println!("{}", serde_json::to_string_pretty(&previews)?);
            Ok(())
        }
        Command::Outlines => {
            let outlines = runtime.store.all_outlines().await?;
            println!("{}", serde_json::to_string_pretty(&outlines)?);
            Ok(())
        }
        Command::Outline(OutlineCommand::Add {
            name,
            kind,
            prompt,
            content,
        }) => {
            let draft = OutlineDraft::new(name, kind)
                .with_prompt(prompt)
                .with_content(content);
            let outline = runtime.store.create_outline(draft).await?;
            println!("{}", serde_json::to_string_pretty(&outline)?);
            Ok(())
        }
    }
}

async fn run(runtime: &QuillRuntime, messages: Vec<ProtocolMessage>, stream: bool) -> Result<()> {
    if stream {
        return print_stream(runtime.chat.stream_turn(messages)).await;
    }

    let result = runtime.chat.run_turn(messages).await?;
    if !result.think_text.is_empty() {
        eprintln!("{}", result.think_text);
    }
    println!("{}", result.content);
    Ok(())
}

async fn print_stream(events: ChatEventStream<'static>) -> Result<()> {
    let mut body = sse_response(events).into_body();
    let mut out = stdout();
    let mut failed = false;

    while let Some(frame) = body.next().await {
        failed |= frame.starts_with(b"data: {\"error\"");
        out.write_all(&frame).await?;
        out.flush().await?;
    }

    if failed {
        bail!("run ended with an error");
    }
    Ok(())
}
