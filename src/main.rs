use anyhow::{Context, Result};
use clap::Parser;
use openai_assistant::{
    assistants::runs::Status, config::ChatConfig, remove_newlines, ChatSession, OpenAiClient,
};
use std::io::{stdin, stdout, Write};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ChatConfig::parse();
    let client = OpenAiClient::new(config.credentials()).context("failed to build HTTP client")?;
    let mut session = ChatSession::start(client, &config.assistant_id, config.poll_options())
        .await
        .context("failed to start conversation")?;
    if let Some(instructions) = &config.instructions {
        session = session.with_instructions(instructions.as_str());
    }
    if let Some(greeting) = &config.greeting {
        println!("{greeting}");
    }

    loop {
        print!("Enter your message: ");
        stdout().flush()?;

        let mut content = String::new();
        if stdin().read_line(&mut content)? == 0 {
            break;
        }

        let content = content.trim();
        if content.is_empty() {
            continue;
        }
        if content == "/exit" {
            break;
        }

        let reply = session.send(content).await?;
        if reply.run.status != Status::Completed {
            match &reply.run.last_error {
                Some(error) => eprintln!(
                    "run {} ended as {}: {} ({})",
                    reply.run.id, reply.run.status, error.message, error.code
                ),
                None => eprintln!("run {} ended as {}", reply.run.id, reply.run.status),
            }
        }
        if config.single_line {
            println!("{}", remove_newlines(&reply.text));
        } else {
            println!("{}", reply.text);
        }
    }

    Ok(())
}
