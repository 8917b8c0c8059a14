use anyhow::Result;
use clap::Parser;
use gemini_relay::client::{ChatBackend, ChatSession, ProxyBackend, StreamingProxyBackend};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Terminal chat window for the Gemini relay.
#[derive(Parser, Debug)]
#[command(name = "chat", version, about)]
struct Args {
    /// Base URL of the relay
    #[arg(long, env = "CHAT_PROXY_URL", default_value = "http://localhost:8080")]
    proxy_url: String,

    /// Use the streaming endpoint
    #[arg(long)]
    stream: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if args.stream {
        run(ChatSession::new(StreamingProxyBackend::new(&args.proxy_url))).await
    } else {
        run(ChatSession::new(ProxyBackend::new(&args.proxy_url))).await
    }
}

async fn run<B: ChatBackend>(mut session: ChatSession<B>) -> Result<()> {
    println!("Connected to relay. Type a message and press Enter, /quit to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == "/quit" {
            break;
        }

        let start = session.view().messages().len();
        let Some(message) = session.begin_turn(&line)? else {
            continue;
        };
        print_lines(session.view().render_from(start));

        let outcome = session.backend().send(&message).await;
        // The placeholder sits at the end until the reply replaces it.
        let placeholder = session.view().messages().len() - 1;
        session.finish_turn(outcome)?;
        print_lines(session.view().render_from(placeholder));
    }

    Ok(())
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}
