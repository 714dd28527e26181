//! convo - terminal demo client for the chat-thread engine

mod config;

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use tokio::io::AsyncBufReadExt;

use convo_thread::render::phase_of;
use convo_thread::{
    EchoConfig, RenderPhase, Role, SendInput, Thread, ThreadConfig, ThreadEvent,
};

/// convo - chat thread demo
#[derive(Parser, Debug)]
#[command(name = "convo")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Thread id (defaults to the config value)
    #[arg(short, long)]
    thread: Option<String>,

    /// Delay between echoed tokens, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Echo reply prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Send a single message non-interactively and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "convo=debug,convo_thread=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if args.init_config {
        let path = config::Config::init()?;
        println!("Config written to {}", path.display());
        return Ok(());
    }

    let cfg = config::Config::load();
    let thread_config = ThreadConfig {
        thread_id: args.thread.unwrap_or(cfg.thread_id),
        echo: EchoConfig {
            prefix: args.prefix.unwrap_or(cfg.echo_prefix),
            token_delay: Duration::from_millis(args.delay_ms.unwrap_or(cfg.echo_delay_ms)),
        },
    };
    tracing::debug!(thread_id = %thread_config.thread_id, "starting thread");

    // No adapter wired: the built-in echo fallback produces the replies.
    let thread = Thread::new(thread_config);

    match args.command {
        Some(text) => send(&thread, &text).await?,
        None => interactive(&thread).await?,
    }
    Ok(())
}

/// Read lines from stdin and send each as a user turn.
async fn interactive(thread: &Thread) -> anyhow::Result<()> {
    println!("convo | chat with the built-in echo thread. Ctrl-D to exit.");
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;
        match lines.next_line().await? {
            Some(line) => {
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                if let Err(e) = send(thread, text).await {
                    eprintln!("send failed: {e}");
                }
            }
            None => break,
        }
    }
    Ok(())
}

/// Dispatch one send, printing streamed output as it lands.
/// Ctrl-C aborts the in-flight send without exiting.
async fn send(thread: &Thread, text: &str) -> convo_thread::Result<()> {
    let mut events = thread.store().subscribe();
    let mut send = std::pin::pin!(thread.send_message(SendInput::text(text)));
    let mut stdout = std::io::stdout();
    let mut current: Option<(String, usize)> = None;

    let result = loop {
        tokio::select! {
            result = &mut send => break result,
            event = events.recv() => {
                if let Ok(event) = event {
                    print_event(event, &mut current, &mut stdout);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                thread.abort();
            }
        }
    };

    // Drain whatever the send left in the channel before returning.
    while let Ok(event) = events.try_recv() {
        print_event(event, &mut current, &mut stdout);
    }
    result
}

/// Print assistant output incrementally; `current` tracks the in-flight
/// assistant message and how many content bytes are already on screen.
fn print_event(
    event: ThreadEvent,
    current: &mut Option<(String, usize)>,
    stdout: &mut impl Write,
) {
    match event {
        ThreadEvent::MessageAppended { message } if message.role == Role::Assistant => {
            let _ = write!(stdout, "assistant> ");
            let _ = stdout.flush();
            *current = Some((message.id, 0));
        }
        ThreadEvent::MessageUpdated { message } => {
            let Some((id, printed)) = current.as_mut() else {
                return;
            };
            if *id != message.id {
                return;
            }
            match phase_of(&message) {
                RenderPhase::Failed => {
                    let _ = writeln!(
                        stdout,
                        "[error] {}",
                        message.error.as_deref().unwrap_or("unknown")
                    );
                    *current = None;
                }
                phase => {
                    // Content is append-only, so the unseen suffix is safe
                    // to slice off by byte offset.
                    if message.content.len() > *printed {
                        let _ = write!(stdout, "{}", &message.content[*printed..]);
                        *printed = message.content.len();
                        let _ = stdout.flush();
                    }
                    if phase == RenderPhase::Finalized {
                        let _ = writeln!(stdout);
                        *current = None;
                    }
                }
            }
        }
        _ => {}
    }
}
