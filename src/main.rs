use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use intake_flow::command::Command;
use intake_flow::config::FlowConfig;
use intake_flow::flow::{
    ConversationDispatcher, FlowController, FlowRouteState, FormModel, Reply, SessionStore,
    flow_routes, spawn_eviction_task,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = FlowConfig::from_env().context("invalid FLOW_* configuration")?;

    eprintln!("📝 Intake Flow v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Flow API: http://0.0.0.0:{}/api/flow/<session>", config.http_port);
    eprintln!("   Session idle timeout: {:?}", config.session_idle_timeout);
    eprintln!("   Type `<session> <message>` and press Enter.");
    eprintln!("   Commands: /agent <session>, /reset <session>, /show <session>, /quit\n");

    let store = SessionStore::new(Arc::new(FormModel::customer_info()));
    let flow = FlowController::new(Arc::clone(&store));
    let dispatcher = ConversationDispatcher::new(flow.clone(), &config);

    let _eviction_handle = spawn_eviction_task(
        Arc::clone(&store),
        config.session_idle_timeout,
        config.sweep_interval,
    );

    let app = flow_routes(FlowRouteState { flow: flow.clone() });
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .with_context(|| format!("failed to bind port {}", config.http_port))?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Flow API server failed: {}", e);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprint!("> ");
    while let Some(line) = lines.next_line().await? {
        let Some(command) = Command::parse(&line) else {
            eprint!("> ");
            continue;
        };

        let output = match command {
            Command::Quit => break,
            Command::MissingSession { command } => format!("usage: {command} <session>"),
            Command::Agent { session } => match flow.begin_conversation(&session).await {
                Ok(summary) => format!("[{}] {}", summary.id, summary.state),
                Err(e) => format!("error: {e}"),
            },
            Command::Reset { session } => {
                format!("[{session}] reset: {}", flow.reset_flow(&session).await)
            }
            Command::Show { session } => match flow.summarize(&session).await {
                Ok(summary) => serde_json::to_string_pretty(&summary)?,
                Err(e) => format!("error: {e}"),
            },
            Command::Message { session, text } => match dispatcher.handle(&session, &text).await {
                Ok(Reply::Send(reply)) => format!("[{session}] {reply}"),
                Ok(Reply::Forward) => format!("[{session}] (forwarded to agent)"),
                Ok(Reply::Contended) => format!("[{session}] (busy, try again)"),
                Err(e) => format!("error: {e}"),
            },
        };
        println!("\n{output}\n");
        eprint!("> ");
    }

    Ok(())
}
