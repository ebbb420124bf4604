use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Args;
use client::{
    membership::RoomMembership,
    registry::SubscriptionRegistry,
    room::RoomSession,
    supervisor::ConnectionSupervisor,
    transport::{AuthContext, RealtimeTransport, ws::WebSocketTransport},
};
use shared::models::{ConnectionState, Message, MessageUser};
use tokio::io::{AsyncBufReadExt, BufReader};
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Args, Debug)]
#[command(about = "Join a chat, follow its timeline, and send stdin lines as messages")]
pub struct WatchArgs {
    /// Identifier of the chat to watch
    #[arg(long)]
    pub chat: String,

    /// Identifier of the signed-in user (attributed to sent messages)
    #[arg(long)]
    pub user: String,

    /// Display name for sent messages
    #[arg(long, default_value = "Me")]
    pub name: String,

    /// Backend HTTP base URL (overrides `RELAYCHAT_HTTP_URL`)
    #[arg(long)]
    pub server: Option<Url>,

    /// Backend realtime URL (overrides `RELAYCHAT_SOCKET_URL`)
    #[arg(long)]
    pub socket: Option<Url>,
}

fn render(message: &Message) {
    println!(
        "[{}] {}: {}",
        message.created_at,
        message.user.name,
        message.text
    );
}

pub async fn run(args: WatchArgs) -> Result<()> {
    let mut config = super::load_config()?;
    if let Some(server) = args.server {
        config.http_base_url = server;
    }
    if let Some(socket) = args.socket {
        config.socket_url = socket;
    }

    let transport: Arc<dyn RealtimeTransport> =
        Arc::new(WebSocketTransport::new(config.socket_url.clone()));
    let supervisor = ConnectionSupervisor::new(Arc::clone(&transport));
    let gateway = super::build_gateway(&config)?;

    supervisor
        .connect(AuthContext {
            cookie_header: super::session_cookie(),
        })
        .await;
    let mut status = supervisor.watch_status();
    tokio::time::timeout(
        CONNECT_TIMEOUT,
        status.wait_for(|state| *state == ConnectionState::Connected),
    )
    .await
    .context("timed out waiting for the realtime connection")?
    .context("realtime connection closed before it was established")?;

    let registry = Arc::new(SubscriptionRegistry::new(Arc::clone(&transport)));
    let membership = RoomMembership::new(Arc::clone(&transport));
    let session = RoomSession::new(
        args.chat.clone(),
        MessageUser {
            id: args.user,
            name: args.name,
            irc_nickname: None,
        },
        registry,
        membership,
        gateway,
    );
    session.activate().await?;

    let mut updates = session.watch_timeline();
    let mut printed = 0;
    for message in session.timeline() {
        render(&message);
        printed += 1;
    }

    println!("(watching {}; type a message and press enter, Ctrl-C to quit)", args.chat);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let timeline = updates.borrow_and_update().clone();
                for message in timeline.iter().skip(printed) {
                    render(message);
                }
                printed = timeline.len();
            }
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin failed")? else {
                    break;
                };
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                if let Err(err) = session.send(text).await {
                    eprintln!("send failed: {err}");
                    eprintln!("(your unsent text: {text})");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    session.deactivate().await?;
    supervisor.disconnect().await;
    Ok(())
}
