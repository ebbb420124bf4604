use anyhow::Result;
use clap::Args;
use client::gateway::ChatGateway;
use url::Url;

#[derive(Args, Debug)]
#[command(about = "List the chats the signed-in user participates in")]
pub struct ChatsArgs {
    /// Backend HTTP base URL (overrides `RELAYCHAT_HTTP_URL`)
    #[arg(long)]
    pub server: Option<Url>,
}

pub async fn run(args: ChatsArgs) -> Result<()> {
    let mut config = super::load_config()?;
    if let Some(server) = args.server {
        config.http_base_url = server;
    }

    let gateway = super::build_gateway(&config)?;
    let chats = gateway.list_chats().await?;

    if chats.is_empty() {
        println!("No chats found.");
        return Ok(());
    }
    for chat in &chats {
        let channel = chat.irc_channel_name.as_deref().unwrap_or("-");
        println!("- {} (id={}, channel={})", chat.display_name(), chat.id, channel);
    }
    Ok(())
}
