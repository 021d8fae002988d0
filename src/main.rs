use std::env;
use std::process::ExitCode;

use twitch_pubsub::config::PubSubConfig;
use twitch_pubsub::pubsub::{handler_fn, PubSubClient, PubSubEvent, StaticToken, Topic, TopicKind};

fn log_event(topic: &Topic, event: PubSubEvent) {
    match event {
        PubSubEvent::ChannelPoints(points) => {
            let redemption = points.data.redemption;
            log::info!(
                "[{}] {} redeemed '{}' ({} points){}",
                topic,
                redemption.user.display_name,
                redemption.reward.title,
                redemption.reward.cost,
                redemption
                    .user_input
                    .map(|input| format!(": {}", input))
                    .unwrap_or_default()
            );
        }
        PubSubEvent::Bits(bits) => {
            log::info!(
                "[{}] {} cheered {} bits: {}",
                topic,
                bits.data.user_name.as_deref().unwrap_or("anonymous"),
                bits.data.bits_used,
                bits.data.chat_message
            );
        }
        other => log::info!("[{}] {:?}", topic, other),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(channel_id) = env::args().nth(1) else {
        eprintln!("usage: pubsub-tail <channel-id>");
        return ExitCode::FAILURE;
    };
    let Ok(token) = env::var("TWITCH_TOKEN") else {
        eprintln!("TWITCH_TOKEN must hold an OAuth token for the channel");
        return ExitCode::FAILURE;
    };

    let config = match PubSubConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = PubSubClient::new(config, StaticToken::new(token));

    for kind in [TopicKind::ChannelPoints, TopicKind::ChannelBits] {
        if let Err(e) = client.listen(kind, &channel_id, handler_fn(log_event)).await {
            log::error!("Failed to listen to {}: {}", kind, e);
            return ExitCode::FAILURE;
        }
    }

    if let Err(e) = client.connect().await {
        log::error!("{}", e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {}", e);
    }

    client.close().await;
    ExitCode::SUCCESS
}
