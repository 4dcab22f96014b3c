use anyhow::Result;
use notecast::{config, event, message, notebook, player, stdin, stream, studio};

#[cfg(feature = "live-espeak")]
fn live_backend(bus: &event::EventBus) -> Option<Box<dyn player::SpeechBackend>> {
    Some(Box::new(notecast::espeak::EspeakBackend::new(bus.clone())))
}

#[cfg(not(feature = "live-espeak"))]
fn live_backend(_bus: &event::EventBus) -> Option<Box<dyn player::SpeechBackend>> {
    None
}

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();

    let config = config::load().await?;

    let bus = event::EventBus::new();
    event::debug(&bus);
    message::init(&bus);

    let store = notebook::init(&bus, &config.storage.notebooks_file).await;

    let buffer = player::create_buffer();
    let live = live_backend(&bus);
    let player = player::init(&bus, buffer.clone(), live);
    stream::init(&bus, buffer, &config.stream);

    studio::init(&bus, config, store, player);
    stdin::init(&bus);

    println!("notecast ready, type help for commands");

    tokio::signal::ctrl_c().await?;

    Ok(())
}
