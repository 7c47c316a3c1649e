use std::sync::Arc;

use tokio::sync::Notify;

use reflector_cast::arguments::{
    get_config_path_override,
    get_gain_override,
    get_module_override,
    get_proxy_override,
    get_reflector_override,
    patterns,
    print_debug_info,
    print_help,
};
use reflector_cast::audio::{ LogSink, PassthroughCodec };
use reflector_cast::config::{ self, CONFIG_FILE_PATH };
use reflector_cast::connection::WsTransport;
use reflector_cast::logger::{ self, LogTag };
use reflector_cast::player::Player;

/// Headless channel monitor/player
///
/// Loads the channel settings, starts the engine with the real websocket
/// transport, creates one playing session and runs until ctrl-c. The audio
/// sink only logs segment accounting; real deployments inject their codec
/// and output device through the library API.
#[tokio::main]
async fn main() {
    logger::init();

    if patterns::is_help_requested() {
        print_help();
        std::process::exit(0);
    }

    logger::info(LogTag::System, "reflector-cast starting up...");
    print_debug_info();

    let config_path = get_config_path_override().unwrap_or_else(|| CONFIG_FILE_PATH.to_string());
    let mut settings = match config::load_settings_from_path(&config_path) {
        Ok(settings) => settings,
        Err(e) => {
            logger::error(LogTag::Config, &format!("Failed to load settings: {}", e));
            std::process::exit(1);
        }
    };

    // Command-line overrides beat the settings file
    if let Some(proxy) = get_proxy_override() {
        settings.channel.proxy = proxy;
    }
    if let Some(reflector) = get_reflector_override() {
        settings.channel.reflector = reflector;
    }
    if let Some(module) = get_module_override() {
        settings.channel.module = module;
    }
    if let Some(gain) = get_gain_override() {
        settings.audio.gain = gain;
    }

    logger::info(
        LogTag::System,
        &format!(
            "Tuning {}/{}/{} (gain {:.2})",
            settings.channel.proxy,
            settings.channel.reflector,
            settings.channel.module,
            settings.audio.gain
        )
    );

    let (handle, engine) = Player::spawn(Arc::new(WsTransport));
    let session = handle.add_session(
        settings.channel,
        settings.audio,
        Arc::new(PassthroughCodec),
        Arc::new(LogSink)
    );
    handle.toggle_play(session);

    // Run until ctrl-c, then drain the engine cleanly
    let shutdown = Arc::new(Notify::new());
    {
        let shutdown = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || shutdown.notify_one()) {
            logger::error(LogTag::System, &format!("Failed to install ctrl-c handler: {}", e));
            std::process::exit(1);
        }
    }
    shutdown.notified().await;

    logger::info(LogTag::System, "Shutting down...");
    handle.shutdown();
    if let Err(e) = engine.await {
        logger::error(LogTag::System, &format!("Engine task failed: {}", e));
    }

    logger::info(LogTag::System, "Goodbye");
}
