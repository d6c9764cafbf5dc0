//! Native messaging host launched by the browser extension.
//!
//! stdin/stdout carry length-prefixed JSON; nothing else may be written
//! to stdout.  Diagnostics go to the log file configured in
//! `<data_dir>/config.toml`.

use tracing::error;
use vaultzero::config::{resolve_data_dir, Settings};
use vaultzero::ipc::VaultClient;
use vaultzero::native_host::NativeHost;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // The browser passes the extension origin as an argument; the data
    // directory comes from the environment only.
    let data_dir = match resolve_data_dir(None) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("vaultzero-native-host: {e}");
            std::process::exit(1);
        }
    };

    // A broken config still lets the host answer with defaults.
    let (settings, config_error) = match Settings::load(&data_dir) {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };

    let _log_guard = settings
        .native_log_path(&data_dir)
        .and_then(|path| vaultzero::logging::init_file(&path, "info"));
    if let Some(e) = config_error {
        error!("using default settings: {e}");
    }

    let host = NativeHost::new(VaultClient::from_settings(&settings, &data_dir));
    if let Err(e) = host.run(tokio::io::stdin(), tokio::io::stdout()).await {
        error!("native host stopped: {e}");
        std::process::exit(1);
    }
}
