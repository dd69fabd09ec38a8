use std::fs::File;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use keystone::LogLevel;
use keystone::core::config::{self, Overrides};
use keystone::core::i18n::Localizer;
use keystone::core::state::App;
use keystone::identity::{CognitoProvider, IdentityProvider, TokenCache};
use simplelog::{ConfigBuilder, WriteLogger};

#[derive(Parser)]
#[command(name = "keystone", about = "Terminal sign-in shell for a hosted identity service")]
struct Args {
    /// Identity profile from ~/.keystone/config.toml
    #[arg(short, long)]
    profile: Option<String>,

    /// Interface language code (e.g. en, fr, es)
    #[arg(short, long)]
    language: Option<String>,

    /// Minimum level written to keystone.log
    #[arg(long, default_value_t, value_enum)]
    log_level: LogLevel,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to keystone.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if let Ok(log_file) = File::create("keystone.log") {
        let _ = WriteLogger::init(args.log_level.into(), log_config, log_file);
    }

    let overrides = Overrides {
        profile: args.profile,
        language: args.language,
    };
    let resolved = match config::load_config().and_then(|c| config::resolve(&c, &overrides)) {
        Ok(resolved) => resolved,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            eprintln!("keystone: {e}");
            return ExitCode::FAILURE;
        }
    };

    log::info!(
        "Keystone starting up with profile '{}' (data dir {})",
        resolved.profile.name,
        resolved.data_dir.display()
    );

    let localizer = match &resolved.translations_file {
        Some(path) if path.exists() => Localizer::from_file(path).unwrap_or_else(|e| {
            log::warn!("Falling back to built-in translations: {}", e);
            Localizer::builtin()
        }),
        _ => Localizer::builtin(),
    };

    let cache = TokenCache::new(&resolved.data_dir, &resolved.profile.name);
    let provider = match CognitoProvider::new(resolved.cognito_settings(), cache) {
        Ok(provider) => provider,
        Err(e) => {
            log::error!("Identity provider setup failed: {}", e);
            eprintln!("keystone: {e}");
            return ExitCode::FAILURE;
        }
    };

    log::info!(
        "Identity provider: {} (profile: {}, identity pool: {})",
        provider.name(),
        resolved.profile.name,
        resolved.profile.identity_pool_id.as_deref().unwrap_or("none")
    );

    let mut app = App::new(Arc::new(provider), localizer, resolved.profile.name.clone());
    app.language_override = resolved.language.clone();

    match keystone::tui::run(app, resolved.store_path()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Terminal error: {}", e);
            eprintln!("keystone: {e}");
            ExitCode::FAILURE
        }
    }
}
