use crate::cli::args::{ConfigArgs, ConfigCommand};
use crate::config::{mask_value, Config, KEYS};
use crate::error::Result;

/// Execute config command
pub async fn execute(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Set { key, value } => {
            let mut config = Config::load_file()?;
            config.set(&key, &value)?;
            println!("✅ Configuration updated: {} = {}", key, display_value(&key, &value));
            Ok(())
        }
        ConfigCommand::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => {
                    println!("{}: {}", key, display_value(&key, &value));
                }
                None => {
                    println!("Configuration key '{}' not set", key);
                }
            }
            Ok(())
        }
        ConfigCommand::Path => {
            let path = Config::config_file_path()?;
            println!("Configuration file: {}", path.display());
            Ok(())
        }
        ConfigCommand::Init => {
            Config::initialize()?;
            println!("✅ Configuration initialized");
            println!();
            println!("To set your API keys, run:");
            println!("  tourlens config set tour.key YOUR_API_KEY");
            println!();
            println!("Available keys:");
            for key in KEYS {
                println!("  {}", key);
            }
            println!();
            println!("Get a tourism API key from: https://www.data.go.kr");
            Ok(())
        }
    }
}

fn display_value(key: &str, value: &str) -> String {
    if Config::is_secret(key) {
        mask_value(value)
    } else {
        value.to_string()
    }
}
