use clap::Subcommand;
use habitloom_core::storage::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the current configuration as TOML
    Show,
    /// Set a configuration key (e.g. timer.tick_interval_ms 500)
    Set { key: String, value: String },
    /// Print the config file path
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            match key.as_str() {
                "timer.tick_interval_ms" => config.timer.tick_interval_ms = value.parse()?,
                "timer.broadcast_enabled" => config.timer.broadcast_enabled = value.parse()?,
                "timer.activity_file" => {
                    config.timer.activity_file =
                        if value.is_empty() { None } else { Some(value) };
                }
                "defaults.metric_value" => config.defaults.metric_value = value.parse()?,
                "defaults.goal_value" => config.defaults.goal_value = value.parse()?,
                "defaults.metric_unit" => config.defaults.metric_unit = value,
                "defaults.timer_goal_minutes" => {
                    config.defaults.timer_goal_minutes = value.parse()?;
                }
                _ => return Err(format!("unknown config key '{key}'").into()),
            }
            config.save()?;
            println!("ok");
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
    }
    Ok(())
}
