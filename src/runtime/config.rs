//! Configuration Management
//!
//! The global configuration is read once from the user config directory
//! (`sdrflow/config.toml`), a `config.toml` in the working directory and
//! `SDRFLOW_*` environment variables, in this order.
use config::File;
use config::Source;
use config::Value;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::MutexGuard;
use tracing::level_filters::LevelFilter;

/// Get global configuration
pub fn config() -> Config {
    get_config().clone()
}

// helper to deal with poisoned Mutex
fn get_config() -> MutexGuard<'static, Config> {
    CONFIG.lock().unwrap_or_else(|poison| {
        warn!("config poisoned, restoring initial config");
        let mut c = poison.into_inner();
        *c = init_config();
        CONFIG.clear_poison();
        c
    })
}

/// Set config value
pub fn set<V: Into<config::Value>>(name: impl Into<String>, value: V) {
    get_config().set_value(name, value);
}

/// Get value from config
pub fn get_value(name: &str) -> Option<Value> {
    get_config().misc.get(name).cloned()
}

/// Try to parse value from config string
pub fn get<T: FromStr>(name: &str) -> Option<T> {
    get_config()
        .misc
        .get(name)
        .and_then(|v| v.clone().into_string().ok())
        .and_then(|v| v.parse::<T>().ok())
}

fn init_config() -> Config {
    let mut settings = ::config::Config::builder();

    // user config
    if let Some(mut path) = dirs::config_dir() {
        path.push("sdrflow");
        path.push("config.toml");

        settings = settings.add_source(File::from(path).required(false));
    }

    // project config
    settings =
        settings.add_source(File::new("config.toml", config::FileFormat::Toml).required(false));

    // env config
    settings = settings.add_source(config::Environment::with_prefix("sdrflow"));

    // start from default config
    let mut c = Config::default();

    match settings.build() {
        Ok(settings) => match settings.collect() {
            Ok(values) => {
                for (k, v) in values {
                    c.set_value(k, v);
                }
            }
            Err(e) => warn!("error parsing config {e:?}"),
        },
        Err(e) => warn!("error reading config {e:?}"),
    }
    c
}

static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(init_config()));

/// Configuration
///
/// A [`Runtime`](crate::runtime::Runtime) takes a snapshot of the global
/// configuration or an explicit one with
/// [`Runtime::with_config`](crate::runtime::Runtime::with_config).
#[derive(Debug, Clone)]
pub struct Config {
    /// Queue size of block inboxes
    pub queue_size: usize,
    /// Minimum stream buffer size in bytes
    pub buffer_size: usize,
    /// Cap on items per `work()` call, unless a block sets its own
    pub max_noutput_items: Option<usize>,
    /// Worker thread stack size
    pub stack_size: usize,
    /// Maximum sleep of an idle worker in microseconds
    pub backoff_max: u64,
    /// Pin worker threads to CPU cores
    pub pin_workers: bool,
    /// Trace every scheduling decision
    pub debug: bool,
    /// Log level
    pub log_level: LevelFilter,
    misc: HashMap<String, Value>,
}

impl Config {
    fn set_value<V: Into<config::Value>>(&mut self, name: impl Into<String>, value: V) {
        let name = name.into();
        let value = value.into();

        match name.as_str() {
            "queue_size" => {
                self.queue_size = config_parse::<usize>(&name, &value, self.queue_size);
            }
            "buffer_size" => {
                self.buffer_size = config_parse::<usize>(&name, &value, self.buffer_size);
            }
            "max_noutput_items" => {
                let v = config_parse::<usize>(&name, &value, 0);
                self.max_noutput_items = if v == 0 { None } else { Some(v) };
            }
            "stack_size" => {
                self.stack_size = config_parse::<usize>(&name, &value, self.stack_size);
            }
            "backoff_max" => {
                self.backoff_max = config_parse::<u64>(&name, &value, self.backoff_max);
            }
            "pin_workers" => {
                self.pin_workers = config_parse::<bool>(&name, &value, self.pin_workers);
            }
            "debug" => {
                self.debug = config_parse::<bool>(&name, &value, self.debug);
            }
            "log_level" => {
                self.log_level = config_parse::<LevelFilter>(&name, &value, self.log_level);
            }
            _ => {
                self.misc.insert(name, value);
            }
        }
    }

    /// Get free-form value
    pub fn get<T: FromStr>(&self, name: &str) -> Option<T> {
        self.misc
            .get(name)
            .and_then(|v| v.clone().into_string().ok())
            .and_then(|v| v.parse::<T>().ok())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            queue_size: 8192,
            buffer_size: 32768,
            max_noutput_items: None,
            stack_size: 16 * 1024 * 1024,
            backoff_max: 1000,
            pin_workers: false,
            debug: false,
            #[cfg(debug_assertions)]
            log_level: LevelFilter::DEBUG,
            #[cfg(not(debug_assertions))]
            log_level: LevelFilter::INFO,
            misc: HashMap::new(),
        }
    }
}

fn config_parse<T: FromStr>(name: &str, v: &Value, default: T) -> T {
    if let Ok(s) = v.clone().into_string() {
        if let Ok(v) = s.parse::<T>() {
            return v;
        }
    }

    warn!("invalid config value {v:?} for {name}, keeping {name} unchanged");
    default
}
