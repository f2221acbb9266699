//! Configuration manager with live reload support.
//!
//! This service watches the configuration file for changes and pushes
//! every valid update into the [`IconManager`].
//!
//! ## Architecture
//!
//! - A file watcher thread monitors `config.toml` for modifications.
//! - On change, the new config is parsed and validated on that thread.
//! - The result is sent over an mpsc channel to the control thread, which
//!   owns the icon manager and the signal cluster.
//! - The control thread applies style fields through the manager's
//!   mutators, so listeners see one notification per changed field.
//!
//! ## Supported Live Reload
//!
//! - `icons.*`, `data_activity.*`: applied as style changes
//! - `cache.capacity`: resizes the artifact cache in place
//! - `signal_cluster.*`: reinstalls the signal cluster with the new options

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use notify_debouncer_mini::{DebounceEventResult, new_debouncer, notify::RecursiveMode};
use tracing::{debug, error, info, warn};

use tintbar_core::host::HostIconSurface;
use tintbar_core::{Config, IconManager, SignalCluster};

/// Debounce interval (in ms) for file change events. Editors often trigger
/// multiple events for a single save; this batches them into one reload.
const FILE_CHANGE_DEBOUNCE_MS: u64 = 300;

/// Messages sent from the file watcher thread to the control thread.
#[derive(Debug)]
pub enum ConfigMessage {
    /// A new valid config was loaded.
    Reloaded(Box<Config>),
    /// Config file changed but failed to load/validate.
    Error(String),
}

/// Holds the current configuration and keeps the icon manager and signal
/// cluster in sync with it.
pub struct ConfigManager {
    /// Current configuration.
    config: RefCell<Config>,
    /// Path to the config file being watched (if any).
    config_path: Option<PathBuf>,
    manager: Rc<IconManager>,
    surface: Rc<dyn HostIconSurface>,
    cluster: RefCell<Rc<SignalCluster>>,
    /// Shutdown flag for the file watcher thread.
    shutdown_flag: Arc<AtomicBool>,
}

impl ConfigManager {
    /// Create a manager for `config` and install the signal cluster on
    /// `surface`.
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        manager: Rc<IconManager>,
        surface: Rc<dyn HostIconSurface>,
    ) -> Rc<Self> {
        let cluster = install_cluster(&manager, &surface, &config);
        Rc::new(Self {
            config: RefCell::new(config),
            config_path,
            manager,
            surface,
            cluster: RefCell::new(cluster),
            shutdown_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> Config {
        self.config.borrow().clone()
    }

    pub fn cluster(&self) -> Rc<SignalCluster> {
        Rc::clone(&self.cluster.borrow())
    }

    /// Start watching the config file for changes.
    ///
    /// Spawns a background thread that monitors the config file and returns
    /// the receiving end of its message channel. Returns `None` if no config
    /// file path is set (using defaults).
    pub fn start_watching(&self) -> Option<Receiver<ConfigMessage>> {
        let Some(path) = self.config_path.clone() else {
            info!("No config file to watch (using defaults)");
            return None;
        };

        if !path.exists() {
            warn!(
                "Config file does not exist, cannot watch: {}",
                path.display()
            );
            return None;
        }

        info!("Starting config file watcher for: {}", path.display());

        let (tx, rx) = mpsc::channel();
        let shutdown_flag = self.shutdown_flag.clone();

        thread::spawn(move || {
            Self::run_file_watcher(path, tx, shutdown_flag);
        });

        Some(rx)
    }

    /// Run the file watcher loop (called on a background thread).
    fn run_file_watcher(path: PathBuf, tx: Sender<ConfigMessage>, shutdown_flag: Arc<AtomicBool>) {
        let debounce_duration = Duration::from_millis(FILE_CHANGE_DEBOUNCE_MS);

        // Canonicalize the path so we can compare with absolute paths from notify
        let canonical_path = match path.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                error!("Failed to canonicalize config path: {}", e);
                return;
            }
        };

        let path_for_handler = canonical_path.clone();
        let mut debouncer =
            match new_debouncer(debounce_duration, move |res: DebounceEventResult| {
                match res {
                    Ok(events) => {
                        if events.iter().any(|e| e.path == path_for_handler) {
                            debug!("Config file change detected");
                            Self::reload_and_send(&path_for_handler, &tx);
                        }
                    }
                    Err(err) => {
                        error!("File watcher error: {}", err);
                    }
                }
            }) {
                Ok(d) => d,
                Err(e) => {
                    error!("Failed to create file watcher: {}", e);
                    return;
                }
            };

        // Watch the parent directory; editors often replace the file on save
        let watch_dir = canonical_path.parent().unwrap_or(&canonical_path);
        if let Err(e) = debouncer
            .watcher()
            .watch(watch_dir, RecursiveMode::NonRecursive)
        {
            error!("Failed to watch config directory: {}", e);
            return;
        }

        info!("File watcher started, watching: {}", watch_dir.display());

        while !shutdown_flag.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_millis(500));
        }

        debug!("Config file watcher thread shutting down");
    }

    /// Reload config from file and send the result to the control thread.
    fn reload_and_send(path: &Path, tx: &Sender<ConfigMessage>) {
        let msg = match Config::load(path) {
            Ok(new_config) => match new_config.validate() {
                Ok(()) => {
                    info!("Config reloaded successfully from: {}", path.display());
                    ConfigMessage::Reloaded(Box::new(new_config))
                }
                Err(e) => {
                    let msg = format!("Config validation failed: {}", e);
                    warn!("{}", msg);
                    ConfigMessage::Error(msg)
                }
            },
            Err(e) => {
                let msg = format!("Failed to reload config: {}", e);
                warn!("{}", msg);
                ConfigMessage::Error(msg)
            }
        };

        if tx.send(msg).is_err() {
            debug!("Control thread gone, dropping config message");
        }
    }

    /// Handle a config message from the file watcher.
    pub fn handle_config_message(&self, msg: ConfigMessage) {
        match msg {
            ConfigMessage::Reloaded(new_config) => {
                self.apply_config(*new_config);
            }
            ConfigMessage::Error(err) => {
                // Keep using the old config
                error!("Config reload error: {}", err);
            }
        }
    }

    /// Apply a new configuration, updating the manager and the cluster.
    fn apply_config(&self, new_config: Config) {
        let style = match new_config.style() {
            Ok(style) => style,
            Err(e) => {
                error!("Config reload error: {}", e);
                return;
            }
        };
        let old_config = self.config.replace(new_config.clone());

        info!("Applying new configuration...");

        if old_config.cache.capacity != new_config.cache.capacity {
            info!(
                "cache.capacity changed ({} -> {})",
                old_config.cache.capacity, new_config.cache.capacity
            );
            self.manager.set_cache_capacity(new_config.cache.capacity);
        }

        let changed = self.manager.apply_style(&style);
        if !changed.is_empty() {
            debug!("Style aspects changed: {:?}", changed);
        }

        if cluster_options_changed(&old_config, &new_config) {
            info!(
                "signal_cluster changed ({:?} -> {:?}), reinstalling",
                old_config.signal_cluster, new_config.signal_cluster
            );
            let old_cluster = self.cluster();
            old_cluster.uninstall();
            let cluster = install_cluster(&self.manager, &self.surface, &new_config);
            *self.cluster.borrow_mut() = cluster;
        }

        info!("Configuration applied successfully");
    }

    /// Stop watching the config file.
    pub fn stop_watching(&self) {
        self.shutdown_flag.store(true, Ordering::Relaxed);
        debug!("Config watcher stopped");
    }
}

fn install_cluster(
    manager: &Rc<IconManager>,
    surface: &Rc<dyn HostIconSurface>,
    config: &Config,
) -> Rc<SignalCluster> {
    let cluster = SignalCluster::install(manager, Rc::clone(surface), config.signal_cluster);
    cluster.attach();
    cluster
}

/// Check if the signal cluster has to be reinstalled.
fn cluster_options_changed(old: &Config, new: &Config) -> bool {
    old.signal_cluster != new.signal_cluster
}
