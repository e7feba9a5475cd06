//! Lazily-built, build-once holder of the toolkit.

use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

use crate::config::ToolkitConfig;
use crate::mcp::tools::Callable;
use crate::toolkit::{Toolkit, ToolkitFactory};
use crate::utils::error::{McpError, McpResult};

/// Owns the toolkit for the lifetime of the server.
///
/// The toolkit is built on first use with whatever configuration is current
/// at that moment. Once built it is never rebuilt, and later configuration
/// changes are ignored. Concurrent first uses build it exactly once.
pub struct ToolkitRegistry {
    factory: Arc<dyn ToolkitFactory>,
    config: RwLock<ToolkitConfig>,
    toolkit: OnceCell<Arc<dyn Toolkit>>,
}

impl fmt::Debug for ToolkitRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolkitRegistry")
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

impl ToolkitRegistry {
    /// Creates an unbuilt registry
    pub fn new(factory: Arc<dyn ToolkitFactory>, config: ToolkitConfig) -> Self {
        Self {
            factory,
            config: RwLock::new(config),
            toolkit: OnceCell::new(),
        }
    }

    /// Replaces the configuration the toolkit will be built with.
    ///
    /// Returns `false`, leaving everything untouched, once the toolkit has
    /// been built. A build in progress holds the configuration, so this
    /// waits for it and then reports `false`.
    pub fn configure(&self, config: ToolkitConfig) -> bool {
        let mut current = self.config.write().unwrap_or_else(|e| e.into_inner());
        if self.is_initialized() {
            warn!("Toolkit already initialized, ignoring new configuration");
            return false;
        }
        *current = config;
        true
    }

    /// Configuration the toolkit was (or will be) built with
    pub fn config(&self) -> ToolkitConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Whether the toolkit has been built
    pub fn is_initialized(&self) -> bool {
        self.toolkit.get().is_some()
    }

    /// Returns the toolkit, building it on first call.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::ToolkitInit`] when the factory fails. A failed
    /// build is not cached; nothing retries it either, since the error is
    /// fatal to the server.
    pub fn ensure_initialized(&self) -> McpResult<Arc<dyn Toolkit>> {
        if let Some(toolkit) = self.toolkit.get() {
            return Ok(toolkit.clone());
        }

        // Held until the toolkit is stored so `configure` cannot slip in
        let config = self.config.read().unwrap_or_else(|e| e.into_inner());
        self.toolkit
            .get_or_try_init(|| {
                info!(config = ?*config, "Initializing toolkit");
                self.factory.build(&config).map_err(|e| match e {
                    McpError::ToolkitInit(_) => e,
                    other => McpError::ToolkitInit(other.to_string()),
                })
            })
            .cloned()
    }

    /// Callables of the built toolkit
    pub fn list_callables(&self) -> McpResult<Vec<Arc<dyn Callable>>> {
        Ok(self.ensure_initialized()?.callables())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::StaticToolkit;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Mutex};
    use std::thread;
    use std::time::Duration;

    fn counting_factory(
        builds: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<ToolkitConfig>>>,
    ) -> Arc<dyn ToolkitFactory> {
        Arc::new(move |config: &ToolkitConfig| -> McpResult<Arc<dyn Toolkit>> {
            builds.fetch_add(1, Ordering::SeqCst);
            seen.lock().unwrap().push(config.clone());
            Ok(Arc::new(StaticToolkit::default()))
        })
    }

    #[test]
    fn test_builds_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let registry = ToolkitRegistry::new(
            counting_factory(builds.clone(), Arc::default()),
            ToolkitConfig::default(),
        );

        assert!(!registry.is_initialized());
        registry.ensure_initialized().unwrap();
        registry.ensure_initialized().unwrap();
        registry.list_callables().unwrap();

        assert!(registry.is_initialized());
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_first_configuration_wins() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = ToolkitRegistry::new(
            counting_factory(Arc::default(), seen.clone()),
            ToolkitConfig::default(),
        );

        let startup = ToolkitConfig {
            working_directory: Some(PathBuf::from("/srv/work")),
            ..ToolkitConfig::default()
        };
        assert!(registry.configure(startup.clone()));
        registry.ensure_initialized().unwrap();

        let late = ToolkitConfig {
            safe_mode: false,
            ..ToolkitConfig::default()
        };
        assert!(!registry.configure(late));
        registry.ensure_initialized().unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![startup.clone()]);
        assert_eq!(registry.config(), startup);
    }

    #[test]
    fn test_factory_failure_is_toolkit_init() {
        let factory: Arc<dyn ToolkitFactory> =
            Arc::new(|_: &ToolkitConfig| -> McpResult<Arc<dyn Toolkit>> {
                Err(McpError::Config("timeout must be positive".into()))
            });
        let registry = ToolkitRegistry::new(factory, ToolkitConfig::default());

        let err = registry.ensure_initialized().err().unwrap();
        assert!(matches!(err, McpError::ToolkitInit(ref msg) if msg.contains("timeout")));
        assert!(err.is_fatal());
        assert!(!registry.is_initialized());
    }

    #[test]
    fn test_concurrent_first_use_builds_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(ToolkitRegistry::new(
            counting_factory(builds.clone(), Arc::default()),
            ToolkitConfig::default(),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || registry.ensure_initialized().map(|_| ()))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_configure_during_build_is_rejected() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let recorded = seen.clone();
        let started_tx = Mutex::new(started_tx);
        let release_rx = Mutex::new(release_rx);
        let factory: Arc<dyn ToolkitFactory> =
            Arc::new(move |config: &ToolkitConfig| -> McpResult<Arc<dyn Toolkit>> {
                recorded.lock().unwrap().push(config.clone());
                started_tx.lock().unwrap().send(()).unwrap();
                release_rx.lock().unwrap().recv().unwrap();
                Ok(Arc::new(StaticToolkit::default()))
            });
        let registry = Arc::new(ToolkitRegistry::new(factory, ToolkitConfig::default()));

        let builder = {
            let registry = registry.clone();
            thread::spawn(move || registry.ensure_initialized().map(|_| ()))
        };
        started_rx.recv().unwrap();

        let reconfigure = {
            let registry = registry.clone();
            thread::spawn(move || {
                registry.configure(ToolkitConfig {
                    timeout: 99.0,
                    ..ToolkitConfig::default()
                })
            })
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!reconfigure.is_finished());

        release_tx.send(()).unwrap();
        builder.join().unwrap().unwrap();

        assert!(!reconfigure.join().unwrap());
        assert_eq!(registry.config(), ToolkitConfig::default());
        assert_eq!(*seen.lock().unwrap(), vec![ToolkitConfig::default()]);
    }

    #[test]
    fn test_poisoned_config_lock_is_recovered() {
        let registry = Arc::new(ToolkitRegistry::new(
            counting_factory(Arc::default(), Arc::default()),
            ToolkitConfig::default(),
        ));

        let poisoner = registry.clone();
        let _ = thread::spawn(move || {
            let _guard = poisoner.config.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        let changed = ToolkitConfig {
            interactive: true,
            ..ToolkitConfig::default()
        };
        assert!(registry.configure(changed.clone()));
        assert_eq!(registry.config(), changed);
        registry.ensure_initialized().unwrap();
    }
}
