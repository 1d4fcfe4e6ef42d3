//! Well-known locations for roadmapper state.
//!
//! `ROADMAPPER_HOME` overrides the state root; otherwise it is `.roadmapper`
//! in the current directory. Tests override the root per thread to avoid
//! process-global env races.

use camino::Utf8PathBuf;
use std::cell::RefCell;

/// Environment variable overriding the state root
pub const HOME_ENV_VAR: &str = "ROADMAPPER_HOME";

/// Directory name used for the state root and config discovery
pub const STATE_DIR_NAME: &str = ".roadmapper";

thread_local! {
    static THREAD_HOME: RefCell<Option<Utf8PathBuf>> = const { RefCell::new(None) };
}

/// Root directory holding the config file and the default store.
pub fn roadmapper_home() -> Utf8PathBuf {
    if let Some(path) = THREAD_HOME.with(|home| home.borrow().clone()) {
        return path;
    }
    if let Ok(path) = std::env::var(HOME_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Utf8PathBuf::from(path);
    }
    Utf8PathBuf::from(STATE_DIR_NAME)
}

/// Default directory for stored roadmap documents.
pub fn default_store_dir() -> Utf8PathBuf {
    roadmapper_home().join("roadmaps")
}

/// Override the home directory for the current thread (tests only).
pub fn set_thread_home_for_tests(path: Utf8PathBuf) {
    THREAD_HOME.with(|home| *home.borrow_mut() = Some(path));
}

/// Create an isolated home directory for the current thread.
///
/// The returned `TempDir` must be kept alive for the duration of the test.
pub fn with_isolated_home() -> tempfile::TempDir {
    let dir = tempfile::TempDir::new().expect("failed to create temp home");
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .expect("temp dir path is not UTF-8");
    set_thread_home_for_tests(path);
    dir
}
