//! Terminal implementations of the navigation and notification capabilities.

use tracing::info;
use vantage_core::notify::{Notifier, Severity};
use vantage_core::router::{Navigator, LOGIN_ROUTE};

/// There are no views in a terminal, so navigating just tells the user
/// where they would have landed.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, path: &str) {
        info!(path, "Navigate");
        if path == LOGIN_ROUTE {
            eprintln!("-> {} (run `vantage login` to sign in)", path);
        } else {
            eprintln!("-> {}", path);
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        eprintln!("[{}] {}", severity, message);
    }
}
