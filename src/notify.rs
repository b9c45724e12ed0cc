/// Toast/badge sink, injected into the store and the view layer so tests can
/// observe what the user would have seen.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

pub trait Notifier: Send + Sync {
    fn toast(&self, level: ToastLevel, title: &str, message: &str);
    fn update_badge(&self, count: usize);
}

/// Logs toasts and badge updates through `tracing`.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn toast(&self, level: ToastLevel, title: &str, message: &str) {
        match level {
            ToastLevel::Warning | ToastLevel::Error => {
                tracing::warn!(?level, title, message, "toast")
            }
            _ => tracing::info!(?level, title, message, "toast"),
        }
    }

    fn update_badge(&self, count: usize) {
        tracing::debug!(count, "badge updated");
    }
}
