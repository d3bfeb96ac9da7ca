//! Session callbacks for the command-line converter.

use ccweb_core::SessionObserver;
use ccweb_types::PermissionDenial;
use tracing::{info, warn};

/// Logs session events and shows the first `init` message only.
#[derive(Debug, Default)]
pub struct CliObserver {
    show_init_messages: bool,
    init_shown: bool,
    session_id: Option<String>,
    denials: Vec<PermissionDenial>,
}

impl CliObserver {
    pub fn new(show_init_messages: bool) -> Self {
        Self {
            show_init_messages,
            ..Self::default()
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn denials(&self) -> &[PermissionDenial] {
        &self.denials
    }
}

impl SessionObserver for CliObserver {
    fn on_session_id(&mut self, session_id: &str) {
        info!(target: "ccweb::session", "Session started: {}", session_id);
        self.session_id = Some(session_id.to_string());
    }

    fn should_show_init_message(&self) -> bool {
        self.show_init_messages && !self.init_shown
    }

    fn on_init_message_shown(&mut self) {
        self.init_shown = true;
    }

    fn on_permission_error(&mut self, denial: &PermissionDenial) {
        warn!(
            target: "ccweb::session",
            "Permission denied for {} ({}); allow with: {}",
            denial.tool_name,
            denial.tool_use_id,
            denial.patterns.join(", ")
        );
        self.denials.push(denial.clone());
    }

    fn on_abort_request(&mut self) {
        info!(target: "ccweb::session", "Aborting the in-flight request");
    }
}
