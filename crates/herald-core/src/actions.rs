//! Wake actions carried on notifications.

use herald_protocol::Notification;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::capabilities::Navigator;

/// Parse `$stateParams`.
///
/// Anything that is not a JSON object (including a parse failure or a
/// missing value) yields an empty parameter map.
#[must_use]
pub fn parse_state_params(raw: Option<&str>) -> Map<String, Value> {
    match raw.map(serde_json::from_str::<Value>) {
        Some(Ok(Value::Object(params))) => params,
        Some(Ok(_)) | Some(Err(_)) | None => Map::new(),
    }
}

/// Runs the navigation action a notification carries.
#[derive(Clone, Default)]
pub struct ActionRunner {
    navigator: Option<Arc<dyn Navigator>>,
}

impl ActionRunner {
    /// Create a runner. Without a navigator every action is dropped.
    #[must_use]
    pub fn new(navigator: Option<Arc<dyn Navigator>>) -> Self {
        Self { navigator }
    }

    /// Run the notification's action.
    ///
    /// Returns `true` if navigation was triggered.
    pub fn run(&self, notification: &Notification) -> bool {
        let Some(route) = notification.state.as_deref() else {
            trace!("Notification carries no action");
            return false;
        };
        let Some(navigator) = self.navigator.as_ref() else {
            debug!(route, "No router available, dropping action");
            return false;
        };

        let params = parse_state_params(notification.state_params.as_deref());
        debug!(route, "Navigating from notification");
        navigator.navigate_to(route, &params);
        true
    }
}
