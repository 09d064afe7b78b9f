//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Inner width of the boot banner box.
const BANNER_WIDTH: usize = 38;

/// Boot banner, padded so the right border lines up for any version.
pub fn banner(version: &str) -> [String; 3] {
    let title = format!("  Floower v{}", version);
    [
        format!("╔{}╗", "═".repeat(BANNER_WIDTH)),
        format!("║{:<width$}║", title, width = BANNER_WIDTH),
        format!("╚{}╝", "═".repeat(BANNER_WIDTH)),
    ]
}

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => info!("START | initial_state={:?}", state),
            AppEvent::StateChanged { from, to } => info!("STATE | {:?} -> {:?}", from, to),
            AppEvent::RemoteTookOver => info!("REMOTE | peer took over"),
            AppEvent::SessionChanged(session) => info!("REMOTE | session={:?}", session),
            AppEvent::WriteApplied(characteristic) => {
                info!("REMOTE | write applied to {:?}", characteristic);
            }
            AppEvent::BatteryChanged(b) => info!(
                "BATTERY | level={}% charging={}",
                b.level,
                if b.charging { "yes" } else { "no" }
            ),
            AppEvent::ConfigSaved => info!("CONFIG | saved"),
        }
    }
}
