//! [`EventDispatchHook`] – the node's one persistent device event handler.
//!
//! Registered once with the platform event loop before the loop starts. The
//! only event it acts on is [`DeviceEventType::DnssdInitialized`]: once the
//! node can advertise services, the OTA requestor is initialized (when this
//! build includes it). Every other event is ignored.
//!
//! The hook keeps no state of its own. It calls
//! [`OtaRequestor::initialize`] on every DNS-SD event it sees; the event is
//! raised once per boot and repeat calls are for the requestor to absorb.

use std::sync::Arc;

use nodeup_hal::OtaRequestor;
use nodeup_middleware::EventHandlerFn;
use nodeup_types::{DeviceEvent, DeviceEventType};
use tracing::{debug, info};

use crate::features::BuildConfig;

#[derive(Clone)]
pub struct EventDispatchHook {
    ota: Option<Arc<dyn OtaRequestor>>,
}

impl EventDispatchHook {
    /// Build the hook. `ota` is only retained when the build enables the OTA
    /// requestor.
    pub fn new(config: &BuildConfig, ota: Arc<dyn OtaRequestor>) -> Self {
        Self {
            ota: config.ota_requestor.then_some(ota),
        }
    }

    /// React to one dispatched event. Never blocks.
    pub fn handle(&self, event: &DeviceEvent, _arg: usize) {
        match event.kind {
            DeviceEventType::DnssdInitialized => {
                if let Some(ota) = &self.ota {
                    info!("DNS-SD ready, initializing OTA requestor");
                    ota.initialize();
                }
            }
            other => debug!(kind = ?other, "device event ignored"),
        }
    }

    /// Wrap the hook as a handler for [`PlatformManager::add_event_handler`][nodeup_middleware::PlatformManager::add_event_handler].
    pub fn into_handler(self) -> EventHandlerFn {
        Arc::new(move |event: &DeviceEvent, arg: usize| self.handle(event, arg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeup_hal::sim::SimHardware;
    use nodeup_types::DeviceRole;

    fn event(kind: DeviceEventType) -> DeviceEvent {
        DeviceEvent::new("test", kind)
    }

    #[test]
    fn dnssd_ready_initializes_ota_once() {
        let hw = SimHardware::default();
        let hook = EventDispatchHook::new(&BuildConfig::full(DeviceRole::Router), hw.ota_requestor());

        hook.handle(&event(DeviceEventType::DnssdInitialized), 0);
        assert_eq!(hw.log().count("ota.initialize"), 1);
    }

    #[test]
    fn dnssd_ready_is_ignored_without_ota_feature() {
        let hw = SimHardware::default();
        let mut config = BuildConfig::full(DeviceRole::Router);
        config.ota_requestor = false;
        let hook = EventDispatchHook::new(&config, hw.ota_requestor());

        hook.handle(&event(DeviceEventType::DnssdInitialized), 0);
        assert!(hw.log().entries().is_empty());
    }

    #[test]
    fn other_events_have_no_side_effect() {
        let hw = SimHardware::default();
        let hook = EventDispatchHook::new(&BuildConfig::full(DeviceRole::Router), hw.ota_requestor());

        for kind in [
            DeviceEventType::ThreadStateChange,
            DeviceEventType::ThreadConnectivityChange,
            DeviceEventType::CommissioningComplete,
            DeviceEventType::ServerReady,
            DeviceEventType::Other(0x8001),
        ] {
            hook.handle(&event(kind), 42);
        }
        assert!(hw.log().entries().is_empty());
    }

    #[test]
    fn repeated_dnssd_events_are_forwarded_each_time() {
        let hw = SimHardware::default();
        let handler = EventDispatchHook::new(&BuildConfig::full(DeviceRole::Router), hw.ota_requestor())
            .into_handler();

        handler(&event(DeviceEventType::DnssdInitialized), 0);
        handler(&event(DeviceEventType::DnssdInitialized), 0);
        assert_eq!(hw.log().count("ota.initialize"), 2);
    }
}
