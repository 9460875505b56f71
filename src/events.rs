// File: events.rs
// Location: /src/events.rs

use tokio::sync::mpsc;

use crate::config::WifiConfig;
use crate::controller::WifiDetailController;
use crate::entry::{
    ConnectCallback, ConnectStatus, ForgetCallback, ForgetStatus, NetworkCallback, SaveStatus,
    ShareConfig, SignInCallback, SignInStatus, WifiEntryCallback,
};
use crate::net::{LinkProperties, Network, NetworkCapabilities};
use crate::screen::DetailButton;

/// Everything that can happen to the detail screen. Collaborators post
/// these; the owner of the controller drains them on its own thread.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailEvent {
    EntryUpdated,
    ConnectResult(ConnectStatus),
    ForgetResult(ForgetStatus),
    SignInResult(SignInStatus),
    ShareResult(Option<ShareConfig>),
    SaveResult(SaveStatus),
    LinkPropertiesChanged(Network, LinkProperties),
    CapabilitiesChanged(Network, NetworkCapabilities),
    Lost(Network),
    ButtonClicked(DetailButton),
    ForgetConfirmed,
    LockScreenPassed,
    SubmitConfig(WifiConfig),
}

#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<DetailEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<DetailEvent>) -> Self {
        Self { tx }
    }

    pub fn post(&self, event: DetailEvent) {
        if let Err(err) = self.tx.send(event) {
            log::debug!("Event loop closed, dropping {:?}", err.0);
        }
    }
}

pub fn channel() -> (EventSink, mpsc::UnboundedReceiver<DetailEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink::new(tx), rx)
}

pub fn dispatch(event: DetailEvent, controller: &mut WifiDetailController) {
    log::debug!("Dispatching {:?}", event);
    match event {
        DetailEvent::EntryUpdated => controller.on_updated(),
        DetailEvent::ConnectResult(status) => controller.on_connect_result(status),
        DetailEvent::ForgetResult(status) => controller.on_forget_result(status),
        DetailEvent::SignInResult(status) => controller.on_sign_in_result(status),
        DetailEvent::ShareResult(config) => controller.on_share_result(config),
        DetailEvent::SaveResult(status) => controller.on_save_result(status),
        DetailEvent::LinkPropertiesChanged(network, lp) => {
            controller.on_link_properties_changed(network, lp)
        }
        DetailEvent::CapabilitiesChanged(network, nc) => {
            controller.on_capabilities_changed(network, nc)
        }
        DetailEvent::Lost(network) => controller.on_lost(network),
        DetailEvent::ButtonClicked(button) => controller.on_button_clicked(button),
        DetailEvent::ForgetConfirmed => controller.forget_confirmed(),
        DetailEvent::LockScreenPassed => controller.launch_share(),
        DetailEvent::SubmitConfig(config) => controller.on_submit(config),
    }
}

/// Dispatches everything already queued without waiting.
pub fn drain(
    rx: &mut mpsc::UnboundedReceiver<DetailEvent>,
    controller: &mut WifiDetailController,
) -> usize {
    let mut handled = 0;
    while let Ok(event) = rx.try_recv() {
        dispatch(event, controller);
        handled += 1;
    }
    handled
}
