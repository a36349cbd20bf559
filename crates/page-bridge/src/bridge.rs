use crate::event::PageEvent;
use crate::filters::{is_code_capture, is_relevant_mutation, is_relevant_resource};
use relay_hub::{ErrorReport, HubHandle};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Forward the development-relevant subset of page events to the hub.
///
/// Mutations and resource loads go upstream as plain data, captured code goes
/// through the analysis prompt path, and page errors enter the hub's error
/// intake (duplicate suppression happens there, not here).
pub fn spawn_bridge(hub: HubHandle, mut events: mpsc::UnboundedReceiver<PageEvent>, shutdown: CancellationToken) -> JoinHandle<()> {
	tokio::spawn(async move {
		info!("page bridge started");
		loop {
			tokio::select! {
				event = events.recv() => match event {
					Some(event) => forward(&hub, event).await,
					None => break,
				},
				_ = shutdown.cancelled() => break,
			}
		}
		info!("page bridge stopped");
	})
}

async fn forward(hub: &HubHandle, event: PageEvent) {
	match event {
		PageEvent::Mutation(mutation) => {
			if !is_relevant_mutation(&mutation) {
				return;
			}
			let outcome = hub.send_to_server(json!({ "kind": "dom-mutation", "mutation": mutation })).await;
			if !outcome.success {
				warn!("mutation forward failed: {:?}", outcome.error);
			}
		}
		PageEvent::Resource(resource) => {
			if !is_relevant_resource(&resource) {
				return;
			}
			let outcome = hub.send_to_server(json!({ "kind": "resource-load", "resource": resource })).await;
			if !outcome.success {
				warn!("resource forward failed: {:?}", outcome.error);
			}
		}
		PageEvent::Text(capture) => {
			if !is_code_capture(&capture) {
				debug!("text capture below the code threshold, dropped");
				return;
			}
			let outcome = hub.ai_prompt(json!({ "kind": "code-capture", "capture": capture })).await;
			if !outcome.success {
				warn!("code capture forward failed: {:?}", outcome.error);
			}
		}
		PageEvent::Error(error) => {
			let detail = error.detail();
			hub.report_error(ErrorReport::new(error.message, detail));
		}
	}
}
