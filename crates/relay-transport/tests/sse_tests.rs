use relay_transport::{RetryConfig, SseClient, SseConfig, TransportEvent};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const STREAM_HEADER: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n";

// Minimal hand-rolled SSE endpoint: one connection, fixed event script
async fn spawn_sse_server(events_body: &'static [u8]) -> String {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();

	tokio::spawn(async move {
		let (mut stream, _) = listener.accept().await.unwrap();

		// Drain the request head
		let mut buf = vec![0u8; 2048];
		let mut head = Vec::new();
		loop {
			let n = stream.read(&mut buf).await.unwrap();
			head.extend_from_slice(&buf[..n]);
			if n == 0 || head.windows(4).any(|w| w == b"\r\n\r\n") {
				break;
			}
		}

		stream.write_all(STREAM_HEADER).await.unwrap();
		stream.write_all(events_body).await.unwrap();
		stream.flush().await.unwrap();

		// Hold the stream open briefly so the client reads everything
		tokio::time::sleep(Duration::from_millis(500)).await;
	});

	format!("http://{addr}/stream")
}

async fn next_event(events: &mut tokio::sync::mpsc::UnboundedReceiver<TransportEvent>) -> TransportEvent {
	tokio::time::timeout(Duration::from_secs(5), events.recv()).await.expect("timed out waiting for event").expect("event channel closed")
}

#[tokio::test]
async fn test_named_and_default_events_are_delivered() {
	let url = spawn_sse_server(b"event: github-event\ndata: {\"action\":\"push\"}\n\ndata: {\"timestamp\": 1}\n\n").await;

	let (client, mut events) = SseClient::connect(SseConfig::new(url));

	assert_eq!(next_event(&mut events).await, TransportEvent::Opened);

	match next_event(&mut events).await {
		TransportEvent::Message(inbound) => {
			assert_eq!(inbound.event.as_deref(), Some("github-event"));
			let value = inbound.payload.as_json().unwrap();
			assert_eq!(value.get("action").and_then(|v| v.as_str()), Some("push"));
		}
		other => panic!("unexpected event: {other:?}"),
	}

	match next_event(&mut events).await {
		TransportEvent::Message(inbound) => {
			// Default `message` events carry no label
			assert_eq!(inbound.event, None);
		}
		other => panic!("unexpected event: {other:?}"),
	}

	client.close();
}

#[tokio::test]
async fn test_unparseable_bodies_are_delivered_raw() {
	let url = spawn_sse_server(b"data: plain words, not json\n\n").await;

	let (client, mut events) = SseClient::connect(SseConfig::new(url));

	assert_eq!(next_event(&mut events).await, TransportEvent::Opened);
	match next_event(&mut events).await {
		TransportEvent::Message(inbound) => {
			assert!(inbound.payload.is_raw());
			assert_eq!(inbound.size, "plain words, not json".len());
		}
		other => panic!("unexpected event: {other:?}"),
	}

	client.close();
}

#[tokio::test]
async fn test_sse_ceiling_stops_retrying() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	drop(listener);

	let config = SseConfig::new(format!("http://{addr}/stream")).with_retry(RetryConfig {
		reconnect_interval: Duration::from_millis(10),
		max_reconnect_attempts: Some(1),
	});
	let (client, mut events) = SseClient::connect(config);

	let mut failures = 0;
	loop {
		match next_event(&mut events).await {
			TransportEvent::Errored(_) => failures += 1,
			TransportEvent::Closed => break,
			other => panic!("unexpected event: {other:?}"),
		}
	}
	assert_eq!(failures, 2);
	assert!(!client.is_connected());
}
