use crate::util::errors::ApiError;
use log::{info, warn};
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};
use tokio::sync::{oneshot, watch};
use warp::Filter;

// One-shot loopback listener for the OAuth redirect. Resolves with the
// authorization code once Google redirects back, then shuts down.
pub async fn start_callback_server(port: u16, expected_state: String) -> Result<String, ApiError> {
    // Channel for notifying when we've received the callback
    let (tx, rx) = oneshot::channel();
    let tx = Arc::new(Mutex::new(Some(tx)));

    // Watch channel for graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(());

    // Route that handles the callback
    let route = warp::get()
        .and(warp::path::end())
        .and(warp::query::<std::collections::HashMap<String, String>>())
        .map(move |query: std::collections::HashMap<String, String>| {
            // The state must round-trip unchanged before the code is accepted
            if query.get("state").map(|s| s.as_str()) != Some(expected_state.as_str()) {
                warn!("Callback received with missing or mismatched state.");
                return "State mismatch, authorization rejected.".to_string();
            }

            match query.get("code") {
                Some(code) => {
                    // Send the code back to the main task and close the server
                    if let Some(tx) = tx.lock().unwrap().take() {
                        let _ = tx.send(code.clone());
                    }
                    "Authorization received. You may close this tab.".to_string()
                }
                None => "No authorization code found.".to_string(),
            }
        });

    // Create a socket address for the server
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    // Start the server with graceful shutdown
    let (addr, server) = warp::serve(route).bind_with_graceful_shutdown(addr, async move {
        // Shutdown when a signal is sent on `shutdown_rx`
        let mut shutdown_rx = shutdown_rx.clone();
        shutdown_rx.changed().await.ok();
    });

    info!("Callback server running at http://{}/", addr);
    tokio::spawn(server);

    // Wait until we receive the code
    match rx.await {
        Ok(code) => {
            // Signal shutdown to the server
            let _ = shutdown_tx.send(());
            Ok(code)
        }
        Err(_) => Err(ApiError::CallbackError),
    }
}
