use axum::Router;

/// Serve the router from `build` on an ephemeral local port and return its base URL
pub(crate) async fn serve_stub<F>(build: F) -> String
where
    F: FnOnce(String) -> Router,
{
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let app = build(base.clone());
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    base
}
