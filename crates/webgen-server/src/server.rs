//! Serving an output directory over HTTP.

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("directory not found: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("server stopped: {0}")]
    Serve(#[source] io::Error),
}

/// Serves files under a root directory, nothing else.
#[derive(Debug, Clone)]
pub struct StaticServer {
    root: PathBuf,
}

impl StaticServer {
    /// Create a server for `root`, which must be an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ServerError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ServerError::MissingRoot(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Router serving the root directory for every path.
    pub fn router(&self) -> Router {
        Router::new().fallback_service(ServeDir::new(&self.root))
    }

    /// Bind `addr` and serve until the server fails.
    pub async fn serve(&self, addr: SocketAddr) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve_on(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_on(&self, listener: TcpListener) -> Result<(), ServerError> {
        match listener.local_addr() {
            Ok(addr) => tracing::info!("Serving {} at http://{}", self.root.display(), addr),
            Err(_) => tracing::info!("Serving {}", self.root.display()),
        }

        axum::serve(listener, self.router())
            .await
            .map_err(ServerError::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    async fn spawn(root: &Path) -> SocketAddr {
        let server = StaticServer::new(root).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { server.serve_on(listener).await });
        addr
    }

    #[test]
    fn missing_root_is_rejected() {
        let temp = tempdir().unwrap();
        let err = StaticServer::new(temp.path().join("public")).unwrap_err();
        assert!(matches!(err, ServerError::MissingRoot(_)));
    }

    #[tokio::test]
    async fn serves_files_from_root() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("blog")).unwrap();
        fs::write(temp.path().join("blog/post1.html"), "Hello 42").unwrap();

        let addr = spawn(temp.path()).await;
        let response = get(addr, "/blog/post1.html").await;

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("Hello 42"));
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found() {
        let temp = tempdir().unwrap();

        let addr = spawn(temp.path()).await;
        let response = get(addr, "/nope.html").await;

        assert!(response.starts_with("HTTP/1.1 404"));
    }

    #[tokio::test]
    async fn bind_conflict_is_an_error() {
        let temp = tempdir().unwrap();
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let err = StaticServer::new(temp.path())
            .unwrap()
            .serve(addr)
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::Bind { .. }));
    }
}
