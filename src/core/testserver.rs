// ─── Test HTTP Server ───
// Minimal loopback HTTP/1.1 responder so network-facing tests never
// leave the machine. Compiled only for tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

struct Route {
    status: u16,
    body: Vec<u8>,
    hits: Arc<AtomicUsize>,
}

type RouteMap = Arc<Mutex<HashMap<String, Route>>>;

pub struct TestServer {
    addr: SocketAddr,
    routes: RouteMap,
    accept_task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: RouteMap = Arc::new(Mutex::new(HashMap::new()));

        let accept_routes = routes.clone();
        let accept_task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let routes = accept_routes.clone();
                tokio::spawn(handle_connection(stream, routes));
            }
        });

        TestServer {
            addr,
            routes,
            accept_task,
        }
    }

    pub fn add_route(&self, path: &str, status: u16, body: Vec<u8>) {
        self.routes.lock().unwrap().insert(
            path.to_string(),
            Route {
                status,
                body,
                hits: Arc::new(AtomicUsize::new(0)),
            },
        );
    }

    /// How many requests this route has served.
    pub fn hits(&self, path: &str) -> usize {
        self.routes
            .lock()
            .unwrap()
            .get(path)
            .map(|route| route.hits.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn handle_connection(mut stream: tokio::net::TcpStream, routes: RouteMap) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let Ok(read) = stream.read(&mut chunk).await else {
            return;
        };
        if read == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..read]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    let request = String::from_utf8_lossy(&buf);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let (status, body) = {
        let routes = routes.lock().unwrap();
        match routes.get(&path) {
            Some(route) => {
                route.hits.fetch_add(1, Ordering::SeqCst);
                (route.status, route.body.clone())
            }
            None => (404, Vec::new()),
        }
    };

    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let header = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );

    let _ = stream.write_all(header.as_bytes()).await;
    let _ = stream.write_all(&body).await;
    let _ = stream.flush().await;
    let _ = stream.shutdown().await;
}
