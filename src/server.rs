//! TCP server
//!
//! Requests and responses are newline-delimited JSON, see [`crate::protocol`].
//! Each connection runs on its own task; each request runs on the blocking thread pool.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use crate::ServiceError;
use crate::config::ServerConfig;
use crate::protocol::{Request, Response};
use crate::service::{BallHandler, ComputeService, MatrixHandler, StagingStore};

static CONNECTION_COUNTER: AtomicU64 = AtomicU64::new(0);

//

/// Reads a line of at most `max_bytes` bytes into `buf`, newline included.
///
/// Returns the number of bytes read, `0` at EOF.
/// A longer line is consumed up to its newline and reported as [`std::io::ErrorKind::InvalidData`],
/// so the next call starts at the next line.
pub async fn read_line_bounded<R: AsyncBufRead + Unpin>(reader: &mut R, buf: &mut String, max_bytes: usize) -> std::io::Result<usize>
{
    let mut raw = Vec::new();
    let mut total = 0;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            break;
        }

        let (end, found_newline) = match available.iter().position(|&b| b == b'\n') {
            Some(pos) => (pos + 1, true),
            None => (available.len(), false),
        };

        if total + end > max_bytes {
            reader.consume(end);
            if !found_newline {
                skip_line(reader).await?;
            }
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("line exceeds {} bytes", max_bytes)
            ));
        }

        raw.extend_from_slice(&available[.. end]);
        total += end;
        reader.consume(end);

        if found_newline {
            break;
        }
    }

    match String::from_utf8(raw) {
        Ok(s) => buf.push_str(&s),
        Err(e) => buf.push_str(&String::from_utf8_lossy(e.as_bytes())),
    }

    Ok(total)
}

async fn skip_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<()>
{
    loop {
        let rest = reader.fill_buf().await?;
        if rest.is_empty() {
            return Ok(());
        }

        match rest.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(());
            },
            None => {
                let len = rest.len();
                reader.consume(len);
            },
        }
    }
}

async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &Response) -> Result<()>
{
    let json = serde_json::to_string(response)?;

    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

//

/// Runs one request of `service` on the blocking thread pool.
///
/// Returns the service response,
/// [`ServiceError::SolveTimeout`] if `solve_timeout` elapses first,
/// or [`ServiceError::SolveFailure`] if the task panics.
/// Each request holds a permit of `solves` until its blocking task ends,
/// so a timed out request keeps its permit while it runs to its end.
pub async fn dispatch<H>(service: &Arc<ComputeService<H>>, solves: &Arc<Semaphore>, request: Request, solve_timeout: Option<Duration>) -> Response
where H: MatrixHandler + 'static
{
    if request == Request::Ping {
        return Response::Pong;
    }

    let run = run_blocking(Arc::clone(service), Arc::clone(solves), request);

    match solve_timeout {
        Some(limit) => match tokio::time::timeout(limit, run).await {
            Ok(resp) => resp,
            Err(_) => {
                log::warn!("request timed out after {:?}", limit);
                Response::from(ServiceError::SolveTimeout(limit))
            },
        },
        None => run.await,
    }
}

async fn run_blocking<H>(service: Arc<ComputeService<H>>, solves: Arc<Semaphore>, request: Request) -> Response
where H: MatrixHandler + 'static
{
    let permit = match solves.acquire_owned().await {
        Ok(p) => p,
        Err(_) => {
            return Response::from(ServiceError::SolveFailure("solve limit closed".into()));
        },
    };

    let task = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        service.handle(request)
    });

    task.await.unwrap_or_else(|e| {
        log::error!("request task failed: {}", e);
        Response::from(ServiceError::SolveFailure(format!("request task failed: {}", e)))
    })
}

//

/// Compute server
///
/// Owns the listener, the [`ComputeService`] and the connection limit.
pub struct Server<H: MatrixHandler = BallHandler>
{
    listener: TcpListener,
    service: Arc<ComputeService<H>>,
    config: ServerConfig,
    connection_semaphore: Arc<Semaphore>,
    solve_semaphore: Arc<Semaphore>,
}

impl Server
{
    /// Binds a server computing balls with default options.
    pub async fn bind_default(config: ServerConfig) -> Result<Self>
    {
        let service = ComputeService::new(BallHandler::default(), Arc::new(StagingStore::new()));

        Server::bind(config, service).await
    }
}

impl<H: MatrixHandler + 'static> Server<H>
{
    /// Binds the listener to `config.host:config.port`.
    ///
    /// Returns `Err` if the address does not resolve or is not available.
    pub async fn bind(config: ServerConfig, service: ComputeService<H>) -> Result<Self>
    {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr).await
                       .with_context(|| format!("failed to bind {}", addr))?;

        Ok(Server {
            listener,
            service: Arc::new(service),
            connection_semaphore: Arc::new(Semaphore::new(config.max_connections.max(1))),
            solve_semaphore: Arc::new(Semaphore::new(config.max_solves.max(1))),
            config,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr>
    {
        Ok(self.listener.local_addr()?)
    }

    pub fn service(&self) -> &Arc<ComputeService<H>>
    {
        &self.service
    }

    /// Accepts connections until the task is dropped.
    ///
    /// Also runs the sweep of stale staged uploads.
    pub async fn run(self) -> Result<()>
    {
        log::info!(
            "listening on {} (max_connections={}, max_solves={})",
            self.local_addr()?, self.config.max_connections, self.config.max_solves
        );

        let _sweeper = Sweeper(tokio::spawn(sweep_stale(
            Arc::clone(self.service.staging()),
            self.config.stale_after(),
            self.config.sweep_period(),
        )));

        loop {
            let (stream, peer_addr) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    log::error!("failed to accept connection: {}", e);
                    continue;
                },
            };

            let service = Arc::clone(&self.service);
            let semaphore = Arc::clone(&self.connection_semaphore);
            let solves = Arc::clone(&self.solve_semaphore);
            let config = self.config.clone();
            let conn_tag = format!("C{:03}", CONNECTION_COUNTER.fetch_add(1, Ordering::Relaxed));

            tokio::spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(p) => p,
                    Err(_) => {
                        log::error!("[{}] connection limit closed for {}", conn_tag, peer_addr);
                        return;
                    },
                };

                log::info!("[{}] client connected: {}", conn_tag, peer_addr);

                if let Err(e) = handle_client(stream, service, solves, &config, &conn_tag).await {
                    log::warn!("[{}] client {} error: {}", conn_tag, peer_addr, e);
                }

                log::info!("[{}] client disconnected: {}", conn_tag, peer_addr);
            });
        }
    }
}

struct Sweeper(tokio::task::JoinHandle<()>);

impl Drop for Sweeper
{
    fn drop(&mut self)
    {
        self.0.abort();
    }
}

async fn sweep_stale(staging: Arc<StagingStore>, stale_after: Duration, period: Duration)
{
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;

        let purged = staging.purge_older_than(stale_after);
        if purged > 0 {
            log::info!("purged {} stale staged commands", purged);
        }
    }
}

async fn handle_client<H>(stream: TcpStream, service: Arc<ComputeService<H>>, solves: Arc<Semaphore>, config: &ServerConfig, conn_tag: &str) -> Result<()>
where H: MatrixHandler + 'static
{
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();

        let bytes_read = match read_line_bounded(&mut reader, &mut line, config.max_line_bytes).await {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                log::warn!("[{}] {}", conn_tag, e);
                let resp = Response::from(ServiceError::MalformedRequest(e.to_string()));
                write_response(&mut writer, &resp).await?;
                continue;
            },
            Err(e) => return Err(e.into()),
        };

        if bytes_read == 0 {
            log::debug!("[{}] EOF", conn_tag);
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<Request>(trimmed) {
            Ok(req) => {
                log::debug!("[{}] {}", conn_tag, request_name(&req));
                dispatch(&service, &solves, req, config.solve_timeout()).await
            },
            Err(e) => {
                log::warn!("[{}] unparsable request: {}", conn_tag, e);
                Response::from(ServiceError::MalformedRequest(e.to_string()))
            },
        };

        write_response(&mut writer, &resp).await?;
    }

    Ok(())
}

fn request_name(req: &Request) -> String
{
    match req {
        Request::Put {command, ..} => format!("put {}", command),
        Request::Get {command, ..} => format!("get {}", command),
        Request::Compute {..} => "compute".into(),
        Request::Ping => "ping".into(),
    }
}

//

#[tokio::test]
async fn test_read_line_bounded()
{
    let input: &[u8] = b"{\"op\":\"ping\"}\n0123456789abcdef\nlast";
    let mut reader = BufReader::new(input);
    let mut line = String::new();

    let n = read_line_bounded(&mut reader, &mut line, 15).await.unwrap();
    assert_eq!(n, 14);
    assert_eq!(line, "{\"op\":\"ping\"}\n");

    line.clear();
    let e = read_line_bounded(&mut reader, &mut line, 15).await.unwrap_err();
    assert_eq!(e.kind(), std::io::ErrorKind::InvalidData);

    line.clear();
    let n = read_line_bounded(&mut reader, &mut line, 15).await.unwrap();
    assert_eq!(n, 4);
    assert_eq!(line, "last");

    line.clear();
    assert_eq!(read_line_bounded(&mut reader, &mut line, 15).await.unwrap(), 0);
}

#[cfg(test)]
struct SlowHandler;

#[cfg(test)]
impl MatrixHandler for SlowHandler
{
    fn handle(&self, _: &crate::Matrices) -> std::result::Result<crate::Matrices, ServiceError>
    {
        std::thread::sleep(Duration::from_millis(500));
        Ok(crate::Matrices::new())
    }
}

#[tokio::test]
async fn test_dispatch_timeout()
{
    use crate::{Matrix, ErrorKind};

    let service = Arc::new(ComputeService::new(SlowHandler, Arc::new(StagingStore::new())));
    let solves = Arc::new(Semaphore::new(1));

    let compute = || {
        let mut matrices = crate::Matrices::new();
        matrices.insert("input".into(), Matrix {data: vec![0., 1.], shape: vec![1, 2]});
        Request::Compute {matrices, echo: false}
    };
    let timed_out = |resp: &Response| {
        matches!(resp, Response::Error {error_kind: ErrorKind::SolveTimeout, ..})
    };

    let resp = dispatch(&service, &solves, compute(), Some(Duration::from_millis(20))).await;
    assert!(timed_out(&resp), "unexpected response {:?}", resp);

    // the abandoned solve still holds the only permit
    assert_eq!(solves.available_permits(), 0);
    let resp = dispatch(&service, &solves, compute(), Some(Duration::from_millis(20))).await;
    assert!(timed_out(&resp), "unexpected response {:?}", resp);

    assert_eq!(dispatch(&service, &solves, Request::Ping, Some(Duration::from_millis(20))).await, Response::Pong);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(solves.available_permits(), 1);

    let resp = dispatch(&service, &solves, compute(), None).await;
    assert_eq!(resp, Response::Ok {matrices: crate::Matrices::new()});
    assert_eq!(solves.available_permits(), 1);
}
