use std::net::SocketAddr;
use float_eq::assert_float_eq;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use cvxball::*;
use cvxball::config::ServerConfig;
use cvxball::protocol::{Request, Response};
use cvxball::server::Server;
use cvxball::service::{KEY_INPUT, KEY_MIDPOINT, KEY_POINTS, KEY_RADIUS};

//

struct Client
{
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client
{
    async fn connect(addr: SocketAddr) -> Self
    {
        let (reader, writer) = TcpStream::connect(addr).await.unwrap().into_split();

        Client {
            reader: BufReader::new(reader),
            writer,
        }
    }

    async fn send_line(&mut self, line: &str) -> Response
    {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();

        let mut resp = String::new();
        self.reader.read_line(&mut resp).await.unwrap();
        serde_json::from_str(&resp).unwrap()
    }

    async fn send(&mut self, req: &Request) -> Response
    {
        self.send_line(&serde_json::to_string(req).unwrap()).await
    }
}

async fn start(config: ServerConfig) -> SocketAddr
{
    let server = Server::bind_default(config).await.unwrap();
    let addr = server.local_addr().unwrap();

    tokio::spawn(server.run());

    addr
}

fn test_config() -> ServerConfig
{
    ServerConfig {
        port: 0,
        ..ServerConfig::default()
    }
}

fn input(data: Vec<f64>, shape: Vec<usize>) -> Matrices
{
    let mut m = Matrices::new();
    m.insert(KEY_INPUT.into(), Matrix {data, shape});
    m
}

fn error_kind(resp: &Response) -> Option<ErrorKind>
{
    match resp {
        Response::Error {error_kind, ..} => Some(*error_kind),
        _ => None,
    }
}

//

#[tokio::test]
async fn test_ping_compute()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let addr = start(test_config()).await;
    let mut client = Client::connect(addr).await;

    assert_eq!(client.send(&Request::Ping).await, Response::Pong);

    let req = Request::Compute {
        matrices: input(vec![2., 4., 0., 0., 2.5, 2.], vec![3, 2]),
        echo: false,
    };
    match client.send(&req).await {
        Response::Ok {matrices} => {
            assert_eq!(matrices[KEY_RADIUS].shape, Vec::<usize>::new());
            assert_float_eq!(matrices[KEY_RADIUS].data[0], 5_f64.sqrt(), abs <= 1e-4);
            assert_float_eq!(matrices[KEY_MIDPOINT].data, vec![1., 2.], abs_all <= 1e-4);
            assert!(!matrices.contains_key(KEY_POINTS));
        },
        resp => panic!("unexpected response {:?}", resp),
    }
}

#[tokio::test]
async fn test_put_get()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let addr = start(test_config()).await;
    let mut uploader = Client::connect(addr).await;
    let mut fetcher = Client::connect(addr).await;

    let req = Request::Put {
        command: "BallServer".into(),
        matrices: input(vec![0., 0., 0., 2., 2., 0.], vec![3, 2]),
    };
    assert_eq!(uploader.send(&req).await, Response::Stored {command: "BallServer".into()});

    let req = Request::Get {command: "BallServer".into(), echo: true};
    match fetcher.send(&req).await {
        Response::Ok {matrices} => {
            assert_float_eq!(matrices[KEY_RADIUS].data[0], 2_f64.sqrt(), abs <= 1e-4);
            assert_float_eq!(matrices[KEY_MIDPOINT].data, vec![1., 1.], abs_all <= 1e-4);
            assert_eq!(matrices[KEY_POINTS].data, vec![0., 0., 0., 2., 2., 0.]);
        },
        resp => panic!("unexpected response {:?}", resp),
    }

    let resp = fetcher.send(&req).await;
    assert_eq!(error_kind(&resp), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_errors_keep_connection()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let addr = start(ServerConfig {
        max_line_bytes: 1024,
        ..test_config()
    }).await;
    let mut client = Client::connect(addr).await;

    let resp = client.send_line("not json").await;
    assert_eq!(error_kind(&resp), Some(ErrorKind::MalformedRequest));

    let resp = client.send_line(r#"{"op":"compute","matrices":{"input":{"data":[1.0,2.0,3.0],"shape":[2,2]}}}"#).await;
    assert_eq!(error_kind(&resp), Some(ErrorKind::MalformedRequest));

    let resp = client.send_line(r#"{"op":"compute","matrices":{"input":{"data":[],"shape":[0,2]}}}"#).await;
    assert_eq!(error_kind(&resp), Some(ErrorKind::InvalidInput));

    let long = format!(r#"{{"op":"ping","pad":"{}"}}"#, "x".repeat(2048));
    let resp = client.send_line(&long).await;
    assert_eq!(error_kind(&resp), Some(ErrorKind::MalformedRequest));

    assert_eq!(client.send(&Request::Ping).await, Response::Pong);
}

#[tokio::test]
async fn test_stale_sweep()
{
    let addr = start(ServerConfig {
        stale_after_secs: 0,
        sweep_period_secs: 1,
        ..test_config()
    }).await;
    let mut client = Client::connect(addr).await;

    let req = Request::Put {
        command: "Stale".into(),
        matrices: input(vec![1., 1.], vec![1, 2]),
    };
    assert_eq!(client.send(&req).await, Response::Stored {command: "Stale".into()});

    tokio::time::sleep(std::time::Duration::from_millis(2500)).await;

    let resp = client.send(&Request::Get {command: "Stale".into(), echo: false}).await;
    assert_eq!(error_kind(&resp), Some(ErrorKind::NotFound));
}
