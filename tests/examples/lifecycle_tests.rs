use crate::{free_port, init_logging};
use mumbo::{Error, MockServer, ServerError};
use std::{
    io::{Read, Write},
    net::{TcpListener, TcpStream},
    thread,
    time::{Duration, Instant},
};

#[test]
fn start_with_specified_port_test() {
    // Arrange
    init_logging();
    let port = free_port();
    let mut server = MockServer::new();

    // Act
    let result = server.start(Some(port)).unwrap();
    let response = reqwest::blocking::get(format!("http://127.0.0.1:{}", port)).unwrap();

    // Assert
    assert_eq!(result.port, port);
    assert_eq!(server.port(), Some(port));
    assert_eq!(response.status(), 200);

    server.stop().unwrap();
}

#[test]
fn start_without_specified_port_test() {
    // Arrange
    let mut server = MockServer::new();

    // Act
    let result = server.start(None).unwrap();
    let response = reqwest::blocking::get(format!("http://localhost:{}/", result.port)).unwrap();

    // Assert
    assert!(result.port > 0);
    assert_eq!(response.status(), 200);

    server.stop().unwrap();
}

#[test]
fn start_with_builder_port_test() {
    // Arrange
    let port = free_port();
    let mut server = MockServer::builder().port(port).build();

    // Act
    let result = server.start(None).unwrap();

    // Assert
    assert_eq!(result.port, port);
    assert_eq!(server.base_url(), Some(format!("http://127.0.0.1:{}", port)));
}

#[test]
fn stopped_server_refuses_connections_test() {
    // Arrange
    let mut server = MockServer::new();
    let result = server.start(None).unwrap();

    // Act
    server.stop().unwrap();
    let response = reqwest::blocking::get(format!("http://127.0.0.1:{}/", result.port));

    // Assert
    assert!(response.is_err());
    assert!(!server.is_running());
    assert_eq!(server.port(), Some(result.port));
}

#[test]
fn stop_closes_idle_keep_alive_connections_test() {
    // Arrange
    let mut server = MockServer::new();
    let url = {
        server.start(None).unwrap();
        server.url("/").unwrap()
    };
    let client = reqwest::blocking::Client::new();
    assert_eq!(client.get(&url).send().unwrap().status(), 200);

    // Act
    server.stop().unwrap();

    // Assert: the pooled connection was closed, so this needs a new one and fails.
    assert!(client.get(&url).send().is_err());
}

#[test]
fn port_in_use_test() {
    // Arrange
    let blocker = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = blocker.local_addr().unwrap().port();
    let mut server = MockServer::new();

    // Act
    let result = server.start(Some(port));

    // Assert
    assert!(matches!(
        result,
        Err(Error::Server(ServerError::SocketBindError(addr, _))) if addr.port() == port
    ));
    assert!(!server.is_running());
}

#[test]
fn start_twice_test() {
    // Arrange
    let mut server = MockServer::new();
    server.start(None).unwrap();

    // Act
    let result = server.start(None);

    // Assert
    assert!(matches!(result, Err(Error::AlreadyRunning(_))));
    assert!(server.is_running());
}

#[test]
fn stop_without_start_test() {
    let mut server = MockServer::new();
    assert!(matches!(server.stop(), Err(Error::NotRunning)));
}

#[test]
fn restart_keeps_requests_and_routes_test() {
    // Arrange
    let port = free_port();
    let mut server = MockServer::new();
    server.configure_response("GET", "/kept", || mumbo::MockedResponse::new(202));
    server.start(Some(port)).unwrap();
    reqwest::blocking::get(server.url("/kept").unwrap()).unwrap();

    // Act
    server.stop().unwrap();
    server.start(Some(port)).unwrap();
    let response = reqwest::blocking::get(server.url("/kept").unwrap()).unwrap();

    // Assert
    assert_eq!(response.status(), 202);
    assert_eq!(server.requests().len(), 2);
}

#[test]
fn drop_stops_server_test() {
    // Arrange
    let mut server = MockServer::new();
    let port = server.start(None).unwrap().port;

    // Act
    drop(server);

    // Assert
    assert!(reqwest::blocking::get(format!("http://127.0.0.1:{}/", port)).is_err());
}

#[test]
fn stop_waits_for_in_flight_request_test() {
    // Arrange
    init_logging();
    let mut server = MockServer::new();
    let port = server.start(None).unwrap().port;

    let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    stream
        .write_all(
            b"POST /upload HTTP/1.1\r\nHost: localhost\r\nContent-Length: 10\r\nConnection: close\r\n\r\nhello",
        )
        .unwrap();
    thread::sleep(Duration::from_millis(200));

    // Act
    let stopping = thread::spawn(move || {
        let result = server.stop();
        (server, result)
    });
    thread::sleep(Duration::from_millis(200));
    assert!(!stopping.is_finished());

    stream.write_all(b"world").unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();

    let (server, result) = stopping.join().unwrap();

    // Assert
    assert!(result.is_ok());
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path(), "/upload");
    assert_eq!(requests[0].body(), "helloworld");
}

#[test]
fn stop_disconnects_client_with_unfinished_request_line_test() {
    // Arrange
    let mut server = MockServer::new();
    let port = server.start(None).unwrap().port;

    let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    stream.write_all(b"GET /slo").unwrap();
    thread::sleep(Duration::from_millis(200));

    // Act
    let started = Instant::now();
    let result = server.stop();

    // Assert
    assert!(result.is_ok());
    assert!(started.elapsed() < Duration::from_secs(20));
    assert!(server.requests().is_empty());
}
