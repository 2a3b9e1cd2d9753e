use mumbo::MockServer;
use reqwest::blocking::{Body, Client};
use std::io::Cursor;

#[test]
fn large_body_test() {
    // Arrange
    let mut server = MockServer::new();
    server.start(None).unwrap();
    let body = "wow so large".repeat(1024 * 1024); // 12 MB body

    // Act: Send the HTTP request
    let response = Client::new()
        .post(server.url("/search").unwrap())
        .body(body.clone())
        .send()
        .unwrap();

    // Assert
    assert_eq!(response.status(), 200);
    assert_eq!(server.requests()[0].body().len(), body.len());
    assert_eq!(server.requests()[0].body(), body);
}

#[test]
fn chunked_body_test() {
    // Arrange
    let mut server = MockServer::new();
    server.start(None).unwrap();
    let body: String = (0..50_000).map(|i| format!("{},", i)).collect();

    // Act: A body from a reader has no known length and is sent with chunked encoding.
    let response = Client::new()
        .post(server.url("/upload").unwrap())
        .body(Body::new(Cursor::new(body.clone().into_bytes())))
        .send()
        .unwrap();

    // Assert
    assert_eq!(response.status(), 200);
    assert_eq!(server.requests()[0].body(), body);
}
