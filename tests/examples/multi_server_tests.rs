use mumbo::{MockServer, MockedResponse};

#[test]
fn servers_are_independent_test() {
    // Arrange
    let mut server1 = MockServer::new();
    let mut server2 = MockServer::new();
    server1.start(None).unwrap();
    server2.start(None).unwrap();

    server1.configure_response("GET", "/status", || MockedResponse::new(201));
    server2.configure_response("GET", "/status", || MockedResponse::new(202));

    // Act
    let response1 = reqwest::blocking::get(server1.url("/status").unwrap()).unwrap();
    let response2 = reqwest::blocking::get(server2.url("/status").unwrap()).unwrap();
    reqwest::blocking::get(server2.url("/other").unwrap()).unwrap();

    // Assert
    assert_ne!(server1.port(), server2.port());
    assert_eq!(response1.status(), 201);
    assert_eq!(response2.status(), 202);
    assert_eq!(server1.requests().len(), 1);
    assert_eq!(server2.requests().len(), 2);

    server1.clear_requests();
    assert!(server1.requests().is_empty());
    assert_eq!(server2.requests().len(), 2);
}
