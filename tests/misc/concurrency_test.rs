use mumbo::{MockServer, MockedResponse};
use std::{collections::BTreeSet, thread};

#[test]
fn concurrent_requests_are_all_logged_test() {
    // Arrange
    let mut server = MockServer::new();
    server.start(None).unwrap();
    server.configure_response("POST", "/concurrent", || MockedResponse::new(202));
    let url = server.url("/concurrent").unwrap();

    // Act
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let url = url.clone();
            thread::spawn(move || {
                let client = reqwest::blocking::Client::new();
                for i in 0..10 {
                    let response = client
                        .post(&url)
                        .body(format!("{}-{}", t, i))
                        .send()
                        .unwrap();
                    assert_eq!(response.status(), 202);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Assert
    let requests = server.requests();
    assert_eq!(requests.len(), 80);

    let bodies: BTreeSet<&str> = requests.iter().map(|r| r.body()).collect();
    assert_eq!(bodies.len(), 80);

    // Requests of one client complete in the order they were sent.
    for t in 0..8 {
        let prefix = format!("{}-", t);
        let own: Vec<&str> = requests
            .iter()
            .map(|r| r.body())
            .filter(|b| b.starts_with(&prefix))
            .collect();
        let expected: Vec<String> = (0..10).map(|i| format!("{}-{}", t, i)).collect();
        assert_eq!(own, expected);
    }
}
