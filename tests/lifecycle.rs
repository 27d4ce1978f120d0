use fixed_server::{
    FixedServer, FixtureDefinition, FixtureRegistry, ResponseTemplate, ServerOptions,
    TransportError,
};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

fn hello_registry(options: ServerOptions) -> FixtureRegistry {
    let mut registry = FixtureRegistry::with_options(options);
    registry
        .add_fixture(
            "GET 200 /hello",
            FixtureDefinition::new()
                .method("get")
                .route("/hello")
                .respond_with(ResponseTemplate::new(200).set_body_string("world")),
        )
        .unwrap();
    registry
}

/// A port that was free a moment ago.
fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::test]
async fn listen_starts_the_server() {
    // Arrange
    let mut server = hello_registry(ServerOptions::new())
        .create_server("GET 200 /hello")
        .unwrap();

    // Act
    let address = server.listen(Some(0)).await.unwrap();

    // Assert
    assert!(server.is_listening());
    assert_eq!(server.address(), Some(address));
    assert!(TcpStream::connect(address).is_ok());

    server.destroy().await.unwrap();
}

#[tokio::test]
async fn listen_defaults_to_the_configured_port() {
    // Arrange
    let port = free_port();
    let options = ServerOptions::new().port(port).protocol("http:");
    let mut server = hello_registry(options)
        .create_server("GET 200 /hello")
        .unwrap();

    // Act
    let address = server.listen(None).await.unwrap();

    // Assert
    assert_eq!(address.port(), port);
    assert_eq!(server.uri().unwrap(), format!("http://127.0.0.1:{}", port));

    server.destroy().await.unwrap();
}

#[tokio::test]
async fn destroy_releases_the_port() {
    // Arrange
    let registry = hello_registry(ServerOptions::new());
    let mut server = registry.create_server("GET 200 /hello").unwrap();
    let address = server.listen(Some(0)).await.unwrap();
    let status = reqwest::get(format!("http://{}/hello", address))
        .await
        .unwrap()
        .status();
    assert_eq!(status, 200);

    // Act
    server.destroy().await.unwrap();

    // Assert
    assert!(!server.is_listening());
    assert_eq!(server.address(), None);
    let mut successor = registry.create_server("GET 200 /hello").unwrap();
    assert_eq!(
        successor.listen(Some(address.port())).await.unwrap(),
        address
    );
    successor.destroy().await.unwrap();
}

#[tokio::test]
async fn destroyed_servers_refuse_connections() {
    // Arrange
    let mut server = hello_registry(ServerOptions::new())
        .create_server("GET 200 /hello")
        .unwrap();
    let address = server.listen(Some(0)).await.unwrap();

    // Act
    server.destroy().await.unwrap();

    // Assert
    assert!(reqwest::get(format!("http://{}/hello", address))
        .await
        .is_err());
}

#[tokio::test]
async fn servers_from_the_same_registry_do_not_interfere() {
    // Arrange
    let registry = hello_registry(ServerOptions::new());
    let mut first = registry.create_server("GET 200 /hello").unwrap();
    let mut second = registry.create_server("GET 200 /hello").unwrap();
    let first_address = first.listen(Some(0)).await.unwrap();
    let second_address = second.listen(Some(0)).await.unwrap();
    assert_ne!(first_address, second_address);

    for address in [first_address, second_address] {
        let status = reqwest::get(format!("http://{}/hello", address))
            .await
            .unwrap()
            .status();
        assert_eq!(status, 200);
    }

    // Act
    first.destroy().await.unwrap();

    // Assert
    let response = reqwest::get(format!("http://{}/hello", second_address))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "world");
    assert!(reqwest::get(format!("http://{}/hello", first_address))
        .await
        .is_err());

    second.destroy().await.unwrap();
}

#[tokio::test]
async fn servers_from_different_registries_shut_down_independently() {
    // Arrange
    let mut first = hello_registry(ServerOptions::new()).create_server(()).unwrap();
    let mut second = hello_registry(ServerOptions::new()).create_server(()).unwrap();
    first.listen(Some(0)).await.unwrap();
    second.listen(Some(0)).await.unwrap();

    // Act
    let (first_outcome, second_outcome) = tokio::join!(first.destroy(), second.destroy());

    // Assert
    first_outcome.unwrap();
    second_outcome.unwrap();
}

#[tokio::test]
async fn listening_on_a_taken_port_fails() {
    // Arrange
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();
    let mut server = FixedServer::new(ServerOptions::new());

    // Act
    let outcome = server.listen(Some(port)).await;

    // Assert
    assert!(matches!(outcome, Err(TransportError::Bind { .. })));
    assert!(!server.is_listening());
}

#[tokio::test]
async fn listening_twice_is_an_error() {
    // Arrange
    let mut server = FixedServer::new(ServerOptions::new());
    server.listen(Some(0)).await.unwrap();

    // Act
    let outcome = server.listen(Some(0)).await;

    // Assert
    assert!(matches!(outcome, Err(TransportError::AlreadyStarted)));
    assert!(server.is_listening());

    server.destroy().await.unwrap();
}

#[tokio::test]
async fn destroying_a_server_that_is_not_listening_is_an_error() {
    // Arrange
    let mut server = FixedServer::new(ServerOptions::new());

    // Act
    let before_listen = server.destroy().await;
    server.listen(Some(0)).await.unwrap();
    server.destroy().await.unwrap();
    let after_destroy = server.destroy().await;

    // Assert
    assert!(matches!(before_listen, Err(TransportError::NotListening)));
    assert!(matches!(after_destroy, Err(TransportError::NotListening)));
    assert!(matches!(
        server.listen(Some(0)).await,
        Err(TransportError::AlreadyStarted)
    ));
}

#[tokio::test]
async fn dropping_a_listening_server_shuts_it_down() {
    // Arrange
    let mut server = FixedServer::new(ServerOptions::new());
    let address = server.listen(Some(0)).await.unwrap();

    // Act
    drop(server);

    // Assert - the shutdown happens in the background, give it some time.
    let mut released = false;
    for _ in 0..40 {
        if TcpStream::connect_timeout(&address, Duration::from_millis(25)).is_err() {
            released = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert!(released);
}
