use super::*;
use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use shared::domain::Covenant;
use tokio::net::TcpListener;

fn john() -> Book {
    Book::new("János", "Jn", 21, Covenant::New)
}

async fn chapter_ok(Path((reference, translation)): Path<(String, String)>) -> Json<Value> {
    Json(json!({
        "keres": {"feladat": "idezet", "hivatkozas": reference, "forma": "json"},
        "valasz": {
            "versek": [
                {"szoveg": format!("{reference} első vers ({translation})"),
                 "hely": {"gepi": 50301600100u64, "szep": "Jn 16,1"}},
                {"szoveg": "második vers",
                 "hely": {"gepi": 50301600200u64, "szep": "Jn 16,2"}}
            ],
            "forditas": {"nev": "Revideált új fordítás", "rov": translation}
        }
    }))
}

async fn chapter_garbled() -> &'static str {
    "<html>not json</html>"
}

async fn chapter_server_error() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn chapter_slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({"valasz": {"versek": []}}))
}

async fn spawn_api(app: Router) -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}/api"))
}

#[test]
fn chapter_url_joins_reference_and_percent_encodes_abbreviation() {
    let client =
        SzentirasClient::new("https://szentiras.hu/api", Duration::from_secs(5)).expect("client");
    let genesis = Book::new("1 Mózes", "1Móz", 50, Covenant::Old);

    let url = client.chapter_url(&genesis, 1, "RUF").expect("url");
    assert_eq!(url.as_str(), "https://szentiras.hu/api/idezet/1M%C3%B3z1/RUF");

    let url = client.chapter_url(&john(), 16, "KNB").expect("url");
    assert_eq!(url.as_str(), "https://szentiras.hu/api/idezet/Jn16/KNB");
}

#[test]
fn rejects_unparseable_base_url() {
    assert!(SzentirasClient::new("not a url", Duration::from_secs(1)).is_err());
}

#[tokio::test]
async fn fetches_and_decodes_chapter() {
    let base = spawn_api(Router::new().route("/api/idezet/:reference/:translation", get(chapter_ok)))
        .await
        .expect("spawn api");
    let client = SzentirasClient::new(&base, Duration::from_secs(5)).expect("client");

    let content = client
        .fetch_chapter(&john(), 16, "RUF")
        .await
        .expect("chapter");

    assert_eq!(content.verses.len(), 2);
    assert_eq!(content.verses[0].text, "Jn16 első vers (RUF)");
    assert_eq!(content.verses[1].global_index(), 50301600200);
    assert_eq!(content.verses[1].location.chapter(), Some(16));
}

#[tokio::test]
async fn undecodable_body_is_a_parsing_error() {
    let base = spawn_api(Router::new().route(
        "/api/idezet/:reference/:translation",
        get(chapter_garbled),
    ))
    .await
    .expect("spawn api");
    let client = SzentirasClient::new(&base, Duration::from_secs(5)).expect("client");

    let err = client
        .fetch_chapter(&john(), 3, "RUF")
        .await
        .expect_err("must fail");
    assert_eq!(err, BibleError::Parsing);
}

#[tokio::test]
async fn error_status_is_a_network_error() {
    let base = spawn_api(Router::new().route(
        "/api/idezet/:reference/:translation",
        get(chapter_server_error),
    ))
    .await
    .expect("spawn api");
    let client = SzentirasClient::new(&base, Duration::from_secs(5)).expect("client");

    let err = client
        .fetch_chapter(&john(), 3, "RUF")
        .await
        .expect_err("must fail");
    assert_eq!(err, BibleError::Network);
}

#[tokio::test]
async fn timeout_is_a_network_error() {
    let base = spawn_api(Router::new().route(
        "/api/idezet/:reference/:translation",
        get(chapter_slow),
    ))
    .await
    .expect("spawn api");
    let client = SzentirasClient::new(&base, Duration::from_millis(100)).expect("client");

    let err = client
        .fetch_chapter(&john(), 3, "RUF")
        .await
        .expect_err("must time out");
    assert_eq!(err, BibleError::Network);
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client =
        SzentirasClient::new(&format!("http://{addr}/api"), Duration::from_secs(2)).expect("client");
    let err = client
        .fetch_chapter(&john(), 3, "RUF")
        .await
        .expect_err("must fail");
    assert_eq!(err, BibleError::Network);
}
