mod common;

use common::{header_of, ok, response, serve};
use fetchnet::{Client, NetError, TransportKind};

const BOTH: [TransportKind; 2] = [TransportKind::Multiplexed, TransportKind::Sequential];

/// `/hop/N` redirects to `/hop/N-1`; `/hop/0` answers "done".
async fn hop_server() -> String {
    serve(|request, base| {
        let path = request.split_whitespace().nth(1).unwrap_or("/");
        let n: usize = path
            .strip_prefix("/hop/")
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);
        if n == 0 {
            ok("done")
        } else {
            let location = format!("Location: {}/hop/{}", base, n - 1);
            response("302 Found", &[&location], b"")
        }
    })
    .await
}

#[tokio::test]
async fn test_ten_redirects_followed() {
    let base = hop_server().await;

    for kind in BOTH {
        let client = Client::builder().transport(kind).build();
        let result = client.get(&format!("{}/hop/10", base)).await.unwrap();

        assert_eq!(result.http_code(), 200, "{:?}", kind);
        assert_eq!(result.text(), "done");
        assert!(result.error().is_none());
    }
}

#[tokio::test]
async fn test_redirect_limit() {
    let base = hop_server().await;
    let url = format!("{}/hop/11", base);

    for kind in BOTH {
        let client = Client::builder().transport(kind).build();
        let result = client.get(&url).await.unwrap();

        assert_eq!(result.http_code(), 0, "{:?}", kind);
        assert!(result.body().is_empty());
        assert_eq!(result.error(), Some(&NetError::TooManyRedirects));
        assert_eq!(result.url(), url);
    }
}

#[tokio::test]
async fn test_redirect_limit_per_url() {
    let base = hop_server().await;
    let short = format!("{}/hop/3", base);
    let long = format!("{}/hop/12", base);

    let client = Client::builder()
        .transport(TransportKind::Multiplexed)
        .concurrency_limit(1)
        .build();
    let results = client.get_batch([long.clone(), short.clone()]).await.unwrap();

    assert_eq!(results[&long].http_code(), 0);
    assert_eq!(results[&short].http_code(), 200);
}

#[tokio::test]
async fn test_relative_location() {
    let base = serve(|request, _| {
        if request.starts_with("GET /old ") {
            response("301 Moved Permanently", &["Location: /new"], b"")
        } else {
            ok("new")
        }
    })
    .await;

    for kind in BOTH {
        let client = Client::builder().transport(kind).build();
        let result = client.get(&format!("{}/old", base)).await.unwrap();
        assert_eq!(result.text(), "new", "{:?}", kind);
    }
}

#[tokio::test]
async fn test_socket_transport_carries_redirect_cookie() {
    let base = serve(|request, _| {
        if request.starts_with("GET /login ") {
            response(
                "302 Found",
                &["Set-Cookie: sid=abc123; Path=/", "Location: /home"],
                b"",
            )
        } else if request.starts_with("GET /home ") {
            let cookie = header_of(request, "cookie").unwrap_or("none").to_string();
            response("302 Found", &["Location: /final"], cookie.as_bytes())
        } else {
            let cookie = header_of(request, "cookie").unwrap_or("none").to_string();
            ok(&cookie)
        }
    })
    .await;

    let client = Client::builder().transport(TransportKind::Sequential).build();
    let result = client
        .request(http::Method::GET)
        .cookie("pref=dark")
        .send(&format!("{}/login", base))
        .await
        .unwrap();

    // The carried cookie lives for one hop, then the configured one returns
    assert_eq!(result.http_code(), 200);
    assert_eq!(result.text(), "pref=dark");
}

#[tokio::test]
async fn test_socket_transport_cookie_replaces_configured() {
    let base = serve(|request, _| {
        if request.starts_with("GET /login ") {
            response("302 Found", &["Set-Cookie: sid=abc123", "Location: /home"], b"")
        } else {
            ok(header_of(request, "cookie").unwrap_or("none"))
        }
    })
    .await;

    let client = Client::builder().transport(TransportKind::Sequential).build();
    let result = client
        .request(http::Method::GET)
        .cookie("pref=dark")
        .send(&format!("{}/login", base))
        .await
        .unwrap();
    assert_eq!(result.text(), "sid=abc123");
}

#[tokio::test]
async fn test_native_transport_sends_referer_on_redirect() {
    let base = serve(|request, _| {
        if request.starts_with("GET /from ") {
            response("302 Found", &["Set-Cookie: sid=abc", "Location: /to"], b"")
        } else {
            let referer = header_of(request, "referer").unwrap_or("none");
            let cookie = header_of(request, "cookie").unwrap_or("none");
            ok(&format!("{}|{}", referer, cookie))
        }
    })
    .await;

    let client = Client::builder().transport(TransportKind::Multiplexed).build();
    let result = client.get(&format!("{}/from", base)).await.unwrap();
    assert_eq!(result.text(), format!("{}/from|none", base));
}

#[tokio::test]
async fn test_location_on_success_only_followed_by_socket() {
    let base = serve(|request, _| {
        if request.starts_with("GET /page ") {
            response("200 OK", &["Location: /elsewhere"], b"page")
        } else {
            ok("elsewhere")
        }
    })
    .await;
    let url = format!("{}/page", base);

    let native = Client::builder().transport(TransportKind::Multiplexed).build();
    assert_eq!(native.get(&url).await.unwrap().text(), "page");

    let socket = Client::builder().transport(TransportKind::Sequential).build();
    assert_eq!(socket.get(&url).await.unwrap().text(), "elsewhere");
}
