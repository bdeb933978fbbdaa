//! Local stand-in for the online library, served with `tiny_http`.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub static COVER_PNG: &[u8] = &[
    137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13, 73, 72, 68, 82, 0, 0, 0, 1, 0, 0, 0, 1, 8, 4, 0,
    0, 0, 181, 28, 12, 2, 0, 0, 0, 11, 73, 68, 65, 84, 120, 218, 99, 252, 255, 23, 0, 2, 3, 1, 128,
    110, 220, 25, 0, 0, 0, 0, 73, 69, 78, 68, 174, 66, 96, 130,
];

pub struct LibraryServer {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    shutdown_tx: mpsc::Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl LibraryServer {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for LibraryServer {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

enum Body {
    Html(String),
    Text(&'static str),
    Png,
    RedirectHome,
    NotFound,
}

fn book_page(title: &str, author: &str, cover: &str, genres: &[&str], comments: &[&str]) -> String {
    let genres = genres
        .iter()
        .map(|genre| format!("<a href=\"/l55/\">{genre}</a>"))
        .collect::<Vec<_>>()
        .join(", ");
    let comments = comments
        .iter()
        .map(|comment| format!("<div class=\"texts\"><b>reader</b><br><span class=\"black\">{comment}</span></div>"))
        .collect::<String>();
    format!(
        r#"<!doctype html>
<html>
  <head><title>{title}</title></head>
  <body>
    <div id="content">
      <h1>{title} &nbsp;::&nbsp; <a href="/a1/">{author}</a></h1>
      <div class="bookimage"><a href="/txt.php"><img src="{cover}" alt="{title}"></a></div>
      <span class="d_book"><b>Жанр книги:</b> {genres}</span>
      {comments}
    </div>
  </body>
</html>
"#
    )
}

fn listing_page(ids: &[u64]) -> String {
    let cards = ids
        .iter()
        .map(|id| {
            format!(
                r#"<table class="d_book">
  <tr><td><a href="/b{id}/"><img src="/shots/{id}.jpg"></a></td></tr>
  <tr><td><a href="/b{id}/">Book {id}</a></td></tr>
</table>"#
            )
        })
        .collect::<String>();
    format!("<!doctype html><html><body><div id=\"content\">{cards}</div></body></html>")
}

fn route(url: &str) -> Body {
    match url {
        "/" => Body::Html("<!doctype html><html><body><h1>Library</h1></body></html>".to_owned()),
        "/b1/" => Body::Html(book_page(
            "Dune",
            "Frank Herbert",
            "/shots/1.jpg",
            &["Научная фантастика", "Приключения"],
            &["Classic.", "Too much sand."],
        )),
        "/b2/" => Body::RedirectHome,
        "/b3/" => Body::Html(book_page("Lost", "Nobody", "/images/nopic.gif", &[], &[])),
        "/b4/" => Body::Html(book_page(
            "Солярис",
            "Станислав Лем",
            "/images/nopic.gif",
            &["Научная фантастика"],
            &[],
        )),
        "/txt.php?id=1" => Body::Text("The spice must flow."),
        "/txt.php?id=3" => Body::RedirectHome,
        "/txt.php?id=4" => Body::Text("Океан."),
        "/shots/1.jpg" => Body::Png,
        "/l55/1/" => Body::Html(listing_page(&[1, 2, 4])),
        "/l55/2/" => Body::Html(listing_page(&[])),
        _ => Body::NotFound,
    }
}

pub fn spawn_library_server() -> LibraryServer {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
    let addr = server.server_addr();
    let base_url = format!("http://{addr}/");

    let hits = Arc::new(AtomicUsize::new(0));
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    let server_hits = Arc::clone(&hits);
    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            let request = match server.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(req)) => req,
                Ok(None) => continue,
                Err(_) => break,
            };
            server_hits.fetch_add(1, Ordering::SeqCst);

            let (response, content_type) = match route(request.url()) {
                Body::Html(html) => (
                    tiny_http::Response::from_string(html).with_status_code(200),
                    Some("text/html; charset=utf-8"),
                ),
                Body::Text(text) => (
                    tiny_http::Response::from_string(text).with_status_code(200),
                    Some("text/plain; charset=utf-8"),
                ),
                Body::Png => (
                    tiny_http::Response::from_data(COVER_PNG.to_vec()).with_status_code(200),
                    Some("image/png"),
                ),
                Body::RedirectHome => {
                    let location = tiny_http::Header::from_bytes(&b"Location"[..], &b"/"[..])
                        .expect("build header");
                    let _ = request.respond(
                        tiny_http::Response::from_string("")
                            .with_status_code(302)
                            .with_header(location),
                    );
                    continue;
                }
                Body::NotFound => (
                    tiny_http::Response::from_string("not found").with_status_code(404),
                    None,
                ),
            };

            let response = match content_type {
                Some(value) => {
                    let header =
                        tiny_http::Header::from_bytes(&b"Content-Type"[..], value.as_bytes())
                            .expect("build header");
                    response.with_header(header)
                }
                None => response,
            };
            let _ = request.respond(response);
        }
    });

    LibraryServer {
        base_url,
        hits,
        shutdown_tx,
        handle: Some(handle),
    }
}
