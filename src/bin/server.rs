//! Dashboard server
//!
//! Serves the HTML dashboard and its JSON endpoints.
//! Run with: cargo run --bin aegis-server

use anyhow::{Context, Result};
use serde_json::json;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

use aegis::config::Config;
use aegis::data::{base_table, Table};
use aegis::error::ValidationError;
use aegis::figure::{render_chart, Figure};
use aegis::filter::filter_rows;
use aegis::logging::{log, log_request, obj, v_str, Domain, Level};
use aegis::metrics::PortfolioSummary;
use aegis::params::ViewParams;
use aegis::query::interpret_query;
use aegis::report::Dashboard;
use aegis::table::{DisplayTable, SortOrder};

const MAX_BODY: usize = 64 * 1024;
const READ_TIMEOUT: Duration = Duration::from_secs(5);

const ROUTES: [&str; 7] = [
    "/",
    "/api/health",
    "/api/manifest",
    "/api/summary",
    "/api/table",
    "/api/chart",
    "/api/query",
];

struct Request {
    method: String,
    path: String,
    query: String,
    /// Declared `Content-Length`; the body is left unread above `MAX_BODY`.
    content_length: usize,
    body: String,
}

struct Response {
    status: u16,
    content_type: &'static str,
    body: String,
}

impl Response {
    fn json(value: serde_json::Value) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body: value.to_string(),
        }
    }

    fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body,
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: json!({"error": message}).to_string(),
        }
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "BAD REQUEST",
            404 => "NOT FOUND",
            405 => "METHOD NOT ALLOWED",
            413 => "PAYLOAD TOO LARGE",
            _ => "INTERNAL SERVER ERROR",
        }
    }
}

fn read_request<R: Read>(stream: R) -> Option<Request> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?;
    let (path, query) = match target.split_once('?') {
        Some((p, q)) => (p.to_string(), q.to_string()),
        None => (target.to_string(), String::new()),
    };

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).ok()? == 0 {
            break;
        }
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = Vec::new();
    if content_length <= MAX_BODY {
        body.resize(content_length, 0u8);
        reader.read_exact(&mut body).ok()?;
    }
    Some(Request {
        method,
        path,
        query,
        content_length,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn view_params(query: &str, cfg: &Config) -> Result<ViewParams, ValidationError> {
    ViewParams::from_pairs(
        url::form_urlencoded::parse(query.as_bytes()),
        cfg.default_filters(),
        cfg.hist_bins,
    )
}

fn route(req: &Request, table: &Table, cfg: &Config) -> Response {
    if req.content_length > MAX_BODY {
        return Response::error(413, &format!("request body exceeds {} bytes", MAX_BODY));
    }
    let params = || view_params(&req.query, cfg);
    let result = match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/api/health") => Ok(Response::json(json!({"status": "ok"}))),
        ("GET", "/api/manifest") => Ok(Response::json(json!(table.manifest()))),
        ("GET", "/") => params().map(|p| {
            match Dashboard::build(table, &p.filters, &p.chart).render_html() {
                Ok(html) => Response::html(html),
                Err(err) => Response::error(500, &err.to_string()),
            }
        }),
        ("GET", "/api/summary") => params().map(|p| {
            let summary = PortfolioSummary::from_table(&filter_rows(table, &p.filters));
            Response::json(json!({"summary": summary, "cards": summary.cards()}))
        }),
        ("GET", "/api/table") => params().map(|p| {
            let rows = filter_rows(table, &p.filters);
            Response::json(json!(DisplayTable::build(&rows, SortOrder::default())))
        }),
        ("GET", "/api/chart") => params().map(|p| {
            let rows = filter_rows(table, &p.filters);
            Response::json(render_chart(&rows, &p.chart).to_plotly())
        }),
        ("POST", "/api/query") => params().map(|p| {
            let outcome = interpret_query(&req.body);
            let figure = outcome.request().map(|request| {
                let rows = filter_rows(table, &p.filters);
                match request.to_spec(cfg.hist_bins) {
                    Ok(spec) => render_chart(&rows, &spec).to_plotly(),
                    Err(err) => Figure::error(err.to_string()).to_plotly(),
                }
            });
            Response::json(json!({"outcome": outcome, "figure": figure}))
        }),
        (_, path) if ROUTES.contains(&path) => return Response::error(405, "method not allowed"),
        _ => return Response::error(404, "not found"),
    };
    result.unwrap_or_else(|err| Response::error(400, &err.to_string()))
}

fn write_response(stream: &mut TcpStream, resp: &Response) -> std::io::Result<()> {
    let head = format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: {}\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n",
        resp.status,
        resp.reason(),
        resp.content_type,
        resp.body.len()
    );
    stream.write_all(head.as_bytes())?;
    stream.write_all(resp.body.as_bytes())
}

fn main() -> Result<()> {
    let cfg = Config::from_env();
    let table = base_table();
    let listener = TcpListener::bind(&cfg.server_addr)
        .with_context(|| format!("failed to bind {}", cfg.server_addr))?;

    log(
        Level::Info,
        Domain::System,
        "server_start",
        obj(&[("addr", v_str(&cfg.server_addr))]),
    );
    println!("AEGIS dashboard running at http://{}", cfg.server_addr);
    println!();
    println!("Endpoints:");
    println!("  GET  /              - Dashboard HTML");
    println!("  GET  /api/health    - Health check");
    println!("  GET  /api/manifest  - Dataset manifest");
    println!("  GET  /api/summary   - Summary cards for the filters");
    println!("  GET  /api/table     - Display table for the filters");
    println!("  GET  /api/chart     - Plotly figure for the filters and chart");
    println!("  POST /api/query     - Interpret a chart query (body = text)");
    println!();

    for stream in listener.incoming() {
        let mut stream = match stream {
            Ok(s) => s,
            Err(_) => continue,
        };
        if let Err(err) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
            log(
                Level::Warn,
                Domain::Server,
                "read_timeout_unset",
                obj(&[("msg", v_str(&err.to_string()))]),
            );
        }
        let started = Instant::now();
        let Some(req) = read_request(&stream) else {
            continue;
        };
        let resp = route(&req, &table, &cfg);
        if let Err(err) = write_response(&mut stream, &resp) {
            log(
                Level::Warn,
                Domain::Server,
                "write_failed",
                obj(&[("msg", v_str(&err.to_string()))]),
            );
        }
        log_request(
            &req.method,
            &req.path,
            resp.status,
            started.elapsed().as_secs_f64() * 1000.0,
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis::chart::DEFAULT_BINS;
    use aegis::filter::Preset;
    use serde_json::Value;

    fn cfg() -> Config {
        Config {
            report_dir: "out/dashboard".to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            hist_bins: DEFAULT_BINS,
            max_budget: 400.0,
            min_roi: 1.0,
        }
    }

    fn request(method: &str, target: &str, body: &str) -> Request {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Request {
            method: method.to_string(),
            path: path.to_string(),
            query: query.to_string(),
            content_length: body.len(),
            body: body.to_string(),
        }
    }

    fn send(method: &str, target: &str, body: &str) -> (u16, Value) {
        let resp = route(&request(method, target, body), &base_table(), &cfg());
        let value = serde_json::from_str(&resp.body).unwrap_or(Value::Null);
        (resp.status, value)
    }

    #[test]
    fn health_and_manifest() {
        let (status, body) = send("GET", "/api/health", "");
        assert_eq!(status, 200);
        assert_eq!(body["status"], "ok");
        let (status, body) = send("GET", "/api/manifest", "");
        assert_eq!(status, 200);
        assert_eq!(body["row_count"], 20);
    }

    #[test]
    fn unknown_path_is_404() {
        let (status, body) = send("GET", "/api/nothing", "");
        assert_eq!(status, 404);
        assert_eq!(body["error"], "not found");
    }

    #[test]
    fn wrong_method_is_405() {
        assert_eq!(send("POST", "/api/chart", "").0, 405);
        assert_eq!(send("GET", "/api/query", "").0, 405);
        assert_eq!(send("DELETE", "/", "").0, 405);
    }

    #[test]
    fn invalid_chart_params_are_400_with_message() {
        let (status, body) = send("GET", "/api/chart?type=Scatter+Plot&x=department", "");
        assert_eq!(status, 400);
        let msg = body["error"].as_str().unwrap();
        assert!(msg.contains("requires a numeric X-axis field"), "{}", msg);

        let (status, _) = send("GET", "/api/summary?department=Coast+Guard", "");
        assert_eq!(status, 400);
    }

    #[test]
    fn oversized_bins_are_400_not_a_crash() {
        let target = "/api/chart?type=Histogram&x=roi&bins=100000000000000000000";
        let (status, body) = send("GET", target, "");
        assert_eq!(status, 400);
        assert!(body["error"].as_str().unwrap().contains("at most 200 bins"));

        let (status, body) = send("GET", "/api/chart?type=Histogram&x=roi&bins=20", "");
        assert_eq!(status, 200);
        assert!(body["data"].is_array());
    }

    #[test]
    fn preset_then_override_from_query_string() {
        let (status, body) = send("GET", "/api/summary?preset=budget&min_roi=2.0", "");
        assert_eq!(status, 200);
        let expected = filter_rows(
            &base_table(),
            &Preset::BudgetConstrained.filters().with_min_roi(2.0),
        );
        assert_eq!(body["summary"]["count"], expected.len());
        assert_eq!(body["cards"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn query_envelope_for_config_and_invalid() {
        let config = r#"{"chart_type": "Scatter Plot", "x_axis": "cost_m", "y_axis": "roi"}"#;
        let (status, body) = send("POST", "/api/query", config);
        assert_eq!(status, 200);
        assert_eq!(body["outcome"]["outcome"], "config");
        assert!(body["figure"]["data"].is_array());

        let (status, body) = send("POST", "/api/query", r#"{"chart_type": "Pie"}"#);
        assert_eq!(status, 200);
        assert_eq!(body["outcome"]["outcome"], "invalid");
        assert!(body["figure"].is_null());

        let (_, body) = send("POST", "/api/query", "histogram of roi");
        assert_eq!(body["outcome"]["outcome"], "free_text");
        assert!(body["figure"]["layout"].is_object());
    }

    #[test]
    fn oversized_body_is_413() {
        let mut req = request("POST", "/api/query", "");
        req.content_length = MAX_BODY + 1;
        let resp = route(&req, &base_table(), &cfg());
        assert_eq!(resp.status, 413);
        assert_eq!(resp.reason(), "PAYLOAD TOO LARGE");
    }

    #[test]
    fn reads_request_line_headers_and_body() {
        let raw = "POST /api/query?preset=value HTTP/1.1\r\n\
                   Host: localhost\r\n\
                   content-length: 5\r\n\r\n\
                   hello";
        let req = read_request(raw.as_bytes()).unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.path, "/api/query");
        assert_eq!(req.query, "preset=value");
        assert_eq!(req.body, "hello");
    }

    #[test]
    fn oversized_body_is_left_unread() {
        let raw = format!("POST /api/query HTTP/1.1\r\nContent-Length: {}\r\n\r\n", MAX_BODY + 1);
        let req = read_request(raw.as_bytes()).unwrap();
        assert_eq!(req.content_length, MAX_BODY + 1);
        assert!(req.body.is_empty());
    }
}
