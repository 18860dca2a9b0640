use crate::files;
use crate::request::HttpRequest;
use crate::response::HttpResponse;
use percent_encoding::percent_decode_str;
use search_core::WordIndex;
use std::path::Path;

const STATIC_PREFIX: &str = "/static/";

const LANDING_HEADER: &str = concat!(
    "<html><head><title>searchd</title></head>\n",
    "<body>\n",
    "<center style=\"font-size:300%;\">searchd</center>\n",
    "<p>\n",
    "<center>\n",
    "<form action=\"/query\" method=\"get\">\n",
    "<input type=\"text\" size=30 name=\"terms\" />\n",
    "<input type=\"submit\" value=\"Search\" />\n",
    "</form>\n",
    "</center><p>\n",
);

/// Map a parsed request to a response: `/static/` paths go to file serving,
/// everything else is treated as a query-page request.
pub fn route(request: &HttpRequest, base_dir: &Path, index: &WordIndex) -> HttpResponse {
    if request.path().starts_with(STATIC_PREFIX) {
        file_response(request, base_dir)
    } else {
        query_response(request, index)
    }
}

fn file_response(request: &HttpRequest, base_dir: &Path) -> HttpResponse {
    let raw = &request.path()[STATIC_PREFIX.len()..];
    let file_name = percent_decode_str(raw).decode_utf8_lossy().to_string();

    if !files::is_path_safe(base_dir, &file_name) {
        let mut resp = HttpResponse::new(400, "Path Not Safe");
        resp.append_body(
            format!(
                "<html><body>Path not safe \"{}\"</body></html>\n",
                escape_html(&file_name)
            )
            .as_bytes(),
        );
        return resp;
    }

    match files::read_file(&base_dir.join(&file_name)) {
        Ok(content) => {
            let mut resp = HttpResponse::new(200, "OK");
            resp.set_content_type(files::content_type_for(&file_name));
            resp.append_body(&content);
            resp
        }
        Err(_) => {
            let mut resp = HttpResponse::new(404, "Not Found");
            resp.append_body(
                format!(
                    "<html><body>Couldn't find file \"{}\"</body></html>\n",
                    escape_html(&file_name)
                )
                .as_bytes(),
            );
            resp
        }
    }
}

/// The search landing page, with results when a `terms` argument is present.
/// Absence of matches is not an error: the query path always answers 200.
fn query_response(request: &HttpRequest, index: &WordIndex) -> HttpResponse {
    let mut resp = HttpResponse::new(200, "OK");
    let mut html = String::from(LANDING_HEADER);

    let args = request.args();
    let terms_str = match args.get("terms") {
        Some(t) => t,
        None => {
            html.push_str("</body>\n</html>\n");
            resp.append_body(html.as_bytes());
            return resp;
        }
    };

    let terms: Vec<String> = terms_str
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let results = index.lookup_query(&terms);

    if results.is_empty() {
        html.push_str(&format!(
            "<p><br>\nNo results found for <b>{}</b>\n<p>\n",
            escape_html(terms_str)
        ));
    } else {
        html.push_str(&format!(
            "<p><br>\n{} results found for <b>{}</b>\n</p>\n<ul>\n",
            results.len(),
            escape_html(terms_str)
        ));
        for result in &results {
            html.push_str(&format!(
                " <li> <a href=\"/static/{}\">{}</a> [{}]<br>\n",
                result.doc_name,
                escape_html(&result.doc_name),
                result.rank
            ));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</body>\n</html>\n");
    resp.append_body(html.as_bytes());
    resp
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
